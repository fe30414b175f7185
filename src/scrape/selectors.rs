use serde::Deserialize;

use super::dom::Target;

/// Where every piece of WhatsApp Web markup the scraper touches lives.
///
/// Page-level regions are XPath evaluated against the whole document; what sits
/// inside a search row or a message bubble is CSS, matched against that row's or
/// panel's HTML. The class names are generated by WhatsApp's build and change
/// between releases; any subset can be overridden from the `[selectors]` settings table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub side_panel: String,
    pub search_box: String,
    pub result_rows: String,
    /// CSS, inside a result row.
    pub result_title: String,
    pub message_pane: String,
    pub message_panel: String,
    /// CSS, inside the message panel: own and incoming bubbles.
    pub messages_all: String,
    /// CSS, inside the message panel: incoming bubbles only.
    pub messages_incoming: String,
    /// CSS, inside a bubble.
    pub copyable_text: String,
    /// CSS, inside `copyable_text`.
    pub selectable_text: String,
    /// CSS, inside `copyable_text`.
    pub emoji: String,
    /// CSS, inside `copyable_text`.
    pub quoted: String,
    /// CSS, inside a bubble.
    pub image: String,
    pub body: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            side_panel: "//div[@id='side']/div".to_owned(),
            search_box: "//div[@id='side']/div//div[contains(@class, 'copyable-text') and contains(@class, 'selectable-text')]".to_owned(),
            result_rows: "//div[@id='pane-side']//div[contains(@class,'_2Z4DV') and not(contains(@class, '_3mMG5'))]".to_owned(),
            result_title: "span[title]".to_owned(),
            message_pane: "//div[@id='main']/div[3]".to_owned(),
            message_panel: "//div[@id='main']/div[3]/div/div/div[@class='_11liR']".to_owned(),
            messages_all: "div.GDTQm.focusable-list-item:not(._397qe)".to_owned(),
            messages_incoming: "div.GDTQm.message-in.focusable-list-item".to_owned(),
            copyable_text: "div.copyable-text".to_owned(),
            selectable_text: "span.selectable-text".to_owned(),
            emoji: "img".to_owned(),
            quoted: "span.quoted-mention".to_owned(),
            image: "img".to_owned(),
            body: "//body".to_owned(),
        }
    }
}

impl Selectors {
    #[must_use]
    pub fn target(&self, target: Target) -> &str {
        match target {
            Target::SidePanel => &self.side_panel,
            Target::SearchResults => &self.result_rows,
            Target::MessagePane => &self.message_pane,
        }
    }
}
