use scraper::{ElementRef, Html, Selector};

use super::{
    dom::{RawMessage, RenderedNode, TitledSpan},
    selectors::Selectors,
};

/// The CSS half of [`Selectors`], compiled once per session.
///
/// Everything inside a bubble or a search row is read from HTML fetched in one
/// go, never through live element handles.
#[derive(Debug)]
pub struct Markup {
    sel_messages_all: Selector,
    sel_messages_incoming: Selector,
    sel_copyable_text: Selector,
    sel_selectable_text: Selector,
    sel_emoji: Selector,
    sel_quoted: Selector,
    sel_image: Selector,
    sel_result_title: Selector,
}

fn compile(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid CSS selector {css:?}: {e:?}"))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

impl Markup {
    pub fn compile(selectors: &Selectors) -> anyhow::Result<Self> {
        Ok(Self {
            sel_messages_all: compile(&selectors.messages_all)?,
            sel_messages_incoming: compile(&selectors.messages_incoming)?,
            sel_copyable_text: compile(&selectors.copyable_text)?,
            sel_selectable_text: compile(&selectors.selectable_text)?,
            sel_emoji: compile(&selectors.emoji)?,
            sel_quoted: compile(&selectors.quoted)?,
            sel_image: compile(&selectors.image)?,
            sel_result_title: compile(&selectors.result_title)?,
        })
    }

    /// Bubbles inside the message panel's HTML, in document order.
    #[must_use]
    pub fn messages(&self, panel_html: &str, include_my_user: bool) -> Vec<RenderedNode> {
        let fragment = Html::parse_fragment(panel_html);
        let sel = if include_my_user { &self.sel_messages_all } else { &self.sel_messages_incoming };

        let nodes = fragment.select(sel).map(|bubble| self.bubble(bubble)).collect();
        nodes
    }

    fn bubble(&self, bubble: ElementRef<'_>) -> RenderedNode {
        let Some(block) = bubble.select(&self.sel_copyable_text).next() else {
            let image_src = bubble
                .select(&self.sel_image)
                .next()
                .and_then(|img| img.attr("src"))
                .map(ToOwned::to_owned);
            return RenderedNode::Media { image_src };
        };

        RenderedNode::Message(RawMessage {
            meta: block.attr("data-pre-plain-text").unwrap_or_default().to_owned(),
            text: block.select(&self.sel_selectable_text).next().map(text_of),
            emojis: block
                .select(&self.sel_emoji)
                .filter_map(|img| img.attr("data-plain-text"))
                .map(ToOwned::to_owned)
                .collect(),
            quoted: block.select(&self.sel_quoted).next().map(text_of),
        })
    }

    /// Titled spans of every search result row; `rows` holds each row's outer HTML.
    #[must_use]
    pub fn titled_spans(&self, rows: &[String]) -> Vec<TitledSpan> {
        rows.iter()
            .enumerate()
            .flat_map(|(row, html)| {
                let fragment = Html::parse_fragment(html);
                let spans = fragment
                    .select(&self.sel_result_title)
                    .filter_map(|span| {
                        Some(TitledSpan {
                            row,
                            title: span.attr("title")?.to_owned(),
                            text: text_of(span),
                        })
                    })
                    .collect::<Vec<_>>();
                spans
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup() -> Markup {
        Markup::compile(&Selectors::default()).unwrap()
    }

    fn panel(bubbles: &str) -> String {
        format!(r#"<div class="_11liR" role="application">{bubbles}</div>"#)
    }

    const TEXT: &str = r#"
        <div class="GDTQm message-in focusable-list-item">
          <div class="copyable-text" data-pre-plain-text="[07:23, 10/18/2019] John: ">
            <span dir="ltr" class="selectable-text copyable-text"><span>see you at 8</span></span>
          </div>
        </div>"#;

    const EMOJI_ONLY: &str = r#"
        <div class="GDTQm message-in focusable-list-item">
          <div class="copyable-text" data-pre-plain-text="[07:24, 10/18/2019] John: ">
            <img class="emoji" alt="👍" data-plain-text="👍" src="data:image/gif;base64,R0lGOD">
            <img class="emoji" alt="🎉" data-plain-text="🎉" src="data:image/gif;base64,R0lGOD">
          </div>
        </div>"#;

    const REPLY: &str = r#"
        <div class="GDTQm message-in focusable-list-item">
          <div class="copyable-text" data-pre-plain-text="[07:25, 10/18/2019] Ann Marie: ">
            <div class="quoted"><span dir="auto" class="quoted-mention">lunch tomorrow?</span></div>
            <span class="selectable-text copyable-text"><span>sure </span><img data-plain-text="😋" src="data:,"></span>
          </div>
        </div>"#;

    const OWN: &str = r#"
        <div class="GDTQm message-out focusable-list-item">
          <div class="copyable-text" data-pre-plain-text="[07:26, 10/18/2019] Me: ">
            <span class="selectable-text copyable-text"><span>on my way</span></span>
          </div>
        </div>"#;

    fn image(src: &str) -> String {
        format!(
            r#"<div class="GDTQm message-in focusable-list-item"><div class="_1mTu"><img src="{src}"></div></div>"#
        )
    }

    #[test]
    fn text_bubble() {
        let nodes = markup().messages(&panel(TEXT), false);
        assert_eq!(nodes, [RenderedNode::Message(RawMessage {
            meta: "[07:23, 10/18/2019] John: ".to_owned(),
            text: Some("see you at 8".to_owned()),
            emojis: Vec::new(),
            quoted: None,
        })]);
    }

    #[test]
    fn emoji_only_bubble_has_no_text() {
        let nodes = markup().messages(&panel(EMOJI_ONLY), false);
        let [RenderedNode::Message(raw)] = nodes.as_slice() else {
            panic!("unexpected nodes: {nodes:?}");
        };
        assert_eq!(raw.text, None);
        assert_eq!(raw.emojis, ["👍", "🎉"]);
        assert_eq!(raw.meta, "[07:24, 10/18/2019] John: ");
    }

    #[test]
    fn reply_keeps_quote_and_inline_emoji() {
        let nodes = markup().messages(&panel(REPLY), false);
        let [RenderedNode::Message(raw)] = nodes.as_slice() else {
            panic!("unexpected nodes: {nodes:?}");
        };
        assert_eq!(raw.text.as_deref(), Some("sure"));
        assert_eq!(raw.quoted.as_deref(), Some("lunch tomorrow?"));
        assert_eq!(raw.emojis, ["😋"]);
    }

    #[test]
    fn images_are_media_whatever_the_source() {
        for src in ["blob:https://web.whatsapp.com/5d1c", "data:image/jpeg;base64,/9j/4AAQ", "https://mmg.whatsapp.net/d/f/x.enc"] {
            let nodes = markup().messages(&panel(&image(src)), false);
            assert_eq!(nodes, [RenderedNode::Media {
                image_src: Some(src.to_owned()),
            }]);
        }
    }

    #[test]
    fn each_bubble_reads_its_own_block() {
        let html = panel(&[TEXT, EMOJI_ONLY, REPLY].concat());
        let metas = markup()
            .messages(&html, false)
            .into_iter()
            .map(|node| match node {
                RenderedNode::Message(raw) => raw.meta,
                RenderedNode::Media { .. } => String::new(),
            })
            .collect::<Vec<_>>();
        assert_eq!(metas, [
            "[07:23, 10/18/2019] John: ",
            "[07:24, 10/18/2019] John: ",
            "[07:25, 10/18/2019] Ann Marie: ",
        ]);
    }

    #[test]
    fn own_bubbles_only_when_asked() {
        let html = panel(&[TEXT, OWN].concat());
        assert_eq!(markup().messages(&html, false).len(), 1);
        assert_eq!(markup().messages(&html, true).len(), 2);
    }

    #[test]
    fn empty_pane_has_no_bubbles() {
        assert!(markup().messages(&panel(""), true).is_empty());
    }

    #[test]
    fn search_rows_list_their_titled_spans() {
        let rows = [
            r#"<div class="_2Z4DV"><span title="Alice Cooper" dir="auto"><span class="matched-text">Alice</span> Cooper</span></div>"#.to_owned(),
            r#"<div class="_2Z4DV"><span title="Alice" dir="auto"><span class="matched-text">Alice</span></span><span>yesterday</span></div>"#.to_owned(),
        ];
        let spans = markup().titled_spans(&rows);
        assert_eq!(spans, [
            TitledSpan {
                row: 0,
                title: "Alice Cooper".to_owned(),
                text: "Alice Cooper".to_owned(),
            },
            TitledSpan {
                row: 1,
                title: "Alice".to_owned(),
                text: "Alice".to_owned(),
            },
        ]);
    }

    #[test]
    fn bad_override_is_reported() {
        let selectors = Selectors {
            quoted: "span[".to_owned(),
            ..Selectors::default()
        };
        assert!(Markup::compile(&selectors).is_err());
    }
}
