//! The seam between the scraping algorithms and the page.
//!
//! Everything that knows about WhatsApp Web markup lives behind [`Dom`];
//! locating, waiting and collecting only see the plain values defined here.

use core::fmt;

use crate::Result;

/// Regions the scraper waits for before reading them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    SidePanel,
    SearchResults,
    MessagePane,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SidePanel => "side panel",
            Self::SearchResults => "search results",
            Self::MessagePane => "message pane",
        })
    }
}

/// A `span[@title]` inside one row of the contact search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitledSpan {
    pub row: usize,
    pub title: String,
    pub text: String,
}

/// What a rendered message bubble holds, read as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedNode {
    /// The bubble has a copyable text block.
    Message(RawMessage),
    /// No copyable text block: a picture, sticker, or similar.
    Media { image_src: Option<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    /// `data-pre-plain-text`, e.g. `[07:23, 10/18/2019] John: `.
    pub meta: String,
    /// Body text; `None` when the block only carries emoji images.
    pub text: Option<String>,
    /// `data-plain-text` of every emoji image in the block, in order.
    pub emojis: Vec<String>,
    pub quoted: Option<String>,
}

pub trait Dom {
    /// Whether `target` is currently in the document. "Not there yet" is `Ok(false)`.
    async fn present(&self, target: Target) -> Result<bool>;

    /// Clears the sidebar search box and types `name` into it.
    async fn type_search(&self, name: &str) -> Result<()>;

    async fn search_results(&self) -> Result<Vec<TitledSpan>>;

    async fn open_result(&self, span: &TitledSpan) -> Result<()>;

    /// Message bubbles currently rendered in the conversation pane, oldest first.
    ///
    /// Without `include_my_user` only incoming bubbles are returned.
    /// Bubbles that go stale while being read are left out.
    async fn rendered_messages(&self, include_my_user: bool) -> Result<Vec<RenderedNode>>;

    /// Clicks the page body so that key presses reach the conversation.
    async fn focus(&self) -> Result<()>;

    /// One page of history upwards.
    async fn scroll_up(&self) -> Result<()>;
}
