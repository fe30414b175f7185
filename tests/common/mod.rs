#![allow(dead_code)]

use core::{cell::RefCell, time::Duration};

use wasc::{
    Error, Result,
    config::Timing,
    scrape::{Dom, RawMessage, RenderedNode, Target, TitledSpan},
};

pub fn fast_timing() -> Timing {
    Timing {
        load_timeout: Duration::from_millis(30),
        poll_period: Duration::from_millis(5),
        scroll_pause: Duration::from_millis(1),
        contact_pause: Duration::from_millis(1),
        startup_pause: Duration::ZERO,
    }
}

#[derive(Debug, Clone)]
pub struct Bubble {
    pub node: RenderedNode,
    pub outgoing: bool,
}

pub fn text(meta: &str, body: &str) -> Bubble {
    Bubble {
        node: RenderedNode::Message(RawMessage {
            meta: meta.to_owned(),
            text: Some(body.to_owned()),
            ..RawMessage::default()
        }),
        outgoing: false,
    }
}

pub fn mine(meta: &str, body: &str) -> Bubble {
    Bubble {
        outgoing: true,
        ..text(meta, body)
    }
}

pub fn emoji_only(meta: &str, emojis: &[&str]) -> Bubble {
    Bubble {
        node: RenderedNode::Message(RawMessage {
            meta: meta.to_owned(),
            text: None,
            emojis: emojis.iter().map(|e| (*e).to_owned()).collect(),
            quoted: None,
        }),
        outgoing: false,
    }
}

pub fn image(src: &str) -> Bubble {
    Bubble {
        node: RenderedNode::Media {
            image_src: Some(src.to_owned()),
        },
        outgoing: false,
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub polls: usize,
    pub searches: Vec<String>,
    pub opened: Vec<TitledSpan>,
    pub passes: usize,
    pub focus_clicks: usize,
    pub scrolls: usize,
}

/// A WhatsApp Web page held in memory.
///
/// `history` is the whole conversation, oldest first; the newest `window`
/// bubbles are rendered and every scroll reveals `step` older ones.
#[derive(Debug, Default)]
pub struct FakeDom {
    pub history: Vec<Bubble>,
    pub window: usize,
    pub step: usize,
    /// Targets that never render.
    pub absent: Vec<Target>,
    /// Targets that only render after this many polls.
    pub slow: Vec<(Target, usize)>,
    /// Search results, listed once `results_after` searches have been typed.
    pub results: Vec<TitledSpan>,
    pub results_after: usize,
    /// Searches that fail outright.
    pub failing_searches: usize,
    pub state: RefCell<Counters>,
}

impl FakeDom {
    pub fn conversation(history: Vec<Bubble>) -> Self {
        let window = history.len();
        Self {
            history,
            window,
            step: 1,
            results: vec![TitledSpan {
                row: 0,
                title: "Alice".to_owned(),
                text: "Alice".to_owned(),
            }],
            ..Self::default()
        }
    }

    pub fn counters(&self) -> std::cell::Ref<'_, Counters> {
        self.state.borrow()
    }
}

impl Dom for FakeDom {
    async fn present(&self, target: Target) -> Result<bool> {
        let mut state = self.state.borrow_mut();
        state.polls += 1;
        if self.absent.contains(&target) {
            return Ok(false);
        }
        Ok(self
            .slow
            .iter()
            .find(|(t, _)| *t == target)
            .is_none_or(|(_, after)| state.polls > *after))
    }

    async fn type_search(&self, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.searches.push(name.to_owned());
        if state.searches.len() <= self.failing_searches {
            return Err(Error::Browser(anyhow::anyhow!("search box detached")));
        }
        Ok(())
    }

    async fn search_results(&self) -> Result<Vec<TitledSpan>> {
        let state = self.state.borrow();
        if state.searches.len() > self.results_after {
            Ok(self.results.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn open_result(&self, span: &TitledSpan) -> Result<()> {
        self.state.borrow_mut().opened.push(span.clone());
        Ok(())
    }

    async fn rendered_messages(&self, include_my_user: bool) -> Result<Vec<RenderedNode>> {
        let mut state = self.state.borrow_mut();
        state.passes += 1;
        let visible = (self.window + state.scrolls * self.step).min(self.history.len());
        Ok(self.history[self.history.len() - visible..]
            .iter()
            .filter(|bubble| include_my_user || !bubble.outgoing)
            .map(|bubble| bubble.node.clone())
            .collect())
    }

    async fn focus(&self) -> Result<()> {
        self.state.borrow_mut().focus_clicks += 1;
        Ok(())
    }

    async fn scroll_up(&self) -> Result<()> {
        self.state.borrow_mut().scrolls += 1;
        Ok(())
    }
}
