use std::sync::Arc;

use headless_chrome::Tab;
use serde_json::Value;
use tokio::task::spawn_blocking;

use super::{
    dom::{Dom, RenderedNode, Target, TitledSpan},
    markup::Markup,
    selectors::Selectors,
};
use crate::{Error, Result};

// `clear()` on a contenteditable box, fired as real edits so the page notices
const CLEAR_INPUT: &str = "function() { this.focus(); document.execCommand('selectAll', false); document.execCommand('delete', false); }";

/// [`Dom`] over a live WhatsApp Web tab.
///
/// headless_chrome blocks, so every query runs on the blocking pool. Regions are
/// found with `document.evaluate` over the whole page; bubbles and search rows
/// are read as HTML and picked apart by [`Markup`].
pub struct ChromeDom {
    tab: Arc<Tab>,
    selectors: Arc<Selectors>,
    markup: Markup,
}

impl ChromeDom {
    pub fn new(tab: Arc<Tab>, selectors: Selectors) -> anyhow::Result<Self> {
        let markup = Markup::compile(&selectors)?;
        Ok(Self {
            tab,
            selectors: Arc::new(selectors),
            markup,
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tab, &Selectors) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        let selectors = Arc::clone(&self.selectors);

        Ok(spawn_blocking(move || f(&tab, &selectors))
            .await
            .map_err(anyhow::Error::from)??)
    }
}

/// JS running `body` with `node` bound to the first match of `xpath`, or `null`.
fn with_first_node(xpath: &str, body: &str) -> anyhow::Result<String> {
    let xpath = serde_json::to_string(xpath)?;
    Ok(format!(
        "(() => {{ const node = document.evaluate({xpath}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue; {body} }})()"
    ))
}

/// JS returning the outer HTML of every match of `xpath`, as a JSON array.
fn all_outer_html(xpath: &str) -> anyhow::Result<String> {
    let xpath = serde_json::to_string(xpath)?;
    Ok(format!(
        "(() => {{ const found = document.evaluate({xpath}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const html = []; for (let i = 0; i < found.snapshotLength; i++) html.push(found.snapshotItem(i).outerHTML); return JSON.stringify(html); }})()"
    ))
}

fn evaluate(tab: &Tab, expression: &str) -> anyhow::Result<Value> {
    Ok(tab.evaluate(expression, false)?.value.unwrap_or(Value::Null))
}

impl Dom for ChromeDom {
    async fn present(&self, target: Target) -> Result<bool> {
        self.blocking(move |tab, selectors| {
            match evaluate(tab, &with_first_node(selectors.target(target), "return node !== null;")?)? {
                Value::Bool(present) => Ok(present),
                other => anyhow::bail!("presence check for the {target} returned {other}"),
            }
        })
        .await
    }

    async fn type_search(&self, name: &str) -> Result<()> {
        let name = name.to_owned();
        self.blocking(move |tab, selectors| {
            let search = tab.find_element_by_xpath(&selectors.search_box)?;
            search.click()?;
            search.call_js_fn(CLEAR_INPUT, Vec::new(), false)?;
            search.type_into(&name)?;
            Ok(())
        })
        .await
    }

    async fn search_results(&self) -> Result<Vec<TitledSpan>> {
        let rows = self
            .blocking(|tab, selectors| match evaluate(tab, &all_outer_html(&selectors.result_rows)?)? {
                Value::String(json) => Ok(serde_json::from_str::<Vec<String>>(&json)?),
                other => anyhow::bail!("search results returned {other}"),
            })
            .await?;

        Ok(self.markup.titled_spans(&rows))
    }

    async fn open_result(&self, span: &TitledSpan) -> Result<()> {
        let TitledSpan { row, title, .. } = span.clone();
        let clicked = self
            .blocking(move |tab, selectors| {
                let rows = tab.find_elements_by_xpath(&selectors.result_rows)?;
                let Some(element) = rows.get(row) else {
                    return Ok(false);
                };

                // CSS lookups are scoped to the row, XPath ones are not
                for candidate in element.find_elements(&selectors.result_title)? {
                    if candidate.get_attribute_value("title")?.as_deref() == Some(title.as_str()) {
                        candidate.click()?;
                        return Ok(true);
                    }
                }
                Ok(false)
            })
            .await?;

        if clicked {
            Ok(())
        } else {
            Err(Error::ElementTransient(format!(
                "search result #{} titled {:?} went away",
                span.row, span.title
            )))
        }
    }

    async fn rendered_messages(&self, include_my_user: bool) -> Result<Vec<RenderedNode>> {
        let html = self
            .blocking(|tab, selectors| {
                let js = with_first_node(&selectors.message_panel, "return node === null ? null : node.outerHTML;")?;
                match evaluate(tab, &js)? {
                    Value::String(html) => Ok(Some(html)),
                    Value::Null => Ok(None),
                    other => anyhow::bail!("message panel returned {other}"),
                }
            })
            .await?;

        let Some(html) = html else {
            tracing::debug!(target: "collector", "message panel not rendered");
            return Ok(Vec::new());
        };
        Ok(self.markup.messages(&html, include_my_user))
    }

    async fn focus(&self) -> Result<()> {
        self.blocking(|tab, selectors| {
            tab.find_element_by_xpath(&selectors.body)?.click()?;
            Ok(())
        })
        .await
    }

    async fn scroll_up(&self) -> Result<()> {
        self.blocking(|tab, _| {
            tab.press_key("PageUp")?;
            Ok(())
        })
        .await
    }
}
