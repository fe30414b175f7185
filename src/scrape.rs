pub mod cancel;
pub mod chrome;
pub mod collect;
pub mod dom;
pub mod locate;
pub mod markup;
pub mod puppeteer;
pub mod selectors;
pub mod wait;

pub use cancel::{pause, with_deadline};
pub use chrome::ChromeDom;
pub use collect::{CollectOptions, Outcome, collect, partition};
pub use dom::{Dom, RawMessage, RenderedNode, Target, TitledSpan};
pub use locate::{Conversation, search_contact};
pub use markup::Markup;
pub use puppeteer::Session;
pub use selectors::Selectors;
pub use wait::wait_for;

pub const BASE_URL: &str = "https://web.whatsapp.com/";
