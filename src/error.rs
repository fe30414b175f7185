use core::time::Duration;
use std::{io, path::PathBuf};

use crate::scrape::dom::Target;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A DOM condition never showed up, even after the single retry.
    #[error("{target} did not render within {timeout:?}, even after a retry")]
    LoadTimeout { target: Target, timeout: Duration },

    /// One node went stale or lost a child between two reads.
    #[error("element went away: {0}")]
    ElementTransient(String),

    #[error("malformed message metadata {0:?}")]
    MalformedMeta(String),

    #[error("message extraction failed: {0}")]
    ExtractionFailure(#[source] Box<Self>),

    #[error("cannot export to {}: {source}", path.display())]
    ExportFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Browser(#[from] anyhow::Error),
}

impl Error {
    /// Wraps everything except timeouts and cancellation, which keep their identity for the caller.
    #[must_use]
    pub fn into_extraction_failure(self) -> Self {
        match self {
            e @ (Self::LoadTimeout { .. } | Self::Cancelled | Self::ExtractionFailure(_)) => e,
            e => Self::ExtractionFailure(Box::new(e)),
        }
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
