// ⚠️ Verification Errors
// Failures that are NOT verdicts: a list that cannot be loaded, a date that cannot be read.
// A legitimate "not authorized" is always Ok(false), never one of these.

use crate::lists::ListKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Failed to read {list} list from {path:?}: {source}")]
    ListRead {
        list: ListKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {list} list from {path:?}: {source}")]
    ListParse {
        list: ListKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{list} list has no '{key}' entry")]
    ListKeyMissing { list: ListKind, key: &'static str },

    #[error("Unparsable date: '{0}'")]
    DateFormat(String),
}

impl VerificationError {
    /// Reference list could not be loaded (ConfigurationError)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            VerificationError::ListRead { .. }
                | VerificationError::ListParse { .. }
                | VerificationError::ListKeyMissing { .. }
        )
    }

    /// Input timestamp could not be parsed (FormatError)
    pub fn is_format(&self) -> bool {
        matches!(self, VerificationError::DateFormat(_))
    }
}

pub type VerificationResult<T> = Result<T, VerificationError>;
