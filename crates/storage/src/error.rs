use thiserror::Error;

use palisade_protocol::{ErrorPayload, error_codes};

use crate::types::NamespacePair;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("namespace '{requested}' not granted to '{requesting}'")]
    Denied {
        requesting: String,
        requested: String,
    },

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    #[must_use]
    pub fn denied(pair: &NamespacePair) -> Self {
        Self::Denied {
            requesting: pair.requesting.clone(),
            requested: pair.requested.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// JSON projection of a storage fault for the reply envelope. Denials
/// carry the namespace pair as structured detail; everything else is
/// message-only.
impl From<&Error> for ErrorPayload {
    fn from(err: &Error) -> Self {
        match err {
            Error::Denied {
                requesting,
                requested,
            } => ErrorPayload::new(err.to_string())
                .with_code(error_codes::PERMISSION_DENIED)
                .with_details(serde_json::json!({
                    "requesting": requesting,
                    "requested": requested,
                })),
            Error::Io(_) | Error::Json(_) | Error::Message(_) => {
                ErrorPayload::new(err.to_string()).with_code(error_codes::STORAGE)
            },
        }
    }
}
