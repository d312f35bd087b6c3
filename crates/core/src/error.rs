use thiserror::Error;

/// Failure converting between a typed value and its persisted JSON document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed {shape} document: {source}")]
    Malformed {
        shape: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode {shape} document: {source}")]
    Encode {
        shape: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl DocumentError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed_document",
            Self::Encode { .. } => "encode_failed",
        }
    }

    /// Short name of the document shape that failed.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Malformed { shape, .. } | Self::Encode { shape, .. } => shape,
        }
    }
}
