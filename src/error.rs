use std::path::PathBuf;

use thiserror::Error;

pub type GridResult<T> = Result<T, GridError>;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid results document: {0}")]
    Validation(#[from] ValidationError),

    #[error("i/o failure on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unreadable mapping csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("no animation frame could be rendered")]
    NoFrames,
}

impl GridError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Structural violation found while reading a results document.
///
/// `location` is a human-readable path such as `dataset 0, module 1`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{location} must be a JSON object")]
    NotAnObject { location: String },

    #[error("{location} missing required field: '{field}'")]
    MissingField {
        location: String,
        field: &'static str,
    },

    #[error("{location}: '{field}' must be {expected}")]
    WrongType {
        location: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{location}: '{field}' list cannot be empty")]
    EmptySequence {
        location: String,
        field: &'static str,
    },

    #[error("{location} must have 'identifier' or 'id' field")]
    MissingIdentifier { location: String },
}

impl ValidationError {
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::NotAnObject { location }
            | Self::MissingField { location, .. }
            | Self::WrongType { location, .. }
            | Self::EmptySequence { location, .. }
            | Self::MissingIdentifier { location } => location,
        }
    }
}
