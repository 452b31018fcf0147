//! Error types for authoring, import and persistence.
//!
//! `StoreError` is defined here rather than in `examforge-store` so the
//! import coordinator can classify credential failures without string
//! matching.

use thiserror::Error;

/// Errors reported by a [`QuestionStore`](crate::traits::QuestionStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The credential is missing, expired or rejected.
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// The addressed record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The store answered with an error status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The store could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The store answered with a body we could not read.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Returns `true` for credential failures, which are never retried.
    pub fn is_auth(&self) -> bool {
        matches!(self, StoreError::Unauthorized(_))
    }
}

/// Coarse classification of an [`AuthoringError`], used by callers that
/// only need to branch on the failure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    MissingField,
    InvalidType,
    InvalidShape,
    Persistence,
    Auth,
}

/// Everything that can go wrong while editing, importing or submitting a
/// question.
#[derive(Debug, Error)]
pub enum AuthoringError {
    /// The text is not valid JSON, or not the expected top-level shape.
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// One of the required fields is absent or empty.
    #[error("the JSON must contain at least {}", quote_all(.required))]
    MissingField { required: Vec<&'static str> },

    /// A batch holds no question at all.
    #[error("nothing to import: the JSON array is empty")]
    NothingToImport,

    /// The `type` tag is outside the closed set of the surface.
    #[error("invalid type \"{found}\". Valid types: {}", .valid.join(", "))]
    InvalidType {
        found: String,
        valid: Vec<&'static str>,
    },

    /// The payload does not have the shape its kind requires.
    #[error("{0}")]
    InvalidShape(String),

    /// A batch candidate failed validation. `position` is 1-based.
    #[error("question {position}: {source}")]
    Item {
        position: usize,
        #[source]
        source: Box<AuthoringError>,
    },

    /// The store rejected the credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The store call failed for any other reason.
    #[error("persistence failed: {0}")]
    Persistence(#[source] StoreError),
}

impl AuthoringError {
    pub fn missing(required: &[&'static str]) -> Self {
        AuthoringError::MissingField {
            required: required.to_vec(),
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        AuthoringError::InvalidShape(message.into())
    }

    /// Wraps `self` with the 1-based position of the offending batch item.
    pub fn at_position(self, position: usize) -> Self {
        AuthoringError::Item {
            position,
            source: Box::new(self),
        }
    }

    /// The failure family, looking through batch item wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthoringError::Parse(_) => ErrorKind::Parse,
            AuthoringError::MissingField { .. } | AuthoringError::NothingToImport => {
                ErrorKind::MissingField
            }
            AuthoringError::InvalidType { .. } => ErrorKind::InvalidType,
            AuthoringError::InvalidShape(_) => ErrorKind::InvalidShape,
            AuthoringError::Item { source, .. } => source.kind(),
            AuthoringError::Auth(_) => ErrorKind::Auth,
            AuthoringError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// The 1-based batch position, if this error names one.
    pub fn position(&self) -> Option<usize> {
        match self {
            AuthoringError::Item { position, .. } => Some(*position),
            _ => None,
        }
    }
}

impl From<StoreError> for AuthoringError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthorized(message) => AuthoringError::Auth(message),
            other => AuthoringError::Persistence(other),
        }
    }
}

fn quote_all(fields: &[&'static str]) -> String {
    let quoted: Vec<String> = fields.iter().map(|f| format!("\"{f}\"")).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {last}", rest.join(", ")),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}
