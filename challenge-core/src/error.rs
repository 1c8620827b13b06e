use thiserror::Error;

/// Configuration problems found while resolving a variant or building its
/// session. These are the only errors that abort widget construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown challenge variant `{0}`")]
    UnknownVariant(String),
    #[error("variant `{variant}` requires descriptor field `{field}`")]
    MissingField {
        variant: &'static str,
        field: &'static str,
    },
    #[error("variant `{variant}` cannot use descriptor: {reason}")]
    InvalidDescriptor {
        variant: &'static str,
        reason: String,
    },
}

/// Challenge retrieval failures. Session construction halts; nothing retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("challenge request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("challenge request failed: {0}")]
    Transport(String),
    #[error("challenge response could not be decoded: {0}")]
    Decode(String),
}

/// Submission failures. Logged only; `submitted` is never rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("submission rejected with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("submission failed: {0}")]
    Transport(String),
    #[error("submission response could not be decoded: {0}")]
    Decode(String),
}
