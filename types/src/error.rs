use thiserror::Error;

/// Error vocabulary for the control plane's core operations. Variants
/// are structured so callers can classify them into the retry/status
/// policy without re-parsing a message string.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no CRD registered for {group}/{version} {plural}")]
    UnknownKind {
        group: String,
        version: String,
        plural: String,
    },

    #[error("{kind} {name} not found")]
    NotFound { kind: String, name: String },

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("dependency not ready: {0}")]
    DependencyNotReady(String),

    #[error("provider call failed transiently: {0}")]
    ProviderTransient(String),

    #[error("provider rejected the request: {0}")]
    ProviderPermanent(String),

    #[error("secondary side effect failed: {0}")]
    ChildSideEffectFailed(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timestamp parse error: {0}")]
    Chrono(#[from] chrono::ParseError),

    #[error("duration parse error: {0}")]
    Duration(#[from] parse_duration::parse::Error),
}
