pub mod error;
pub mod merge;
pub mod messages;

#[cfg(feature = "metrics")]
pub mod metrics;

pub use error::AppError;
pub use merge::shallow_merge;

/// Name of the controller acting as the writer of record for status
/// updates and reconciler-driven mutations.
pub const MANAGER_NAME: &str = "ferrite-operator";
