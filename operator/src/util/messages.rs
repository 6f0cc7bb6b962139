/// User-facing `status.message` whenever an instance first appears to
/// the reconciler and has not yet been provisioned.
pub const PENDING: &str = "Resource first appeared to the controller.";

/// `status.message` while blocked on an unresolved dependency.
pub const WAITING_ON_DEPENDENCIES: &str = "Waiting on one or more dependencies to become ready.";

/// `status.message` once the primary object has been created.
pub const READY: &str = "Provisioned successfully.";

/// `status.message` when the primary object succeeded but a secondary
/// side effect (e.g. a binding update) failed.
pub const PARTIALLY_READY: &str = "Provisioned, but a secondary side effect failed.";

/// `status.message` when a health probe against the resource's custom
/// hostname fails.
pub const HEALTH_CHECK_FAILED: &str = "Health check failed.";
