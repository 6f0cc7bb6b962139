//! Shared data model for the control plane: CRDs, resource instances,
//! reconcile messages and the dependency edges between instances.
//!
//! This crate has no I/O of its own. It exists so the store, the queue,
//! the reconciler and the REST surface all agree on the same wire shapes
//! without importing each other.

mod crd;
mod dependency;
mod error;
mod message;
mod resource;
mod status;

pub use crd::{Crd, CrdScope};
pub use dependency::DependencyEdge;
pub use error::Error;
pub use message::{ReconcileAction, ReconcileMessage};
pub use resource::{GroupVersionPlural, ResourceInstance, ResourceRef};
pub use status::ResourceState;

pub type Result<T> = std::result::Result<T, Error>;
