//! Commands module - service layer for grant reconciliation operations

mod apply;
mod find;
mod plan;
mod revoke;
pub(crate) mod service;

pub use service::GrantReconciler;
