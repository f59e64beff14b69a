//! The reconciliation engine.
//!
//! All status transitions for payments and preapprovals flow through [`ReconciliationApi`], whichever of the three
//! update paths triggered them: a user browser redirect, an inbound verified notification, or a scheduled poll of the
//! processor. The logic shared between the two record kinds is parameterized by the [`Reconcilable`] capability
//! trait rather than a type hierarchy.
mod errors;
mod reconcilable;
mod reconciliation;

pub use errors::TransitionError;
pub use reconcilable::Reconcilable;
pub use reconciliation::{IpnOutcome, ReconciliationApi};
