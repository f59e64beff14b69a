//! Collaborator contracts.
//!
//! The engine owns reconciliation logic only. Everything with a deployment-specific implementation (persistence,
//! the outbound processor transport, delayed task dispatch) is behind one of these traits:
//!
//! * [`PaymentStore`]: CRUD persistence of payment, preapproval, refund and notification-log records.
//! * [`ProcessorClient`]: the network calls to the processor, including the notification verification re-POST.
//! * [`UpdateScheduler`]: single-shot delayed re-checks of processor-side status.
mod payment_store;
mod processor;
mod update_scheduler;

pub use payment_store::{PaymentStore, StoreError};
pub use processor::{ProcessorClient, ProcessorError};
pub use update_scheduler::{NullScheduler, UpdateScheduler};
