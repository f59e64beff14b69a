//! Adaptive Payment Engine
//!
//! The engine mediates payments through a processor's asynchronous adaptive-payments API (split and chained payments,
//! preapprovals). Its central job is the reconciliation protocol: the processor pushes delayed, out-of-order, possibly
//! duplicated, possibly forged Instant Payment Notifications (IPNs) about payment state, which have to be verified
//! against the processor, cross-checked against the amounts we recorded, and merged into a local state machine that
//! is also advanced independently by user browser redirects and by scheduled polling.
//!
//! The library is divided into three main sections:
//! 1. Data types and invariants ([`mod@db_types`], [`mod@receivers`], [`mod@ipn`]). These are the records the engine
//!    reconciles, the receiver-set validation rules for split payments, and the trusted notification type that only
//!    the verifier can produce.
//! 2. Collaborator contracts ([`mod@traits`]). Persistence, the outbound processor transport and delayed-update
//!    scheduling are external collaborators; backends implement these traits. An in-memory reference store is
//!    provided for tests and development.
//! 3. The reconciliation API ([`ReconciliationApi`]). All status transitions flow through it, from any of the three
//!    update paths, under a per-record lock so concurrent triggers cannot produce lost updates.
pub mod db_types;
pub mod helpers;
pub mod ipn;
pub mod processor_types;
pub mod receivers;
pub mod settings;
pub mod traits;

mod flow_api;
mod memory_store;

pub use flow_api::{IpnOutcome, Reconcilable, ReconciliationApi, TransitionError};
pub use memory_store::MemoryStore;
