//! Outbound client for the processor's Adaptive Payments API.
//!
//! Implements the engine's [`adaptive_payment_engine::traits::ProcessorClient`] contract over HTTPS: the JSON
//! operation endpoints (Pay, Preapproval, details lookups, Refund, CancelPreapproval) and the form-encoded
//! notification verification re-POST.
mod api;
mod config;
mod error;

pub use api::AdaptiveApi;
pub use config::AdaptiveConfig;
pub use error::AdaptiveApiError;
