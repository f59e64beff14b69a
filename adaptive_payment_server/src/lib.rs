//! # Adaptive Payment Server
//! The HTTP delivery layer of the gateway. It is responsible for:
//! * Receiving notification (IPN) deliveries from the payment processor and handing them to the engine.
//! * Receiving browser return and cancel redirects from senders finishing (or abandoning) checkout.
//! * Running the delayed-update worker that polls the processor for records whose state is still in flight.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `GET /health`: liveness check.
//! * `POST /ipn/{object_id}/{secret}`: notification deliveries.
//! * `GET /payments/{id}/return/{secret}` and `GET /payments/{id}/cancel/{secret}`: payment browser redirects.
//! * `GET /preapprovals/{id}/return/{secret}` and `GET /preapprovals/{id}/cancel`: preapproval browser redirects.
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod scheduler;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
