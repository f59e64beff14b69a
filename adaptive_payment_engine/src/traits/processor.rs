use thiserror::Error;

use crate::processor_types::{
    ApiResponse,
    CancelPreapprovalResponse,
    DetailsResponse,
    IpnVerification,
    PayRequest,
    PayResponse,
    PreapprovalRequest,
    PreapprovalResponse,
    RefundResponse,
};

#[derive(Debug, Clone, Error)]
pub enum ProcessorError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the processor: {0}")]
    Transport(String),
    #[error("Processor call failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize processor response: {0}")]
    JsonError(String),
}

/// Outbound transport to the payment processor.
///
/// Every call is a single request/response exchange with no retry; on transport failure the triggering operation
/// fails and is surfaced to its caller. The engine archives the `raw` half of each [`ApiResponse`] on the record for
/// audit.
#[allow(async_fn_in_trait)]
pub trait ProcessorClient: Send + Sync {
    async fn pay(&self, request: &PayRequest) -> Result<ApiResponse<PayResponse>, ProcessorError>;

    async fn preapprove(
        &self,
        request: &PreapprovalRequest,
    ) -> Result<ApiResponse<PreapprovalResponse>, ProcessorError>;

    async fn payment_details(&self, pay_key: &str) -> Result<ApiResponse<DetailsResponse>, ProcessorError>;

    async fn preapproval_details(
        &self,
        preapproval_key: &str,
    ) -> Result<ApiResponse<DetailsResponse>, ProcessorError>;

    async fn refund(&self, pay_key: &str) -> Result<ApiResponse<RefundResponse>, ProcessorError>;

    async fn cancel_preapproval(
        &self,
        preapproval_key: &str,
    ) -> Result<ApiResponse<CancelPreapprovalResponse>, ProcessorError>;

    /// Re-POSTs the *exact original raw body* of an inbound notification back to the processor's verification
    /// endpoint, unmodified. Only a `VERIFIED` answer makes the notification trustworthy; `INVALID` or any transport
    /// failure means it must be discarded without touching any record.
    async fn verify_ipn(&self, raw_body: &[u8]) -> Result<IpnVerification, ProcessorError>;
}
