use adaptive_payment_engine::{
    processor_types::{
        ApiResponse,
        CancelPreapprovalResponse,
        DetailsResponse,
        IpnVerification,
        PayRequest,
        PayResponse,
        PreapprovalRequest,
        PreapprovalResponse,
        RefundResponse,
    },
    traits::{ProcessorClient, ProcessorError},
};
use mockall::mock;

mock! {
    pub Processor {}
    impl ProcessorClient for Processor {
        async fn pay(&self, request: &PayRequest) -> Result<ApiResponse<PayResponse>, ProcessorError>;
        async fn preapprove(&self, request: &PreapprovalRequest) -> Result<ApiResponse<PreapprovalResponse>, ProcessorError>;
        async fn payment_details(&self, pay_key: &str) -> Result<ApiResponse<DetailsResponse>, ProcessorError>;
        async fn preapproval_details(&self, preapproval_key: &str) -> Result<ApiResponse<DetailsResponse>, ProcessorError>;
        async fn refund(&self, pay_key: &str) -> Result<ApiResponse<RefundResponse>, ProcessorError>;
        async fn cancel_preapproval(&self, preapproval_key: &str) -> Result<ApiResponse<CancelPreapprovalResponse>, ProcessorError>;
        async fn verify_ipn(&self, raw_body: &[u8]) -> Result<IpnVerification, ProcessorError>;
    }
}
