#![allow(dead_code)]

use std::sync::Arc;

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
    settings::GatewaySettings,
    traits::{NullScheduler, ProcessorClient, ProcessorError},
    MemoryStore,
    ReconciliationApi,
};
use apg_common::Money;
use mockall::mock;
use rust_decimal::Decimal;

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

pub fn usd(amount: Decimal) -> Money {
    Money::new(amount, "USD")
}

pub fn api(client: MockProcessor) -> (ReconciliationApi<MemoryStore, MockProcessor>, MemoryStore) {
    api_with(client, GatewaySettings::default())
}

pub fn api_with(
    client: MockProcessor,
    settings: GatewaySettings,
) -> (ReconciliationApi<MemoryStore, MockProcessor>, MemoryStore) {
    let _ = env_logger::try_init().ok();
    let store = MemoryStore::new();
    let api = ReconciliationApi::new(store.clone(), Arc::new(client), settings, Arc::new(NullScheduler));
    (api, store)
}

pub fn pay_response(raw: &str, pay_key: Option<&str>, status: Option<&str>) -> ApiResponse<PayResponse> {
    ApiResponse {
        raw: raw.to_string(),
        parsed: PayResponse {
            pay_key: pay_key.map(String::from),
            status: status.map(String::from),
            pay_error_list: None,
        },
    }
}

pub fn details_response(response: DetailsResponse) -> ApiResponse<DetailsResponse> {
    ApiResponse { raw: "{}".to_string(), parsed: response }
}

pub fn details_with_status(status: &str) -> DetailsResponse {
    DetailsResponse { status: Some(status.to_string()), ..Default::default() }
}

/// A payment notification body exactly as the processor would deliver it: form-encoded, with the indexed
/// `transaction[N].field` convention for the embedded sub-transactions.
pub fn payment_ipn_body(status: &str, amounts: &[&str]) -> Vec<u8> {
    let mut body = format!(
        "transaction_type=Adaptive+Payment+PAY&status={status}&sender_email=buyer%40example.com&pay_key=AP-123"
    );
    for (i, amount) in amounts.iter().enumerate() {
        let encoded = amount.replace(' ', "+");
        body.push_str(&format!("&transaction%5B{i}%5D.id=TX{i}&transaction%5B{i}%5D.amount={encoded}"));
    }
    body.into_bytes()
}

pub fn preapproval_ipn_body(status: &str, approved: bool, max_total: &str) -> Vec<u8> {
    let encoded = max_total.replace(' ', "+");
    format!(
        "transaction_type=Adaptive+Payment+PREAPPROVAL&status={status}&approved={approved}\
         &sender_email=buyer%40example.com&preapproval_key=PA-9&max_total_amount_of_all_payments={encoded}"
    )
    .into_bytes()
}
