use std::sync::Arc;

use adaptive_payment_engine::{
    ipn::constants::{VERIFY_RESPONSE_INVALID, VERIFY_RESPONSE_VERIFIED},
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
        RequestEnvelope,
    },
    traits::{ProcessorClient, ProcessorError},
};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use crate::{config::AdaptiveConfig, error::AdaptiveApiError};

#[derive(Clone)]
pub struct AdaptiveApi {
    config: AdaptiveConfig,
    client: Arc<Client>,
}

impl AdaptiveApi {
    pub fn new(config: AdaptiveConfig) -> Result<Self, AdaptiveApiError> {
        let mut headers = HeaderMap::with_capacity(6);
        let header = |v: &str| HeaderValue::from_str(v).map_err(|e| AdaptiveApiError::Initialization(e.to_string()));
        headers.insert("X-PAYPAL-SECURITY-USERID", header(&config.user_id)?);
        headers.insert("X-PAYPAL-SECURITY-PASSWORD", header(config.password.reveal())?);
        headers.insert("X-PAYPAL-SECURITY-SIGNATURE", header(config.signature.reveal())?);
        headers.insert("X-PAYPAL-APPLICATION-ID", header(&config.application_id)?);
        headers.insert("X-PAYPAL-REQUEST-DATA-FORMAT", HeaderValue::from_static("JSON"));
        headers.insert("X-PAYPAL-RESPONSE-DATA-FORMAT", HeaderValue::from_static("JSON"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AdaptiveApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    /// POSTs one JSON operation and hands back the raw body next to the parsed form, so the engine can archive the
    /// exchange verbatim.
    async fn call<T: DeserializeOwned, B: Serialize>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, AdaptiveApiError> {
        let url = format!("{}/{operation}", self.config.endpoint.trim_end_matches('/'));
        trace!("Sending {operation} call to {url}");
        let response =
            self.client.post(url).json(body).send().await.map_err(|e| AdaptiveApiError::Transport(e.to_string()))?;
        let status = response.status();
        let raw = response.text().await.map_err(|e| AdaptiveApiError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(AdaptiveApiError::QueryError { status: status.as_u16(), message: raw });
        }
        trace!("{operation} call successful ({status})");
        let parsed = serde_json::from_str::<T>(&raw).map_err(|e| AdaptiveApiError::JsonError(e.to_string()))?;
        Ok(ApiResponse { raw, parsed })
    }

    fn key_request(key_field: &str, key: &str) -> serde_json::Value {
        let mut body = json!({ "requestEnvelope": RequestEnvelope::default() });
        body[key_field] = json!(key);
        body
    }
}

impl ProcessorClient for AdaptiveApi {
    async fn pay(&self, request: &PayRequest) -> Result<ApiResponse<PayResponse>, ProcessorError> {
        Ok(self.call("Pay", request).await?)
    }

    async fn preapprove(
        &self,
        request: &PreapprovalRequest,
    ) -> Result<ApiResponse<PreapprovalResponse>, ProcessorError> {
        Ok(self.call("Preapproval", request).await?)
    }

    async fn payment_details(&self, pay_key: &str) -> Result<ApiResponse<DetailsResponse>, ProcessorError> {
        Ok(self.call("PaymentDetails", &Self::key_request("payKey", pay_key)).await?)
    }

    async fn preapproval_details(
        &self,
        preapproval_key: &str,
    ) -> Result<ApiResponse<DetailsResponse>, ProcessorError> {
        Ok(self.call("PreapprovalDetails", &Self::key_request("preapprovalKey", preapproval_key)).await?)
    }

    async fn refund(&self, pay_key: &str) -> Result<ApiResponse<RefundResponse>, ProcessorError> {
        Ok(self.call("Refund", &Self::key_request("payKey", pay_key)).await?)
    }

    async fn cancel_preapproval(
        &self,
        preapproval_key: &str,
    ) -> Result<ApiResponse<CancelPreapprovalResponse>, ProcessorError> {
        Ok(self.call("CancelPreapproval", &Self::key_request("preapprovalKey", preapproval_key)).await?)
    }

    /// The verification endpoint answers the raw body with a bare `VERIFIED` or `INVALID`. Anything else is treated
    /// as `INVALID`, since an unverifiable notification must never be applied.
    async fn verify_ipn(&self, raw_body: &[u8]) -> Result<IpnVerification, ProcessorError> {
        let response = self
            .client
            .post(&self.config.verification_endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(raw_body.to_vec())
            .send()
            .await
            .map_err(|e| ProcessorError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ProcessorError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ProcessorError::QueryError { status: status.as_u16(), message: text });
        }
        match text.trim() {
            VERIFY_RESPONSE_VERIFIED => Ok(IpnVerification::Verified),
            VERIFY_RESPONSE_INVALID => Ok(IpnVerification::Invalid),
            other => {
                warn!("Unexpected verification response: {other}");
                Ok(IpnVerification::Invalid)
            },
        }
    }
}
