//! Typed views of the processor's request and response payloads.
//!
//! Responses are deserialized leniently: every field is optional, because the reconciliation rules have to inspect
//! whatever shape the processor actually sent and default the record to `error` with the best available diagnostic
//! rather than fail on an unexpected payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::receivers::WireReceiver;

/// A raw + parsed pair. The raw body is archived on the record for audit; the parsed form drives reconciliation.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub raw: String,
    pub parsed: T,
}

/// Outcome of re-submitting a notification body to the processor's verification endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpnVerification {
    Verified,
    Invalid,
}

//--------------------------------------      Requests       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub error_language: String,
}

impl Default for RequestEnvelope {
    fn default() -> Self {
        Self { error_language: "en_US".to_string() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReceiverList {
    pub receiver: Vec<WireReceiver>,
}

/// The payment creation call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub request_envelope: RequestEnvelope,
    pub action_type: String,
    pub currency_code: String,
    pub receiver_list: WireReceiverList,
    pub return_url: String,
    pub cancel_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipn_notification_url: Option<String>,
    /// Present when the payment draws on an approved preapproval instead of an interactive checkout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preapproval_key: Option<String>,
}

/// The preapproval creation call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreapprovalRequest {
    pub request_envelope: RequestEnvelope,
    pub currency_code: String,
    pub max_total_amount_of_all_payments: String,
    pub starting_date: String,
    pub ending_date: String,
    pub return_url: String,
    pub cancel_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipn_notification_url: Option<String>,
}

//--------------------------------------      Responses      ---------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayResponse {
    pub pay_key: Option<String>,
    #[serde(rename = "paymentExecStatus")]
    pub status: Option<String>,
    pub pay_error_list: Option<PayErrorList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayErrorList {
    pub pay_error: Vec<PayErrorEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PayErrorEntry {
    pub error: ApiError,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiError {
    pub severity: String,
    pub error_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreapprovalResponse {
    pub preapproval_key: Option<String>,
}

/// Shared shape of the payment-details and preapproval-details lookups. The preapproval-only fields are simply absent
/// on payment responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailsResponse {
    pub status: Option<String>,
    pub sender_email: Option<String>,
    pub sender: Option<SenderInfo>,
    /// `"true"` / `"false"` as a string, the way the processor sends booleans.
    pub approved: Option<String>,
    pub cur_payments: Option<String>,
    pub max_number_of_payments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SenderInfo {
    pub email: Option<String>,
    pub account_id: Option<String>,
}

/// Refund and cancellation responses are archived raw and otherwise only matter for having arrived at all, so they
/// stay untyped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RefundResponse(pub Value);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CancelPreapprovalResponse(pub Value);
