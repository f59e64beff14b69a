//! Shared parsing helpers for processor responses.
//!
//! Both record kinds refresh the same field set on a poll update (status, status detail, sender email), and each
//! field value is computed by a pure function of `(current record, remote response)` collected here. The status maps
//! are also what the creation flow uses to interpret an immediate response.

use crate::{
    db_types::{PaymentStatus, PreapprovalStatus},
    processor_types::{DetailsResponse, PayResponse},
};

/// The processor sends booleans as `"true"` / `"false"` strings.
pub fn parse_remote_bool(value: Option<&str>) -> bool {
    value.map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// `"{severity} {error_id}: {message}"` for the first entry of a creation error list, if there is one.
pub fn first_error_detail(response: &PayResponse) -> Option<String> {
    let entry = response.pay_error_list.as_ref()?.pay_error.first()?;
    let e = &entry.error;
    Some(format!("{} {}: {}", e.severity, e.error_id, e.message))
}

/// Sender email as reported by a details lookup. Preapproval responses only carry a nested `sender` object, so that
/// is the fallback when the flat field is absent.
pub fn poll_sender_email(response: &DetailsResponse) -> String {
    response
        .sender_email
        .clone()
        .or_else(|| response.sender.as_ref().and_then(|s| s.email.clone()))
        .unwrap_or_default()
}

/// Payment status as refreshed by a poll. Unrecognized remote statuses leave the local status unchanged.
pub fn poll_payment_status(current: PaymentStatus, response: &DetailsResponse) -> PaymentStatus {
    match response.status.as_deref() {
        Some("COMPLETED") => PaymentStatus::Completed,
        Some("CREATED") => PaymentStatus::Created,
        Some("ERROR") => PaymentStatus::Error,
        _ => current,
    }
}

/// Preapproval status as refreshed by a poll.
///
/// The used-up check wins over whatever the raw `status` field says: once the completed-payment count reaches the
/// allowed maximum the preapproval is spent, full stop.
pub fn poll_preapproval_status(current: PreapprovalStatus, response: &DetailsResponse) -> PreapprovalStatus {
    let approved = parse_remote_bool(response.approved.as_deref());
    match (&response.cur_payments, &response.max_number_of_payments) {
        (Some(cur), Some(max)) if cur == max => return PreapprovalStatus::Used,
        _ => {},
    }
    match response.status.as_deref() {
        Some("ACTIVE") if approved => PreapprovalStatus::Approved,
        Some("ACTIVE") => PreapprovalStatus::Created,
        Some("CANCELED") => PreapprovalStatus::Canceled,
        _ => current,
    }
}
