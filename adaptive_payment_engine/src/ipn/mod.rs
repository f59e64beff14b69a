//! Instant Payment Notification verification and parsing.
//!
//! The processor pushes notifications as form-encoded POSTs. A notification is worthless until it has been
//! authenticated, because anyone who knows the delivery URL can POST to it. Authentication is the processor's own
//! scheme: the *exact original raw body* is re-POSTed, unmodified, to the processor's verification endpoint over a
//! fresh outbound call, and only an answer of `VERIFIED` makes the payload trustworthy. `INVALID` or a transport
//! failure discards the notification without touching any record; the processor retries delivery on its own
//! schedule.
//!
//! A trusted [`Ipn`] value can therefore only be obtained through [`verify_and_parse`]; there is no constructor
//! that accepts untrusted input.

mod transactions;

use apg_common::Money;
use thiserror::Error;
use url::form_urlencoded;

pub use transactions::{IpnTransaction, TransactionList};

use crate::{
    db_types::RecordKind,
    helpers::parse_remote_bool,
    processor_types::IpnVerification,
    traits::ProcessorClient,
};

pub mod constants {
    pub const IPN_TYPE_PAYMENT: &str = "Adaptive Payment PAY";
    pub const IPN_TYPE_PREAPPROVAL: &str = "Adaptive Payment PREAPPROVAL";
    pub const IPN_TYPE_ADJUSTMENT: &str = "Adjustment";
    pub const IPN_STATUS_COMPLETED: &str = "COMPLETED";
    pub const IPN_STATUS_CANCELED: &str = "CANCELED";
    pub const VERIFY_RESPONSE_VERIFIED: &str = "VERIFIED";
    pub const VERIFY_RESPONSE_INVALID: &str = "INVALID";
}

#[derive(Debug, Clone, Error)]
pub enum IpnError {
    #[error("The processor rejected the notification as INVALID")]
    VerificationFailed,
    #[error("Could not reach the processor to verify the notification: {0}")]
    VerificationUnreachable(String),
    #[error("Malformed notification field {field}: {value}")]
    InvalidField { field: String, value: String },
    #[error("The notification carries no transaction amounts")]
    NoTransactionAmounts,
}

/// The kind of object a notification reports on. Adjustments (disputes, reversals) arrive against payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpnKind {
    Payment,
    Preapproval,
    Adjustment,
}

impl IpnKind {
    pub fn from_transaction_type(transaction_type: &str) -> Option<Self> {
        match transaction_type {
            constants::IPN_TYPE_PAYMENT => Some(IpnKind::Payment),
            constants::IPN_TYPE_PREAPPROVAL => Some(IpnKind::Preapproval),
            constants::IPN_TYPE_ADJUSTMENT => Some(IpnKind::Adjustment),
            _ => None,
        }
    }

    /// Which record kind this notification should be matched against.
    pub fn record_kind(&self) -> RecordKind {
        match self {
            IpnKind::Payment | IpnKind::Adjustment => RecordKind::Payment,
            IpnKind::Preapproval => RecordKind::Preapproval,
        }
    }
}

/// A verified, typed notification. Only [`verify_and_parse`] produces these.
#[derive(Debug, Clone)]
pub struct Ipn {
    /// `None` when the notification did not declare a recognizable transaction type; the caller then resolves the
    /// record by id alone.
    pub kind: Option<IpnKind>,
    /// Raw remote status string, e.g. `COMPLETED`.
    pub status: String,
    pub sender_email: String,
    /// Preapproval notifications only.
    pub approved: bool,
    pub pay_key: Option<String>,
    pub preapproval_key: Option<String>,
    /// Preapproval notifications only: the declared cap to cross-check against the recorded amount.
    pub max_total_amount_of_all_payments: Option<Money>,
    pub transactions: TransactionList,
}

impl Ipn {
    fn from_pairs(pairs: &[(String, String)]) -> Result<Self, IpnError> {
        let get = |field: &str| pairs.iter().find(|(k, _)| k == field).map(|(_, v)| v.as_str());
        let kind = get("transaction_type").and_then(IpnKind::from_transaction_type);
        let max_total = match get("max_total_amount_of_all_payments") {
            Some(raw) => Some(raw.parse::<Money>().map_err(|_| IpnError::InvalidField {
                field: "max_total_amount_of_all_payments".into(),
                value: raw.into(),
            })?),
            None => None,
        };
        Ok(Self {
            kind,
            status: get("status").unwrap_or_default().to_string(),
            sender_email: get("sender_email").unwrap_or_default().to_string(),
            approved: parse_remote_bool(get("approved")),
            pay_key: get("pay_key").map(String::from),
            preapproval_key: get("preapproval_key").map(String::from),
            max_total_amount_of_all_payments: max_total,
            transactions: TransactionList::from_pairs(pairs)?,
        })
    }
}

/// Decodes a form-encoded notification body into its flat key/value pairs.
pub fn parse_form_body(body: &[u8]) -> Vec<(String, String)> {
    form_urlencoded::parse(body).into_owned().collect()
}

/// The verification protocol of §ipn: re-POST the raw body, accept only `VERIFIED`, then parse the typed
/// notification out of the already-decoded pairs.
pub async fn verify_and_parse<C: ProcessorClient>(client: &C, raw_body: &[u8]) -> Result<Ipn, IpnError> {
    match client.verify_ipn(raw_body).await {
        Ok(IpnVerification::Verified) => {},
        Ok(IpnVerification::Invalid) => return Err(IpnError::VerificationFailed),
        Err(e) => return Err(IpnError::VerificationUnreachable(e.to_string())),
    }
    let pairs = parse_form_body(raw_body);
    Ipn::from_pairs(&pairs)
}

#[cfg(test)]
mod test {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parses_a_payment_notification() {
        let body = b"transaction_type=Adaptive+Payment+PAY&status=COMPLETED&sender_email=buyer%40example.com\
                     &pay_key=AP-123&transaction%5B0%5D.amount=USD+10.00&transaction%5B0%5D.id=TX0";
        let pairs = parse_form_body(body);
        let ipn = Ipn::from_pairs(&pairs).unwrap();
        assert_eq!(ipn.kind, Some(IpnKind::Payment));
        assert_eq!(ipn.status, "COMPLETED");
        assert_eq!(ipn.sender_email, "buyer@example.com");
        assert_eq!(ipn.pay_key.as_deref(), Some("AP-123"));
        assert_eq!(ipn.transactions.total_money().unwrap(), Money::new(dec!(10.00), "USD"));
    }

    #[test]
    fn parses_a_preapproval_notification() {
        let body = b"transaction_type=Adaptive+Payment+PREAPPROVAL&status=ACTIVE&approved=true\
                     &preapproval_key=PA-9&max_total_amount_of_all_payments=USD+100.00";
        let pairs = parse_form_body(body);
        let ipn = Ipn::from_pairs(&pairs).unwrap();
        assert_eq!(ipn.kind, Some(IpnKind::Preapproval));
        assert!(ipn.approved);
        assert_eq!(ipn.max_total_amount_of_all_payments, Some(Money::new(dec!(100.00), "USD")));
        assert_eq!(ipn.kind.unwrap().record_kind(), RecordKind::Preapproval);
    }

    #[test]
    fn unknown_transaction_type_is_not_fatal() {
        let pairs = parse_form_body(b"transaction_type=Something+New&status=COMPLETED");
        let ipn = Ipn::from_pairs(&pairs).unwrap();
        assert!(ipn.kind.is_none());
    }

    #[test]
    fn adjustments_resolve_to_payments() {
        assert_eq!(IpnKind::Adjustment.record_kind(), RecordKind::Payment);
    }
}
