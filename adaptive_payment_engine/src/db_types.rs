use std::{fmt::Display, str::FromStr};

use apg_common::{Money, SecretToken};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Preapprovals are valid for 90 days unless the caller says otherwise.
pub const DEFAULT_PREAPPROVAL_VALIDITY_DAYS: i64 = 90;

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Just saved locally, nothing sent to the processor yet.
    New,
    /// The processor accepted the creation call and issued a pay key.
    Created,
    /// An error occurred somewhere in the process. The detail field carries the diagnostic.
    Error,
    /// The payment has been canceled.
    Canceled,
    /// The sender came back via the return URL, final confirmation still outstanding.
    Returned,
    /// The processor confirmed the payment completed.
    Completed,
    /// The payment has been refunded.
    Refunded,
}

impl PaymentStatus {
    /// Terminal states never transition again, not even for a late notification.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Canceled | PaymentStatus::Refunded)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::New => "new",
            PaymentStatus::Created => "created",
            PaymentStatus::Error => "error",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Returned => "returned",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "created" => Ok(Self::Created),
            "error" => Ok(Self::Error),
            "canceled" => Ok(Self::Canceled),
            "returned" => Ok(Self::Returned),
            "completed" => Ok(Self::Completed),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------  PreapprovalStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreapprovalStatus {
    New,
    Created,
    Error,
    Canceled,
    /// The sender approved the preapproval on the processor side.
    Approved,
    /// All allowed payments under this preapproval have been made.
    Used,
    Returned,
}

impl PreapprovalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PreapprovalStatus::Canceled | PreapprovalStatus::Used)
    }
}

impl Display for PreapprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PreapprovalStatus::New => "new",
            PreapprovalStatus::Created => "created",
            PreapprovalStatus::Error => "error",
            PreapprovalStatus::Canceled => "canceled",
            PreapprovalStatus::Approved => "approved",
            PreapprovalStatus::Used => "used",
            PreapprovalStatus::Returned => "returned",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PreapprovalStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "created" => Ok(Self::Created),
            "error" => Ok(Self::Error),
            "canceled" => Ok(Self::Canceled),
            "approved" => Ok(Self::Approved),
            "used" => Ok(Self::Used),
            "returned" => Ok(Self::Returned),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------      RecordRef      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Payment,
    Preapproval,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Payment => write!(f, "payment"),
            RecordKind::Preapproval => write!(f, "preapproval"),
        }
    }
}

/// A kind-qualified record id. Used as the per-record lock key and as the scheduler handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    pub kind: RecordKind,
    pub id: i64,
}

impl RecordRef {
    pub fn payment(id: i64) -> Self {
        Self { kind: RecordKind::Payment, id }
    }

    pub fn preapproval(id: i64) -> Self {
        Self { kind: RecordKind::Preapproval, id }
    }
}

impl Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.kind, self.id)
    }
}

//--------------------------------------       Payment       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub money: Money,
    pub created_at: DateTime<Utc>,
    /// Embedded in callback URLs; never guessable, generated once at creation.
    pub secret_token: SecretToken,
    /// Last outbound payload sent to the processor, kept for diagnostics.
    pub debug_request: Option<String>,
    /// Last raw inbound payload from the processor, kept for diagnostics.
    pub debug_response: Option<String>,
    pub sender_email: String,
    /// Processor transaction identifier. Empty until the creation call succeeds.
    pub pay_key: String,
    pub status: PaymentStatus,
    pub status_detail: String,
}

impl Payment {
    /// A payment without a pay key has never been submitted to the processor.
    pub fn is_processed(&self) -> bool {
        !self.pay_key.is_empty()
    }

    pub fn record_ref(&self) -> RecordRef {
        RecordRef::payment(self.id)
    }
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub money: Money,
}

impl NewPayment {
    pub fn new(money: Money) -> Self {
        Self { money }
    }
}

//--------------------------------------     Preapproval     ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preapproval {
    pub id: i64,
    pub money: Money,
    pub created_at: DateTime<Utc>,
    pub secret_token: SecretToken,
    pub debug_request: Option<String>,
    pub debug_response: Option<String>,
    pub sender_email: String,
    /// Processor preapproval identifier. Empty until the creation call succeeds.
    pub preapproval_key: String,
    pub status: PreapprovalStatus,
    pub status_detail: String,
    pub valid_until: DateTime<Utc>,
}

impl Preapproval {
    pub fn is_processed(&self) -> bool {
        !self.preapproval_key.is_empty()
    }

    pub fn record_ref(&self) -> RecordRef {
        RecordRef::preapproval(self.id)
    }
}

#[derive(Debug, Clone)]
pub struct NewPreapproval {
    pub money: Money,
    /// Defaults to [`DEFAULT_PREAPPROVAL_VALIDITY_DAYS`] from creation when not given.
    pub valid_until: Option<DateTime<Utc>>,
}

impl NewPreapproval {
    pub fn new(money: Money) -> Self {
        Self { money, valid_until: None }
    }

    pub fn valid_until(mut self, until: DateTime<Utc>) -> Self {
        self.valid_until = Some(until);
        self
    }

    pub fn default_valid_until(created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::days(DEFAULT_PREAPPROVAL_VALIDITY_DAYS)
    }
}

//--------------------------------------        Refund       ---------------------------------------------------------
/// A refund issued against a completed payment. One-to-one with its payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: i64,
    pub payment_id: i64,
    pub created_at: DateTime<Utc>,
    pub debug_request: Option<String>,
    pub debug_response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewRefund {
    pub payment_id: i64,
    pub debug_request: Option<String>,
    pub debug_response: Option<String>,
}

//--------------------------------------       IpnLog        ---------------------------------------------------------
/// Diagnostic log row for an inbound notification delivery. Written for every delivery when IPN logging is enabled,
/// whether or not the notification was accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpnLog {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub path: String,
    pub post_body: String,
    pub verify_response: String,
    pub return_status_code: Option<u16>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct NewIpnLog {
    pub path: String,
    pub post_body: String,
    pub verify_response: String,
    pub return_status_code: Option<u16>,
    pub duration_ms: Option<u64>,
}

//--------------------------------------    StatusUpdate     ---------------------------------------------------------
/// The triple every transition persists together. `sender_email: None` leaves the stored value untouched.
#[derive(Debug, Clone)]
pub struct StatusUpdate<S> {
    pub status: S,
    pub status_detail: String,
    pub sender_email: Option<String>,
}

impl<S> StatusUpdate<S> {
    pub fn new(status: S, status_detail: impl Into<String>) -> Self {
        Self { status, status_detail: status_detail.into(), sender_email: None }
    }

    pub fn with_sender_email(mut self, email: impl Into<String>) -> Self {
        self.sender_email = Some(email.into());
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payment_status_round_trips() {
        for s in
            [PaymentStatus::New, PaymentStatus::Created, PaymentStatus::Error, PaymentStatus::Canceled,
             PaymentStatus::Returned, PaymentStatus::Completed, PaymentStatus::Refunded]
        {
            assert_eq!(s.to_string().parse::<PaymentStatus>().unwrap(), s);
        }
        assert!("paid".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn preapproval_status_round_trips() {
        for s in [PreapprovalStatus::New, PreapprovalStatus::Approved, PreapprovalStatus::Used] {
            assert_eq!(s.to_string().parse::<PreapprovalStatus>().unwrap(), s);
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(PaymentStatus::Refunded.is_terminal());
        assert!(PaymentStatus::Canceled.is_terminal());
        assert!(!PaymentStatus::Completed.is_terminal());
        assert!(PreapprovalStatus::Used.is_terminal());
        assert!(!PreapprovalStatus::Approved.is_terminal());
    }

    #[test]
    fn default_preapproval_validity_is_90_days() {
        let created = Utc::now();
        let until = NewPreapproval::default_valid_until(created);
        assert_eq!(until - created, Duration::days(90));
    }
}
