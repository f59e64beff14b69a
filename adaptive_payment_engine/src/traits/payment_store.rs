use thiserror::Error;

use crate::db_types::{
    IpnLog,
    NewIpnLog,
    NewPayment,
    NewPreapproval,
    NewRefund,
    Payment,
    PaymentStatus,
    Preapproval,
    PreapprovalStatus,
    RecordRef,
    Refund,
    StatusUpdate,
};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(RecordRef),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Persistence contract for the reconciliation engine.
///
/// The engine guarantees that for any single record, reads and writes happen under its per-record lock, so a backend
/// only needs each individual call to be atomic. In particular, `update_*_status` must persist the
/// status/detail/sender-email triple together.
#[allow(async_fn_in_trait)]
pub trait PaymentStore: Clone + Send + Sync {
    /// Creates a payment in `new` status with a freshly generated secret token.
    async fn create_payment(&self, new: NewPayment) -> Result<Payment, StoreError>;

    /// Creates a preapproval in `new` status. When `valid_until` is not given the backend applies the default
    /// validity window from the creation timestamp.
    async fn create_preapproval(&self, new: NewPreapproval) -> Result<Preapproval, StoreError>;

    async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, StoreError>;

    async fn fetch_preapproval(&self, id: i64) -> Result<Option<Preapproval>, StoreError>;

    /// Persists the status triple atomically and returns the updated record.
    async fn update_payment_status(
        &self,
        id: i64,
        update: StatusUpdate<PaymentStatus>,
    ) -> Result<Payment, StoreError>;

    async fn update_preapproval_status(
        &self,
        id: i64,
        update: StatusUpdate<PreapprovalStatus>,
    ) -> Result<Preapproval, StoreError>;

    async fn set_pay_key(&self, id: i64, pay_key: &str) -> Result<(), StoreError>;

    async fn set_preapproval_key(&self, id: i64, preapproval_key: &str) -> Result<(), StoreError>;

    /// Archives the latest outbound payload and raw response on the record. Called even when the outbound call
    /// failed, so the failure itself stays diagnosable.
    async fn archive_exchange(
        &self,
        record: RecordRef,
        request: Option<&str>,
        response: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn create_refund(&self, refund: NewRefund) -> Result<Refund, StoreError>;

    async fn fetch_refund_for_payment(&self, payment_id: i64) -> Result<Option<Refund>, StoreError>;

    async fn insert_ipn_log(&self, log: NewIpnLog) -> Result<IpnLog, StoreError>;
}
