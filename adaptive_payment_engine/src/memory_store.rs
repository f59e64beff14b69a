//! In-memory reference implementation of [`PaymentStore`].
//!
//! Persistence proper is a deployment concern behind the [`PaymentStore`] trait; this implementation backs tests,
//! development and single-process deployments that can afford to lose records on restart. Record ids are drawn from
//! one sequence shared by payments and preapprovals, so an id identifies at most one record across both kinds.

use std::{collections::HashMap, sync::Arc};

use apg_common::SecretToken;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    db_types::{
        IpnLog,
        NewIpnLog,
        NewPayment,
        NewPreapproval,
        NewRefund,
        Payment,
        PaymentStatus,
        Preapproval,
        PreapprovalStatus,
        RecordKind,
        RecordRef,
        Refund,
        StatusUpdate,
    },
    traits::{PaymentStore, StoreError},
};

#[derive(Default)]
struct Inner {
    next_id: i64,
    payments: HashMap<i64, Payment>,
    preapprovals: HashMap<i64, Preapproval>,
    refunds: Vec<Refund>,
    ipn_logs: Vec<IpnLog>,
    status_update_count: u64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of status-triple writes since creation. Lets tests assert that idempotent notification redeliveries do
    /// not write again.
    pub async fn status_update_count(&self) -> u64 {
        self.inner.read().await.status_update_count
    }

    pub async fn ipn_logs(&self) -> Vec<IpnLog> {
        self.inner.read().await.ipn_logs.clone()
    }

    pub async fn refunds(&self) -> Vec<Refund> {
        self.inner.read().await.refunds.clone()
    }
}

impl PaymentStore for MemoryStore {
    async fn create_payment(&self, new: NewPayment) -> Result<Payment, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let payment = Payment {
            id,
            money: new.money,
            created_at: Utc::now(),
            secret_token: SecretToken::generate(),
            debug_request: None,
            debug_response: None,
            sender_email: String::new(),
            pay_key: String::new(),
            status: PaymentStatus::New,
            status_detail: String::new(),
        };
        inner.payments.insert(id, payment.clone());
        Ok(payment)
    }

    async fn create_preapproval(&self, new: NewPreapproval) -> Result<Preapproval, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let created_at = Utc::now();
        let valid_until = new.valid_until.unwrap_or_else(|| NewPreapproval::default_valid_until(created_at));
        let preapproval = Preapproval {
            id,
            money: new.money,
            created_at,
            secret_token: SecretToken::generate(),
            debug_request: None,
            debug_response: None,
            sender_email: String::new(),
            preapproval_key: String::new(),
            status: PreapprovalStatus::New,
            status_detail: String::new(),
            valid_until,
        };
        inner.preapprovals.insert(id, preapproval.clone());
        Ok(preapproval)
    }

    async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, StoreError> {
        Ok(self.inner.read().await.payments.get(&id).cloned())
    }

    async fn fetch_preapproval(&self, id: i64) -> Result<Option<Preapproval>, StoreError> {
        Ok(self.inner.read().await.preapprovals.get(&id).cloned())
    }

    async fn update_payment_status(
        &self,
        id: i64,
        update: StatusUpdate<PaymentStatus>,
    ) -> Result<Payment, StoreError> {
        let mut inner = self.inner.write().await;
        let payment = inner.payments.get_mut(&id).ok_or(StoreError::NotFound(RecordRef::payment(id)))?;
        payment.status = update.status;
        payment.status_detail = update.status_detail;
        if let Some(email) = update.sender_email {
            payment.sender_email = email;
        }
        let payment = payment.clone();
        inner.status_update_count += 1;
        Ok(payment)
    }

    async fn update_preapproval_status(
        &self,
        id: i64,
        update: StatusUpdate<PreapprovalStatus>,
    ) -> Result<Preapproval, StoreError> {
        let mut inner = self.inner.write().await;
        let preapproval =
            inner.preapprovals.get_mut(&id).ok_or(StoreError::NotFound(RecordRef::preapproval(id)))?;
        preapproval.status = update.status;
        preapproval.status_detail = update.status_detail;
        if let Some(email) = update.sender_email {
            preapproval.sender_email = email;
        }
        let preapproval = preapproval.clone();
        inner.status_update_count += 1;
        Ok(preapproval)
    }

    async fn set_pay_key(&self, id: i64, pay_key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let payment = inner.payments.get_mut(&id).ok_or(StoreError::NotFound(RecordRef::payment(id)))?;
        payment.pay_key = pay_key.to_string();
        Ok(())
    }

    async fn set_preapproval_key(&self, id: i64, preapproval_key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let preapproval =
            inner.preapprovals.get_mut(&id).ok_or(StoreError::NotFound(RecordRef::preapproval(id)))?;
        preapproval.preapproval_key = preapproval_key.to_string();
        Ok(())
    }

    async fn archive_exchange(
        &self,
        record: RecordRef,
        request: Option<&str>,
        response: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match record.kind {
            RecordKind::Payment => {
                let payment =
                    inner.payments.get_mut(&record.id).ok_or(StoreError::NotFound(record))?;
                payment.debug_request = request.map(String::from);
                payment.debug_response = response.map(String::from);
            },
            RecordKind::Preapproval => {
                let preapproval =
                    inner.preapprovals.get_mut(&record.id).ok_or(StoreError::NotFound(record))?;
                preapproval.debug_request = request.map(String::from);
                preapproval.debug_response = response.map(String::from);
            },
        }
        Ok(())
    }

    async fn create_refund(&self, refund: NewRefund) -> Result<Refund, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let refund = Refund {
            id,
            payment_id: refund.payment_id,
            created_at: Utc::now(),
            debug_request: refund.debug_request,
            debug_response: refund.debug_response,
        };
        inner.refunds.push(refund.clone());
        Ok(refund)
    }

    async fn fetch_refund_for_payment(&self, payment_id: i64) -> Result<Option<Refund>, StoreError> {
        Ok(self.inner.read().await.refunds.iter().find(|r| r.payment_id == payment_id).cloned())
    }

    async fn insert_ipn_log(&self, log: NewIpnLog) -> Result<IpnLog, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let log = IpnLog {
            id,
            created_at: Utc::now(),
            path: log.path,
            post_body: log.post_body,
            verify_response: log.verify_response,
            return_status_code: log.return_status_code,
            duration_ms: log.duration_ms,
        };
        inner.ipn_logs.push(log.clone());
        Ok(log)
    }
}
