use std::{collections::HashMap, sync::Arc, time::Instant};

use log::*;
use serde_json::json;
use tokio::sync::{Mutex as RecordMutex, OwnedMutexGuard};

use crate::{
    db_types::{
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
    flow_api::{
        errors::TransitionError,
        reconcilable::{compute_poll_update, Reconcilable},
    },
    helpers::first_error_detail,
    ipn,
    ipn::{constants, Ipn, IpnKind},
    receivers::ReceiverSet,
    settings::GatewaySettings,
    processor_types::{PayRequest, PreapprovalRequest, RequestEnvelope, WireReceiverList},
    traits::{PaymentStore, ProcessorClient, StoreError, UpdateScheduler},
};

/// How an inbound notification delivery was resolved, for the delivery route to map onto an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpnOutcome {
    /// Applied, a business-level rejection recorded on the record, or an idempotent no-op. Answer 204 so the
    /// processor stops redelivering.
    Processed,
    /// The notification's secret token did not match the record. The record has been moved to `error`. Answer 400.
    SecretMismatch,
    /// No record with that id. Answer 404.
    NotFound,
}

/// `ReconciliationApi` is the single place where payment and preapproval status transitions happen, whichever of the
/// three update paths triggered them: outbound processing, a user browser redirect, an inbound verified notification,
/// or a scheduled poll.
///
/// Each operation takes a per-record async lock around its read-decide-write sequence, so two concurrent triggers for
/// the same record (say, a notification racing the scheduled poll) serialize instead of producing a lost update.
/// Different records proceed independently.
pub struct ReconciliationApi<B, C> {
    store: B,
    client: Arc<C>,
    settings: GatewaySettings,
    scheduler: Arc<dyn UpdateScheduler>,
    locks: Arc<std::sync::Mutex<HashMap<RecordRef, Arc<RecordMutex<()>>>>>,
}

impl<B: Clone, C> Clone for ReconciliationApi<B, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            client: Arc::clone(&self.client),
            settings: self.settings.clone(),
            scheduler: Arc::clone(&self.scheduler),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<B, C> ReconciliationApi<B, C> {
    pub fn new(store: B, client: Arc<C>, settings: GatewaySettings, scheduler: Arc<dyn UpdateScheduler>) -> Self {
        Self { store, client, settings, scheduler, locks: Arc::new(std::sync::Mutex::new(HashMap::new())) }
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    async fn lock_record(&self, record: RecordRef) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("record lock map poisoned");
            Arc::clone(locks.entry(record).or_default())
        };
        lock.lock_owned().await
    }
}

impl<B, C> ReconciliationApi<B, C>
where
    B: PaymentStore,
    C: ProcessorClient,
{
    //-----------------------------------------  Record creation  ----------------------------------------------------

    /// Creates a payment record in `new` status. Nothing is sent to the processor until
    /// [`Self::process_payment`]. When delayed updates are enabled, a one-shot status re-check is scheduled so a
    /// record the user abandons mid-checkout still converges.
    pub async fn create_payment(&self, new: NewPayment) -> Result<Payment, TransitionError> {
        let payment = self.store.create_payment(new).await?;
        debug!("💳️ Payment #{} created ({})", payment.id, payment.money);
        self.maybe_schedule(payment.record_ref());
        Ok(payment)
    }

    pub async fn create_preapproval(&self, new: NewPreapproval) -> Result<Preapproval, TransitionError> {
        let preapproval = self.store.create_preapproval(new).await?;
        debug!("🗝️ Preapproval #{} created ({})", preapproval.id, preapproval.money);
        self.maybe_schedule(preapproval.record_ref());
        Ok(preapproval)
    }

    fn maybe_schedule(&self, record: RecordRef) {
        if self.settings.use_delayed_updates {
            self.scheduler.schedule(record, self.settings.delayed_update_delay);
        }
    }

    //-----------------------------------------  Outbound creation  --------------------------------------------------

    /// Submits a `new` payment to the processor with its beneficiary set and callback URLs.
    ///
    /// Status afterwards: `created` when the processor issued a pay key, `completed` when a preapproval funded the
    /// payment immediately, `error` otherwise, with the first entry of the processor's error list as detail when it
    /// sent one. The raw exchange is archived on the record even when the call itself fails.
    pub async fn process_payment(
        &self,
        id: i64,
        receivers: &ReceiverSet,
        preapproval: Option<&Preapproval>,
    ) -> Result<Payment, TransitionError> {
        let _guard = self.lock_record(RecordRef::payment(id)).await;
        let payment = self.get_payment(id).await?;
        if payment.status != PaymentStatus::New {
            return Err(TransitionError::Precondition(format!(
                "This payment is already processed; its status is {}, not new.",
                payment.status
            )));
        }
        let record = payment.record_ref();
        let token = payment.secret_token.as_str();
        let request = PayRequest {
            request_envelope: RequestEnvelope::default(),
            action_type: "PAY".to_string(),
            currency_code: payment.money.currency().to_string(),
            receiver_list: WireReceiverList { receiver: receivers.to_wire()? },
            return_url: self.settings.return_url(record, token),
            cancel_url: self.settings.cancel_url(record, token),
            ipn_notification_url: self.settings.use_ipn.then(|| self.settings.ipn_url(record, token)),
            preapproval_key: preapproval.map(|p| p.preapproval_key.clone()),
        };
        let raw_request = serde_json::to_string(&request).unwrap_or_default();
        let response = match self.client.pay(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.store.archive_exchange(record, Some(&raw_request), Some(&e.to_string())).await?;
                warn!("💳️ Creation call for payment #{id} failed. {e}");
                return Err(TransitionError::Processor(e.to_string()));
            },
        };
        self.store.archive_exchange(record, Some(&raw_request), Some(&response.raw)).await?;
        let parsed = response.parsed;
        if let Some(pay_key) = parsed.pay_key.as_deref() {
            self.store.set_pay_key(id, pay_key).await?;
        }
        let update = match (parsed.status.as_deref(), parsed.pay_key.as_deref()) {
            (Some("ERROR"), _) => {
                let detail = first_error_detail(&parsed)
                    .unwrap_or_else(|| "Processor returned status ERROR".to_string());
                info!("💳️ Payment #{id} error detail: {detail}");
                StatusUpdate::new(PaymentStatus::Error, detail)
            },
            (Some("COMPLETED"), _) => StatusUpdate::new(PaymentStatus::Completed, ""),
            (Some("CREATED"), _) | (_, Some(_)) => StatusUpdate::new(PaymentStatus::Created, ""),
            _ => StatusUpdate::new(PaymentStatus::Error, "Unexpected processor response to the creation call"),
        };
        let payment = self.store.update_payment_status(id, update).await?;
        debug!("💳️ Payment #{id} processed; status is now {}", payment.status);
        Ok(payment)
    }

    /// Submits a `new` preapproval to the processor. `created` when a preapproval key came back, `error` otherwise.
    pub async fn process_preapproval(&self, id: i64) -> Result<Preapproval, TransitionError> {
        let _guard = self.lock_record(RecordRef::preapproval(id)).await;
        let preapproval = self.get_preapproval(id).await?;
        if preapproval.status != PreapprovalStatus::New {
            return Err(TransitionError::Precondition(format!(
                "This preapproval is already processed; its status is {}, not new.",
                preapproval.status
            )));
        }
        let record = preapproval.record_ref();
        let token = preapproval.secret_token.as_str();
        let request = PreapprovalRequest {
            request_envelope: RequestEnvelope::default(),
            currency_code: preapproval.money.currency().to_string(),
            max_total_amount_of_all_payments: preapproval.money.format_amount(self.settings.decimal_places),
            starting_date: preapproval.created_at.to_rfc3339(),
            ending_date: preapproval.valid_until.to_rfc3339(),
            return_url: self.settings.return_url(record, token),
            cancel_url: self.settings.cancel_url(record, token),
            ipn_notification_url: self.settings.use_ipn.then(|| self.settings.ipn_url(record, token)),
        };
        let raw_request = serde_json::to_string(&request).unwrap_or_default();
        let response = match self.client.preapprove(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.store.archive_exchange(record, Some(&raw_request), Some(&e.to_string())).await?;
                warn!("🗝️ Creation call for preapproval #{id} failed. {e}");
                return Err(TransitionError::Processor(e.to_string()));
            },
        };
        self.store.archive_exchange(record, Some(&raw_request), Some(&response.raw)).await?;
        let update = match response.parsed.preapproval_key.as_deref() {
            Some(key) => {
                self.store.set_preapproval_key(id, key).await?;
                StatusUpdate::new(PreapprovalStatus::Created, "")
            },
            None => StatusUpdate::new(PreapprovalStatus::Error, "Processor did not issue a preapproval key"),
        };
        let preapproval = self.store.update_preapproval_status(id, update).await?;
        debug!("🗝️ Preapproval #{id} processed; status is now {}", preapproval.status);
        Ok(preapproval)
    }

    //-----------------------------------------  Browser returns  ----------------------------------------------------

    /// The sender came back through the return URL. Valid only while the payment is `created` or already
    /// `completed`; any other status means a replayed or duplicated hit, which moves the record to `error`. A token
    /// mismatch moves it to `error` whatever the current status.
    pub async fn payment_return(&self, id: i64, token: &str) -> Result<Payment, TransitionError> {
        let _guard = self.lock_record(RecordRef::payment(id)).await;
        let payment = self.get_payment(id).await?;
        if !payment.secret_token.matches(token) {
            let detail = format!("Return secret \"{token}\" did not match");
            warn!("💳️ Payment #{id}: {detail}");
            self.store.update_payment_status(id, StatusUpdate::new(PaymentStatus::Error, detail.clone())).await?;
            return Err(TransitionError::ReturnRejected(detail));
        }
        if !matches!(payment.status, PaymentStatus::Created | PaymentStatus::Completed) {
            let detail = format!(
                "Expected status to be created or completed, not {} - duplicate transaction?",
                payment.status
            );
            warn!("💳️ Payment #{id}: {detail}");
            self.store.update_payment_status(id, StatusUpdate::new(PaymentStatus::Error, detail.clone())).await?;
            return Err(TransitionError::ReturnRejected(detail));
        }
        let payment = if payment.status == PaymentStatus::Completed {
            payment
        } else {
            self.store.update_payment_status(id, StatusUpdate::new(PaymentStatus::Returned, "")).await?
        };
        self.maybe_schedule(payment.record_ref());
        Ok(payment)
    }

    /// The sender backed out through the cancel URL. Rejected once the payment has completed.
    pub async fn payment_cancel(&self, id: i64, token: &str) -> Result<Payment, TransitionError> {
        let _guard = self.lock_record(RecordRef::payment(id)).await;
        let payment = self.get_payment(id).await?;
        if !payment.secret_token.matches(token) {
            let detail = format!("Cancel secret \"{token}\" did not match");
            warn!("💳️ Payment #{id}: {detail}");
            return Err(TransitionError::ReturnRejected(detail));
        }
        if payment.status == PaymentStatus::Completed {
            return Err(TransitionError::Precondition("Already completed.".to_string()));
        }
        debug!("💳️ Cancellation received for payment #{id}");
        let payment = self.store.update_payment_status(id, StatusUpdate::new(PaymentStatus::Canceled, "")).await?;
        Ok(payment)
    }

    /// Browser return for a preapproval; valid while `created` or already `approved`.
    pub async fn preapproval_return(&self, id: i64, token: &str) -> Result<Preapproval, TransitionError> {
        let _guard = self.lock_record(RecordRef::preapproval(id)).await;
        let preapproval = self.get_preapproval(id).await?;
        if !preapproval.secret_token.matches(token) {
            let detail = format!("Return secret \"{token}\" did not match");
            warn!("🗝️ Preapproval #{id}: {detail}");
            self.store
                .update_preapproval_status(id, StatusUpdate::new(PreapprovalStatus::Error, detail.clone()))
                .await?;
            return Err(TransitionError::ReturnRejected(detail));
        }
        if !matches!(preapproval.status, PreapprovalStatus::Created | PreapprovalStatus::Approved) {
            let detail = format!(
                "Expected status to be created or approved, not {} - duplicate transaction?",
                preapproval.status
            );
            warn!("🗝️ Preapproval #{id}: {detail}");
            self.store
                .update_preapproval_status(id, StatusUpdate::new(PreapprovalStatus::Error, detail.clone()))
                .await?;
            return Err(TransitionError::ReturnRejected(detail));
        }
        let preapproval = if preapproval.status == PreapprovalStatus::Approved {
            preapproval
        } else {
            self.store.update_preapproval_status(id, StatusUpdate::new(PreapprovalStatus::Returned, "")).await?
        };
        self.maybe_schedule(preapproval.record_ref());
        Ok(preapproval)
    }

    /// The preapproval cancel view only acknowledges; cancellation against the processor goes through
    /// [`Self::cancel_preapproval`].
    pub async fn preapproval_cancel_view(&self, id: i64) -> Result<Preapproval, TransitionError> {
        debug!("🗝️ Cancellation view hit for preapproval #{id}");
        self.get_preapproval(id).await
    }

    //-----------------------------------------  Notifications  ------------------------------------------------------

    /// Handles one inbound notification delivery end to end: verification re-POST, parsing, record resolution,
    /// token authentication, reconciliation, and (when enabled) the diagnostic delivery log.
    pub async fn handle_ipn(
        &self,
        object_id: i64,
        token: &str,
        path: &str,
        raw_body: &[u8],
    ) -> Result<IpnOutcome, TransitionError> {
        let started = Instant::now();
        let outcome = self.handle_ipn_inner(object_id, token, raw_body).await;
        if self.settings.ipn_log_enabled {
            self.write_ipn_log(path, raw_body, &outcome, started).await;
        }
        outcome
    }

    async fn handle_ipn_inner(
        &self,
        object_id: i64,
        token: &str,
        raw_body: &[u8],
    ) -> Result<IpnOutcome, TransitionError> {
        let ipn = ipn::verify_and_parse(self.client.as_ref(), raw_body).await?;
        match ipn.kind.map(|k| k.record_kind()) {
            Some(RecordKind::Payment) => self.apply_payment_ipn(object_id, token, &ipn).await,
            Some(RecordKind::Preapproval) => self.apply_preapproval_ipn(object_id, token, &ipn).await,
            None => {
                // No recognizable transaction type: resolve by id alone, payments first.
                if self.store.fetch_payment(object_id).await?.is_some() {
                    self.apply_payment_ipn(object_id, token, &ipn).await
                } else if self.store.fetch_preapproval(object_id).await?.is_some() {
                    self.apply_preapproval_ipn(object_id, token, &ipn).await
                } else {
                    warn!("🔔️ Notification with no recognizable type for unknown record #{object_id}");
                    Ok(IpnOutcome::NotFound)
                }
            },
        }
    }

    async fn apply_payment_ipn(&self, id: i64, token: &str, ipn: &Ipn) -> Result<IpnOutcome, TransitionError> {
        let _guard = self.lock_record(RecordRef::payment(id)).await;
        let Some(payment) = self.store.fetch_payment(id).await? else {
            warn!("🔔️ Could not find payment #{id}, answering notification with 404");
            return Ok(IpnOutcome::NotFound);
        };
        if !payment.secret_token.matches(token) {
            let detail = format!("Notification secret \"{token}\" did not match");
            warn!("🔔️ Payment #{id}: {detail}");
            let update = StatusUpdate::new(PaymentStatus::Error, detail).with_sender_email(ipn.sender_email.clone());
            self.store.update_payment_status(id, update).await?;
            return Ok(IpnOutcome::SecretMismatch);
        }
        // Notifications are redelivered and arrive out of order; check the current status before transitioning.
        if payment.status == PaymentStatus::Completed {
            debug!("🔔️ Payment #{id} is already completed; notification is a no-op");
            return Ok(IpnOutcome::Processed);
        }
        if payment.status.is_terminal() || payment.status == PaymentStatus::Error {
            warn!(
                "🔔️ Rejecting notification that would alter payment #{id} out of status {}",
                payment.status
            );
            return Ok(IpnOutcome::Processed);
        }
        let update = match ipn.kind {
            Some(IpnKind::Payment) | Some(IpnKind::Adjustment) => match ipn.transactions.total_money() {
                Ok(total) if total == payment.money => {
                    if ipn.status == constants::IPN_STATUS_COMPLETED {
                        StatusUpdate::new(PaymentStatus::Completed, "")
                    } else {
                        StatusUpdate::new(PaymentStatus::Error, format!("Processor status was \"{}\"", ipn.status))
                    }
                },
                Ok(total) => StatusUpdate::new(
                    PaymentStatus::Error,
                    format!(
                        "Notification amounts didn't match. Payment requested {}. Payment made {}",
                        payment.money, total
                    ),
                ),
                Err(e) => StatusUpdate::new(
                    PaymentStatus::Error,
                    format!("Notification amounts didn't match. Payment requested {}. {e}", payment.money),
                ),
            },
            _ => {
                warn!("🔔️ No action for a notification of this type against payment #{id}");
                StatusUpdate::new(payment.status, payment.status_detail.clone())
            },
        };
        if update.status == PaymentStatus::Error {
            info!("🔔️ Payment #{id} error detail: {}", update.status_detail);
        }
        let update = update.with_sender_email(ipn.sender_email.clone());
        self.store.update_payment_status(id, update).await?;
        Ok(IpnOutcome::Processed)
    }

    async fn apply_preapproval_ipn(&self, id: i64, token: &str, ipn: &Ipn) -> Result<IpnOutcome, TransitionError> {
        let _guard = self.lock_record(RecordRef::preapproval(id)).await;
        let Some(preapproval) = self.store.fetch_preapproval(id).await? else {
            warn!("🔔️ Could not find preapproval #{id}, answering notification with 404");
            return Ok(IpnOutcome::NotFound);
        };
        if !preapproval.secret_token.matches(token) {
            let detail = format!("Notification secret \"{token}\" did not match");
            warn!("🔔️ Preapproval #{id}: {detail}");
            let update =
                StatusUpdate::new(PreapprovalStatus::Error, detail).with_sender_email(ipn.sender_email.clone());
            self.store.update_preapproval_status(id, update).await?;
            return Ok(IpnOutcome::SecretMismatch);
        }
        if preapproval.status.is_terminal() || preapproval.status == PreapprovalStatus::Error {
            warn!(
                "🔔️ Rejecting notification that would alter preapproval #{id} out of status {}",
                preapproval.status
            );
            return Ok(IpnOutcome::Processed);
        }
        let update = match ipn.kind {
            Some(IpnKind::Preapproval) => {
                if ipn.max_total_amount_of_all_payments.as_ref() != Some(&preapproval.money) {
                    let declared = ipn
                        .max_total_amount_of_all_payments
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "nothing".to_string());
                    StatusUpdate::new(
                        PreapprovalStatus::Error,
                        format!(
                            "Notification amounts didn't match. Preapproval requested {}. Preapproval made {declared}",
                            preapproval.money
                        ),
                    )
                } else if ipn.status == constants::IPN_STATUS_CANCELED {
                    StatusUpdate::new(PreapprovalStatus::Canceled, "Cancellation received via notification")
                } else if !ipn.approved {
                    StatusUpdate::new(PreapprovalStatus::Error, "The preapproval is not approved")
                } else {
                    StatusUpdate::new(PreapprovalStatus::Approved, "")
                }
            },
            _ => {
                warn!("🔔️ No action for a notification of this type against preapproval #{id}");
                StatusUpdate::new(preapproval.status, preapproval.status_detail.clone())
            },
        };
        // An approved preapproval only ever moves again for an explicit cancellation.
        if preapproval.status == PreapprovalStatus::Approved && update.status != PreapprovalStatus::Canceled {
            debug!("🔔️ Preapproval #{id} is already approved; notification is a no-op");
            return Ok(IpnOutcome::Processed);
        }
        if update.status == PreapprovalStatus::Error {
            info!("🔔️ Preapproval #{id} error detail: {}", update.status_detail);
        }
        let update = update.with_sender_email(ipn.sender_email.clone());
        self.store.update_preapproval_status(id, update).await?;
        Ok(IpnOutcome::Processed)
    }

    async fn write_ipn_log(
        &self,
        path: &str,
        raw_body: &[u8],
        outcome: &Result<IpnOutcome, TransitionError>,
        started: Instant,
    ) {
        use crate::ipn::IpnError::{VerificationFailed, VerificationUnreachable};
        let (verify_response, return_status_code) = match outcome {
            Ok(IpnOutcome::Processed) => (constants::VERIFY_RESPONSE_VERIFIED.to_string(), Some(204)),
            Ok(IpnOutcome::SecretMismatch) => (constants::VERIFY_RESPONSE_VERIFIED.to_string(), Some(400)),
            Ok(IpnOutcome::NotFound) => (constants::VERIFY_RESPONSE_VERIFIED.to_string(), Some(404)),
            Err(TransitionError::Ipn(VerificationFailed)) => {
                (constants::VERIFY_RESPONSE_INVALID.to_string(), Some(500))
            },
            Err(TransitionError::Ipn(VerificationUnreachable(msg))) => (msg.clone(), Some(500)),
            Err(e) => (e.to_string(), Some(500)),
        };
        let log = NewIpnLog {
            path: path.to_string(),
            post_body: String::from_utf8_lossy(raw_body).into_owned(),
            verify_response,
            return_status_code,
            duration_ms: Some(started.elapsed().as_millis() as u64),
        };
        if let Err(e) = self.store.insert_ipn_log(log).await {
            warn!("🔔️ Could not write the notification log entry: {e}");
        }
    }

    //-----------------------------------------  Scheduled polls  ----------------------------------------------------

    /// Refreshes a payment's status from a processor details lookup. Transport failures are soft: logged, status
    /// untouched, healed by the next scheduled run.
    pub async fn update_payment(&self, id: i64) -> Result<Payment, TransitionError> {
        let _guard = self.lock_record(RecordRef::payment(id)).await;
        let payment = self.get_payment(id).await?;
        if !payment.is_processed() {
            return Err(TransitionError::Precondition("Can't update unprocessed payments".to_string()));
        }
        let record = payment.record_ref();
        let raw_request = json!({ "payKey": payment.transaction_key() }).to_string();
        let response = match self.client.payment_details(payment.transaction_key()).await {
            Ok(response) => response,
            Err(e) => {
                warn!("🔄️ Could not update payment #{id}: {e}");
                self.store.archive_exchange(record, Some(&raw_request), Some(&e.to_string())).await?;
                return Ok(payment);
            },
        };
        self.store.archive_exchange(record, Some(&raw_request), Some(&response.raw)).await?;
        let update = compute_poll_update(&payment, &response.parsed);
        let payment = self.store.update_payment_status(id, update).await?;
        debug!("🔄️ Payment #{id} refreshed; status is now {}", payment.status);
        Ok(payment)
    }

    /// Refreshes a preapproval's status from a processor details lookup.
    pub async fn update_preapproval(&self, id: i64) -> Result<Preapproval, TransitionError> {
        let _guard = self.lock_record(RecordRef::preapproval(id)).await;
        let preapproval = self.get_preapproval(id).await?;
        if !preapproval.is_processed() {
            return Err(TransitionError::Precondition("Can't update unprocessed preapprovals".to_string()));
        }
        let record = preapproval.record_ref();
        let raw_request = json!({ "preapprovalKey": preapproval.transaction_key() }).to_string();
        let response = match self.client.preapproval_details(preapproval.transaction_key()).await {
            Ok(response) => response,
            Err(e) => {
                warn!("🔄️ Could not update preapproval #{id}: {e}");
                self.store.archive_exchange(record, Some(&raw_request), Some(&e.to_string())).await?;
                return Ok(preapproval);
            },
        };
        self.store.archive_exchange(record, Some(&raw_request), Some(&response.raw)).await?;
        let update = compute_poll_update(&preapproval, &response.parsed);
        let preapproval = self.store.update_preapproval_status(id, update).await?;
        debug!("🔄️ Preapproval #{id} refreshed; status is now {}", preapproval.status);
        Ok(preapproval)
    }

    //-----------------------------------------  Refund & cancel  ----------------------------------------------------

    /// Refunds a completed payment and links the one-to-one [`Refund`] record.
    ///
    /// A transport failure archives the exchange and surfaces the error without transitioning; any returned
    /// response, even one reporting a vendor-side error, commits `refunded`.
    pub async fn refund_payment(&self, id: i64) -> Result<(Payment, Refund), TransitionError> {
        let _guard = self.lock_record(RecordRef::payment(id)).await;
        let payment = self.get_payment(id).await?;
        if payment.status != PaymentStatus::Completed {
            return Err(TransitionError::Precondition(
                "Cannot refund a Payment until it is completed.".to_string(),
            ));
        }
        let record = payment.record_ref();
        let raw_request = json!({ "payKey": payment.pay_key }).to_string();
        let response = match self.client.refund(&payment.pay_key).await {
            Ok(response) => response,
            Err(e) => {
                self.store.archive_exchange(record, Some(&raw_request), Some(&e.to_string())).await?;
                warn!("💸️ Refund call for payment #{id} failed. {e}");
                return Err(TransitionError::Processor(e.to_string()));
            },
        };
        self.store.archive_exchange(record, Some(&raw_request), Some(&response.raw)).await?;
        let payment = self.store.update_payment_status(id, StatusUpdate::new(PaymentStatus::Refunded, "")).await?;
        let refund = self
            .store
            .create_refund(NewRefund {
                payment_id: id,
                debug_request: Some(raw_request),
                debug_response: Some(response.raw),
            })
            .await?;
        info!("💸️ Payment #{id} refunded");
        Ok((payment, refund))
    }

    /// Cancels a processed preapproval against the processor, then marks it `canceled`.
    pub async fn cancel_preapproval(&self, id: i64) -> Result<Preapproval, TransitionError> {
        let _guard = self.lock_record(RecordRef::preapproval(id)).await;
        let preapproval = self.get_preapproval(id).await?;
        if !preapproval.is_processed() {
            return Err(TransitionError::Precondition("Can't cancel unprocessed preapprovals".to_string()));
        }
        let record = preapproval.record_ref();
        let raw_request = json!({ "preapprovalKey": preapproval.preapproval_key }).to_string();
        let response = match self.client.cancel_preapproval(&preapproval.preapproval_key).await {
            Ok(response) => response,
            Err(e) => {
                self.store.archive_exchange(record, Some(&raw_request), Some(&e.to_string())).await?;
                warn!("🗝️ Cancellation call for preapproval #{id} failed. {e}");
                return Err(TransitionError::Processor(e.to_string()));
            },
        };
        self.store.archive_exchange(record, Some(&raw_request), Some(&response.raw)).await?;
        let preapproval =
            self.store.update_preapproval_status(id, StatusUpdate::new(PreapprovalStatus::Canceled, "")).await?;
        info!("🗝️ Preapproval #{id} canceled");
        Ok(preapproval)
    }

    //-----------------------------------------  Internals  ----------------------------------------------------------

    async fn get_payment(&self, id: i64) -> Result<Payment, TransitionError> {
        self.store
            .fetch_payment(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(RecordRef::payment(id)).into())
    }

    async fn get_preapproval(&self, id: i64) -> Result<Preapproval, TransitionError> {
        self.store
            .fetch_preapproval(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(RecordRef::preapproval(id)).into())
    }
}
