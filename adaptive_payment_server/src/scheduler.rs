use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use adaptive_payment_engine::{
    db_types::{RecordKind, RecordRef},
    settings::GatewaySettings,
    traits::{NullScheduler, PaymentStore, ProcessorClient, UpdateScheduler},
    ReconciliationApi,
};
use chrono::Duration;
use log::*;

/// Runs delayed status re-checks on the actix runtime, one task per request.
///
/// Requests are deduplicated on the record reference: while a check is pending for a record, further requests for it
/// are dropped, so a record that is created and then returned within the delay window still gets exactly one check.
/// A failed check only logs; the record is picked up again the next time something schedules it.
pub struct DelayedUpdateWorker<B, C> {
    store: B,
    client: Arc<C>,
    settings: GatewaySettings,
    pending: Arc<Mutex<HashSet<RecordRef>>>,
}

impl<B, C> DelayedUpdateWorker<B, C> {
    pub fn new(store: B, client: Arc<C>, settings: GatewaySettings) -> Self {
        Self { store, client, settings, pending: Arc::new(Mutex::new(HashSet::new())) }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("pending set poisoned").len()
    }
}

impl<B, C> UpdateScheduler for DelayedUpdateWorker<B, C>
where
    B: PaymentStore + 'static,
    C: ProcessorClient + 'static,
{
    fn schedule(&self, record: RecordRef, delay: Duration) {
        {
            let mut pending = self.pending.lock().expect("pending set poisoned");
            if !pending.insert(record) {
                debug!("⏲️ A status check is already pending for {record}");
                return;
            }
        }
        info!("⏲️ Scheduling a status check for {record} in {}s", delay.num_seconds());
        let store = self.store.clone();
        let client = Arc::clone(&self.client);
        let settings = self.settings.clone();
        let pending = Arc::clone(&self.pending);
        actix_web::rt::spawn(async move {
            actix_web::rt::time::sleep(delay.to_std().unwrap_or_default()).await;
            pending.lock().expect("pending set poisoned").remove(&record);
            // The check itself must not re-arm the scheduler, or an unreachable processor would loop forever.
            let api = ReconciliationApi::new(store, client, settings, Arc::new(NullScheduler));
            let result = match record.kind {
                RecordKind::Payment => api.update_payment(record.id).await.map(|p| p.status.to_string()),
                RecordKind::Preapproval => api.update_preapproval(record.id).await.map(|p| p.status.to_string()),
            };
            match result {
                Ok(status) => info!("⏲️ Scheduled check for {record} done; status is {status}"),
                Err(e) => warn!("⏲️ Scheduled check for {record} failed: {e}"),
            }
        });
    }
}
