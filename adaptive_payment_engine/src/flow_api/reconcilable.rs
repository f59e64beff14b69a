use std::fmt::Display;

use crate::{
    db_types::{Payment, PaymentStatus, Preapproval, PreapprovalStatus, RecordKind, RecordRef, StatusUpdate},
    helpers::{poll_payment_status, poll_preapproval_status, poll_sender_email},
    processor_types::DetailsResponse,
};

/// The capability set a record kind needs for the shared reconciliation logic: its identity, the processor-side
/// transaction key a details lookup wants, and how a remote details response maps onto its local status.
pub trait Reconcilable {
    type Status: Copy + PartialEq + Display;

    const KIND: RecordKind;

    fn id(&self) -> i64;

    /// The processor-issued key (`payKey` / `preapprovalKey`). Empty until the record has been processed; a record
    /// without one cannot be polled.
    fn transaction_key(&self) -> &str;

    fn status(&self) -> Self::Status;

    fn parse_remote_status(&self, response: &DetailsResponse) -> Self::Status;

    fn record_ref(&self) -> RecordRef {
        RecordRef { kind: Self::KIND, id: self.id() }
    }
}

impl Reconcilable for Payment {
    type Status = PaymentStatus;

    const KIND: RecordKind = RecordKind::Payment;

    fn id(&self) -> i64 {
        self.id
    }

    fn transaction_key(&self) -> &str {
        &self.pay_key
    }

    fn status(&self) -> PaymentStatus {
        self.status
    }

    fn parse_remote_status(&self, response: &DetailsResponse) -> PaymentStatus {
        poll_payment_status(self.status, response)
    }
}

impl Reconcilable for Preapproval {
    type Status = PreapprovalStatus;

    const KIND: RecordKind = RecordKind::Preapproval;

    fn id(&self) -> i64 {
        self.id
    }

    fn transaction_key(&self) -> &str {
        &self.preapproval_key
    }

    fn status(&self) -> PreapprovalStatus {
        self.status
    }

    fn parse_remote_status(&self, response: &DetailsResponse) -> PreapprovalStatus {
        poll_preapproval_status(self.status, response)
    }
}

/// The field set a poll refreshes, each computed by a pure function of `(current record, remote response)`:
/// status via [`Reconcilable::parse_remote_status`], the detail (cleared, since a successful lookup supersedes any
/// stale diagnostic), and the sender email via [`poll_sender_email`].
pub(crate) fn compute_poll_update<R: Reconcilable>(record: &R, response: &DetailsResponse) -> StatusUpdate<R::Status> {
    StatusUpdate::new(record.parse_remote_status(response), "").with_sender_email(poll_sender_email(response))
}
