//! Receiver sets for split and chained payments.
//!
//! The processor accepts up to six beneficiaries per payment. When one of them is marked as the primary receiver the
//! payment is *chained*: secondary receivers are funded out of the primary's share. Without a primary the payment is
//! *parallel* and the first receiver is treated specially by the processor, so order is preserved throughout.
//! Invariants are enforced at construction, after every append, and again immediately before serialization so a
//! transiently invalid set can never reach the wire.

use apg_common::Money;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// The processor rejects payments with more than six receivers, so we do too, before any network call.
pub const MAX_RECEIVERS: usize = 6;

#[derive(Debug, Clone, Error)]
pub enum ReceiverError {
    #[error("There can only be one primary receiver.")]
    TooManyPrimaryReceivers,
    #[error("The maximum number of receivers is {MAX_RECEIVERS}.")]
    TooManyReceivers,
}

//--------------------------------------      Receiver       ---------------------------------------------------------
/// A single payment beneficiary. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    email: String,
    amount: Money,
    primary: bool,
}

impl Receiver {
    pub fn new(email: impl Into<String>, amount: Money) -> Self {
        Self { email: email.into(), amount, primary: false }
    }

    pub fn primary(email: impl Into<String>, amount: Money) -> Self {
        Self { email: email.into(), amount, primary: true }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn amount(&self) -> &Money {
        &self.amount
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }
}

//--------------------------------------     ReceiverSet     ---------------------------------------------------------
/// An ordered set of payment beneficiaries, validated against the processor's rules.
#[derive(Debug, Clone, Default)]
pub struct ReceiverSet {
    receivers: Vec<Receiver>,
}

/// The wire form of a receiver, as the creation call wants it. The amount is plain decimal; the currency rides at the
/// payment level.
#[derive(Debug, Clone, Serialize)]
pub struct WireReceiver {
    pub email: String,
    pub amount: Decimal,
    pub primary: bool,
}

impl ReceiverSet {
    pub fn new(receivers: Vec<Receiver>) -> Result<Self, ReceiverError> {
        let set = Self { receivers };
        set.validate()?;
        Ok(set)
    }

    /// Appends a receiver, re-validating immediately so an invalid set fails fast rather than lingering until
    /// serialization.
    pub fn push(&mut self, receiver: Receiver) -> Result<(), ReceiverError> {
        self.receivers.push(receiver);
        if let Err(e) = self.validate() {
            self.receivers.pop();
            return Err(e);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Receiver> {
        self.receivers.iter()
    }

    /// `Ok(true)` iff exactly one receiver is primary. More than one primary is invalid; this is checked both here
    /// and from [`Self::to_wire`] since serialization is the last gate before the network.
    pub fn has_primary(&self) -> Result<bool, ReceiverError> {
        let n_primary = self.receivers.iter().filter(|r| r.primary).count();
        if n_primary > 1 {
            return Err(ReceiverError::TooManyPrimaryReceivers);
        }
        Ok(n_primary == 1)
    }

    /// A set with a primary receiver serializes as a chained payment; without one it is parallel. Callers must pick
    /// the right creation variant before submission.
    pub fn is_chained(&self) -> Result<bool, ReceiverError> {
        self.has_primary()
    }

    /// Sum of all receiver amounts. Receivers are assumed to share a currency (the first receiver's currency is
    /// used); an empty set sums to a currency-less zero.
    pub fn total_amount(&self) -> Money {
        let currency = self.receivers.first().map(|r| r.amount.currency()).unwrap_or("");
        let total = self.receivers.iter().map(|r| r.amount.amount()).sum();
        Money::new(total, currency)
    }

    pub fn to_wire(&self) -> Result<Vec<WireReceiver>, ReceiverError> {
        self.has_primary()?;
        if self.receivers.len() > MAX_RECEIVERS {
            return Err(ReceiverError::TooManyReceivers);
        }
        let wire = self
            .receivers
            .iter()
            .map(|r| WireReceiver { email: r.email.clone(), amount: r.amount.amount(), primary: r.primary })
            .collect();
        Ok(wire)
    }

    fn validate(&self) -> Result<(), ReceiverError> {
        self.has_primary()?;
        if self.receivers.len() > MAX_RECEIVERS {
            return Err(ReceiverError::TooManyReceivers);
        }
        Ok(())
    }
}
