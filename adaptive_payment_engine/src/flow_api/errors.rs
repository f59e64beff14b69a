use thiserror::Error;

use crate::{ipn::IpnError, receivers::ReceiverError, traits::StoreError};

#[derive(Debug, Error)]
pub enum TransitionError {
    /// The requested operation is not valid for the record's current status. Raised synchronously, before any
    /// network call; no state is mutated.
    #[error("Transition precondition failed: {0}")]
    Precondition(String),
    /// A browser return or cancel was rejected; the rejection reason has already been recorded on the record.
    #[error("Return rejected: {0}")]
    ReturnRejected(String),
    /// The outbound processor call failed. The exchange has been archived on the record for diagnosis.
    #[error("Processor call failed: {0}")]
    Processor(String),
    #[error(transparent)]
    Ipn(#[from] IpnError),
    #[error(transparent)]
    Receiver(#[from] ReceiverError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
