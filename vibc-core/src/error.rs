use std::any::Any;
use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

use crate::{EventKind, Stage, H256};

/// The result of interacting with a chain.
pub type ChainResult<T> = Result<T, ChainCommunicationError>;

/// The result of a tracker operation.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// An "Any"-typed error.
pub trait ChainCustomError: StdError + Send + Sync + Any {}

impl<E: StdError + Send + Sync + Any> ChainCustomError for E {}

/// Thin wrapper around a boxed ChainCustomError; required to satisfy
/// AsDynError implementations. Basically a trait-object adaptor.
#[repr(transparent)]
pub struct ChainCustomErrorWrapper(Box<dyn ChainCustomError>);

impl Debug for ChainCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", AsRef::<dyn ChainCustomError>::as_ref(&self))
    }
}

impl Display for ChainCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", AsRef::<dyn ChainCustomError>::as_ref(&self))
    }
}

impl StdError for ChainCustomErrorWrapper {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl AsRef<dyn ChainCustomError> for ChainCustomErrorWrapper {
    fn as_ref(&self) -> &dyn ChainCustomError {
        self.0.as_ref()
    }
}

impl Deref for ChainCustomErrorWrapper {
    type Target = Box<dyn ChainCustomError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// ChainCommunicationError contains errors returned when attempting to
/// read receipts, blocks or logs from a chain
#[derive(Debug, thiserror::Error)]
pub enum ChainCommunicationError {
    /// A log returned for a mined block is missing positional metadata
    #[error("Log is missing `{0}`")]
    MissingLogMeta(&'static str),
    /// A block the chain reported a log or receipt in could not be fetched
    #[error("Block {0} not found")]
    BlockNotFound(u64),
    /// Any other error; does not implement `From` to prevent
    /// conflicting/absorbing other errors.
    #[error(transparent)]
    Other(ChainCustomErrorWrapper),
}

impl ChainCommunicationError {
    /// Create a chain communication error from any other existing error
    pub fn from_other<E: ChainCustomError>(err: E) -> Self {
        Self::Other(ChainCustomErrorWrapper(Box::new(err)))
    }

    /// Creates a chain communication error of the other error variant from a static string
    pub fn from_other_str(err: &'static str) -> Self {
        #[derive(Debug)]
        #[repr(transparent)]
        struct StringError(&'static str);
        impl Display for StringError {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.0)
            }
        }
        impl StdError for StringError {}

        Self::from_other(StringError(err))
    }
}

/// A log carried a known event signature but its contents did not decode
/// against that event's ABI.
#[derive(Debug, thiserror::Error)]
#[error("Malformed {kind} log: {source}")]
pub struct DecodeError {
    /// The event the signature claimed
    pub kind: EventKind,
    /// The ABI decoding failure
    #[source]
    pub source: ethers::abi::Error,
}

/// A poll was issued for a stage whose prerequisite stage has not been
/// recorded. This is a bug in the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    /// Receive or acknowledgement polled before the send was recorded
    #[error("Send of {send_tx_id:?} has not been recorded yet")]
    SendNotRecorded {
        /// The tracked send transaction
        send_tx_id: H256,
    },
    /// Acknowledgement recorded before the receive
    #[error("Receive of the packet sent by {send_tx_id:?} has not been recorded yet")]
    ReceiveNotRecorded {
        /// The tracked send transaction
        send_tx_id: H256,
    },
}

/// Errors returned by the packet correlator.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The chain could not be queried; retrying the same poll later is safe.
    #[error(transparent)]
    Chain(#[from] ChainCommunicationError),
    /// The caller polled out of order.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    /// The send transaction was mined but emitted no `SendPacket` event.
    #[error("Transaction {send_tx_id:?} did not emit a SendPacket event")]
    SendPacketMissing {
        /// The tracked send transaction
        send_tx_id: H256,
    },
    /// An observed event is timestamped before the stage it follows.
    #[error("{stage} observed at {timestamp}, before the previous stage at {previous}")]
    OutOfOrder {
        /// The stage being recorded
        stage: Stage,
        /// Timestamp of the observation
        timestamp: u64,
        /// Timestamp of the stage it follows
        previous: u64,
    },
}

impl TrackerError {
    /// Whether re-issuing the same poll can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::Chain(_))
    }
}

/// A lifecycle record that violates the lifecycle invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRecord {
    /// Only some of a stage's fields are set
    #[error("The {0} stage is only partially recorded")]
    IncompleteStage(Stage),
    /// A stage is set while the one before it is not
    #[error("The {0} stage is recorded before the stage preceding it")]
    MissingEarlierStage(Stage),
    /// A stage is timestamped before the one preceding it
    #[error("The {0} stage is timestamped before the stage preceding it")]
    OutOfOrder(Stage),
}

/// A channel name that does not fit a bytes32 string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Channel name `{0}` does not fit in 32 bytes")]
pub struct ChannelNameError(pub String);
