use std::fmt::{Display, Formatter};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{InvalidRecord, PreconditionError, TrackerError, TrackerResult, H256};

/// Where a tracked packet is in its lifecycle.
///
/// Derived from which fields of a [`LifecycleRecord`] are set, so it can only
/// ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PacketState {
    /// No send event observed yet
    Pending,
    /// Send event observed on the origin chain
    Sent,
    /// Receive event observed on the destination chain
    Received,
    /// Acknowledgement event observed on the origin chain
    Acknowledged,
}

impl Display for PacketState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PacketState::Pending => "PENDING",
            PacketState::Sent => "SENT",
            PacketState::Received => "RECEIVED",
            PacketState::Acknowledged => "ACKNOWLEDGED",
        })
    }
}

/// The lifecycle stages that are backed by an on-chain event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// `SendPacket` on the origin chain
    Send,
    /// `RecvPacket` on the destination chain
    Receive,
    /// `Acknowledgement` on the origin chain
    Acknowledgement,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Send => "send",
            Stage::Receive => "receive",
            Stage::Acknowledgement => "acknowledgement",
        })
    }
}

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollStatus {
    /// Nothing new was observed; poll again later.
    Pending,
    /// The polled stage was observed and recorded.
    Advanced,
    /// The polled stage had already been recorded; nothing was queried or
    /// changed.
    Unchanged,
}

/// An on-chain observation of a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, new)]
pub struct Observation {
    /// Transaction that emitted the event
    pub tx_id: H256,
    /// Block the event was emitted in
    pub block_number: u64,
    /// Unix timestamp of that block
    pub timestamp: u64,
}

/// Everything known about one tracked packet.
///
/// Created from the id of the transaction that sent the packet. The remaining
/// fields are filled in by the correlator, each exactly once and strictly in
/// lifecycle order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleRecord {
    send_tx_id: H256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sequence: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    send_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recv_tx_id: Option<H256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recv_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ack_tx_id: Option<H256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ack_time: Option<u64>,
}

impl LifecycleRecord {
    /// Start tracking the packet sent by `send_tx_id`.
    pub fn new(send_tx_id: H256) -> Self {
        Self {
            send_tx_id,
            sequence: None,
            send_time: None,
            recv_tx_id: None,
            recv_time: None,
            ack_tx_id: None,
            ack_time: None,
        }
    }

    /// Origin chain transaction that sent the packet
    pub fn send_tx_id(&self) -> H256 {
        self.send_tx_id
    }

    /// Packet sequence on the origin channel
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// Block timestamp of the send
    pub fn send_time(&self) -> Option<u64> {
        self.send_time
    }

    /// Destination chain transaction that received the packet
    pub fn recv_tx_id(&self) -> Option<H256> {
        self.recv_tx_id
    }

    /// Block timestamp of the receive
    pub fn recv_time(&self) -> Option<u64> {
        self.recv_time
    }

    /// Origin chain transaction that acknowledged the packet
    pub fn ack_tx_id(&self) -> Option<H256> {
        self.ack_tx_id
    }

    /// Block timestamp of the acknowledgement
    pub fn ack_time(&self) -> Option<u64> {
        self.ack_time
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PacketState {
        if self.ack_time.is_some() {
            PacketState::Acknowledged
        } else if self.recv_time.is_some() {
            PacketState::Received
        } else if self.sequence.is_some() {
            PacketState::Sent
        } else {
            PacketState::Pending
        }
    }

    /// Seconds between send and receive.
    pub fn time_to_receive(&self) -> Option<u64> {
        Some(self.recv_time?.saturating_sub(self.send_time?))
    }

    /// Seconds between send and acknowledgement.
    pub fn time_to_ack(&self) -> Option<u64> {
        Some(self.ack_time?.saturating_sub(self.send_time?))
    }

    /// Record the send. A record whose sequence is already known is left as
    /// is.
    pub fn observe_send(&mut self, sequence: u64, timestamp: u64) -> PollStatus {
        if self.sequence.is_some() {
            return PollStatus::Unchanged;
        }
        self.sequence = Some(sequence);
        self.send_time = Some(timestamp);
        PollStatus::Advanced
    }

    /// Record the receive on the destination chain.
    pub fn observe_receive(&mut self, observation: Observation) -> TrackerResult<PollStatus> {
        let send_time = self.send_time.ok_or(PreconditionError::SendNotRecorded {
            send_tx_id: self.send_tx_id,
        })?;
        if self.recv_time.is_some() {
            return Ok(PollStatus::Unchanged);
        }
        if observation.timestamp < send_time {
            return Err(TrackerError::OutOfOrder {
                stage: Stage::Receive,
                timestamp: observation.timestamp,
                previous: send_time,
            });
        }
        self.recv_tx_id = Some(observation.tx_id);
        self.recv_time = Some(observation.timestamp);
        Ok(PollStatus::Advanced)
    }

    /// Record the acknowledgement on the origin chain.
    pub fn observe_ack(&mut self, observation: Observation) -> TrackerResult<PollStatus> {
        if self.sequence.is_none() {
            return Err(PreconditionError::SendNotRecorded {
                send_tx_id: self.send_tx_id,
            }
            .into());
        }
        if self.ack_time.is_some() {
            return Ok(PollStatus::Unchanged);
        }
        let recv_time = self.recv_time.ok_or(PreconditionError::ReceiveNotRecorded {
            send_tx_id: self.send_tx_id,
        })?;
        if observation.timestamp < recv_time {
            return Err(TrackerError::OutOfOrder {
                stage: Stage::Acknowledgement,
                timestamp: observation.timestamp,
                previous: recv_time,
            });
        }
        self.ack_tx_id = Some(observation.tx_id);
        self.ack_time = Some(observation.timestamp);
        Ok(PollStatus::Advanced)
    }

    /// Check the record's internal consistency, e.g. after reading it back
    /// from storage.
    pub fn validate(&self) -> Result<(), InvalidRecord> {
        if self.sequence.is_some() != self.send_time.is_some() {
            return Err(InvalidRecord::IncompleteStage(Stage::Send));
        }
        if self.recv_time.is_some() != self.recv_tx_id.is_some() {
            return Err(InvalidRecord::IncompleteStage(Stage::Receive));
        }
        if self.ack_time.is_some() != self.ack_tx_id.is_some() {
            return Err(InvalidRecord::IncompleteStage(Stage::Acknowledgement));
        }
        if let Some(recv_time) = self.recv_time {
            let send_time = self
                .send_time
                .ok_or(InvalidRecord::MissingEarlierStage(Stage::Receive))?;
            if recv_time < send_time {
                return Err(InvalidRecord::OutOfOrder(Stage::Receive));
            }
        }
        if let Some(ack_time) = self.ack_time {
            let recv_time = self
                .recv_time
                .ok_or(InvalidRecord::MissingEarlierStage(Stage::Acknowledgement))?;
            if ack_time < recv_time {
                return Err(InvalidRecord::OutOfOrder(Stage::Acknowledgement));
            }
        }
        Ok(())
    }
}

impl Display for LifecycleRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} send_tx={:?}", self.state(), self.send_tx_id)?;
        if let Some(sequence) = self.sequence {
            write!(f, " sequence={sequence}")?;
        }
        if let Some(secs) = self.time_to_receive() {
            write!(f, " time_to_receive={secs}s")?;
        }
        if let Some(secs) = self.time_to_ack() {
            write!(f, " time_to_ack={secs}s")?;
        }
        Ok(())
    }
}

/// The result of a poll: the record after the poll and what the poll did to
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The record after the poll
    pub record: LifecycleRecord,
    /// What the poll did
    pub status: PollStatus,
}

impl Transition {
    /// A poll that observed nothing new.
    pub fn pending(record: &LifecycleRecord) -> Self {
        Self {
            record: record.clone(),
            status: PollStatus::Pending,
        }
    }

    /// A poll skipped because its stage was already recorded.
    pub fn unchanged(record: &LifecycleRecord) -> Self {
        Self {
            record: record.clone(),
            status: PollStatus::Unchanged,
        }
    }
}
