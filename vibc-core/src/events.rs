use std::fmt::{Display, Formatter};

use ethers::abi::RawLog;
use ethers::contract::EthEvent;

use crate::contracts::dispatcher::{AcknowledgementFilter, RecvPacketFilter, SendPacketFilter};
use crate::{Address, DecodeError, RawLogEntry, H256};

/// The dispatcher events the tracker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `SendPacket`, emitted on the origin chain
    SendPacket,
    /// `RecvPacket`, emitted on the destination chain
    RecvPacket,
    /// `Acknowledgement`, emitted on the origin chain
    Acknowledgement,
}

impl EventKind {
    /// Every known kind, in lifecycle order.
    pub const ALL: [EventKind; 3] = [
        EventKind::SendPacket,
        EventKind::RecvPacket,
        EventKind::Acknowledgement,
    ];

    /// Signature hash of the event, i.e. its topic 0.
    pub fn signature(&self) -> H256 {
        match self {
            EventKind::SendPacket => SendPacketFilter::signature(),
            EventKind::RecvPacket => RecvPacketFilter::signature(),
            EventKind::Acknowledgement => AcknowledgementFilter::signature(),
        }
    }

    /// The kind whose signature hash is `topic`, if any.
    pub fn from_signature(topic: H256) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.signature() == topic)
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EventKind::SendPacket => "SendPacket",
            EventKind::RecvPacket => "RecvPacket",
            EventKind::Acknowledgement => "Acknowledgement",
        })
    }
}

/// A dispatcher log decoded into one of the lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecodedEvent {
    /// A packet left the origin chain
    SendPacket(SendPacketFilter),
    /// A packet arrived on the destination chain
    RecvPacket(RecvPacketFilter),
    /// The packet's acknowledgement arrived back on the origin chain
    Acknowledgement(AcknowledgementFilter),
}

impl DecodedEvent {
    /// Decode `log` against the known dispatcher events.
    ///
    /// Logs of unrelated events give `Ok(None)`. A log whose signature is
    /// known but whose payload does not decode gives an error.
    pub fn decode(log: &RawLogEntry) -> Result<Option<Self>, DecodeError> {
        let Some(kind) = log.signature().and_then(EventKind::from_signature) else {
            return Ok(None);
        };
        let raw = RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        };
        let decoded = match kind {
            EventKind::SendPacket => SendPacketFilter::decode_log(&raw).map(Self::SendPacket),
            EventKind::RecvPacket => RecvPacketFilter::decode_log(&raw).map(Self::RecvPacket),
            EventKind::Acknowledgement => {
                AcknowledgementFilter::decode_log(&raw).map(Self::Acknowledgement)
            }
        };
        decoded
            .map(Some)
            .map_err(|source| DecodeError { kind, source })
    }

    /// Which event this is.
    pub fn kind(&self) -> EventKind {
        match self {
            DecodedEvent::SendPacket(_) => EventKind::SendPacket,
            DecodedEvent::RecvPacket(_) => EventKind::RecvPacket,
            DecodedEvent::Acknowledgement(_) => EventKind::Acknowledgement,
        }
    }

    /// Sequence of the packet the event is about.
    pub fn sequence(&self) -> u64 {
        match self {
            DecodedEvent::SendPacket(event) => event.sequence,
            DecodedEvent::RecvPacket(event) => event.sequence,
            DecodedEvent::Acknowledgement(event) => event.sequence,
        }
    }

    /// The indexed port and channel of the event.
    pub fn channel(&self) -> (Address, &[u8; 32]) {
        match self {
            DecodedEvent::SendPacket(event) => {
                (event.source_port_address, &event.source_channel_id)
            }
            DecodedEvent::RecvPacket(event) => (event.dest_port_address, &event.dest_channel_id),
            DecodedEvent::Acknowledgement(event) => {
                (event.source_port_address, &event.source_channel_id)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use ethers::abi::{encode, Token};
    use ethers::utils::keccak256;

    use super::*;
    use crate::test_utils::{ack_log, recv_log, send_log, LogBuilder};

    #[test]
    fn signatures_match_dispatcher_abi() {
        assert_eq!(
            EventKind::SendPacket.signature(),
            H256(keccak256("SendPacket(address,bytes32,bytes,uint64,uint64)"))
        );
        assert_eq!(
            EventKind::RecvPacket.signature(),
            H256(keccak256("RecvPacket(address,bytes32,uint64)"))
        );
        assert_eq!(
            EventKind::Acknowledgement.signature(),
            H256(keccak256("Acknowledgement(address,bytes32,uint64)"))
        );
    }

    #[test]
    fn decodes_send_packet() {
        let log = send_log(42).build();
        let Some(DecodedEvent::SendPacket(event)) = DecodedEvent::decode(&log).unwrap() else {
            panic!("expected a SendPacket");
        };
        assert_eq!(event.sequence, 42);
        assert_eq!(event.source_port_address, LogBuilder::ORIGIN_PORT);
        assert_eq!(&event.source_channel_id, LogBuilder::origin_channel().as_fixed_bytes());
        assert_eq!(event.timeout_timestamp, LogBuilder::TIMEOUT);
        assert_eq!(event.packet.to_vec(), b"hello".to_vec());
    }

    #[test]
    fn decodes_receive_and_ack() {
        let recv = DecodedEvent::decode(&recv_log(7).build()).unwrap().unwrap();
        assert_eq!(recv.kind(), EventKind::RecvPacket);
        assert_eq!(recv.sequence(), 7);
        assert_eq!(recv.channel().0, LogBuilder::DESTINATION_PORT);

        let ack = DecodedEvent::decode(&ack_log(8).build()).unwrap().unwrap();
        assert_eq!(ack.kind(), EventKind::Acknowledgement);
        assert_eq!(ack.sequence(), 8);
    }

    #[test]
    fn unrelated_logs_are_skipped() {
        let mut log = recv_log(1).build();
        log.topics[0] = H256(keccak256("OwnershipTransferred(address,address)"));
        assert!(DecodedEvent::decode(&log).unwrap().is_none());

        let anonymous = RawLogEntry::default();
        assert!(DecodedEvent::decode(&anonymous).unwrap().is_none());
    }

    #[test]
    fn corrupt_payload_is_a_decode_fault() {
        let mut log = send_log(1).build();
        // A lone word cannot hold (bytes, uint64, uint64).
        log.data = encode(&[Token::Uint(1u64.into())]).into();
        let err = DecodedEvent::decode(&log).unwrap_err();
        assert_eq!(err.kind, EventKind::SendPacket);
    }
}
