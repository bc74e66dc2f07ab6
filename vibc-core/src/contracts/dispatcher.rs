//! Event bindings for the vIBC `Dispatcher` contract.
//!
//! Only the packet lifecycle events are bound; the remaining dispatcher events
//! (channel handshakes, timeouts, write-ack) are never inspected.

#![allow(missing_docs)]

use ethers::contract::{EthDisplay, EthEvent};
use ethers::types::{Address, Bytes};

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, EthEvent, EthDisplay)]
#[ethevent(
    name = "SendPacket",
    abi = "SendPacket(address,bytes32,bytes,uint64,uint64)"
)]
pub struct SendPacketFilter {
    #[ethevent(indexed)]
    pub source_port_address: Address,
    #[ethevent(indexed)]
    pub source_channel_id: [u8; 32],
    pub packet: Bytes,
    pub sequence: u64,
    pub timeout_timestamp: u64,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, EthEvent, EthDisplay)]
#[ethevent(name = "RecvPacket", abi = "RecvPacket(address,bytes32,uint64)")]
pub struct RecvPacketFilter {
    #[ethevent(indexed)]
    pub dest_port_address: Address,
    #[ethevent(indexed)]
    pub dest_channel_id: [u8; 32],
    pub sequence: u64,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, EthEvent, EthDisplay)]
#[ethevent(
    name = "Acknowledgement",
    abi = "Acknowledgement(address,bytes32,uint64)"
)]
pub struct AcknowledgementFilter {
    #[ethevent(indexed)]
    pub source_port_address: Address,
    #[ethevent(indexed)]
    pub source_channel_id: [u8; 32],
    pub sequence: u64,
}
