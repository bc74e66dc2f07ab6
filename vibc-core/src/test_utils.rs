#![allow(missing_docs)]

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ethers::abi::{encode, Token};
use ethers::utils::format_bytes32_string;

use crate::{
    Address, ChainCommunicationError, ChainLogSource, ChainResult, ChannelEnd, EventKind,
    LogMeta, LogQuery, RawLogEntry, TxReceipt, H160, H256,
};

/// Builds dispatcher logs the way a node would return them.
#[derive(Debug, Clone)]
pub struct LogBuilder {
    kind: EventKind,
    port: Address,
    channel: H256,
    sequence: u64,
    block_number: u64,
    log_index: u64,
    tx_id: Option<H256>,
}

impl LogBuilder {
    pub const DISPATCHER: Address = H160([0xd1; 20]);
    pub const ORIGIN_PORT: Address = H160([0x11; 20]);
    pub const DESTINATION_PORT: Address = H160([0x22; 20]);
    pub const ORIGIN_CHANNEL: &'static str = "channel-11";
    pub const DESTINATION_CHANNEL: &'static str = "channel-10";
    pub const TIMEOUT: u64 = 36_000;

    pub fn new(kind: EventKind, port: Address, channel: H256, sequence: u64) -> Self {
        Self {
            kind,
            port,
            channel,
            sequence,
            block_number: 1,
            log_index: 0,
            tx_id: None,
        }
    }

    pub fn origin_channel() -> H256 {
        H256(format_bytes32_string(Self::ORIGIN_CHANNEL).unwrap())
    }

    pub fn destination_channel() -> H256 {
        H256(format_bytes32_string(Self::DESTINATION_CHANNEL).unwrap())
    }

    /// Place the log at `log_index` within `block_number`.
    pub fn at(mut self, block_number: u64, log_index: u64) -> Self {
        self.block_number = block_number;
        self.log_index = log_index;
        self
    }

    pub fn tx(mut self, tx_id: H256) -> Self {
        self.tx_id = Some(tx_id);
        self
    }

    pub fn channel(mut self, channel: H256) -> Self {
        self.channel = channel;
        self
    }

    pub fn build(self) -> RawLogEntry {
        let data = match self.kind {
            EventKind::SendPacket => encode(&[
                Token::Bytes(b"hello".to_vec()),
                Token::Uint(self.sequence.into()),
                Token::Uint(Self::TIMEOUT.into()),
            ]),
            EventKind::RecvPacket | EventKind::Acknowledgement => {
                encode(&[Token::Uint(self.sequence.into())])
            }
        };
        let transaction_id = self
            .tx_id
            .unwrap_or_else(|| H256::from_low_u64_be(self.block_number * 1_000 + self.log_index));
        RawLogEntry {
            topics: vec![self.kind.signature(), H256::from(self.port), self.channel],
            data: data.into(),
            meta: LogMeta {
                address: Self::DISPATCHER,
                block_number: self.block_number,
                block_hash: H256::from_low_u64_be(self.block_number),
                transaction_id,
                transaction_index: self.log_index,
                log_index: self.log_index.into(),
            },
        }
    }
}

pub fn send_log(sequence: u64) -> LogBuilder {
    LogBuilder::new(
        EventKind::SendPacket,
        LogBuilder::ORIGIN_PORT,
        LogBuilder::origin_channel(),
        sequence,
    )
}

pub fn recv_log(sequence: u64) -> LogBuilder {
    LogBuilder::new(
        EventKind::RecvPacket,
        LogBuilder::DESTINATION_PORT,
        LogBuilder::destination_channel(),
        sequence,
    )
}

pub fn ack_log(sequence: u64) -> LogBuilder {
    LogBuilder::new(
        EventKind::Acknowledgement,
        LogBuilder::ORIGIN_PORT,
        LogBuilder::origin_channel(),
        sequence,
    )
}

pub fn origin_end() -> ChannelEnd {
    ChannelEnd::new(LogBuilder::ORIGIN_PORT, LogBuilder::ORIGIN_CHANNEL).unwrap()
}

pub fn destination_end() -> ChannelEnd {
    ChannelEnd::new(LogBuilder::DESTINATION_PORT, LogBuilder::DESTINATION_CHANNEL).unwrap()
}

/// An in-memory chain that filters its logs the way `eth_getLogs` does.
#[derive(Debug, Default)]
pub struct MockLogSource {
    pub height: u64,
    pub receipts: HashMap<H256, TxReceipt>,
    pub logs: Vec<RawLogEntry>,
    pub timestamps: HashMap<u64, u64>,
    /// Every call fails with a transport error while set.
    pub offline: bool,
    calls: AtomicUsize,
}

impl MockLogSource {
    pub fn new(height: u64) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }

    pub fn with_receipt(mut self, tx_id: H256, block_number: u64, logs: Vec<RawLogEntry>) -> Self {
        self.receipts.insert(
            tx_id,
            TxReceipt {
                transaction_id: tx_id,
                block_number,
                logs,
            },
        );
        self
    }

    pub fn with_log(mut self, log: RawLogEntry) -> Self {
        self.logs.push(log);
        self
    }

    pub fn with_timestamp(mut self, block_number: u64, timestamp: u64) -> Self {
        self.timestamps.insert(block_number, timestamp);
        self
    }

    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Number of chain round trips served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call(&self) -> ChainResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            Err(ChainCommunicationError::from_other_str("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChainLogSource for MockLogSource {
    async fn get_receipt(&self, tx_id: H256) -> ChainResult<Option<TxReceipt>> {
        self.call()?;
        Ok(self.receipts.get(&tx_id).cloned())
    }

    async fn get_block_height(&self) -> ChainResult<u64> {
        self.call()?;
        Ok(self.height)
    }

    async fn query_logs(
        &self,
        query: &LogQuery,
        range: RangeInclusive<u64>,
    ) -> ChainResult<Vec<RawLogEntry>> {
        self.call()?;
        let mut logs: Vec<RawLogEntry> = self
            .logs
            .iter()
            .filter(|log| range.contains(&log.meta.block_number))
            .filter(|log| log.signature() == Some(query.signature))
            .filter(|log| {
                query
                    .topics
                    .iter()
                    .enumerate()
                    .all(|(i, topic)| log.topics.get(i + 1) == Some(topic))
            })
            .cloned()
            .collect();
        logs.sort_by(|a, b| a.meta.cmp(&b.meta));
        Ok(logs)
    }

    async fn get_block_timestamp(&self, block_number: u64) -> ChainResult<u64> {
        self.call()?;
        self.timestamps
            .get(&block_number)
            .copied()
            .ok_or(ChainCommunicationError::BlockNotFound(block_number))
    }
}
