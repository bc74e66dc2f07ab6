use std::cmp::Ordering;

use ethers::types::Log;
use serde::{Deserialize, Serialize};

use crate::{Address, Bytes, ChainCommunicationError, H256, U256};

/// A close clone of the Ethereum `LogMeta`, this is designed to be a more
/// generic metadata that we can use for other blockchains later.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LogMeta {
    /// Address from which this log originated
    pub address: Address,

    /// The block in which this log was emitted
    pub block_number: u64,

    /// The block hash in which this log was emitted
    pub block_hash: H256,

    /// The transaction identifier/hash in which this log was emitted
    pub transaction_id: H256,

    /// Transactions index position log was created from
    pub transaction_index: u64,

    /// Log index position in the block
    pub log_index: U256,
}

// Orders logs by their position on chain: block first, then log index.
impl Ord for LogMeta {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.block_number.cmp(&other.block_number) {
            Ordering::Equal => self.log_index.cmp(&other.log_index),
            ord => ord,
        }
    }
}

impl PartialOrd for LogMeta {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A raw, undecoded log entry together with where it was emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLogEntry {
    /// Indexed topics; the first one is the event signature for
    /// non-anonymous events.
    pub topics: Vec<H256>,
    /// ABI encoded non-indexed fields.
    pub data: Bytes,
    /// Position of the log on chain.
    pub meta: LogMeta,
}

impl RawLogEntry {
    /// The event signature topic, if any.
    pub fn signature(&self) -> Option<H256> {
        self.topics.first().copied()
    }
}

impl TryFrom<Log> for RawLogEntry {
    type Error = ChainCommunicationError;

    fn try_from(log: Log) -> Result<Self, Self::Error> {
        // Logs of pending blocks carry no position yet; those are never
        // returned for a mined receipt or a bounded block range.
        let block_number = log
            .block_number
            .ok_or(ChainCommunicationError::MissingLogMeta("block_number"))?
            .as_u64();
        let block_hash = log
            .block_hash
            .ok_or(ChainCommunicationError::MissingLogMeta("block_hash"))?;
        let transaction_id = log
            .transaction_hash
            .ok_or(ChainCommunicationError::MissingLogMeta("transaction_hash"))?;
        let transaction_index = log
            .transaction_index
            .ok_or(ChainCommunicationError::MissingLogMeta("transaction_index"))?
            .as_u64();
        let log_index = log
            .log_index
            .ok_or(ChainCommunicationError::MissingLogMeta("log_index"))?;

        Ok(Self {
            topics: log.topics,
            data: log.data,
            meta: LogMeta {
                address: log.address,
                block_number,
                block_hash,
                transaction_id,
                transaction_index,
                log_index,
            },
        })
    }
}

/// The subset of a mined transaction receipt the tracker needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxReceipt {
    /// Hash of the transaction
    pub transaction_id: H256,
    /// Block the transaction was included in
    pub block_number: u64,
    /// Logs emitted by the transaction, in emission order
    pub logs: Vec<RawLogEntry>,
}

#[cfg(test)]
mod test {
    use ethers::types::U64;

    use super::*;

    fn meta(block_number: u64, log_index: u64) -> LogMeta {
        LogMeta {
            block_number,
            log_index: log_index.into(),
            ..Default::default()
        }
    }

    #[test]
    fn orders_by_block_then_log_index() {
        let mut metas = vec![meta(11, 0), meta(10, 7), meta(10, 2)];
        metas.sort();
        assert_eq!(metas, vec![meta(10, 2), meta(10, 7), meta(11, 0)]);
    }

    #[test]
    fn pending_log_is_rejected() {
        let log = Log {
            block_number: None,
            ..Default::default()
        };
        assert!(matches!(
            RawLogEntry::try_from(log),
            Err(ChainCommunicationError::MissingLogMeta("block_number"))
        ));
    }

    #[test]
    fn mined_log_keeps_position() {
        let log = Log {
            topics: vec![H256::repeat_byte(1)],
            block_number: Some(U64::from(99)),
            block_hash: Some(H256::repeat_byte(2)),
            transaction_hash: Some(H256::repeat_byte(3)),
            transaction_index: Some(U64::from(4)),
            log_index: Some(U256::from(5)),
            ..Default::default()
        };
        let entry = RawLogEntry::try_from(log).unwrap();
        assert_eq!(entry.signature(), Some(H256::repeat_byte(1)));
        assert_eq!(entry.meta.block_number, 99);
        assert_eq!(entry.meta.transaction_id, H256::repeat_byte(3));
        assert_eq!(entry.meta.transaction_index, 4);
        assert_eq!(entry.meta.log_index, U256::from(5));
    }
}
