//! A ChainLogSource is the tracker's only window onto a chain. Each tracked
//! chain gets one, backed by a chain-specific library and provider (e.g.
//! ethers::provider). Sources are polled, never subscribed to, and hold no
//! state between calls.

use std::fmt::Debug;
use std::ops::RangeInclusive;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{ChainResult, LogQuery, RawLogEntry, TxReceipt, H256};

/// Read-only access to a chain's receipts, blocks and event logs.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait ChainLogSource: Send + Sync + Debug {
    /// Fetch the receipt of a mined transaction. `None` while the
    /// transaction is unknown or not yet included in a block.
    async fn get_receipt(&self, tx_id: H256) -> ChainResult<Option<TxReceipt>>;

    /// Current block height of the chain.
    async fn get_block_height(&self) -> ChainResult<u64>;

    /// Fetch logs matching `query` between blocks `range.start()` and
    /// `range.end()`, inclusive, sorted by block and log index.
    async fn query_logs(
        &self,
        query: &LogQuery,
        range: RangeInclusive<u64>,
    ) -> ChainResult<Vec<RawLogEntry>>;

    /// Unix timestamp of a block.
    async fn get_block_timestamp(&self, block_number: u64) -> ChainResult<u64>;
}
