use std::fmt::{Debug, Formatter};
use std::ops::RangeInclusive;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::prelude::Middleware;
use ethers::types::{BlockId, BlockNumber, Filter, ValueOrArray};
use tracing::instrument;

use vibc_core::{
    Address, ChainCommunicationError, ChainLogSource, ChainResult, LogQuery, RawLogEntry,
    TxReceipt, H256, U64,
};

/// Reads dispatcher receipts and logs from an Ethereum-compatible chain.
#[derive(derive_new::new)]
pub struct EthereumLogSource<M>
where
    M: Middleware,
{
    provider: Arc<M>,
    dispatcher: Address,
}

impl<M> Debug for EthereumLogSource<M>
where
    M: Middleware,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumLogSource")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl<M> EthereumLogSource<M>
where
    M: Middleware + 'static,
{
    fn filter(&self, query: &LogQuery, range: &RangeInclusive<u64>) -> ChainResult<Filter> {
        let mut filter = Filter::new()
            .address(ValueOrArray::Value(self.dispatcher))
            .from_block(BlockNumber::Number(U64::from(*range.start())))
            .to_block(BlockNumber::Number(U64::from(*range.end())))
            .topic0(ValueOrArray::Value(Some(query.signature)));
        for (i, topic) in query.topics.iter().enumerate() {
            let topic = ValueOrArray::Value(Some(*topic));
            filter = match i {
                0 => filter.topic1(topic),
                1 => filter.topic2(topic),
                2 => filter.topic3(topic),
                _ => {
                    return Err(ChainCommunicationError::from_other_str(
                        "An event has at most three indexed topics",
                    ))
                }
            };
        }
        Ok(filter)
    }
}

#[async_trait]
impl<M> ChainLogSource for EthereumLogSource<M>
where
    M: Middleware + 'static,
{
    #[instrument(err, skip(self))]
    async fn get_receipt(&self, tx_id: H256) -> ChainResult<Option<TxReceipt>> {
        let Some(receipt) = self
            .provider
            .get_transaction_receipt(tx_id)
            .await
            .map_err(ChainCommunicationError::from_other)?
        else {
            return Ok(None);
        };
        let Some(block_number) = receipt.block_number else {
            return Ok(None);
        };
        let logs = receipt
            .logs
            .into_iter()
            .map(RawLogEntry::try_from)
            .collect::<ChainResult<Vec<_>>>()?;
        Ok(Some(TxReceipt {
            transaction_id: receipt.transaction_hash,
            block_number: block_number.as_u64(),
            logs,
        }))
    }

    #[instrument(err, ret, skip(self))]
    async fn get_block_height(&self) -> ChainResult<u64> {
        Ok(self
            .provider
            .get_block_number()
            .await
            .map_err(ChainCommunicationError::from_other)?
            .as_u64())
    }

    #[instrument(err, skip(self))]
    async fn query_logs(
        &self,
        query: &LogQuery,
        range: RangeInclusive<u64>,
    ) -> ChainResult<Vec<RawLogEntry>> {
        let filter = self.filter(query, &range)?;
        let mut logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(ChainCommunicationError::from_other)?
            .into_iter()
            .map(RawLogEntry::try_from)
            .collect::<ChainResult<Vec<_>>>()?;
        logs.sort_by(|a, b| a.meta.cmp(&b.meta));
        Ok(logs)
    }

    #[instrument(err, ret, skip(self))]
    async fn get_block_timestamp(&self, block_number: u64) -> ChainResult<u64> {
        let block = self
            .provider
            .get_block(BlockId::Number(BlockNumber::Number(block_number.into())))
            .await
            .map_err(ChainCommunicationError::from_other)?
            .ok_or(ChainCommunicationError::BlockNotFound(block_number))?;
        Ok(block.timestamp.as_u64())
    }
}
