#![allow(non_snake_case)]

use std::ops::RangeInclusive;

use async_trait::async_trait;
use mockall::*;

use vibc_core::*;

mock! {
    pub ChainLogSource {
        pub fn _get_receipt(&self, tx_id: H256) -> ChainResult<Option<TxReceipt>> {}

        pub fn _get_block_height(&self) -> ChainResult<u64> {}

        pub fn _query_logs(
            &self,
            query: &LogQuery,
            range: RangeInclusive<u64>,
        ) -> ChainResult<Vec<RawLogEntry>> {}

        pub fn _get_block_timestamp(&self, block_number: u64) -> ChainResult<u64> {}
    }
}

impl std::fmt::Debug for MockChainLogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockChainLogSource")
    }
}

#[async_trait]
impl ChainLogSource for MockChainLogSource {
    async fn get_receipt(&self, tx_id: H256) -> ChainResult<Option<TxReceipt>> {
        self._get_receipt(tx_id)
    }

    async fn get_block_height(&self) -> ChainResult<u64> {
        self._get_block_height()
    }

    async fn query_logs(
        &self,
        query: &LogQuery,
        range: RangeInclusive<u64>,
    ) -> ChainResult<Vec<RawLogEntry>> {
        self._query_logs(query, range)
    }

    async fn get_block_timestamp(&self, block_number: u64) -> ChainResult<u64> {
        self._get_block_timestamp(block_number)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use vibc_core::test_utils::{destination_end, origin_end, recv_log, send_log};

    use super::*;

    fn endpoint(name: &str, logs: MockChainLogSource, channel: ChannelEnd) -> ChainEndpoint {
        ChainEndpoint::new(name.to_owned(), Arc::new(logs), channel, 3600)
    }

    fn sent_record(tx_id: H256) -> LifecycleRecord {
        let mut record = LifecycleRecord::new(tx_id);
        record.observe_send(5, 1_000);
        record
    }

    #[tokio::test]
    async fn receive_scan_covers_lookback_window() {
        let recv = recv_log(5).at(9_000, 0).build();
        let recv_tx = recv.meta.transaction_id;

        let mut destination = MockChainLogSource::new();
        destination
            .expect__get_block_height()
            .times(1)
            .returning(|| Ok(10_000));
        destination
            .expect__query_logs()
            .withf(|query, range| {
                query.signature == EventKind::RecvPacket.signature()
                    && *range == (10_000 - 3600..=10_000)
            })
            .times(1)
            .returning(move |_, _| Ok(vec![recv.clone()]));
        destination
            .expect__get_block_timestamp()
            .with(predicate::eq(9_000))
            .times(1)
            .returning(|_| Ok(1_030));

        let tracker = PacketTracker::new(
            endpoint("base", MockChainLogSource::new(), origin_end()),
            endpoint("optimism", destination, destination_end()),
        );
        let record = sent_record(H256::repeat_byte(1));
        let transition = tracker.poll_receive(&record).await.unwrap();

        assert_eq!(transition.status, PollStatus::Advanced);
        assert_eq!(transition.record.recv_tx_id(), Some(recv_tx));
        assert_eq!(transition.record.time_to_receive(), Some(30));
    }

    #[tokio::test]
    async fn failing_timestamp_lookup_keeps_record() {
        let recv = recv_log(5).at(42, 0).build();
        let mut destination = MockChainLogSource::new();
        destination
            .expect__get_block_height()
            .returning(|| Ok(100));
        destination
            .expect__query_logs()
            .returning(move |_, _| Ok(vec![recv.clone()]));
        destination
            .expect__get_block_timestamp()
            .returning(|_| Err(ChainCommunicationError::from_other_str("timeout")));

        let tracker = PacketTracker::new(
            endpoint("base", MockChainLogSource::new(), origin_end()),
            endpoint("optimism", destination, destination_end()),
        );
        let record = sent_record(H256::repeat_byte(1));
        let err = tracker.poll_receive(&record).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(record.recv_tx_id(), None);
    }

    #[tokio::test]
    async fn recorded_send_does_not_touch_the_chain() {
        let send = send_log(5).build();
        let mut origin = MockChainLogSource::new();
        origin.expect__get_receipt().never();

        let tracker = PacketTracker::new(
            endpoint("base", origin, origin_end()),
            endpoint("optimism", MockChainLogSource::new(), destination_end()),
        );
        let record = sent_record(send.meta.transaction_id);
        let transition = tracker.record_send(&record).await.unwrap();
        assert_eq!(transition.status, PollStatus::Unchanged);
    }
}
