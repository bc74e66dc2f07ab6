use std::path::Path;
use std::time::Duration;

use eyre::Result;
use tokio::time::sleep;
use tracing::{info, info_span, instrument, warn, Instrument};

use vibc_base::settings::{ChainConf, Settings};
use vibc_core::{LifecycleRecord, PacketState, PacketTracker, PollStatus, Transition, H256};

use crate::cli::Commands;
use crate::store::RecordStore;

/// Drives a [`PacketTracker`] for the packet kept in a [`RecordStore`].
#[derive(Debug)]
pub struct Tracker {
    tracker: PacketTracker,
    origin: ChainConf,
    destination: ChainConf,
    poll_interval: Duration,
    store: RecordStore,
}

impl Tracker {
    pub fn from_settings(settings: &Settings, record: &Path) -> Result<Self> {
        Ok(Self::new(
            settings.build_tracker()?,
            settings,
            RecordStore::new(record.to_owned()),
        ))
    }

    fn new(tracker: PacketTracker, settings: &Settings, store: RecordStore) -> Self {
        Self {
            tracker,
            origin: settings.origin.clone(),
            destination: settings.destination.clone(),
            poll_interval: settings.poll_interval(),
            store,
        }
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        let record = match command {
            Commands::Send { tx } => self.send(tx).await?,
            Commands::Receive => self.receive().await?,
            Commands::Ack => self.ack().await?,
            Commands::Watch { tx } => self.watch(tx).await?,
        };
        println!("{}", self.summary(&record));
        Ok(())
    }

    /// Start tracking `tx`. A packet already tracked for `tx` keeps its
    /// progress, any other tracked packet is replaced.
    async fn send(&self, tx: H256) -> Result<LifecycleRecord> {
        let record = self.resume_or_start(tx)?;
        let transition = self.tracker.record_send(&record).await?;
        match transition.status {
            PollStatus::Pending => {
                info!(send_tx = ?tx, "Send transaction is not mined yet, try again later")
            }
            PollStatus::Unchanged => return Ok(transition.record),
            PollStatus::Advanced => {}
        }
        self.store.save(&transition.record)?;
        Ok(transition.record)
    }

    async fn receive(&self) -> Result<LifecycleRecord> {
        let record = self.store.load_required()?;
        let transition = self.tracker.poll_receive(&record).await?;
        self.keep(transition)
    }

    async fn ack(&self) -> Result<LifecycleRecord> {
        let record = self.store.load_required()?;
        let transition = self.tracker.poll_ack(&record).await?;
        self.keep(transition)
    }

    /// Poll until the packet is acknowledged. Chain faults are logged and
    /// retried on the next tick, anything else ends the watch.
    #[instrument(skip(self))]
    async fn watch(&self, tx: H256) -> Result<LifecycleRecord> {
        let mut record = self.resume_or_start(tx)?;

        loop {
            let state = record.state();
            if state == PacketState::Acknowledged {
                return Ok(record);
            }
            let span = info_span!("poll", %state);
            match self.tracker.poll(&record).instrument(span).await {
                Ok(transition) => record = self.keep(transition)?,
                Err(error) if error.is_retryable() => {
                    warn!(%error, "Chain query failed, retrying");
                }
                Err(error) => return Err(error.into()),
            }
            if record.state() == state {
                sleep(self.poll_interval).await;
            }
        }
    }

    /// The stored record if it tracks `tx`, otherwise a fresh one.
    fn resume_or_start(&self, tx: H256) -> Result<LifecycleRecord> {
        Ok(match self.store.load()? {
            Some(record) if record.send_tx_id() == tx => record,
            Some(record) => {
                info!(previous = ?record.send_tx_id(), "Replacing previously tracked packet");
                LifecycleRecord::new(tx)
            }
            None => LifecycleRecord::new(tx),
        })
    }

    /// Persist the record if the poll advanced it.
    fn keep(&self, transition: Transition) -> Result<LifecycleRecord> {
        let Transition { record, status } = transition;
        if status == PollStatus::Advanced {
            self.store.save(&record)?;
            info!(%record, "Lifecycle advanced");
        }
        Ok(record)
    }

    /// Human readable report of the record with explorer links.
    fn summary(&self, record: &LifecycleRecord) -> String {
        let links = [
            ("send", &self.origin, Some(record.send_tx_id())),
            ("receive", &self.destination, record.recv_tx_id()),
            ("ack", &self.origin, record.ack_tx_id()),
        ];
        let lines = links.into_iter().filter_map(|(stage, chain, tx)| {
            let tx = tx?;
            let link = chain
                .explorer_tx_url(tx)
                .unwrap_or_else(|| format!("{tx:?}"));
            Some(format!("  {stage:<8} {} {link}", chain.name))
        });
        std::iter::once(record.to_string())
            .chain(lines)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use vibc_base::settings::TracingConfig;
    use vibc_core::test_utils::*;
    use vibc_core::{ChainCommunicationError, ChainLogSource, EventKind, TxReceipt};
    use vibc_test::mocks::MockChainLogSource;

    use super::*;

    const SEND_TX: H256 = H256([0xaa; 32]);
    const T0: u64 = 1_714_000_000;

    fn chain(name: &str, port: vibc_core::Address, channel: &str, explorer: Option<&str>) -> ChainConf {
        ChainConf {
            name: name.to_owned(),
            rpc_url: "http://127.0.0.1:8545".to_owned(),
            dispatcher: LogBuilder::DISPATCHER,
            port,
            channel: channel.to_owned(),
            lookback_blocks: 3600,
            explorer: explorer.map(|url| url.parse().unwrap()),
        }
    }

    fn settings() -> Settings {
        Settings {
            origin: chain(
                "base",
                LogBuilder::ORIGIN_PORT,
                LogBuilder::ORIGIN_CHANNEL,
                Some("https://base-sepolia.blockscout.com"),
            ),
            destination: chain(
                "optimism",
                LogBuilder::DESTINATION_PORT,
                LogBuilder::DESTINATION_CHANNEL,
                None,
            ),
            poll_interval_secs: 10,
            tracing: TracingConfig::default(),
        }
    }

    fn tracker(
        dir: &tempfile::TempDir,
        origin: impl ChainLogSource + 'static,
        destination: impl ChainLogSource + 'static,
    ) -> Tracker {
        let settings = settings();
        let packets = PacketTracker::new(
            settings.origin.build_endpoint_with(Arc::new(origin)).unwrap(),
            settings
                .destination
                .build_endpoint_with(Arc::new(destination))
                .unwrap(),
        );
        Tracker::new(
            packets,
            &settings,
            RecordStore::new(dir.path().join("packet.json")),
        )
    }

    fn send_receipt() -> TxReceipt {
        TxReceipt {
            transaction_id: SEND_TX,
            block_number: 10,
            logs: vec![send_log(5).at(10, 0).tx(SEND_TX).build()],
        }
    }

    fn origin_chain() -> MockLogSource {
        let receipt = send_receipt();
        MockLogSource::new(100)
            .with_receipt(SEND_TX, receipt.block_number, receipt.logs)
            .with_timestamp(10, T0)
            .with_log(ack_log(5).at(20, 0).build())
            .with_timestamp(20, T0 + 40)
    }

    fn destination_chain() -> MockLogSource {
        MockLogSource::new(100)
            .with_log(recv_log(5).at(30, 1).build())
            .with_timestamp(30, T0 + 15)
    }

    #[tokio::test(start_paused = true)]
    async fn watch_follows_packet_to_acknowledgement() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, origin_chain(), destination_chain());

        let record = tracker.watch(SEND_TX).await.unwrap();
        assert_eq!(record.state(), PacketState::Acknowledged);
        assert_eq!(record.time_to_receive(), Some(15));
        assert_eq!(record.time_to_ack(), Some(40));
        assert_eq!(tracker.store.load().unwrap(), Some(record.clone()));

        let summary = tracker.summary(&record);
        assert!(summary.starts_with("ACKNOWLEDGED"));
        assert!(summary.contains(&format!(
            "https://base-sepolia.blockscout.com/tx/{SEND_TX:?}"
        )));
        let recv_tx = record.recv_tx_id().unwrap();
        assert!(summary.contains(&format!("optimism {recv_tx:?}")));
        assert_eq!(summary.lines().count(), 4);
    }

    #[test]
    fn summary_lists_only_seen_transactions() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, MockLogSource::new(0), MockLogSource::new(0));
        let mut record = LifecycleRecord::new(SEND_TX);
        record.observe_send(5, T0);

        let summary = tracker.summary(&record);
        let lines = summary.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], record.to_string());
        assert_eq!(
            lines[1],
            format!("  send     base https://base-sepolia.blockscout.com/tx/{SEND_TX:?}")
        );
    }

    #[tokio::test]
    async fn step_wise_commands_persist_progress() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, origin_chain(), destination_chain());

        let err = tracker.receive().await.unwrap_err();
        assert!(err.to_string().contains("No packet tracked"));

        let record = tracker.send(SEND_TX).await.unwrap();
        assert_eq!(record.state(), PacketState::Sent);

        // the ack is on chain already but waits for the receive
        let record = tracker.ack().await.unwrap();
        assert_eq!(record.state(), PacketState::Sent);
        assert_eq!(tracker.store.load().unwrap().unwrap().ack_tx_id(), None);

        assert_eq!(
            tracker.receive().await.unwrap().state(),
            PacketState::Received
        );
        assert_eq!(tracker.ack().await.unwrap().state(), PacketState::Acknowledged);
        assert_eq!(
            tracker.store.load().unwrap().unwrap().state(),
            PacketState::Acknowledged
        );
    }

    #[tokio::test]
    async fn send_again_keeps_progress() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, origin_chain(), destination_chain());

        tracker.send(SEND_TX).await.unwrap();
        tracker.receive().await.unwrap();
        let record = tracker.send(SEND_TX).await.unwrap();
        assert_eq!(record.state(), PacketState::Received);
        assert_eq!(
            tracker.store.load().unwrap().unwrap().state(),
            PacketState::Received
        );

        // a different transaction starts over
        let other = H256::repeat_byte(0xbb);
        let record = tracker.send(other).await.unwrap();
        assert_eq!(record.send_tx_id(), other);
        assert_eq!(record.state(), PacketState::Pending);
        assert_eq!(tracker.store.load().unwrap().unwrap().send_tx_id(), other);
    }

    #[tracing_test::traced_test]
    #[tokio::test(start_paused = true)]
    async fn watch_retries_chain_faults() {
        let dir = tempfile::tempdir().unwrap();
        let receipt_calls = Arc::new(AtomicUsize::new(0));

        let mut origin = MockChainLogSource::new();
        let calls = receipt_calls.clone();
        origin.expect__get_receipt().returning(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ChainCommunicationError::from_other_str("connection reset"))
            } else {
                Ok(Some(send_receipt()))
            }
        });
        origin.expect__get_block_height().returning(|| Ok(100));
        origin
            .expect__query_logs()
            .withf(|query, _| query.signature == EventKind::Acknowledgement.signature())
            .returning(|_, _| Ok(vec![ack_log(5).at(20, 0).build()]));
        origin
            .expect__get_block_timestamp()
            .returning(|block| Ok(T0 + block));

        let mut destination = MockChainLogSource::new();
        destination.expect__get_block_height().returning(|| Ok(100));
        destination
            .expect__query_logs()
            .returning(|_, _| Ok(vec![recv_log(5).at(15, 0).build()]));
        destination
            .expect__get_block_timestamp()
            .returning(|block| Ok(T0 + block));

        let tracker = tracker(&dir, origin, destination);
        let record = tracker.watch(SEND_TX).await.unwrap();

        assert_eq!(record.state(), PacketState::Acknowledged);
        assert_eq!(receipt_calls.load(Ordering::SeqCst), 2);
        assert!(logs_contain("Chain query failed, retrying"));
    }

    #[tokio::test(start_paused = true)]
    async fn watch_stops_when_send_packet_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut origin = MockChainLogSource::new();
        origin.expect__get_receipt().times(1).returning(|_| {
            Ok(Some(TxReceipt {
                transaction_id: SEND_TX,
                block_number: 10,
                logs: vec![recv_log(5).at(10, 0).build()],
            }))
        });

        let tracker = tracker(&dir, origin, MockChainLogSource::new());
        let err = tracker.watch(SEND_TX).await.unwrap_err();
        assert!(err.to_string().contains("SendPacket"));
        assert!(tracker.store.load().unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn watch_resumes_stored_record() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, origin_chain(), destination_chain());
        let mut stored = LifecycleRecord::new(SEND_TX);
        stored.observe_send(5, T0);
        tracker.store.save(&stored).unwrap();

        let mut origin = MockChainLogSource::new();
        origin.expect__get_receipt().never();
        origin.expect__get_block_height().returning(|| Ok(100));
        origin
            .expect__query_logs()
            .returning(|_, _| Ok(vec![ack_log(5).at(20, 0).build()]));
        origin
            .expect__get_block_timestamp()
            .returning(|block| Ok(T0 + block));
        let tracker = Tracker {
            tracker: PacketTracker::new(
                tracker
                    .origin
                    .build_endpoint_with(Arc::new(origin))
                    .unwrap(),
                tracker.tracker.destination().clone(),
            ),
            ..tracker
        };

        let record = tracker.watch(SEND_TX).await.unwrap();
        assert_eq!(record.sequence(), Some(5));
        assert_eq!(record.state(), PacketState::Acknowledged);
    }
}
