use std::sync::Arc;

use derive_new::new;
use tracing::{debug, info, instrument, warn};

use crate::{
    ChainLogSource, ChannelEnd, DecodedEvent, EventKind, LifecycleRecord, Observation,
    PacketState, PreconditionError, QueryWindow, TrackerError, TrackerResult, Transition,
};

/// One side of the tracked route: a chain's log source plus the channel end
/// the packet travels through on that chain.
#[derive(Debug, Clone, new)]
pub struct ChainEndpoint {
    /// Human readable chain name, used in logs
    pub name: String,
    /// Where the chain's receipts and logs come from
    pub logs: Arc<dyn ChainLogSource>,
    /// The port and channel of the route on this chain
    pub channel: ChannelEnd,
    /// How many blocks back from the tip each scan covers
    pub lookback_blocks: u64,
}

/// Correlates a packet's send, receive and acknowledgement across its origin
/// and destination chains.
///
/// The tracker holds no per-packet state. Every operation takes the caller's
/// [`LifecycleRecord`] and returns the record as it stands after the poll;
/// the caller's copy is never touched, so a failed poll leaves it as it was.
#[derive(Debug, Clone, new)]
pub struct PacketTracker {
    origin: ChainEndpoint,
    destination: ChainEndpoint,
}

impl PacketTracker {
    /// The chain the packet was sent from and is acknowledged on
    pub fn origin(&self) -> &ChainEndpoint {
        &self.origin
    }

    /// The chain the packet is received on
    pub fn destination(&self) -> &ChainEndpoint {
        &self.destination
    }

    /// Read the packet's sequence and send time out of the send transaction's
    /// receipt.
    #[instrument(skip_all, fields(send_tx = ?record.send_tx_id()), err)]
    pub async fn record_send(&self, record: &LifecycleRecord) -> TrackerResult<Transition> {
        if record.sequence().is_some() {
            return Ok(Transition::unchanged(record));
        }
        let send_tx_id = record.send_tx_id();
        let Some(receipt) = self.origin.logs.get_receipt(send_tx_id).await? else {
            debug!(chain = %self.origin.name, "Send transaction not mined yet");
            return Ok(Transition::pending(record));
        };

        let sequence = receipt
            .logs
            .iter()
            .find_map(|log| match DecodedEvent::decode(log) {
                Ok(Some(DecodedEvent::SendPacket(event)))
                    if self
                        .origin
                        .channel
                        .matches(event.source_port_address, &event.source_channel_id) =>
                {
                    Some(event.sequence)
                }
                Ok(Some(DecodedEvent::SendPacket(_))) => {
                    debug!(log_index = %log.meta.log_index, "Skipping SendPacket of another channel");
                    None
                }
                Ok(_) => None,
                Err(error) => {
                    warn!(%error, log_index = %log.meta.log_index, "Skipping undecodable log");
                    None
                }
            })
            .ok_or(TrackerError::SendPacketMissing { send_tx_id })?;
        let timestamp = self
            .origin
            .logs
            .get_block_timestamp(receipt.block_number)
            .await?;

        let mut record = record.clone();
        let status = record.observe_send(sequence, timestamp);
        info!(chain = %self.origin.name, sequence, timestamp, "Packet sent");
        Ok(Transition { record, status })
    }

    /// Look for the packet's `RecvPacket` on the destination chain.
    #[instrument(skip_all, fields(send_tx = ?record.send_tx_id()), err)]
    pub async fn poll_receive(&self, record: &LifecycleRecord) -> TrackerResult<Transition> {
        let sequence = sent_sequence(record)?;
        if record.recv_time().is_some() {
            return Ok(Transition::unchanged(record));
        }
        let Some(observation) =
            find_event(&self.destination, EventKind::RecvPacket, sequence).await?
        else {
            return Ok(Transition::pending(record));
        };

        let mut record = record.clone();
        let status = record.observe_receive(observation)?;
        info!(
            chain = %self.destination.name,
            sequence,
            recv_tx = ?observation.tx_id,
            block = observation.block_number,
            time_to_receive = record.time_to_receive(),
            "Packet received"
        );
        Ok(Transition { record, status })
    }

    /// Look for the packet's `Acknowledgement` back on the origin chain.
    ///
    /// The acknowledgement may already be on chain while the receive has not
    /// been recorded. That is not an error, but nothing is recorded until the
    /// receive is.
    #[instrument(skip_all, fields(send_tx = ?record.send_tx_id()), err)]
    pub async fn poll_ack(&self, record: &LifecycleRecord) -> TrackerResult<Transition> {
        let sequence = sent_sequence(record)?;
        if record.ack_time().is_some() {
            return Ok(Transition::unchanged(record));
        }
        let Some(observation) =
            find_event(&self.origin, EventKind::Acknowledgement, sequence).await?
        else {
            return Ok(Transition::pending(record));
        };
        if record.recv_time().is_none() {
            info!(
                chain = %self.origin.name,
                sequence,
                ack_tx = ?observation.tx_id,
                block = observation.block_number,
                "Packet already acknowledged but its receive is not recorded yet"
            );
            return Ok(Transition::pending(record));
        }

        let mut record = record.clone();
        let status = record.observe_ack(observation)?;
        info!(
            chain = %self.origin.name,
            sequence,
            ack_tx = ?observation.tx_id,
            block = observation.block_number,
            time_to_ack = record.time_to_ack(),
            "Packet acknowledged"
        );
        Ok(Transition { record, status })
    }

    /// Run whichever poll the record's current state calls for.
    pub async fn poll(&self, record: &LifecycleRecord) -> TrackerResult<Transition> {
        match record.state() {
            PacketState::Pending => self.record_send(record).await,
            PacketState::Sent => self.poll_receive(record).await,
            PacketState::Received => self.poll_ack(record).await,
            PacketState::Acknowledged => Ok(Transition::unchanged(record)),
        }
    }
}

fn sent_sequence(record: &LifecycleRecord) -> Result<u64, PreconditionError> {
    record
        .sequence()
        .ok_or(PreconditionError::SendNotRecorded {
            send_tx_id: record.send_tx_id(),
        })
}

/// Scan the endpoint's query window for the first `kind` event carrying
/// `sequence` and resolve its block timestamp.
async fn find_event(
    endpoint: &ChainEndpoint,
    kind: EventKind,
    sequence: u64,
) -> TrackerResult<Option<Observation>> {
    let height = endpoint.logs.get_block_height().await?;
    let window = QueryWindow::ending_at(height, endpoint.lookback_blocks);
    let logs = endpoint
        .logs
        .query_logs(&endpoint.channel.query(kind), window.range())
        .await?;
    let scanned = logs.len();

    let found = logs.into_iter().find_map(|log| match DecodedEvent::decode(&log) {
        Ok(Some(event)) => {
            let (port, channel_id) = event.channel();
            let matches = event.kind() == kind
                && event.sequence() == sequence
                && endpoint.channel.matches(port, channel_id);
            matches.then_some(log.meta)
        }
        Ok(None) => None,
        Err(error) => {
            warn!(
                chain = %endpoint.name,
                %error,
                block = log.meta.block_number,
                log_index = %log.meta.log_index,
                "Skipping undecodable log"
            );
            None
        }
    });
    let Some(meta) = found else {
        debug!(
            chain = %endpoint.name,
            %kind,
            sequence,
            from = window.from,
            to = window.to,
            scanned,
            "No matching event in window"
        );
        return Ok(None);
    };

    let timestamp = endpoint.logs.get_block_timestamp(meta.block_number).await?;
    Ok(Some(Observation::new(
        meta.transaction_id,
        meta.block_number,
        timestamp,
    )))
}
