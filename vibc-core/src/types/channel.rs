use std::fmt::{Display, Formatter};

use ethers::utils::{format_bytes32_string, parse_bytes32_string};

use crate::{Address, ChannelNameError, EventKind, LogQuery, H256};

/// One end of a vIBC channel: the universal channel middleware acting as the
/// port, and the channel id as the dispatcher stores it.
///
/// The correlator filters destination `RecvPacket` logs on the destination
/// end and origin `Acknowledgement` logs on the origin end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelEnd {
    /// Port address, i.e. the universal channel middleware contract.
    pub port: Address,
    /// Channel id as a left-aligned, zero padded bytes32 string.
    pub channel_id: [u8; 32],
}

impl ChannelEnd {
    /// Build a channel end from a human readable channel name such as
    /// `channel-10`.
    pub fn new(port: Address, channel_name: &str) -> Result<Self, ChannelNameError> {
        let channel_id = format_bytes32_string(channel_name)
            .map_err(|_| ChannelNameError(channel_name.to_owned()))?;
        Ok(Self { port, channel_id })
    }

    /// The channel id in topic form.
    pub fn channel_topic(&self) -> H256 {
        H256(self.channel_id)
    }

    /// Log query selecting `kind` events emitted for this channel end.
    ///
    /// Both lifecycle events the correlator scans for carry the port as the
    /// first indexed field and the channel id as the second.
    pub fn query(&self, kind: EventKind) -> LogQuery {
        LogQuery::new(kind.signature())
            .with_topic(H256::from(self.port))
            .with_topic(self.channel_topic())
    }

    /// Whether an event's indexed port and channel point at this end.
    pub fn matches(&self, port: Address, channel_id: &[u8; 32]) -> bool {
        self.port == port && &self.channel_id == channel_id
    }
}

impl Display for ChannelEnd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match parse_bytes32_string(&self.channel_id) {
            Ok(name) => write!(f, "{name}@{:?}", self.port),
            Err(_) => write!(f, "{:?}@{:?}", self.channel_topic(), self.port),
        }
    }
}
