use std::sync::Arc;

use eyre::{Context, Result};
use serde::Deserialize;
use url::Url;

use vibc_core::{
    Address, ChainEndpoint, ChainLogSource, ChannelEnd, H256, DEFAULT_LOOKBACK_BLOCKS,
};
use vibc_ethereum::{BuildableWithProvider, ConnectionConf, LogSourceBuilder};

/// One side of the tracked route: where to reach the chain and which
/// dispatcher, port and channel the packet passes through on it.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConf {
    /// Name used in logs and output
    pub name: String,
    /// Rpc url, or a comma separated list of urls to form a quorum from
    pub rpc_url: String,
    /// The vIBC dispatcher contract emitting the packet events
    pub dispatcher: Address,
    /// The application's port contract on this chain
    pub port: Address,
    /// The channel name on this chain, e.g. `channel-10`
    pub channel: String,
    /// How many blocks back from the tip each receive or ack scan covers
    #[serde(default = "default_lookback_blocks")]
    pub lookback_blocks: u64,
    /// Block explorer base url
    #[serde(default)]
    pub explorer: Option<Url>,
}

fn default_lookback_blocks() -> u64 {
    DEFAULT_LOOKBACK_BLOCKS
}

impl ChainConf {
    /// The port and channel pair of this end of the route.
    pub fn channel_end(&self) -> Result<ChannelEnd> {
        ChannelEnd::new(self.port, &self.channel)
            .with_context(|| format!("Invalid channel name for chain {}", self.name))
    }

    /// Parse the configured rpc urls.
    pub fn connection(&self) -> Result<ConnectionConf> {
        self.rpc_url
            .parse::<ConnectionConf>()
            .with_context(|| format!("Invalid rpc_url for chain {}", self.name))
    }

    /// Connect to the chain's rpc.
    pub fn build_endpoint(&self) -> Result<ChainEndpoint> {
        let logs = LogSourceBuilder
            .build_with_connection_conf(self.connection()?, self.dispatcher)
            .with_context(|| format!("Failed to connect to chain {}", self.name))?;
        self.build_endpoint_with(logs)
    }

    /// Use an already built log source for this chain.
    pub fn build_endpoint_with(&self, logs: Arc<dyn ChainLogSource>) -> Result<ChainEndpoint> {
        Ok(ChainEndpoint::new(
            self.name.clone(),
            logs,
            self.channel_end()?,
            self.lookback_blocks,
        ))
    }

    /// Explorer page of a transaction, if an explorer is configured.
    pub fn explorer_tx_url(&self, tx_id: H256) -> Option<String> {
        self.explorer
            .as_ref()
            .map(|base| format!("{}/tx/{tx_id:?}", base.as_str().trim_end_matches('/')))
    }
}
