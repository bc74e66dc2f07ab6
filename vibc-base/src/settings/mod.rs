//! Settings for tracker agents.
//!
//! ## Introduction
//!
//! A tracker follows packets over one route: an origin chain where packets
//! are sent and acknowledged, and a destination chain where they are
//! received. Each side names the rpc to reach the chain, the dispatcher
//! contract emitting the packet events, and the port and channel of the
//! route on that chain.
//!
//! ### Configuration
//!
//! Agents read settings from the config files, then from the environment.
//!
//! #### N.B.: Environment variable names correspond 1:1 with cfg file's JSON object hierarchy.
//!
//! Any environment variable prefixed with `VIBC__` is read as an override
//! of the config file structure, with `__` separating the levels. Given the
//! config file:
//!
//! ```json
//! {
//!   "origin": {
//!     "name": "base",
//!     "rpc_url": "https://sepolia.base.org",
//!     "channel": "channel-11",
//!     ...
//!   },
//!   ...
//! }
//! ```
//!
//! the variable `VIBC__ORIGIN__RPC_URL=http://localhost:8545` replaces the
//! origin's `rpc_url`.
//!
//! ### Configuration value precedence
//!
//! Configuration key/value pairs are loaded in the following order, with later
//! sources taking precedence:
//!
//! 1. The files matching `config/*.json`, in name order.
//! 2. The order of configs in `CONFIG_FILES` with each sequential one
//!    overwriting previous ones as appropriate.
//! 3. Configuration env vars with the prefix `VIBC__`.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use eyre::Result;
use serde::Deserialize;

use vibc_core::PacketTracker;

pub use chains::*;
pub use loader::{ENV_PREFIX, ENV_SEPARATOR};
pub use trace::*;

mod chains;
mod loader;

/// Tracing subscriber management
pub mod trace;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Settings shared by tracker agents.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Chain the packet is sent from and acknowledged on
    pub origin: ChainConf,
    /// Chain the packet is received on
    pub destination: ChainConf,
    /// Seconds between polls while watching a packet
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// The tracing configuration
    #[serde(default)]
    pub tracing: TracingConfig,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl Settings {
    /// Load settings from `./config`, `CONFIG_FILES` and the process
    /// environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("./config"), env::vars().collect())
    }

    /// Load settings from the json files in `config_dir` and the given
    /// environment.
    pub fn load_from(config_dir: &Path, env: HashMap<String, String>) -> Result<Self> {
        loader::load_settings_object(config_dir, env)
    }

    /// Time to wait between polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Connect to both chains and build a tracker for the route.
    pub fn build_tracker(&self) -> Result<PacketTracker> {
        Ok(PacketTracker::new(
            self.origin.build_endpoint()?,
            self.destination.build_endpoint()?,
        ))
    }
}
