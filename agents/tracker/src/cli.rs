use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vibc_core::H256;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// File the packet's lifecycle record is kept in between runs
    #[clap(long, short, env = "VIBC_RECORD", default_value = "vibc-packet.json")]
    pub record: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start tracking the packet sent by an origin chain transaction
    Send {
        /// Hash of the transaction that sent the packet
        tx: H256,
    },
    /// Check the destination chain for the tracked packet's receipt
    Receive,
    /// Check the origin chain for the tracked packet's acknowledgement
    Ack,
    /// Poll until the packet sent by a transaction is acknowledged
    Watch {
        /// Hash of the transaction that sent the packet
        tx: H256,
    },
}
