//! The tracker follows a vIBC universal packet across its route. Given the
//! transaction that sent it on the origin chain, it finds the packet's
//! `RecvPacket` on the destination chain and its `Acknowledgement` back on
//! the origin, and reports how long each leg took.
//!
//! The packet's progress is kept in a JSON record file between invocations,
//! so each stage can be checked on its own (`send`, `receive`, `ack`) or all
//! of them followed until the packet is acknowledged (`watch`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

use clap::Parser;
use eyre::Result;

use vibc_base::settings::Settings;

use crate::cli::Cli;
use crate::tracker::Tracker;

mod cli;
mod store;
mod tracker;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(feature = "color-eyre")]
    color_eyre::install()?;

    let cli = Cli::parse();
    let settings = Settings::load()?;
    settings.tracing.start_tracing()?;

    let tracker = Tracker::from_settings(&settings, &cli.record)?;
    tracker.run(cli.command).await
}
