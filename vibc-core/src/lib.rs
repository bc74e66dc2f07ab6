//! This crate contains the core types, traits and the packet correlator used to
//! follow a vIBC universal packet from its send on the origin chain, to its
//! receipt on the destination chain and back to its acknowledgement.
//!
//! Nothing here talks to a chain directly: every chain interaction goes
//! through a [`ChainLogSource`], which chain crates (e.g. `vibc-ethereum`)
//! implement.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![forbid(unsafe_code)]

pub use ethers::types::{Address, Bytes, H160, H256, U256, U64};

pub use correlator::*;
pub use error::*;
pub use events::*;
pub use traits::*;
pub use types::*;

/// Dispatcher event bindings in the shape produced by `abigen`.
pub mod contracts;

/// Fixtures for building dispatcher logs and an in-memory log source.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod correlator;
mod error;
mod events;
mod traits;
mod types;
