//! Ethereum-compatible chain support for the vIBC packet tracker: a
//! [`ChainLogSource`](vibc_core::ChainLogSource) backed by an ethers
//! provider, and the connection configuration used to build one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub use config::*;
pub use log_source::*;
pub use trait_builder::*;

mod config;
mod log_source;
mod trait_builder;
