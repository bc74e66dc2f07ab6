//! Shared plumbing for vIBC tracker agents: loading settings, building the
//! chain connections they describe, and starting the tracing subscriber.

// Forbid unsafe code outside of tests
#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(missing_docs)]

pub mod settings;
