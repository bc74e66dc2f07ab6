//! Mocks of the chain interfaces for testing tracker agents.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

/// Mock objects for testing
pub mod mocks;
