use std::ops::RangeInclusive;

use crate::H256;

/// Number of blocks scanned back from the chain tip when looking for a
/// lifecycle event.
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 3600;

/// An event log query: the event signature plus exact-match values for the
/// leading indexed topics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogQuery {
    /// Event signature hash, matched against topic 0
    pub signature: H256,
    /// Values for topics 1.. in order
    pub topics: Vec<H256>,
}

impl LogQuery {
    /// Query every log with the given event signature.
    pub fn new(signature: H256) -> Self {
        Self {
            signature,
            topics: Vec::new(),
        }
    }

    /// Require the next indexed topic to equal `topic`.
    pub fn with_topic(mut self, topic: H256) -> Self {
        self.topics.push(topic);
        self
    }
}

/// The inclusive block range a single poll scans.
///
/// The window always ends at the current height and is recomputed on every
/// poll; nothing about previous scans is remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryWindow {
    /// First block scanned
    pub from: u64,
    /// Last block scanned
    pub to: u64,
}

impl QueryWindow {
    /// The window of `lookback` blocks ending at `height`.
    pub fn ending_at(height: u64, lookback: u64) -> Self {
        Self {
            from: height.saturating_sub(lookback),
            to: height,
        }
    }

    /// The window as a block range.
    pub fn range(&self) -> RangeInclusive<u64> {
        self.from..=self.to
    }
}
