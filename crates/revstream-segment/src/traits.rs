//! Segment provider contracts.
//!
//! The stream client owns three handles onto one segment and talks to each
//! through one of these traits. Durability, replication and authorization
//! live behind them; the client sees append, framed read, metadata and
//! attribute compare-and-set.

use async_trait::async_trait;
use bytes::Bytes;
use revstream_core::SegmentId;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::PendingEvent;

/// Sentinel value of an unset attribute slot.
pub const NULL_VALUE: i64 = i64::MIN;

/// The well-known slot holding the client's mark.
pub const MARK_SLOT: AttributeSlot = AttributeSlot(0);

/// A named numeric cell attached to a segment, mutated by compare-and-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeSlot(pub u64);

/// Opaque credential passed through to metadata calls that require
/// authorization. The client neither parses nor refreshes it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DelegationToken(String);

impl DelegationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A point-in-time view of a segment's readable range.
///
/// `[starting_offset, write_offset)` is the byte range currently readable;
/// truncation advances the lower bound, appends advance the upper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentInfo {
    pub segment: SegmentId,
    pub starting_offset: u64,
    pub write_offset: u64,
    pub sealed: bool,
}

/// Writer half of a segment.
///
/// Events are buffered by `submit` and committed by `flush`; each event's
/// completion channel resolves once its commit decision is made. Any of the
/// three operations may report the segment sealed.
#[async_trait]
pub trait SegmentOutput: Send + Sync {
    async fn submit(&mut self, event: PendingEvent) -> Result<()>;

    async fn flush(&mut self) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Reader half of a segment: positioned framed reads.
///
/// `offset()` after a successful `read()` is the authoritative post-read
/// position; callers derive record boundaries from it rather than from
/// payload sizes.
#[async_trait]
pub trait SegmentInput: Send + Sync {
    fn set_offset(&mut self, offset: u64);

    async fn read(&mut self) -> Result<Bytes>;

    fn offset(&self) -> u64;

    async fn close(&mut self);
}

/// Metadata client of a segment: range queries, attributes, truncation.
#[async_trait]
pub trait SegmentMetadata: Send + Sync {
    async fn segment_info(&self, token: &DelegationToken) -> Result<SegmentInfo>;

    /// Current write offset, cheaper than a full `segment_info`.
    async fn write_offset(&self, token: &DelegationToken) -> Result<u64>;

    /// Value of `slot`, or [`NULL_VALUE`] if the slot is unset.
    async fn fetch_attribute(&self, slot: AttributeSlot) -> Result<i64>;

    /// Atomically replace `slot`'s value with `new` iff it currently holds
    /// `expected`. Returns whether the swap happened.
    async fn compare_and_set_attribute(
        &self,
        slot: AttributeSlot,
        expected: i64,
        new: i64,
        token: &DelegationToken,
    ) -> Result<bool>;

    /// Discard the segment prefix below `offset`.
    async fn truncate(
        &self,
        segment: &SegmentId,
        offset: u64,
        token: &DelegationToken,
    ) -> Result<()>;

    async fn close(&self);
}
