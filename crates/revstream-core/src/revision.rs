//! Revision Algebra
//!
//! This module defines the position types of the stream client.
//!
//! ## What is a Revision?
//! A revision is an opaque, totally ordered position within one segment.
//! Every successfully appended value is addressable by the revision returned
//! for it, and a reader resumes from a revision to see everything appended
//! at or after it.
//!
//! ## Structure
//! Internally a revision is the triple `(segment, byte_offset, generation)`:
//! - **segment**: identity of the backing segment, constant for a client's lifetime
//! - **byte_offset**: the only component that participates in ordering
//! - **generation**: reserved, always 0
//!
//! ## Design Decisions
//! - Fields are private: consumers obtain revisions from append operations
//!   and the positional accessors, never by synthesizing offsets.
//! - `PartialOrd` only: revisions from different segments have no defined
//!   order, so comparing them yields `None` instead of a wrong answer.
//! - Implements `Serialize`/`Deserialize` because revisions are plain values
//!   that outlive the client that produced them.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an append-only segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId {
    /// Name of the owning stream.
    stream: String,

    /// Segment number within the stream.
    number: u32,
}

impl SegmentId {
    pub fn new(stream: impl Into<String>, number: u32) -> Self {
        Self {
            stream: stream.into(),
            number,
        }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.stream, self.number)
    }
}

/// An opaque position within a segment, produced by successful appends.
///
/// Revisions are immutable, cheaply copyable values. Two revisions compare
/// by byte offset when they belong to the same segment; comparing revisions
/// from different segments is undefined and yields `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision {
    segment: SegmentId,
    offset: u64,
    generation: u32,
}

impl Revision {
    /// Create a revision at `offset` within `segment`.
    ///
    /// Normally revisions are obtained from append operations or the
    /// positional accessors of the client; constructing one by hand is
    /// reserved for the client implementation.
    pub fn new(segment: SegmentId, offset: u64) -> Self {
        Self {
            segment,
            offset,
            generation: 0,
        }
    }

    /// Identity of the segment this revision points into.
    pub fn segment_id(&self) -> &SegmentId {
        &self.segment
    }

    /// Byte offset of this revision within its segment.
    pub fn byte_offset(&self) -> u64 {
        self.offset
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.segment != other.segment {
            return None;
        }
        match self.offset.cmp(&other.offset) {
            Ordering::Equal => Some(self.generation.cmp(&other.generation)),
            ordering => Some(ordering),
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment, self.offset)
    }
}
