//! Error types for segment operations.
//!
//! ## Error Categories
//!
//! ### Append path
//! - `Sealed`: the segment no longer accepts appends
//! - `EventTooLarge`: serialized payload exceeds the maximum event size
//!
//! ### Read path
//! - `Truncated`: the requested offset is below the segment's starting offset
//! - `EndOfSegment`: the requested offset is at or past the write offset
//! - `InvalidFrame`: the bytes at the requested offset are not a record frame
//!
//! ### Lifecycle
//! - `HandleClosed`: operation on a handle after `close()`
//! - `SegmentMismatch` / `OffsetOutOfRange`: malformed metadata requests

use revstream_core::SegmentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("segment is sealed")]
    Sealed,

    #[error("offset {offset} has been truncated (starting offset is {starting_offset})")]
    Truncated { offset: u64, starting_offset: u64 },

    #[error("end of segment reached at offset {offset}")]
    EndOfSegment { offset: u64 },

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("event of {size} bytes exceeds the maximum event size of {max} bytes")]
    EventTooLarge { size: usize, max: usize },

    #[error("segment handle is closed")]
    HandleClosed,

    #[error("segment mismatch: handle is bound to {expected}, request names {requested}")]
    SegmentMismatch {
        expected: SegmentId,
        requested: SegmentId,
    },

    #[error("offset {offset} is past the write offset {write_offset}")]
    OffsetOutOfRange { offset: u64, write_offset: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
