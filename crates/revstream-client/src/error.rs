//! Error types for stream client operations.
//!
//! ## Error Handling Strategy
//!
//! - **Fatal**: `CorruptedState`: the segment was sealed during an append;
//!   the client owns exactly one segment and cannot recover.
//! - **Caller position errors**: `TruncatedData`, `NoSuchElement`: the
//!   caller's revision or iterator cursor is no longer valid.
//! - **Usage errors**: `IllegalArgument`, `Config`.
//! - **Provider contract violations**: `SegmentShrunk`.
//! - **Unclassified**: `Segment`, `Transport`: surfaced verbatim, never
//!   silently retried.
//!
//! Conditional-append rejection is *not* an error: `write_if_at` returns
//! `Ok(None)` for it.

use thiserror::Error;

/// Convenience type alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The segment was sealed while an append was in flight. The client is
    /// bound to one segment, so no further appends can succeed.
    #[error("segment was sealed during an append; the client cannot continue")]
    CorruptedState,

    /// The requested start revision, or an iterator's cursor, lies below the
    /// segment's starting offset and has been garbage-collected.
    #[error("data at offset {offset} has been truncated (oldest readable offset is {starting_offset})")]
    TruncatedData { offset: u64, starting_offset: u64 },

    /// `next()` was called on an iterator that had reached its snapshot
    /// upper bound.
    #[error("iterator advanced past its snapshot upper bound")]
    NoSuchElement,

    /// Malformed input, e.g. a revision bound to a different segment.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// The segment reader hit end-of-segment below the snapshot upper bound
    /// sampled at iterator creation. Segments never shrink; this is a
    /// provider contract violation.
    #[error("segment shrank: reader hit end of segment at offset {offset}, snapshot bound was {end}")]
    SegmentShrunk { offset: u64, end: u64 },

    /// The client was misconfigured at build time.
    #[error("configuration error: {0}")]
    Config(String),

    /// The append completion channel was dropped before resolving. The
    /// append may or may not have committed; the client does not undo it.
    #[error("transport error: {0}")]
    Transport(String),

    /// Value codec failure.
    #[error(transparent)]
    Serialization(#[from] revstream_core::Error),

    /// Any unclassified segment provider failure.
    #[error("segment error: {0}")]
    Segment(#[from] revstream_segment::Error),
}
