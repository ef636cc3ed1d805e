//! Segment provider contracts and the in-memory segment.
//!
//! The stream client consumes three handles onto one append-only segment:
//! a writer ([`SegmentOutput`]), a reader ([`SegmentInput`]) and a metadata
//! client ([`SegmentMetadata`]). This crate defines those contracts, the
//! record framing shared between them, and [`InMemorySegment`], a complete
//! single-process implementation used for tests and embedded deployments.

pub mod error;
pub mod event;
pub mod frame;
pub mod mem;
pub mod traits;

pub use error::{Error, Result};
pub use event::{AckReceiver, AckResult, PendingEvent};
pub use frame::{revision_after, FRAME_OVERHEAD, MAX_EVENT_SIZE};
pub use mem::InMemorySegment;
pub use traits::{
    AttributeSlot, DelegationToken, SegmentInfo, SegmentInput, SegmentMetadata, SegmentOutput,
    MARK_SLOT, NULL_VALUE,
};
