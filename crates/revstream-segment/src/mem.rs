//! In-Memory Segment
//!
//! A complete single-process implementation of the segment contracts over
//! one shared byte log. This is the substrate the client tests run against,
//! and it is usable on its own for embedded deployments that do not need
//! durability.
//!
//! ## Semantics
//!
//! - The log keeps every byte ever appended; truncation only advances the
//!   `starting_offset` visibility boundary, so offsets stay absolute.
//! - Conditional commits compare the live write offset against the event's
//!   expected offset at commit time, under the same lock that performs the
//!   append. Mismatch resolves the event with `Ok(false)` and appends
//!   nothing.
//! - `seal()` makes every subsequent submit, flush and writer close report
//!   [`Error::Sealed`].
//! - Attribute slots live in a map on the same state; compare-and-set of an
//!   unset slot compares against [`NULL_VALUE`].
//!
//! ## Handles
//!
//! [`InMemorySegment::output`], [`input`](InMemorySegment::input) and
//! [`metadata`](InMemorySegment::metadata) hand out independent handles over
//! the shared state. Handles may be closed independently; closing one does
//! not affect the others.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use revstream_core::SegmentId;
use tokio::sync::Mutex;
use tracing::trace;

use crate::error::{Error, Result};
use crate::event::PendingEvent;
use crate::frame;
use crate::traits::{
    AttributeSlot, DelegationToken, SegmentInfo, SegmentInput, SegmentMetadata, SegmentOutput,
    NULL_VALUE,
};

struct State {
    /// Full log from absolute offset 0. Bytes below `starting_offset` are
    /// retained but unreadable.
    data: BytesMut,
    starting_offset: u64,
    sealed: bool,
    attributes: HashMap<AttributeSlot, i64>,
}

impl State {
    fn write_offset(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A single append-only segment held in memory.
#[derive(Clone)]
pub struct InMemorySegment {
    segment: SegmentId,
    state: Arc<Mutex<State>>,
}

impl InMemorySegment {
    pub fn new(segment: SegmentId) -> Self {
        Self {
            segment,
            state: Arc::new(Mutex::new(State {
                data: BytesMut::new(),
                starting_offset: 0,
                sealed: false,
                attributes: HashMap::new(),
            })),
        }
    }

    pub fn segment_id(&self) -> SegmentId {
        self.segment.clone()
    }

    /// Seal the segment: all future appends are refused.
    pub async fn seal(&self) {
        self.state.lock().await.sealed = true;
    }

    /// Writer handle over this segment.
    pub fn output(&self) -> MemSegmentOutput {
        MemSegmentOutput {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
            closed: false,
        }
    }

    /// Reader handle over this segment, positioned at offset 0.
    pub fn input(&self) -> MemSegmentInput {
        MemSegmentInput {
            state: Arc::clone(&self.state),
            offset: 0,
            closed: false,
        }
    }

    /// Metadata handle over this segment.
    pub fn metadata(&self) -> MemSegmentMetadata {
        MemSegmentMetadata {
            segment: self.segment.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

/// Writer handle: buffers submitted events, commits them on flush.
pub struct MemSegmentOutput {
    state: Arc<Mutex<State>>,
    pending: Vec<PendingEvent>,
    closed: bool,
}

#[async_trait::async_trait]
impl SegmentOutput for MemSegmentOutput {
    async fn submit(&mut self, event: PendingEvent) -> Result<()> {
        if self.closed {
            return Err(Error::HandleClosed);
        }
        self.pending.push(event);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::HandleClosed);
        }
        let mut state = self.state.lock().await;
        let mut sealed_hit = false;
        for event in self.pending.drain(..) {
            if state.sealed {
                event.complete(Err(Error::Sealed));
                sealed_hit = true;
                continue;
            }
            match event.expected_offset() {
                Some(expected) if expected != state.write_offset() => {
                    trace!(
                        expected,
                        write_offset = state.write_offset(),
                        "conditional append rejected"
                    );
                    event.complete(Ok(false));
                }
                _ => {
                    let framed = frame::encode(event.payload());
                    state.data.extend_from_slice(&framed);
                    trace!(write_offset = state.write_offset(), "append committed");
                    event.complete(Ok(true));
                }
            }
        }
        if sealed_hit {
            Err(Error::Sealed)
        } else {
            Ok(())
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.flush().await;
        self.closed = true;
        match result {
            Ok(()) => {
                if self.state.lock().await.sealed {
                    Err(Error::Sealed)
                } else {
                    Ok(())
                }
            }
            Err(e) => Err(e),
        }
    }
}

/// Reader handle: positioned framed reads over the shared log.
pub struct MemSegmentInput {
    state: Arc<Mutex<State>>,
    offset: u64,
    closed: bool,
}

#[async_trait::async_trait]
impl SegmentInput for MemSegmentInput {
    fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    async fn read(&mut self) -> Result<Bytes> {
        if self.closed {
            return Err(Error::HandleClosed);
        }
        let state = self.state.lock().await;
        if self.offset < state.starting_offset {
            return Err(Error::Truncated {
                offset: self.offset,
                starting_offset: state.starting_offset,
            });
        }
        if self.offset >= state.write_offset() {
            return Err(Error::EndOfSegment {
                offset: self.offset,
            });
        }
        let decoded = frame::decode_at(&state.data, self.offset)?;
        self.offset = decoded.next_offset;
        Ok(decoded.payload)
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

/// Metadata handle: range queries, attributes and truncation.
pub struct MemSegmentMetadata {
    segment: SegmentId,
    state: Arc<Mutex<State>>,
}

#[async_trait::async_trait]
impl SegmentMetadata for MemSegmentMetadata {
    async fn segment_info(&self, _token: &DelegationToken) -> Result<SegmentInfo> {
        let state = self.state.lock().await;
        Ok(SegmentInfo {
            segment: self.segment.clone(),
            starting_offset: state.starting_offset,
            write_offset: state.write_offset(),
            sealed: state.sealed,
        })
    }

    async fn write_offset(&self, _token: &DelegationToken) -> Result<u64> {
        Ok(self.state.lock().await.write_offset())
    }

    async fn fetch_attribute(&self, slot: AttributeSlot) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state.attributes.get(&slot).copied().unwrap_or(NULL_VALUE))
    }

    async fn compare_and_set_attribute(
        &self,
        slot: AttributeSlot,
        expected: i64,
        new: i64,
        _token: &DelegationToken,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;
        let current = state.attributes.get(&slot).copied().unwrap_or(NULL_VALUE);
        if current != expected {
            return Ok(false);
        }
        if new == NULL_VALUE {
            state.attributes.remove(&slot);
        } else {
            state.attributes.insert(slot, new);
        }
        Ok(true)
    }

    async fn truncate(
        &self,
        segment: &SegmentId,
        offset: u64,
        _token: &DelegationToken,
    ) -> Result<()> {
        if *segment != self.segment {
            return Err(Error::SegmentMismatch {
                expected: self.segment.clone(),
                requested: segment.clone(),
            });
        }
        let mut state = self.state.lock().await;
        if offset > state.write_offset() {
            return Err(Error::OffsetOutOfRange {
                offset,
                write_offset: state.write_offset(),
            });
        }
        // Truncation never moves backwards.
        state.starting_offset = state.starting_offset.max(offset);
        trace!(starting_offset = state.starting_offset, "prefix truncated");
        Ok(())
    }

    async fn close(&self) {}
}
