//! Pending events: the unit of work handed to a segment writer.
//!
//! An append travels to the writer as a [`PendingEvent`] carrying the
//! serialized payload, a single-shot completion channel, and, for
//! conditional appends, the write offset the segment must still be at for
//! the append to commit. The submitter keeps the [`AckReceiver`] and blocks
//! on it after flushing.

use std::fmt;

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::frame::MAX_EVENT_SIZE;

/// Outcome delivered on an event's completion channel.
///
/// `Ok(true)` means the append committed; `Ok(false)` means a conditional
/// append was rejected because the write offset had moved. Rejection is not
/// an error.
pub type AckResult = Result<bool>;

pub type AckSender = oneshot::Sender<AckResult>;
pub type AckReceiver = oneshot::Receiver<AckResult>;

/// A serialized payload waiting to be committed by the segment writer.
pub struct PendingEvent {
    payload: Bytes,
    ack: AckSender,
    expected_offset: Option<u64>,
}

impl PendingEvent {
    /// Create an event that commits regardless of the current write offset.
    pub fn unconditional(payload: Bytes) -> Result<(Self, AckReceiver)> {
        Self::with_expected(payload, None)
    }

    /// Create an event that commits only if the segment's write offset still
    /// equals `expected_offset` at commit time.
    pub fn conditional(payload: Bytes, expected_offset: u64) -> Result<(Self, AckReceiver)> {
        Self::with_expected(payload, Some(expected_offset))
    }

    fn with_expected(payload: Bytes, expected_offset: Option<u64>) -> Result<(Self, AckReceiver)> {
        if payload.len() > MAX_EVENT_SIZE {
            return Err(Error::EventTooLarge {
                size: payload.len(),
                max: MAX_EVENT_SIZE,
            });
        }
        let (ack, receiver) = oneshot::channel();
        Ok((
            Self {
                payload,
                ack,
                expected_offset,
            },
            receiver,
        ))
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn expected_offset(&self) -> Option<u64> {
        self.expected_offset
    }

    /// Resolve the completion channel. The submitter may have gone away;
    /// a dropped receiver is not the writer's problem.
    pub fn complete(self, outcome: AckResult) {
        let _ = self.ack.send(outcome);
    }
}

impl fmt::Debug for PendingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEvent")
            .field("payload_len", &self.payload.len())
            .field("expected_offset", &self.expected_offset)
            .finish()
    }
}
