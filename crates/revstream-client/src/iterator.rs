//! Snapshot-bounded iteration over a revisioned stream.
//!
//! A [`StreamIterator`] is created by
//! [`read_from`](crate::RevisionedStreamClient::read_from) with its upper
//! bound frozen at the write offset sampled at creation. Appends that
//! commit afterwards are invisible to it; the reader never crosses into
//! unflushed territory. Each `next()` re-takes the client guard, so
//! iteration can interleave with writes from other tasks on the same
//! client.

use tracing::trace;

use revstream_core::{Revision, Serializer};
use revstream_segment::Error as SegmentError;

use crate::client::RevisionedStreamClient;
use crate::error::{ClientError, Result};

/// Single-pass iterator over `(revision, value)` pairs.
///
/// Each yielded revision addresses the boundary *after* its record, so
/// resuming a later `read_from` at a yielded revision continues with the
/// following record.
pub struct StreamIterator<'a, S: Serializer> {
    client: &'a RevisionedStreamClient<S>,
    cursor: u64,
    end_offset: u64,
}

impl<'a, S: Serializer> std::fmt::Debug for StreamIterator<'a, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamIterator")
            .field("cursor", &self.cursor)
            .field("end_offset", &self.end_offset)
            .finish()
    }
}

impl<'a, S: Serializer> StreamIterator<'a, S> {
    pub(crate) fn new(client: &'a RevisionedStreamClient<S>, start: u64, end_offset: u64) -> Self {
        Self {
            client,
            cursor: start,
            end_offset,
        }
    }

    /// Whether another record lies below the snapshot upper bound.
    pub fn has_next(&self) -> bool {
        self.cursor < self.end_offset
    }

    /// Read the next record.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NoSuchElement`] once the snapshot bound is reached.
    /// - [`ClientError::TruncatedData`] if the cursor was truncated away by
    ///   a concurrent `truncate_to`.
    /// - [`ClientError::SegmentShrunk`] if the provider reports end of
    ///   segment below the snapshot bound.
    pub async fn next(&mut self) -> Result<(Revision, S::Value)> {
        let mut handles = self.client.guard.lock().await;
        if !self.has_next() {
            return Err(ClientError::NoSuchElement);
        }
        trace!(offset = self.cursor, "iterator reading entry");
        handles.input.set_offset(self.cursor);
        let data = match handles.input.read().await {
            Ok(data) => data,
            Err(SegmentError::EndOfSegment { offset }) => {
                return Err(ClientError::SegmentShrunk {
                    offset,
                    end: self.end_offset,
                })
            }
            Err(SegmentError::Truncated {
                offset,
                starting_offset,
            }) => {
                return Err(ClientError::TruncatedData {
                    offset,
                    starting_offset,
                })
            }
            Err(e) => return Err(e.into()),
        };
        // The reader's post-read position is authoritative; never derive it
        // from the payload size here.
        self.cursor = handles.input.offset();
        let revision = Revision::new(self.client.segment.clone(), self.cursor);
        drop(handles);

        let value = self.client.serializer.deserialize(data)?;
        Ok((revision, value))
    }
}
