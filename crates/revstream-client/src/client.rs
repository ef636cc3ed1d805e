//! Revisioned Stream Client
//!
//! This module implements `RevisionedStreamClient`, a durable, strongly
//! ordered log of typed values over one append-only segment. Every value is
//! addressable by a monotonically increasing [`Revision`], optimistic
//! concurrency is available through conditional appends, and a single
//! persistent mark slot gives callers a compare-and-set bookmark.
//!
//! ## Concurrency Model
//!
//! One `tokio::sync::Mutex` guards the (reader, writer, metadata) triple.
//! The append path performs submit, flush and the wait on the completion
//! channel while holding the guard, so a conditional append's offset check
//! can never race another append on the same client. Iterators re-take the
//! guard for each `next()`, which makes interleaving reads and writes from
//! concurrent tasks safe, if slower.
//!
//! ## Revisions Without Round Trips
//!
//! After a successful conditional append the new revision is computed
//! locally from the expected offset and the payload size via
//! [`revision_after`]; the segment is never queried for it. The per-record
//! frame width is the only other input, so the returned revision is exact.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use revstream_core::{Revision, SegmentId, Serializer};
use revstream_segment::{
    revision_after, DelegationToken, Error as SegmentError, PendingEvent, SegmentInput,
    SegmentMetadata, SegmentOutput, MARK_SLOT, NULL_VALUE,
};

use crate::error::{ClientError, Result};
use crate::iterator::StreamIterator;

pub(crate) struct Handles {
    pub(crate) input: Box<dyn SegmentInput>,
    pub(crate) output: Box<dyn SegmentOutput>,
    pub(crate) closed: bool,
}

/// A revisioned, typed view over one append-only segment.
///
/// ## Example
///
/// ```ignore
/// use revstream_client::RevisionedStreamClient;
/// use revstream_core::JsonSerializer;
/// use revstream_segment::{DelegationToken, InMemorySegment};
///
/// let segment = InMemorySegment::new(SegmentId::new("registry", 0));
/// let client = RevisionedStreamClient::builder()
///     .segment(segment.segment_id())
///     .input(Box::new(segment.input()))
///     .output(Box::new(segment.output()))
///     .metadata(Arc::new(segment.metadata()))
///     .serializer(JsonSerializer::<String>::new())
///     .build()?;
///
/// client.write(&"hello".to_string()).await?;
/// let latest = client.latest_revision().await?;
/// let mut iter = client.read_from(&client.oldest_revision().await?).await?;
/// while iter.has_next() {
///     let (revision, value) = iter.next().await?;
///     println!("{revision}: {value}");
/// }
/// ```
pub struct RevisionedStreamClient<S: Serializer> {
    pub(crate) segment: SegmentId,
    pub(crate) serializer: S,
    token: DelegationToken,
    meta: Arc<dyn SegmentMetadata>,
    pub(crate) guard: Mutex<Handles>,
}

impl<S: Serializer> std::fmt::Debug for RevisionedStreamClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionedStreamClient")
            .field("segment", &self.segment)
            .finish()
    }
}

impl<S: Serializer> RevisionedStreamClient<S> {
    pub fn builder() -> RevisionedStreamClientBuilder<S> {
        RevisionedStreamClientBuilder::new()
    }

    /// Append `value` unconditionally.
    ///
    /// Returns once the segment has acknowledged the append. A sealed
    /// segment surfaces as [`ClientError::CorruptedState`].
    pub async fn write(&self, value: &S::Value) -> Result<()> {
        let payload = self.serializer.serialize(value)?;
        let (event, ack) = PendingEvent::unconditional(payload).map_err(map_event_error)?;

        let mut handles = self.guard.lock().await;
        trace!(segment = %self.segment, "unconditional append");
        handles.output.submit(event).await.map_err(map_append_error)?;
        handles.output.flush().await.map_err(map_append_error)?;
        match ack.await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(map_append_error(e)),
            Err(_) => Err(ClientError::Transport(
                "append completion dropped before resolving".into(),
            )),
        }
    }

    /// Append `value` only if the segment's write offset still equals
    /// `expected.byte_offset()` at commit time.
    ///
    /// On commit, returns the exact revision after the new record, computed
    /// locally. Rejection because another append won the race returns
    /// `Ok(None)`; it is not an error.
    pub async fn write_if_at(
        &self,
        expected: &Revision,
        value: &S::Value,
    ) -> Result<Option<Revision>> {
        self.check_own_segment(expected)?;
        let payload = self.serializer.serialize(value)?;
        let size = payload.len();
        let offset = expected.byte_offset();
        let (event, ack) = PendingEvent::conditional(payload, offset).map_err(map_event_error)?;

        let mut handles = self.guard.lock().await;
        handles.output.submit(event).await.map_err(map_append_error)?;
        handles.output.flush().await.map_err(map_append_error)?;
        match ack.await {
            Ok(Ok(true)) => {
                let new_offset = revision_after(offset, size);
                trace!(from = offset, to = new_offset, "conditional append committed");
                Ok(Some(Revision::new(self.segment.clone(), new_offset)))
            }
            Ok(Ok(false)) => {
                trace!(offset, "conditional append rejected");
                Ok(None)
            }
            Ok(Err(e)) => Err(map_append_error(e)),
            Err(_) => Err(ClientError::Transport(
                "append completion dropped before resolving".into(),
            )),
        }
    }

    /// Iterate values from `start` up to the write offset sampled now.
    ///
    /// The iterator is snapshot-bounded: values appended after this call are
    /// not yielded; call `read_from` again to see them.
    pub async fn read_from(&self, start: &Revision) -> Result<StreamIterator<'_, S>> {
        self.check_own_segment(start)?;
        let start_offset = start.byte_offset();
        let handles = self.guard.lock().await;
        let info = self.meta.segment_info(&self.token).await?;
        if start_offset < info.starting_offset {
            return Err(ClientError::TruncatedData {
                offset: start_offset,
                starting_offset: info.starting_offset,
            });
        }
        trace!(from = start_offset, until = info.write_offset, "creating stream iterator");
        drop(handles);
        Ok(StreamIterator::new(self, start_offset, info.write_offset))
    }

    /// Revision at the current write offset: the position the next
    /// successful append will start from.
    pub async fn latest_revision(&self) -> Result<Revision> {
        let _handles = self.guard.lock().await;
        let offset = self.meta.write_offset(&self.token).await?;
        Ok(Revision::new(self.segment.clone(), offset))
    }

    /// Oldest readable revision, i.e. the truncation boundary.
    pub async fn oldest_revision(&self) -> Result<Revision> {
        let info = self.meta.segment_info(&self.token).await?;
        Ok(Revision::new(self.segment.clone(), info.starting_offset))
    }

    /// Current value of the persistent mark, if set.
    pub async fn mark(&self) -> Result<Option<Revision>> {
        let _handles = self.guard.lock().await;
        let value = self.meta.fetch_attribute(MARK_SLOT).await?;
        if value == NULL_VALUE {
            Ok(None)
        } else {
            Ok(Some(Revision::new(self.segment.clone(), value as u64)))
        }
    }

    /// Atomically replace the mark with `new` iff it currently equals
    /// `expected`. Returns whether the swap happened.
    ///
    /// The client does not enforce monotonicity; callers compose CAS to get
    /// the ordering discipline they need.
    pub async fn compare_and_set_mark(
        &self,
        expected: Option<&Revision>,
        new: Option<&Revision>,
    ) -> Result<bool> {
        let expected_value = self.mark_attribute_value(expected)?;
        let new_value = self.mark_attribute_value(new)?;
        let _handles = self.guard.lock().await;
        let swapped = self
            .meta
            .compare_and_set_attribute(MARK_SLOT, expected_value, new_value, &self.token)
            .await?;
        Ok(swapped)
    }

    /// Discard history below `revision`.
    ///
    /// Afterwards, reads starting below `revision` fail with
    /// [`ClientError::TruncatedData`], including iterators created before
    /// the truncation whose cursor now lies in the discarded prefix.
    pub async fn truncate_to(&self, revision: &Revision) -> Result<()> {
        self.check_own_segment(revision)?;
        debug!(segment = %self.segment, offset = revision.byte_offset(), "truncating prefix");
        self.meta
            .truncate(&self.segment, revision.byte_offset(), &self.token)
            .await?;
        Ok(())
    }

    /// Release the underlying handles. Idempotent; close failures are
    /// logged, never propagated.
    pub async fn close(&self) {
        let mut handles = self.guard.lock().await;
        if handles.closed {
            return;
        }
        if let Err(e) = handles.output.close().await {
            match e {
                SegmentError::Sealed => {
                    warn!(segment = %self.segment, "segment writer reported a sealed segment at close")
                }
                e => warn!(segment = %self.segment, error = %e, "error closing segment writer"),
            }
        }
        self.meta.close().await;
        handles.input.close().await;
        handles.closed = true;
    }

    fn check_own_segment(&self, revision: &Revision) -> Result<()> {
        if revision.segment_id() != &self.segment {
            return Err(ClientError::IllegalArgument(format!(
                "revision {} does not belong to segment {}",
                revision, self.segment
            )));
        }
        Ok(())
    }

    fn mark_attribute_value(&self, revision: Option<&Revision>) -> Result<i64> {
        match revision {
            None => Ok(NULL_VALUE),
            Some(r) => {
                self.check_own_segment(r)?;
                i64::try_from(r.byte_offset()).map_err(|_| {
                    ClientError::IllegalArgument(format!(
                        "revision offset {} exceeds the attribute value range",
                        r.byte_offset()
                    ))
                })
            }
        }
    }
}

/// Sealed mid-append is fatal for a single-segment client.
fn map_append_error(e: SegmentError) -> ClientError {
    match e {
        SegmentError::Sealed => ClientError::CorruptedState,
        e => e.into(),
    }
}

/// An oversized payload is the caller's mistake, not a segment fault.
fn map_event_error(e: SegmentError) -> ClientError {
    match e {
        SegmentError::EventTooLarge { size, max } => ClientError::IllegalArgument(format!(
            "serialized value of {size} bytes exceeds the maximum event size of {max} bytes"
        )),
        e => e.into(),
    }
}

/// Builder for [`RevisionedStreamClient`].
pub struct RevisionedStreamClientBuilder<S> {
    segment: Option<SegmentId>,
    input: Option<Box<dyn SegmentInput>>,
    output: Option<Box<dyn SegmentOutput>>,
    metadata: Option<Arc<dyn SegmentMetadata>>,
    serializer: Option<S>,
    token: DelegationToken,
}

impl<S: Serializer> RevisionedStreamClientBuilder<S> {
    fn new() -> Self {
        Self {
            segment: None,
            input: None,
            output: None,
            metadata: None,
            serializer: None,
            token: DelegationToken::default(),
        }
    }

    /// Identity of the segment every handle is bound to.
    pub fn segment(mut self, segment: SegmentId) -> Self {
        self.segment = Some(segment);
        self
    }

    pub fn input(mut self, input: Box<dyn SegmentInput>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn output(mut self, output: Box<dyn SegmentOutput>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn metadata(mut self, metadata: Arc<dyn SegmentMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn serializer(mut self, serializer: S) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Credential forwarded to metadata calls. Defaults to an empty token.
    pub fn delegation_token(mut self, token: DelegationToken) -> Self {
        self.token = token;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if any of segment, input, output,
    /// metadata or serializer is missing.
    pub fn build(self) -> Result<RevisionedStreamClient<S>> {
        let segment = self
            .segment
            .ok_or_else(|| ClientError::Config("segment required".into()))?;
        let input = self
            .input
            .ok_or_else(|| ClientError::Config("input required".into()))?;
        let output = self
            .output
            .ok_or_else(|| ClientError::Config("output required".into()))?;
        let meta = self
            .metadata
            .ok_or_else(|| ClientError::Config("metadata required".into()))?;
        let serializer = self
            .serializer
            .ok_or_else(|| ClientError::Config("serializer required".into()))?;

        Ok(RevisionedStreamClient {
            segment,
            serializer,
            token: self.token,
            meta,
            guard: Mutex::new(Handles {
                input,
                output,
                closed: false,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revstream_core::BytesSerializer;
    use revstream_segment::InMemorySegment;

    fn builder_parts() -> InMemorySegment {
        InMemorySegment::new(SegmentId::new("registry", 0))
    }

    // ---------------------------------------------------------------
    // Builder validation
    // ---------------------------------------------------------------

    #[test]
    fn test_build_requires_segment() {
        let err = RevisionedStreamClient::<BytesSerializer>::builder()
            .serializer(BytesSerializer)
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_build_requires_serializer() {
        let segment = builder_parts();
        let err = RevisionedStreamClient::<BytesSerializer>::builder()
            .segment(segment.segment_id())
            .input(Box::new(segment.input()))
            .output(Box::new(segment.output()))
            .metadata(Arc::new(segment.metadata()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_build_complete() {
        let segment = builder_parts();
        let client = RevisionedStreamClient::builder()
            .segment(segment.segment_id())
            .input(Box::new(segment.input()))
            .output(Box::new(segment.output()))
            .metadata(Arc::new(segment.metadata()))
            .serializer(BytesSerializer)
            .build();
        assert!(client.is_ok());
    }

    // ---------------------------------------------------------------
    // Revision guards
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_foreign_revision_rejected() {
        let segment = builder_parts();
        let client = RevisionedStreamClient::builder()
            .segment(segment.segment_id())
            .input(Box::new(segment.input()))
            .output(Box::new(segment.output()))
            .metadata(Arc::new(segment.metadata()))
            .serializer(BytesSerializer)
            .build()
            .unwrap();

        let foreign = Revision::new(SegmentId::new("other", 1), 0);
        let err = client.read_from(&foreign).await.unwrap_err();
        assert!(matches!(err, ClientError::IllegalArgument(_)));

        let err = client.truncate_to(&foreign).await.unwrap_err();
        assert!(matches!(err, ClientError::IllegalArgument(_)));

        let err = client
            .compare_and_set_mark(Some(&foreign), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::IllegalArgument(_)));
    }
}
