//! Revisioned Stream Client
//!
//! A small, durable state-replication primitive over one append-only
//! segment. It exposes a log of strongly ordered, typed values where every
//! value is addressable by a monotonically increasing revision, supports
//! optimistic concurrency via conditional append, keeps a persistent
//! single-slot mark with compare-and-set semantics, and permits prefix
//! truncation of obsolete history.
//!
//! Higher-level replicated state objects (configuration registries,
//! coordinator state, membership sets) are built by composing these
//! operations: read the log from a known revision, fold it into state, and
//! publish updates with `write_if_at` so that exactly one writer wins each
//! revision.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use revstream_client::RevisionedStreamClient;
//! use revstream_core::{JsonSerializer, SegmentId};
//! use revstream_segment::InMemorySegment;
//!
//! let segment = InMemorySegment::new(SegmentId::new("registry", 0));
//! let client = RevisionedStreamClient::builder()
//!     .segment(segment.segment_id())
//!     .input(Box::new(segment.input()))
//!     .output(Box::new(segment.output()))
//!     .metadata(Arc::new(segment.metadata()))
//!     .serializer(JsonSerializer::<String>::new())
//!     .build()?;
//!
//! let base = client.latest_revision().await?;
//! client.write(&"first".to_string()).await?;
//! if let Some(next) = client.write_if_at(&client.latest_revision().await?, &"second".to_string()).await? {
//!     client.compare_and_set_mark(None, Some(&next)).await?;
//! }
//! ```

pub mod client;
pub mod error;
pub mod iterator;

pub use client::{RevisionedStreamClient, RevisionedStreamClientBuilder};
pub use error::{ClientError, Result};
pub use iterator::StreamIterator;
