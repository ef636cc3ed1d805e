pub mod error;
pub mod revision;
pub mod serializer;

pub use error::{Error, Result};
pub use revision::{Revision, SegmentId};
pub use serializer::{BytesSerializer, JsonSerializer, Serializer};
