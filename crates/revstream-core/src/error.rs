//! Error types shared by the core crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A user-supplied value codec failed, in either direction.
    #[error("serializer error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
