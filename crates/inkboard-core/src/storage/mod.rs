//! Named document stores.
//!
//! The engine itself never does I/O. Hosts pair
//! [`CanvasEngine::export_document`](crate::CanvasEngine::export_document)
//! and [`CanvasEngine::import_document`](crate::CanvasEngine::import_document)
//! with one of these backends. Every backend persists the same bytes as
//! [`Document::to_vec`], so a stored drawing is always a valid document file.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::document::Document;
use crate::error::DocumentError;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No stored drawing named {0:?}")]
    NotFound(String),
    #[error("Invalid drawing name {0:?}")]
    InvalidName(String),
    /// Stored bytes are not a readable document.
    #[error("Stored drawing {id:?} is unreadable: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: DocumentError,
    },
    #[error("Failed to encode drawing: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future so backends can be driven by any executor.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A store of documents keyed by name.
pub trait Storage: Send + Sync {
    /// Store a document under `id`, replacing any previous one.
    fn save(&self, id: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>>;

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>>;

    /// Delete a document. Deleting a missing document is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Stored names, sorted.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Check that a drawing name maps onto a single plain file name.
///
/// Names are limited to ASCII letters, digits, `-`, `_` and `.`, and may not
/// start with a dot.
pub fn validate_name(id: &str) -> StorageResult<&str> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(id)
    } else {
        Err(StorageError::InvalidName(id.to_string()))
    }
}

/// Serialize a document the way every backend stores it.
pub(crate) fn encode(document: &Document) -> StorageResult<Vec<u8>> {
    document.to_vec().map_err(StorageError::Encode)
}

/// Parse stored bytes back into a document.
pub(crate) fn decode(id: &str, bytes: &[u8]) -> StorageResult<Document> {
    Document::from_slice(bytes).map_err(|source| StorageError::Corrupt {
        id: id.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("sketch-01_v2.final").is_ok());
        for bad in ["", ".hidden", "a/b", "..", "with space", "ünïcode"] {
            assert!(
                matches!(validate_name(bad), Err(StorageError::InvalidName(_))),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn test_corrupt_bytes() {
        assert!(matches!(
            decode("x", b"{\"version\": 2}"),
            Err(StorageError::Corrupt { .. })
        ));
    }
}
