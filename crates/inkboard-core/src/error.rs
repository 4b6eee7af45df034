//! Error types shared across the engine.

use thiserror::Error;

/// Document-level persistence errors.
///
/// Per-element problems on import are not errors: those entries are dropped
/// (or retained verbatim) and only show up in the import summary.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The outer document could not be parsed.
    #[error("Unsupported drawing data format: {0}")]
    Format(#[source] serde_json::Error),
    /// An element's transfer representation could not be serialized.
    #[error("Failed to encode {kind} element: {source}")]
    Encoding {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Rendering errors reported by a [`Surface`](crate::render::Surface).
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Surface cannot produce images")]
    Unsupported,
    #[error("Viewport has zero area ({width}x{height})")]
    EmptyViewport { width: u32, height: u32 },
    #[error("Image encoding failed: {0}")]
    Encode(String),
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
