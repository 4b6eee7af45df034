//! Inkboard Core Library
//!
//! Element model, real-time eraser, undo/redo history and forward-compatible
//! persistence for the Inkboard freehand annotation engine.

pub mod config;
pub mod document;
pub mod elements;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod render;
pub mod storage;

pub use config::{DrawMode, EngineConfig};
pub use document::{DOCUMENT_VERSION, Document, Envelope, ImportSummary, RetainedEnvelope};
pub use elements::{Element, ElementId, PenStyle, Rgba, Stamp, StampKind, StampStyle, Stroke};
pub use engine::CanvasEngine;
pub use error::{DocumentError, RenderError, RenderResult};
pub use history::{Command, History, RemovedItem};
pub use input::InputEvent;
pub use render::{Frame, NullSurface, Preview, RasterImage, Surface};
