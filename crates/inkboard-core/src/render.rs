//! Interface to the rendering collaborator.

use crate::elements::{Element, PenStyle};
use crate::error::{RenderError, RenderResult};
use kurbo::Point;

/// Uncommitted visual feedback for the gesture in progress.
#[derive(Debug, Clone, Copy)]
pub enum Preview<'a> {
    /// Pen stroke being drawn.
    Stroke { points: &'a [Point], style: &'a PenStyle },
    /// Path swept by the eraser during the current gesture.
    EraserTrail { points: &'a [Point], radius: f64 },
}

/// Everything a surface needs to redraw: the full element sequence in
/// z-order (front-most last) plus the optional live preview.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub elements: &'a [Element],
    pub preview: Option<Preview<'a>>,
}

/// Straight RGBA8 pixels, row-major, top-left origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// A fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// RGBA at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// A rendering backend driven by the engine.
///
/// There is no incremental contract: every call receives the whole frame.
pub trait Surface {
    /// Redraw after a mutation or preview change.
    fn redraw(&mut self, frame: &Frame<'_>);

    /// Rasterize the committed elements without touching canvas state.
    fn export_image(&self, elements: &[Element]) -> RenderResult<RasterImage>;
}

/// Surface that draws nothing. Used when the engine runs headless.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn redraw(&mut self, _frame: &Frame<'_>) {}

    fn export_image(&self, _elements: &[Element]) -> RenderResult<RasterImage> {
        Err(RenderError::Unsupported)
    }
}
