//! CPU rasterizer for strokes, stamp glyphs and gesture previews.

use crate::config::RenderConfig;
use inkboard_core::geometry::distance_point_to_segment;
use inkboard_core::{Element, Frame, Preview, RasterImage, RenderError, RenderResult, Rgba, Surface};
use kurbo::{Affine, BezPath, PathEl, Point, Rect};

/// Flattening tolerance for curved glyph outlines, in device pixels.
const FLATTEN_TOLERANCE: f64 = 0.1;

/// Eraser trail color: black at 25%.
const ERASER_TRAIL: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.25 };

/// A surface that keeps the last redrawn frame in an RGBA buffer.
pub struct RasterSurface {
    config: RenderConfig,
    image: RasterImage,
    redraws: u64,
}

impl RasterSurface {
    pub fn new(config: RenderConfig) -> Self {
        let mut image = RasterImage::new(config.width, config.height);
        fill(&mut image, config.background);
        Self {
            config,
            image,
            redraws: 0,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Pixels from the most recent redraw, including any preview.
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    /// Number of redraws received.
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    fn render_elements(&self, image: &mut RasterImage, elements: &[Element]) {
        let mut painter = Painter::new(image, self.config.scale);
        for element in elements {
            painter.stroke_path(&element.to_path(), element.paint_width(), element.paint_color());
        }
    }
}

impl Surface for RasterSurface {
    fn redraw(&mut self, frame: &Frame<'_>) {
        self.redraws += 1;
        if self.config.is_empty() {
            return;
        }

        let mut image = std::mem::replace(&mut self.image, RasterImage::new(0, 0));
        fill(&mut image, self.config.background);
        self.render_elements(&mut image, frame.elements);

        let mut painter = Painter::new(&mut image, self.config.scale);
        match frame.preview {
            Some(Preview::Stroke { points, style }) => {
                painter.stroke_polyline(points, style.line_width, style.color.with_opacity(style.opacity));
            }
            Some(Preview::EraserTrail { points, radius }) => {
                painter.stroke_polyline(points, radius * 2.0, ERASER_TRAIL);
            }
            None => {}
        }

        self.image = image;
        log::trace!("Redrew {} element(s)", frame.elements.len());
    }

    fn export_image(&self, elements: &[Element]) -> RenderResult<RasterImage> {
        if self.config.is_empty() {
            return Err(RenderError::EmptyViewport {
                width: self.config.width,
                height: self.config.height,
            });
        }
        let mut image = RasterImage::new(self.config.width, self.config.height);
        fill(&mut image, self.config.background);
        self.render_elements(&mut image, elements);
        log::debug!(
            "Exported {}x{} image with {} element(s)",
            image.width,
            image.height,
            elements.len()
        );
        Ok(image)
    }
}

/// Paint every pixel with `color`. The first row is built once and copied.
fn fill(image: &mut RasterImage, color: Rgba) {
    let rgba = color.to_rgba8();
    let row_len = image.width as usize * 4;
    if row_len == 0 {
        return;
    }
    let mut rows = image.pixels.chunks_exact_mut(row_len);
    let Some(first) = rows.next() else {
        return;
    };
    for pixel in first.chunks_exact_mut(4) {
        pixel.copy_from_slice(&rgba);
    }
    let first: &[u8] = first;
    for row in rows {
        row.copy_from_slice(first);
    }
}

/// Integer pixel rectangle, half-open on the right and bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelRect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelRect {
    fn width(&self) -> usize {
        (self.x1 - self.x0) as usize
    }

    fn height(&self) -> usize {
        (self.y1 - self.y0) as usize
    }
}

/// Strokes centerlines into an image with round caps and joins.
///
/// Each segment only visits the pixels around itself and writes the
/// coverage of its element into a scratch buffer (max-combined), which is
/// then blended once, so overlapping segments of one path never double-blend.
struct Painter<'a> {
    image: &'a mut RasterImage,
    scale: f64,
    coverage: Vec<f32>,
}

impl<'a> Painter<'a> {
    fn new(image: &'a mut RasterImage, scale: f64) -> Self {
        Self {
            image,
            scale,
            coverage: Vec::new(),
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Rgba) {
        let scale = self.scale;
        let segments = polyline_segments(points.iter().map(|p| Point::new(p.x * scale, p.y * scale)));
        self.stroke_segments(&segments, width * scale, color);
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba) {
        let device = Affine::scale(self.scale) * path.clone();
        let segments = flatten_segments(&device);
        self.stroke_segments(&segments, width * self.scale, color);
    }

    /// Pixels touched by `rect`, clipped to the image.
    fn clip(&self, rect: Rect) -> Option<PixelRect> {
        let w = self.image.width as f64;
        let h = self.image.height as f64;
        let area = PixelRect {
            x0: rect.x0.floor().clamp(0.0, w) as u32,
            y0: rect.y0.floor().clamp(0.0, h) as u32,
            x1: rect.x1.ceil().clamp(0.0, w) as u32,
            y1: rect.y1.ceil().clamp(0.0, h) as u32,
        };
        (area.x0 < area.x1 && area.y0 < area.y1).then_some(area)
    }

    fn stroke_segments(&mut self, segments: &[(Point, Point)], width: f64, color: Rgba) {
        let Some(&(first, _)) = segments.first() else {
            return;
        };
        if color.a <= 0.0 || !width.is_finite() {
            return;
        }
        let reach = width * 0.5 + 1.0;
        let bounds = segments
            .iter()
            .fold(Rect::from_points(first, first), |r, (a, b)| r.union_pt(*a).union_pt(*b));
        let Some(area) = self.clip(bounds.inflate(reach, reach)) else {
            return;
        };

        let mut coverage = std::mem::take(&mut self.coverage);
        coverage.clear();
        coverage.resize(area.width() * area.height(), 0.0);

        for &(a, b) in segments {
            if let Some(seg_area) = self.clip(Rect::from_points(a, b).inflate(reach, reach)) {
                accumulate_segment(&mut coverage, area, seg_area, a, b, width * 0.5);
            }
        }

        for (i, &c) in coverage.iter().enumerate() {
            if c > 0.001 {
                let x = area.x0 + (i % area.width()) as u32;
                let y = area.y0 + (i / area.width()) as u32;
                self.blend(x, y, color, c as f64);
            }
        }
        self.coverage = coverage;
    }

    /// Source-over on straight (non-premultiplied) alpha.
    fn blend(&mut self, x: u32, y: u32, color: Rgba, coverage: f64) {
        let i = (y as usize * self.image.width as usize + x as usize) * 4;
        let Some(dst) = self.image.pixels.get_mut(i..i + 4) else {
            return;
        };
        let sa = color.a * coverage;
        let da = dst[3] as f64 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        let mix = |s: f64, d: u8| {
            let d = d as f64 / 255.0;
            let c = (s * sa + d * da * (1.0 - sa)) / out_a;
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        };
        dst[0] = mix(color.r, dst[0]);
        dst[1] = mix(color.g, dst[1]);
        dst[2] = mix(color.b, dst[2]);
        dst[3] = (out_a.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
}

/// Max-combine one segment's anti-aliased coverage into `coverage`, which
/// spans `area`. Only pixels inside `seg_area` are visited.
fn accumulate_segment(
    coverage: &mut [f32],
    area: PixelRect,
    seg_area: PixelRect,
    a: Point,
    b: Point,
    half: f64,
) {
    let stride = area.width();
    for y in seg_area.y0..seg_area.y1 {
        let row = (y - area.y0) as usize * stride;
        for x in seg_area.x0..seg_area.x1 {
            let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let d = distance_point_to_segment(center, a, b);
            let c = (half + 0.5 - d).clamp(0.0, 1.0) as f32;
            if let Some(slot) = coverage.get_mut(row + (x - area.x0) as usize) {
                *slot = slot.max(c);
            }
        }
    }
}

/// Consecutive pairs of a polyline. A single point becomes a dot.
fn polyline_segments(points: impl Iterator<Item = Point>) -> Vec<(Point, Point)> {
    let points: Vec<Point> = points.collect();
    match points.as_slice() {
        [] => Vec::new(),
        [p] => vec![(*p, *p)],
        _ => points.windows(2).map(|w| (w[0], w[1])).collect(),
    }
}

/// Flatten a path into line segments, closing subpaths where asked.
fn flatten_segments(path: &BezPath) -> Vec<(Point, Point)> {
    let mut segments = Vec::new();
    let mut start = Point::ZERO;
    let mut last = Point::ZERO;
    kurbo::flatten(path.elements().iter().copied(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            start = p;
            last = p;
        }
        PathEl::LineTo(p) => {
            segments.push((last, p));
            last = p;
        }
        PathEl::ClosePath => {
            if last != start {
                segments.push((last, start));
            }
            last = start;
        }
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });
    segments
}
