//! Canvas engine: element ownership, input interpretation and undo/redo.

use crate::config::{DrawMode, EngineConfig, sanitize_radius};
use crate::document::{Document, ImportSummary, RetainedEnvelope};
use crate::elements::{Element, ElementId, PenStyle, Stamp, StampKind, StampStyle, Stroke};
use crate::error::{DocumentError, RenderResult};
use crate::history::{Command, History, RemovedItem};
use crate::input::InputEvent;
use crate::render::{Frame, NullSurface, Preview, RasterImage, Surface};
use kurbo::Point;
use std::collections::HashSet;

/// A drag gesture in progress. The variant is fixed when the gesture starts,
/// so changing the mode mid-gesture does not affect how it completes.
#[derive(Debug, Clone)]
enum Gesture {
    Pen { points: Vec<Point>, style: PenStyle },
    Eraser(EraseGesture),
    /// Started in a mode that ignores drags; swallowed until it ends.
    Ignored,
}

#[derive(Debug, Clone)]
struct EraseGesture {
    radius: f64,
    trail: Vec<Point>,
    /// Elements already erased by this gesture.
    erased: HashSet<ElementId>,
    /// Removed items keyed by their index in the gesture-start sequence.
    removed: Vec<RemovedItem>,
    /// Sorted gesture-start indices of everything removed so far.
    removed_indices: Vec<usize>,
}

impl EraseGesture {
    fn new(radius: f64, start: Point) -> Self {
        Self {
            radius,
            trail: vec![start],
            erased: HashSet::new(),
            removed: Vec::new(),
            removed_indices: Vec::new(),
        }
    }

    /// Map an index in the live sequence back to the gesture-start sequence.
    fn original_index(&self, live_index: usize) -> usize {
        let mut index = live_index;
        for &removed in &self.removed_indices {
            if removed <= index {
                index += 1;
            } else {
                break;
            }
        }
        index
    }

    fn record(&mut self, original: usize, element: Element) {
        let pos = self.removed_indices.partition_point(|&i| i < original);
        self.removed_indices.insert(pos, original);
        self.erased.insert(element.id());
        self.removed.push(RemovedItem {
            index: original,
            element,
        });
    }
}

impl Gesture {
    fn preview(&self) -> Option<Preview<'_>> {
        match self {
            Gesture::Pen { points, style } => Some(Preview::Stroke { points, style }),
            Gesture::Eraser(erase) => Some(Preview::EraserTrail {
                points: &erase.trail,
                radius: erase.radius,
            }),
            Gesture::Ignored => None,
        }
    }
}

/// Owns the element sequence and its history, turns input into commands and
/// keeps the surface up to date.
pub struct CanvasEngine<S: Surface = NullSurface> {
    /// Elements in z-order (front-most last). Ids are unique.
    elements: Vec<Element>,
    history: History,
    config: EngineConfig,
    gesture: Option<Gesture>,
    /// Envelopes from the last import that could not be reconstructed.
    retained: Vec<RetainedEnvelope>,
    surface: S,
}

impl Default for CanvasEngine<NullSurface> {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasEngine<NullSurface> {
    /// Create a headless engine with default configuration.
    pub fn new() -> Self {
        Self::with_surface(NullSurface)
    }
}

impl<S: Surface> CanvasEngine<S> {
    pub fn with_surface(surface: S) -> Self {
        Self::with_config(EngineConfig::default(), surface)
    }

    pub fn with_config(config: EngineConfig, surface: S) -> Self {
        Self {
            elements: Vec::new(),
            history: History::new(),
            config: config.sanitized(),
            gesture: None,
            retained: Vec::new(),
            surface,
        }
    }

    // --- Configuration -------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the whole configuration. Existing elements keep their style.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config.sanitized();
    }

    pub fn mode(&self) -> DrawMode {
        self.config.mode
    }

    pub fn set_mode(&mut self, mode: DrawMode) {
        self.config.mode = mode;
    }

    pub fn set_pen_style(&mut self, style: PenStyle) {
        self.config.pen_style = style.sanitized();
    }

    pub fn set_stamp_style(&mut self, style: StampStyle) {
        self.config.stamp_style = style.sanitized();
    }

    pub fn set_stamp_kind(&mut self, kind: StampKind) {
        self.config.stamp_kind = kind;
    }

    pub fn set_eraser_radius(&mut self, radius: f64) {
        self.config.eraser_radius = sanitize_radius(radius);
    }

    // --- State access --------------------------------------------------

    /// Committed elements in z-order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Envelopes kept verbatim from the last import, with their anchors.
    pub fn retained_envelopes(&self) -> &[RetainedEnvelope] {
        &self.retained
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    // --- Input ---------------------------------------------------------

    /// Dispatch one input event.
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown { position } => self.pointer_down(position),
            InputEvent::PointerMove { position } => self.pointer_move(position),
            InputEvent::PointerUp => self.pointer_up(),
            InputEvent::PointerCancel => self.pointer_cancel(),
            InputEvent::Tap { position } => self.tap(position),
        }
    }

    pub fn pointer_down(&mut self, position: Point) {
        if self.gesture.is_some() {
            log::debug!("Pointer down during an active gesture, finishing the previous one");
            self.finish_gesture();
        }

        match self.config.mode {
            DrawMode::Pen => {
                self.gesture = Some(Gesture::Pen {
                    points: vec![position],
                    style: self.config.pen_style,
                });
                self.redraw();
            }
            DrawMode::Eraser => {
                self.gesture = Some(Gesture::Eraser(EraseGesture::new(
                    self.config.eraser_radius,
                    position,
                )));
                self.erase_at(position);
                self.redraw();
            }
            DrawMode::Stamp | DrawMode::None => {
                self.gesture = Some(Gesture::Ignored);
            }
        }
    }

    pub fn pointer_move(&mut self, position: Point) {
        match self.gesture.as_mut() {
            Some(Gesture::Pen { points, .. }) => {
                points.push(position);
                self.redraw();
            }
            Some(Gesture::Eraser(erase)) => {
                erase.trail.push(position);
                self.erase_at(position);
                self.redraw();
            }
            Some(Gesture::Ignored) | None => {}
        }
    }

    pub fn pointer_up(&mut self) {
        self.finish_gesture();
    }

    /// Cancellation completes the gesture exactly like a normal end.
    pub fn pointer_cancel(&mut self) {
        self.finish_gesture();
    }

    pub fn tap(&mut self, position: Point) {
        if self.config.mode != DrawMode::Stamp {
            return;
        }
        let stamp = Stamp::new(self.config.stamp_kind, position, self.config.stamp_style);
        self.execute(Command::Add(Element::Stamp(stamp)));
    }

    fn finish_gesture(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        match gesture {
            Gesture::Pen { points, style } => {
                if points.len() >= 2 {
                    self.execute(Command::Add(Element::Stroke(Stroke::new(points, style))));
                } else {
                    log::debug!("Discarding pen gesture with {} point(s)", points.len());
                    self.redraw();
                }
            }
            Gesture::Eraser(erase) => {
                if !erase.removed.is_empty() {
                    log::debug!("Erase gesture removed {} element(s)", erase.removed.len());
                    self.history.push(Command::erase(erase.removed));
                }
                self.redraw();
            }
            Gesture::Ignored => {}
        }
    }

    /// Remove everything the eraser touches at `position`.
    fn erase_at(&mut self, position: Point) {
        let Some(Gesture::Eraser(erase)) = self.gesture.as_mut() else {
            return;
        };

        let hits: Vec<usize> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| !erase.erased.contains(&el.id()))
            .filter(|(_, el)| el.hit_by_eraser(position, erase.radius))
            .map(|(i, _)| i)
            .collect();
        if hits.is_empty() {
            return;
        }

        let originals: Vec<usize> = hits.iter().map(|&i| erase.original_index(i)).collect();
        // Descending so earlier indices stay valid.
        for (&live, &original) in hits.iter().zip(&originals).rev() {
            let element = self.elements.remove(live);
            erase.record(original, element);
        }
    }

    // --- Commands ------------------------------------------------------

    /// Apply a command and record it in history.
    pub fn execute(&mut self, command: Command) {
        if let Command::Add(element) = &command {
            if self.element(element.id()).is_some() {
                log::warn!("Refusing to add duplicate element {}", element.id());
                return;
            }
        }
        log::debug!("Applying {} command", command.label());
        apply(&mut self.elements, &command);
        self.history.push(command);
        self.redraw();
    }

    /// Reverse the most recent command. Returns false if there was none.
    pub fn undo(&mut self) -> bool {
        let Some(command) = self.history.undo() else {
            return false;
        };
        log::debug!("Undo {}", command.label());
        reverse(&mut self.elements, command);
        self.redraw();
        true
    }

    /// Re-apply the most recently undone command. Returns false if there was none.
    pub fn redo(&mut self) -> bool {
        let Some(command) = self.history.redo() else {
            return false;
        };
        log::debug!("Redo {}", command.label());
        apply(&mut self.elements, command);
        self.redraw();
        true
    }

    /// Remove all elements, history, retained envelopes and any gesture.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.history.clear();
        self.retained.clear();
        self.gesture = None;
        self.redraw();
    }

    // --- Export / import -----------------------------------------------

    /// Rasterize the committed elements through the surface.
    pub fn export_image(&self) -> RenderResult<RasterImage> {
        self.surface.export_image(&self.elements)
    }

    pub fn export_document(&self) -> Result<Document, DocumentError> {
        let retained: &[RetainedEnvelope] = if self.config.retain_unknown_elements {
            &self.retained
        } else {
            &[]
        };
        let document = Document::from_elements(&self.elements, retained)?;
        log::info!(
            "Exported {} element(s), {} retained envelope(s)",
            self.elements.len(),
            retained.len()
        );
        Ok(document)
    }

    /// Export straight to pretty-printed JSON bytes.
    pub fn export_json(&self) -> Result<Vec<u8>, DocumentError> {
        self.export_document()?
            .to_vec()
            .map_err(|source| DocumentError::Encoding {
                kind: "document",
                source,
            })
    }

    /// Replace the canvas with the document's elements.
    ///
    /// Entries that cannot be reconstructed never fail the import. History
    /// is cleared: the imported state is a fresh baseline.
    pub fn import_document(&mut self, document: &Document) -> ImportSummary {
        let decoded = document.decode();
        let unresolved = decoded.unresolved.len();

        self.elements = decoded.elements;
        self.retained = if self.config.retain_unknown_elements {
            decoded.unresolved
        } else {
            Vec::new()
        };
        self.history.clear();
        self.gesture = None;

        let summary = ImportSummary {
            imported: self.elements.len(),
            retained: self.retained.len(),
            dropped: unresolved - self.retained.len(),
        };
        log::info!(
            "Imported document v{}: {} element(s), {} retained, {} dropped",
            document.version,
            summary.imported,
            summary.retained,
            summary.dropped
        );
        self.redraw();
        summary
    }

    /// Parse and import JSON bytes. A malformed outer document leaves the
    /// canvas untouched.
    pub fn import_json(&mut self, bytes: &[u8]) -> Result<ImportSummary, DocumentError> {
        let document = Document::from_slice(bytes)?;
        Ok(self.import_document(&document))
    }

    fn redraw(&mut self) {
        let frame = Frame {
            elements: &self.elements,
            preview: self.gesture.as_ref().and_then(Gesture::preview),
        };
        self.surface.redraw(&frame);
    }
}

/// Forward-apply a command to the element sequence.
fn apply(elements: &mut Vec<Element>, command: &Command) {
    match command {
        Command::Add(element) => elements.push(element.clone()),
        Command::Erase { removed } => {
            for item in removed.iter().rev() {
                let id = item.element.id();
                if elements.get(item.index).is_some_and(|e| e.id() == id) {
                    elements.remove(item.index);
                } else if let Some(i) = elements.iter().position(|e| e.id() == id) {
                    elements.remove(i);
                }
            }
        }
    }
}

/// Undo a command's effect on the element sequence.
fn reverse(elements: &mut Vec<Element>, command: &Command) {
    match command {
        Command::Add(element) => {
            let id = element.id();
            if let Some(i) = elements.iter().rposition(|e| e.id() == id) {
                elements.remove(i);
            }
        }
        Command::Erase { removed } => {
            for item in removed {
                let index = item.index.min(elements.len());
                elements.insert(index, item.element.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Rgba;

    fn ids<S: Surface>(engine: &CanvasEngine<S>) -> Vec<ElementId> {
        engine.elements().iter().map(Element::id).collect()
    }

    fn draw_line(engine: &mut CanvasEngine, from: (f64, f64), to: (f64, f64)) {
        engine.handle_input(InputEvent::down(from.0, from.1));
        engine.handle_input(InputEvent::moved((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
        engine.handle_input(InputEvent::moved(to.0, to.1));
        engine.handle_input(InputEvent::PointerUp);
    }

    #[test]
    fn test_pen_commits_stroke() {
        let mut engine = CanvasEngine::new();
        draw_line(&mut engine, (0.0, 0.0), (100.0, 0.0));
        assert_eq!(engine.len(), 1);
        let stroke = engine.elements()[0].as_stroke().unwrap();
        assert_eq!(stroke.points.len(), 3);
        assert_eq!(stroke.style, PenStyle::default());
        assert!(engine.can_undo());
    }

    #[test]
    fn test_pen_tap_produces_nothing() {
        let mut engine = CanvasEngine::new();
        engine.handle_input(InputEvent::down(5.0, 5.0));
        engine.handle_input(InputEvent::PointerUp);
        engine.handle_input(InputEvent::tap(5.0, 5.0));
        assert!(engine.is_empty());
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_pen_cancel_commits_like_end() {
        let mut engine = CanvasEngine::new();
        engine.pointer_down(Point::new(0.0, 0.0));
        engine.pointer_move(Point::new(5.0, 5.0));
        engine.pointer_cancel();
        assert_eq!(engine.len(), 1);
        assert!(!engine.is_gesture_active());
    }

    #[test]
    fn test_stamp_tap() {
        let mut engine = CanvasEngine::new();
        engine.set_mode(DrawMode::Stamp);
        engine.set_stamp_kind(StampKind::Circle);
        engine.handle_input(InputEvent::tap(10.0, 20.0));
        engine.handle_input(InputEvent::tap(30.0, 40.0));
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.history().undo_len(), 2);
        let stamp = engine.elements()[0].as_stamp().unwrap();
        assert_eq!(stamp.kind, StampKind::Circle);
        assert_eq!(stamp.center, Point::new(10.0, 20.0));
    }

    #[test]
    fn test_stamp_mode_ignores_drags() {
        let mut engine = CanvasEngine::new();
        engine.set_mode(DrawMode::Stamp);
        draw_line(&mut engine, (0.0, 0.0), (50.0, 50.0));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_none_mode_ignores_everything() {
        let mut engine = CanvasEngine::new();
        engine.set_mode(DrawMode::None);
        draw_line(&mut engine, (0.0, 0.0), (50.0, 50.0));
        engine.tap(Point::new(1.0, 1.0));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_mode_switch_mid_gesture_is_ignored() {
        let mut engine = CanvasEngine::new();
        engine.pointer_down(Point::new(0.0, 0.0));
        engine.set_mode(DrawMode::Eraser);
        engine.pointer_move(Point::new(10.0, 0.0));
        engine.pointer_up();
        assert_eq!(engine.len(), 1);
        assert!(engine.elements()[0].as_stroke().is_some());
    }

    #[test]
    fn test_style_change_affects_next_element_only() {
        let mut engine = CanvasEngine::new();
        draw_line(&mut engine, (0.0, 0.0), (10.0, 0.0));
        engine.set_pen_style(PenStyle::new(Rgba::BLACK, 9.0, 0.5));
        draw_line(&mut engine, (0.0, 10.0), (10.0, 10.0));
        assert_eq!(engine.elements()[0].as_stroke().unwrap().style, PenStyle::default());
        assert_eq!(engine.elements()[1].as_stroke().unwrap().style.line_width, 9.0);
    }

    #[test]
    fn test_eraser_gesture_is_one_undo_step() {
        let mut engine = CanvasEngine::new();
        draw_line(&mut engine, (0.0, 0.0), (100.0, 0.0));
        draw_line(&mut engine, (0.0, 100.0), (100.0, 100.0));
        draw_line(&mut engine, (0.0, 200.0), (100.0, 200.0));
        let before = ids(&engine);

        engine.set_mode(DrawMode::Eraser);
        engine.set_eraser_radius(5.0);
        engine.pointer_down(Point::new(50.0, 0.0));
        engine.pointer_move(Point::new(50.0, 100.0));
        engine.pointer_move(Point::new(50.0, 200.0));
        assert!(engine.is_empty());
        engine.pointer_up();

        assert_eq!(engine.history().undo_len(), 4);
        assert!(engine.undo());
        assert_eq!(ids(&engine), before);
    }

    #[test]
    fn test_erase_undo_restores_order_after_earlier_removal() {
        let mut engine = CanvasEngine::new();
        for y in [0.0, 100.0, 200.0, 300.0] {
            draw_line(&mut engine, (0.0, y), (100.0, y));
        }
        let before = ids(&engine);

        engine.set_mode(DrawMode::Eraser);
        engine.set_eraser_radius(2.0);
        // First element, then the third.
        engine.pointer_down(Point::new(50.0, 0.0));
        engine.pointer_move(Point::new(50.0, 200.0));
        engine.pointer_up();
        assert_eq!(ids(&engine), vec![before[1], before[3]]);

        assert!(engine.undo());
        assert_eq!(ids(&engine), before);
        assert!(engine.redo());
        assert_eq!(ids(&engine), vec![before[1], before[3]]);
    }

    #[test]
    fn test_original_index_mapping() {
        let mut erase = EraseGesture::new(1.0, Point::ZERO);
        let el = || Element::Stroke(Stroke::new(vec![], PenStyle::default()));
        erase.record(0, el());
        erase.record(2, el());
        // Live [B, D, E] came from [A, B, C, D, E].
        assert_eq!(erase.original_index(0), 1);
        assert_eq!(erase.original_index(1), 3);
        assert_eq!(erase.original_index(2), 4);
    }

    #[test]
    fn test_element_erased_once_per_gesture() {
        let mut engine = CanvasEngine::new();
        draw_line(&mut engine, (0.0, 0.0), (100.0, 0.0));
        engine.set_mode(DrawMode::Eraser);
        engine.pointer_down(Point::new(10.0, 0.0));
        engine.pointer_move(Point::new(20.0, 0.0));
        engine.pointer_move(Point::new(30.0, 0.0));
        engine.pointer_cancel();
        assert!(engine.is_empty());
        assert_eq!(engine.history().undo_len(), 2);
        assert!(engine.undo());
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.history().undo_len(), 1);
    }

    #[test]
    fn test_eraser_miss_pushes_nothing() {
        let mut engine = CanvasEngine::new();
        draw_line(&mut engine, (0.0, 0.0), (100.0, 0.0));
        engine.set_mode(DrawMode::Eraser);
        engine.pointer_down(Point::new(500.0, 500.0));
        engine.pointer_up();
        assert_eq!(engine.history().undo_len(), 1);
    }

    #[test]
    fn test_push_after_undo_drops_redo() {
        let mut engine = CanvasEngine::new();
        draw_line(&mut engine, (0.0, 0.0), (10.0, 0.0));
        draw_line(&mut engine, (0.0, 10.0), (10.0, 10.0));
        assert!(engine.undo());
        draw_line(&mut engine, (0.0, 20.0), (10.0, 20.0));
        assert!(!engine.redo());
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_apply_erase_falls_back_to_id() {
        let a = Element::Stroke(Stroke::new(vec![Point::ZERO, Point::ZERO], PenStyle::default()));
        let b = Element::Stroke(Stroke::new(vec![Point::ZERO, Point::ZERO], PenStyle::default()));
        let mut elements = vec![b.clone(), a.clone()];
        let cmd = Command::erase(vec![RemovedItem { index: 0, element: a }]);
        apply(&mut elements, &cmd);
        assert_eq!(elements, vec![b]);
    }

    #[test]
    fn test_reverse_erase_clamps_index() {
        let a = Element::Stroke(Stroke::new(vec![Point::ZERO, Point::ZERO], PenStyle::default()));
        let mut elements = Vec::new();
        let cmd = Command::erase(vec![RemovedItem { index: 7, element: a.clone() }]);
        reverse(&mut elements, &cmd);
        assert_eq!(elements, vec![a]);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut engine = CanvasEngine::new();
        draw_line(&mut engine, (0.0, 0.0), (10.0, 0.0));
        engine.pointer_down(Point::new(0.0, 0.0));
        engine.clear();
        assert!(engine.is_empty());
        assert!(!engine.can_undo());
        assert!(!engine.can_redo());
        assert!(!engine.is_gesture_active());
        engine.pointer_up();
        assert!(engine.is_empty());
    }

    #[test]
    fn test_duplicate_add_refused() {
        let mut engine = CanvasEngine::new();
        let stamp = Element::Stamp(Stamp::new(StampKind::Check, Point::ZERO, StampStyle::default()));
        engine.execute(Command::Add(stamp.clone()));
        engine.execute(Command::Add(stamp));
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.history().undo_len(), 1);
    }

    #[test]
    fn test_setters_sanitize() {
        let mut engine = CanvasEngine::new();
        engine.set_eraser_radius(f64::NAN);
        assert_eq!(engine.config().eraser_radius, crate::config::DEFAULT_ERASER_RADIUS);
        engine.set_stamp_style(StampStyle::new(Rgba::RED, 0.0, 2.0));
        assert_eq!(engine.config().stamp_style.opacity, 1.0);
    }
}
