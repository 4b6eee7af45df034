use inkboard_core::{
    CanvasEngine, Command, DrawMode, Element, ElementId, InputEvent, PenStyle, Rgba, Stamp,
    StampKind, StampStyle, Stroke,
};
use kurbo::Point;

fn ids(engine: &CanvasEngine) -> Vec<ElementId> {
    engine.elements().iter().map(Element::id).collect()
}

fn horizontal(y: f64) -> Element {
    Element::Stroke(Stroke::new(
        vec![Point::new(0.0, y), Point::new(100.0, y)],
        PenStyle::new(Rgba::BLACK, 10.0, 1.0),
    ))
}

fn stamp_at(x: f64, y: f64, size: f64) -> Element {
    Element::Stamp(Stamp::new(
        StampKind::Check,
        Point::new(x, y),
        StampStyle::new(Rgba::RED, size, 1.0),
    ))
}

fn erase_path(engine: &mut CanvasEngine, radius: f64, path: &[(f64, f64)]) {
    engine.set_mode(DrawMode::Eraser);
    engine.set_eraser_radius(radius);
    let Some((&(x, y), rest)) = path.split_first() else {
        return;
    };
    engine.handle_input(InputEvent::down(x, y));
    for &(x, y) in rest {
        engine.handle_input(InputEvent::moved(x, y));
    }
    engine.handle_input(InputEvent::PointerUp);
}

#[test]
fn adds_then_equal_undos_return_to_empty() {
    let mut engine = CanvasEngine::new();
    for i in 0..5 {
        engine.execute(Command::Add(horizontal(i as f64 * 20.0)));
    }
    // Interleave some undo/redo without pushing.
    assert!(engine.undo());
    assert!(engine.undo());
    assert!(engine.redo());
    for _ in 0..4 {
        assert!(engine.undo());
    }
    assert!(engine.is_empty());
    assert!(!engine.undo());
}

#[test]
fn push_after_undo_discards_redo() {
    let mut engine = CanvasEngine::new();
    let c1 = horizontal(0.0);
    let c2 = horizontal(20.0);
    let c3 = horizontal(40.0);
    engine.execute(Command::Add(c1.clone()));
    engine.execute(Command::Add(c2));
    assert!(engine.undo());
    engine.execute(Command::Add(c3.clone()));
    assert!(!engine.redo());
    assert_eq!(ids(&engine), vec![c1.id(), c3.id()]);
}

#[test]
fn erase_gesture_is_atomic() {
    let mut engine = CanvasEngine::new();
    let elements = [
        horizontal(0.0),
        stamp_at(300.0, 300.0, 20.0),
        horizontal(100.0),
        horizontal(200.0),
    ];
    for el in &elements {
        engine.execute(Command::Add(el.clone()));
    }
    let before = ids(&engine);

    // Hits the strokes at indices 3, 0, 2 in that order across samples.
    erase_path(&mut engine, 1.0, &[(50.0, 200.0), (50.0, 0.0), (50.0, 100.0)]);
    assert_eq!(ids(&engine), vec![elements[1].id()]);
    assert_eq!(engine.history().undo_len(), 5);

    assert!(engine.undo());
    assert_eq!(ids(&engine), before);
    assert_eq!(engine.history().undo_len(), 4);

    assert!(engine.redo());
    assert_eq!(ids(&engine), vec![elements[1].id()]);
}

#[test]
fn eraser_sweep_removes_each_element_once() {
    let mut engine = CanvasEngine::new();
    engine.execute(Command::Add(horizontal(0.0)));
    erase_path(
        &mut engine,
        3.0,
        &[(0.0, 0.0), (25.0, 0.0), (50.0, 0.0), (75.0, 0.0)],
    );
    assert!(engine.is_empty());
    let Some(Command::Erase { removed }) = engine.history().peek_undo() else {
        panic!("expected an erase command on top of history");
    };
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].index, 0);
}

#[test]
fn stroke_hit_boundary_through_engine() {
    // Line width 10 and eraser radius 5: reach is exactly 10.
    let mut engine = CanvasEngine::new();
    engine.execute(Command::Add(horizontal(0.0)));

    erase_path(&mut engine, 5.0, &[(50.0, 10.0)]);
    assert_eq!(engine.len(), 1);

    erase_path(&mut engine, 5.0, &[(50.0, 9.999)]);
    assert!(engine.is_empty());
}

#[test]
fn stamp_hit_boundary_is_inclusive() {
    let mut engine = CanvasEngine::new();
    engine.execute(Command::Add(stamp_at(0.0, 0.0, 40.0)));

    erase_path(&mut engine, 10.0, &[(30.1, 0.0)]);
    assert_eq!(engine.len(), 1);

    erase_path(&mut engine, 10.0, &[(18.0, 24.0)]);
    assert!(engine.is_empty());
}

#[test]
fn stamp_taps_and_pen_strokes_interleave() {
    let mut engine = CanvasEngine::new();
    engine.handle_input(InputEvent::down(0.0, 0.0));
    engine.handle_input(InputEvent::moved(10.0, 10.0));
    engine.handle_input(InputEvent::PointerUp);

    engine.set_mode(DrawMode::Stamp);
    engine.set_stamp_kind(StampKind::Cross);
    engine.handle_input(InputEvent::tap(50.0, 50.0));

    assert_eq!(engine.len(), 2);
    assert!(engine.elements()[0].as_stroke().is_some());
    assert_eq!(engine.elements()[1].as_stamp().map(|s| s.kind), Some(StampKind::Cross));

    assert!(engine.undo());
    assert!(engine.undo());
    assert!(engine.is_empty());
}

#[test]
fn cancel_during_erase_commits() {
    let mut engine = CanvasEngine::new();
    engine.execute(Command::Add(stamp_at(0.0, 0.0, 20.0)));
    engine.set_mode(DrawMode::Eraser);
    engine.handle_input(InputEvent::down(0.0, 0.0));
    engine.handle_input(InputEvent::PointerCancel);
    assert!(engine.is_empty());
    assert!(engine.undo());
    assert_eq!(engine.len(), 1);
}
