#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::pixmap::Pixmap;

// =============================================================
// Helpers
// =============================================================

const EPSILON: f64 = 1e-9;
const WHITE: [u8; 4] = [255, 255, 255, 255];
const BRUSH_BLUE: [u8; 4] = [0x00, 0x9d, 0xff, 255];

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn no_modifiers() -> Modifiers {
    Modifiers::default()
}

fn ctrl_modifier() -> Modifiers {
    Modifiers { ctrl: true, ..Default::default() }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// Screen position of canvas pixel `(x, y)` at the initial camera.
///
/// A 200x100 canvas centred in an 800x600 viewport has its origin at (300, 250).
fn at(x: f64, y: f64) -> Point {
    pt(300.0 + x, 250.0 + y)
}

fn white_pixmap() -> Pixmap {
    match Pixmap::new(200, 100, WHITE) {
        Ok(p) => p,
        Err(e) => panic!("{e}"),
    }
}

fn loaded_with(config: EngineConfig) -> EngineCore<Pixmap> {
    let mut core = EngineCore::new(config);
    core.set_viewport(800.0, 600.0);
    if let Err(e) = core.load_image(white_pixmap(), 2048) {
        panic!("load failed: {e}");
    }
    core
}

fn loaded() -> EngineCore<Pixmap> {
    loaded_with(EngineConfig::default())
}

fn pixel(core: &EngineCore<Pixmap>, x: u32, y: u32) -> Option<[u8; 4]> {
    core.surface().and_then(|s| s.pixel(x, y))
}

fn raster(core: &EngineCore<Pixmap>) -> Vec<u8> {
    core.surface().map(Pixmap::to_rgba).unwrap_or_default()
}

fn click(core: &mut EngineCore<Pixmap>, x: f64, y: f64) -> Vec<Action> {
    core.on_pointer_down(at(x, y), Button::Primary, no_modifiers());
    core.on_pointer_up(at(x, y), Button::Primary, no_modifiers())
}

fn drag(core: &mut EngineCore<Pixmap>, points: &[(f64, f64)]) -> Vec<Action> {
    let Some((&(x0, y0), rest)) = points.split_first() else {
        return Vec::new();
    };
    core.on_pointer_down(at(x0, y0), Button::Primary, no_modifiers());
    for &(x, y) in rest {
        core.on_pointer_move(at(x, y), no_modifiers());
    }
    let (xl, yl) = points[points.len() - 1];
    core.on_pointer_up(at(xl, yl), Button::Primary, no_modifiers())
}

fn has_action(actions: &[Action], wanted: Action) -> bool {
    actions.contains(&wanted)
}

fn has_transform_changed(actions: &[Action]) -> bool {
    has_action(actions, Action::TransformChanged)
}

fn has_canvas_changed(actions: &[Action]) -> bool {
    has_action(actions, Action::CanvasChanged)
}

fn has_prevent_default(actions: &[Action]) -> bool {
    has_action(actions, Action::PreventDefault)
}

fn active_stroke(core: &EngineCore<Pixmap>) -> &Stroke {
    match &core.input {
        InputState::Drawing { stroke } => stroke,
        other => panic!("expected Drawing, got {other:?}"),
    }
}

/// Surface whose failures can be switched on after it is handed to the engine.
#[derive(Default)]
struct FakeSurface {
    size: (u32, u32),
    draws: Rc<Cell<usize>>,
    fail_draw: Rc<Cell<bool>>,
    fail_snapshot: Rc<Cell<bool>>,
    fail_restore: Rc<Cell<bool>>,
}

impl FakeSurface {
    fn sized(width: u32, height: u32) -> Self {
        Self { size: (width, height), ..Default::default() }
    }

    fn draw(&mut self) -> Result<(), &'static str> {
        if self.fail_draw.get() {
            return Err("draw failed");
        }
        self.draws.set(self.draws.get() + 1);
        Ok(())
    }
}

impl RasterSurface for FakeSurface {
    type Snapshot = usize;
    type Error = &'static str;

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn stroke_line(&mut self, _from: Point, _to: Point, _style: &StrokeStyle) -> Result<(), Self::Error> {
        self.draw()
    }

    fn stroke_quadratic(&mut self, _from: Point, _ctrl: Point, _to: Point, _style: &StrokeStyle) -> Result<(), Self::Error> {
        self.draw()
    }

    fn fill_disc(&mut self, _center: Point, _radius: f64, _color: Color) -> Result<(), Self::Error> {
        self.draw()
    }

    fn snapshot(&self) -> Result<Self::Snapshot, Self::Error> {
        if self.fail_snapshot.get() {
            return Err("snapshot failed");
        }
        Ok(self.draws.get())
    }

    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<(), Self::Error> {
        if self.fail_restore.get() {
            return Err("restore failed");
        }
        self.draws.set(*snapshot);
        Ok(())
    }
}

fn loaded_fake(surface: FakeSurface) -> EngineCore<FakeSurface> {
    let mut core = EngineCore::default();
    core.set_viewport(800.0, 600.0);
    if let Err(e) = core.load_image(surface, 0) {
        panic!("load failed: {e}");
    }
    core
}

/// Pointer capture that always refuses.
struct RefusingCapture;

impl PointerCapture for RefusingCapture {
    type Error = &'static str;

    fn set_pointer_capture(&mut self, _pointer_id: i32) -> Result<(), Self::Error> {
        Err("InvalidPointerId")
    }

    fn release_pointer_capture(&mut self, _pointer_id: i32) -> Result<(), Self::Error> {
        Err("NotFoundError")
    }
}

// =============================================================
// EngineCore: construction and defaults
// =============================================================

#[test]
fn core_default_has_no_image() {
    let core: EngineCore<Pixmap> = EngineCore::default();
    assert!(core.image_info().is_none());
    assert!(core.surface().is_none());
    assert_eq!(core.history_len(), 0);
    assert_eq!(core.history_cursor(), None);
}

#[test]
fn core_default_camera_is_identity() {
    let core: EngineCore<Pixmap> = EngineCore::default();
    let cam = core.camera();
    assert_eq!(cam.offset_x, 0.0);
    assert_eq!(cam.offset_y, 0.0);
    assert_eq!(cam.scale, 1.0);
}

#[test]
fn core_default_brush() {
    let core: EngineCore<Pixmap> = EngineCore::default();
    assert_eq!(core.brush().size(), 10.0);
    assert_eq!(core.brush().color().to_rgba(), BRUSH_BLUE);
}

#[test]
fn core_brush_from_config() {
    let config = EngineConfig { brush_size: 20.0, color: Color::rgb(1, 2, 3), ..Default::default() };
    let core: EngineCore<Pixmap> = EngineCore::new(config);
    assert_eq!(core.brush().size(), 20.0);
    assert_eq!(core.brush().color(), Color::rgb(1, 2, 3));
}

// =============================================================
// EngineCore: load_image
// =============================================================

#[test]
fn load_image_pushes_baseline() {
    let mut core: EngineCore<Pixmap> = EngineCore::default();
    let actions = match core.load_image(white_pixmap(), 2048) {
        Ok(a) => a,
        Err(e) => panic!("{e}"),
    };
    assert!(has_transform_changed(&actions));
    assert!(has_canvas_changed(&actions));
    assert!(has_action(&actions, Action::HistoryChanged { can_undo: false, can_redo: false }));
    assert_eq!(core.history_len(), 1);
    assert_eq!(core.history_cursor(), Some(0));
}

#[test]
fn load_image_records_info() {
    let core = loaded();
    let info = core.image_info();
    assert_eq!(info, Some(ImageInfo { width: 200, height: 100, size_bytes: 2048 }));
    assert_eq!(info.map(|i| i.size_label()), Some("2.00 KB".to_owned()));
}

#[test]
fn load_image_resets_session() {
    let mut core = loaded();
    click(&mut core, 10.0, 10.0);
    core.on_wheel(at(50.0, 50.0), WheelDelta { dx: 0.0, dy: -1.0 }, ctrl_modifier());
    core.on_pointer_down(at(5.0, 5.0), Button::Primary, no_modifiers());

    assert!(core.load_image(white_pixmap(), 10).is_ok());
    assert_eq!(core.camera(), Camera::default());
    assert!(core.input.is_idle());
    assert_eq!(core.history_len(), 1);
    assert!(!core.can_undo());
    assert_eq!(pixel(&core, 10, 10), Some(WHITE));
}

#[test]
fn load_image_rejects_empty_surface() {
    let mut core: EngineCore<FakeSurface> = EngineCore::default();
    let r = core.load_image(FakeSurface::sized(0, 10), 0);
    assert_eq!(r, Err(EngineError::EmptyImage { width: 0, height: 10 }));
    assert!(core.surface().is_none());
}

#[test]
fn load_image_snapshot_failure_keeps_previous_session() {
    let mut core = loaded_fake(FakeSurface::sized(10, 10));
    let broken = FakeSurface::sized(20, 20);
    broken.fail_snapshot.set(true);
    let r = core.load_image(broken, 0);
    assert!(matches!(r, Err(EngineError::Surface(_))));
    assert_eq!(core.image_info().map(|i| i.width), Some(10));
}

#[test]
fn image_size_check_rejects_either_zero_side() {
    assert_eq!(check_image_size(0, 0), Err(EngineError::EmptyImage { width: 0, height: 0 }));
    assert_eq!(check_image_size(640, 0), Err(EngineError::EmptyImage { width: 640, height: 0 }));
    assert_eq!(check_image_size(1, 1), Ok(()));
}

#[test]
fn restore_current_drops_unrecorded_pixels() {
    let mut core = loaded();
    click(&mut core, 20.0, 20.0);
    let committed = raster(&core);

    // A stroke in progress paints but is not yet on the timeline.
    core.on_pointer_down(at(60.0, 50.0), Button::Primary, no_modifiers());
    core.on_pointer_move(at(120.0, 50.0), no_modifiers());
    assert_ne!(raster(&core), committed);

    assert_eq!(core.restore_current(), Ok(()));
    assert_eq!(raster(&core), committed);
    assert_eq!(core.history_len(), 2);
}

#[test]
fn restore_current_without_session_is_noop() {
    let mut core: EngineCore<Pixmap> = EngineCore::default();
    assert_eq!(core.restore_current(), Ok(()));
}

#[test]
fn restore_current_reports_surface_failure() {
    let surface = FakeSurface::sized(10, 10);
    let fail = Rc::clone(&surface.fail_restore);
    let mut core = loaded_fake(surface);
    fail.set(true);
    assert!(matches!(core.restore_current(), Err(EngineError::Surface(_))));
}

#[test]
fn size_label_formats_kilobytes() {
    let info = |size_bytes| ImageInfo { width: 1, height: 1, size_bytes };
    assert_eq!(info(0).size_label(), "0.00 KB");
    assert_eq!(info(1536).size_label(), "1.50 KB");
    assert_eq!(info(1_048_576).size_label(), "1024.00 KB");
}

// =============================================================
// Gestures before load
// =============================================================

#[test]
fn gestures_ignored_without_image() {
    let mut core: EngineCore<Pixmap> = EngineCore::default();
    assert!(core.on_pointer_down(pt(10.0, 10.0), Button::Primary, no_modifiers()).is_empty());
    assert!(core.input.is_idle());
    assert!(core.on_wheel(pt(10.0, 10.0), WheelDelta { dx: 0.0, dy: -1.0 }, ctrl_modifier()).is_empty());
    assert!(core.on_key_down(&Key("z".into()), ctrl_modifier()).is_empty());
    assert!(core.undo().is_empty());
    assert_eq!(core.camera(), Camera::default());
}

#[test]
fn brush_and_display_work_without_image() {
    let mut core: EngineCore<Pixmap> = EngineCore::default();
    assert!(!core.set_brush_percent(1.0).is_empty());
    assert!(!core.toggle_pixel_perfect().is_empty());
}

// =============================================================
// Drawing
// =============================================================

#[test]
fn pointer_down_starts_stroke_in_canvas_space() {
    let mut core = loaded();
    let actions = core.on_pointer_down(at(40.0, 30.0), Button::Primary, no_modifiers());
    assert!(has_prevent_default(&actions));
    let stroke = active_stroke(&core);
    assert_eq!(stroke.points(), &[pt(40.0, 30.0)]);
}

#[test]
fn pointer_down_alone_does_not_paint() {
    let mut core = loaded();
    core.on_pointer_down(at(40.0, 30.0), Button::Primary, no_modifiers());
    assert_eq!(pixel(&core, 40, 30), Some(WHITE));
}

#[test]
fn single_click_paints_dot_and_pushes_once() {
    let mut core = loaded();
    let actions = click(&mut core, 50.0, 50.0);
    assert!(has_canvas_changed(&actions));
    assert!(has_action(&actions, Action::HistoryChanged { can_undo: true, can_redo: false }));
    assert_eq!(pixel(&core, 50, 50), Some(BRUSH_BLUE));
    // Radius 5: six pixels away is untouched.
    assert_eq!(pixel(&core, 56, 50), Some(WHITE));
    assert_eq!(core.history_len(), 2);
}

#[test]
fn dot_radius_scales_with_zoom() {
    let mut core = loaded();
    core.camera.scale = 2.0;
    core.on_pointer_down(pt(400.0, 300.0), Button::Primary, no_modifiers());
    let stroke = active_stroke(&core);
    assert!(approx_eq(stroke.dot_radius(), 2.5));
}

#[test]
fn dot_radius_has_floor() {
    let mut core = loaded();
    core.set_brush_percent(0.0);
    core.camera.scale = 40.0;
    core.on_pointer_down(pt(400.0, 300.0), Button::Primary, no_modifiers());
    assert!(approx_eq(active_stroke(&core).dot_radius(), 0.5));
}

#[test]
fn stroke_width_divides_by_scale() {
    let mut core = loaded();
    core.camera.scale = 2.0;
    core.on_pointer_down(pt(400.0, 300.0), Button::Primary, no_modifiers());
    assert!(approx_eq(active_stroke(&core).width(), 5.0));
}

#[test]
fn stroke_width_fixed_at_pointer_down() {
    let mut core = loaded();
    core.on_pointer_down(at(10.0, 10.0), Button::Primary, no_modifiers());
    core.set_brush_percent(1.0);
    assert!(approx_eq(active_stroke(&core).width(), 10.0));
}

#[test]
fn pointer_move_while_drawing_paints() {
    let mut core = loaded();
    core.on_pointer_down(at(20.0, 50.0), Button::Primary, no_modifiers());
    let actions = core.on_pointer_move(at(60.0, 50.0), no_modifiers());
    assert!(has_canvas_changed(&actions));
    // The curve reaches the midpoint at x = 40.
    assert_eq!(pixel(&core, 30, 50), Some(BRUSH_BLUE));
}

#[test]
fn pointer_move_when_idle_is_noop() {
    let mut core = loaded();
    assert!(core.on_pointer_move(at(60.0, 50.0), no_modifiers()).is_empty());
}

#[test]
fn drag_paints_continuous_line() {
    let mut core = loaded();
    let actions = drag(&mut core, &[(20.0, 50.0), (60.0, 50.0), (100.0, 50.0), (140.0, 50.0)]);
    assert!(has_canvas_changed(&actions));
    for x in 21..140 {
        assert_eq!(pixel(&core, x, 50), Some(BRUSH_BLUE), "gap at x = {x}");
    }
    assert_eq!(pixel(&core, 80, 80), Some(WHITE));
    assert_eq!(core.history_len(), 2);
    assert!(core.input.is_idle());
}

#[test]
fn stroke_uses_current_color() {
    let mut core = loaded();
    core.set_color(Color::rgb(255, 0, 0));
    click(&mut core, 50.0, 50.0);
    assert_eq!(pixel(&core, 50, 50), Some([255, 0, 0, 255]));
}

#[test]
fn stroke_off_canvas_still_records_history() {
    let mut core = loaded();
    drag(&mut core, &[(-500.0, -500.0), (-400.0, -400.0)]);
    assert_eq!(core.history_len(), 2);
    assert!(raster(&core).iter().all(|&b| b == 255));
}

#[test]
fn zoomed_stroke_lands_under_pointer() {
    let mut core = loaded();
    core.on_wheel(at(100.0, 50.0), WheelDelta { dx: 0.0, dy: -1.0 }, ctrl_modifier());
    let layout = core.layout();
    let screen = core.camera().canvas_to_screen(pt(70.5, 20.5), &layout);
    core.on_pointer_down(screen, Button::Primary, no_modifiers());
    core.on_pointer_up(screen, Button::Primary, no_modifiers());
    assert_eq!(pixel(&core, 70, 20), Some(BRUSH_BLUE));
}

#[test]
fn paint_failure_still_records_history() {
    let surface = FakeSurface::sized(10, 10);
    let fail = Rc::clone(&surface.fail_draw);
    let mut core = loaded_fake(surface);
    fail.set(true);
    core.on_pointer_down(pt(400.0, 300.0), Button::Primary, no_modifiers());
    core.on_pointer_move(pt(401.0, 300.0), no_modifiers());
    let actions = core.on_pointer_up(pt(401.0, 300.0), Button::Primary, no_modifiers());
    assert!(has_canvas_changed(&actions));
    assert_eq!(core.history_len(), 2);
}

#[test]
fn snapshot_failure_skips_history_push() {
    let surface = FakeSurface::sized(10, 10);
    let fail = Rc::clone(&surface.fail_snapshot);
    let mut core = loaded_fake(surface);
    fail.set(true);
    core.on_pointer_down(pt(400.0, 300.0), Button::Primary, no_modifiers());
    let actions = core.on_pointer_up(pt(400.0, 300.0), Button::Primary, no_modifiers());
    assert_eq!(actions, vec![Action::CanvasChanged]);
    assert_eq!(core.history_len(), 1);
    assert!(core.input.is_idle());
}

// =============================================================
// Panning
// =============================================================

#[test]
fn middle_drag_pans() {
    let mut core = loaded();
    let down = core.on_pointer_down(pt(400.0, 300.0), Button::Middle, no_modifiers());
    assert!(has_prevent_default(&down));
    assert!(core.input.is_panning());

    let actions = core.on_pointer_move(pt(450.0, 320.0), no_modifiers());
    assert!(has_transform_changed(&actions));
    assert_eq!(core.camera().offset_x, 50.0);
    assert_eq!(core.camera().offset_y, 20.0);
}

#[test]
fn secondary_drag_pans() {
    let mut core = loaded();
    core.on_pointer_down(pt(0.0, 0.0), Button::Secondary, no_modifiers());
    core.on_pointer_move(pt(-10.0, 5.0), no_modifiers());
    assert_eq!(core.camera().offset_x, -10.0);
    assert_eq!(core.camera().offset_y, 5.0);
}

#[test]
fn pan_is_anchored_to_gesture_start() {
    let mut core = loaded();
    core.camera.offset_x = 30.0;
    core.on_pointer_down(pt(100.0, 100.0), Button::Middle, no_modifiers());
    for x in [110.0, 150.0, 90.0, 120.0] {
        core.on_pointer_move(pt(x, 100.0), no_modifiers());
    }
    assert_eq!(core.camera().offset_x, 50.0);
}

#[test]
fn pan_does_not_touch_raster_or_history() {
    let mut core = loaded();
    core.on_pointer_down(pt(100.0, 100.0), Button::Middle, no_modifiers());
    core.on_pointer_move(pt(300.0, 300.0), no_modifiers());
    let actions = core.on_pointer_up(pt(300.0, 300.0), Button::Middle, no_modifiers());
    assert!(actions.is_empty());
    assert!(core.input.is_idle());
    assert_eq!(core.history_len(), 1);
    assert!(raster(&core).iter().all(|&b| b == 255));
}

#[test]
fn wheel_zoom_during_pan_keeps_anchor() {
    let mut core = loaded();
    core.on_pointer_down(pt(400.0, 300.0), Button::Middle, no_modifiers());

    let q = pt(500.0, 300.0);
    let under_q = core.camera().screen_to_canvas(q, &core.layout());
    core.on_wheel(q, WheelDelta { dx: 0.0, dy: -1.0 }, ctrl_modifier());
    let zoomed = core.camera();
    assert!(!approx_eq(zoomed.offset_x, 0.0));

    // Returning to the press point must not undo the zoom's offset correction.
    core.on_pointer_move(pt(400.0, 300.0), no_modifiers());
    let cam = core.camera();
    assert!(approx_eq(cam.scale, zoomed.scale));
    assert!(approx_eq(cam.offset_x, zoomed.offset_x));
    assert!(approx_eq(cam.offset_y, zoomed.offset_y));
    let after = cam.screen_to_canvas(q, &core.layout());
    assert!(approx_eq(after.x, under_q.x), "{} vs {}", after.x, under_q.x);
    assert!(approx_eq(after.y, under_q.y), "{} vs {}", after.y, under_q.y);

    core.on_pointer_move(pt(410.0, 295.0), no_modifiers());
    assert!(approx_eq(core.camera().offset_x, zoomed.offset_x + 10.0));
    assert!(approx_eq(core.camera().offset_y, zoomed.offset_y - 5.0));
}

#[test]
fn key_zoom_during_pan_keeps_anchor() {
    let mut core = loaded();
    core.on_pointer_down(pt(400.0, 300.0), Button::Secondary, no_modifiers());
    core.on_pointer_move(pt(420.0, 310.0), no_modifiers());
    let actions = core.on_key_down(&Key("+".into()), ctrl_modifier());
    assert!(has_transform_changed(&actions));
    let zoomed = core.camera();

    core.on_pointer_move(pt(420.0, 310.0), no_modifiers());
    assert!(approx_eq(core.camera().offset_x, zoomed.offset_x));
    assert!(approx_eq(core.camera().offset_y, zoomed.offset_y));
}

// =============================================================
// Mutual exclusion
// =============================================================

#[test]
fn pan_button_during_stroke_is_ignored() {
    let mut core = loaded();
    core.on_pointer_down(at(20.0, 20.0), Button::Primary, no_modifiers());
    let actions = core.on_pointer_down(at(20.0, 20.0), Button::Middle, no_modifiers());
    assert!(actions.is_empty());
    assert!(core.input.is_drawing());

    core.on_pointer_move(at(80.0, 20.0), no_modifiers());
    assert_eq!(core.camera(), Camera::default());
}

#[test]
fn draw_button_during_pan_is_ignored() {
    let mut core = loaded();
    core.on_pointer_down(pt(100.0, 100.0), Button::Middle, no_modifiers());
    assert!(core.on_pointer_down(at(20.0, 20.0), Button::Primary, no_modifiers()).is_empty());
    assert!(core.input.is_panning());
}

#[test]
fn pointer_up_of_other_button_ends_stroke() {
    let mut core = loaded();
    core.on_pointer_down(at(20.0, 20.0), Button::Primary, no_modifiers());
    core.on_pointer_up(at(20.0, 20.0), Button::Secondary, no_modifiers());
    assert!(core.input.is_idle());
    assert_eq!(core.history_len(), 2);
}

#[test]
fn pointer_up_when_idle_is_noop() {
    let mut core = loaded();
    assert!(core.on_pointer_up(at(0.0, 0.0), Button::Primary, no_modifiers()).is_empty());
    assert_eq!(core.history_len(), 1);
}

// =============================================================
// Wheel zoom
// =============================================================

#[test]
fn plain_wheel_is_not_consumed() {
    let mut core = loaded();
    let actions = core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 0.0, dy: -1.0 }, no_modifiers());
    assert!(actions.is_empty());
    assert_eq!(core.camera(), Camera::default());
}

#[test]
fn ctrl_wheel_up_zooms_in() {
    let mut core = loaded();
    let actions = core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 0.0, dy: -120.0 }, ctrl_modifier());
    assert!(has_prevent_default(&actions));
    assert!(has_transform_changed(&actions));
    assert!(approx_eq(core.camera().scale, 1.1));
}

#[test]
fn ctrl_wheel_down_zooms_out() {
    let mut core = loaded();
    core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 0.0, dy: 3.0 }, ctrl_modifier());
    assert!(approx_eq(core.camera().scale, 0.9));
}

#[test]
fn wheel_zoom_keeps_point_under_cursor() {
    let mut core = loaded();
    let cursor = pt(330.0, 270.0);
    let before = core.camera().screen_to_canvas(cursor, &core.layout());
    core.on_wheel(cursor, WheelDelta { dx: 0.0, dy: -1.0 }, ctrl_modifier());
    let after = core.camera().screen_to_canvas(cursor, &core.layout());
    assert!(approx_eq(before.x, after.x));
    assert!(approx_eq(before.y, after.y));
}

#[test]
fn wheel_zoom_in_then_out_returns_home() {
    let mut core = loaded_with(EngineConfig { zoom_out_factor: 1.0 / 1.1, ..Default::default() });
    let cursor = pt(123.0, 456.0);
    core.on_wheel(cursor, WheelDelta { dx: 0.0, dy: -1.0 }, ctrl_modifier());
    core.on_wheel(cursor, WheelDelta { dx: 0.0, dy: 1.0 }, ctrl_modifier());
    let cam = core.camera();
    assert!(approx_eq(cam.scale, 1.0));
    assert!((cam.offset_x).abs() < 1e-6);
    assert!((cam.offset_y).abs() < 1e-6);
}

#[test]
fn wheel_without_vertical_delta_is_ignored() {
    let mut core = loaded();
    let actions = core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 5.0, dy: 0.0 }, ctrl_modifier());
    assert_eq!(actions, vec![Action::PreventDefault]);
    assert_eq!(core.camera(), Camera::default());
}

#[test]
fn wheel_during_stroke_is_ignored() {
    let mut core = loaded();
    core.on_pointer_down(at(20.0, 20.0), Button::Primary, no_modifiers());
    let actions = core.on_wheel(at(20.0, 20.0), WheelDelta { dx: 0.0, dy: -1.0 }, ctrl_modifier());
    assert_eq!(actions, vec![Action::PreventDefault]);
    assert_eq!(core.camera().scale, 1.0);
}

#[test]
fn wheel_zoom_stops_at_max_scale() {
    let mut core = loaded();
    core.camera.scale = 40.0;
    let actions = core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 0.0, dy: -1.0 }, ctrl_modifier());
    assert!(!has_transform_changed(&actions));
    assert_eq!(core.camera().scale, 40.0);
}

#[test]
fn wheel_zoom_clamps_to_min_scale() {
    let mut core = loaded();
    for _ in 0..200 {
        core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 0.0, dy: 1.0 }, ctrl_modifier());
    }
    assert_eq!(core.camera().scale, 0.05);
}

#[test]
fn wheel_uses_configured_limits() {
    let mut core = loaded_with(EngineConfig { max_scale: 1.2, ..Default::default() });
    for _ in 0..5 {
        core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 0.0, dy: -1.0 }, ctrl_modifier());
    }
    assert!(approx_eq(core.camera().scale, 1.2));
}

// =============================================================
// Keyboard
// =============================================================

#[test]
fn ctrl_z_undoes() {
    let mut core = loaded();
    click(&mut core, 50.0, 50.0);
    let actions = core.on_key_down(&Key("z".into()), ctrl_modifier());
    assert!(has_prevent_default(&actions));
    assert!(has_canvas_changed(&actions));
    assert!(has_action(&actions, Action::HistoryChanged { can_undo: false, can_redo: true }));
    assert_eq!(pixel(&core, 50, 50), Some(WHITE));
}

#[test]
fn ctrl_shift_z_and_ctrl_y_redo() {
    let mut core = loaded();
    click(&mut core, 50.0, 50.0);
    click(&mut core, 20.0, 20.0);
    core.undo();
    core.undo();

    let shift = Modifiers { shift: true, ..ctrl_modifier() };
    core.on_key_down(&Key("Z".into()), shift);
    assert_eq!(core.history_cursor(), Some(1));
    core.on_key_down(&Key("y".into()), ctrl_modifier());
    assert_eq!(core.history_cursor(), Some(2));
}

#[test]
fn undo_key_at_baseline_still_prevents_default() {
    let mut core = loaded();
    let actions = core.on_key_down(&Key("z".into()), ctrl_modifier());
    assert_eq!(actions, vec![Action::PreventDefault]);
}

#[test]
fn ctrl_plus_zooms_about_center() {
    let mut core = loaded();
    core.camera.offset_x = 12.0;
    let actions = core.on_key_down(&Key("+".into()), ctrl_modifier());
    assert!(has_transform_changed(&actions));
    assert!(approx_eq(core.camera().scale, 1.1));
    assert_eq!(core.camera().offset_x, 12.0);

    core.on_key_down(&Key("-".into()), ctrl_modifier());
    assert!(approx_eq(core.camera().scale, 1.1 * 0.9));
}

#[test]
fn keys_during_stroke_are_swallowed() {
    let mut core = loaded();
    click(&mut core, 50.0, 50.0);
    core.on_pointer_down(at(20.0, 20.0), Button::Primary, no_modifiers());

    let actions = core.on_key_down(&Key("=".into()), ctrl_modifier());
    assert_eq!(actions, vec![Action::PreventDefault]);
    core.on_key_down(&Key("z".into()), ctrl_modifier());
    assert_eq!(core.camera().scale, 1.0);
    assert_eq!(core.history_cursor(), Some(1));
}

#[test]
fn unbound_keys_are_not_consumed() {
    let mut core = loaded();
    assert!(core.on_key_down(&Key("z".into()), no_modifiers()).is_empty());
    assert!(core.on_key_down(&Key("a".into()), ctrl_modifier()).is_empty());
}

// =============================================================
// History
// =============================================================

#[test]
fn undo_then_redo_restores_identical_raster() {
    let mut core = loaded();
    drag(&mut core, &[(10.0, 10.0), (90.0, 60.0), (150.0, 20.0)]);
    let edited = raster(&core);

    core.undo();
    assert!(raster(&core).iter().all(|&b| b == 255));
    let actions = core.redo();
    assert!(has_action(&actions, Action::HistoryChanged { can_undo: true, can_redo: false }));
    assert_eq!(raster(&core), edited);
}

#[test]
fn undo_at_baseline_is_silent() {
    let mut core = loaded();
    assert!(core.undo().is_empty());
    assert_eq!(core.history_cursor(), Some(0));
}

#[test]
fn redo_at_end_is_silent() {
    let mut core = loaded();
    click(&mut core, 5.0, 5.0);
    assert!(core.redo().is_empty());
    assert_eq!(core.history_cursor(), Some(1));
}

#[test]
fn new_stroke_after_undo_prunes_redo() {
    let mut core = loaded();
    click(&mut core, 10.0, 10.0);
    click(&mut core, 30.0, 30.0);
    core.undo();
    click(&mut core, 60.0, 60.0);

    assert_eq!(core.history_len(), 3);
    assert_eq!(core.history_cursor(), Some(2));
    assert!(!core.can_redo());
    assert_eq!(pixel(&core, 30, 30), Some(WHITE));
    assert_eq!(pixel(&core, 60, 60), Some(BRUSH_BLUE));
}

#[test]
fn history_limit_bounds_timeline() {
    let mut core = loaded_with(EngineConfig { history_limit: Some(2), ..Default::default() });
    for x in [10.0, 30.0, 50.0] {
        click(&mut core, x, 10.0);
    }
    assert_eq!(core.history_len(), 2);
    core.undo();
    assert!(!core.can_undo());
    assert_eq!(pixel(&core, 30, 10), Some(BRUSH_BLUE));
    assert_eq!(pixel(&core, 50, 10), Some(WHITE));
}

#[test]
fn failed_restore_keeps_cursor() {
    let surface = FakeSurface::sized(10, 10);
    let fail = Rc::clone(&surface.fail_restore);
    let mut core = loaded_fake(surface);
    core.on_pointer_down(pt(400.0, 300.0), Button::Primary, no_modifiers());
    core.on_pointer_up(pt(400.0, 300.0), Button::Primary, no_modifiers());
    fail.set(true);

    assert!(core.undo().is_empty());
    assert_eq!(core.history_cursor(), Some(1));
    assert!(core.can_undo());
}

#[test]
fn restore_hands_snapshot_to_surface() {
    let surface = FakeSurface::sized(10, 10);
    let draws = Rc::clone(&surface.draws);
    let mut core = loaded_fake(surface);
    core.on_pointer_down(pt(400.0, 300.0), Button::Primary, no_modifiers());
    core.on_pointer_up(pt(400.0, 300.0), Button::Primary, no_modifiers());
    assert_eq!(draws.get(), 1);
    core.undo();
    assert_eq!(draws.get(), 0);
}

// =============================================================
// Brush and slider
// =============================================================

#[test]
fn brush_percent_maps_to_size() {
    let mut core = loaded();
    let actions = core.set_brush_percent(0.5);
    assert_eq!(actions, vec![Action::BrushChanged { size: 25.5, percent: 0.5 }]);
}

#[test]
fn brush_percent_is_clamped() {
    let mut core = loaded();
    assert_eq!(core.set_brush_percent(2.0), vec![Action::BrushChanged { size: 50.0, percent: 1.0 }]);
    assert_eq!(core.set_brush_percent(-1.0), vec![Action::BrushChanged { size: 1.0, percent: 0.0 }]);
}

#[test]
fn slider_drag_updates_brush() {
    let mut core = loaded();
    let track = Track { top: 100.0, height: 200.0 };
    let mut host = RefusingCapture;

    let down = core.on_slider_pointer_down(4, 300.0, track, &mut host);
    assert_eq!(down, vec![Action::BrushChanged { size: 1.0, percent: 0.0 }]);
    let moved = core.on_slider_pointer_move(100.0, track);
    assert_eq!(moved, vec![Action::BrushChanged { size: 50.0, percent: 1.0 }]);

    core.on_slider_pointer_up(4, &mut host);
    assert!(core.on_slider_pointer_move(200.0, track).is_empty());
    assert_eq!(core.brush().size(), 50.0);
}

#[test]
fn slider_move_past_track_is_clamped() {
    let mut core = loaded();
    let track = Track { top: 100.0, height: 200.0 };
    core.on_slider_pointer_down(1, 200.0, track, &mut RefusingCapture);
    core.on_slider_pointer_move(-500.0, track);
    assert_eq!(core.brush().percent(), 1.0);
}

#[test]
fn slider_cancel_stops_updates() {
    let mut core = loaded();
    let track = Track { top: 0.0, height: 100.0 };
    core.on_slider_pointer_down(1, 50.0, track, &mut RefusingCapture);
    core.on_slider_pointer_cancel();
    assert!(core.on_slider_pointer_move(0.0, track).is_empty());
}

#[test]
fn drawing_ends_slider_drag() {
    let mut core = loaded();
    let track = Track { top: 0.0, height: 100.0 };
    core.on_slider_pointer_down(1, 50.0, track, &mut RefusingCapture);
    core.on_pointer_down(at(10.0, 10.0), Button::Primary, no_modifiers());
    assert!(!core.slider.is_dragging());
}

#[test]
fn collapsed_slider_track_is_ignored() {
    let mut core = loaded();
    let track = Track { top: 0.0, height: 0.0 };
    assert!(core.on_slider_pointer_down(1, 0.0, track, &mut RefusingCapture).is_empty());
    assert_eq!(core.brush().size(), 10.0);
}

// =============================================================
// Display
// =============================================================

#[test]
fn pixel_perfect_toggles() {
    let mut core = loaded();
    assert_eq!(core.image_rendering().css_value(), "auto");
    let actions = core.toggle_pixel_perfect();
    assert_eq!(actions, vec![Action::RenderingChanged(ImageRendering::Pixelated)]);
    assert_eq!(core.image_rendering().css_value(), "pixelated");
    core.toggle_pixel_perfect();
    assert_eq!(core.image_rendering(), ImageRendering::Smooth);
}

#[test]
fn layout_follows_viewport_and_image() {
    let mut core = loaded();
    core.set_viewport(1024.0, 768.0);
    let layout = core.layout();
    assert_eq!(layout.viewport_width, 1024.0);
    assert_eq!(layout.viewport_height, 768.0);
    assert_eq!(layout.canvas_width, 200.0);
    assert_eq!(layout.canvas_height, 100.0);
}

// =============================================================
// Dispatch
// =============================================================

#[test]
fn dispatch_replays_recorded_session() {
    let script = r##"[
        {"type": "resize", "width": 800, "height": 600},
        {"type": "color", "color": "#ff0000"},
        {"type": "pointer_down", "x": 320, "y": 300, "button": "primary"},
        {"type": "pointer_move", "x": 360, "y": 300},
        {"type": "pointer_move", "x": 400, "y": 300},
        {"type": "pointer_up", "x": 400, "y": 300, "button": "primary"},
        {"type": "pointer_down", "x": 320, "y": 260, "button": "primary"},
        {"type": "pointer_up", "x": 320, "y": 260, "button": "primary"},
        {"type": "undo"},
        {"type": "brush_percent", "percent": 1.0},
        {"type": "toggle_pixel_perfect"}
    ]"##;
    let events: Vec<EditorEvent> = match serde_json::from_str(script) {
        Ok(e) => e,
        Err(e) => panic!("{e}"),
    };

    let mut core: EngineCore<Pixmap> = EngineCore::default();
    assert!(core.load_image(white_pixmap(), 0).is_ok());
    for event in events {
        core.dispatch(event);
    }

    assert_eq!(core.history_len(), 3);
    assert_eq!(core.history_cursor(), Some(1));
    assert!(core.can_redo());
    assert_eq!(pixel(&core, 40, 50), Some([255, 0, 0, 255]));
    assert_eq!(pixel(&core, 20, 10), Some(WHITE));
    assert_eq!(core.brush().size(), 50.0);
    assert_eq!(core.image_rendering(), ImageRendering::Pixelated);
}

#[test]
fn dispatch_matches_direct_calls() {
    let mut direct = loaded();
    let mut replayed = loaded();

    direct.on_wheel(pt(350.0, 280.0), WheelDelta { dx: 0.0, dy: -1.0 }, ctrl_modifier());
    replayed.dispatch(EditorEvent::Wheel { x: 350.0, y: 280.0, dx: 0.0, dy: -1.0, modifiers: ctrl_modifier() });
    assert_eq!(direct.camera(), replayed.camera());

    let key = Key("-".into());
    direct.on_key_down(&key, ctrl_modifier());
    replayed.dispatch(EditorEvent::KeyDown { key, modifiers: ctrl_modifier() });
    assert_eq!(direct.camera(), replayed.camera());
}

#[test]
fn into_surface_returns_edited_raster() {
    let mut core = loaded();
    click(&mut core, 50.0, 50.0);
    let surface = core.into_surface();
    assert_eq!(surface.and_then(|s| s.pixel(50, 50)), Some(BRUSH_BLUE));
}
