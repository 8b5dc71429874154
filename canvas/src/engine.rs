use wasm_bindgen::JsValue;
use web_sys::{Element, HtmlCanvasElement, HtmlImageElement};

use crate::brush::{Brush, Color};
use crate::camera::{Camera, Layout, Point};
use crate::config::EngineConfig;
use crate::history::History;
use crate::input::{Button, EditorEvent, InputState, Key, KeyCommand, Modifiers, WheelDelta};
use crate::render::CanvasSurface;
use crate::slider::{PointerCapture, SliderDrag, Track};
use crate::stroke::{self, Segment, Stroke};
use crate::surface::{RasterSurface, StrokeStyle};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Camera moved; restyle the canvas wrapper with [`Camera::css_transform`].
    TransformChanged,
    /// Raster pixels changed.
    CanvasChanged,
    /// Undo/redo availability may have changed.
    HistoryChanged { can_undo: bool, can_redo: bool },
    /// Brush size changed; reposition the slider thumb and fill.
    BrushChanged { size: f64, percent: f64 },
    RenderingChanged(ImageRendering),
    /// The host should suppress the browser's default handling of the event.
    PreventDefault,
}

/// How the canvas element is scaled on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageRendering {
    #[default]
    Smooth,
    /// Nearest-neighbour, for inspecting individual pixels.
    Pixelated,
}

impl ImageRendering {
    /// Value for the CSS `image-rendering` property.
    #[must_use]
    pub fn css_value(self) -> &'static str {
        match self {
            Self::Smooth => "auto",
            Self::Pixelated => "pixelated",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Smooth => Self::Pixelated,
            Self::Pixelated => Self::Smooth,
        }
    }
}

/// Metadata about the loaded image, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Size of the pasted file in bytes.
    pub size_bytes: u64,
}

impl ImageInfo {
    /// File size in kilobytes with two decimals, e.g. `"12.50 KB"`.
    #[must_use]
    pub fn size_label(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let kb = self.size_bytes as f64 / 1024.0;
        format!("{kb:.2} KB")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("surface error: {0}")]
    Surface(String),
}

/// Core engine state: everything that does not touch the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser
/// dependencies. Generic over the raster so tests and headless hosts run on
/// an in-memory [`crate::pixmap::Pixmap`].
pub struct EngineCore<S: RasterSurface> {
    pub camera: Camera,
    pub brush: Brush,
    pub input: InputState,
    pub slider: SliderDrag,
    pub config: EngineConfig,
    pub viewport_width: f64,
    pub viewport_height: f64,
    surface: Option<S>,
    history: History<S::Snapshot>,
    image: Option<ImageInfo>,
    rendering: ImageRendering,
}

impl<S: RasterSurface> Default for EngineCore<S> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<S: RasterSurface> EngineCore<S> {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            camera: Camera::default(),
            brush: Brush::new(config.brush_size, config.color),
            input: InputState::default(),
            slider: SliderDrag::default(),
            history: History::with_limit(config.history_limit),
            config,
            viewport_width: 0.0,
            viewport_height: 0.0,
            surface: None,
            image: None,
            rendering: ImageRendering::default(),
        }
    }

    // --- Data inputs ---

    /// Start a session on a surface that already holds the decoded image.
    ///
    /// Resets the camera, abandons any gesture, and replaces the history with
    /// a single baseline snapshot.
    ///
    /// # Errors
    ///
    /// Returns `EmptyImage` for a zero-sized surface and `Surface` if the
    /// baseline snapshot cannot be taken. The previous session is kept.
    pub fn load_image(&mut self, surface: S, size_bytes: u64) -> Result<Vec<Action>, EngineError> {
        let (width, height) = surface.size();
        check_image_size(width, height)?;
        let baseline = surface.snapshot().map_err(surface_error)?;

        self.camera.reset();
        self.input = InputState::Idle;
        self.history.clear();
        self.history.push(baseline);
        self.surface = Some(surface);
        self.image = Some(ImageInfo { width, height, size_bytes });
        log::info!("engine: loaded {width}x{height} image ({size_bytes} bytes)");

        Ok(vec![Action::TransformChanged, Action::CanvasChanged, self.history_changed()])
    }

    /// Repaint the surface from the current history entry, dropping any
    /// pixels that were never recorded. A no-op without a session.
    ///
    /// # Errors
    ///
    /// Returns `Surface` if the snapshot cannot be written back.
    pub fn restore_current(&mut self) -> Result<(), EngineError> {
        let (Some(surface), Some(snapshot)) = (self.surface.as_mut(), self.history.current()) else {
            return Ok(());
        };
        surface.restore(snapshot).map_err(surface_error)
    }

    // --- Viewport ---

    /// Update viewport dimensions (CSS pixels).
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    /// The sizes the screen ↔ canvas mapping depends on.
    #[must_use]
    pub fn layout(&self) -> Layout {
        let (w, h) = self.surface.as_ref().map_or((0, 0), RasterSurface::size);
        Layout {
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            canvas_width: f64::from(w),
            canvas_height: f64::from(h),
        }
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if self.surface.is_none() || !self.input.is_idle() {
            return Vec::new();
        }

        if button.pans() {
            let anchor = self.camera.pan_anchor(screen_pt);
            self.input = InputState::Panning { anchor };
            log::debug!("engine: pan start at ({}, {})", screen_pt.x, screen_pt.y);
            return vec![Action::PreventDefault];
        }

        self.slider.pointer_cancel();
        let start = self.camera.screen_to_canvas(screen_pt, &self.layout());
        let size = self.brush.size();
        let style = StrokeStyle { width: self.camera.stroke_width(size), color: self.brush.color() };
        let radius = self.camera.dot_radius(size);
        self.input = InputState::Drawing { stroke: Stroke::begin(start, style, radius) };
        log::debug!("engine: stroke start at ({}, {}) width {}", start.x, start.y, style.width);
        vec![Action::PreventDefault]
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let layout = self.layout();
        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::Panning { anchor } => {
                self.camera.pan_to(screen_pt, *anchor);
                vec![Action::TransformChanged]
            }
            InputState::Drawing { stroke } => {
                let point = self.camera.screen_to_canvas(screen_pt, &layout);
                let segment = stroke.extend(point);
                paint_segment(self.surface.as_mut(), &segment, &stroke.style());
                vec![Action::CanvasChanged]
            }
        }
    }

    /// End the active gesture, whichever button was released.
    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Panning { .. } => {
                log::debug!("engine: pan end");
                Vec::new()
            }
            InputState::Drawing { stroke } => {
                let style = stroke.style();
                let points = stroke.points().len();
                let segment = stroke.finish();
                paint_segment(self.surface.as_mut(), &segment, &style);
                log::debug!("engine: stroke end after {points} points");
                let mut actions = vec![Action::CanvasChanged];
                if self.commit() {
                    actions.push(self.history_changed());
                }
                actions
            }
        }
    }

    /// Ctrl+wheel zooms about the pointer. Plain scrolling is left to the host.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if self.surface.is_none() || !modifiers.ctrl {
            return Vec::new();
        }
        if self.input.is_drawing() || delta.dy == 0.0 {
            return vec![Action::PreventDefault];
        }

        let factor = if delta.dy > 0.0 { self.config.zoom_out_factor } else { self.config.zoom_in_factor };
        let layout = self.layout();
        let mut actions = vec![Action::PreventDefault];
        let before = self.camera;
        if self.camera.zoom_at(screen_pt, factor, &layout, self.config.scale_limits()) {
            self.rebase_pan(before);
            actions.push(Action::TransformChanged);
        }
        actions
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if self.surface.is_none() {
            return Vec::new();
        }
        let Some(command) = KeyCommand::from_key(key, modifiers) else {
            return Vec::new();
        };

        let mut actions = vec![Action::PreventDefault];
        if self.input.is_drawing() {
            return actions;
        }
        let changed = match command {
            KeyCommand::Undo => self.undo(),
            KeyCommand::Redo => self.redo(),
            KeyCommand::ZoomIn => self.zoom_centered(self.config.zoom_in_factor),
            KeyCommand::ZoomOut => self.zoom_centered(self.config.zoom_out_factor),
        };
        actions.extend(changed);
        actions
    }

    // --- Brush ---

    pub fn set_brush_percent(&mut self, percent: f64) -> Vec<Action> {
        let percent = self.brush.set_from_percent(percent);
        vec![Action::BrushChanged { size: self.brush.size(), percent }]
    }

    pub fn set_color(&mut self, color: Color) -> Vec<Action> {
        self.brush.set_color(color);
        Vec::new()
    }

    pub fn on_slider_pointer_down<C: PointerCapture>(&mut self, pointer_id: i32, y: f64, track: Track, host: &mut C) -> Vec<Action> {
        match self.slider.pointer_down(pointer_id, y, track, host) {
            Some(percent) => self.set_brush_percent(percent),
            None => Vec::new(),
        }
    }

    pub fn on_slider_pointer_move(&mut self, y: f64, track: Track) -> Vec<Action> {
        match self.slider.pointer_move(y, track) {
            Some(percent) => self.set_brush_percent(percent),
            None => Vec::new(),
        }
    }

    pub fn on_slider_pointer_up<C: PointerCapture>(&mut self, pointer_id: i32, host: &mut C) {
        self.slider.pointer_up(pointer_id, host);
    }

    pub fn on_slider_pointer_cancel(&mut self) {
        self.slider.pointer_cancel();
    }

    // --- History ---

    /// Restore the previous snapshot. No-op at the start of the timeline.
    pub fn undo(&mut self) -> Vec<Action> {
        if self.input.is_drawing() {
            return Vec::new();
        }
        let Some(surface) = self.surface.as_mut() else {
            return Vec::new();
        };
        let stepped = self.history.undo_with(|snapshot| surface.restore(snapshot));
        self.after_step("undo", stepped)
    }

    /// Restore the next snapshot. No-op at the end of the timeline.
    pub fn redo(&mut self) -> Vec<Action> {
        if self.input.is_drawing() {
            return Vec::new();
        }
        let Some(surface) = self.surface.as_mut() else {
            return Vec::new();
        };
        let stepped = self.history.redo_with(|snapshot| surface.restore(snapshot));
        self.after_step("redo", stepped)
    }

    // --- Display ---

    pub fn toggle_pixel_perfect(&mut self) -> Vec<Action> {
        self.rendering = self.rendering.toggled();
        vec![Action::RenderingChanged(self.rendering)]
    }

    /// Apply a recorded event.
    pub fn dispatch(&mut self, event: EditorEvent) -> Vec<Action> {
        match event {
            EditorEvent::Resize { width, height } => {
                self.set_viewport(width, height);
                Vec::new()
            }
            EditorEvent::PointerDown { x, y, button, modifiers } => self.on_pointer_down(Point::new(x, y), button, modifiers),
            EditorEvent::PointerMove { x, y, modifiers } => self.on_pointer_move(Point::new(x, y), modifiers),
            EditorEvent::PointerUp { x, y, button, modifiers } => self.on_pointer_up(Point::new(x, y), button, modifiers),
            EditorEvent::Wheel { x, y, dx, dy, modifiers } => self.on_wheel(Point::new(x, y), WheelDelta { dx, dy }, modifiers),
            EditorEvent::KeyDown { key, modifiers } => self.on_key_down(&key, modifiers),
            EditorEvent::BrushPercent { percent } => self.set_brush_percent(percent),
            EditorEvent::Color { color } => self.set_color(color),
            EditorEvent::Undo => self.undo(),
            EditorEvent::Redo => self.redo(),
            EditorEvent::TogglePixelPerfect => self.toggle_pixel_perfect(),
        }
    }

    // --- Queries ---

    /// The current camera state.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn brush(&self) -> Brush {
        self.brush
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn history_cursor(&self) -> Option<usize> {
        self.history.cursor()
    }

    #[must_use]
    pub fn image_info(&self) -> Option<ImageInfo> {
        self.image
    }

    #[must_use]
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Give up the engine and keep the edited raster.
    #[must_use]
    pub fn into_surface(self) -> Option<S> {
        self.surface
    }

    #[must_use]
    pub fn image_rendering(&self) -> ImageRendering {
        self.rendering
    }

    // --- Internals ---

    /// Snapshot the surface onto the timeline. Returns whether an entry was added.
    fn commit(&mut self) -> bool {
        let Some(surface) = self.surface.as_ref() else {
            return false;
        };
        match surface.snapshot() {
            Ok(snapshot) => {
                self.history.push(snapshot);
                true
            }
            Err(err) => {
                log::error!("engine: snapshot failed, stroke not recorded: {err:?}");
                false
            }
        }
    }

    fn zoom_centered(&mut self, factor: f64) -> Vec<Action> {
        let before = self.camera;
        if self.camera.zoom_centered(factor, self.config.scale_limits()) {
            self.rebase_pan(before);
            vec![Action::TransformChanged]
        } else {
            Vec::new()
        }
    }

    /// Carry an active pan's anchor across an offset change made by a zoom,
    /// so the next pan move continues from the zoomed view.
    fn rebase_pan(&mut self, before: Camera) {
        if let InputState::Panning { anchor } = &mut self.input {
            anchor.x += before.offset_x - self.camera.offset_x;
            anchor.y += before.offset_y - self.camera.offset_y;
        }
    }

    fn after_step(&self, what: &str, stepped: Result<bool, S::Error>) -> Vec<Action> {
        match stepped {
            Ok(true) => vec![Action::CanvasChanged, self.history_changed()],
            Ok(false) => Vec::new(),
            Err(err) => {
                log::error!("engine: {what} restore failed: {err:?}");
                Vec::new()
            }
        }
    }

    fn history_changed(&self) -> Action {
        Action::HistoryChanged { can_undo: self.history.can_undo(), can_redo: self.history.can_redo() }
    }
}

fn paint_segment<S: RasterSurface>(surface: Option<&mut S>, segment: &Segment, style: &StrokeStyle) {
    let Some(surface) = surface else {
        return;
    };
    if let Err(err) = stroke::paint(surface, segment, style) {
        log::warn!("engine: paint failed: {err:?}");
    }
}

/// Reject images with no pixels before anything is resized or drawn.
///
/// # Errors
///
/// Returns `EmptyImage` if either side is zero.
pub fn check_image_size(width: u32, height: u32) -> Result<(), EngineError> {
    if width == 0 || height == 0 {
        return Err(EngineError::EmptyImage { width, height });
    }
    Ok(())
}

fn surface_error<E: std::fmt::Debug>(err: E) -> EngineError {
    EngineError::Surface(format!("{err:?}"))
}

fn js_error(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

impl PointerCapture for Element {
    type Error = JsValue;

    fn set_pointer_capture(&mut self, pointer_id: i32) -> Result<(), Self::Error> {
        Element::set_pointer_capture(self, pointer_id)
    }

    fn release_pointer_capture(&mut self, pointer_id: i32) -> Result<(), Self::Error> {
        Element::release_pointer_capture(self, pointer_id)
    }
}

/// The full editor engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore<CanvasSurface>,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, config: EngineConfig) -> Self {
        Self { canvas, core: EngineCore::new(config) }
    }

    /// Size the canvas to a pasted image, draw it, and start a session.
    ///
    /// An empty image is rejected before the canvas is touched. If drawing or
    /// loading fails after the resize, the canvas gets its old size back and
    /// the current history entry is repainted, so the previous session stays
    /// usable.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the image is empty, the 2D context is unavailable, or
    /// drawing fails.
    pub fn on_image_pasted(&mut self, image: &HtmlImageElement, size_bytes: u64) -> Result<Vec<Action>, JsValue> {
        let (width, height) = (image.natural_width(), image.natural_height());
        check_image_size(width, height).map_err(js_error)?;

        let previous = (self.canvas.width(), self.canvas.height());
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let loaded = CanvasSurface::new(self.canvas.clone())
            .and_then(|surface| {
                surface.context().draw_image_with_html_image_element(image, 0.0, 0.0)?;
                Ok(surface)
            })
            .and_then(|surface| self.core.load_image(surface, size_bytes).map_err(js_error));

        if loaded.is_err() {
            self.canvas.set_width(previous.0);
            self.canvas.set_height(previous.1);
            if let Err(err) = self.core.restore_current() {
                log::warn!("engine: could not repaint previous image after failed paste: {err}");
            }
        }
        loaded
    }

    /// The edited image as a `data:image/png` URL, for a download link named
    /// [`crate::consts::EXPORT_FILE_NAME`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas is tainted or cannot be encoded.
    pub fn export_data_url(&self) -> Result<String, JsValue> {
        self.canvas.to_data_url()
    }

    /// Slider track geometry from its bounding box.
    #[must_use]
    pub fn slider_track(track: &Element) -> Track {
        let rect = track.get_bounding_client_rect();
        Track { top: rect.top(), height: rect.height() }
    }

    // --- Delegated inputs ---

    pub fn set_viewport(&mut self, width_css: f64, height_css: f64) {
        self.core.set_viewport(width_css, height_css);
    }

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    pub fn on_slider_pointer_down(&mut self, track: &mut Element, pointer_id: i32, y: f64) -> Vec<Action> {
        let geometry = Self::slider_track(track);
        self.core.on_slider_pointer_down(pointer_id, y, geometry, track)
    }

    pub fn on_slider_pointer_move(&mut self, track: &Element, y: f64) -> Vec<Action> {
        self.core.on_slider_pointer_move(y, Self::slider_track(track))
    }

    pub fn on_slider_pointer_up(&mut self, track: &mut Element, pointer_id: i32) {
        self.core.on_slider_pointer_up(pointer_id, track);
    }

    pub fn on_slider_pointer_cancel(&mut self) {
        self.core.on_slider_pointer_cancel();
    }

    pub fn set_brush_percent(&mut self, percent: f64) -> Vec<Action> {
        self.core.set_brush_percent(percent)
    }

    pub fn set_color(&mut self, color: Color) -> Vec<Action> {
        self.core.set_color(color)
    }

    pub fn undo(&mut self) -> Vec<Action> {
        self.core.undo()
    }

    pub fn redo(&mut self) -> Vec<Action> {
        self.core.redo()
    }

    pub fn toggle_pixel_perfect(&mut self) -> Vec<Action> {
        self.core.toggle_pixel_perfect()
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.core.camera()
    }

    #[must_use]
    pub fn image_info(&self) -> Option<ImageInfo> {
        self.core.image_info()
    }
}
