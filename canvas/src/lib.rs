//! Drawing, history, and viewport engine for the browser image editor.
//!
//! This crate is compiled to WebAssembly and runs in the browser; it also
//! builds natively so the same engine can run headless against an in-memory
//! raster. It owns the interactive core of an editing session: translating
//! raw DOM input events into strokes on the raster, maintaining camera state
//! for pan/zoom, the undo/redo timeline, and the brush. The host JavaScript
//! layer is responsible only for wiring DOM events to the engine and carrying
//! out the resulting [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`stroke`] | Freehand stroke smoothing into paintable segments |
//! | [`history`] | Linear undo/redo timeline over raster snapshots |
//! | [`brush`] | Brush size and colour |
//! | [`slider`] | Brush-size slider drag gesture |
//! | [`surface`] | The raster abstraction the engine paints on |
//! | [`render`] | Browser raster over a canvas 2D context |
//! | [`pixmap`] | In-memory RGBA raster for tests and headless use |
//! | [`config`] | JSON-loadable engine tuning |
//! | [`consts`] | Shared numeric constants (zoom limits, brush range, etc.) |

pub mod brush;
pub mod camera;
pub mod config;
pub mod consts;
pub mod engine;
pub mod history;
pub mod input;
pub mod pixmap;
pub mod render;
pub mod slider;
pub mod stroke;
pub mod surface;
