//! Browser raster: [`RasterSurface`] over a canvas 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! Strokes use the context's native quadratic curves with round caps and
//! joins. Snapshots are `ImageData` copies of the whole canvas.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<_, JsValue>`.

use std::f64::consts::PI;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::brush::Color;
use crate::camera::Point;
use crate::surface::{RasterSurface, StrokeStyle};

/// A canvas element and its 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Bind to `canvas`, acquiring its 2D context.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context (e.g. it already has a
    /// WebGL one).
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| JsValue::from_str("2d context has unexpected type"))?;
        Ok(Self { canvas, ctx })
    }

    #[must_use]
    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.ctx
    }

    fn apply_stroke_style(&self, style: &StrokeStyle) {
        self.ctx.set_stroke_style_str(&style.color.to_string());
        self.ctx.set_line_width(style.width);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
    }
}

impl RasterSurface for CanvasSurface {
    type Snapshot = ImageData;
    type Error = JsValue;

    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn stroke_line(&mut self, from: Point, to: Point, style: &StrokeStyle) -> Result<(), Self::Error> {
        self.apply_stroke_style(style);
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
        Ok(())
    }

    fn stroke_quadratic(&mut self, from: Point, ctrl: Point, to: Point, style: &StrokeStyle) -> Result<(), Self::Error> {
        self.apply_stroke_style(style);
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.quadratic_curve_to(ctrl.x, ctrl.y, to.x, to.y);
        self.ctx.stroke();
        Ok(())
    }

    fn fill_disc(&mut self, center: Point, radius: f64, color: Color) -> Result<(), Self::Error> {
        self.ctx.set_fill_style_str(&color.to_string());
        self.ctx.begin_path();
        self.ctx.arc(center.x, center.y, radius, 0.0, 2.0 * PI)?;
        self.ctx.fill();
        Ok(())
    }

    fn snapshot(&self) -> Result<Self::Snapshot, Self::Error> {
        let (w, h) = self.size();
        self.ctx.get_image_data(0.0, 0.0, f64::from(w), f64::from(h))
    }

    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<(), Self::Error> {
        self.ctx.put_image_data(snapshot, 0.0, 0.0)
    }
}
