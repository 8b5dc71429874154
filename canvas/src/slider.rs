//! Vertical brush-size slider gesture.
//!
//! The track reports pointer positions in screen space; the bottom of the
//! track is 0 and the top is 1. Pointer capture keeps the drag alive when the
//! pointer leaves the track, but it is an optimization only: capture failures
//! are logged and otherwise ignored.

#[cfg(test)]
#[path = "slider_test.rs"]
mod slider_test;

use std::fmt;

/// Host element that can capture a pointer for the duration of a drag.
pub trait PointerCapture {
    type Error: fmt::Debug;

    fn set_pointer_capture(&mut self, pointer_id: i32) -> Result<(), Self::Error>;
    fn release_pointer_capture(&mut self, pointer_id: i32) -> Result<(), Self::Error>;
}

/// Vertical extent of the slider track in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub top: f64,
    pub height: f64,
}

impl Track {
    /// Normalized position of `y` on the track, bottom = 0, top = 1, unclamped.
    ///
    /// `None` for a collapsed track.
    #[must_use]
    pub fn percent_at(&self, y: f64) -> Option<f64> {
        if self.height <= 0.0 || !self.height.is_finite() {
            return None;
        }
        Some(1.0 - (y - self.top) / self.height)
    }
}

/// Drag state for the slider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliderDrag {
    active_pointer: Option<i32>,
}

impl SliderDrag {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.active_pointer.is_some()
    }

    /// Start dragging and return the percent under the pointer.
    pub fn pointer_down<C: PointerCapture>(&mut self, pointer_id: i32, y: f64, track: Track, host: &mut C) -> Option<f64> {
        self.active_pointer = Some(pointer_id);
        if let Err(err) = host.set_pointer_capture(pointer_id) {
            log::debug!("slider: pointer capture failed for {pointer_id}: {err:?}");
        }
        track.percent_at(y)
    }

    /// Percent under the pointer while a drag is active.
    #[must_use]
    pub fn pointer_move(&self, y: f64, track: Track) -> Option<f64> {
        if self.is_dragging() { track.percent_at(y) } else { None }
    }

    /// End the drag and release capture.
    pub fn pointer_up<C: PointerCapture>(&mut self, pointer_id: i32, host: &mut C) {
        self.active_pointer = None;
        if let Err(err) = host.release_pointer_capture(pointer_id) {
            log::debug!("slider: pointer release failed for {pointer_id}: {err:?}");
        }
    }

    /// End the drag without touching capture; the browser already dropped it.
    pub fn pointer_cancel(&mut self) {
        self.active_pointer = None;
    }
}
