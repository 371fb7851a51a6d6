//! Affine mapping between data space (frame pixel indices) and container space.
//!
//! The forward transform is `screen = data * scale + offset`.

use serde::{Deserialize, Serialize};

pub const ZOOM_IN_FACTOR: f64 = 1.25;
pub const ZOOM_OUT_FACTOR: f64 = 0.8;
pub const MIN_SCALE: f64 = 0.25;
pub const MAX_SCALE: f64 = 5.0;
pub const DEFAULT_PADDING: f64 = 40.0;

// Inverse lookups within this distance of a pixel edge snap to it, so that
// forward-then-inverse recovers the original index despite float error.
const EDGE_SNAP: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Viewport over a frame of fixed dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    data_width: u32,
    data_height: u32,
    container: Option<ContainerSize>,
    state: ViewportState,
}

impl Viewport {
    pub fn new(data_width: u32, data_height: u32) -> Self {
        Self {
            data_width,
            data_height,
            container: None,
            state: ViewportState::default(),
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn container(&self) -> Option<ContainerSize> {
        self.container
    }

    pub fn data_size(&self) -> (u32, u32) {
        (self.data_width, self.data_height)
    }

    /// Resets to identity for a new frame, keeping the last known container.
    pub fn reset(&mut self, data_width: u32, data_height: u32) {
        self.data_width = data_width;
        self.data_height = data_height;
        self.state = ViewportState::default();
    }

    /// Centers the frame in the container, never upsampling past native resolution.
    pub fn fit_to_container(&mut self, container_width: f64, container_height: f64, padding: f64) {
        self.container = Some(ContainerSize::new(container_width, container_height));
        if self.data_width == 0 || self.data_height == 0 {
            return;
        }

        let width = self.data_width as f64;
        let height = self.data_height as f64;
        let avail_w = container_width - 2.0 * padding;
        let avail_h = container_height - 2.0 * padding;
        let scale = (avail_w / width).min(avail_h / height).min(1.0);
        if !(scale.is_finite() && scale > 0.0) {
            return;
        }

        self.state = ViewportState {
            scale,
            offset_x: (container_width - width * scale) / 2.0,
            offset_y: (container_height - height * scale) / 2.0,
        };
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(ZOOM_IN_FACTOR);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(ZOOM_OUT_FACTOR);
    }

    /// Zooms around the container center, clamping the scale to `[MIN_SCALE, MAX_SCALE]`.
    pub fn zoom_by(&mut self, factor: f64) {
        let anchor = self.zoom_anchor();
        self.zoom_at(factor, anchor);
    }

    /// Zooms keeping the screen point `anchor` visually fixed.
    pub fn zoom_at(&mut self, factor: f64, anchor: (f64, f64)) {
        let current = self.state.scale;
        let next = (current * factor).clamp(MIN_SCALE, MAX_SCALE);
        if !next.is_finite() || next == current {
            return;
        }

        let ratio = next / current;
        let (cx, cy) = anchor;
        self.state = ViewportState {
            scale: next,
            offset_x: cx - (cx - self.state.offset_x) * ratio,
            offset_y: cy - (cy - self.state.offset_y) * ratio,
        };
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.state.offset_x += dx;
            self.state.offset_y += dy;
        }
    }

    fn zoom_anchor(&self) -> (f64, f64) {
        match self.container {
            Some(container) => container.center(),
            None => (
                self.data_width as f64 * self.state.scale / 2.0 + self.state.offset_x,
                self.data_height as f64 * self.state.scale / 2.0 + self.state.offset_y,
            ),
        }
    }

    pub fn data_to_screen(&self, px: f64, py: f64) -> (f64, f64) {
        (
            px * self.state.scale + self.state.offset_x,
            py * self.state.scale + self.state.offset_y,
        )
    }

    /// Pixel under a screen point, `None` when the point is off the frame.
    pub fn screen_to_data(&self, sx: f64, sy: f64) -> Option<(u32, u32)> {
        let dx = snap_floor((sx - self.state.offset_x) / self.state.scale, self.data_width);
        let dy = snap_floor((sy - self.state.offset_y) / self.state.scale, self.data_height);
        if !dx.is_finite() || !dy.is_finite() {
            return None;
        }
        if dx < 0.0 || dy < 0.0 || dx >= self.data_width as f64 || dy >= self.data_height as f64 {
            return None;
        }
        Some((dx as u32, dy as u32))
    }

    /// Screen rectangle `(x, y, width, height)` covered by the whole frame.
    pub fn frame_bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.state.offset_x,
            self.state.offset_y,
            self.data_width as f64 * self.state.scale,
            self.data_height as f64 * self.state.scale,
        )
    }
}

/// Floors `value`, snapping to a nearby pixel edge only when that edge is
/// still inside `[0, limit)`.
fn snap_floor(value: f64, limit: u32) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() < EDGE_SNAP && nearest < limit as f64 {
        nearest
    } else {
        value.floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_centers_without_upsampling() {
        let mut viewport = Viewport::new(100, 50);
        viewport.fit_to_container(800.0, 600.0, 40.0);
        assert_eq!(
            viewport.state(),
            ViewportState {
                scale: 1.0,
                offset_x: 350.0,
                offset_y: 275.0
            }
        );
    }

    #[test]
    fn fit_shrinks_large_frames() {
        let mut viewport = Viewport::new(640, 480);
        viewport.fit_to_container(400.0, 400.0, 0.0);
        assert_eq!(viewport.scale(), 0.625);
        let (x, y, w, h) = viewport.frame_bounds();
        assert_eq!((x, y, w, h), (0.0, 50.0, 400.0, 300.0));
    }

    #[test]
    fn fit_ignores_container_smaller_than_padding() {
        let mut viewport = Viewport::new(10, 10);
        viewport.fit_to_container(50.0, 50.0, 40.0);
        assert_eq!(viewport.state(), ViewportState::default());
    }

    #[test]
    fn zoom_in_then_out_restores_state() {
        let mut viewport = Viewport::new(100, 50);
        viewport.fit_to_container(800.0, 600.0, 40.0);
        let before = viewport.state();
        viewport.zoom_in();
        assert_eq!(viewport.scale(), 1.25);
        viewport.zoom_out();
        let after = viewport.state();
        assert_eq!(after.scale, before.scale);
        assert!((after.offset_x - before.offset_x).abs() < 1e-9);
        assert!((after.offset_y - before.offset_y).abs() < 1e-9);
    }

    #[test]
    fn zoom_keeps_container_center_fixed() {
        let mut viewport = Viewport::new(100, 50);
        viewport.fit_to_container(800.0, 600.0, 40.0);
        let center_data = ((400.0 - 350.0) / 1.0, (300.0 - 275.0) / 1.0);
        viewport.zoom_in();
        viewport.zoom_in();
        let (sx, sy) = viewport.data_to_screen(center_data.0, center_data.1);
        assert!((sx - 400.0).abs() < 1e-9);
        assert!((sy - 300.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_clamps_to_bounds() {
        let mut viewport = Viewport::new(10, 10);
        viewport.fit_to_container(100.0, 100.0, 0.0);
        for _ in 0..20 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.scale(), MAX_SCALE);
        for _ in 0..40 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.scale(), MIN_SCALE);
    }

    #[test]
    fn forward_then_inverse_recovers_every_pixel() {
        let mut viewport = Viewport::new(37, 23);
        viewport.fit_to_container(333.0, 177.0, 12.5);
        viewport.zoom_in();
        viewport.zoom_in();
        viewport.zoom_out();
        viewport.pan_by(-13.7, 4.1);
        for y in 0..23 {
            for x in 0..37 {
                let (sx, sy) = viewport.data_to_screen(x as f64, y as f64);
                assert_eq!(viewport.screen_to_data(sx, sy), Some((x, y)));
            }
        }
    }

    #[test]
    fn inverse_outside_frame_is_none() {
        let mut viewport = Viewport::new(100, 50);
        viewport.fit_to_container(800.0, 600.0, 40.0);
        assert_eq!(viewport.screen_to_data(345.0, 300.0), None);
        assert_eq!(viewport.screen_to_data(450.0, 325.0), None);
        assert_eq!(viewport.screen_to_data(449.9, 324.9), Some((99, 49)));
        assert_eq!(viewport.screen_to_data(350.0, 275.0), Some((0, 0)));
    }

    #[test]
    fn inverse_just_inside_last_column_and_row_floors() {
        let viewport = Viewport::new(10, 10);
        assert_eq!(viewport.screen_to_data(9.9999999, 5.0), Some((9, 5)));
        assert_eq!(viewport.screen_to_data(5.0, 9.9999999), Some((5, 9)));
        assert_eq!(viewport.screen_to_data(9.9999999, 9.9999999), Some((9, 9)));
        assert_eq!(viewport.screen_to_data(10.0, 5.0), None);
    }
}
