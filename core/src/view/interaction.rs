use crate::annotation::marker::MarkerId;
use crate::annotation::store::MarkerStore;
use crate::prelude::ThermalFrame;
use crate::view::calibration::CalibrationController;
use crate::view::viewport::Viewport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    #[default]
    Viewing,
    AddingMarker,
}

/// Temperature readout under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoverInfo {
    pub x: u32,
    pub y: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationHandle {
    Min,
    Max,
}

/// Routes pointer events to hover readouts, marker placement and calibration drags.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    mode: InteractionMode,
    hover: Option<HoverInfo>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn hover(&self) -> Option<HoverInfo> {
        self.hover
    }

    pub fn toggle_add_marker(&mut self) -> InteractionMode {
        self.mode = match self.mode {
            InteractionMode::Viewing => InteractionMode::AddingMarker,
            InteractionMode::AddingMarker => InteractionMode::Viewing,
        };
        self.mode
    }

    /// Back to `Viewing` with no hover, as after a frame change.
    pub fn reset(&mut self) {
        self.mode = InteractionMode::Viewing;
        self.hover = None;
    }

    pub fn pointer_moved(
        &mut self,
        sx: f64,
        sy: f64,
        viewport: &Viewport,
        frame: &ThermalFrame,
    ) -> Option<HoverInfo> {
        self.hover = probe(sx, sy, viewport, frame);
        self.hover
    }

    pub fn pointer_left(&mut self) {
        self.hover = None;
    }

    /// Places a marker when in add-marker mode and the click lands on the frame.
    ///
    /// Placement is single-shot: a placed marker returns the controller to `Viewing`.
    /// Clicks off the frame are ignored and leave the mode unchanged.
    pub fn click(
        &mut self,
        sx: f64,
        sy: f64,
        viewport: &Viewport,
        frame: &ThermalFrame,
        store: &mut MarkerStore,
    ) -> Option<MarkerId> {
        if self.mode != InteractionMode::AddingMarker {
            return None;
        }
        let hit = probe(sx, sy, viewport, frame)?;
        let id = store.add(hit.x, hit.y, hit.temperature).id;
        self.mode = InteractionMode::Viewing;
        Some(id)
    }

    /// Applies a calibration handle drag; rejected values leave the range unchanged.
    pub fn drag_handle(
        &self,
        handle: CalibrationHandle,
        value: f32,
        calibration: &mut CalibrationController,
    ) -> bool {
        match handle {
            CalibrationHandle::Min => calibration.set_min(value),
            CalibrationHandle::Max => calibration.set_max(value),
        }
    }
}

fn probe(sx: f64, sy: f64, viewport: &Viewport, frame: &ThermalFrame) -> Option<HoverInfo> {
    let (x, y) = viewport.screen_to_data(sx, sy)?;
    let temperature = frame.temperature_at(x, y)?;
    Some(HoverInfo { x, y, temperature })
}
