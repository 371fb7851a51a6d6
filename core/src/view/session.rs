use crate::annotation::marker::{Marker, MarkerId, MarkerPatch, PersistedMarker};
use crate::annotation::store::{MarkerSnapshot, MarkerStore};
use crate::palette::Palette;
use crate::prelude::{CalibrationSeed, FrameResult, PersistenceResult, ThermalFrame};
use crate::raster::compositor::{Compositor, PixelBuffer};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{MetricsRecorder, MetricsSnapshot};
use crate::view::calibration::CalibrationController;
use crate::view::interaction::{CalibrationHandle, HoverInfo, InteractionController, InteractionMode};
use crate::view::viewport::{Viewport, DEFAULT_PADDING};

/// All state of one active thermal view: frame, palette, calibration,
/// viewport, markers and pointer interaction.
///
/// Every change to palette or calibration recomputes the full raster.
pub struct InspectionSession {
    measurement_id: String,
    frame: Option<ThermalFrame>,
    palette: Palette,
    calibration: CalibrationController,
    viewport: Viewport,
    padding: f64,
    markers: MarkerStore,
    interaction: InteractionController,
    compositor: Compositor,
    raster: Option<PixelBuffer>,
    status: Option<String>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl InspectionSession {
    pub fn new(measurement_id: impl Into<String>) -> Self {
        Self {
            measurement_id: measurement_id.into(),
            frame: None,
            palette: Palette::default(),
            calibration: CalibrationController::new(),
            viewport: Viewport::new(0, 0),
            padding: DEFAULT_PADDING,
            markers: MarkerStore::new(),
            interaction: InteractionController::new(),
            compositor: Compositor::default(),
            raster: None,
            status: None,
            metrics: MetricsRecorder::new(),
            logger: LogManager::new(),
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn measurement_id(&self) -> &str {
        &self.measurement_id
    }

    /// Shows the decoder's output for a measurement.
    ///
    /// A decode failure leaves the session without a frame or raster and sets
    /// the status line instead. Markers from a previous frame are dropped.
    pub fn open_frame(
        &mut self,
        measurement_id: impl Into<String>,
        decoded: FrameResult<ThermalFrame>,
        seed: Option<CalibrationSeed>,
    ) {
        self.measurement_id = measurement_id.into();
        self.markers.clear();
        self.interaction.reset();
        if let Some(old) = self.raster.take() {
            self.compositor.recycle(old);
        }

        match decoded {
            Ok(frame) => {
                self.logger.record(&format!(
                    "opened {} frame {}x{} [{:.1}, {:.1}]",
                    self.measurement_id,
                    frame.width(),
                    frame.height(),
                    frame.min_temp(),
                    frame.max_temp()
                ));
                self.calibration.on_frame(&frame, seed);
                self.viewport.reset(frame.width(), frame.height());
                if let Some(container) = self.viewport.container() {
                    self.viewport
                        .fit_to_container(container.width, container.height, self.padding);
                }
                self.frame = Some(frame);
                self.status = None;
                self.recompose();
            }
            Err(err) => {
                self.logger
                    .warn(&format!("no thermal data for {}: {}", self.measurement_id, err));
                self.frame = None;
                self.viewport.reset(0, 0);
                self.status = Some(format!("No thermal data available: {}", err));
            }
        }
    }

    pub fn frame(&self) -> Option<&ThermalFrame> {
        self.frame.as_ref()
    }

    /// Composited raster for the current frame, palette and calibration.
    pub fn raster(&self) -> Option<&PixelBuffer> {
        self.raster.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn recompose(&mut self) {
        let Some(frame) = self.frame.as_ref() else {
            return;
        };
        let next = self
            .compositor
            .render(frame, self.palette, self.calibration.range());
        if let Some(old) = self.raster.replace(next) {
            self.compositor.recycle(old);
        }
        self.metrics.record_render();
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        if palette != self.palette {
            self.palette = palette;
            self.recompose();
        }
    }

    pub fn calibration(&self) -> &CalibrationController {
        &self.calibration
    }

    /// Current window in the shape the surrounding record persists it.
    pub fn calibration_seed(&self) -> CalibrationSeed {
        self.calibration.range().into()
    }

    pub fn set_calibration_min(&mut self, value: f32) -> bool {
        self.drag_calibration_handle(CalibrationHandle::Min, value)
    }

    pub fn set_calibration_max(&mut self, value: f32) -> bool {
        self.drag_calibration_handle(CalibrationHandle::Max, value)
    }

    pub fn drag_calibration_handle(&mut self, handle: CalibrationHandle, value: f32) -> bool {
        let applied = self
            .interaction
            .drag_handle(handle, value, &mut self.calibration);
        if applied {
            self.recompose();
        }
        applied
    }

    pub fn reset_calibration(&mut self) {
        self.calibration.reset();
        self.recompose();
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn fit_to_container(&mut self, width: f64, height: f64, padding: f64) {
        self.padding = padding;
        self.viewport.fit_to_container(width, height, padding);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zooms keeping the data point under `anchor` fixed on screen.
    pub fn zoom_at(&mut self, factor: f64, anchor: (f64, f64)) {
        self.viewport.zoom_at(factor, anchor);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.viewport.pan_by(dx, dy);
    }

    pub fn mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    pub fn toggle_add_marker(&mut self) -> InteractionMode {
        self.interaction.toggle_add_marker()
    }

    pub fn hover(&self) -> Option<HoverInfo> {
        self.interaction.hover()
    }

    pub fn pointer_moved(&mut self, sx: f64, sy: f64) -> Option<HoverInfo> {
        match self.frame.as_ref() {
            Some(frame) => self.interaction.pointer_moved(sx, sy, &self.viewport, frame),
            None => {
                self.interaction.pointer_left();
                None
            }
        }
    }

    pub fn pointer_left(&mut self) {
        self.interaction.pointer_left();
    }

    pub fn click(&mut self, sx: f64, sy: f64) -> Option<MarkerId> {
        let frame = self.frame.as_ref()?;
        let placed = self
            .interaction
            .click(sx, sy, &self.viewport, frame, &mut self.markers)?;
        self.logger
            .record(&format!("placed marker {} on {}", placed, self.measurement_id));
        Some(placed)
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    pub fn update_marker(&mut self, id: MarkerId, patch: MarkerPatch) -> bool {
        self.markers.update(id, patch)
    }

    pub fn remove_marker(&mut self, id: MarkerId) -> Option<Marker> {
        self.markers.remove(id)
    }

    /// Applies the outcome of a marker load.
    ///
    /// On failure the view proceeds with no markers. Records that fall outside
    /// the current frame are dropped.
    pub fn apply_loaded_markers(&mut self, loaded: PersistenceResult<Vec<PersistedMarker>>) {
        match loaded {
            Ok(records) => {
                let total = records.len();
                let kept: Vec<PersistedMarker> = match self.frame.as_ref() {
                    Some(frame) => records
                        .into_iter()
                        .filter(|record| frame.contains(record.x, record.y))
                        .collect(),
                    None => records,
                };
                if kept.len() < total {
                    self.logger.warn(&format!(
                        "dropped {} markers outside the {} frame",
                        total - kept.len(),
                        self.measurement_id
                    ));
                }
                self.markers.load_all(kept);
            }
            Err(err) => {
                self.markers.clear();
                self.status = Some(format!("Could not load markers: {}", err));
            }
        }
    }

    pub fn marker_snapshot(&self) -> MarkerSnapshot {
        self.markers.snapshot()
    }

    /// Applies the outcome of a save. Local markers are never discarded.
    pub fn apply_save_result(&mut self, saved: PersistenceResult<MarkerSnapshot>) {
        match saved {
            Ok(snapshot) => {
                self.markers.mark_persisted(&snapshot);
                self.status = Some(format!("Saved {} markers", snapshot.markers.len()));
            }
            Err(err) => {
                self.status = Some(format!(
                    "Saving markers failed: {}; local changes kept for retry",
                    err
                ));
            }
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
