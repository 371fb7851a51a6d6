use crate::generator::profile::SceneGenerator;
use crate::storage::FileMarkerRepository;
use crate::workflow::config::InspectorConfig;
use crate::workflow::decoder::JsonFrameDecoder;
use log::{info, warn};
use std::sync::Arc;
use thermcore::annotation::MarkerSync;
use thermcore::prelude::{FrameDecoder, FrameSource};
use thermcore::view::{HoverInfo, InteractionMode};
use thermcore::InspectionSession;

pub struct WorkflowResult {
    pub session: InspectionSession,
    pub hottest: Option<HoverInfo>,
    pub placed: usize,
    pub saved: bool,
}

/// Drives one inspection: decode, calibrate, load markers, place new ones, save.
#[derive(Clone)]
pub struct Runner {
    config: InspectorConfig,
    sync: Arc<MarkerSync<FileMarkerRepository>>,
}

impl Runner {
    pub fn new(config: InspectorConfig) -> Self {
        let repository = Arc::new(FileMarkerRepository::new(config.store_dir.clone()));
        Self {
            config,
            sync: Arc::new(MarkerSync::new(repository)),
        }
    }

    pub fn sync(&self) -> Arc<MarkerSync<FileMarkerRepository>> {
        self.sync.clone()
    }

    fn frame_source(&self) -> (Box<dyn FrameDecoder>, FrameSource) {
        let (decoder, reference): (Box<dyn FrameDecoder>, String) = match &self.config.frame {
            Some(path) => (
                Box::new(JsonFrameDecoder),
                path.to_string_lossy().into_owned(),
            ),
            None => (
                Box::new(SceneGenerator::new(self.config.scene.clone())),
                "synthetic".to_string(),
            ),
        };
        let source = FrameSource {
            reference,
            max_temp_hint: self.config.max_temp_hint,
        };
        (decoder, source)
    }

    /// `placements` are data-space pixels, placed through the add-marker flow.
    /// Markers are saved only when at least one placement landed.
    pub async fn execute(&self, placements: &[(u32, u32)]) -> anyhow::Result<WorkflowResult> {
        let config = &self.config;
        let mut session =
            InspectionSession::new(config.measurement_id.clone()).with_palette(config.palette);
        session.fit_to_container(
            config.container.width,
            config.container.height,
            config.container.padding,
        );

        let decoded = {
            let (decoder, source) = self.frame_source();
            decoder.decode(&source)
        };
        session.open_frame(
            config.measurement_id.clone(),
            decoded,
            config.calibration_seed(),
        );
        if session.frame().is_none() {
            return Ok(WorkflowResult {
                session,
                hottest: None,
                placed: 0,
                saved: false,
            });
        }

        let loaded = self.sync.load(&config.measurement_id).await;
        session.apply_loaded_markers(loaded);

        let hottest = hottest_pixel(&mut session);

        let mut placed = 0;
        for &(x, y) in placements {
            if session.mode() == InteractionMode::Viewing {
                session.toggle_add_marker();
            }
            let (sx, sy) = session
                .viewport()
                .data_to_screen(x as f64 + 0.5, y as f64 + 0.5);
            match session.click(sx, sy) {
                Some(_) => placed += 1,
                None => {
                    warn!("marker at ({}, {}) is outside the frame, skipped", x, y);
                    session.toggle_add_marker();
                }
            }
        }

        let mut saved = false;
        if placed > 0 {
            let result = self
                .sync
                .save(&config.measurement_id, session.marker_snapshot())
                .await;
            saved = result.is_ok();
            session.apply_save_result(result);
        }
        info!(
            "{}: {} markers ({} placed, saved: {})",
            config.measurement_id,
            session.markers().len(),
            placed,
            saved
        );

        Ok(WorkflowResult {
            session,
            hottest,
            placed,
            saved,
        })
    }
}

/// Hover readout over the hottest sample, probed through the viewport.
fn hottest_pixel(session: &mut InspectionSession) -> Option<HoverInfo> {
    let frame = session.frame()?;
    let width = frame.width() as usize;
    let (index, _) = frame
        .temperatures()
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;
    let (x, y) = ((index % width) as f64, (index / width) as f64);
    let (sx, sy) = session.viewport().data_to_screen(x + 0.5, y + 0.5);
    let hover = session.pointer_moved(sx, sy);
    session.pointer_left();
    hover
}
