use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thermcore::prelude::CalibrationSeed;
use thermcore::Palette;

use crate::generator::profile::SceneConfig;

/// Container the frame is fitted into, in screen pixels.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContainerConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            padding: 40.0,
        }
    }
}

/// Calibration window persisted with the measurement record.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct CalibrationConfig {
    pub min: f32,
    pub max: f32,
}

impl From<CalibrationConfig> for CalibrationSeed {
    fn from(config: CalibrationConfig) -> Self {
        CalibrationSeed {
            min_temp: config.min,
            max_temp: config.max,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    pub measurement_id: String,
    pub palette: Palette,
    /// JSON frame file; a synthetic scene is generated when absent.
    pub frame: Option<PathBuf>,
    pub max_temp_hint: Option<f32>,
    pub calibration: Option<CalibrationConfig>,
    pub container: ContainerConfig,
    pub store_dir: PathBuf,
    pub scene: SceneConfig,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            measurement_id: "demo-measurement".into(),
            palette: Palette::Iron,
            frame: None,
            max_temp_hint: None,
            calibration: None,
            container: ContainerConfig::default(),
            store_dir: PathBuf::from("tools/data/markers"),
            scene: SceneConfig::default(),
        }
    }
}

impl InspectorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading inspector config {}", path_ref.display()))?;
        let config: InspectorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing inspector config {}", path_ref.display()))?;
        Ok(config)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_args(
        measurement_id: String,
        palette: Palette,
        frame: Option<PathBuf>,
        max_temp_hint: Option<f32>,
        calibration_min: Option<f32>,
        calibration_max: Option<f32>,
        container: ContainerConfig,
        store_dir: PathBuf,
    ) -> Self {
        let calibration = pair_calibration(calibration_min, calibration_max);
        Self {
            measurement_id,
            palette,
            frame,
            max_temp_hint,
            calibration,
            container,
            store_dir,
            scene: SceneConfig::default(),
        }
    }

    pub fn calibration_seed(&self) -> Option<CalibrationSeed> {
        self.calibration.map(CalibrationSeed::from)
    }
}

/// A calibration seed needs both bounds; a lone bound is reported and dropped.
fn pair_calibration(min: Option<f32>, max: Option<f32>) -> Option<CalibrationConfig> {
    match (min, max) {
        (Some(min), Some(max)) => Some(CalibrationConfig { min, max }),
        (Some(value), None) => {
            warn!(
                "--calibration-min {} ignored without --calibration-max; using auto calibration",
                value
            );
            None
        }
        (None, Some(value)) => {
            warn!(
                "--calibration-max {} ignored without --calibration-min; using auto calibration",
                value
            );
            None
        }
        (None, None) => None,
    }
}
