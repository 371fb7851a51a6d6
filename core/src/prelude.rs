use crate::math::stats::FieldStats;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Decoded per-pixel temperature field, row-major (`index = y * width + x`).
///
/// Frames are validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrameRecord", into = "FrameRecord")]
pub struct ThermalFrame {
    width: u32,
    height: u32,
    min_temp: f32,
    max_temp: f32,
    temperatures: Vec<f32>,
}

impl ThermalFrame {
    pub fn new(
        width: u32,
        height: u32,
        min_temp: f32,
        max_temp: f32,
        temperatures: Vec<f32>,
    ) -> FrameResult<Self> {
        Self::validate_shape(width, height, &temperatures)?;
        if !min_temp.is_finite() || !max_temp.is_finite() || min_temp > max_temp {
            return Err(FrameError::InvalidBounds {
                min: min_temp,
                max: max_temp,
            });
        }

        Ok(Self {
            width,
            height,
            min_temp,
            max_temp,
            temperatures,
        })
    }

    /// Builds a frame whose reported bounds are the observed extremes of the samples.
    pub fn from_samples(width: u32, height: u32, temperatures: Vec<f32>) -> FrameResult<Self> {
        Self::validate_shape(width, height, &temperatures)?;
        let stats = FieldStats::of(&temperatures).ok_or(FrameError::EmptyDimensions {
            width,
            height,
        })?;
        Self::new(width, height, stats.min, stats.max, temperatures)
    }

    fn validate_shape(width: u32, height: u32, temperatures: &[f32]) -> FrameResult<()> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if temperatures.len() != expected {
            return Err(FrameError::ShapeMismatch {
                expected,
                actual: temperatures.len(),
            });
        }
        if let Some(index) = temperatures.iter().position(|t| !t.is_finite()) {
            return Err(FrameError::NonFinite { index });
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn min_temp(&self) -> f32 {
        self.min_temp
    }

    pub fn max_temp(&self) -> f32 {
        self.max_temp
    }

    pub fn temperatures(&self) -> &[f32] {
        &self.temperatures
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Temperature at a data-space pixel, `None` outside the frame.
    pub fn temperature_at(&self, x: u32, y: u32) -> Option<f32> {
        if !self.contains(x, y) {
            return None;
        }
        self.temperatures
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// Serialized frame layout shared by decoders and the HTTP bridge.
///
/// Reported bounds are optional; when absent they are derived from the samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f32>,
    pub temperatures: Vec<f32>,
}

impl TryFrom<FrameRecord> for ThermalFrame {
    type Error = FrameError;

    fn try_from(record: FrameRecord) -> FrameResult<Self> {
        ThermalFrame::validate_shape(record.width, record.height, &record.temperatures)?;
        let observed = FieldStats::of(&record.temperatures);
        let min = record
            .min_temp
            .or(observed.map(|s| s.min))
            .unwrap_or_default();
        let max = record
            .max_temp
            .or(observed.map(|s| s.max))
            .unwrap_or_default();
        ThermalFrame::new(record.width, record.height, min, max, record.temperatures)
    }
}

impl From<ThermalFrame> for FrameRecord {
    fn from(frame: ThermalFrame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            min_temp: Some(frame.min_temp),
            max_temp: Some(frame.max_temp),
            temperatures: frame.temperatures,
        }
    }
}

/// Reference handed to a decoder, with an optional device-reported max temperature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSource {
    pub reference: String,
    pub max_temp_hint: Option<f32>,
}

impl FrameSource {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            max_temp_hint: None,
        }
    }

    pub fn with_max_temp_hint(mut self, hint: f32) -> Self {
        self.max_temp_hint = Some(hint);
        self
    }
}

/// Extracts a temperature field from a source image.
pub trait FrameDecoder {
    fn decode(&self, source: &FrameSource) -> FrameResult<ThermalFrame>;
}

/// Previously persisted calibration window for a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationSeed {
    pub min_temp: f32,
    pub max_temp: f32,
}

/// Reasons a thermal frame could not be produced.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("thermal source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed thermal data: {0}")]
    Malformed(String),
    #[error("frame has empty dimensions {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("expected {expected} temperature samples, found {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("non-finite temperature at sample {index}")]
    NonFinite { index: usize },
    #[error("invalid reported bounds [{min}, {max}]")]
    InvalidBounds { min: f32, max: f32 },
}

pub type FrameResult<T> = Result<T, FrameError>;

/// Failures of the marker persistence collaborator.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("storage i/o failure: {0}")]
    Io(String),
    #[error("serialization failure: {0}")]
    Serialization(String),
    #[error("remote store rejected request: {0}")]
    Rejected(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
