use crate::generator::template::gaussian;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use thermcore::prelude::{
    FrameDecoder, FrameError, FrameRecord, FrameResult, FrameSource, ThermalFrame,
};

/// Parameters of a synthetic thermal scene: ambient field plus hot spots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub width: u32,
    pub height: u32,
    pub ambient: f32,
    pub hotspots: usize,
    pub peak_rise: f32,
    pub noise: f32,
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 120,
            ambient: 22.0,
            hotspots: 3,
            peak_rise: 45.0,
            noise: 0.4,
            seed: 7,
        }
    }
}

fn build_temperature_field(config: &SceneConfig) -> FrameResult<Vec<f32>> {
    let width = config.width.max(1);
    let height = config.height.max(1);
    let sample_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| FrameError::Malformed("scene dimensions overflow".into()))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let spots: Vec<(f32, f32, f32, f32)> = (0..config.hotspots)
        .map(|_| {
            let cx = rng.gen_range(0.0..width as f32);
            let cy = rng.gen_range(0.0..height as f32);
            let radius = rng.gen_range(2.0..(width.min(height) as f32 / 6.0).max(3.0));
            let rise = config.peak_rise * rng.gen_range(0.4..1.0);
            (cx, cy, radius, rise)
        })
        .collect();

    let mut samples = Vec::with_capacity(sample_count);
    for y in 0..height {
        for x in 0..width {
            let heat: f32 = spots
                .iter()
                .map(|&(cx, cy, radius, rise)| rise * gaussian(x as f32 - cx, y as f32 - cy, radius))
                .sum();
            let jitter = if config.noise > 0.0 {
                rng.gen_range(-config.noise..config.noise)
            } else {
                0.0
            };
            samples.push(config.ambient + heat + jitter);
        }
    }

    Ok(samples)
}

/// Decoder that ignores the source reference and synthesizes a scene.
pub struct SceneGenerator {
    config: SceneConfig,
}

impl SceneGenerator {
    pub fn new(config: SceneConfig) -> Self {
        Self { config }
    }
}

impl FrameDecoder for SceneGenerator {
    fn decode(&self, source: &FrameSource) -> FrameResult<ThermalFrame> {
        let temperatures = build_temperature_field(&self.config)?;
        ThermalFrame::try_from(FrameRecord {
            width: self.config.width.max(1),
            height: self.config.height.max(1),
            min_temp: None,
            max_temp: source.max_temp_hint,
            temperatures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_builds_expected_sample_count() {
        let frame = SceneGenerator::new(SceneConfig::default())
            .decode(&FrameSource::new("synthetic"))
            .unwrap();
        assert_eq!(frame.temperatures().len(), 160 * 120);
        assert!(frame.min_temp() < frame.max_temp());
    }

    #[test]
    fn same_seed_reproduces_scene() {
        let config = SceneConfig {
            width: 24,
            height: 16,
            seed: 13,
            ..Default::default()
        };
        let source = FrameSource::new("synthetic");
        let a = SceneGenerator::new(config.clone()).decode(&source).unwrap();
        let b = SceneGenerator::new(config).decode(&source).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn flat_scene_without_spots_or_noise() {
        let config = SceneConfig {
            width: 4,
            height: 3,
            hotspots: 0,
            noise: 0.0,
            ..Default::default()
        };
        let frame = SceneGenerator::new(config)
            .decode(&FrameSource::new("synthetic").with_max_temp_hint(90.0))
            .unwrap();
        assert!(frame.temperatures().iter().all(|&t| t == 22.0));
        assert_eq!(frame.max_temp(), 90.0);
    }
}
