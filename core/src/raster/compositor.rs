use crate::palette::Palette;
use crate::prelude::ThermalFrame;
use crate::raster::buffer_pool::BufferPool;
use crate::telemetry::log::LogManager;
use crate::view::calibration::CalibrationRange;

/// RGBA8 raster, row-major, alpha always opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Normalizes a temperature into the calibration window.
///
/// A degenerate window maps everything to the palette midpoint.
pub fn normalize(temperature: f32, range: CalibrationRange) -> f32 {
    if range.max > range.min {
        ((temperature - range.min) / (range.max - range.min)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Full recompute of the raster for a frame, palette and calibration window.
pub fn render(frame: &ThermalFrame, palette: Palette, range: CalibrationRange) -> PixelBuffer {
    let mut data = vec![0; frame.temperatures().len() * 4];
    fill(&mut data, frame, palette, range);
    PixelBuffer {
        width: frame.width(),
        height: frame.height(),
        data,
    }
}

fn fill(data: &mut [u8], frame: &ThermalFrame, palette: Palette, range: CalibrationRange) {
    for (px, &temperature) in data.chunks_exact_mut(4).zip(frame.temperatures()) {
        let [r, g, b] = palette.color_at(normalize(temperature, range));
        px.copy_from_slice(&[r, g, b, 255]);
    }
}

/// Renders rasters into recycled buffers.
pub struct Compositor {
    pool: BufferPool,
    logger: LogManager,
}

impl Compositor {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool: BufferPool::with_capacity(pool_size),
            logger: LogManager::new(),
        }
    }

    pub fn render(
        &mut self,
        frame: &ThermalFrame,
        palette: Palette,
        range: CalibrationRange,
    ) -> PixelBuffer {
        let mut data = self.pool.checkout(frame.temperatures().len() * 4);
        fill(&mut data, frame, palette, range);
        self.logger.record(&format!(
            "composited {}x{} raster with {} over [{:.1}, {:.1}]",
            frame.width(),
            frame.height(),
            palette.id(),
            range.min,
            range.max
        ));
        PixelBuffer {
            width: frame.width(),
            height: frame.height(),
            data,
        }
    }

    /// Gives a superseded raster's storage back to the pool.
    pub fn recycle(&mut self, buffer: PixelBuffer) {
        self.pool.release(buffer.data);
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(2)
    }
}
