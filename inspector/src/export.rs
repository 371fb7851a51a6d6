use anyhow::Context;
use image::{ImageFormat, Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use thermcore::annotation::MarkerStore;
use thermcore::raster::PixelBuffer;

const MARKER_COLOR: Rgba<u8> = Rgba([0, 255, 64, 255]);
const MARKER_OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Upscales the raster with nearest-neighbor sampling so every thermal sample
/// stays a solid block, then draws a crosshair on each marker.
pub fn annotated_image(
    raster: &PixelBuffer,
    markers: &MarkerStore,
    scale: u32,
) -> anyhow::Result<RgbaImage> {
    let base = RgbaImage::from_raw(raster.width(), raster.height(), raster.as_bytes().to_vec())
        .context("raster buffer does not match its dimensions")?;
    let scale = scale.max(1);
    let mut image = RgbaImage::from_fn(raster.width() * scale, raster.height() * scale, |x, y| {
        *base.get_pixel(x / scale, y / scale)
    });

    let arm = (scale * 2).max(3) as i64;
    for marker in markers.iter() {
        let cx = (marker.x * scale + scale / 2) as i64;
        let cy = (marker.y * scale + scale / 2) as i64;
        draw_crosshair(&mut image, cx, cy, arm);
    }
    Ok(image)
}

fn draw_crosshair(image: &mut RgbaImage, cx: i64, cy: i64, arm: i64) {
    for d in -arm..=arm {
        for (x, y) in [(cx + d, cy), (cx, cy + d)] {
            put(image, x, y - 1, MARKER_OUTLINE);
            put(image, x - 1, y, MARKER_OUTLINE);
        }
    }
    for d in -arm..=arm {
        put(image, cx + d, cy, MARKER_COLOR);
        put(image, cx, cy + d, MARKER_COLOR);
    }
}

fn put(image: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}

pub fn write_png(path: &Path, image: &RgbaImage) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermcore::prelude::ThermalFrame;
    use thermcore::raster::render;
    use thermcore::view::CalibrationRange;
    use thermcore::Palette;

    fn raster() -> PixelBuffer {
        let frame = ThermalFrame::from_samples(3, 2, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();
        render(
            &frame,
            Palette::WhiteHot,
            CalibrationRange {
                min: 0.0,
                max: 50.0,
            },
        )
    }

    #[test]
    fn nearest_upscale_keeps_blocks_solid() {
        let image = annotated_image(&raster(), &MarkerStore::new(), 4).unwrap();
        assert_eq!(image.dimensions(), (12, 8));
        let block = *image.get_pixel(4, 0);
        for y in 0..4 {
            for x in 4..8 {
                assert_eq!(*image.get_pixel(x, y), block);
            }
        }
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn markers_are_drawn_at_block_centers() {
        let mut markers = MarkerStore::new();
        markers.add(2, 1, 50.0);
        let image = annotated_image(&raster(), &markers, 4).unwrap();
        assert_eq!(*image.get_pixel(10, 6), MARKER_COLOR);
    }

    #[test]
    fn png_is_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("frame.png");
        let image = annotated_image(&raster(), &MarkerStore::new(), 1).unwrap();
        write_png(&path, &image).unwrap();
        assert!(path.exists());
    }
}
