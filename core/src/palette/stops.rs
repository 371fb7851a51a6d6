//! Gradient stop tables for the built-in palettes.
//!
//! Every table starts at position 0.0, ends at 1.0 and is strictly increasing.

/// A gradient stop: position in `[0, 1]` and an 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub position: f32,
    pub rgb: [u8; 3],
}

const fn stop(position: f32, rgb: [u8; 3]) -> ColorStop {
    ColorStop { position, rgb }
}

pub const IRON: &[ColorStop] = &[
    stop(0.0, [0, 0, 0]),
    stop(0.2, [32, 0, 96]),
    stop(0.4, [128, 0, 128]),
    stop(0.6, [200, 0, 0]),
    stop(0.8, [255, 160, 0]),
    stop(1.0, [255, 255, 255]),
];

pub const RAINBOW: &[ColorStop] = &[
    stop(0.0, [0, 0, 255]),
    stop(0.25, [0, 255, 255]),
    stop(0.5, [0, 255, 0]),
    stop(0.75, [255, 255, 0]),
    stop(1.0, [255, 0, 0]),
];

pub const WHITE_HOT: &[ColorStop] = &[stop(0.0, [0, 0, 0]), stop(1.0, [255, 255, 255])];

pub const BLACK_HOT: &[ColorStop] = &[stop(0.0, [255, 255, 255]), stop(1.0, [0, 0, 0])];

pub const ARCTIC: &[ColorStop] = &[
    stop(0.0, [0, 0, 48]),
    stop(0.35, [0, 80, 180]),
    stop(0.6, [80, 200, 255]),
    stop(0.8, [255, 200, 60]),
    stop(1.0, [255, 255, 200]),
];

pub const OUTDOOR: &[ColorStop] = &[
    stop(0.0, [0, 0, 0]),
    stop(0.3, [60, 60, 120]),
    stop(0.6, [200, 120, 40]),
    stop(0.85, [255, 200, 60]),
    stop(1.0, [255, 255, 255]),
];
