//! Named color gradients mapping a normalized temperature to RGB.

pub mod stops;

pub use stops::ColorStop;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in thermal palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Palette {
    #[default]
    Iron,
    Rainbow,
    WhiteHot,
    BlackHot,
    Arctic,
    Outdoor,
}

impl Palette {
    /// Catalog order shown by selection controls.
    pub const ALL: [Palette; 6] = [
        Palette::Iron,
        Palette::Rainbow,
        Palette::WhiteHot,
        Palette::BlackHot,
        Palette::Arctic,
        Palette::Outdoor,
    ];

    /// Stable identifier used in configuration and persisted records.
    pub fn id(self) -> &'static str {
        match self {
            Palette::Iron => "iron",
            Palette::Rainbow => "rainbow",
            Palette::WhiteHot => "whiteHot",
            Palette::BlackHot => "blackHot",
            Palette::Arctic => "arctic",
            Palette::Outdoor => "outdoor",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Palette::Iron => "Iron",
            Palette::Rainbow => "Rainbow",
            Palette::WhiteHot => "White Hot",
            Palette::BlackHot => "Black Hot",
            Palette::Arctic => "Arctic",
            Palette::Outdoor => "Outdoor",
        }
    }

    pub fn stops(self) -> &'static [ColorStop] {
        match self {
            Palette::Iron => stops::IRON,
            Palette::Rainbow => stops::RAINBOW,
            Palette::WhiteHot => stops::WHITE_HOT,
            Palette::BlackHot => stops::BLACK_HOT,
            Palette::Arctic => stops::ARCTIC,
            Palette::Outdoor => stops::OUTDOOR,
        }
    }

    /// Maps `value` (clamped to `[0, 1]`) onto the gradient.
    pub fn color_at(self, value: f32) -> [u8; 3] {
        color_at(value, self.stops())
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown palette '{0}'")]
pub struct UnknownPalette(pub String);

impl FromStr for Palette {
    type Err = UnknownPalette;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Palette::ALL
            .into_iter()
            .find(|palette| palette.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPalette(s.to_string()))
    }
}

/// Linear interpolation over a stop table.
///
/// Values landing exactly on a stop return that stop's color untouched.
pub fn color_at(value: f32, stops: &[ColorStop]) -> [u8; 3] {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return [0, 0, 0],
    };
    let value = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    };
    if value <= first.position {
        return first.rgb;
    }

    for pair in stops.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        if value == lo.position {
            return lo.rgb;
        }
        if value == hi.position {
            return hi.rgb;
        }
        if value < hi.position {
            let width = hi.position - lo.position;
            let t = if width > 0.0 {
                (value - lo.position) / width
            } else {
                0.0
            };
            return [
                lerp_channel(lo.rgb[0], hi.rgb[0], t),
                lerp_channel(lo.rgb[1], hi.rgb[1], t),
                lerp_channel(lo.rgb[2], hi.rgb[2], t),
            ];
        }
    }

    last.rgb
}

fn lerp_channel(from: u8, to: u8, t: f32) -> u8 {
    let from = from as f32;
    let to = to as f32;
    (from + (to - from) * t).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_palette_is_well_formed() {
        for palette in Palette::ALL {
            let stops = palette.stops();
            assert_eq!(stops.first().unwrap().position, 0.0, "{}", palette.id());
            assert_eq!(stops.last().unwrap().position, 1.0, "{}", palette.id());
            assert!(stops.windows(2).all(|w| w[0].position < w[1].position));
        }
    }

    #[test]
    fn stop_positions_return_exact_colors() {
        for palette in Palette::ALL {
            for stop in palette.stops() {
                assert_eq!(palette.color_at(stop.position), stop.rgb);
            }
        }
    }

    #[test]
    fn iron_midpoint_between_purple_and_red() {
        assert_eq!(Palette::Iron.color_at(0.5), [164, 0, 64]);
    }

    #[test]
    fn out_of_range_values_clamp_to_ends() {
        assert_eq!(Palette::WhiteHot.color_at(-3.0), [0, 0, 0]);
        assert_eq!(Palette::WhiteHot.color_at(7.5), [255, 255, 255]);
        assert_eq!(Palette::BlackHot.color_at(f32::NAN), [255, 255, 255]);
    }

    #[test]
    fn zero_width_interval_uses_lower_stop() {
        let stops = [
            ColorStop {
                position: 0.0,
                rgb: [10, 10, 10],
            },
            ColorStop {
                position: 0.0,
                rgb: [90, 90, 90],
            },
            ColorStop {
                position: 1.0,
                rgb: [200, 200, 200],
            },
        ];
        assert_eq!(color_at(0.0, &stops), [10, 10, 10]);
        assert_eq!(color_at(0.5, &stops), [145, 145, 145]);
    }

    #[test]
    fn palette_ids_round_trip_through_from_str() {
        for palette in Palette::ALL {
            assert_eq!(palette.id().parse::<Palette>().unwrap(), palette);
        }
        assert_eq!("WHITEHOT".parse::<Palette>().unwrap(), Palette::WhiteHot);
        assert!("sepia".parse::<Palette>().is_err());
    }
}
