//! Thermal image visualization and annotation engine.
//!
//! Decoded temperature fields are mapped through calibrated palettes into
//! RGBA rasters, viewed through a pan/zoom viewport with exact
//! pointer-to-temperature lookup, and annotated with ordered markers that
//! round-trip through a persistence collaborator.

pub mod annotation;
pub mod math;
pub mod palette;
pub mod prelude;
pub mod raster;
pub mod telemetry;
pub mod view;

pub use palette::Palette;
pub use prelude::{
    CalibrationSeed, FrameDecoder, FrameError, FrameSource, PersistenceError, ThermalFrame,
};
pub use view::InspectionSession;
