pub mod calibration;
pub mod interaction;
pub mod session;
pub mod viewport;

pub use calibration::{
    CalibrationController, CalibrationMode, CalibrationRange, CALIBRATION_EPSILON,
};
pub use interaction::{CalibrationHandle, HoverInfo, InteractionController, InteractionMode};
pub use session::InspectionSession;
pub use viewport::{ContainerSize, Viewport, ViewportState};
