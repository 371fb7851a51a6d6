use serde::{Deserialize, Serialize};
use thermcore::prelude::{CalibrationSeed, ThermalFrame};
use thermcore::Palette;

/// Everything a viewer needs to open a measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementPayload {
    pub measurement_id: String,
    pub frame: ThermalFrame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationSeed>,
    #[serde(default)]
    pub palette: Palette,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveReceipt {
    pub status: String,
    pub count: usize,
}
