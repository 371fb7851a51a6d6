use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_ELEMENT_TYPE: &str = "Electrical Asset";

/// Session-local marker identity. Not persisted; reassigned on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Point annotation anchored to a frame pixel.
///
/// `temperature` is captured when the marker is placed and never recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub x: u32,
    pub y: u32,
    pub temperature: f32,
    pub element_type: String,
    pub final_action: String,
    /// Index this marker had in the last load or save, if any.
    pub persisted_index: Option<u32>,
}

/// Partial edit of a marker's classification fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPatch {
    pub element_type: Option<String>,
    pub final_action: Option<String>,
}

impl MarkerPatch {
    pub fn element_type(value: impl Into<String>) -> Self {
        Self {
            element_type: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn final_action(value: impl Into<String>) -> Self {
        Self {
            final_action: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn apply(self, marker: &mut Marker) {
        if let Some(element_type) = self.element_type {
            marker.element_type = element_type;
        }
        if let Some(final_action) = self.final_action {
            marker.final_action = final_action;
        }
    }
}

/// Marker record as exchanged with the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedMarker {
    pub index: u32,
    pub x: u32,
    pub y: u32,
    pub temperature: f32,
    pub element_type: String,
    #[serde(default)]
    pub final_action: String,
}
