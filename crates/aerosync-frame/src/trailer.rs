use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// JSON metadata appended after the mesh arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    #[serde(default)]
    pub derived: DerivedValues,
    #[serde(default)]
    pub validation: Vec<ValidationWarning>,
}

/// Values the engine computes from the design (areas, ratios, estimates).
///
/// `Default` is the all-zero record used when a frame carries no trailer.
/// Keys the client does not model are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivedValues {
    pub wing_area: f64,
    pub aspect_ratio: f64,
    pub mean_aerodynamic_chord: f64,
    pub taper_ratio: f64,
    pub horizontal_tail_volume: f64,
    pub vertical_tail_volume: f64,
    pub static_margin: f64,
    pub estimated_mass: f64,
    pub wing_loading: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Severity of a validation warning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Info,
    #[default]
    Warn,
    Error,
}

/// A rule the engine flagged for the current design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub id: String,
    #[serde(default)]
    pub level: WarningLevel,
    pub message: String,
    /// Design fields the warning refers to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}
