use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, Result};
use crate::field::{field, FIELDS};

/// Value of one design field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Toggle(bool),
    Number(f64),
    Choice(String),
}

impl FieldValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Toggle(_) => "toggle",
            Self::Number(_) => "number",
            Self::Choice(_) => "choice",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }
}

// Numbers compare by bit pattern so equality is exact and reflexive.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Toggle(a), Self::Toggle(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::Choice(a), Self::Choice(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toggle(true) => f.write_str("on"),
            Self::Toggle(false) => f.write_str("off"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Choice(c) => f.write_str(c),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Toggle(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Choice(value.to_string())
    }
}

/// The design fields of a snapshot, without meta fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct DesignPayload(BTreeMap<String, FieldValue>);

impl DesignPayload {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A full copy of the design at one instant.
///
/// `id` and `name` are meta fields: they travel with the snapshot but are
/// ignored by [`DesignSnapshot::same_design`].
#[derive(Debug, Clone, Serialize)]
pub struct DesignSnapshot {
    id: String,
    name: String,
    #[serde(flatten)]
    payload: DesignPayload,
}

impl DesignSnapshot {
    /// A design with every field at its default and a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        let payload = FIELDS
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default_value()))
            .collect();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            payload: DesignPayload(payload),
        }
    }

    /// Parse a design document, overlaying it onto the defaults.
    ///
    /// Missing fields keep their defaults; unknown fields are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value.as_object().ok_or(DesignError::NotAnObject)?;

        let mut snapshot = Self::new("Untitled");
        for (key, raw) in object {
            match key.as_str() {
                "id" => {
                    if let Some(id) = raw.as_str() {
                        snapshot.id = id.to_string();
                    }
                }
                "name" => {
                    if let Some(name) = raw.as_str() {
                        snapshot.name = name.to_string();
                    }
                }
                _ => {
                    let value: FieldValue = serde_json::from_value(raw.clone())?;
                    snapshot.set_field(key, value)?;
                }
            }
        }
        Ok(snapshot)
    }

    /// Serialize as the flat JSON object the engine expects.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &DesignPayload {
        &self.payload
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.payload.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    /// Set one field. Returns whether the payload changed.
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<bool> {
        let spec = field(name).ok_or_else(|| DesignError::UnknownField(name.to_string()))?;
        spec.check(&value)?;
        if self.payload.0.get(name) == Some(&value) {
            return Ok(false);
        }
        self.payload.0.insert(spec.name.to_string(), value);
        Ok(true)
    }

    /// Change the user-visible name. Meta only.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Copy of `self` carrying `other`'s design payload and `self`'s meta.
    pub fn with_payload_of(&self, other: &DesignSnapshot) -> DesignSnapshot {
        DesignSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            payload: other.payload.clone(),
        }
    }

    /// True when both snapshots describe the same design, ignoring meta.
    pub fn same_design(&self, other: &DesignSnapshot) -> bool {
        self.payload == other.payload
    }
}

impl Default for DesignSnapshot {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snapshot_has_every_field() {
        let snapshot = DesignSnapshot::new("Trainer");
        assert_eq!(snapshot.payload().len(), FIELDS.len());
        assert_eq!(snapshot.number("wing_span"), Some(1200.0));
        assert_eq!(snapshot.name(), "Trainer");
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(DesignSnapshot::default().id(), DesignSnapshot::default().id());
    }

    #[test]
    fn same_design_ignores_meta() {
        let a = DesignSnapshot::new("A");
        let mut b = DesignSnapshot::new("B");
        assert!(a.same_design(&b));

        b.set_field("wing_span", 1300.0.into()).unwrap();
        assert!(!a.same_design(&b));
    }

    #[test]
    fn set_field_reports_change() {
        let mut snapshot = DesignSnapshot::default();
        assert!(snapshot.set_field("has_flaps", true.into()).unwrap());
        assert!(!snapshot.set_field("has_flaps", true.into()).unwrap());
        assert!(matches!(
            snapshot.set_field("wing_area", 1.0.into()),
            Err(DesignError::UnknownField(_))
        ));
    }

    #[test]
    fn negative_zero_is_a_distinct_value() {
        let mut snapshot = DesignSnapshot::default();
        snapshot.set_field("wing_sweep", 0.0.into()).unwrap();
        assert!(snapshot.set_field("wing_sweep", (-0.0).into()).unwrap());
    }

    #[test]
    fn json_is_flat_with_meta() {
        let snapshot = DesignSnapshot::new("Glider");
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(value["name"], "Glider");
        assert_eq!(value["id"], snapshot.id());
        assert_eq!(value["wing_span"], 1200.0);
        assert_eq!(value["has_ailerons"], true);
        assert_eq!(value["tail_type"], "conventional");
    }

    #[test]
    fn from_json_overlays_defaults() {
        let snapshot = DesignSnapshot::from_json(
            r#"{"name":"Racer","wing_span":900,"tail_type":"v_tail","has_flaps":true}"#,
        )
        .unwrap();

        assert_eq!(snapshot.name(), "Racer");
        assert_eq!(snapshot.number("wing_span"), Some(900.0));
        assert_eq!(snapshot.get("tail_type"), Some(&FieldValue::from("v_tail")));
        assert_eq!(snapshot.get("has_flaps"), Some(&FieldValue::Toggle(true)));
        assert_eq!(snapshot.number("wing_root_chord"), Some(220.0));
    }

    #[test]
    fn from_json_rejects_bad_documents() {
        assert!(matches!(
            DesignSnapshot::from_json("[1,2]"),
            Err(DesignError::NotAnObject)
        ));
        assert!(matches!(
            DesignSnapshot::from_json(r#"{"wing_span":"wide"}"#),
            Err(DesignError::KindMismatch { .. })
        ));
        assert!(matches!(
            DesignSnapshot::from_json(r#"{"canopy":true}"#),
            Err(DesignError::UnknownField(_))
        ));
    }

    #[test]
    fn with_payload_of_keeps_meta() {
        let current = DesignSnapshot::new("Current");
        let mut older = DesignSnapshot::new("Older");
        older.set_field("wing_span", 1500.0.into()).unwrap();

        let restored = current.with_payload_of(&older);
        assert_eq!(restored.id(), current.id());
        assert_eq!(restored.name(), "Current");
        assert!(restored.same_design(&older));
    }
}
