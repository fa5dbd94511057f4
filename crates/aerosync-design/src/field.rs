//! Catalog of editable design fields.
//!
//! Field names are the wire keys of the outbound snapshot JSON.

use crate::error::{DesignError, Result};
use crate::snapshot::FieldValue;

/// Panel a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    Wing,
    Tail,
    Fuselage,
    ControlSurfaces,
    Propulsion,
    Print,
}

/// Value kind and default of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Number {
        default: f64,
    },
    Toggle {
        default: bool,
    },
    Choice {
        options: &'static [&'static str],
        default: &'static str,
    },
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Number { .. } => "number",
            Self::Toggle { .. } => "toggle",
            Self::Choice { .. } => "choice",
        }
    }
}

/// One editable field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Display label used in history entries.
    pub label: &'static str,
    pub group: FieldGroup,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Number { default } => FieldValue::Number(default),
            FieldKind::Toggle { default } => FieldValue::Toggle(default),
            FieldKind::Choice { default, .. } => FieldValue::Choice(default.to_string()),
        }
    }

    /// Check that `value` is acceptable for this field.
    pub fn check(&self, value: &FieldValue) -> Result<()> {
        match (&self.kind, value) {
            (FieldKind::Number { .. }, FieldValue::Number(v)) => {
                if v.is_finite() {
                    Ok(())
                } else {
                    Err(DesignError::NotFinite {
                        field: self.name.to_string(),
                    })
                }
            }
            (FieldKind::Toggle { .. }, FieldValue::Toggle(_)) => Ok(()),
            (FieldKind::Choice { options, .. }, FieldValue::Choice(choice)) => {
                if options.contains(&choice.as_str()) {
                    Ok(())
                } else {
                    Err(DesignError::InvalidChoice {
                        field: self.name.to_string(),
                        value: choice.clone(),
                    })
                }
            }
            (kind, value) => Err(DesignError::KindMismatch {
                field: self.name.to_string(),
                expected: kind.name(),
                found: value.kind_name(),
            }),
        }
    }

    /// History label for setting this field, e.g. `Set Wingspan to 1300`.
    pub fn set_label(&self, value: &FieldValue) -> String {
        format!("Set {} to {}", self.label, value)
    }
}

/// Look up a field by wire name.
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.name == name)
}

const fn number(name: &'static str, label: &'static str, group: FieldGroup, default: f64) -> FieldSpec {
    FieldSpec {
        name,
        label,
        group,
        kind: FieldKind::Number { default },
    }
}

const fn toggle(name: &'static str, label: &'static str, group: FieldGroup, default: bool) -> FieldSpec {
    FieldSpec {
        name,
        label,
        group,
        kind: FieldKind::Toggle { default },
    }
}

const fn choice(
    name: &'static str,
    label: &'static str,
    group: FieldGroup,
    options: &'static [&'static str],
    default: &'static str,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        group,
        kind: FieldKind::Choice { options, default },
    }
}

use FieldGroup::{ControlSurfaces, Fuselage, Print, Propulsion, Tail, Wing};

/// Every editable field, in panel order. Lengths in millimetres, angles in
/// degrees, masses in grams, fractions in 0..1.
pub static FIELDS: &[FieldSpec] = &[
    // Wing
    number("wing_span", "Wingspan", Wing, 1200.0),
    number("wing_root_chord", "Root Chord", Wing, 220.0),
    number("wing_tip_chord", "Tip Chord", Wing, 150.0),
    number("wing_sweep", "Sweep", Wing, 0.0),
    number("wing_dihedral", "Dihedral", Wing, 3.0),
    number("wing_incidence", "Wing Incidence", Wing, 2.0),
    number("wing_twist", "Washout", Wing, -2.0),
    number("wing_sections", "Wing Sections", Wing, 4.0),
    choice(
        "wing_airfoil",
        "Wing Airfoil",
        Wing,
        &["clark_y", "naca2412", "naca4412", "e387", "sd7037"],
        "clark_y",
    ),
    choice("wing_position", "Wing Position", Wing, &["high", "mid", "low"], "high"),
    // Tail
    choice(
        "tail_type",
        "Tail Type",
        Tail,
        &["conventional", "t_tail", "v_tail"],
        "conventional",
    ),
    number("tail_arm", "Tail Arm", Tail, 650.0),
    number("h_stab_span", "Stabilizer Span", Tail, 400.0),
    number("h_stab_chord", "Stabilizer Chord", Tail, 120.0),
    number("h_stab_incidence", "Stabilizer Incidence", Tail, 0.0),
    number("v_stab_height", "Fin Height", Tail, 150.0),
    number("v_stab_root_chord", "Fin Root Chord", Tail, 140.0),
    number("v_stab_tip_chord", "Fin Tip Chord", Tail, 80.0),
    number("v_tail_angle", "V-Tail Angle", Tail, 110.0),
    choice(
        "tail_airfoil",
        "Tail Airfoil",
        Tail,
        &["flat_plate", "naca0006", "naca0009"],
        "naca0009",
    ),
    // Fuselage
    choice(
        "fuselage_shape",
        "Fuselage Shape",
        Fuselage,
        &["round", "square", "pod_boom"],
        "round",
    ),
    number("fuselage_length", "Fuselage Length", Fuselage, 900.0),
    number("fuselage_width", "Fuselage Width", Fuselage, 80.0),
    number("fuselage_height", "Fuselage Height", Fuselage, 90.0),
    number("nose_length", "Nose Length", Fuselage, 150.0),
    number("tail_cone_length", "Tail Cone Length", Fuselage, 300.0),
    number("wing_mount_position", "Wing Mount Position", Fuselage, 0.3),
    number("battery_position", "Battery Position", Fuselage, 0.25),
    // Control surfaces
    toggle("has_ailerons", "Ailerons", ControlSurfaces, true),
    number("aileron_span_fraction", "Aileron Span", ControlSurfaces, 0.4),
    number("aileron_chord_fraction", "Aileron Chord", ControlSurfaces, 0.25),
    toggle("has_flaps", "Flaps", ControlSurfaces, false),
    number("flap_span_fraction", "Flap Span", ControlSurfaces, 0.3),
    toggle("has_elevator", "Elevator", ControlSurfaces, true),
    number("elevator_chord_fraction", "Elevator Chord", ControlSurfaces, 0.3),
    toggle("has_rudder", "Rudder", ControlSurfaces, true),
    number("rudder_chord_fraction", "Rudder Chord", ControlSurfaces, 0.35),
    number("hinge_gap", "Hinge Gap", ControlSurfaces, 0.4),
    // Propulsion
    choice(
        "motor_position",
        "Motor Position",
        Propulsion,
        &["nose", "pusher", "twin"],
        "nose",
    ),
    number("prop_diameter", "Prop Diameter", Propulsion, 228.0),
    number("motor_mass", "Motor Mass", Propulsion, 60.0),
    number("battery_mass", "Battery Mass", Propulsion, 180.0),
    number("motor_thrust_angle", "Thrust Angle", Propulsion, 2.0),
    // Print / export
    number("print_bed_x", "Bed Width", Print, 220.0),
    number("print_bed_y", "Bed Depth", Print, 220.0),
    number("print_bed_z", "Bed Height", Print, 250.0),
    number("nozzle_diameter", "Nozzle Diameter", Print, 0.4),
    number("layer_height", "Layer Height", Print, 0.2),
    number("wall_thickness", "Wall Thickness", Print, 0.8),
    number("rib_spacing", "Rib Spacing", Print, 60.0),
    number("spar_diameter", "Spar Diameter", Print, 6.0),
    choice("joint_type", "Joint Type", Print, &["pin", "dovetail", "flush"], "pin"),
    number("joint_tolerance", "Joint Tolerance", Print, 0.15),
    toggle("hollow_surfaces", "Hollow Surfaces", Print, true),
    toggle("support_enabled", "Supports", Print, false),
];
