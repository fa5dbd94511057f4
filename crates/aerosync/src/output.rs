use std::io::IsTerminal;

use aerosync_frame::{DerivedValues, ErrorFrame, Frame, MeshFrame, ValidationWarning};
use aerosync_sync::SyncView;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MeshOutput<'a> {
    kind: &'static str,
    vertex_count: u32,
    face_count: u32,
    bounds: Option<Bounds>,
    derived: &'a DerivedValues,
    validation: &'a [ValidationWarning],
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    kind: &'static str,
    #[serde(flatten)]
    error: &'a ErrorFrame,
}

/// Axis-aligned bounding box of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    pub fn of(mesh: &MeshFrame) -> Option<Self> {
        let mut triples = mesh.vertices.triples();
        let first = triples.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for point in triples {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(point[axis]);
                bounds.max[axis] = bounds.max[axis].max(point[axis]);
            }
        }
        Some(bounds)
    }

    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

pub fn print_frame(frame: &Frame, format: OutputFormat) {
    match frame {
        Frame::Mesh(mesh) => print_mesh(mesh, format),
        Frame::Error(error) => print_engine_error(error, format),
    }
}

pub fn print_mesh(mesh: &MeshFrame, format: OutputFormat) {
    let bounds = Bounds::of(mesh);
    match format {
        OutputFormat::Json => {
            let out = MeshOutput {
                kind: "mesh",
                vertex_count: mesh.vertex_count,
                face_count: mesh.face_count,
                bounds,
                derived: &mesh.derived,
                validation: &mesh.validation,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = key_value_table();
            table.add_row(vec!["vertices".to_string(), mesh.vertex_count.to_string()]);
            table.add_row(vec!["faces".to_string(), mesh.face_count.to_string()]);
            if let Some(bounds) = bounds {
                table.add_row(vec!["size".to_string(), format_size(&bounds)]);
            }
            add_derived_rows(&mut table, &mesh.derived);
            println!("{table}");
            print_warnings_table(&mesh.validation);
        }
        OutputFormat::Pretty => {
            println!(
                "mesh vertices={} faces={} size={} wing_area={} aspect_ratio={} warnings={}",
                mesh.vertex_count,
                mesh.face_count,
                bounds.map_or_else(|| "-".to_string(), |b| format_size(&b)),
                mesh.derived.wing_area,
                mesh.derived.aspect_ratio,
                mesh.validation.len()
            );
            for warning in &mesh.validation {
                println!("  [{:?}] {}: {}", warning.level, warning.id, warning.message);
            }
        }
    }
}

pub fn print_engine_error(error: &ErrorFrame, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ErrorOutput {
            kind: "error",
            error,
        }),
        OutputFormat::Table => {
            let mut table = key_value_table();
            table.add_row(vec!["error".to_string(), error.error.clone()]);
            table.add_row(vec!["detail".to_string(), error.detail.clone()]);
            table.add_row(vec![
                "field".to_string(),
                error.field.clone().unwrap_or_else(|| "-".to_string()),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "error field={} {}: {}",
                error.field.as_deref().unwrap_or("-"),
                error.error,
                error.detail
            );
        }
    }
}

pub fn print_view(view: &SyncView, format: OutputFormat) {
    let (labels, position) = view.history_labels();
    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "design": &*view.design,
                "connection": &view.connection,
                "is_generating": view.is_generating,
                "mesh": view.mesh.as_ref().map(|mesh| serde_json::json!({
                    "vertex_count": mesh.vertex_count,
                    "face_count": mesh.face_count,
                    "bounds": Bounds::of(mesh),
                })),
                "derived": &view.derived,
                "validation": &view.validation,
                "engine_error": &view.engine_error,
                "history": labels,
                "history_position": position,
            });
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = key_value_table();
            table.add_row(vec!["design".to_string(), view.design.name().to_string()]);
            table.add_row(vec![
                "connection".to_string(),
                view.connection.state.to_string(),
            ]);
            table.add_row(vec![
                "generating".to_string(),
                view.is_generating.to_string(),
            ]);
            let mesh = view.mesh.as_ref().map_or_else(
                || "-".to_string(),
                |mesh| format!("{} vertices, {} faces", mesh.vertex_count, mesh.face_count),
            );
            table.add_row(vec!["mesh".to_string(), mesh]);
            if let Some(error) = &view.engine_error {
                table.add_row(vec!["engine error".to_string(), error.error.clone()]);
            }
            add_derived_rows(&mut table, &view.derived);
            println!("{table}");

            let mut history = Table::new();
            history
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "", "HISTORY"]);
            for (index, label) in labels.iter().enumerate() {
                let marker = if index == position { ">" } else { "" };
                history.add_row(vec![index.to_string(), marker.to_string(), label.to_string()]);
            }
            println!("{history}");
            print_warnings_table(&view.validation);
        }
        OutputFormat::Pretty => {
            println!(
                "design={} connection={} generating={} mesh={} history={}/{}",
                view.design.name(),
                view.connection.state,
                view.is_generating,
                view.mesh
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |m| m.vertex_count.to_string()),
                position + 1,
                labels.len()
            );
            for (index, label) in labels.iter().enumerate() {
                let marker = if index == position { '>' } else { ' ' };
                println!("  {marker} {label}");
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn key_value_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["KEY", "VALUE"]);
    table
}

fn add_derived_rows(table: &mut Table, derived: &DerivedValues) {
    let rows = [
        ("wing area", derived.wing_area),
        ("aspect ratio", derived.aspect_ratio),
        ("MAC", derived.mean_aerodynamic_chord),
        ("taper ratio", derived.taper_ratio),
        ("static margin", derived.static_margin),
        ("mass", derived.estimated_mass),
        ("wing loading", derived.wing_loading),
    ];
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), format!("{value:.3}")]);
    }
}

fn print_warnings_table(warnings: &[ValidationWarning]) {
    if warnings.is_empty() {
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["LEVEL", "ID", "MESSAGE", "FIELDS"]);
    for warning in warnings {
        table.add_row(vec![
            format!("{:?}", warning.level).to_lowercase(),
            warning.id.clone(),
            warning.message.clone(),
            warning.fields.join(", "),
        ]);
    }
    println!("{table}");
}

fn format_size(bounds: &Bounds) -> String {
    let [x, y, z] = bounds.size();
    format!("{x:.1} x {y:.1} x {z:.1}")
}
