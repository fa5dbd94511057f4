#![cfg(feature = "cli")]

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};

use aerosync::frame::{encode_error_frame, encode_mesh_frame, ErrorFrame};
use bytes::BytesMut;
use serde_json::Value;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "aerosync-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn aerosync() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_aerosync"));
    cmd.arg("--log-level").arg("error").env_remove("AEROSYNC_URL");
    cmd
}

fn json_stdout(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).unwrap_or_else(|err| panic!("bad JSON {stdout:?}: {err}"))
}

/// Start the mock engine on an ephemeral port and return its URL.
fn start_engine(count: usize) -> (Child, String) {
    let mut child = aerosync()
        .args(["serve", "127.0.0.1:0", "--count", &count.to_string()])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("serve should start");
    let stdout = child.stdout.take().expect("stdout should be piped");
    let mut line = String::new();
    BufReader::new(stdout)
        .read_line(&mut line)
        .expect("serve should announce its address");
    let url = line
        .trim()
        .strip_prefix("listening on ")
        .unwrap_or_else(|| panic!("unexpected banner {line:?}"))
        .to_string();
    (child, url)
}

#[test]
fn decode_prints_mesh_summary() {
    let dir = unique_temp_dir("decode-mesh");
    let path = dir.join("mesh.bin");
    let mut buf = BytesMut::new();
    encode_mesh_frame(
        &[0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 20.0, 0.0],
        &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        &[0, 1, 2],
        None,
        &mut buf,
    )
    .unwrap();
    std::fs::write(&path, &buf).unwrap();

    let output = aerosync()
        .args(["--format", "json", "decode"])
        .arg(&path)
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(0));
    let summary = json_stdout(&output);
    assert_eq!(summary["kind"], "mesh");
    assert_eq!(summary["vertex_count"], 3);
    assert_eq!(summary["face_count"], 1);
    assert_eq!(summary["bounds"]["max"], serde_json::json!([10.0, 20.0, 0.0]));
    assert_eq!(summary["derived"]["wing_area"], 0.0);
}

#[test]
fn decode_error_frame_exits_with_failure() {
    let dir = unique_temp_dir("decode-error");
    let path = dir.join("error.bin");
    let mut buf = BytesMut::new();
    encode_error_frame(
        &ErrorFrame {
            error: "wing too thin".into(),
            detail: String::new(),
            field: Some("wing_tip_chord".into()),
        },
        &mut buf,
    )
    .unwrap();
    std::fs::write(&path, &buf).unwrap();

    let output = aerosync()
        .args(["--format", "json", "decode"])
        .arg(&path)
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(1));
    let summary = json_stdout(&output);
    assert_eq!(summary["kind"], "error");
    assert_eq!(summary["field"], "wing_tip_chord");
}

#[test]
fn decode_truncated_frame_is_data_invalid() {
    let dir = unique_temp_dir("decode-truncated");
    let path = dir.join("short.bin");
    std::fs::write(&path, [1u8, 0, 0, 0, 9, 0, 0, 0]).unwrap();

    let output = aerosync()
        .arg("decode")
        .arg(&path)
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("too short"));
}

#[test]
fn version_prints_package_version() {
    let output = aerosync().arg("version").output().expect("version should run");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("aerosync {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn push_against_mock_engine_returns_mesh() {
    let (mut engine, url) = start_engine(1);
    let dir = unique_temp_dir("push");
    let design = dir.join("design.json");
    std::fs::write(&design, r#"{"name":"Glider","wing_span":2000,"wing_root_chord":200}"#)
        .unwrap();

    let output = aerosync()
        .args(["--format", "json", "push", "--design"])
        .arg(&design)
        .arg(&url)
        .output()
        .expect("push should run");

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary = json_stdout(&output);
    assert_eq!(summary["kind"], "mesh");
    assert_eq!(summary["vertex_count"], 4);
    assert_eq!(summary["derived"]["aspect_ratio"], 10.0);

    let status = engine.wait().expect("engine should exit after one answer");
    assert!(status.success());
}

#[test]
fn replay_drives_sync_engine_against_mock_engine() {
    let (mut engine, url) = start_engine(100);
    let dir = unique_temp_dir("replay");
    let script = dir.join("edits.jsonl");
    std::fs::write(
        &script,
        [
            r#"{"op":"set","field":"wing_span","value":1500}"#,
            r#"{"op":"set","field":"wing_root_chord","value":250}"#,
            r#"{"op":"undo"}"#,
            r#"{"op":"rename","name":"Trainer"}"#,
        ]
        .join("\n"),
    )
    .unwrap();

    let output = aerosync()
        .args(["--format", "json", "replay", "--script"])
        .arg(&script)
        .arg(&url)
        .output()
        .expect("replay should run");

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let view = json_stdout(&output);
    assert_eq!(view["design"]["name"], "Trainer");
    assert_eq!(view["design"]["wing_span"], 1500.0);
    assert_eq!(view["design"]["wing_root_chord"], 220.0);
    assert_eq!(view["is_generating"], false);
    assert_eq!(view["history_position"], 1);
    assert_eq!(
        view["history"],
        serde_json::json!([
            "Initial design",
            "Set Wingspan to 1500",
            "Set Root Chord to 250"
        ])
    );

    let _ = engine.kill();
    let _ = engine.wait();
}

#[test]
fn push_to_closed_port_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let output = aerosync()
        .args(["push", &format!("ws://{addr}/ws/preview")])
        .output()
        .expect("push should run");

    assert_eq!(output.status.code(), Some(3));
}
