use std::net::SocketAddr;

use aerosync_design::{DesignError, DesignSnapshot};
use aerosync_frame::{
    encode_error_frame, encode_mesh_frame, DerivedValues, ErrorFrame, FrameError, Trailer,
    ValidationWarning, WarningLevel,
};
use bytes::{Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::cmd::{block_on, ServeArgs};
use crate::exit::{io_error, CliResult, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    block_on(serve(args))?
}

async fn serve(args: ServeArgs) -> CliResult<i32> {
    let listener = TcpListener::bind(&args.addr)
        .await
        .map_err(|err| io_error(&format!("failed binding {}", args.addr), err))?;
    let local = listener
        .local_addr()
        .map_err(|err| io_error("failed reading bound address", err))?;
    println!("listening on ws://{local}/ws/preview");

    let (answered_tx, mut answered_rx) = mpsc::unbounded_channel();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut answered = 0usize;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("interrupted; stopping");
                break;
            }
            accepted = listener.accept() => {
                let (tcp, peer) = accepted.map_err(|err| io_error("accept failed", err))?;
                tokio::spawn(handle_client(tcp, peer, answered_tx.clone()));
            }
            Some(()) = answered_rx.recv() => {
                answered += 1;
                if args.count.is_some_and(|count| answered >= count) {
                    info!(answered, "answer limit reached; stopping");
                    break;
                }
            }
        }
    }

    Ok(SUCCESS)
}

async fn handle_client(tcp: TcpStream, peer: SocketAddr, answered: mpsc::UnboundedSender<()>) {
    let mut ws = match tokio_tungstenite::accept_async(tcp).await {
        Ok(ws) => ws,
        Err(err) => {
            warn!(%peer, error = %err, "websocket handshake failed");
            return;
        }
    };
    info!(%peer, "client connected");

    while let Some(message) = ws.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                debug!(%peer, error = %err, "read failed");
                break;
            }
        };

        let reply = match respond(text.as_str()) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%peer, error = %err, "failed to build reply");
                continue;
            }
        };
        if let Err(err) = ws.send(Message::Binary(reply)).await {
            debug!(%peer, error = %err, "write failed");
            break;
        }
        let _ = answered.send(());
    }

    info!(%peer, "client disconnected");
}

/// Answer one snapshot with a mesh frame, or an error frame when the design
/// cannot be built.
fn respond(text: &str) -> Result<Bytes, FrameError> {
    let mut buf = BytesMut::new();
    let plate = DesignSnapshot::from_json(text)
        .map_err(|err| ErrorFrame {
            error: "invalid design".to_string(),
            field: error_field(&err),
            detail: err.to_string(),
        })
        .and_then(|design| WingPlate::build(&design));

    match plate {
        Ok(plate) => encode_mesh_frame(
            &plate.vertices,
            &plate.normals,
            &plate.indices,
            Some(&plate.trailer),
            &mut buf,
        )?,
        Err(error) => {
            debug!(error = %error.error, "answering with error frame");
            encode_error_frame(&error, &mut buf)?
        }
    }
    Ok(buf.freeze())
}

fn error_field(err: &DesignError) -> Option<String> {
    match err {
        DesignError::UnknownField(field)
        | DesignError::KindMismatch { field, .. }
        | DesignError::NotFinite { field }
        | DesignError::InvalidChoice { field, .. } => Some(field.clone()),
        DesignError::NotAnObject | DesignError::Json(_) => None,
    }
}

/// Flat rectangular wing in the XY plane: chord along X, span along Y,
/// lengths in millimetres.
struct WingPlate {
    vertices: Vec<f32>,
    normals: Vec<f32>,
    indices: Vec<u32>,
    trailer: Trailer,
}

impl WingPlate {
    fn build(design: &DesignSnapshot) -> Result<Self, ErrorFrame> {
        let span = positive(design, "wing_span")?;
        let chord = positive(design, "wing_root_chord")?;

        let half = (span / 2.0) as f32;
        let c = chord as f32;
        let vertices = vec![
            0.0, -half, 0.0, //
            c, -half, 0.0, //
            c, half, 0.0, //
            0.0, half, 0.0,
        ];
        let normals = [0.0f32, 0.0, 1.0].repeat(4);
        let indices = vec![0, 1, 2, 0, 2, 3];

        let aspect_ratio = span / chord;
        let derived = DerivedValues {
            wing_area: span * chord / 1_000_000.0,
            aspect_ratio,
            mean_aerodynamic_chord: chord,
            taper_ratio: 1.0,
            ..DerivedValues::default()
        };

        let mut validation = Vec::new();
        if aspect_ratio > 15.0 {
            validation.push(ValidationWarning {
                id: "high_aspect_ratio".to_string(),
                level: WarningLevel::Warn,
                message: format!("aspect ratio {aspect_ratio:.1} is hard to print stiff enough"),
                fields: vec!["wing_span".to_string(), "wing_root_chord".to_string()],
            });
        } else if aspect_ratio < 4.0 {
            validation.push(ValidationWarning {
                id: "low_aspect_ratio".to_string(),
                level: WarningLevel::Info,
                message: format!("aspect ratio {aspect_ratio:.1} gives high induced drag"),
                fields: vec!["wing_span".to_string(), "wing_root_chord".to_string()],
            });
        }

        Ok(Self {
            vertices,
            normals,
            indices,
            trailer: Trailer {
                derived,
                validation,
            },
        })
    }
}

fn positive(design: &DesignSnapshot, field: &str) -> Result<f64, ErrorFrame> {
    match design.number(field) {
        Some(value) if value > 0.0 => Ok(value),
        other => Err(ErrorFrame {
            error: format!("{field} must be positive"),
            detail: format!("got {}", other.unwrap_or(0.0)),
            field: Some(field.to_string()),
        }),
    }
}
