use aerosync_frame::{decode_frame, Frame};
use aerosync_transport::{ConnectionConfig, ConnectionManager, ConnectionState, WsConnector};
use bytes::Bytes;
use tokio::time::timeout;

use crate::cmd::{block_on, load_design, parse_duration, PushArgs};
use crate::exit::{
    design_error, frame_error, timeout as timed_out, CliError, CliResult, FAILURE, SUCCESS,
    TRANSPORT_ERROR,
};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: PushArgs, format: OutputFormat) -> CliResult<i32> {
    let wait = parse_duration(&args.wait_timeout)?;
    let design = load_design(args.design.as_deref())?;
    let payload = design
        .to_json()
        .map_err(|err| design_error("failed encoding design", err))?;

    let config = ConnectionConfig {
        max_retries: args.max_retries,
        ..ConnectionConfig::default()
    };
    let reply = block_on(async {
        let (manager, mut frames) = ConnectionManager::spawn(WsConnector::new(&args.url), config);
        let outcome = timeout(wait, exchange(&manager, &mut frames, payload)).await;
        manager.shutdown().await;
        match outcome {
            Ok(result) => result,
            Err(_) => Err(timed_out("waiting for engine reply")),
        }
    })??;

    let frame = decode_frame(reply).map_err(|err| frame_error("failed decoding reply", err))?;
    print_frame(&frame, format);
    match frame {
        Frame::Mesh(_) => Ok(SUCCESS),
        Frame::Error(_) => Ok(FAILURE),
    }
}

async fn exchange(
    manager: &ConnectionManager,
    frames: &mut aerosync_transport::InboundFrames,
    payload: String,
) -> CliResult<Bytes> {
    let mut status = manager.subscribe();
    let state = status
        .wait_for(|s| matches!(s.state, ConnectionState::Connected | ConnectionState::Disconnected))
        .await
        .map_err(|_| CliError::new(TRANSPORT_ERROR, "connection supervisor stopped"))?
        .clone();
    if state.state == ConnectionState::Disconnected {
        return Err(CliError::new(
            TRANSPORT_ERROR,
            format!(
                "connect failed: {}",
                state.last_error.as_deref().unwrap_or("unknown error")
            ),
        ));
    }

    tracing::debug!(bytes = payload.len(), "pushing design");
    if !manager.send(payload) {
        return Err(CliError::new(TRANSPORT_ERROR, "link closed before send"));
    }
    frames
        .recv()
        .await
        .ok_or_else(|| CliError::new(TRANSPORT_ERROR, "link closed before reply"))
}
