use std::path::Path;
use std::time::Duration;

use aerosync_design::{ChangeSource, FieldValue};
use aerosync_sync::{SyncConfig, SyncHandle, SyncView};
use aerosync_transport::{ConnectionConfig, ConnectionState, WsConnector};
use serde::Deserialize;
use tokio::time::timeout;

use crate::cmd::{block_on, load_design, parse_duration, ReplayArgs};
use crate::exit::{
    io_error, sync_error, timeout as timed_out, CliError, CliResult, DATA_INVALID, SUCCESS,
    TRANSPORT_ERROR,
};
use crate::output::{print_view, OutputFormat};

/// One line of an edit script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Set {
        field: String,
        value: FieldValue,
        #[serde(default)]
        source: ChangeSource,
    },
    BeginDrag,
    EndDrag,
    Undo {
        #[serde(default = "one")]
        steps: usize,
    },
    Redo {
        #[serde(default = "one")]
        steps: usize,
    },
    Jump {
        index: usize,
    },
    Rename {
        name: String,
    },
    Wait {
        ms: u64,
    },
}

fn one() -> usize {
    1
}

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let wait = parse_duration(&args.wait_timeout)?;
    let steps = load_script(&args.script)?;
    let design = load_design(args.design.as_deref())?;

    let connection = ConnectionConfig {
        max_retries: args.max_retries,
        ..ConnectionConfig::default()
    };
    let config = SyncConfig {
        throttle_window: Duration::from_millis(args.throttle_ms),
        debounce_quiet: Duration::from_millis(args.debounce_ms),
        ..SyncConfig::default()
    };

    let settle = settle_time(&steps, &config);
    let view = block_on(async {
        let handle = SyncHandle::spawn(WsConnector::new(&args.url), connection, config, design);
        let result = drive(&handle, &steps, wait, settle).await;
        handle.shutdown().await;
        result
    })??;

    print_view(&view, format);
    Ok(SUCCESS)
}

async fn drive(
    handle: &SyncHandle,
    steps: &[Step],
    wait: Duration,
    settle: Duration,
) -> CliResult<SyncView> {
    let mut views = handle.subscribe();
    let connected = timeout(
        wait,
        views.wait_for(|v| {
            matches!(
                v.connection.state,
                ConnectionState::Connected | ConnectionState::Disconnected
            )
        }),
    )
    .await
    .map_err(|_| timed_out("waiting for connection"))?
    .map_err(|_| CliError::new(TRANSPORT_ERROR, "sync engine stopped"))?
    .connection
    .clone();
    if connected.state == ConnectionState::Disconnected {
        return Err(CliError::new(
            TRANSPORT_ERROR,
            format!(
                "connect failed: {}",
                connected.last_error.as_deref().unwrap_or("unknown error")
            ),
        ));
    }

    for (index, step) in steps.iter().enumerate() {
        tracing::debug!(step = index + 1, ?step, "replaying");
        apply(handle, step)
            .await
            .map_err(|err| sync_error(&format!("step {}", index + 1), err))?;
    }

    // Let trailing sends fire, then wait for the engine to answer the last one.
    tokio::time::sleep(settle).await;
    let view = timeout(wait, views.wait_for(|v| !v.is_generating))
        .await
        .map_err(|_| timed_out("waiting for engine reply"))?
        .map_err(|_| CliError::new(TRANSPORT_ERROR, "sync engine stopped"))?
        .clone();
    Ok(view)
}

async fn apply(handle: &SyncHandle, step: &Step) -> aerosync_sync::Result<()> {
    match step {
        Step::Set {
            field,
            value,
            source,
        } => {
            handle.set_field(field, value.clone(), *source).await?;
        }
        Step::BeginDrag => handle.begin_drag().await?,
        Step::EndDrag => {
            handle.end_drag().await?;
        }
        Step::Undo { steps } => {
            handle.undo(*steps).await?;
        }
        Step::Redo { steps } => {
            handle.redo(*steps).await?;
        }
        Step::Jump { index } => {
            handle.jump_to(*index).await?;
        }
        Step::Rename { name } => handle.rename(name.clone()).await?,
        Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
    }
    Ok(())
}

/// Long enough for any throttle or debounce timer armed by the script to fire.
fn settle_time(steps: &[Step], config: &SyncConfig) -> Duration {
    let timed = steps.iter().any(|step| {
        matches!(
            step,
            Step::Set {
                source: ChangeSource::Drag | ChangeSource::Text,
                ..
            }
        )
    });
    if timed {
        config.throttle_window.max(config.debounce_quiet) + Duration::from_millis(50)
    } else {
        Duration::ZERO
    }
}

fn load_script(path: &Path) -> CliResult<Vec<Step>> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    parse_script(&text)
}

fn parse_script(text: &str) -> CliResult<Vec<Step>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(number, line)| {
            serde_json::from_str(line).map_err(|err| {
                CliError::new(DATA_INVALID, format!("script line {}: {err}", number + 1))
            })
        })
        .collect()
}
