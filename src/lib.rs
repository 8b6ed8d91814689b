pub mod commands;
pub mod core;
pub mod domain;
pub mod infra;
pub mod state;

use commands::geolocation::toggle_my_location;
use commands::map::{mount_map, render_snapshot, unmount_map};
use commands::tracking::track_bus_or_route;
use domain::models::{AppError, LatLng};
use infra::logging::init_tracing;
use infra::runtime::event_loop::spawn_frame_loop;
use infra::runtime::position::FixedPositionSource;
use infra::storage::settings_store::load_or_default_settings;
use state::RuntimeState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Runs the tracking demo: every query in `queries` is tracked in turn on one
/// map, and the settled render snapshot is printed as JSON.
pub fn run(settings_path: PathBuf, queries: Vec<String>) -> Result<(), AppError> {
    init_tracing();

    let settings = load_or_default_settings(&settings_path)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .map_err(|error| {
            AppError::new(
                "RUNTIME_START_FAIL",
                format!("failed to start async runtime: {error}"),
                None,
            )
        })?;

    let state = Arc::new(RuntimeState::new(settings_path, settings));
    runtime.block_on(run_demo(state, queries))
}

async fn run_demo(state: Arc<RuntimeState>, queries: Vec<String>) -> Result<(), AppError> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let frame_loop = spawn_frame_loop(state.clone(), shutdown_rx);
    let session_id = mount_map(&state)?;
    let settle = Duration::from_millis(state.current_settings()?.popup_delay_ms + 200);

    for query in &queries {
        match track_bus_or_route(&state, &session_id, query) {
            Ok(_) => {
                tokio::time::sleep(settle).await;
                print_snapshot(&state, &session_id)?;
            }
            Err(error) => tracing::warn!("{error}"),
        }
    }

    let source = FixedPositionSource::located(LatLng::new(12.3148, 76.6483));
    let report = toggle_my_location(&state, &session_id, &source).await?;
    if let Some(failure) = report.failure {
        tracing::warn!("{}: {}", failure.message_key, failure.detail);
    }
    tokio::time::sleep(settle).await;
    print_snapshot(&state, &session_id)?;

    unmount_map(&state, &session_id)?;
    let _ = shutdown_tx.send(true);
    let _ = frame_loop.await;
    Ok(())
}

fn print_snapshot(state: &RuntimeState, session_id: &str) -> Result<(), AppError> {
    let snapshot = render_snapshot(state, session_id)?;
    let raw = serde_json::to_string_pretty(&snapshot).map_err(|error| {
        AppError::new(
            "SERDE_ERROR",
            format!("failed to serialize snapshot: {error}"),
            None,
        )
    })?;
    println!("{raw}");
    Ok(())
}
