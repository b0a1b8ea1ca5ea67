//! Local JSON proxy
//!
//! Re-serves the host list on `GET /hosts` and device metadata on every
//! other path.
//! A background keeper heartbeats the device session and logs in again
//! when the heartbeat stops working.

use crate::device::DeviceApi;
use crate::models::{DeviceInfo, Host};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

const MAX_CONSECUTIVE_FAILURES: u32 = 3;
const FAILURE_BACKOFF: Duration = Duration::from_secs(60);

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub device: Arc<dyn DeviceApi>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn device_error(err: crate::Error) -> ApiError {
    tracing::error!("Device request failed: {}", err);
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(device_info))
        .route("/hosts", get(hosts))
        .fallback(device_info)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / and any unrouted path
async fn device_info(State(state): State<AppState>) -> Result<Json<DeviceInfo>, ApiError> {
    state.device.device_info().await.map(Json).map_err(device_error)
}

/// GET /hosts
async fn hosts(State(state): State<AppState>) -> Result<Json<Vec<Host>>, ApiError> {
    state.device.hosts().await.map(Json).map_err(device_error)
}

/// Serve the proxy on `addr` until Ctrl-C
pub async fn run_server(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}...", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    tracing::info!("Proxy stopped");
    Ok(())
}

/// Credentials the keeper uses to log in again
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One keeper round: heartbeat, and on failure start a fresh session
pub async fn keep_alive(device: &dyn DeviceApi, creds: &Credentials) -> crate::Result<()> {
    if let Err(e) = device.heartbeat().await {
        tracing::warn!("Heartbeat failed ({}), logging in again...", e);
        device.authenticate(&creds.username, &creds.password).await?;
        tracing::info!("Session re-established");
    }
    Ok(())
}

/// Rejected credentials will not fix themselves, so back off right away
fn should_back_off(err: &crate::Error, consecutive_failures: u32) -> bool {
    err.is_auth() || consecutive_failures >= MAX_CONSECUTIVE_FAILURES
}

/// Run [`keep_alive`] every `interval` in a background task
pub fn spawn_session_keeper(
    device: Arc<dyn DeviceApi>,
    creds: Credentials,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut consecutive_failures = 0;
        loop {
            tokio::time::sleep(interval).await;

            match keep_alive(device.as_ref(), &creds).await {
                Ok(()) => consecutive_failures = 0,
                Err(e) => {
                    consecutive_failures += 1;
                    tracing::error!(
                        "Re-login failed (attempt {}/{}): {}",
                        consecutive_failures,
                        MAX_CONSECUTIVE_FAILURES,
                        e
                    );

                    if should_back_off(&e, consecutive_failures) {
                        tracing::error!("Backing off for {:?}...", FAILURE_BACKOFF);
                        tokio::time::sleep(FAILURE_BACKOFF).await;
                        consecutive_failures = 0;
                    }
                }
            }
        }
    })
}
