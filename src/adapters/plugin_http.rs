//! Docker volume plugin HTTP server.
//!
//! Serves the `/Plugin.Activate` and `/VolumeDriver.*` endpoints. Every call
//! answers 200; driver failures travel in the `Err` field as the plugin
//! protocol requires.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::domain::errors::VolumeResult;
use crate::domain::models::VolumeMetadata;
use crate::services::driver::{VolumeDriver, VolumeInfo};

/// Configuration for the plugin HTTP server.
#[derive(Debug, Clone)]
pub struct PluginHttpConfig {
    /// Address to bind, e.g. `127.0.0.1:8989`
    pub listen_addr: String,
}

/// Request body shared by every `/VolumeDriver.*` endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PluginRequest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Opts")]
    pub opts: Option<BTreeMap<String, String>>,
    #[serde(rename = "ID")]
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateResponse {
    pub implements: Vec<&'static str>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrResponse {
    pub err: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountpointResponse {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mountpoint: String,
    pub err: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginVolume {
    pub name: String,
    pub mountpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VolumeMetadata>,
}

impl From<VolumeInfo> for PluginVolume {
    fn from(info: VolumeInfo) -> Self {
        Self {
            name: info.name,
            mountpoint: info.mountpoint.display().to_string(),
            status: info.status,
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<PluginVolume>,
    pub err: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResponse {
    pub volumes: Vec<PluginVolume>,
    pub err: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesResponse {
    pub capabilities: CapabilityScope,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilityScope {
    pub scope: &'static str,
}

type SharedDriver = Arc<VolumeDriver>;

/// Build the plugin router over `driver`.
pub fn router(driver: SharedDriver) -> Router {
    Router::new()
        .route("/Plugin.Activate", post(activate))
        .route("/VolumeDriver.Create", post(create))
        .route("/VolumeDriver.Remove", post(remove))
        .route("/VolumeDriver.Mount", post(mount))
        .route("/VolumeDriver.Unmount", post(unmount))
        .route("/VolumeDriver.Path", post(path))
        .route("/VolumeDriver.Get", post(get))
        .route("/VolumeDriver.List", post(list))
        .route("/VolumeDriver.Capabilities", post(capabilities))
        .with_state(driver)
        .layer(TraceLayer::new_for_http())
}

/// Serve the plugin API until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    driver: SharedDriver,
    config: PluginHttpConfig,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "volume plugin listening");

    axum::serve(listener, router(driver))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Docker may post an empty body; treat that and malformed JSON as defaults.
fn parse_request(body: &Bytes) -> PluginRequest {
    if body.is_empty() {
        return PluginRequest::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        warn!(error = %e, "malformed plugin request body");
        PluginRequest::default()
    })
}

/// Run a driver call on the blocking pool, flattening errors to strings.
async fn run<T, F>(driver: &SharedDriver, call: F) -> Result<T, String>
where
    F: FnOnce(&VolumeDriver) -> VolumeResult<T> + Send + 'static,
    T: Send + 'static,
{
    let driver = driver.clone();
    match tokio::task::spawn_blocking(move || call(&driver)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(error = %e, "driver call failed");
            Err(e.to_string())
        }
        Err(e) => Err(format!("driver task failed: {e}")),
    }
}

async fn activate() -> Json<ActivateResponse> {
    Json(ActivateResponse {
        implements: vec!["VolumeDriver"],
    })
}

async fn create(State(driver): State<SharedDriver>, body: Bytes) -> Json<ErrResponse> {
    let req = parse_request(&body);
    let opts = req.opts.unwrap_or_default();
    let name = req.name;
    let result = run(&driver, move |d| d.create(&name, opts)).await;
    Json(ErrResponse {
        err: result.err().unwrap_or_default(),
    })
}

async fn remove(State(driver): State<SharedDriver>, body: Bytes) -> Json<ErrResponse> {
    let name = parse_request(&body).name;
    let result = run(&driver, move |d| d.remove(&name)).await;
    Json(ErrResponse {
        err: result.err().unwrap_or_default(),
    })
}

async fn mount(State(driver): State<SharedDriver>, body: Bytes) -> Json<MountpointResponse> {
    let name = parse_request(&body).name;
    Json(match run(&driver, move |d| d.mount(&name)).await {
        Ok(path) => MountpointResponse {
            mountpoint: path.display().to_string(),
            err: String::new(),
        },
        Err(err) => MountpointResponse {
            err,
            ..Default::default()
        },
    })
}

async fn unmount(State(driver): State<SharedDriver>, body: Bytes) -> Json<ErrResponse> {
    let name = parse_request(&body).name;
    let result = run(&driver, move |d| d.unmount(&name)).await;
    Json(ErrResponse {
        err: result.err().unwrap_or_default(),
    })
}

async fn path(State(driver): State<SharedDriver>, body: Bytes) -> Json<MountpointResponse> {
    let name = parse_request(&body).name;
    Json(match run(&driver, move |d| d.path(&name)).await {
        Ok(path) => MountpointResponse {
            mountpoint: path.display().to_string(),
            err: String::new(),
        },
        Err(err) => MountpointResponse {
            err,
            ..Default::default()
        },
    })
}

async fn get(State(driver): State<SharedDriver>, body: Bytes) -> Json<GetResponse> {
    let name = parse_request(&body).name;
    Json(match run(&driver, move |d| d.get(&name)).await {
        Ok(info) => GetResponse {
            volume: Some(info.into()),
            err: String::new(),
        },
        Err(err) => GetResponse { volume: None, err },
    })
}

async fn list(State(driver): State<SharedDriver>) -> Json<ListResponse> {
    Json(match run(&driver, VolumeDriver::list).await {
        Ok(volumes) => ListResponse {
            volumes: volumes.into_iter().map(PluginVolume::from).collect(),
            err: String::new(),
        },
        Err(err) => ListResponse {
            volumes: Vec::new(),
            err,
        },
    })
}

async fn capabilities(State(driver): State<SharedDriver>) -> Json<CapabilitiesResponse> {
    Json(CapabilitiesResponse {
        capabilities: CapabilityScope {
            scope: driver.capabilities().scope,
        },
    })
}
