//! `GET /health`: liveness plus a snapshot of what this instance is running.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Git revision and cargo profile baked in by `build.rs`.
    pub commit: String,
    pub profile: String,
    pub uptime_seconds: u64,
    pub proxy: ProxyInfo,
    pub requests: RequestCounts,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProxyInfo {
    /// Where the config came from, usually a file path.
    pub source: String,
    /// Digest prefix of the loaded config.
    pub digest: String,
    pub namespace: String,
    pub upstream: String,
    /// Middleware instance names, outermost first.
    pub chain: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestCounts {
    pub forwarded: u64,
    pub failed: u64,
}

impl HealthResponse {
    #[must_use]
    pub fn from_state(state: &AppState) -> Self {
        let (forwarded, failed) = state.stats.snapshot();
        Self {
            status: "healthy".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            commit: env!("EDGEIP_GIT_SHORT").into(),
            profile: env!("EDGEIP_BUILD_PROFILE").into(),
            uptime_seconds: state.started.elapsed().as_secs(),
            proxy: ProxyInfo {
                source: state.source_name.clone(),
                digest: state.version.short().into(),
                namespace: state.namespace.clone(),
                upstream: state.config.upstream.clone(),
                chain: state
                    .config
                    .middlewares
                    .iter()
                    .map(|m| m.name.clone())
                    .collect(),
            },
            requests: RequestCounts { forwarded, failed },
        }
    }
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::from_state(&state))
}
