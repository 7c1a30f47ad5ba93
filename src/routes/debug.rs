//! Debug endpoints for development
//!
//! Only answer when `DEBUG_ROUTES` is enabled; otherwise they respond
//! with the regular 404 body.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    AppState,
};

/// Debug ping response
#[derive(Debug, Serialize, Deserialize)]
pub struct DebugPing {
    pub message: String,
    pub environment: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Non-sensitive configuration snapshot
#[derive(Debug, Serialize, Deserialize)]
pub struct DebugConfig {
    pub environment: String,
    pub provider_configured: bool,
    pub provider_initialized: bool,
    pub auth_timeout_seconds: u64,
    pub trust_proxy: bool,
    pub rate_limit_tiers: Vec<TierInfo>,
}

/// Rate limit tier as seen by the debug endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct TierInfo {
    pub name: String,
    pub max_requests: u64,
    pub window_seconds: u64,
}

fn ensure_enabled(state: &AppState) -> AppResult<()> {
    if state.config.debug_routes {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

/// GET /api/debug/ping
pub async fn ping(State(state): State<Arc<AppState>>) -> AppResult<Json<DebugPing>> {
    ensure_enabled(&state)?;

    Ok(Json(DebugPing {
        message: "Debug router is working".to_string(),
        environment: state.config.environment.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /api/debug/config
pub async fn config_info(State(state): State<Arc<AppState>>) -> AppResult<Json<DebugConfig>> {
    ensure_enabled(&state)?;

    let limiters = &state.rate_limiters;
    let rate_limit_tiers = [&limiters.general, &limiters.auth, &limiters.sensitive]
        .into_iter()
        .map(|limiter| TierInfo {
            name: limiter.tier().name().to_string(),
            max_requests: limiter.tier().max_requests(),
            window_seconds: limiter.tier().window().as_secs(),
        })
        .collect();

    Ok(Json(DebugConfig {
        environment: state.config.environment.to_string(),
        provider_configured: state.config.provider_credentials().is_ok(),
        provider_initialized: state.auth_provider.is_initialized(),
        auth_timeout_seconds: state.config.auth_timeout_seconds,
        trust_proxy: state.config.trust_proxy,
        rate_limit_tiers,
    }))
}
