//! HTTP API handlers
//!
//! Path segments are validated here; the gateway trusts what it is given.
//! A segment that is out of range answers like an unknown route.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::GatewayError;
use crate::gateway::{Gateway, Reply};
use crate::protocol::command::{MAX_ADDRESS, MAX_SCENE_ID};
use crate::protocol::{Color, DeviceAddress, SceneId};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

/// Full route table with middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/status", get(status_handler))
        // Light commands
        .route(
            "/lightgw/{address}/color/{red}/{green}/{blue}",
            get(set_color_handler),
        )
        .route("/lightgw/{address}/sceneid/{scene_id}", get(set_scene_id_handler))
        .route("/lightgw/{address}/scene/{scene_name}", get(set_scene_handler))
        .route("/lightgw/{address}/on/{switch}", get(light_on_handler))
        .route("/lightgw/{address}/off/{switch}", get(light_off_handler))
        .route("/lightgw/{address}/status", get(device_status_handler))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Service health response
#[derive(Serialize)]
pub struct ServiceStatus {
    pub service: &'static str,
    pub version: &'static str,
    pub git_sha: &'static str,
    pub link: String,
    pub scenes: Vec<String>,
}

/// GET /status - Service health check
pub async fn status_handler(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        service: "lightgw",
        version: env!("LIGHTGW_VERSION"),
        git_sha: env!("LIGHTGW_GIT_SHA"),
        link: state.gateway.endpoint().to_string(),
        scenes: state
            .gateway
            .scenes()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// GET /lightgw/{address}/color/{red}/{green}/{blue}
pub async fn set_color_handler(
    State(state): State<AppState>,
    Path((address, red, green, blue)): Path<(String, String, String, String)>,
) -> Response {
    let (Some(address), Some(red), Some(green), Some(blue)) = (
        parse_address(&address),
        parse_byte(&red),
        parse_byte(&green),
        parse_byte(&blue),
    ) else {
        return not_found().await;
    };
    into_response(
        state
            .gateway
            .set_color(address, Color::new(red, green, blue))
            .await,
    )
}

/// GET /lightgw/{address}/sceneid/{scene_id}
pub async fn set_scene_id_handler(
    State(state): State<AppState>,
    Path((address, scene_id)): Path<(String, String)>,
) -> Response {
    let (Some(address), Some(scene)) = (parse_address(&address), parse_scene_id(&scene_id)) else {
        return not_found().await;
    };
    into_response(state.gateway.set_scene_id(address, scene).await)
}

/// GET /lightgw/{address}/scene/{scene_name}
///
/// The name is not checked here; unknown names come back from the gateway
/// as `UnknownScene`.
pub async fn set_scene_handler(
    State(state): State<AppState>,
    Path((address, scene_name)): Path<(String, String)>,
) -> Response {
    let Some(address) = parse_address(&address) else {
        return not_found().await;
    };
    into_response(state.gateway.set_scene(address, &scene_name).await)
}

/// GET /lightgw/{address}/on/{switch}
pub async fn light_on_handler(
    State(state): State<AppState>,
    Path((address, switch)): Path<(String, String)>,
) -> Response {
    let (Some(address), Some(switch)) = (parse_address(&address), parse_byte(&switch)) else {
        return not_found().await;
    };
    into_response(state.gateway.light_on(address, switch).await)
}

/// GET /lightgw/{address}/off/{switch}
pub async fn light_off_handler(
    State(state): State<AppState>,
    Path((address, switch)): Path<(String, String)>,
) -> Response {
    let (Some(address), Some(switch)) = (parse_address(&address), parse_byte(&switch)) else {
        return not_found().await;
    };
    into_response(state.gateway.light_off(address, switch).await)
}

/// GET /lightgw/{address}/status - Query a node and wait for its report
pub async fn device_status_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Response {
    let Some(address) = parse_address(&address) else {
        return not_found().await;
    };
    into_response(state.gateway.get_status(address).await)
}

/// Unknown route or out-of-range path segment
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(Reply::error())).into_response()
}

fn into_response(result: Result<Reply, GatewayError>) -> Response {
    match result {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => {
            tracing::warn!("Request failed: {}", e);
            let status = match e {
                GatewayError::UnknownScene(_) => StatusCode::NOT_FOUND,
                GatewayError::StatusTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                GatewayError::TransportUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                // not produced by get_status: the matcher drops unparseable
                // lines, so a device that only sends garbage ends in StatusTimeout
                GatewayError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            };
            (status, Json(Reply::error())).into_response()
        }
    }
}

/// 1 to 3 ASCII digits no larger than `max`. Leading zeros are fine.
fn parse_bounded(segment: &str, max: u8) -> Option<u8> {
    if segment.is_empty() || segment.len() > 3 || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u16 = segment.parse().ok()?;
    u8::try_from(value).ok().filter(|v| *v <= max)
}

fn parse_address(segment: &str) -> Option<DeviceAddress> {
    parse_bounded(segment, MAX_ADDRESS).and_then(|v| DeviceAddress::try_from(v).ok())
}

fn parse_scene_id(segment: &str) -> Option<SceneId> {
    parse_bounded(segment, MAX_SCENE_ID).and_then(|v| SceneId::try_from(v).ok())
}

fn parse_byte(segment: &str) -> Option<u8> {
    parse_bounded(segment, u8::MAX)
}
