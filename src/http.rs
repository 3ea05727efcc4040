//! # HTTP Front End
//!
//! Routes used by the dongle and by operators:
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `GET /push?VIN=<vin>` | open a channel, replies `CH:<id>` |
//! | `POST /post?id=<id>` | ingest the request body |
//! | `GET /close?id=<id>` | release a channel |
//! | `GET /channels` | active sessions as JSON |
//! | `GET /` | plain-text report |
//! | `GET /healthz` | liveness |

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::GatewayError;
use crate::gateway::Gateway;

#[derive(Clone)]
pub struct HttpState {
    pub gateway: Arc<Gateway>,
}

/// Gateway error as an HTTP response
#[derive(Debug)]
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GatewayError::InvalidVehicleId => StatusCode::BAD_REQUEST,
            GatewayError::UnknownChannel(_) => StatusCode::NOT_FOUND,
            GatewayError::ChannelsExhausted => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "request failed");
            return (status, "Internal server error".to_string()).into_response();
        }
        warn!(error = %self.0, status = %status, "request rejected");
        (status, self.0.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct PushParams {
    #[serde(rename = "VIN")]
    vin: String,
}

#[derive(Debug, Deserialize)]
struct ChannelParams {
    id: u32,
}

#[derive(Debug, Serialize)]
struct ChannelSummary {
    channel: u32,
    vehicle_id: String,
    opened_at: DateTime<Utc>,
    records: usize,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn root(State(state): State<HttpState>) -> String {
    state.gateway.report()
}

async fn push(
    State(state): State<HttpState>,
    Query(params): Query<PushParams>,
) -> Result<String, ApiError> {
    let channel = state.gateway.new_channel(&params.vin)?;
    Ok(format!("CH:{}", channel))
}

async fn post_data(
    State(state): State<HttpState>,
    Query(params): Query<ChannelParams>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let payload = String::from_utf8_lossy(&body);
    state.gateway.ingest(params.id, &payload)?;
    Ok(StatusCode::OK)
}

async fn close(
    State(state): State<HttpState>,
    Query(params): Query<ChannelParams>,
) -> Result<StatusCode, ApiError> {
    state.gateway.close_channel(params.id)?;
    Ok(StatusCode::OK)
}

async fn list_channels(State(state): State<HttpState>) -> Json<Vec<ChannelSummary>> {
    let channels = state
        .gateway
        .channels()
        .active()
        .iter()
        .map(|session| ChannelSummary {
            channel: session.channel_identifier(),
            vehicle_id: session.vehicle_id().to_string(),
            opened_at: session.opened_at(),
            records: session.record_count(),
        })
        .collect();
    Json(channels)
}

/// Build the router
///
/// # Arguments
///
/// * `state` - Shared gateway handle
/// * `max_payload_bytes` - Largest accepted request body; bigger posts get 413
pub fn router(state: HttpState, max_payload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/push", get(push))
        .route("/post", post(post_data))
        .route("/close", get(close))
        .route("/channels", get(list_channels))
        .layer(DefaultBodyLimit::max(max_payload_bytes))
        .with_state(state)
}
