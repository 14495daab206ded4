//! HTTP API surface
//!
//! One real endpoint, `GET /api/videos`, plus a health probe. The videos
//! handler owns the cache-vs-fetch decision and the stale-fallback policy:
//! a failed refresh degrades to serving the last-known-good snapshot, and
//! only when no snapshot exists at all does the client see an error. All
//! internal failure detail stays in the logs; clients only ever see the
//! missing-parameter 400 or one fixed generic 500.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::cache::SnapshotCache;
use crate::data::{ChannelId, Video, YouTubeClient};

/// The one error body served when there is neither fresh data nor a fallback
const NO_DATA_MESSAGE: &str = "Unable to fetch videos and no valid cache found.";

/// Shared state for all request handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client for the upstream video API
    pub client: YouTubeClient,
    /// Per-channel snapshot store
    pub cache: SnapshotCache,
}

/// Error response serialized as `{"error": <message>}`
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Creates a 400 error with the provided message.
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Creates a 500 error with the provided message.
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Builds the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/videos", get(get_videos))
        .route("/api/health", get(get_health))
        .with_state(state)
}

/// Query parameters for `GET /api/videos`
#[derive(Debug, Deserialize)]
struct VideosQuery {
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
}

/// `GET /api/videos?channelId=<id>`
///
/// Serves the cached snapshot while it is fresh; otherwise refreshes from
/// upstream, writes the new snapshot, and serves it. If the refresh fails
/// and any snapshot exists for the channel, that snapshot is served
/// regardless of its age.
async fn get_videos(
    State(state): State<AppState>,
    Query(query): Query<VideosQuery>,
) -> ApiResult<Json<Vec<Video>>> {
    let channel = query
        .channel_id
        .as_deref()
        .and_then(ChannelId::new)
        .ok_or_else(|| ApiError::bad_request("Missing channelId"))?;

    let key = channel.cache_key();
    info!(channel = channel.as_str(), "videos requested");

    if state.cache.is_fresh(&key).await {
        // The snapshot could disappear between the freshness check and the
        // read; treat that like a miss and refresh.
        if let Ok(videos) = state.cache.read(&key).await {
            info!(channel = channel.as_str(), count = videos.len(), "served from cache");
            return Ok(Json(videos));
        }
    }

    match state.client.fetch_channel_videos(channel.as_str()).await {
        Ok(videos) => {
            if let Err(err) = state.cache.write(&key, &videos).await {
                // A failed cache write only costs the next request a
                // refetch; the fresh data is still good.
                warn!(channel = channel.as_str(), %err, "failed to write snapshot");
            }
            info!(channel = channel.as_str(), count = videos.len(), "served fresh fetch");
            Ok(Json(videos))
        }
        Err(fetch_err) => {
            warn!(channel = channel.as_str(), %fetch_err, "refresh failed, trying stale snapshot");
            match state.cache.read(&key).await {
                Ok(videos) => {
                    info!(
                        channel = channel.as_str(),
                        count = videos.len(),
                        "served stale snapshot after failed refresh"
                    );
                    Ok(Json(videos))
                }
                Err(cache_err) => {
                    error!(
                        channel = channel.as_str(),
                        %fetch_err,
                        %cache_err,
                        "no data available for channel"
                    );
                    Err(ApiError::internal(NO_DATA_MESSAGE))
                }
            }
        }
    }
}

/// `GET /api/health` - liveness probe
async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
