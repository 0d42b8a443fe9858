// Wedding RSVP - Web Server
// JSON API over the guest directory

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use wedding_rsvp::{
    init_logging, resolve_config, DirectoryError, Event, GuestDirectory, GuestInput,
    SqliteGuestStore,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    directory: GuestDirectory,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }
}

/// Typed directory errors mapped onto HTTP
struct ApiError(DirectoryError);

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            DirectoryError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            DirectoryError::DuplicateConfirmation { .. } => {
                (StatusCode::CONFLICT, "duplicate_confirmation")
            }
            DirectoryError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DirectoryError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "permission_denied"),
            DirectoryError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            DirectoryError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            DirectoryError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store"),
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.0.to_string()),
            kind: Some(kind),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// POST /api/rsvp body
#[derive(Deserialize)]
struct SubmitRequest {
    event: Event,
    guest: GuestInput,
}

/// GET /api/rsvp/lookup query
#[derive(Deserialize)]
struct LookupQuery {
    name: String,
    event: Event,
}

/// POST /api/guests/merge body
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeRequest {
    source_id: String,
    target_id: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/rsvp - Submit an RSVP
async fn submit_rsvp(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<wedding_rsvp::SubmitOutcome> {
    let outcome = state
        .directory
        .submit_rsvp(request.guest, request.event)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// GET /api/rsvp/lookup?name=..&event=.. - Previous answer for "restore"
async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Option<wedding_rsvp::GuestRecord>> {
    let found = state
        .directory
        .find_existing_for_event(&query.name, query.event)
        .await?;
    Ok(Json(ApiResponse::ok(found)))
}

/// GET /api/guests - Every household, newest first
async fn list_guests(State(state): State<AppState>) -> ApiResult<Vec<wedding_rsvp::GuestRecord>> {
    Ok(Json(ApiResponse::ok(state.directory.list_guests().await?)))
}

/// DELETE /api/guests/:id
async fn delete_guest(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<String> {
    state.directory.delete_guest(&id).await?;
    Ok(Json(ApiResponse::ok(id)))
}

/// POST /api/guests/merge - Fold a duplicate into another record
async fn merge_guests(
    State(state): State<AppState>,
    Json(request): Json<MergeRequest>,
) -> ApiResult<String> {
    state
        .directory
        .merge_records(&request.source_id, &request.target_id)
        .await?;
    Ok(Json(ApiResponse::ok(request.target_id)))
}

/// GET /api/stats - Dashboard counters
async fn get_stats(State(state): State<AppState>) -> ApiResult<wedding_rsvp::DirectoryStats> {
    Ok(Json(ApiResponse::ok(state.directory.stats().await?)))
}

fn build_router(directory: GuestDirectory) -> Router {
    let state = AppState { directory };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/rsvp", post(submit_rsvp))
        .route("/rsvp/lookup", get(lookup))
        .route("/guests", get(list_guests))
        .route("/guests/merge", post(merge_guests))
        .route("/guests/:id", delete(delete_guest))
        .route("/stats", get(get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config_path = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    let config = resolve_config(config_path.as_deref())?;
    let store = SqliteGuestStore::open(&config.database_path)?;
    let directory = GuestDirectory::new(Arc::new(store), config.directory.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "RSVP server listening");

    axum::serve(listener, build_router(directory)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wedding_rsvp::{DirectoryConfig, MemoryGuestStore};

    fn app() -> Router {
        let directory = GuestDirectory::new(
            Arc::new(MemoryGuestStore::new()),
            DirectoryConfig::default(),
        );
        build_router(directory)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_submit_then_lookup() {
        let app = app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/rsvp",
            Some(json!({
                "event": "ceremony",
                "guest": {"name": "Ana Gomez Ruiz", "ceremonyAttendance": "yes"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["isUpdate"], json!(false));

        let (status, body) = send(
            &app,
            "GET",
            "/api/rsvp/lookup?name=ana%20g%C3%B3mez%20ruiz&event=ceremony",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], json!("Ana Gomez Ruiz"));
    }

    #[tokio::test]
    async fn test_errors_map_to_status_codes() {
        let app = app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/rsvp",
            Some(json!({"event": "ceremony", "guest": {"name": "Ana"}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], json!("validation"));

        let payload = json!({
            "event": "celebration",
            "guest": {"name": "Ana Gomez Ruiz", "celebrationAttendance": "yes"}
        });
        send(&app, "POST", "/api/rsvp", Some(payload.clone())).await;
        let (status, body) = send(&app, "POST", "/api/rsvp", Some(payload)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], json!("duplicate_confirmation"));

        let (status, _) = send(&app, "DELETE", "/api/guests/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats_and_listing() {
        let app = app();
        send(
            &app,
            "POST",
            "/api/rsvp",
            Some(json!({
                "event": "celebration",
                "guest": {
                    "name": "Ana Gomez Ruiz",
                    "celebrationAttendance": "yes",
                    "companions": [{"name": "Luis Ruiz"}],
                    "bus": "both"
                }
            })),
        )
        .await;

        let (_, body) = send(&app, "GET", "/api/stats", None).await;
        assert_eq!(body["data"]["celebrationGuests"], json!(2));
        assert_eq!(body["data"]["busReturn"], json!(2));

        let (_, body) = send(&app, "GET", "/api/guests", None).await;
        assert_eq!(body["data"].as_array().map(|a| a.len()), Some(1));
    }
}
