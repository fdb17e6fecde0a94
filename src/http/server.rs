//! axum-based JSON API over the task service.
//!
//! Handlers return `ApiResult`, which maps store errors to HTTP statuses.
//! Change events are exposed as server-sent events on `/api/events`.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Json, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post, put},
};
use chrono::Local;
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ErrorCode, StoreError};
use crate::service::TaskService;
use crate::types::{ListColor, TaskList, UserStats};
use crate::window::WindowKind;

/// API server state shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    service: TaskService,
}

impl ApiServer {
    pub fn new(service: TaskService) -> Self {
        Self { service }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: ErrorCode,
    message: String,
}

/// Store error wrapped for HTTP transport.
struct ApiError(StoreError);

type ApiResult<T> = Result<T, ApiError>;

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::ListNotFound(_)
            | StoreError::UserNotFound(_)
            | StoreError::TodoIndexOutOfBounds { .. } => StatusCode::NOT_FOUND,
            StoreError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            StoreError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
            StoreError::Database(_) if self.0.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Database(_) | StoreError::Internal(_) => {
                tracing::error!("internal error: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            code: self.0.code(),
            message: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
struct RegisterUserRequest {
    id: String,
    email: String,
}

async fn api_register_user(
    State(state): State<ApiServer>,
    Json(req): Json<RegisterUserRequest>,
) -> ApiResult<Json<UserStats>> {
    let stats = state.service.register_user(&req.id, &req.email)?;
    Ok(Json(stats))
}

async fn api_user_stats(
    State(state): State<ApiServer>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserStats>> {
    Ok(Json(state.service.user_stats(&user_id)?))
}

async fn api_leaderboard(State(state): State<ApiServer>) -> ApiResult<Json<Vec<UserStats>>> {
    Ok(Json(state.service.leaderboard()?))
}

#[derive(Debug, Deserialize)]
struct ListViewParams {
    /// Optional named window: today, week, or month.
    window: Option<String>,
}

async fn api_lists(
    State(state): State<ApiServer>,
    Path(user_id): Path<String>,
    Query(params): Query<ListViewParams>,
) -> ApiResult<Json<Vec<TaskList>>> {
    let lists = match params.window.as_deref() {
        None => state.service.lists(&user_id)?,
        Some(name) => {
            let kind = WindowKind::from_str(name).ok_or_else(|| {
                StoreError::invalid_value("window", "expected today, week, or month")
            })?;
            state.service.lists_in_window(&user_id, kind, &Local::now())?
        }
    };
    Ok(Json(lists))
}

#[derive(Debug, Deserialize)]
struct CreateListRequest {
    name: String,
    #[serde(default)]
    color: ListColor,
    due_at: Option<i64>,
}

async fn api_create_list(
    State(state): State<ApiServer>,
    Path(user_id): Path<String>,
    Json(req): Json<CreateListRequest>,
) -> ApiResult<(StatusCode, Json<TaskList>)> {
    let list = state
        .service
        .create_list(&user_id, &req.name, req.color, req.due_at)?;
    Ok((StatusCode::CREATED, Json(list)))
}

#[derive(Debug, Deserialize)]
struct UpdateListRequest {
    name: Option<String>,
    color: Option<ListColor>,
    due_at: Option<i64>,
    /// Set to drop the due date; wins over `due_at`.
    #[serde(default)]
    clear_due_at: bool,
}

impl UpdateListRequest {
    fn due_at_change(&self) -> Option<Option<i64>> {
        if self.clear_due_at {
            Some(None)
        } else {
            self.due_at.map(Some)
        }
    }
}

async fn api_update_list(
    State(state): State<ApiServer>,
    Path((user_id, list_id)): Path<(String, String)>,
    Json(req): Json<UpdateListRequest>,
) -> ApiResult<Json<TaskList>> {
    let due_at = req.due_at_change();
    let list = state
        .service
        .update_list(&user_id, &list_id, req.name.as_deref(), req.color, due_at)?;
    Ok(Json(list))
}

async fn api_delete_list(
    State(state): State<ApiServer>,
    Path((user_id, list_id)): Path<(String, String)>,
) -> ApiResult<Json<TaskList>> {
    Ok(Json(state.service.delete_list(&user_id, &list_id)?))
}

#[derive(Debug, Deserialize)]
struct AddTodoRequest {
    title: String,
    scheduled_at: Option<i64>,
}

async fn api_add_todo(
    State(state): State<ApiServer>,
    Path((user_id, list_id)): Path<(String, String)>,
    Json(req): Json<AddTodoRequest>,
) -> ApiResult<(StatusCode, Json<TaskList>)> {
    let list = state
        .service
        .add_todo(&user_id, &list_id, &req.title, req.scheduled_at)?;
    Ok((StatusCode::CREATED, Json(list)))
}

#[derive(Debug, Deserialize)]
struct UpdateTodoRequest {
    title: Option<String>,
    scheduled_at: Option<i64>,
    #[serde(default)]
    clear_scheduled_at: bool,
}

async fn api_update_todo(
    State(state): State<ApiServer>,
    Path((user_id, list_id, index)): Path<(String, String, usize)>,
    Json(req): Json<UpdateTodoRequest>,
) -> ApiResult<Json<TaskList>> {
    let scheduled_at = if req.clear_scheduled_at {
        Some(None)
    } else {
        req.scheduled_at.map(Some)
    };
    let list = state.service.update_todo(
        &user_id,
        &list_id,
        index,
        req.title.as_deref(),
        scheduled_at,
    )?;
    Ok(Json(list))
}

async fn api_toggle_todo(
    State(state): State<ApiServer>,
    Path((user_id, list_id, index)): Path<(String, String, usize)>,
) -> ApiResult<Json<TaskList>> {
    Ok(Json(state.service.toggle_todo(&user_id, &list_id, index)?))
}

async fn api_remove_todo(
    State(state): State<ApiServer>,
    Path((user_id, list_id, index)): Path<(String, String, usize)>,
) -> ApiResult<Json<TaskList>> {
    Ok(Json(state.service.remove_todo(&user_id, &list_id, index)?))
}

#[derive(Debug, Deserialize)]
struct EventsParams {
    /// Comma-separated topic filter (lists, stats, leaderboard). Empty means
    /// all topics.
    topics: Option<String>,
}

/// Server-sent change events, filtered by topic.
async fn api_events(
    State(state): State<ApiServer>,
    Query(params): Query<EventsParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let topics: Arc<Vec<String>> = Arc::new(
        params
            .topics
            .map(|t| {
                t.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    );

    let rx = state.service.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |event| {
        let topics = Arc::clone(&topics);
        async move {
            match event {
                Ok(ev) if topics.is_empty() || ev.matches(&topics) => {
                    Event::default().event("change").json_data(&ev).ok().map(Ok)
                }
                // Lagged receivers skip missed events; clients re-fetch on
                // the next one.
                _ => None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Build the router with all routes.
fn build_router(state: ApiServer) -> Router {
    // Configure CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/users", post(api_register_user))
        .route("/api/users/{user_id}/stats", get(api_user_stats))
        .route("/api/leaderboard", get(api_leaderboard))
        .route(
            "/api/users/{user_id}/lists",
            get(api_lists).post(api_create_list),
        )
        .route(
            "/api/users/{user_id}/lists/{list_id}",
            put(api_update_list).delete(api_delete_list),
        )
        .route(
            "/api/users/{user_id}/lists/{list_id}/todos",
            post(api_add_todo),
        )
        .route(
            "/api/users/{user_id}/lists/{list_id}/todos/{index}",
            put(api_update_todo).delete(api_remove_todo),
        )
        .route(
            "/api/users/{user_id}/lists/{list_id}/todos/{index}/toggle",
            post(api_toggle_todo),
        )
        .route("/api/events", get(api_events))
        .route("/api/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on the specified port.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    service: TaskService,
    port: u16,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let state = ApiServer::new(service);
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}
