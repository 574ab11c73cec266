//! HTTP server for the task board.
//!
//! A single endpoint (`/`) serves the board on GET and accepts form posts on
//! POST. The `action` parameter, from the query string or the form body,
//! selects the operation.

use axum::{
    Router,
    extract::{Form, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use super::action::{Action, ActionKind};
use super::templates;
use crate::config::Config;
use crate::csrf::{CsrfGuard, TOKEN_FIELD};
use crate::db::Database;
use crate::error::{ErrorCode, TaskError};
use crate::service::TaskService;
use crate::session::{SessionId, SessionStore};
use crate::types::{Message, TaskBoard};

/// Response header carrying the rotated anti-forgery token.
pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
    csrf: CsrfGuard,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: Arc<Config>, sessions: Arc<dyn SessionStore>) -> Self {
        let csrf = CsrfGuard::new(sessions, config.security.csrf_token_ttl_seconds);
        Self { db, csrf, config }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ActionQuery {
    action: Option<String>,
}

/// Find the caller's session, or start one and set its cookie.
fn resolve_session(state: &AppState, jar: CookieJar) -> (SessionId, CookieJar) {
    let name = &state.config.security.session_cookie;
    if let Some(id) = jar.get(name).and_then(|c| SessionId::parse(c.value())) {
        return (id, jar);
    }

    let id = SessionId::generate();
    debug!(session = %id, "Starting session");
    let cookie = Cookie::build((name.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    (id, jar.add(cookie))
}

fn page(status: StatusCode, jar: CookieJar, rotated: Option<&str>, body: String) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Some(value) = rotated.and_then(|t| HeaderValue::from_str(t).ok()) {
        headers.insert(CSRF_HEADER, value);
    }
    (status, jar, headers, Html(body)).into_response()
}

fn error_page(state: &AppState, jar: CookieJar, err: anyhow::Error) -> Response {
    let err = TaskError::from(err);
    error!(code = ?err.code, "Request failed: {}", err.message);
    let detail = state.config.expose_errors().then_some(err.message.as_str());
    page(
        StatusCode::INTERNAL_SERVER_ERROR,
        jar,
        None,
        templates::render_error(detail),
    )
}

/// Render the board with a request-level error message (nothing was changed).
fn rejected(
    state: &AppState,
    jar: CookieJar,
    token: &str,
    status: StatusCode,
    err: TaskError,
) -> Response {
    let mut service = TaskService::new(state.db());
    service.push_message(Message::error(err.message));
    match service.list() {
        Ok(board) => page(
            status,
            jar,
            None,
            templates::render_board(&board, token, &state.config.date),
        ),
        Err(e) => error_page(state, jar, e),
    }
}

fn status_for(err: &TaskError) -> StatusCode {
    match err.code {
        ErrorCode::CsrfRejected => StatusCode::FORBIDDEN,
        ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
        ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue | ErrorCode::InvalidAction => {
            StatusCode::BAD_REQUEST
        }
        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run a validated action against the service.
fn dispatch(service: &mut TaskService<'_>, action: Action) -> anyhow::Result<TaskBoard> {
    match action {
        Action::List => service.list(),
        Action::Create { title, description } => service.create(&title, &description),
        Action::Update {
            id,
            title,
            description,
        } => service.update(id, &title, &description),
        Action::Delete { id } => service.delete(id),
        Action::Toggle { id } => service.toggle_status(id),
        Action::Reorder { task_ids, status } => service.reorder(&task_ids, status),
        Action::Move { id, order, status } => service.move_task(id, order, status),
    }
}

/// GET / - render the board. Mutating actions are never run on GET.
async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ActionQuery>,
) -> Response {
    let (session, jar) = resolve_session(&state, jar);
    let token = state.csrf.current_or_issue(&session);

    if let Some(kind) = ActionKind::parse(query.action.as_deref()) {
        if kind.is_mutating() {
            debug!(action = kind.as_str(), "Ignoring mutating action on GET");
        }
    }

    match TaskService::new(state.db()).list() {
        Ok(board) => page(
            StatusCode::OK,
            jar,
            None,
            templates::render_board(&board, &token, &state.config.date),
        ),
        Err(e) => error_page(&state, jar, e),
    }
}

/// POST / - verify the token, validate the fields, run the action.
async fn submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ActionQuery>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let (session, jar) = resolve_session(&state, jar);

    let raw_action = query
        .action
        .as_deref()
        .or_else(|| fields.get("action").map(String::as_str));
    let Some(kind) = ActionKind::parse(raw_action) else {
        warn!(action = ?raw_action, "Rejected unknown action");
        let token = state.csrf.current_or_issue(&session);
        let err = TaskError::invalid_action();
        return rejected(&state, jar, &token, status_for(&err), err);
    };

    if kind.is_mutating() {
        let submitted = fields.get(TOKEN_FIELD).map(String::as_str);
        if let Err(reason) = state.csrf.verify(&session, submitted) {
            warn!(action = kind.as_str(), %reason, "Rejected anti-forgery token");
            let token = state.csrf.current_or_issue(&session);
            let err = TaskError::csrf_rejected();
            return rejected(&state, jar, &token, status_for(&err), err);
        }
    }

    let token = state.csrf.current_or_issue(&session);
    let action = match Action::from_fields(kind, &fields) {
        Ok(action) => action,
        Err(err) => {
            debug!(action = kind.as_str(), field = ?err.field, "Rejected input: {}", err.message);
            return rejected(&state, jar, &token, status_for(&err), err);
        }
    };

    debug!(action = kind.as_str(), "Handling action");
    let mutating = action.is_mutating();
    let mut service = TaskService::new(state.db());
    match dispatch(&mut service, action) {
        Ok(board) if mutating => {
            let rotated = state.csrf.rotate(&session);
            page(
                StatusCode::OK,
                jar,
                Some(&rotated),
                templates::render_board(&board, &rotated, &state.config.date),
            )
        }
        Ok(board) => page(
            StatusCode::OK,
            jar,
            None,
            templates::render_board(&board, &token, &state.config.date),
        ),
        Err(e) => error_page(&state, jar, e),
    }
}

async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        templates::APP_JS,
    )
}

async fn style_css() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        templates::STYLE_CSS,
    )
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/static/app.js", get(app_js))
        .route("/static/style.css", get(style_css))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve in the background.
///
/// Returns a sender that triggers graceful shutdown, the bound address, and
/// the handle of the serving task.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr, JoinHandle<()>)> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task board listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            error!("Server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr, handle))
}
