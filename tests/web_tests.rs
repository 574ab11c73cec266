//! Router tests: drive the axum app in-process with `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::sync::Arc;
use todo_board::config::{Config, Environment};
use todo_board::db::Database;
use todo_board::session::MemorySessionStore;
use todo_board::types::TaskStatus;
use todo_board::web::{AppState, CSRF_HEADER, router};
use tower::ServiceExt;

fn setup() -> (AppState, Arc<Database>) {
    setup_with(Config::default())
}

fn setup_with(config: Config) -> (AppState, Arc<Database>) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to create in-memory database"));
    let state = AppState::new(
        Arc::clone(&db),
        Arc::new(config),
        Arc::new(MemorySessionStore::new()),
    );
    (state, db)
}

fn drop_tasks_table(db: &Database) {
    db.with_conn(|conn| {
        conn.execute_batch("DROP TABLE tasks")?;
        Ok(())
    })
    .unwrap();
}

async fn get_index(state: AppState) -> (StatusCode, String) {
    let resp = router(state)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    (status, body_text(resp).await)
}

async fn body_text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `name=value` of the session cookie set by the response.
fn session_cookie(resp: &Response) -> String {
    let raw = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("no session cookie")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().to_string()
}

fn token_in(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("no token in page") + marker.len();
    let end = html[start..].find('"').unwrap();
    html[start..start + end].to_string()
}

fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn post(uri: &str, cookie: &str, pairs: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_body(pairs)))
        .unwrap()
}

/// Open a session: returns (cookie, token).
async fn open_session(state: &AppState) -> (String, String) {
    let resp = router(state.clone())
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = session_cookie(&resp);
    let html = body_text(resp).await;
    (cookie, token_in(&html))
}

#[tokio::test]
async fn index_renders_empty_board_and_sets_cookie() {
    let (state, _db) = setup();
    let resp = router(state)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("todo_session="));
    assert!(cookie.contains("HttpOnly"));

    let html = body_text(resp).await;
    assert!(html.contains("No pending tasks. Great job!"));
    assert!(html.contains("No completed tasks yet."));
    assert_eq!(token_in(&html).len(), 64);
}

#[tokio::test]
async fn token_is_stable_within_a_session() {
    let (state, _db) = setup();
    let (cookie, token) = open_session(&state).await;

    let resp = router(state)
        .oneshot(
            Request::get("/")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(token_in(&body_text(resp).await), token);
}

#[tokio::test]
async fn create_with_valid_token_rotates_it() {
    let (state, db) = setup();
    let (cookie, token) = open_session(&state).await;

    let resp = router(state)
        .oneshot(post(
            "/?action=create",
            &cookie,
            &[("csrf_token", token.as_str()), ("title", "Buy milk & eggs")],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let rotated = resp
        .headers()
        .get(CSRF_HEADER)
        .expect("rotated token header")
        .to_str()
        .unwrap()
        .to_string();
    assert_ne!(rotated, token);

    let html = body_text(resp).await;
    assert!(html.contains("Task created successfully!"));
    assert!(html.contains("Buy milk &amp; eggs"));
    assert_eq!(token_in(&html), rotated);

    let tasks = db.get_all_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy milk & eggs");
}

#[tokio::test]
async fn missing_token_is_forbidden_and_changes_nothing() {
    let (state, db) = setup();
    let (cookie, _token) = open_session(&state).await;

    let resp = router(state)
        .oneshot(post("/?action=create", &cookie, &[("title", "Sneaky")]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let html = body_text(resp).await;
    assert!(html.contains("Invalid or expired security token"));
    assert!(db.get_all_tasks().unwrap().is_empty());
}

#[tokio::test]
async fn used_token_cannot_be_replayed() {
    let (state, db) = setup();
    let (cookie, token) = open_session(&state).await;
    let form = [("csrf_token", token.as_str()), ("title", "Once")];

    let first = router(state.clone())
        .oneshot(post("/?action=create", &cookie, &form))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router(state)
        .oneshot(post("/?action=create", &cookie, &form))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::FORBIDDEN);
    assert_eq!(db.get_all_tasks().unwrap().len(), 1);
}

#[tokio::test]
async fn token_from_another_session_is_rejected() {
    let (state, db) = setup();
    let (_cookie_a, token_a) = open_session(&state).await;
    let (cookie_b, _token_b) = open_session(&state).await;

    let resp = router(state)
        .oneshot(post(
            "/?action=create",
            &cookie_b,
            &[("csrf_token", token_a.as_str()), ("title", "Cross")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(db.get_all_tasks().unwrap().is_empty());
}

#[tokio::test]
async fn validation_error_is_reported_on_the_board() {
    let (state, db) = setup();
    let (cookie, token) = open_session(&state).await;

    let resp = router(state)
        .oneshot(post(
            "/?action=create",
            &cookie,
            &[("csrf_token", token.as_str()), ("title", "   ")],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers().get(CSRF_HEADER).is_none());
    let html = body_text(resp).await;
    assert!(html.contains("Title is required"));
    assert!(db.get_all_tasks().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_action_is_rejected_on_post_and_listed_on_get() {
    let (state, _db) = setup();
    let (cookie, token) = open_session(&state).await;

    let resp = router(state.clone())
        .oneshot(post(
            "/?action=truncate",
            &cookie,
            &[("csrf_token", token.as_str())],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.contains("Invalid action"));

    let resp = router(state)
        .oneshot(Request::get("/?action=truncate").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn get_never_mutates() {
    let (state, db) = setup();
    let id = db.create_task("keep me", "", TaskStatus::Pending).unwrap();

    let resp = router(state)
        .oneshot(
            Request::get(format!("/?action=delete&id={id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(db.get_task(id).unwrap().is_some());
}

#[tokio::test]
async fn action_may_come_from_the_form_body() {
    let (state, db) = setup();
    let id = db.create_task("flip", "", TaskStatus::Pending).unwrap();
    let (cookie, token) = open_session(&state).await;

    let resp = router(state)
        .oneshot(post(
            "/",
            &cookie,
            &[
                ("action", "toggle"),
                ("csrf_token", token.as_str()),
                ("id", id.to_string().as_str()),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        db.get_task(id).unwrap().unwrap().status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn drag_and_drop_round_trip() {
    let (state, db) = setup();
    let a = db.create_task("a", "", TaskStatus::Pending).unwrap();
    let b = db.create_task("b", "", TaskStatus::Pending).unwrap();
    let (cookie, token) = open_session(&state).await;

    let ids = format!("[{b},{a}]");
    let resp = router(state.clone())
        .oneshot(post(
            "/?action=reorder",
            &cookie,
            &[("csrf_token", token.as_str()), ("task_ids", ids.as_str()), ("status", "pending")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token = resp
        .headers()
        .get(CSRF_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(db.get_task(b).unwrap().unwrap().task_order, 0);
    assert_eq!(db.get_task(a).unwrap().unwrap().task_order, 1);

    let resp = router(state)
        .oneshot(post(
            "/?action=move",
            &cookie,
            &[
                ("csrf_token", token.as_str()),
                ("id", b.to_string().as_str()),
                ("order", "0"),
                ("status", "completed"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let moved = db.get_task(b).unwrap().unwrap();
    assert_eq!(moved.status, TaskStatus::Completed);
    assert_eq!(db.get_task(a).unwrap().unwrap().task_order, 0);
}

#[tokio::test]
async fn static_assets_and_health() {
    let (state, _db) = setup();
    let app = router(state);

    let resp = app
        .clone()
        .oneshot(Request::get("/static/app.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/javascript")
    );

    let resp = app
        .clone()
        .oneshot(Request::get("/static/style.css").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn storage_failure_renders_generic_error_page() {
    let mut config = Config::default();
    config.app.env = Environment::Production;
    config.app.debug = true;
    let (state, db) = setup_with(config);
    drop_tasks_table(&db);

    let (status, html) = get_index(state).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!html.contains("no such table"));
    assert!(!html.contains("error-code"));
}

#[tokio::test]
async fn storage_failure_detail_shown_in_debug_development() {
    let mut config = Config::default();
    config.app.debug = true;
    let (state, db) = setup_with(config);
    drop_tasks_table(&db);

    let (status, html) = get_index(state).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(html.contains("no such table: tasks"));
}

#[tokio::test]
async fn timezone_setting_changes_rendered_dates() {
    let mut config = Config::default();
    config.date.format = "%Y-%m-%d %H:%M %Z".to_string();
    config.date.timezone = "Asia/Tokyo".to_string();
    let (state, db) = setup_with(config);
    db.create_task("dated", "", TaskStatus::Pending).unwrap();

    let (status, html) = get_index(state).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(" JST</small>"));
}
