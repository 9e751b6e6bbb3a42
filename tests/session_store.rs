use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use brewhouse::brewhouse_clock::StoreError;
use brewhouse::brewhouse_core::Environment;
use brewhouse::{
    boot_clock, boot_clock_from_env, BrewhouseConfig, BrewingSession, HttpSessionStore, MeasurementUpdate, Recipe,
    SessionPhase, SessionStatus, SessionStore,
};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const TOKEN: &str = "brew-secret";

#[derive(Default)]
struct FakeStore {
    session: Option<BrewingSession>,
    times: Vec<u64>,
    gravity: Vec<Value>,
}

type Shared = Arc<Mutex<FakeStore>>;
type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

struct HttpService {
    addr: SocketAddr,
    state: Shared,
    shutdown: oneshot::Sender<()>,
}

impl HttpService {
    fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    fn config(&self, token: Option<&str>) -> BrewhouseConfig {
        BrewhouseConfig {
            api_url: self.base_url(),
            api_token: token.map(str::to_string),
            environment: Environment::Development,
            sync_interval_secs: 30,
            drift_threshold_secs: 30,
        }
    }
}

async fn spawn_session_store() -> anyhow::Result<HttpService> {
    let state: Shared = Arc::default();
    let router = Router::new()
        .route("/api/recipes/:recipe_id/brewing-session/status", get(status))
        .route("/api/recipes/:recipe_id/brewing-session/start", post(start))
        .route("/api/recipes/:recipe_id/brewing-session/pause", post(pause))
        .route("/api/recipes/:recipe_id/brewing-session/resume", post(resume))
        .route("/api/recipes/:recipe_id/brewing-session/complete", post(complete))
        .route(
            "/api/recipes/:recipe_id/brewing-session/steps/:step_id",
            post(complete_step).delete(uncomplete_step),
        )
        .route("/api/recipes/:recipe_id/brewing-session/time", patch(update_time))
        .route("/api/recipes/:recipe_id/brewing-session/gravity", patch(update_gravity))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
            .ok();
    });

    Ok(HttpService {
        addr,
        state,
        shutdown: tx,
    })
}

fn authorize(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized" })),
        )),
    }
}

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "no active session" })),
    )
}

fn envelope(session: &BrewingSession) -> Json<Value> {
    Json(json!({ "session": session }))
}

async fn status(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let store = state.lock();
    Ok(Json(match &store.session {
        Some(session) if session.status != SessionStatus::Completed => {
            json!({ "hasActiveSession": true, "activeSession": session })
        }
        _ => json!({ "hasActiveSession": false }),
    }))
}

async fn start(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let session = BrewingSession {
        session_id: "session-1".into(),
        status: SessionStatus::Brewing,
        start_date: Some(Utc::now()),
        is_running: true,
        ..BrewingSession::default()
    };
    let reply = envelope(&session);
    state.lock().session = Some(session);
    Ok(reply)
}

async fn pause(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let mut store = state.lock();
    let session = store.session.as_mut().ok_or_else(not_found)?;
    session.is_running = false;
    session.is_paused = true;
    Ok(envelope(session))
}

async fn resume(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let mut store = state.lock();
    let session = store.session.as_mut().ok_or_else(not_found)?;
    session.is_running = true;
    session.is_paused = false;
    Ok(envelope(session))
}

async fn complete(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&headers)?;
    let mut store = state.lock();
    let session = store.session.as_mut().ok_or_else(not_found)?;
    if body.get("status").and_then(Value::as_str) == Some("fermenting") {
        session.status = SessionStatus::Fermenting;
        session.fermentation_start_date = Some(Utc::now());
        session.is_running = true;
        session.is_paused = false;
    } else {
        session.status = SessionStatus::Completed;
        session.is_running = false;
    }
    Ok(Json(json!({})))
}

async fn complete_step(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((_recipe_id, step_id)): Path<(String, String)>,
) -> Reply {
    authorize(&headers)?;
    let mut store = state.lock();
    let session = store.session.as_mut().ok_or_else(not_found)?;
    session.mark_step_completed(&step_id, Utc::now());
    Ok(Json(json!({})))
}

async fn uncomplete_step(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((_recipe_id, step_id)): Path<(String, String)>,
) -> Reply {
    authorize(&headers)?;
    let mut store = state.lock();
    let session = store.session.as_mut().ok_or_else(not_found)?;
    session.unmark_step_completed(&step_id);
    Ok(Json(json!({})))
}

async fn update_time(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&headers)?;
    let current_time = body
        .get("currentTime")
        .and_then(Value::as_u64)
        .ok_or((StatusCode::BAD_REQUEST, Json(json!({ "error": "currentTime required" }))))?;
    let mut store = state.lock();
    store.times.push(current_time);
    if let Some(session) = store.session.as_mut() {
        session.current_time = current_time;
    }
    Ok(Json(json!({})))
}

async fn update_gravity(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&headers)?;
    state.lock().gravity.push(body);
    Ok(Json(json!({})))
}

fn recipe() -> Recipe {
    Recipe {
        id: "recipe-42".into(),
        name: "Session IPA".into(),
        mash_time: 60,
        boil_time: 60,
        steps: Vec::new(),
    }
}

#[tokio::test]
async fn http_store_speaks_the_session_api() -> anyhow::Result<()> {
    let service = spawn_session_store().await?;
    let store = HttpSessionStore::new(&service.base_url(), Some(TOKEN.to_string()))?;

    let status = store.status("recipe-42").await?;
    assert!(!status.has_active_session);

    let session = store.start("recipe-42").await?;
    assert_eq!(session.status, SessionStatus::Brewing);
    assert!(session.start_date.is_some());

    store.update_time("recipe-42", 125).await?;
    let paused = store.pause("recipe-42").await?;
    assert!(paused.is_paused);
    assert_eq!(paused.current_time, 125);

    store.complete_step("recipe-42", "hop-60").await?;
    let status = store.status("recipe-42").await?;
    let active = status.session().expect("active session");
    assert!(active.is_step_completed("hop-60"));

    store.uncomplete_step("recipe-42", "hop-60").await?;
    store
        .update_gravity("recipe-42", &MeasurementUpdate::original_gravity(1.048))
        .await?;
    store
        .complete("recipe-42", Some(SessionStatus::Fermenting))
        .await?;

    {
        let state = service.state.lock();
        let session = state.session.as_ref().expect("session stored");
        assert!(!session.is_step_completed("hop-60"));
        assert_eq!(session.status, SessionStatus::Fermenting);
        assert_eq!(state.gravity, vec![json!({ "originalGravity": 1.048 })]);
    }

    store.complete("recipe-42", None).await?;
    assert!(!store.status("recipe-42").await?.has_active_session);

    let _ = service.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn ids_with_spaces_reach_the_store_intact() -> anyhow::Result<()> {
    let service = spawn_session_store().await?;
    let store = HttpSessionStore::new(&service.base_url(), Some(TOKEN.to_string()))?;

    store.start("pale ale").await?;
    store.complete_step("pale ale", "hop 1").await?;
    store.complete_step("pale ale", "late+hop").await?;

    {
        let state = service.state.lock();
        let session = state.session.as_ref().expect("session stored");
        let ids: Vec<&str> = session
            .completed_steps
            .iter()
            .map(|step| step.step_id.as_str())
            .collect();
        assert_eq!(ids, vec!["hop 1", "late+hop"]);
    }

    let _ = service.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn boots_from_environment() -> anyhow::Result<()> {
    let service = spawn_session_store().await?;
    std::env::set_var("BREWHOUSE_API_URL", service.base_url());
    std::env::set_var("BREWHOUSE_API_TOKEN", TOKEN);

    let runtime = boot_clock_from_env(recipe()).await?;
    assert_eq!(runtime.clock().phase(), SessionPhase::NotStarted);
    runtime.start().await?;
    assert!(service.state.lock().session.is_some());

    runtime.shutdown().await;
    let _ = service.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn error_bodies_surface_in_store_errors() -> anyhow::Result<()> {
    let service = spawn_session_store().await?;

    let anonymous = HttpSessionStore::new(&service.base_url(), None)?;
    match anonymous.status("recipe-42").await {
        Err(StoreError::UnexpectedStatus { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "unauthorized");
        }
        other => panic!("expected 401, got {other:?}"),
    }

    let store = HttpSessionStore::new(&service.base_url(), Some(TOKEN.to_string()))?;
    match store.pause("recipe-42").await {
        Err(StoreError::UnexpectedStatus { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "no active session");
        }
        other => panic!("expected 404, got {other:?}"),
    }

    let _ = service.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn unreachable_store_is_a_transport_error() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let store = HttpSessionStore::new(&format!("http://{addr}/api"), None)?;
    assert!(matches!(
        store.status("recipe-42").await,
        Err(StoreError::Http(_))
    ));
    Ok(())
}

#[tokio::test]
async fn clock_drives_the_remote_session() -> anyhow::Result<()> {
    let service = spawn_session_store().await?;
    let runtime = boot_clock(recipe(), &service.config(Some(TOKEN))).await?;
    assert_eq!(runtime.clock().phase(), SessionPhase::NotStarted);
    assert!(!runtime.loops_running());

    runtime.start().await?;
    assert_eq!(runtime.clock().phase(), SessionPhase::Brewing);
    assert!(runtime.loops_running());
    let snapshot = runtime.clock().snapshot();
    assert!(snapshot.session.and_then(|s| s.start_date).is_some());

    runtime.pause().await?;
    {
        let state = service.state.lock();
        let session = state.session.as_ref().expect("session stored");
        assert!(session.is_paused);
        assert_eq!(state.times.len(), 1);
    }

    runtime.clock().edit_measurements(MeasurementUpdate::original_gravity(1.050));
    runtime.clock().edit_measurements(MeasurementUpdate::final_gravity(1.012));
    runtime.shutdown().await;

    let state = service.state.lock();
    assert_eq!(state.gravity.len(), 1);
    let sent = &state.gravity[0];
    assert_eq!(sent["originalGravity"], json!(1.050));
    assert_eq!(sent["finalGravity"], json!(1.012));
    let abv = sent["calculatedABV"].as_f64().expect("abv sent");
    assert!((abv - 4.9875).abs() < 1e-9);
    drop(state);

    let _ = service.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn reload_picks_up_a_running_session() -> anyhow::Result<()> {
    let service = spawn_session_store().await?;
    service.state.lock().session = Some(BrewingSession {
        session_id: "session-9".into(),
        status: SessionStatus::Brewing,
        start_date: Some(Utc::now() - chrono::Duration::seconds(300)),
        current_time: 120,
        is_running: true,
        ..BrewingSession::default()
    });

    let runtime = boot_clock(recipe(), &service.config(Some(TOKEN))).await?;
    assert_eq!(runtime.clock().phase(), SessionPhase::Brewing);
    let elapsed = runtime.clock().elapsed();
    assert!((300..=302).contains(&elapsed), "elapsed was {elapsed}");

    runtime.shutdown().await;
    let _ = service.shutdown.send(());
    Ok(())
}
