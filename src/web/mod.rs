//! JSON and server-sent-events host. The engine sits behind a single mutex so
//! commands are applied one at a time.

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    engine::{Command, TurnEngine},
    observer::{Cue, EngineObserver},
    save::{AutosaveObserver, SaveError, SaveState, SaveStore},
    scenario::Scenario,
    snapshot::EngineSnapshot,
    world::Phase,
};

/// One message on the event stream.
#[derive(Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventFrame {
    Phase {
        from: Phase,
        to: Phase,
        snapshot: EngineSnapshot,
    },
    Cue {
        cue: Cue,
    },
}

/// Forwards engine notifications to every connected event stream.
pub struct BroadcastObserver {
    sender: broadcast::Sender<String>,
}

impl BroadcastObserver {
    pub fn new(sender: broadcast::Sender<String>) -> Self {
        Self { sender }
    }

    fn publish(&self, frame: &EventFrame) {
        match serde_json::to_string(frame) {
            // No subscribers is not an error.
            Ok(payload) => {
                let _ = self.sender.send(payload);
            }
            Err(err) => warn!(error = %err, "failed to encode event frame"),
        }
    }
}

impl EngineObserver for BroadcastObserver {
    fn phase_changed(&mut self, from: Phase, to: Phase, snapshot: &EngineSnapshot) {
        self.publish(&EventFrame::Phase {
            from,
            to,
            snapshot: snapshot.clone(),
        });
    }

    fn cue(&mut self, cue: &Cue) {
        self.publish(&EventFrame::Cue { cue: cue.clone() });
    }
}

#[derive(Serialize)]
pub struct CommandResponse {
    pub accepted: bool,
    pub snapshot: EngineSnapshot,
}

#[derive(Debug)]
enum ApiError {
    EngineUnavailable,
    NoSaveStore,
    Save(SaveError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::EngineUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "engine state is unavailable".to_string(),
            ),
            ApiError::NoSaveStore => (
                StatusCode::NOT_FOUND,
                "server was started without a save path".to_string(),
            ),
            ApiError::Save(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

struct AppState {
    engine: Mutex<TurnEngine>,
    broadcaster: broadcast::Sender<String>,
    store: Option<SaveStore>,
}

impl AppState {
    fn engine(&self) -> Result<MutexGuard<'_, TurnEngine>, ApiError> {
        self.engine.lock().map_err(|_| ApiError::EngineUnavailable)
    }
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub host: String,
    pub port: u16,
    /// Where saves go; the session resumes from it when the file exists.
    pub save_path: Option<PathBuf>,
    /// Autosave every this many weeks. Zero disables autosave.
    pub autosave_weeks: u32,
}

fn build_engine(config: &WebServerConfig, sender: &broadcast::Sender<String>) -> Result<TurnEngine> {
    let mut builder = config
        .scenario
        .engine_builder()?
        .with_observer(BroadcastObserver::new(sender.clone()));
    let Some(path) = &config.save_path else {
        return Ok(builder.build()?);
    };
    if config.autosave_weeks > 0 {
        builder = builder.with_observer(AutosaveObserver::new(
            SaveStore::new(path),
            config.autosave_weeks,
        ));
    }
    let store = SaveStore::new(path);
    if store.exists() {
        let save = store
            .load()
            .with_context(|| format!("Failed to load save {}", path.display()))?;
        info!(path = %path.display(), week = save.farm.week_index(), "resuming saved session");
        return Ok(builder.restore(save)?);
    }
    Ok(builder.build()?)
}

pub fn router(engine: TurnEngine, broadcaster: broadcast::Sender<String>, store: Option<SaveStore>) -> Router {
    let state = Arc::new(AppState {
        engine: Mutex::new(engine),
        broadcaster,
        store,
    });
    Router::new()
        .route("/api/state", get(current_state))
        .route("/api/commands", post(apply_command))
        .route("/api/save", get(current_save).post(write_save))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let (tx, _) = broadcast::channel::<String>(512);
    let engine = build_engine(&config, &tx)?;
    let store = config.save_path.as_ref().map(SaveStore::new);
    let app = router(engine, tx, store);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    info!(scenario = %config.scenario.name, %addr, "serving (Ctrl+C to stop)");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

async fn current_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EngineSnapshot>, ApiError> {
    Ok(Json(state.engine()?.snapshot()))
}

async fn apply_command(
    State(state): State<Arc<AppState>>,
    Json(command): Json<Command>,
) -> Result<Json<CommandResponse>, ApiError> {
    let mut engine = state.engine()?;
    let accepted = engine.apply(command);
    Ok(Json(CommandResponse {
        accepted,
        snapshot: engine.snapshot(),
    }))
}

async fn current_save(State(state): State<Arc<AppState>>) -> Result<Json<SaveState>, ApiError> {
    Ok(Json(state.engine()?.save_state()))
}

async fn write_save(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    let store = state.store.as_ref().ok_or(ApiError::NoSaveStore)?;
    let save = state.engine()?.save_state();
    store.save(&save).map_err(ApiError::Save)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
