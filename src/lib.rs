pub mod bracket;
pub mod config;
pub mod error;
pub mod ranking;
pub mod results;
pub mod standings;
pub mod store;
pub mod types;

use std::fs;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use error::ApiError;
use store::{Store, StoreData};
use types::*;

// ── Shared state ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub config: AppConfig,
}

// ── Handlers ───────────────────────────────────────────────────────────

async fn get_playoff(State(state): State<AppState>, Path(id): Path<u32>) -> Json<Value> {
    Json(state.store.read(|data| bracket::bracket_overview(data, id)))
}

async fn post_playoff(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<BracketGenerated>, ApiError> {
    let out = state
        .store
        .transaction(|data| bracket::generate_bracket(data, id))?;
    info!(
        "tournament {id}: play-off generated, {} {} matches",
        out.match_count,
        out.initial_round.label()
    );
    Ok(Json(out))
}

async fn delete_playoff(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<BracketDeleted>, ApiError> {
    let deleted = state
        .store
        .transaction(|data| Ok(bracket::delete_bracket(data, id)))?;
    info!("tournament {id}: play-off reset, {deleted} matches removed");
    Ok(Json(BracketDeleted { deleted }))
}

async fn patch_match_result(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<MatchResultRequest>,
) -> Result<Json<MatchResultResponse>, ApiError> {
    let now = config::now_stamp();
    let winner_id = state
        .store
        .transaction(|data| results::record_result(data, id, &request, &now))?;
    info!("match {id}: finalized, winner team {winner_id}");
    Ok(Json(MatchResultResponse { winner_id }))
}

async fn post_ranking(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<RankingOutcome>, ApiError> {
    let config = state.config.clone();
    let out = state
        .store
        .transaction(|data| ranking::generate_ranking(data, id, &config))?;
    if out.players_processed == 0 {
        info!("tournament {id}: ranking already generated, nothing applied");
    } else {
        info!(
            "tournament {id}: ranking updated for {} player entries",
            out.players_processed
        );
    }
    Ok(Json(out))
}

async fn get_ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Json<Vec<RankingEntry>> {
    Json(
        state
            .store
            .read(|data| ranking::list_ranking(data, query.category)),
    )
}

// ── Router & entry point ───────────────────────────────────────────────

pub fn league_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/tournaments/:id/playoff",
            get(get_playoff).post(post_playoff).delete(delete_playoff),
        )
        .route("/matches/:id/result", patch(patch_match_result))
        .route("/tournaments/:id/ranking", post(post_ranking))
        .route("/ranking", get(get_ranking))
        .with_state(state)
}

pub async fn run() {
    config::load_env_file();

    // Tracing with file + stderr output, daily rotation under logs/.
    let logs_dir = config::repo_root().join("logs");
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("Padel league server starting");

    let config = match config::load_config_inner() {
        Ok(config) => config,
        Err(e) => {
            error!("config error: {e}; falling back to defaults");
            AppConfig::default()
        }
    };

    let mut data = StoreData::default();
    if config.test_mode {
        let path = config::resolve_repo_path(&config.fixture_path);
        match store::load_fixture(&path) {
            Ok(fixture) => {
                data = StoreData::from_fixture(fixture);
                info!("test mode: fixture loaded from {}", path.display());
            }
            Err(e) => error!("test mode: {e}"),
        }
    }

    let state = AppState {
        store: Arc::new(Store::new(data)),
        config: config.clone(),
    };
    let app = league_router(state);

    let listener = match TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {e}", config.bind_addr);
            return;
        }
    };
    info!("listening at http://{}/", config.bind_addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
    }
}
