//! Single binary web server for tournament finalization and competitive profiles.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, SCORING_CONFIG (path to a JSON scoring config).

use actix_web::{
    get, post, put,
    web::{Bytes, Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tournament_awards::{
    event_channel, import_results, CompetitiveProfile, CompletionEvent, FinalizeError,
    FinalizeOutcome, Finalizer, ImportError, InMemoryStore, MatchResult, ParticipantStatus,
    ScoringConfig, StoreError, Tournament, TournamentError, TournamentId, UserId,
};

struct AppState {
    store: Arc<InMemoryStore>,
    finalizer: Finalizer<Arc<InMemoryStore>>,
}

type State = Data<AppState>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default)]
    game: String,
    organizer_id: UserId,
}

#[derive(Deserialize)]
struct AddParticipantBody {
    user_id: UserId,
}

#[derive(Deserialize)]
struct SetStatusBody {
    status: ParticipantStatus,
}

#[derive(Deserialize)]
struct RecordResultBody {
    round: u32,
    player_a: UserId,
    player_b: UserId,
    winner: Option<UserId>,
    #[serde(default)]
    score: Option<String>,
}

/// Who asks for finalization. Authentication happens upstream; this only checks the role.
#[derive(Deserialize)]
struct FinalizeBody {
    actor_id: UserId,
    #[serde(default)]
    is_admin: bool,
}

#[derive(Deserialize)]
struct SeedProfileBody {
    points: f64,
    #[serde(default)]
    last_competitive_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct TournamentUserPath {
    id: TournamentId,
    user_id: UserId,
}

#[derive(Deserialize)]
struct ProfilePath {
    user_id: UserId,
}

fn error_json(message: impl ToString) -> serde_json::Value {
    serde_json::json!({ "error": message.to_string() })
}

fn store_error_response(e: StoreError) -> HttpResponse {
    match e {
        StoreError::TournamentNotFound(_) => HttpResponse::NotFound().json(error_json("No tournament")),
        other => HttpResponse::ServiceUnavailable().json(error_json(other)),
    }
}

fn tournament_error_response(e: TournamentError) -> HttpResponse {
    match e {
        TournamentError::AlreadyAwarded => HttpResponse::Conflict().json(error_json(e)),
        other => HttpResponse::BadRequest().json(error_json(other)),
    }
}

/// Run an edit against a stored tournament and answer with the updated tournament.
fn edit_tournament(
    state: &AppState,
    id: TournamentId,
    edit: impl FnOnce(&mut Tournament) -> Result<(), TournamentError>,
) -> HttpResponse {
    match state.store.update_tournament(id, edit) {
        Ok(Ok(())) => match state.store.tournament(id) {
            Ok(t) => HttpResponse::Ok().json(t),
            Err(e) => store_error_response(e),
        },
        Ok(Err(e)) => tournament_error_response(e),
        Err(e) => store_error_response(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tournament-awards",
    })
}

/// Create a tournament in Registration.
#[post("/api/tournaments")]
async fn api_create_tournament(state: State, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    let tournament = Tournament::new(body.name.trim(), body.game.trim(), body.organizer_id, Utc::now());
    let id = tournament.id;
    if let Err(e) = state.store.insert_tournament(tournament) {
        return store_error_response(e);
    }
    log::info!("Created tournament {}", id);
    match state.store.tournament(id) {
        Ok(t) => HttpResponse::Ok().json(t),
        Err(e) => store_error_response(e),
    }
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    match state.store.tournament(path.id) {
        Ok(t) => HttpResponse::Ok().json(t),
        Err(e) => store_error_response(e),
    }
}

/// Register a user (Registration or Ongoing).
#[post("/api/tournaments/{id}/participants")]
async fn api_add_participant(
    state: State,
    path: Path<TournamentPath>,
    body: Json<AddParticipantBody>,
) -> HttpResponse {
    edit_tournament(&state, path.id, |t| t.add_participant(body.user_id))
}

/// Change a participant's status (disqualify, expel, ...).
#[put("/api/tournaments/{id}/participants/{user_id}/status")]
async fn api_set_participant_status(
    state: State,
    path: Path<TournamentUserPath>,
    body: Json<SetStatusBody>,
) -> HttpResponse {
    edit_tournament(&state, path.id, |t| {
        t.set_participant_status(path.user_id, body.status)
    })
}

/// Registration -> Ongoing.
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    edit_tournament(&state, path.id, Tournament::start)
}

/// Report one match result (Ongoing only).
#[post("/api/tournaments/{id}/results")]
async fn api_record_result(
    state: State,
    path: Path<TournamentPath>,
    body: Json<RecordResultBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let mut result = MatchResult::new(body.round, body.player_a, body.player_b, body.winner, Utc::now());
    result.score = body.score;
    edit_tournament(&state, path.id, |t| t.record_result(result))
}

/// Import results from a CSV body; all rows are recorded or none.
#[post("/api/tournaments/{id}/results/import")]
async fn api_import_results(state: State, path: Path<TournamentPath>, body: Bytes) -> HttpResponse {
    let mut import_error: Option<ImportError> = None;
    let outcome = state.store.update_tournament(path.id, |t| {
        import_results(t, body.as_ref(), Utc::now()).map_err(|e| {
            let rejected = match &e {
                ImportError::Rejected { source, .. } => source.clone(),
                ImportError::Csv(_) => TournamentError::InvalidResult("unreadable CSV"),
            };
            import_error = Some(e);
            rejected
        })
    });
    match outcome {
        Ok(Ok(count)) => HttpResponse::Ok().json(serde_json::json!({ "imported": count })),
        Ok(Err(e)) => match import_error {
            Some(detail) => HttpResponse::BadRequest().json(error_json(detail)),
            None => tournament_error_response(e),
        },
        Err(e) => store_error_response(e),
    }
}

/// Finalize: compute and award points exactly once. Organizer or admin only.
#[post("/api/tournaments/{id}/finalize")]
async fn api_finalize(state: State, path: Path<TournamentPath>, body: Json<FinalizeBody>) -> HttpResponse {
    let tournament = match state.store.tournament(path.id) {
        Ok(t) => t,
        Err(e) => return store_error_response(e),
    };
    if !body.is_admin && body.actor_id != tournament.organizer_id {
        return HttpResponse::Forbidden().json(error_json("Only the organizer or an administrator can finalize"));
    }
    match state.finalizer.finalize(path.id, Utc::now()) {
        Ok(FinalizeOutcome::Awarded(report)) => HttpResponse::Ok().json(serde_json::json!({
            "already_awarded": false,
            "awards": report.awards,
        })),
        Ok(FinalizeOutcome::AlreadyAwarded(awards)) => HttpResponse::Ok().json(serde_json::json!({
            "already_awarded": true,
            "awards": awards,
        })),
        Err(FinalizeError::TournamentNotFound(_)) => {
            HttpResponse::NotFound().json(error_json("No tournament"))
        }
        Err(e) if e.is_retryable() => {
            log::warn!("Finalize {} failed, client may retry: {}", path.id, e);
            HttpResponse::ServiceUnavailable().json(error_json(e))
        }
        Err(e) => {
            log::info!("Finalize {} rejected: {}", path.id, e);
            HttpResponse::Conflict().json(error_json(e))
        }
    }
}

#[get("/api/profiles/{user_id}")]
async fn api_get_profile(state: State, path: Path<ProfilePath>) -> HttpResponse {
    match state.store.profile(path.user_id) {
        Ok(p) => HttpResponse::Ok().json(p),
        Err(e) => store_error_response(e),
    }
}

/// Seed a profile's points and last activity (admin tooling; history is kept).
#[put("/api/profiles/{user_id}")]
async fn api_seed_profile(state: State, path: Path<ProfilePath>, body: Json<SeedProfileBody>) -> HttpResponse {
    let current = match state.store.profile(path.user_id) {
        Ok(p) => p,
        Err(e) => return store_error_response(e),
    };
    let profile = CompetitiveProfile {
        points: body.points.max(0.0),
        level: None,
        last_competitive_at: body.last_competitive_at,
        ..current
    };
    match state.store.put_profile(path.user_id, profile.clone()) {
        Ok(()) => HttpResponse::Ok().json(profile),
        Err(e) => store_error_response(e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn load_config() -> std::io::Result<ScoringConfig> {
    match std::env::var("SCORING_CONFIG") {
        Ok(path) => {
            let config = ScoringConfig::from_json_file(&path)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            log::info!("Loaded scoring config from {}", path);
            Ok(config)
        }
        Err(_) => Ok(ScoringConfig::default()),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    let config = load_config()?;
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let store = Arc::new(InMemoryStore::new());
    let (events_tx, mut events_rx) = event_channel();
    let finalizer = Finalizer::new(store.clone(), config).with_events(events_tx);
    let state = Data::new(AppState { store, finalizer });

    // Background task: hand completion events to the notification side (logged here).
    actix_web::rt::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                CompletionEvent::TournamentCompleted {
                    tournament_id,
                    user_id,
                    placement,
                    delta,
                } => log::info!(
                    "Tournament {} completed for {}: placement {}, delta {}",
                    tournament_id,
                    user_id,
                    placement,
                    delta
                ),
                CompletionEvent::LevelUp {
                    user_id,
                    old_level,
                    new_level,
                } => log::info!("{} levelled up: {} -> {}", user_id, old_level, new_level),
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_add_participant)
            .service(api_set_participant_status)
            .service(api_start_tournament)
            .service(api_record_result)
            .service(api_import_results)
            .service(api_finalize)
            .service(api_get_profile)
            .service(api_seed_profile)
    })
    .bind(bind)?
    .run()
    .await
}
