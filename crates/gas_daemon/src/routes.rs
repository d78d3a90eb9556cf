use crate::alerts;
use crate::state::{AppState, Session};
use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{
        sse::{Event, Sse},
        Json,
    },
    routing::{delete, get, post, put},
    Router,
};
use gas_core::kpi::{zone_snapshot, ZoneSnapshot, SNAPSHOT_VERSION};
use gas_core::{ConfigError, GasId, ManualOverrideState, Scenario, ThresholdLadder, ZoneId};
use gas_control::ControlPanel;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub fn make_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/meta", get(meta_handler))
        .route("/api/v1/sessions", post(create_session_handler))
        .route("/api/v1/sessions/:id", delete(delete_session_handler))
        .route("/api/v1/sessions/:id/scenario", get(scenario_handler))
        .route("/api/v1/sessions/:id/zone/:zone", put(zone_edit_handler))
        .route("/api/v1/sessions/:id/gas/:gas", put(gas_edit_handler))
        .route("/api/v1/sessions/:id/gas/:gas/ladder", put(ladder_handler))
        .route("/api/v1/sessions/:id/override/:zone", put(override_handler))
        .route("/api/v1/sessions/:id/series", get(series_handler))
        .route("/api/v1/sessions/:id/kpis", get(kpis_handler))
        .route("/api/v1/sessions/:id/alerts", get(alerts_handler))
        .route("/api/v1/sessions/:id/stream", get(stream_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

type ApiError = (StatusCode, Json<serde_json::Value>);

fn unknown_session(id: Uuid) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": format!("unknown session {id}")})),
    )
}

fn rejected(err: &ConfigError) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({"error": err.to_string()})),
    )
}

/// Stages an edit on a draft so that multi-field edits land atomically, then
/// commits and bumps the session revision. Returns the new revision.
fn apply_edit(
    state: &AppState,
    id: Uuid,
    edit: impl FnOnce(&mut Scenario) -> Result<(), ConfigError>,
) -> Result<u64, ApiError> {
    let mut sessions = state.sessions.lock();
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;
    let mut draft = session.scenario.clone();
    edit(&mut draft).map_err(|err| {
        tracing::warn!(session = %id, "edit rejected: {err}");
        rejected(&err)
    })?;
    session.scenario = draft;
    session.mark_edited();
    Ok(session.revision)
}

// ---------------------------------------------------------------------------
// Meta and sessions
// ---------------------------------------------------------------------------

pub async fn meta_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let open_sessions = state.sessions.lock().len();
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "scenario_format_version": gas_scenario::SCENARIO_FORMAT_VERSION,
        "snapshot_version": SNAPSHOT_VERSION,
        "cycle_days": gas_core::CYCLE_DAYS,
        "trim_limit_pct": gas_core::TRIM_LIMIT_PCT,
        "open_sessions": open_sessions,
        "template_zones": state.template.zones.len(),
        "template_gases": state.template.gases.len(),
    }))
}

pub async fn create_session_handler(
    State(state): State<AppState>,
    body: Option<Json<Scenario>>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let scenario = match body {
        Some(Json(uploaded)) => {
            gas_scenario::validate(&uploaded).map_err(|err| rejected(&err))?;
            uploaded
        }
        None => (*state.template).clone(),
    };
    let id = Uuid::new_v4();
    state.sessions.lock().insert(id, Session::new(scenario));
    tracing::info!(session = %id, "session created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"session_id": id, "revision": 0})),
    ))
}

pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.sessions.lock().remove(&id).is_none() {
        return Err(unknown_session(id));
    }
    tracing::info!(session = %id, "session deleted");
    Ok(Json(serde_json::json!({"deleted": true})))
}

pub async fn scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Scenario>, ApiError> {
    let sessions = state.sessions.lock();
    let session = sessions.get(&id).ok_or_else(|| unknown_session(id))?;
    Ok(Json(session.scenario.clone()))
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ZoneEdit {
    substrate_kg: Option<f64>,
    process_day: Option<f64>,
    max_airflow_m3_h: Option<f64>,
}

pub async fn zone_edit_handler(
    State(state): State<AppState>,
    Path((id, zone)): Path<(Uuid, String)>,
    Json(edit): Json<ZoneEdit>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let zone_id = ZoneId(zone);
    let revision = apply_edit(&state, id, |scenario| {
        if let Some(mass) = edit.substrate_kg {
            gas_scenario::set_substrate_mass(scenario, &zone_id, mass)?;
        }
        if let Some(day) = edit.process_day {
            gas_scenario::set_process_day(scenario, &zone_id, day)?;
        }
        if let Some(capacity) = edit.max_airflow_m3_h {
            gas_scenario::set_airflow_capacity(scenario, &zone_id, capacity)?;
        }
        Ok(())
    })?;
    tracing::info!(session = %id, zone = %zone_id, revision, "zone edited");
    Ok(Json(serde_json::json!({"revision": revision})))
}

#[derive(Deserialize)]
pub struct GasEdit {
    rate_g_kg_h: Option<f64>,
    ambient_ppm: Option<f64>,
}

pub async fn gas_edit_handler(
    State(state): State<AppState>,
    Path((id, gas)): Path<(Uuid, String)>,
    Json(edit): Json<GasEdit>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let gas_id = GasId(gas);
    let revision = apply_edit(&state, id, |scenario| {
        if let Some(rate) = edit.rate_g_kg_h {
            gas_scenario::set_gas_rate(scenario, &gas_id, rate)?;
        }
        if let Some(ambient) = edit.ambient_ppm {
            gas_scenario::set_gas_ambient(scenario, &gas_id, ambient)?;
        }
        Ok(())
    })?;
    tracing::info!(session = %id, gas = %gas_id, revision, "gas edited");
    Ok(Json(serde_json::json!({"revision": revision})))
}

pub async fn ladder_handler(
    State(state): State<AppState>,
    Path((id, gas)): Path<(Uuid, String)>,
    Json(ladder): Json<ThresholdLadder>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let gas_id = GasId(gas);
    let revision = apply_edit(&state, id, |scenario| {
        gas_scenario::set_ladder(scenario, &gas_id, ladder)
    })?;
    tracing::info!(session = %id, gas = %gas_id, revision, "ladder replaced");
    Ok(Json(serde_json::json!({"revision": revision})))
}

pub async fn override_handler(
    State(state): State<AppState>,
    Path((id, zone)): Path<(Uuid, String)>,
    Json(override_state): Json<ManualOverrideState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let zone_id = ZoneId(zone);
    let revision = apply_edit(&state, id, |scenario| {
        gas_scenario::set_override(scenario, &zone_id, override_state)
    })?;
    tracing::info!(session = %id, zone = %zone_id, revision, "override updated");
    Ok(Json(serde_json::json!({"revision": revision})))
}

// ---------------------------------------------------------------------------
// Read surfaces
// ---------------------------------------------------------------------------

pub async fn series_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, [(header::HeaderName, &'static str); 1], String), ApiError> {
    let report = {
        let mut sessions = state.sessions.lock();
        let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;
        session.current_report()
    };
    match serde_json::to_string(&*report) {
        Ok(json) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json,
        )),
        Err(err) => {
            tracing::error!("series serialization failed: {err}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "serialization failed"})),
            ))
        }
    }
}

#[derive(Deserialize)]
pub struct KpiQuery {
    day: Option<f64>,
}

pub async fn kpis_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<KpiQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(day) = query.day {
        if !day.is_finite() || day < 0.0 {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "error": format!("snapshot day must be finite and non-negative, got {day}")
                })),
            ));
        }
    }
    let sessions = state.sessions.lock();
    let session = sessions.get(&id).ok_or_else(|| unknown_session(id))?;
    let mut panel = ControlPanel::default();
    let zones: Vec<ZoneSnapshot> = session
        .scenario
        .zones
        .iter()
        .map(|zone| zone_snapshot(zone, &session.scenario.gases, query.day, &mut panel))
        .collect();
    Ok(Json(serde_json::json!({
        "snapshot_version": SNAPSHOT_VERSION,
        "zones": zones,
    })))
}

pub async fn alerts_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut sessions = state.sessions.lock();
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;
    let report = session.current_report();
    let active = alerts::evaluate(&report, &session.scenario);
    drop(sessions);
    Ok(Json(serde_json::json!({"active_alerts": active})))
}

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

pub async fn stream_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let mut rx = {
        let sessions = state.sessions.lock();
        let session = sessions.get(&id).ok_or_else(|| unknown_session(id))?;
        session.revision_tx.subscribe()
    };
    let sessions = Arc::clone(&state.sessions);

    let stream = async_stream::stream! {
        let mut heartbeat = tokio::time::interval(Duration::from_secs(5));
        heartbeat.tick().await; // discard the immediate first tick
        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(revision) => {
                            let data = serde_json::json!({"revision": revision});
                            yield Ok(Event::default().data(data.to_string()));
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = heartbeat.tick() => {
                    // The sender outlives the session only inside this task;
                    // a deleted session ends the stream.
                    let Some(revision) = sessions.lock().get(&id).map(|s| s.revision) else {
                        break;
                    };
                    let hb = serde_json::json!({"heartbeat": true, "revision": revision});
                    yield Ok(Event::default().data(hb.to_string()));
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    ))
}
