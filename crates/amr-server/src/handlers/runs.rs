//! `POST /api/runs`: spawns a simulator + dispatcher pair wired over a
//! fresh `TopicBus` and registers it with the session manager.

use std::sync::Arc;

use amr_core::TopicBus;
use amr_dispatcher::Dispatcher;
use amr_scenario::{JobOverride, Mode, RobotOverride, RunContext, Scale};
use amr_simulator::Runner;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::session::{RunHandle, SessionManager};

#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    pub mode: Mode,
    pub seed: u64,
    pub scale: Scale,
    #[serde(default)]
    pub robots: Option<Vec<RobotOverride>>,
    #[serde(default)]
    pub jobs: Option<Vec<JobOverride>>,
}

#[derive(Debug, Serialize)]
pub struct CreateRunResponse {
    pub run_id: String,
    pub mode: String,
    pub scale: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn create_run(
    State(sessions): State<SessionManager>,
    Json(request): Json<CreateRunRequest>,
) -> Result<Json<CreateRunResponse>, (StatusCode, Json<ErrorResponse>)> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let mut ctx = RunContext::new(run_id.clone(), request.mode, request.seed, request.scale);
    ctx.robots_override = request.robots;
    ctx.jobs_override = request.jobs;

    if let Err(err) = ctx.resolve_scenario() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse { error: err.to_string() }),
        ));
    }

    let bus = Arc::new(TopicBus::new());

    let dispatcher = Dispatcher::new(
        ctx.run_id.clone(),
        ctx.mode,
        ctx.seed,
        ctx.scale.as_str().to_string(),
        ctx.config,
        bus.clone(),
    );
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let runner = Runner::new(ctx.clone(), bus.clone());
    let simulator_task = tokio::spawn(runner.run());

    info!(run_id = %ctx.run_id, mode = ctx.mode.as_str(), scale = ctx.scale.as_str(), "run created");

    let response = CreateRunResponse {
        run_id: ctx.run_id.clone(),
        mode: ctx.mode.as_str().to_string(),
        scale: ctx.scale.as_str().to_string(),
    };

    sessions
        .insert(RunHandle::new(
            ctx.run_id,
            ctx.mode,
            ctx.seed,
            ctx.scale,
            bus,
            simulator_task,
            dispatcher_task,
        ))
        .await;

    Ok(Json(response))
}
