//! Request/response shapes for the optimizer call (spec.md §6).

use amr_core::{JobId, RobotId};
use amr_entities::{Point, RobotState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotInput {
    pub id: RobotId,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub battery: f64,
    pub state: RobotState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInput {
    pub id: JobId,
    pub pickup: Point,
    pub dropoff: Point,
    pub deadline_ts: i64,
    pub priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub run_id: String,
    pub seed: u64,
    pub mode: String,
    pub sim_time_s: f64,
    pub robots: Vec<RobotInput>,
    pub pending_jobs: Vec<JobInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub job_id: JobId,
    pub robot_id: RobotId,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeMeta {
    pub best_score: f64,
    pub generations: usize,
    pub population_size: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub assignments: Vec<Assignment>,
    pub meta: OptimizeMeta,
}
