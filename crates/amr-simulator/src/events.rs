//! Internal, bus-agnostic event representation the tick loop produces.
//! `runner.rs` is the only place that turns these into `Envelope`s.

use amr_core::{JobId, RobotId};
use amr_entities::{Job, Robot, RobotState};
use amr_metrics::RunMetrics;

#[derive(Debug, Clone)]
pub struct RobotUpdate {
    pub robot_id: RobotId,
    pub state: RobotState,
    pub sim_time_s: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub speed: Option<f64>,
    pub battery: Option<f64>,
    pub current_job_id: Option<Option<JobId>>,
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub sim_time_s: f64,
    pub lateness_s: f64,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub sim_time_s: f64,
    pub robots: Vec<Robot>,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone)]
pub struct Telemetry {
    pub robot_id: RobotId,
    pub sim_time_s: f64,
    pub state: RobotState,
    pub x: f64,
    pub y: f64,
    pub battery: f64,
}

#[derive(Debug, Clone)]
pub enum SimEvent {
    JobCreated(Job),
    RobotUpdated(RobotUpdate),
    JobCompleted(JobOutcome),
    JobFailed(JobOutcome),
    SnapshotTick(Snapshot),
    TelemetryReceived(Telemetry),
    RunCompleted { sim_time_s: f64, metrics: RunMetrics },
}
