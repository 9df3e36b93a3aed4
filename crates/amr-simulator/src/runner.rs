//! Owns the bus subscription for inbound `job.assigned`, drives the tick
//! loop as fast as CPU allows (spec.md §9: sim-time and wall-clock are
//! decoupled), and translates `SimEvent`s into `Envelope`s.

use std::sync::Arc;

use amr_core::{Envelope, JobId, RobotId, TopicBus};
use amr_entities::Job;
use amr_scenario::{Mode, RunContext, ScenarioError};
use serde_json::json;
use tracing::info;

use crate::events::SimEvent;
use crate::world::{InboundAssignment, World};

pub struct Runner {
    pub ctx: RunContext,
    pub bus: Arc<TopicBus>,
}

impl Runner {
    pub fn new(ctx: RunContext, bus: Arc<TopicBus>) -> Self {
        Self { ctx, bus }
    }

    /// Resolves the scenario, publishes `run.started` plus the initial
    /// `job.created`/`robot.updated` events, then drives the tick loop to
    /// completion, publishing `run.completed` last.
    pub async fn run(self) {
        let scenario = match self.ctx.resolve_scenario() {
            Ok(s) => s,
            Err(err) => {
                self.publish_scenario_failure(err);
                return;
            }
        };

        let mut world = World::new(scenario.robots.clone(), scenario.jobs.clone());
        let mut assigned_rx = self.bus.subscribe(&["job.assigned"]);

        self.publish_run_started();
        for job in &scenario.jobs {
            self.publish(
                "job.created",
                0.0,
                job_payload(job, 0.0),
            );
        }
        for robot in &scenario.robots {
            self.publish(
                "robot.updated",
                0.0,
                json!({
                    "robot_id": robot.id.value(),
                    "state": robot.state.as_str(),
                    "sim_time_s": 0.0,
                    "x": robot.x,
                    "y": robot.y,
                    "speed": robot.speed,
                    "battery": robot.battery,
                    "current_job_id": robot.current_job_id.as_ref().map(|j| j.as_str().to_string()),
                }),
            );
        }

        loop {
            let mut inbound = Vec::new();
            while let Ok(envelope) = assigned_rx.try_recv() {
                if let Some(cmd) = decode_assignment(&envelope) {
                    inbound.push(cmd);
                }
            }

            let events = world.tick(&self.ctx.config, inbound);
            for event in events {
                self.publish_sim_event(event);
            }

            if world.should_terminate(&self.ctx.config) {
                break;
            }
        }

        for event in world.fail_incomplete_jobs() {
            self.publish_sim_event(event);
        }

        let metrics = world.finalize_metrics();
        info!(run_id = %self.ctx.run_id, completed = metrics.completed_jobs, failed = metrics.failed_jobs, "run completed");
        self.publish(
            "run.completed",
            world.sim_time.seconds(),
            json!({
                "run_id": self.ctx.run_id,
                "sim_time_s": world.sim_time.seconds(),
                "metrics": metrics,
            }),
        );
    }

    fn publish_sim_event(&self, event: SimEvent) {
        match event {
            SimEvent::JobCreated(job) => {
                self.publish("job.created", job.created_sim_ts, job_payload(&job, job.created_sim_ts));
            }
            SimEvent::RobotUpdated(u) => {
                self.publish(
                    "robot.updated",
                    u.sim_time_s,
                    json!({
                        "robot_id": u.robot_id.value(),
                        "state": u.state.as_str(),
                        "sim_time_s": u.sim_time_s,
                        "x": u.x,
                        "y": u.y,
                        "speed": u.speed,
                        "battery": u.battery,
                        "current_job_id": u.current_job_id.flatten().map(|j| j.as_str().to_string()),
                    }),
                );
            }
            SimEvent::JobCompleted(outcome) => {
                self.publish(
                    "job.completed",
                    outcome.sim_time_s,
                    json!({
                        "run_id": self.ctx.run_id,
                        "job_id": outcome.job_id.as_str(),
                        "sim_time_s": outcome.sim_time_s,
                        "lateness_s": outcome.lateness_s,
                    }),
                );
            }
            SimEvent::JobFailed(outcome) => {
                self.publish(
                    "job.failed",
                    outcome.sim_time_s,
                    json!({
                        "run_id": self.ctx.run_id,
                        "job_id": outcome.job_id.as_str(),
                        "sim_time_s": outcome.sim_time_s,
                        "lateness_s": outcome.lateness_s,
                    }),
                );
            }
            SimEvent::SnapshotTick(snap) => {
                self.publish(
                    "snapshot.tick",
                    snap.sim_time_s,
                    json!({
                        "run_id": self.ctx.run_id,
                        "sim_time_s": snap.sim_time_s,
                        "snapshot": {
                            "robots": snap.robots,
                            "jobs": snap.jobs,
                        },
                    }),
                );
            }
            SimEvent::TelemetryReceived(t) => {
                self.publish(
                    "telemetry.received",
                    t.sim_time_s,
                    json!({
                        "run_id": self.ctx.run_id,
                        "sim_time_s": t.sim_time_s,
                        "robot_id": t.robot_id.value(),
                        "state": t.state.as_str(),
                        "x": t.x,
                        "y": t.y,
                        "battery": t.battery,
                    }),
                );
            }
            SimEvent::RunCompleted { .. } => {}
        }
    }

    fn publish_run_started(&self) {
        self.publish(
            "run.started",
            0.0,
            json!({
                "run_id": self.ctx.run_id,
                "mode": self.ctx.mode.as_str(),
                "seed": self.ctx.seed,
                "scale": self.ctx.scale.as_str(),
            }),
        );
    }

    fn publish_scenario_failure(&self, err: ScenarioError) {
        self.publish(
            "run.completed",
            0.0,
            json!({
                "run_id": self.ctx.run_id,
                "sim_time_s": 0.0,
                "failure": err.to_string(),
            }),
        );
    }

    fn publish(&self, routing_key: &str, sim_time_s: f64, payload: serde_json::Value) {
        let envelope = Envelope {
            event_id: self.bus.next_event_id(),
            event_type: routing_key.to_string(),
            run_id: self.ctx.run_id.clone(),
            mode: self.ctx.mode.as_str().to_string(),
            seed: self.ctx.seed,
            scale: self.ctx.scale.as_str().to_string(),
            sim_time_s,
            ts_utc: Envelope::now_ts_utc(),
            payload,
        };
        self.bus.publish(routing_key, envelope);
    }
}

fn job_payload(job: &Job, sim_time_s: f64) -> serde_json::Value {
    json!({
        "job_id": job.id.as_str(),
        "pickup_x": job.pickup.x,
        "pickup_y": job.pickup.y,
        "dropoff_x": job.dropoff.x,
        "dropoff_y": job.dropoff.y,
        "deadline_ts": job.deadline_ts,
        "priority": job.priority,
        "sim_time_s": sim_time_s,
    })
}

fn decode_assignment(envelope: &Envelope) -> Option<InboundAssignment> {
    let payload = &envelope.payload;
    let job_id = payload.get("job_id")?.as_str()?;
    let robot_id = payload.get("robot_id")?.as_u64()? as u32;
    let idempotency_key = payload
        .get("idempotency_key")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{}:{}", envelope.run_id, job_id));

    Some(InboundAssignment {
        job_id: JobId::new(job_id),
        robot_id: RobotId(robot_id),
        idempotency_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_scenario::Scale;

    #[tokio::test]
    async fn mini_baseline_run_terminates_and_publishes_run_completed() {
        let bus = Arc::new(TopicBus::new());
        let mut ctx = RunContext::new("run-test", Mode::Baseline, 7, Scale::Mini);
        ctx.config.max_sim_seconds = 600.0;
        let mut completed_rx = bus.subscribe(&["run.completed"]);

        let runner = Runner::new(ctx, bus.clone());
        runner.run().await;

        let envelope = completed_rx.try_recv().expect("run.completed should be published");
        assert_eq!(envelope.event_type, "run.completed");
    }
}
