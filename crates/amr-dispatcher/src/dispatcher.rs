//! The dispatcher actor: one event-loop per run, wiring the projection,
//! baseline policy, and GA trigger protocol onto the shared bus
//! (spec.md §4.3, §5 concurrency model).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use amr_core::{Envelope, JobId, RobotId, TopicBus};
use amr_entities::{Job, JobState, Point, RobotState};
use amr_optimizer::{optimize_with_params, GaParams, JobInput, RobotInput};
use amr_scenario::{Mode, RunConfig};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::baseline::run_baseline_sweep;
use crate::ga_trigger::{idle_gap_trigger, initial_trigger, periodic_trigger, GaTrigger};
use crate::projection::Projection;

pub struct Dispatcher {
    pub run_id: String,
    pub mode: Mode,
    pub seed: u64,
    pub scale: String,
    pub config: RunConfig,
    pub bus: Arc<TopicBus>,
}

struct OptimizeOutcome {
    trigger: GaTrigger,
    sim_time_s: f64,
    jobs_snapshot: Vec<Job>,
    assignments: Vec<(JobId, RobotId)>,
}

impl Dispatcher {
    pub fn new(run_id: String, mode: Mode, seed: u64, scale: String, config: RunConfig, bus: Arc<TopicBus>) -> Self {
        Self {
            run_id,
            mode,
            seed,
            scale,
            config,
            bus,
        }
    }

    pub async fn run(self) {
        let mut bus_rx = self.bus.subscribe(&[
            "run.started",
            "job.created",
            "robot.updated",
            "job.completed",
            "job.failed",
            "snapshot.tick",
            "run.completed",
        ]);
        let (opt_tx, mut opt_rx) = mpsc::unbounded_channel::<OptimizeOutcome>();
        let mut projection = Projection::new();
        let in_flight = Arc::new(AtomicBool::new(false));

        loop {
            tokio::select! {
                envelope = bus_rx.recv() => {
                    match envelope {
                        Some(envelope) => {
                            let finished = envelope.event_type == "run.completed";
                            self.handle_envelope(envelope, &mut projection, &in_flight, &opt_tx);
                            if finished {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                Some(outcome) = opt_rx.recv() => {
                    self.apply_optimize_outcome(outcome, &mut projection, &in_flight);
                }
            }
        }
    }

    fn handle_envelope(
        &self,
        envelope: Envelope,
        projection: &mut Projection,
        in_flight: &Arc<AtomicBool>,
        opt_tx: &mpsc::UnboundedSender<OptimizeOutcome>,
    ) {
        projection.in_flight_optimize = in_flight.load(Ordering::SeqCst);

        match envelope.event_type.as_str() {
            "run.started" => {
                self.maybe_trigger_initial(projection, envelope.sim_time_s, in_flight, opt_tx);
            }
            "job.created" => {
                if let Some(job) = decode_job(&envelope.payload) {
                    projection.on_job_created(job);
                }
                self.after_state_change(projection, envelope.sim_time_s, None, in_flight, opt_tx);
            }
            "robot.updated" => {
                let payload = &envelope.payload;
                let robot_id = payload.get("robot_id").and_then(|v| v.as_u64());
                let state = payload
                    .get("state")
                    .and_then(|v| v.as_str())
                    .and_then(decode_robot_state);
                if let (Some(robot_id), Some(state)) = (robot_id, state) {
                    let robot_id = RobotId(robot_id as u32);
                    projection.on_robot_updated(
                        robot_id,
                        state,
                        payload.get("x").and_then(|v| v.as_f64()),
                        payload.get("y").and_then(|v| v.as_f64()),
                        payload.get("speed").and_then(|v| v.as_f64()),
                        payload.get("battery").and_then(|v| v.as_f64()),
                        None,
                    );
                    self.after_state_change(projection, envelope.sim_time_s, Some(robot_id), in_flight, opt_tx);
                }
            }
            "job.completed" | "job.failed" => {
                if let Some(job_id) = envelope.payload.get("job_id").and_then(|v| v.as_str()) {
                    projection.on_job_finished(&JobId::new(job_id));
                }
            }
            "snapshot.tick" => {
                self.after_state_change(projection, envelope.sim_time_s, None, in_flight, opt_tx);
            }
            _ => {}
        }
    }

    fn after_state_change(
        &self,
        projection: &mut Projection,
        sim_time_s: f64,
        just_idled: Option<RobotId>,
        in_flight: &Arc<AtomicBool>,
        opt_tx: &mpsc::UnboundedSender<OptimizeOutcome>,
    ) {
        match self.mode {
            Mode::Baseline => {
                let commands = run_baseline_sweep(projection, self.config.battery_threshold);
                for cmd in commands {
                    self.publish_assignment(cmd.job_id, cmd.robot_id, cmd.reason, sim_time_s);
                }
            }
            Mode::Ga => {
                if let Some(robot_id) = just_idled {
                    if let Some(robot) = projection.robots.get(&robot_id) {
                        if idle_gap_trigger(projection, robot).is_some() {
                            self.fire_replan(GaTrigger::IdleGap, projection, sim_time_s, in_flight, opt_tx);
                            return;
                        }
                    }
                }
                if periodic_trigger(projection, sim_time_s, self.config.ga_replan_interval_s).is_some() {
                    self.fire_replan(GaTrigger::Periodic, projection, sim_time_s, in_flight, opt_tx);
                }
            }
        }
    }

    fn maybe_trigger_initial(
        &self,
        projection: &mut Projection,
        sim_time_s: f64,
        in_flight: &Arc<AtomicBool>,
        opt_tx: &mpsc::UnboundedSender<OptimizeOutcome>,
    ) {
        if self.mode == Mode::Ga && initial_trigger(projection).is_some() {
            self.fire_replan(GaTrigger::Initial, projection, sim_time_s, in_flight, opt_tx);
        }
    }

    /// Snapshots pending jobs + eligible robots, flips the single-flight
    /// flag, and runs the (CPU-bound) GA off the event-handler task so
    /// incoming events keep updating projection state while it runs
    /// (spec.md §4.3 "Concurrency").
    fn fire_replan(
        &self,
        trigger: GaTrigger,
        projection: &mut Projection,
        sim_time_s: f64,
        in_flight: &Arc<AtomicBool>,
        opt_tx: &mpsc::UnboundedSender<OptimizeOutcome>,
    ) {
        in_flight.store(true, Ordering::SeqCst);
        projection.in_flight_optimize = true;
        projection.last_replan_sim_time_s = sim_time_s;

        let jobs_snapshot = projection.pending_jobs.clone();
        let robots_snapshot = projection.eligible_robots_sorted(self.config.battery_threshold);

        let robot_inputs: Vec<RobotInput> = robots_snapshot
            .iter()
            .map(|r| RobotInput {
                id: r.id,
                x: r.x,
                y: r.y,
                speed: r.speed,
                battery: r.battery,
                state: r.state,
            })
            .collect();
        let job_inputs: Vec<JobInput> = jobs_snapshot
            .iter()
            .map(|j| JobInput {
                id: j.id.clone(),
                pickup: j.pickup,
                dropoff: j.dropoff,
                deadline_ts: j.deadline_ts,
                priority: j.priority,
            })
            .collect();

        let seed = self.seed;
        let params = GaParams {
            population_size: self.config.ga_population_size,
            generations: self.config.ga_generations,
            elite_size: self.config.ga_elite_size,
            mutation_rate: self.config.ga_mutation_rate,
            crossover_rate: self.config.ga_crossover_rate,
        };
        let opt_tx = opt_tx.clone();
        let run_id = self.run_id.clone();

        tokio::task::spawn_blocking(move || {
            let response = optimize_with_params(seed, &robot_inputs, &job_inputs, sim_time_s, params);
            let assignments = response
                .assignments
                .into_iter()
                .map(|a| (a.job_id, a.robot_id))
                .collect();
            info!(run_id, ?trigger, "ga replan completed");
            if opt_tx
                .send(OptimizeOutcome {
                    trigger,
                    sim_time_s,
                    jobs_snapshot,
                    assignments,
                })
                .is_err()
            {
                warn!(run_id, "dispatcher gone before optimize result delivered");
            }
        });
    }

    fn apply_optimize_outcome(&self, outcome: OptimizeOutcome, projection: &mut Projection, in_flight: &Arc<AtomicBool>) {
        for (job_id, robot_id) in &outcome.assignments {
            if outcome.jobs_snapshot.iter().any(|j| &j.id == job_id) {
                projection.commit_assignment(job_id, *robot_id);
                self.publish_assignment(job_id.clone(), *robot_id, "ga_replan", outcome.sim_time_s);
            }
        }
        in_flight.store(false, Ordering::SeqCst);
        projection.in_flight_optimize = false;
    }

    fn publish_assignment(&self, job_id: JobId, robot_id: RobotId, reason: &'static str, sim_time_s: f64) {
        let idempotency_key = format!("{}:{}", self.run_id, job_id.as_str());
        let payload = json!({
            "run_id": self.run_id,
            "job_id": job_id.as_str(),
            "robot_id": robot_id.value(),
            "sim_time_s": sim_time_s,
            "reason": reason,
            "idempotency_key": idempotency_key,
        });
        let envelope = Envelope {
            event_id: self.bus.next_event_id(),
            event_type: "job.assigned".to_string(),
            run_id: self.run_id.clone(),
            mode: self.mode.as_str().to_string(),
            seed: self.seed,
            scale: self.scale.clone(),
            sim_time_s,
            ts_utc: Envelope::now_ts_utc(),
            payload,
        };
        self.bus.publish("job.assigned", envelope);
    }
}

fn decode_job(payload: &serde_json::Value) -> Option<Job> {
    let job_id = payload.get("job_id")?.as_str()?;
    let pickup_x = payload.get("pickup_x")?.as_f64()?;
    let pickup_y = payload.get("pickup_y")?.as_f64()?;
    let dropoff_x = payload.get("dropoff_x")?.as_f64()?;
    let dropoff_y = payload.get("dropoff_y")?.as_f64()?;
    let deadline_ts = payload.get("deadline_ts")?.as_i64()?;
    let priority = payload.get("priority")?.as_u64()? as u8;
    let sim_time_s = payload.get("sim_time_s").and_then(|v| v.as_f64()).unwrap_or(0.0);

    let mut job = Job::new(
        JobId::new(job_id),
        Point::new(pickup_x, pickup_y),
        Point::new(dropoff_x, dropoff_y),
        deadline_ts,
        priority,
        sim_time_s,
    );
    job.state = JobState::Pending;
    Some(job)
}

fn decode_robot_state(raw: &str) -> Option<RobotState> {
    match raw {
        "idle" => Some(RobotState::Idle),
        "moving_to_pickup" => Some(RobotState::MovingToPickup),
        "moving_to_dropoff" => Some(RobotState::MovingToDropoff),
        "servicing" => Some(RobotState::Servicing),
        "charging" => Some(RobotState::Charging),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_job_reads_required_fields() {
        let payload = json!({
            "job_id": "job_1",
            "pickup_x": 1.0, "pickup_y": 2.0,
            "dropoff_x": 3.0, "dropoff_y": 4.0,
            "deadline_ts": 100,
            "priority": 3,
            "sim_time_s": 0.0,
        });
        let job = decode_job(&payload).unwrap();
        assert_eq!(job.id.as_str(), "job_1");
        assert_eq!(job.deadline_ts, 100);
    }

    #[test]
    fn decode_job_rejects_missing_fields() {
        let payload = json!({ "job_id": "job_1" });
        assert!(decode_job(&payload).is_none());
    }

    #[test]
    fn decode_robot_state_round_trips_known_states() {
        assert_eq!(decode_robot_state("idle"), Some(RobotState::Idle));
        assert_eq!(decode_robot_state("charging"), Some(RobotState::Charging));
        assert_eq!(decode_robot_state("bogus"), None);
    }
}
