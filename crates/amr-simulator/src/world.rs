//! The simulator's authoritative world state and the per-tick algorithm
//! (spec.md §4.2). Owns the only mutable copy of robots and jobs; the
//! dispatcher only ever sees what this tick loop chooses to emit.

use std::collections::HashSet;

use amr_core::{JobId, RobotId, SimTime};
use amr_entities::{Job, JobState, Robot, RobotState};
use amr_metrics::MetricsCollector;
use amr_scenario::RunConfig;

use crate::events::{JobOutcome, RobotUpdate, SimEvent, Snapshot, Telemetry};

#[derive(Debug, Clone)]
pub struct InboundAssignment {
    pub job_id: JobId,
    pub robot_id: RobotId,
    pub idempotency_key: String,
}

pub struct World {
    pub robots: Vec<Robot>,
    pub jobs: Vec<Job>,
    pub sim_time: SimTime,
    applied_idempotency_keys: HashSet<String>,
    metrics: MetricsCollector,
    last_position_emit_whole_second: Vec<i64>,
    last_telemetry_whole_second: i64,
}

impl World {
    pub fn new(robots: Vec<Robot>, jobs: Vec<Job>) -> Self {
        let n = robots.len();
        Self {
            robots,
            jobs,
            sim_time: SimTime::ZERO,
            applied_idempotency_keys: HashSet::new(),
            metrics: MetricsCollector::new(),
            last_position_emit_whole_second: vec![-1; n],
            last_telemetry_whole_second: -1,
        }
    }

    fn find_robot_index(&self, id: RobotId) -> Option<usize> {
        self.robots.iter().position(|r| r.id == id)
    }

    fn find_job_index(&self, id: &JobId) -> Option<usize> {
        self.jobs.iter().position(|j| &j.id == id)
    }

    /// Runs one tick's worth of the per-tick algorithm (spec.md §4.2,
    /// steps 1-6) and returns the events it produced.
    pub fn tick(&mut self, config: &RunConfig, inbound: Vec<InboundAssignment>) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let dt = config.dt_s();

        self.apply_inbound_assignments(inbound, config, &mut events);
        self.advance_robots(dt, config, &mut events);
        self.apply_battery(dt, config, &mut events);

        self.sim_time += dt;

        self.emit_snapshot(&mut events);
        self.emit_telemetry(&mut events);

        events
    }

    /// Step 1: drain inbound `job.assigned` commands. Idempotent on
    /// `idempotency_key`; rejects jobs not `pending|unassigned` or robots
    /// that are ineligible, logging nothing here (the dispatcher owns
    /// logging of its own assignment decisions — the simulator just
    /// silently no-ops per spec.md §4.2 "Failure semantics").
    fn apply_inbound_assignments(
        &mut self,
        inbound: Vec<InboundAssignment>,
        config: &RunConfig,
        events: &mut Vec<SimEvent>,
    ) {
        for cmd in inbound {
            if self.applied_idempotency_keys.contains(&cmd.idempotency_key) {
                continue;
            }

            let Some(job_idx) = self.find_job_index(&cmd.job_id) else {
                continue;
            };
            if !self.jobs[job_idx].state.is_awaiting_assignment() {
                continue;
            }
            let Some(robot_idx) = self.find_robot_index(cmd.robot_id) else {
                continue;
            };
            if self.robots[robot_idx].current_job_id.is_some()
                || !self.robots[robot_idx].is_eligible(config.battery_threshold)
            {
                continue;
            }

            self.applied_idempotency_keys.insert(cmd.idempotency_key);

            self.jobs[job_idx].assign(cmd.robot_id);
            let robot = &mut self.robots[robot_idx];
            robot.current_job_id = Some(cmd.job_id.clone());
            robot.state = RobotState::MovingToPickup;
            self.jobs[job_idx].start(self.sim_time.seconds());

            events.push(SimEvent::RobotUpdated(RobotUpdate {
                robot_id: robot.id,
                state: robot.state,
                sim_time_s: self.sim_time.seconds(),
                x: Some(robot.x),
                y: Some(robot.y),
                speed: Some(robot.speed),
                battery: Some(robot.battery),
                current_job_id: Some(robot.current_job_id.clone()),
            }));
        }
    }

    /// Step 2: advance each robot's position/state machine by `dt`.
    fn advance_robots(&mut self, dt: f64, config: &RunConfig, events: &mut Vec<SimEvent>) {
        for i in 0..self.robots.len() {
            let before_state = self.robots[i].state;

            match self.robots[i].state {
                RobotState::MovingToPickup => {
                    let Some(job_id) = self.robots[i].current_job_id.clone() else {
                        continue;
                    };
                    let Some(job_idx) = self.find_job_index(&job_id) else {
                        continue;
                    };
                    let target = self.jobs[job_idx].pickup;
                    self.step_towards(i, target.x, target.y, dt);
                    if self.reached(i, target.x, target.y) {
                        self.robots[i].state = RobotState::Servicing;
                        self.robots[i].service_timer_s = config.service_time_s;
                    }
                }
                RobotState::MovingToDropoff => {
                    let Some(job_id) = self.robots[i].current_job_id.clone() else {
                        continue;
                    };
                    let Some(job_idx) = self.find_job_index(&job_id) else {
                        continue;
                    };
                    let target = self.jobs[job_idx].dropoff;
                    self.step_towards(i, target.x, target.y, dt);
                    if self.reached(i, target.x, target.y) {
                        self.jobs[job_idx].complete(self.sim_time.seconds() + dt);
                        let lateness = self.jobs[job_idx].lateness_s.unwrap_or(0.0);
                        self.metrics.record_job(&self.jobs[job_idx]);
                        events.push(SimEvent::JobCompleted(JobOutcome {
                            job_id: job_id.clone(),
                            sim_time_s: self.sim_time.seconds() + dt,
                            lateness_s: lateness,
                        }));
                        self.robots[i].current_job_id = None;
                        self.robots[i].state = RobotState::Idle;
                    }
                }
                RobotState::Servicing => {
                    self.robots[i].service_timer_s -= dt;
                    if self.robots[i].service_timer_s <= 0.0 {
                        self.robots[i].state = RobotState::MovingToDropoff;
                    }
                }
                RobotState::Idle | RobotState::Charging => {}
            }

            if self.robots[i].state != before_state {
                let robot = &self.robots[i];
                events.push(SimEvent::RobotUpdated(RobotUpdate {
                    robot_id: robot.id,
                    state: robot.state,
                    sim_time_s: self.sim_time.seconds() + dt,
                    x: Some(robot.x),
                    y: Some(robot.y),
                    speed: Some(robot.speed),
                    battery: Some(robot.battery),
                    current_job_id: Some(robot.current_job_id.clone()),
                }));
            } else if self.robots[i].state.is_moving() {
                self.maybe_emit_throttled_position(i, dt, events);
            }
        }
    }

    fn step_towards(&mut self, i: usize, tx: f64, ty: f64, dt: f64) {
        let robot = &mut self.robots[i];
        let dx = tx - robot.x;
        let dy = ty - robot.y;
        let dist = (dx * dx + dy * dy).sqrt();
        let step = robot.speed * dt;

        if step >= dist || dist < 1e-9 {
            robot.distance_travelled += dist;
            robot.x = tx;
            robot.y = ty;
        } else {
            let ratio = step / dist;
            robot.x += dx * ratio;
            robot.y += dy * ratio;
            robot.distance_travelled += step;
        }
    }

    fn reached(&self, i: usize, tx: f64, ty: f64) -> bool {
        let robot = &self.robots[i];
        (robot.x - tx).abs() < 1e-9 && (robot.y - ty).abs() < 1e-9
    }

    fn maybe_emit_throttled_position(&mut self, i: usize, dt: f64, events: &mut Vec<SimEvent>) {
        let whole_second = (self.sim_time + dt).whole_seconds();
        if self.last_position_emit_whole_second[i] == whole_second {
            return;
        }
        self.last_position_emit_whole_second[i] = whole_second;
        let robot = &self.robots[i];
        events.push(SimEvent::RobotUpdated(RobotUpdate {
            robot_id: robot.id,
            state: robot.state,
            sim_time_s: self.sim_time.seconds() + dt,
            x: Some(robot.x),
            y: Some(robot.y),
            speed: Some(robot.speed),
            battery: Some(robot.battery),
            current_job_id: Some(robot.current_job_id.clone()),
        }));
    }

    /// Step 3: battery drain/charge (spec.md §4.2 step 3).
    fn apply_battery(&mut self, dt: f64, config: &RunConfig, events: &mut Vec<SimEvent>) {
        use amr_core::BATTERY_DRAIN_PCT_PER_SIM_SECOND;

        for i in 0..self.robots.len() {
            let before_state = self.robots[i].state;

            match self.robots[i].state {
                RobotState::Idle => {}
                RobotState::Charging => {
                    self.robots[i].battery =
                        (self.robots[i].battery + config.charge_rate * dt).min(100.0);
                    if self.robots[i].battery >= config.charge_resume_threshold {
                        let resume = self.robots[i].paused_state.take().unwrap_or(RobotState::Idle);
                        self.robots[i].state = resume;
                    }
                }
                _ => {
                    self.robots[i].battery -= BATTERY_DRAIN_PCT_PER_SIM_SECOND * dt;
                    if self.robots[i].battery <= 0.0 {
                        self.robots[i].battery = 0.0;
                        self.robots[i].paused_state = Some(self.robots[i].state);
                        self.robots[i].state = RobotState::Charging;
                    }
                }
            }

            if self.robots[i].state != before_state {
                let robot = &self.robots[i];
                events.push(SimEvent::RobotUpdated(RobotUpdate {
                    robot_id: robot.id,
                    state: robot.state,
                    sim_time_s: self.sim_time.seconds() + dt,
                    x: Some(robot.x),
                    y: Some(robot.y),
                    speed: Some(robot.speed),
                    battery: Some(robot.battery),
                    current_job_id: Some(robot.current_job_id.clone()),
                }));
            }
        }
    }

    fn emit_snapshot(&mut self, events: &mut Vec<SimEvent>) {
        events.push(SimEvent::SnapshotTick(Snapshot {
            sim_time_s: self.sim_time.seconds(),
            robots: self.robots.clone(),
            jobs: self.jobs.clone(),
        }));
    }

    fn emit_telemetry(&mut self, events: &mut Vec<SimEvent>) {
        let whole_second = self.sim_time.whole_seconds();
        if whole_second == self.last_telemetry_whole_second {
            return;
        }
        self.last_telemetry_whole_second = whole_second;

        for robot in &self.robots {
            events.push(SimEvent::TelemetryReceived(Telemetry {
                robot_id: robot.id,
                sim_time_s: self.sim_time.seconds(),
                state: robot.state,
                x: robot.x,
                y: robot.y,
                battery: robot.battery,
            }));
        }
    }

    /// Step 6 predicate: terminate when `max_sim_seconds` reached or no
    /// work remains. Any job still incomplete at this point fails
    /// (spec.md §4.2 step 6 / step 4: "jobs fail only if they remain
    /// incomplete at max_sim_seconds").
    pub fn should_terminate(&self, config: &RunConfig) -> bool {
        if self.sim_time.seconds() >= config.max_sim_seconds {
            return true;
        }
        let no_pending = !self
            .jobs
            .iter()
            .any(|j| matches!(j.state, JobState::Pending | JobState::Unassigned));
        let no_robot_working = self
            .robots
            .iter()
            .all(|r| r.current_job_id.is_none());
        no_pending && no_robot_working
    }

    pub fn fail_incomplete_jobs(&mut self) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for job in self.jobs.iter_mut() {
            if !matches!(job.state, JobState::Completed | JobState::Failed) {
                job.fail(self.sim_time.seconds());
                self.metrics.record_job(job);
                events.push(SimEvent::JobFailed(JobOutcome {
                    job_id: job.id.clone(),
                    sim_time_s: self.sim_time.seconds(),
                    lateness_s: job.lateness_s.unwrap_or(0.0),
                }));
            }
        }
        events
    }

    pub fn finalize_metrics(&mut self) -> amr_metrics::RunMetrics {
        for robot in &self.robots {
            self.metrics.record_distance(robot.distance_travelled);
        }
        self.metrics.report(self.jobs.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_core::{JobId, RobotId};
    use amr_entities::Point;

    fn config() -> RunConfig {
        RunConfig::default()
    }

    fn robot(id: u32, x: f64, y: f64, speed: f64) -> Robot {
        Robot::new(RobotId(id), x, y, speed)
    }

    fn job(id: &str, px: f64, py: f64, dx: f64, dy: f64, deadline: i64) -> Job {
        Job::new(JobId::new(id), Point::new(px, py), Point::new(dx, dy), deadline, 3, 0.0)
    }

    #[test]
    fn idempotent_assignment_applies_once() {
        let mut world = World::new(vec![robot(1, 0.0, 0.0, 1.0)], vec![job("job_1", 5.0, 5.0, 10.0, 10.0, 1000)]);
        let inbound = vec![InboundAssignment {
            job_id: JobId::new("job_1"),
            robot_id: RobotId(1),
            idempotency_key: "run-1:job_1".to_string(),
        }];
        world.tick(&config(), inbound.clone());
        let state_after_first = world.robots[0].state;
        world.tick(&config(), inbound);
        assert_eq!(world.robots[0].state, state_after_first);
    }

    #[test]
    fn robot_moves_towards_pickup_then_services_then_dropoff() {
        let mut world = World::new(vec![robot(1, 0.0, 0.0, 100.0)], vec![job("job_1", 1.0, 0.0, 2.0, 0.0, 1000)]);
        let inbound = vec![InboundAssignment {
            job_id: JobId::new("job_1"),
            robot_id: RobotId(1),
            idempotency_key: "run-1:job_1".to_string(),
        }];
        world.tick(&config(), inbound);
        assert_eq!(world.robots[0].state, RobotState::Servicing);

        for _ in 0..30 {
            world.tick(&config(), vec![]);
        }
        assert_eq!(world.jobs[0].state, JobState::Completed);
    }

    #[test]
    fn battery_depletion_moves_robot_to_charging_and_preserves_job() {
        let mut cfg = config();
        cfg.max_sim_seconds = 100000.0;
        let mut world = World::new(vec![robot(1, 0.0, 0.0, 0.001)], vec![job("job_1", 0.0, 0.0, 10000.0, 10000.0, 1_000_000)]);
        let inbound = vec![InboundAssignment {
            job_id: JobId::new("job_1"),
            robot_id: RobotId(1),
            idempotency_key: "run-1:job_1".to_string(),
        }];
        world.tick(&cfg, inbound);

        for _ in 0..500 {
            world.tick(&cfg, vec![]);
            if world.robots[0].state == RobotState::Charging {
                break;
            }
        }
        assert_eq!(world.robots[0].state, RobotState::Charging);
        assert_eq!(world.jobs[0].state, JobState::InProgress);
        assert!(world.robots[0].current_job_id.is_some());
    }

    #[test]
    fn termination_when_no_pending_jobs_and_no_robot_working() {
        let world = World::new(vec![robot(1, 0.0, 0.0, 1.0)], vec![]);
        assert!(world.should_terminate(&config()));
    }
}
