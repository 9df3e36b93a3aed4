//! The dispatcher's in-memory projection of world state (spec.md §4.3):
//! rebuilt purely from consumed events, never corrected by writing back to
//! the simulator (spec.md §9: "the dispatcher must never attempt to
//! correct simulator state").

use std::collections::HashMap;

use amr_core::{JobId, RobotId};
use amr_entities::{canonical_job_key, Job, RobotProjection, RobotState};

#[derive(Debug, Default)]
pub struct Projection {
    /// Kept sorted by canonical order `(deadline_ts, -priority, job_id)`
    /// on every insert — this is the canonical sort used everywhere.
    pub pending_jobs: Vec<Job>,
    pub robots: HashMap<RobotId, RobotProjection>,
    pub in_flight_optimize: bool,
    pub last_replan_sim_time_s: f64,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_job_created(&mut self, job: Job) {
        self.pending_jobs.push(job);
        self.pending_jobs
            .sort_by(|a, b| canonical_job_key(a).cmp(&canonical_job_key(b)));
    }

    pub fn on_robot_updated(
        &mut self,
        robot_id: RobotId,
        state: RobotState,
        x: Option<f64>,
        y: Option<f64>,
        speed: Option<f64>,
        battery: Option<f64>,
        current_job_id: Option<Option<JobId>>,
    ) {
        let entry = self
            .robots
            .entry(robot_id)
            .or_insert_with(|| RobotProjection::new(robot_id, x.unwrap_or(0.0), y.unwrap_or(0.0), speed.unwrap_or(1.0)));
        entry.state = state;
        if let Some(x) = x {
            entry.x = x;
        }
        if let Some(y) = y {
            entry.y = y;
        }
        if let Some(speed) = speed {
            entry.speed = speed;
        }
        if let Some(battery) = battery {
            entry.battery = battery;
        }
        if let Some(current_job_id) = current_job_id {
            entry.current_job_id = current_job_id;
        }
    }

    /// Removes a job from pending and commits it to the robot's planned
    /// queue — the dispatcher-side half of a baseline/GA assignment
    /// decision, before the `job.assigned` command is even emitted.
    pub fn commit_assignment(&mut self, job_id: &JobId, robot_id: RobotId) {
        self.pending_jobs.retain(|j| &j.id != job_id);
        if let Some(robot) = self.robots.get_mut(&robot_id) {
            robot.planned_queue.push(job_id.clone());
        }
    }

    /// A job leaving play (completed/failed) frees its slot in whatever
    /// robot's planned queue still references it.
    pub fn on_job_finished(&mut self, job_id: &JobId) {
        for robot in self.robots.values_mut() {
            robot.planned_queue.retain(|j| j != job_id);
        }
    }

    pub fn has_pending_jobs(&self) -> bool {
        !self.pending_jobs.is_empty()
    }

    pub fn idle_eligible_robots(&self, battery_threshold: f64) -> Vec<&RobotProjection> {
        let mut robots: Vec<&RobotProjection> = self
            .robots
            .values()
            .filter(|r| r.is_idle_with_empty_queue() && r.is_eligible(battery_threshold))
            .collect();
        robots.sort_by_key(|r| r.id);
        robots
    }

    pub fn eligible_robots_sorted(&self, battery_threshold: f64) -> Vec<&RobotProjection> {
        let mut robots: Vec<&RobotProjection> = self
            .robots
            .values()
            .filter(|r| r.is_eligible(battery_threshold))
            .collect();
        robots.sort_by_key(|r| r.id);
        robots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_entities::Point;

    fn job(id: &str, deadline: i64, priority: u8) -> Job {
        Job::new(JobId::new(id), Point::new(0.0, 0.0), Point::new(1.0, 1.0), deadline, priority, 0.0)
    }

    #[test]
    fn pending_jobs_stay_canonically_sorted_on_insert() {
        let mut p = Projection::new();
        p.on_job_created(job("job_a", 50, 3));
        p.on_job_created(job("job_b", 40, 3));
        assert_eq!(p.pending_jobs[0].id.as_str(), "job_b");
    }

    #[test]
    fn robot_updated_creates_then_updates_entry() {
        let mut p = Projection::new();
        p.on_robot_updated(RobotId(1), RobotState::Idle, Some(1.0), Some(2.0), Some(1.5), Some(100.0), None);
        assert_eq!(p.robots[&RobotId(1)].x, 1.0);
        p.on_robot_updated(RobotId(1), RobotState::MovingToPickup, Some(3.0), None, None, None, None);
        assert_eq!(p.robots[&RobotId(1)].x, 3.0);
        assert_eq!(p.robots[&RobotId(1)].state, RobotState::MovingToPickup);
    }

    #[test]
    fn commit_assignment_moves_job_into_planned_queue() {
        let mut p = Projection::new();
        p.on_job_created(job("job_1", 50, 3));
        p.on_robot_updated(RobotId(1), RobotState::Idle, Some(0.0), Some(0.0), Some(1.0), Some(100.0), None);
        p.commit_assignment(&JobId::new("job_1"), RobotId(1));
        assert!(p.pending_jobs.is_empty());
        assert_eq!(p.robots[&RobotId(1)].planned_queue.len(), 1);
    }

    #[test]
    fn idle_eligible_robots_excludes_charging_and_busy_queue() {
        let mut p = Projection::new();
        p.on_robot_updated(RobotId(1), RobotState::Idle, Some(0.0), Some(0.0), Some(1.0), Some(100.0), None);
        p.on_robot_updated(RobotId(2), RobotState::Charging, Some(0.0), Some(0.0), Some(1.0), Some(100.0), None);
        assert_eq!(p.idle_eligible_robots(20.0).len(), 1);
    }
}
