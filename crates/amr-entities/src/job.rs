//! Job entity and its state lattice (spec.md §3).

use amr_core::{JobId, RobotId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Unassigned,
    Assigned,
    InProgress,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Unassigned => "unassigned",
            JobState::Assigned => "assigned",
            JobState::InProgress => "in_progress",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    /// True for the two states spec.md §4.2 step 1 accepts an inbound
    /// `job.assigned` command against.
    pub fn is_awaiting_assignment(&self) -> bool {
        matches!(self, JobState::Pending | JobState::Unassigned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub pickup: Point,
    pub dropoff: Point,
    pub deadline_ts: i64,
    pub priority: u8,
    pub state: JobState,
    pub assigned_robot_id: Option<RobotId>,
    pub created_sim_ts: f64,
    pub started_sim_ts: Option<f64>,
    pub completed_sim_ts: Option<f64>,
    /// `completed_sim_ts - deadline_ts`, recorded signed (spec.md §3).
    pub lateness_s: Option<f64>,
}

impl Job {
    pub fn new(
        id: JobId,
        pickup: Point,
        dropoff: Point,
        deadline_ts: i64,
        priority: u8,
        created_sim_ts: f64,
    ) -> Self {
        Self {
            id,
            pickup,
            dropoff,
            deadline_ts,
            priority,
            state: JobState::Pending,
            assigned_robot_id: None,
            created_sim_ts,
            started_sim_ts: None,
            completed_sim_ts: None,
            lateness_s: None,
        }
    }

    pub fn assign(&mut self, robot_id: RobotId) {
        self.state = JobState::Assigned;
        self.assigned_robot_id = Some(robot_id);
    }

    pub fn start(&mut self, sim_time_s: f64) {
        self.state = JobState::InProgress;
        self.started_sim_ts = Some(sim_time_s);
    }

    pub fn complete(&mut self, sim_time_s: f64) {
        self.state = JobState::Completed;
        self.completed_sim_ts = Some(sim_time_s);
        self.lateness_s = Some(sim_time_s - self.deadline_ts as f64);
    }

    pub fn fail(&mut self, sim_time_s: f64) {
        self.state = JobState::Failed;
        self.completed_sim_ts = Some(sim_time_s);
        self.lateness_s = Some(sim_time_s - self.deadline_ts as f64);
    }

    pub fn is_on_time(&self) -> bool {
        matches!(self.state, JobState::Completed)
            && self.completed_sim_ts.map_or(false, |t| t <= self.deadline_ts as f64)
    }
}

/// Canonical sort key shared by the dispatcher's pending set and the GA's
/// chromosome indexing: `(deadline_ts ASC, -priority ASC, job_id ASC)`.
pub fn canonical_job_key(job: &Job) -> (i64, i64, String) {
    (job.deadline_ts, -(job.priority as i64), job.id.0.clone())
}

pub fn sort_jobs_canonical(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| canonical_job_key(a).cmp(&canonical_job_key(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, deadline: i64, priority: u8) -> Job {
        Job::new(
            JobId::new(id),
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            deadline,
            priority,
            0.0,
        )
    }

    #[test]
    fn earlier_deadline_sorts_first() {
        let mut jobs = vec![job("job_a", 50, 3), job("job_b", 40, 3)];
        sort_jobs_canonical(&mut jobs);
        assert_eq!(jobs[0].id.as_str(), "job_b");
    }

    #[test]
    fn same_deadline_higher_priority_sorts_first() {
        let mut jobs = vec![job("job_a", 40, 1), job("job_b", 40, 5)];
        sort_jobs_canonical(&mut jobs);
        assert_eq!(jobs[0].id.as_str(), "job_b");
    }

    #[test]
    fn same_deadline_and_priority_sorts_by_id() {
        let mut jobs = vec![job("job_2", 40, 3), job("job_1", 40, 3)];
        sort_jobs_canonical(&mut jobs);
        assert_eq!(jobs[0].id.as_str(), "job_1");
    }

    #[test]
    fn lateness_is_signed() {
        let mut j = job("job_1", 40, 3);
        j.complete(35.0);
        assert_eq!(j.lateness_s, Some(-5.0));
        assert!(j.is_on_time());

        let mut late = job("job_2", 40, 3);
        late.complete(45.0);
        assert_eq!(late.lateness_s, Some(5.0));
        assert!(!late.is_on_time());
    }
}
