//! Robot world-truth and the dispatcher-side projection of it.
//!
//! spec.md §3 draws an explicit split: the simulator's `Robot` is
//! authoritative and has no notion of a queue beyond its current job; the
//! dispatcher's `RobotProjection` additionally carries `planned_queue`,
//! jobs committed to that robot but not yet handed to the simulator.

use amr_core::{JobId, RobotId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotState {
    Idle,
    MovingToPickup,
    MovingToDropoff,
    Servicing,
    Charging,
}

impl RobotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotState::Idle => "idle",
            RobotState::MovingToPickup => "moving_to_pickup",
            RobotState::MovingToDropoff => "moving_to_dropoff",
            RobotState::Servicing => "servicing",
            RobotState::Charging => "charging",
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self, RobotState::MovingToPickup | RobotState::MovingToDropoff)
    }
}

/// The simulator's authoritative view of one robot (spec.md §3 "Robot").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    pub id: RobotId,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub battery: f64,
    pub state: RobotState,
    pub current_job_id: Option<JobId>,
    /// Seconds remaining on the `servicing` countdown, `0.0` otherwise.
    pub service_timer_s: f64,
    /// The movement state to resume into after a charging pause
    /// (spec.md §4.2 step 3: "resuming a paused job means re-entering the
    /// prior movement state toward its current waypoint").
    pub paused_state: Option<RobotState>,
    /// Accumulated Euclidean travel distance, tallied each tick (feeds
    /// `total_distance` in the end-of-run metrics).
    pub distance_travelled: f64,
}

impl Robot {
    pub fn new(id: RobotId, x: f64, y: f64, speed: f64) -> Self {
        Self {
            id,
            x,
            y,
            speed,
            battery: 100.0,
            state: RobotState::Idle,
            current_job_id: None,
            service_timer_s: 0.0,
            paused_state: None,
            distance_travelled: 0.0,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, RobotState::Idle) && self.current_job_id.is_none()
    }

    /// Eligibility filter from spec.md §4.3: not charging and battery at
    /// or above `battery_threshold`.
    pub fn is_eligible(&self, battery_threshold: f64) -> bool {
        !matches!(self.state, RobotState::Charging) && self.battery >= battery_threshold
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

/// The dispatcher's projection of a robot, rebuilt from consumed
/// `robot.updated` events plus the dispatcher's own assignment bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotProjection {
    pub id: RobotId,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub battery: f64,
    pub state: RobotState,
    pub current_job_id: Option<JobId>,
    /// Jobs the dispatcher has committed to this robot but not yet
    /// handed to the simulator via `job.assigned`.
    pub planned_queue: Vec<JobId>,
}

impl RobotProjection {
    pub fn new(id: RobotId, x: f64, y: f64, speed: f64) -> Self {
        Self {
            id,
            x,
            y,
            speed,
            battery: 100.0,
            state: RobotState::Idle,
            current_job_id: None,
            planned_queue: Vec::new(),
        }
    }

    pub fn is_eligible(&self, battery_threshold: f64) -> bool {
        !matches!(self.state, RobotState::Charging) && self.battery >= battery_threshold
    }

    pub fn is_idle_with_empty_queue(&self) -> bool {
        matches!(self.state, RobotState::Idle) && self.planned_queue.is_empty()
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_robot_starts_idle_at_full_battery() {
        let r = Robot::new(RobotId(1), 10.0, 20.0, 1.5);
        assert!(r.is_idle());
        assert_eq!(r.battery, 100.0);
    }

    #[test]
    fn eligibility_excludes_charging_and_low_battery() {
        let mut r = Robot::new(RobotId(1), 0.0, 0.0, 1.0);
        assert!(r.is_eligible(20.0));
        r.state = RobotState::Charging;
        assert!(!r.is_eligible(20.0));
        r.state = RobotState::Idle;
        r.battery = 10.0;
        assert!(!r.is_eligible(20.0));
    }

    #[test]
    fn distance_is_euclidean() {
        let r = Robot::new(RobotId(1), 0.0, 0.0, 1.0);
        assert!((r.distance_to(3.0, 4.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn projection_idle_with_empty_queue_detects_idle_gap() {
        let mut p = RobotProjection::new(RobotId(1), 0.0, 0.0, 1.0);
        assert!(p.is_idle_with_empty_queue());
        p.planned_queue.push(JobId::for_index(1));
        assert!(!p.is_idle_with_empty_queue());
    }
}
