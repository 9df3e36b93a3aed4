//! The GA replan trigger protocol (spec.md §4.3): initial, periodic, and
//! idle-gap triggers, all suppressed while a replan is already in flight
//! (single-flight, spec.md §9).

use amr_entities::RobotProjection;

use crate::projection::Projection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaTrigger {
    Initial,
    Periodic,
    IdleGap,
}

pub fn initial_trigger(projection: &Projection) -> Option<GaTrigger> {
    if projection.in_flight_optimize {
        return None;
    }
    projection.has_pending_jobs().then_some(GaTrigger::Initial)
}

pub fn periodic_trigger(
    projection: &Projection,
    sim_time_s: f64,
    ga_replan_interval_s: f64,
) -> Option<GaTrigger> {
    if projection.in_flight_optimize || ga_replan_interval_s <= 0.0 {
        return None;
    }
    if sim_time_s - projection.last_replan_sim_time_s >= ga_replan_interval_s
        && projection.has_pending_jobs()
    {
        Some(GaTrigger::Periodic)
    } else {
        None
    }
}

/// Fired when `robot` has just transitioned to idle with an empty planned
/// queue, pending jobs remain, and no replan is already in flight.
pub fn idle_gap_trigger(projection: &Projection, robot: &RobotProjection) -> Option<GaTrigger> {
    if projection.in_flight_optimize {
        return None;
    }
    if robot.is_idle_with_empty_queue() && projection.has_pending_jobs() {
        Some(GaTrigger::IdleGap)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_core::{JobId, RobotId};
    use amr_entities::{Job, Point, RobotState};

    fn projection_with_pending_job() -> Projection {
        let mut p = Projection::new();
        p.on_job_created(Job::new(JobId::new("job_1"), Point::new(0.0, 0.0), Point::new(1.0, 1.0), 50, 3, 0.0));
        p
    }

    #[test]
    fn initial_fires_when_pending_jobs_exist() {
        let p = projection_with_pending_job();
        assert_eq!(initial_trigger(&p), Some(GaTrigger::Initial));
    }

    #[test]
    fn initial_suppressed_during_in_flight() {
        let mut p = projection_with_pending_job();
        p.in_flight_optimize = true;
        assert_eq!(initial_trigger(&p), None);
    }

    #[test]
    fn periodic_off_when_interval_is_zero() {
        let p = projection_with_pending_job();
        assert_eq!(periodic_trigger(&p, 100.0, 0.0), None);
    }

    #[test]
    fn periodic_fires_after_interval_elapses() {
        let mut p = projection_with_pending_job();
        p.last_replan_sim_time_s = 0.0;
        assert_eq!(periodic_trigger(&p, 30.0, 30.0), Some(GaTrigger::Periodic));
        assert_eq!(periodic_trigger(&p, 29.0, 30.0), None);
    }

    #[test]
    fn idle_gap_requires_empty_queue_and_pending_jobs() {
        let p = projection_with_pending_job();
        let mut robot = RobotProjection::new(RobotId(1), 0.0, 0.0, 1.0);
        robot.state = RobotState::Idle;
        assert_eq!(idle_gap_trigger(&p, &robot), Some(GaTrigger::IdleGap));

        robot.planned_queue.push(JobId::new("job_2"));
        assert_eq!(idle_gap_trigger(&p, &robot), None);
    }
}
