//! Baseline policy (spec.md §4.3): earliest-deadline-first job selection,
//! nearest eligible idle robot, tie-broken by ascending robot id.

use amr_core::RobotId;

use crate::projection::Projection;

#[derive(Debug, Clone)]
pub struct AssignmentCommand {
    pub job_id: amr_core::JobId,
    pub robot_id: RobotId,
    pub reason: &'static str,
}

/// Runs the baseline sweep to exhaustion: while pending jobs and idle
/// eligible robots both exist, pop the top pending job and hand it to the
/// nearest idle eligible robot. Mutates the projection's pending set and
/// planned queues as it goes (so a second call is a no-op until new state
/// arrives).
pub fn run_baseline_sweep(projection: &mut Projection, battery_threshold: f64) -> Vec<AssignmentCommand> {
    let mut commands = Vec::new();

    loop {
        if projection.pending_jobs.is_empty() {
            break;
        }

        let idle = projection.idle_eligible_robots(battery_threshold);
        if idle.is_empty() {
            break;
        }

        // pending_jobs is kept canonically sorted by Projection itself.
        let job = projection.pending_jobs[0].clone();

        let nearest = idle
            .iter()
            .map(|r| (r.id, r.distance_to(job.pickup.x, job.pickup.y)))
            .min_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap()
                    .then_with(|| a.0.cmp(&b.0))
            })
            .expect("idle is non-empty");

        projection.commit_assignment(&job.id, nearest.0);
        commands.push(AssignmentCommand {
            job_id: job.id,
            robot_id: nearest.0,
            reason: "baseline_edf_nearest",
        });
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_core::JobId;
    use amr_entities::RobotState;

    fn seed_job(p: &mut Projection, id: &str, px: f64, py: f64, deadline: i64, priority: u8) {
        use amr_entities::{Job, Point};
        p.on_job_created(Job::new(JobId::new(id), Point::new(px, py), Point::new(px + 1.0, py), deadline, priority, 0.0));
    }

    #[test]
    fn earliest_deadline_assigned_first() {
        let mut p = Projection::new();
        p.on_robot_updated(RobotId(1), RobotState::Idle, Some(0.0), Some(0.0), Some(1.0), Some(100.0), None);
        seed_job(&mut p, "job_a", 5.0, 5.0, 50, 3);
        seed_job(&mut p, "job_b", 5.0, 5.0, 40, 3);

        let commands = run_baseline_sweep(&mut p, 20.0);
        assert_eq!(commands[0].job_id.as_str(), "job_b");
    }

    #[test]
    fn nearest_robot_wins_tie_break_by_id() {
        let mut p = Projection::new();
        p.on_robot_updated(RobotId(1), RobotState::Idle, Some(0.0), Some(0.0), Some(1.0), Some(100.0), None);
        p.on_robot_updated(RobotId(2), RobotState::Idle, Some(100.0), Some(100.0), Some(1.0), Some(100.0), None);
        seed_job(&mut p, "job_1", 5.0, 5.0, 100, 3);

        let commands = run_baseline_sweep(&mut p, 20.0);
        assert_eq!(commands[0].robot_id, RobotId(1));
    }

    #[test]
    fn sweep_stops_when_no_idle_robots_remain() {
        let mut p = Projection::new();
        p.on_robot_updated(RobotId(1), RobotState::Idle, Some(0.0), Some(0.0), Some(1.0), Some(100.0), None);
        seed_job(&mut p, "job_1", 5.0, 5.0, 100, 3);
        seed_job(&mut p, "job_2", 5.0, 5.0, 100, 3);

        let commands = run_baseline_sweep(&mut p, 20.0);
        assert_eq!(commands.len(), 1);
        assert_eq!(p.pending_jobs.len(), 1);
    }
}
