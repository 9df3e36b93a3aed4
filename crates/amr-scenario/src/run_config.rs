//! Run context and the enumerated configuration knobs of spec.md §6.

use amr_entities::{Job, Point, Robot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::{generate, GeneratorParams, Scenario};
use crate::scale::Scale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Baseline,
    Ga,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Baseline => "baseline",
            Mode::Ga => "ga",
        }
    }
}

/// The enumerated configuration knobs from spec.md §6, with their defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub sim_tick_hz: f64,
    pub world_size: f64,
    pub max_sim_seconds: f64,
    pub service_time_s: f64,
    pub robot_speed_min: f64,
    pub robot_speed_max: f64,
    pub battery_threshold: f64,
    pub charge_rate: f64,
    pub charge_resume_threshold: f64,
    pub ga_replan_interval_s: f64,
    pub ga_population_size: usize,
    pub ga_generations: usize,
    pub ga_elite_size: usize,
    pub ga_mutation_rate: f64,
    pub ga_crossover_rate: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sim_tick_hz: 5.0,
            world_size: 100.0,
            max_sim_seconds: 3600.0,
            service_time_s: 5.0,
            robot_speed_min: 1.0,
            robot_speed_max: 2.0,
            battery_threshold: 20.0,
            charge_rate: 5.0,
            charge_resume_threshold: 20.0,
            ga_replan_interval_s: 0.0,
            ga_population_size: 64,
            ga_generations: 80,
            ga_elite_size: 4,
            ga_mutation_rate: 0.10,
            ga_crossover_rate: 0.90,
        }
    }
}

impl RunConfig {
    pub fn dt_s(&self) -> f64 {
        1.0 / self.sim_tick_hz
    }
}

/// Explicit robot override for a `run.started` payload (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotOverride {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
}

/// Explicit job override for a `run.started` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOverride {
    pub pickup: Point,
    pub dropoff: Point,
    pub deadline_ts: i64,
    pub priority: u8,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("jobs were requested without any robots")]
    JobsWithoutRobots,
    #[error("invalid priority {0}, must be in 1..=5")]
    InvalidPriority(u8),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: String,
    pub mode: Mode,
    pub seed: u64,
    pub scale: Scale,
    pub config: RunConfig,
    pub robots_override: Option<Vec<RobotOverride>>,
    pub jobs_override: Option<Vec<JobOverride>>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, mode: Mode, seed: u64, scale: Scale) -> Self {
        Self {
            run_id: run_id.into(),
            mode,
            seed,
            scale,
            config: RunConfig::default(),
            robots_override: None,
            jobs_override: None,
        }
    }

    /// Validates overrides (spec.md §7: "Scenario-gen inconsistency (e.g.,
    /// jobs request without robots): reject at scenario time") and resolves
    /// the final scenario, either from the overrides or from the generator.
    pub fn resolve_scenario(&self) -> Result<Scenario, ScenarioError> {
        if self.jobs_override.is_some() && self.robots_override.as_ref().map_or(true, |r| r.is_empty())
        {
            return Err(ScenarioError::JobsWithoutRobots);
        }

        if let (Some(robots), Some(jobs)) = (&self.robots_override, &self.jobs_override) {
            return self.build_from_overrides(robots, jobs);
        }

        let (n_robots, n_jobs) = self.scale.defaults();
        Ok(generate(GeneratorParams {
            seed: self.seed,
            n_robots,
            n_jobs,
            world_size: self.config.world_size,
            speed_min: self.config.robot_speed_min,
            speed_max: self.config.robot_speed_max,
            service_time_s: self.config.service_time_s,
        }))
    }

    fn build_from_overrides(
        &self,
        robots: &[RobotOverride],
        jobs: &[JobOverride],
    ) -> Result<Scenario, ScenarioError> {
        use amr_core::{JobId, RobotId};

        let robots = robots
            .iter()
            .enumerate()
            .map(|(i, r)| Robot::new(RobotId((i + 1) as u32), r.x, r.y, r.speed))
            .collect();

        let mut decoded = Vec::with_capacity(jobs.len());
        for (i, j) in jobs.iter().enumerate() {
            if !(1..=5).contains(&j.priority) {
                return Err(ScenarioError::InvalidPriority(j.priority));
            }
            decoded.push(Job::new(
                JobId::for_index((i + 1) as u32),
                j.pickup,
                j.dropoff,
                j.deadline_ts,
                j.priority,
                0.0,
            ));
        }

        Ok(Scenario {
            robots,
            jobs: decoded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_without_robots_is_rejected() {
        let mut ctx = RunContext::new("run-1", Mode::Baseline, 1, Scale::Mini);
        ctx.jobs_override = Some(vec![JobOverride {
            pickup: Point::new(0.0, 0.0),
            dropoff: Point::new(1.0, 1.0),
            deadline_ts: 100,
            priority: 3,
        }]);
        assert!(matches!(
            ctx.resolve_scenario(),
            Err(ScenarioError::JobsWithoutRobots)
        ));
    }

    #[test]
    fn default_scale_generates_expected_counts() {
        let ctx = RunContext::new("run-1", Mode::Baseline, 42, Scale::Mini);
        let scenario = ctx.resolve_scenario().unwrap();
        assert_eq!(scenario.robots.len(), 5);
        assert_eq!(scenario.jobs.len(), 5);
    }

    #[test]
    fn config_defaults_match_spec_table() {
        let c = RunConfig::default();
        assert_eq!(c.sim_tick_hz, 5.0);
        assert_eq!(c.world_size, 100.0);
        assert_eq!(c.max_sim_seconds, 3600.0);
        assert_eq!(c.battery_threshold, 20.0);
        assert_eq!(c.ga_population_size, 64);
        assert_eq!(c.ga_generations, 80);
    }
}
