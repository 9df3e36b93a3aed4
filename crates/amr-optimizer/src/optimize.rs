//! The stateless GA entry point (spec.md §4.4): `optimize(seed, robots,
//! pending_jobs, sim_time_s) -> assignments`. Only the seeded RNG is used;
//! no wall-clock, no unordered hashing, no floating-point ordering outside
//! the specified stable sort.

use amr_core::SimRng;

use crate::fitness::{chromosome_cmp, evaluate, Chromosome};
use crate::protocol::{Assignment, JobInput, OptimizeMeta, OptimizeResponse, RobotInput};

#[derive(Debug, Clone, Copy)]
pub struct GaParams {
    pub population_size: usize,
    pub generations: usize,
    pub elite_size: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            population_size: 64,
            generations: 80,
            elite_size: 4,
            mutation_rate: 0.10,
            crossover_rate: 0.90,
        }
    }
}

pub fn optimize(
    seed: u64,
    robots: &[RobotInput],
    pending_jobs: &[JobInput],
    sim_time_s: f64,
) -> OptimizeResponse {
    optimize_with_params(seed, robots, pending_jobs, sim_time_s, GaParams::default())
}

pub fn optimize_with_params(
    seed: u64,
    robots: &[RobotInput],
    pending_jobs: &[JobInput],
    sim_time_s: f64,
    params: GaParams,
) -> OptimizeResponse {
    let mut robots: Vec<RobotInput> = robots.to_vec();
    robots.sort_by_key(|r| r.id);

    let mut jobs: Vec<JobInput> = pending_jobs.to_vec();
    jobs.sort_by(|a, b| canonical_key(a).cmp(&canonical_key(b)));

    let n = jobs.len();
    let m = robots.len();

    if n == 0 || m == 0 {
        return OptimizeResponse {
            assignments: Vec::new(),
            meta: OptimizeMeta {
                best_score: 0.0,
                generations: params.generations,
                population_size: params.population_size,
                seed,
            },
        };
    }

    let mut rng = SimRng::from_seed(seed);

    let mut population: Vec<Chromosome> = Vec::with_capacity(params.population_size);
    population.push((0..n).map(|k| k % m).collect());
    for _ in 1..params.population_size {
        population.push((0..n).map(|_| rng.gen_usize(m)).collect());
    }

    for _ in 0..params.generations {
        let fitness: Vec<f64> = population
            .iter()
            .map(|c| evaluate(c, &robots, &jobs, sim_time_s))
            .collect();

        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by(|&a, &b| {
            fitness[a]
                .partial_cmp(&fitness[b])
                .unwrap()
                .then_with(|| chromosome_cmp(&population[a], &population[b]))
        });

        let elite_count = params.elite_size.min(population.len());
        let mut next_gen: Vec<Chromosome> = ranked[..elite_count]
            .iter()
            .map(|&i| population[i].clone())
            .collect();

        while next_gen.len() < params.population_size {
            let parent_a = tournament_select(&mut rng, &population, &fitness);
            let parent_b = tournament_select(&mut rng, &population, &fitness);

            let mut child = if rng.gen_bool(params.crossover_rate) {
                let cut = if n > 1 { rng.gen_usize(n) } else { 0 };
                let mut c = parent_a[..cut].to_vec();
                c.extend_from_slice(&parent_b[cut..]);
                c
            } else {
                parent_a.clone()
            };

            for gene in child.iter_mut() {
                if rng.gen_bool(params.mutation_rate) {
                    *gene = rng.gen_usize(m);
                }
            }

            next_gen.push(child);
        }

        next_gen.truncate(params.population_size);
        population = next_gen;
    }

    let final_fitness: Vec<f64> = population
        .iter()
        .map(|c| evaluate(c, &robots, &jobs, sim_time_s))
        .collect();

    let best_idx = (0..population.len())
        .min_by(|&a, &b| {
            final_fitness[a]
                .partial_cmp(&final_fitness[b])
                .unwrap()
                .then_with(|| chromosome_cmp(&population[a], &population[b]))
        })
        .expect("population is non-empty");

    let best_chromosome = &population[best_idx];
    let best_score = final_fitness[best_idx];

    let assignments = jobs
        .iter()
        .enumerate()
        .map(|(k, job)| Assignment {
            job_id: job.id.clone(),
            robot_id: robots[best_chromosome[k]].id,
            score: best_score,
        })
        .collect();

    OptimizeResponse {
        assignments,
        meta: OptimizeMeta {
            best_score,
            generations: params.generations,
            population_size: params.population_size,
            seed,
        },
    }
}

fn canonical_key(job: &JobInput) -> (i64, i64, String) {
    (job.deadline_ts, -(job.priority as i64), job.id.0.clone())
}

/// Tournament selection, size 3 (spec.md §4.4): competitor indices are
/// drawn from the seeded RNG, tie broken by ascending competitor index.
fn tournament_select<'a>(
    rng: &mut SimRng,
    population: &'a [Chromosome],
    fitness: &[f64],
) -> &'a Chromosome {
    let mut best_idx = rng.gen_usize(population.len());
    for _ in 1..3 {
        let candidate = rng.gen_usize(population.len());
        if fitness[candidate] < fitness[best_idx]
            || (fitness[candidate] == fitness[best_idx] && candidate < best_idx)
        {
            best_idx = candidate;
        }
    }
    &population[best_idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_core::{JobId, RobotId};
    use amr_entities::{Point, RobotState};

    fn robot(id: u32, x: f64, y: f64) -> RobotInput {
        RobotInput {
            id: RobotId(id),
            x,
            y,
            speed: 1.5,
            battery: 100.0,
            state: RobotState::Idle,
        }
    }

    fn job(id: &str, deadline: i64, priority: u8) -> JobInput {
        JobInput {
            id: JobId::new(id),
            pickup: Point::new(10.0, 10.0),
            dropoff: Point::new(20.0, 20.0),
            deadline_ts: deadline,
            priority,
        }
    }

    #[test]
    fn empty_inputs_return_empty_assignments() {
        let response = optimize(1, &[], &[], 0.0);
        assert!(response.assignments.is_empty());
    }

    #[test]
    fn same_seed_is_byte_identical_across_calls() {
        let robots = vec![robot(1, 0.0, 0.0), robot(2, 50.0, 50.0)];
        let jobs = vec![job("job_1", 100, 3), job("job_2", 80, 4)];
        let a = optimize(42, &robots, &jobs, 0.0);
        let b = optimize(42, &robots, &jobs, 0.0);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn assignments_are_in_canonical_job_order() {
        let robots = vec![robot(1, 0.0, 0.0)];
        let jobs = vec![job("job_b", 40, 3), job("job_a", 50, 3)];
        let response = optimize(7, &robots, &jobs, 0.0);
        assert_eq!(response.assignments[0].job_id.as_str(), "job_b");
        assert_eq!(response.assignments[1].job_id.as_str(), "job_a");
    }

    #[test]
    fn every_assignment_targets_a_known_robot() {
        let robots = vec![robot(1, 0.0, 0.0), robot(2, 10.0, 10.0), robot(3, 90.0, 90.0)];
        let jobs: Vec<JobInput> = (1..=5).map(|n| job(&format!("job_{n}"), 100 + n as i64, 3)).collect();
        let response = optimize(5, &robots, &jobs, 0.0);
        let robot_ids: Vec<u32> = robots.iter().map(|r| r.id.value()).collect();
        for a in &response.assignments {
            assert!(robot_ids.contains(&a.robot_id.value()));
        }
    }

    proptest::proptest! {
        /// Determinism of GA (spec.md §8 invariant 2): for all (seed,
        /// robots, pending_jobs, sim_time_s), optimize(...) returns a
        /// byte-equal assignment list across repeated calls.
        #[test]
        fn ga_is_deterministic_for_any_seed(
            seed in 0u64..10_000,
            n_robots in 1usize..6,
            n_jobs in 0usize..10,
            sim_time_s in 0.0f64..500.0,
        ) {
            let robots: Vec<RobotInput> = (1..=n_robots as u32)
                .map(|id| robot(id, (id as f64) * 7.0 % 100.0, (id as f64) * 13.0 % 100.0))
                .collect();
            let jobs: Vec<JobInput> = (1..=n_jobs as u32)
                .map(|n| job(&format!("job_{n}"), 50 + n as i64, ((n % 5) + 1) as u8))
                .collect();

            let a = optimize(seed, &robots, &jobs, sim_time_s);
            let b = optimize(seed, &robots, &jobs, sim_time_s);
            prop_assert_eq!(
                serde_json::to_string(&a).unwrap(),
                serde_json::to_string(&b).unwrap()
            );
        }
    }
}
