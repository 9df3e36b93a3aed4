//! Scenario hash: a stable digest of the generated scenario payload, used to
//! assert reproducibility across runs with identical inputs (spec.md §3, §8
//! invariant 1). Depends only on `(seed, n_robots, n_jobs, world_size,
//! speed_min, speed_max)` — no wall-clock input, per the invariant in §3.

use sha2::{Digest, Sha256};

use crate::generator::Scenario;

pub fn scenario_hash(scenario: &Scenario) -> String {
    let robots_json = serde_json::to_vec(&scenario.robots).expect("robots are always encodable");
    let jobs_json = serde_json::to_vec(&scenario.jobs).expect("jobs are always encodable");

    let mut hasher = Sha256::new();
    hasher.update(&robots_json);
    hasher.update(&jobs_json);
    hex::encode_lower(hasher.finalize())
}

/// Minimal hex encoder so the hash has no extra dependency beyond `sha2`.
mod hex {
    pub fn encode_lower(bytes: impl AsRef<[u8]>) -> String {
        use std::fmt::Write;
        let mut out = String::with_capacity(bytes.as_ref().len() * 2);
        for b in bytes.as_ref() {
            write!(out, "{b:02x}").unwrap();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate, GeneratorParams};

    fn params(seed: u64) -> GeneratorParams {
        GeneratorParams {
            seed,
            n_robots: 5,
            n_jobs: 5,
            world_size: 100.0,
            speed_min: 1.0,
            speed_max: 2.0,
            service_time_s: 5.0,
        }
    }

    #[test]
    fn identical_inputs_produce_identical_hash() {
        let a = generate(params(42));
        let b = generate(params(42));
        assert_eq!(scenario_hash(&a), scenario_hash(&b));
    }

    #[test]
    fn different_seeds_produce_different_hash() {
        let a = generate(params(1));
        let b = generate(params(2));
        assert_ne!(scenario_hash(&a), scenario_hash(&b));
    }

    #[test]
    fn hash_is_64_hex_characters() {
        let s = generate(params(9));
        let h = scenario_hash(&s);
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
