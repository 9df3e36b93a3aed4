//! Accumulates the per-tick facts the end-of-run report needs: distance
//! travelled and completed/failed job outcomes. The simulator feeds this
//! incrementally; `RunMetrics` is computed once, at `run.completed`
//! (spec.md §4.2 "Metrics").

use amr_entities::Job;

#[derive(Debug, Default, Clone)]
pub struct MetricsCollector {
    total_distance: f64,
    completed_count: u64,
    failed_count: u64,
    on_time_count: u64,
    completion_time_sum: f64,
    max_lateness: f64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_distance(&mut self, delta: f64) {
        self.total_distance += delta.abs();
    }

    pub fn record_job(&mut self, job: &Job) {
        use amr_entities::JobState;
        match job.state {
            JobState::Completed => {
                self.completed_count += 1;
                if job.is_on_time() {
                    self.on_time_count += 1;
                }
                if let (Some(completed), created) = (job.completed_sim_ts, job.created_sim_ts) {
                    self.completion_time_sum += completed - created;
                }
                let lateness = job.lateness_s.unwrap_or(0.0).max(0.0);
                if lateness > self.max_lateness {
                    self.max_lateness = lateness;
                }
            }
            JobState::Failed => self.failed_count += 1,
            _ => {}
        }
    }

    pub fn report(&self, total_jobs: u64) -> RunMetrics {
        RunMetrics {
            completed_jobs: self.completed_count,
            failed_jobs: self.failed_count,
            total_jobs,
            on_time_rate: if total_jobs == 0 {
                0.0
            } else {
                self.on_time_count as f64 / total_jobs as f64
            },
            total_distance: self.total_distance,
            avg_completion_time: if self.completed_count == 0 {
                0.0
            } else {
                self.completion_time_sum / self.completed_count as f64
            },
            max_lateness: self.max_lateness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunMetrics {
    pub completed_jobs: u64,
    pub failed_jobs: u64,
    pub total_jobs: u64,
    pub on_time_rate: f64,
    pub total_distance: f64,
    pub avg_completion_time: f64,
    pub max_lateness: f64,
}

impl RunMetrics {
    /// Spec.md §8 invariant 8.
    pub fn arithmetic_is_sound(&self) -> bool {
        self.completed_jobs + self.failed_jobs <= self.total_jobs
    }
}
