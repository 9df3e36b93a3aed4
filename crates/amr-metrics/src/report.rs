//! Human-readable rendering of a `RunMetrics`, used by the CLI's `run` and
//! `compare` subcommands.

use crate::collector::RunMetrics;

pub fn render_text(run_id: &str, mode: &str, metrics: &RunMetrics) -> String {
    format!(
        "run {run_id} ({mode})\n\
         completed_jobs:      {}\n\
         failed_jobs:         {}\n\
         total_jobs:          {}\n\
         on_time_rate:        {:.3}\n\
         total_distance:      {:.2}\n\
         avg_completion_time: {:.2}\n\
         max_lateness:        {:.2}\n",
        metrics.completed_jobs,
        metrics.failed_jobs,
        metrics.total_jobs,
        metrics.on_time_rate,
        metrics.total_distance,
        metrics.avg_completion_time,
        metrics.max_lateness,
    )
}
