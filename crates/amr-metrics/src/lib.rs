pub mod collector;
pub mod report;

pub use collector::{MetricsCollector, RunMetrics};
pub use report::render_text;
