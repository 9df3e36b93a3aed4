pub mod job;
pub mod robot;

pub use job::{canonical_job_key, sort_jobs_canonical, Job, JobState, Point};
pub use robot::{Robot, RobotProjection, RobotState};
