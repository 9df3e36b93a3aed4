pub mod bus;
pub mod error;
pub mod id;
pub mod rng;
pub mod time;

/// Percent of battery drained per elapsed sim-second while a robot is
/// neither idle nor charging (spec.md §9 open question: the source doesn't
/// specify this constant; chosen as 0.05%/tick at the default 5 Hz tick
/// rate = 0.25%/sim-sec so a demo-scale run depletes only occasionally).
/// Shared by the simulator's per-tick drain and the GA's battery-term
/// fitness estimate so both model the same robot.
pub const BATTERY_DRAIN_PCT_PER_SIM_SECOND: f64 = 0.25;

pub use bus::{Envelope, TopicBus};
pub use error::{SimError, SimResult};
pub use id::{EventId, EventIdGenerator, JobId, RobotId, RobotIdGenerator, RunId};
pub use rng::SimRng;
pub use time::SimTime;
