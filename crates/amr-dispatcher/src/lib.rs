pub mod baseline;
pub mod dispatcher;
pub mod ga_trigger;
pub mod projection;

pub use baseline::{run_baseline_sweep, AssignmentCommand};
pub use dispatcher::Dispatcher;
pub use ga_trigger::{idle_gap_trigger, initial_trigger, periodic_trigger, GaTrigger};
pub use projection::Projection;
