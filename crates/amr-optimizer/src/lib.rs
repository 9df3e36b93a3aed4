pub mod fitness;
pub mod optimize;
pub mod protocol;

pub use fitness::evaluate;
pub use optimize::{optimize, optimize_with_params, GaParams};
pub use protocol::{Assignment, JobInput, OptimizeMeta, OptimizeRequest, OptimizeResponse, RobotInput};
