pub mod generator;
pub mod hash;
pub mod run_config;
pub mod scale;

pub use generator::{generate, GeneratorParams, Scenario};
pub use hash::scenario_hash;
pub use run_config::{JobOverride, Mode, RobotOverride, RunConfig, RunContext, ScenarioError};
pub use scale::{Scale, UnknownScale};
