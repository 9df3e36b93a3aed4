pub mod events;
pub mod runner;
pub mod world;

pub use events::SimEvent;
pub use runner::Runner;
pub use world::{InboundAssignment, World};
