//! Typed identifiers for runs, robots, jobs, and events.
//!
//! Robots and events are dense integers assigned by the scenario generator
//! and the bus respectively, so they get the teacher's `define_id!` newtype
//! treatment. Runs and jobs are externally/generator-assigned stable strings
//! (`run_id` is opaque, `job_id` is `job_{n}`) and so are thin string
//! newtypes instead.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

macro_rules! define_numeric_id {
    ($name:ident, $inner:ty) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub $inner);

        impl $name {
            pub fn new(value: $inner) -> Self {
                Self(value)
            }

            pub fn value(&self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }
    };
}

define_numeric_id!(RobotId, u32);
define_numeric_id!(EventId, u64);

macro_rules! define_string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_string_id!(RunId);
define_string_id!(JobId);

impl JobId {
    /// Builds the stable `job_{n}` id the scenario generator produces, `n` 1-based.
    pub fn for_index(n: u32) -> Self {
        Self(format!("job_{n}"))
    }
}

/// Generates dense, monotonically increasing event ids for one bus instance.
#[derive(Debug, Default)]
pub struct EventIdGenerator {
    next: AtomicU64,
}

impl EventIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> EventId {
        EventId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Generates dense robot ids in ascending order (1-based, per spec.md §3).
#[derive(Debug, Default)]
pub struct RobotIdGenerator {
    next: AtomicU32,
}

impl RobotIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    pub fn next(&self) -> RobotId {
        RobotId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_formats_with_stable_prefix() {
        assert_eq!(JobId::for_index(1).as_str(), "job_1");
        assert_eq!(JobId::for_index(42).as_str(), "job_42");
    }

    #[test]
    fn robot_id_generator_is_ascending_and_one_based() {
        let gen = RobotIdGenerator::new();
        assert_eq!(gen.next(), RobotId(1));
        assert_eq!(gen.next(), RobotId(2));
        assert_eq!(gen.next(), RobotId(3));
    }

    #[test]
    fn event_id_generator_is_monotonic() {
        let gen = EventIdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert!(b.value() > a.value());
    }
}
