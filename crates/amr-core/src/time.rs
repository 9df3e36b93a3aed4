//! Simulation time: a monotonic, fractional-seconds clock decoupled from wall
//! clock (spec.md §9: "sim-time and wall-clock are decoupled").

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Integer seconds, used for once-per-sim-second emission (§4.2 step 5).
    pub fn whole_seconds(&self) -> i64 {
        self.0.floor() as i64
    }
}

impl Add<f64> for SimTime {
    type Output = SimTime;
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl AddAssign<f64> for SimTime {
    fn add_assign(&mut self, rhs: f64) {
        self.0 += rhs;
    }
}

impl Sub for SimTime {
    type Output = f64;
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advance_is_additive() {
        let mut t = SimTime::ZERO;
        t += 0.2;
        t += 0.2;
        assert!((t.seconds() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn whole_seconds_floors() {
        assert_eq!(SimTime(4.999).whole_seconds(), 4);
        assert_eq!(SimTime(5.0).whole_seconds(), 5);
    }
}
