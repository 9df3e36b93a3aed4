//! The four named scales and their `(n_robots, n_jobs)` defaults (spec.md §3).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Mini,
    Small,
    Demo,
    Large,
}

#[derive(Debug, Error)]
#[error("unknown scale: {0}")]
pub struct UnknownScale(pub String);

impl Scale {
    pub fn defaults(&self) -> (u32, u32) {
        match self {
            Scale::Mini => (5, 5),
            Scale::Small => (5, 25),
            Scale::Demo => (10, 50),
            Scale::Large => (20, 100),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Mini => "mini",
            Scale::Small => "small",
            Scale::Demo => "demo",
            Scale::Large => "large",
        }
    }
}

impl std::str::FromStr for Scale {
    type Err = UnknownScale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mini" => Ok(Scale::Mini),
            "small" => Ok(Scale::Small),
            "demo" => Ok(Scale::Demo),
            "large" => Ok(Scale::Large),
            other => Err(UnknownScale(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        assert_eq!(Scale::Mini.defaults(), (5, 5));
        assert_eq!(Scale::Small.defaults(), (5, 25));
        assert_eq!(Scale::Demo.defaults(), (10, 50));
        assert_eq!(Scale::Large.defaults(), (20, 100));
    }

    #[test]
    fn parses_from_str() {
        assert_eq!("demo".parse::<Scale>().unwrap(), Scale::Demo);
        assert!("huge".parse::<Scale>().is_err());
    }
}
