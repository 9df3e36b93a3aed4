//! Domain error taxonomy shared by the core crates (spec.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    pub fn robot_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity_type: "robot",
            id: id.to_string(),
        }
    }

    pub fn job_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity_type: "job",
            id: id.to_string(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
