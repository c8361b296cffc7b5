use thiserror::Error;

use crate::core::types::{FormationGroupId, UnitId};

#[derive(Error, Debug)]
pub enum TacticalError {
    #[error("Unit not found: {0:?}")]
    UnitNotFound(UnitId),

    #[error("Formation group not found: {0:?}")]
    GroupNotFound(FormationGroupId),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Map error: {0}")]
    MapError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TacticalError>;
