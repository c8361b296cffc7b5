pub mod config;
pub mod error;
pub mod types;

pub use config::{load_config, TacticalConfig};
pub use error::{Result, TacticalError};
