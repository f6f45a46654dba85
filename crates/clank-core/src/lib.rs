//! Clank Core: configuration, error type, usage estimation and the
//! vocabulary shared by every feedback pipeline.

pub mod config;
pub mod error;
pub mod text;
pub mod tokens;
pub mod usage;
pub mod vocabulary;

pub use config::{Config, LmConfig, ServerConfig, ServiceConfig};
pub use error::{Error, Result};
pub use usage::Usage;
pub use vocabulary::{Choice, Emotion, Importance, Intention, Sentiment, Severity, UNKNOWN_OPTION};
