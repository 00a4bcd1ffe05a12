pub mod config;
pub mod runner;
pub mod stream;

pub use config::{AgentLoopConfig, ConfigError, DEFAULT_MAX_TURNS, DEFAULT_SYSTEM_PROMPT};
pub use runner::{SessionHandle, TurnOrchestrator};
