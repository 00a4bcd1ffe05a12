pub mod config;
pub mod openai;
pub mod provider;
pub mod sse;
pub mod types;

pub use config::LLMConfig;
pub use openai::OpenAIProvider;
pub use provider::{ChatResponse, LLMError, LLMProvider, LLMStream};
pub use types::LLMChunk;
