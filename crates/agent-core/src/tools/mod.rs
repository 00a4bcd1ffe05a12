pub mod assembler;
pub mod executor;
pub mod registry;
pub mod types;

pub use assembler::ToolCallAssembler;
pub use executor::{optional_argument, required_argument, ToolDispatcher, ToolError};
pub use registry::{RegistryError, SharedTool, Tool, ToolRegistry};
pub use types::{ToolArguments, ToolCall};
