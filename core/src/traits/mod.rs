pub mod provider;
pub mod store;
pub mod tool;

pub use provider::{BuiltinTool, ChatRequest, ChatResponse, Provider};
pub use store::TranscriptStore;
pub use tool::{Tool, ToolOutcome, ToolSpec};
