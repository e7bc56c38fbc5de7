pub mod context;
pub mod loop_;
pub mod registry;

pub use context::ContextBuilder;
pub use loop_::{AgentLoop, DEFAULT_MAX_ROUNDS, LoopState};
pub use registry::ToolRegistry;
