pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod providers;
pub mod session;
pub mod store;
pub mod tools;
pub mod traits;

#[cfg(test)]
mod testing;

pub use agent::{AgentLoop, ContextBuilder, LoopState, ToolRegistry};
pub use config::*;
pub use conversation::{Conversation, Role, ToolCallRequest, TranscriptFormat, Turn};
pub use error::*;
pub use providers::{GeminiProvider, OpenAIProvider, create_provider};
pub use session::{SessionHandle, SessionRepository, create_session_id};
pub use store::{FileTranscriptStore, MemoryTranscriptStore, create_transcript_store};
pub use tools::*;
pub use traits::*;
