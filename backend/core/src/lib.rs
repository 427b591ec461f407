pub mod error;
pub mod tools;
pub mod traits;
pub mod turn;

pub use error::ChatError;
pub use tools::ToolRegistry;
pub use traits::{AssistantReply, ChatProvider, CompletionRequest, Tool};
pub use turn::{Role, ToolCall, ToolFunction, ToolSpec, Turn};
