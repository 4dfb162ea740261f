pub mod llm;
pub mod orchestrator;
pub mod prompts;

pub use llm::{LlmClient, LlmError, LlmResult, OpenAiChatClient, RawToolCall};
pub use orchestrator::QueryOrchestrator;
