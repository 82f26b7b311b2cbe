//! depot-scout agents
//!
//! The tool-using agent that answers product questions:
//! - **Backend**: OpenAI-compatible and Anthropic completion clients
//! - **Prompt**: TOML-defined template and tool usage hints
//! - **Parser**: turns a model reply into an action or a final answer
//! - **Tools**: `locate_product` and `describe_product`
//! - **Agent**: the bounded think/act/observe loop
//!
//! The default prompt is embedded from `prompts/agent.toml`.
//! See [`prompt::PromptTemplate`] for loading a custom one.

pub mod backend;
pub mod prompt;
pub mod parser;
pub mod tools;
pub mod agent;

pub use backend::*;
pub use prompt::*;
pub use parser::*;
pub use tools::*;
pub use agent::*;
