//! Generators - LLM-backed summaries and synectics ideas
//!
//! This crate implements the two generator seams the Slack jobs call:
//! - **Summaries** (`summary`) - recent channel messages + the user's topic → summary
//! - **Synectics** (`synectics`) - two unrelated words → a creative combination
//! - **LLM access** (`llm`) - `LlmClient` trait and an HTTP client for
//!   OpenAI-compatible, Anthropic and Ollama endpoints
//!
//! # Key Types
//!
//! - `LlmClient` - Pluggable completion trait
//! - `HttpLlmClient` - reqwest implementation selected by `LlmProvider`
//! - `LlmSummarizer` / `LlmIdeaGenerator` - prompt builders implementing the core ports
//!
//! The generators only build prompts and relay completions. Formatting and
//! posting stay in the Slack crate.

pub mod llm;
pub mod summary;
pub mod synectics;

pub use llm::{GenerationError, HttpLlmClient, LlmClient};
pub use summary::LlmSummarizer;
pub use synectics::LlmIdeaGenerator;
