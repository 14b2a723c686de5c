//! # autofix_llm
//!
//! Model-backed fix requests for autofix.
//!
//! The [`LlmFixRequester`] turns a [`autofix_core::FixRequest`] into a prompt,
//! sends it through a [`CompletionClient`] and unwraps the replacement file
//! content from the reply. [`LlmAdapter`] is the production client for
//! OpenAI and Anthropic.

pub mod client;
pub mod error;
pub mod prompt;
pub mod requester;

pub use client::{CompletionClient, LlmAdapter, LlmProvider, MAX_TOKENS, TEMPERATURE};
pub use error::{LlmError, LlmResult};
pub use prompt::{build_prompt, unwrap_code_fence};
pub use requester::LlmFixRequester;
