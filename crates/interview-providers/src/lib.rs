//! interview-providers — hosted language-model integrations.
//!
//! Implements the `LlmProvider` trait for OpenAI-compatible chat completion
//! APIs (Together, OpenAI, Ollama) plus a mock used in tests.

pub mod chat;
pub mod factory;
pub mod mock;

pub use chat::ChatCompletionsProvider;
pub use factory::create_provider;
pub use interview_core::error::ProviderError;
pub use mock::MockProvider;
