// SPDX-License-Identifier: Apache-2.0

//! AI integration module.
//!
//! Provides the two model stages (log analysis, field value suggestion) on
//! top of any OpenAI-compatible completion API.

pub mod circuit_breaker;
pub mod client;
pub mod prompts;
pub mod provider;
pub mod registry;
pub mod types;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use client::AiClient;
pub use provider::{AiProvider, StageOutput, SuggestionInput};
pub use registry::{ProviderConfig, all_providers, get_provider};
pub use types::{AiStats, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Completion};
