// SPDX-License-Identifier: Apache-2.0

//! Static registry of the completion providers bugcap can talk to.
//!
//! Every entry speaks the OpenAI chat-completions dialect; only the URL and
//! the API-key variable differ.
//!
//! # Examples
//!
//! ```
//! use bugcap_core::ai::registry::{get_provider, all_providers};
//!
//! let provider = get_provider("openai");
//! assert!(provider.is_some());
//! assert_eq!(all_providers().len(), 5);
//! ```

/// Configuration for an AI provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Provider identifier (lowercase, used in config files)
    pub name: &'static str,

    /// Human-readable provider name for UI display
    pub display_name: &'static str,

    /// Chat completions endpoint
    pub api_url: &'static str,

    /// Environment variable name for API key
    pub api_key_env: &'static str,
}

/// Static registry of all supported AI providers
pub static PROVIDERS: &[ProviderConfig] = &[
    ProviderConfig {
        name: "openai",
        display_name: "OpenAI",
        api_url: "https://api.openai.com/v1/chat/completions",
        api_key_env: "OPENAI_API_KEY",
    },
    ProviderConfig {
        name: "openrouter",
        display_name: "OpenRouter",
        api_url: "https://openrouter.ai/api/v1/chat/completions",
        api_key_env: "OPENROUTER_API_KEY",
    },
    ProviderConfig {
        name: "groq",
        display_name: "Groq",
        api_url: "https://api.groq.com/openai/v1/chat/completions",
        api_key_env: "GROQ_API_KEY",
    },
    ProviderConfig {
        name: "gemini",
        display_name: "Google Gemini",
        api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
        api_key_env: "GEMINI_API_KEY",
    },
    ProviderConfig {
        name: "cerebras",
        display_name: "Cerebras",
        api_url: "https://api.cerebras.ai/v1/chat/completions",
        api_key_env: "CEREBRAS_API_KEY",
    },
];

/// Looks up a provider by name (case-insensitive).
#[must_use]
pub fn get_provider(name: &str) -> Option<&'static ProviderConfig> {
    PROVIDERS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Returns every registered provider.
#[must_use]
pub fn all_providers() -> &'static [ProviderConfig] {
    PROVIDERS
}
