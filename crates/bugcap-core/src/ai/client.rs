// SPDX-License-Identifier: Apache-2.0

//! Generic AI client for all registered providers.
//!
//! Provides a single `AiClient` struct that works with any OpenAI-compatible
//! provider registered in the provider registry. See [`super::registry`] for
//! available providers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;

use super::circuit_breaker::CircuitBreaker;
use super::provider::AiProvider;
use super::registry::{ProviderConfig, get_provider};
use crate::auth::CredentialProvider;
use crate::config::AiConfig;
use crate::error::BugcapError;

/// Generic AI client for all providers.
///
/// Holds HTTP client, API key, and model configuration for reuse across multiple requests.
/// Uses the provider registry to get provider-specific configuration.
#[derive(Debug)]
pub struct AiClient {
    /// Provider configuration from registry.
    provider: &'static ProviderConfig,
    /// HTTP client with configured timeout.
    http: Client,
    /// API key for provider authentication.
    api_key: SecretString,
    /// Model name (e.g., "gpt-4o-mini").
    model: String,
    /// Maximum tokens for API responses.
    max_tokens: u32,
    /// Temperature for API requests.
    temperature: f32,
    /// Circuit breaker for resilience.
    circuit_breaker: CircuitBreaker,
}

impl AiClient {
    /// Creates a new AI client, resolving the API key through `credentials`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Provider is not found in registry
    /// - The provider's API key is not available
    /// - HTTP client creation fails
    pub fn new(
        provider_name: &str,
        model: &str,
        credentials: &dyn CredentialProvider,
        config: &AiConfig,
    ) -> crate::Result<Self> {
        let provider = lookup(provider_name)?;
        let api_key = credentials.ai_api_key(provider.api_key_env).ok_or_else(|| {
            BugcapError::MissingCredentials {
                service: provider.display_name.to_string(),
                env_var: provider.api_key_env.to_string(),
            }
        })?;
        Self::build(provider, model, api_key, config)
    }

    /// Creates a new AI client with a provided API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unknown or the HTTP client cannot
    /// be built.
    pub fn with_api_key(
        provider_name: &str,
        model: &str,
        api_key: SecretString,
        config: &AiConfig,
    ) -> crate::Result<Self> {
        Self::build(lookup(provider_name)?, model, api_key, config)
    }

    fn build(
        provider: &'static ProviderConfig,
        model: &str,
        api_key: SecretString,
        config: &AiConfig,
    ) -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            provider,
            http,
            api_key,
            model: model.to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            circuit_breaker: CircuitBreaker::new(
                config.circuit_breaker_threshold,
                config.circuit_breaker_reset_seconds,
            ),
        })
    }
}

fn lookup(provider_name: &str) -> crate::Result<&'static ProviderConfig> {
    get_provider(provider_name).ok_or_else(|| BugcapError::Config {
        message: format!("Unknown AI provider: {provider_name}"),
    })
}

#[async_trait]
impl AiProvider for AiClient {
    fn name(&self) -> &str {
        self.provider.name
    }

    fn api_url(&self) -> &str {
        self.provider.api_url
    }

    fn api_key_env(&self) -> &str {
        self.provider.api_key_env
    }

    fn http_client(&self) -> &Client {
        &self.http
    }

    fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        Some(&self.circuit_breaker)
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(val) = "application/json".parse() {
            headers.insert("Content-Type", val);
        }

        // OpenRouter-specific attribution headers
        if self.provider.name == "openrouter" {
            if let Ok(val) = "https://github.com/bugcap/bugcap".parse() {
                headers.insert("HTTP-Referer", val);
            }
            if let Ok(val) = "bugcap".parse() {
                headers.insert("X-Title", val);
            }
        }

        headers
    }
}
