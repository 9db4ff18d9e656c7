// SPDX-License-Identifier: Apache-2.0

//! CLI-specific error formatting with user-friendly hints.
//!
//! Downcasts `anyhow::Error` to `BugcapError` and appends a tip for the
//! error kinds a user can act on. Other hosts format the same errors their
//! own way.

use std::fmt::Write;

use anyhow::Error;
use bugcap_core::BugcapError;

/// Formats an error for CLI display with helpful hints.
///
/// If the error is not a `BugcapError`, returns the error chain unchanged.
pub fn format_error(error: &Error) -> String {
    let Some(err) = error.downcast_ref::<BugcapError>() else {
        return format!("{error:#}");
    };

    match err {
        BugcapError::MissingCredentials { env_var, .. } => {
            format!("{err}\n\nTip: Export {env_var} before running bugcap.")
        }
        BugcapError::Config { .. } => {
            format!(
                "{err}\n\nTip: Check your config file at {}",
                bugcap_core::config_file_path().display()
            )
        }
        BugcapError::NotFound { resource, .. } if resource == "Project" => {
            format!(
                "{err}\n\nTip: Check the project key and that your Jira account can browse it."
            )
        }
        BugcapError::RateLimited {
            provider,
            retry_after,
        } => format_rate_limited_error(provider, *retry_after),
        BugcapError::Upstream {
            service,
            status: Some(401 | 403),
            ..
        } if service == "Jira" => {
            format!("{err}\n\nTip: Check JIRA_EMAIL and JIRA_API_TOKEN.")
        }
        BugcapError::CircuitOpen => {
            format!(
                "{err}\n\nTip: The AI provider is temporarily unavailable. Please try again in a moment."
            )
        }
        BugcapError::Network(_) => {
            format!("{err}\n\nTip: Check your internet connection and try again.")
        }
        _ => err.to_string(),
    }
}

/// Formats a rate limit error with provider-specific hints.
fn format_rate_limited_error(provider: &str, retry_after: u64) -> String {
    let mut msg = format!("Rate limit exceeded on {provider}, retry after {retry_after}s");
    let _ = write!(
        msg,
        "\n\nTip: Wait at least {retry_after} seconds before retrying."
    );
    if provider == "openrouter" {
        msg.push_str("\n- To increase your rate limit, upgrade your OpenRouter account:");
        msg.push_str("\n  https://openrouter.ai/account/limits");
    }
    msg
}
