//! Error types for the remediation agent.
//!
//! Most failure modes are deliberately not errors: structured-call failures
//! recover locally via the kubectl fallback, and fallback failures are
//! reported inside `ActionOutcome`. Only failures that abort the pipeline
//! surface here.

use thiserror::Error;

/// Errors that abort processing of one alert.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The advisory source failed after exhausting its retries.
    #[error("advisory source failed: {0}")]
    Advisory(String),
}
