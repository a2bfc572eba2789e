//! Extraction of structured remediation intents from advisory text.
//!
//! The advisory source is asked to mark machine-actionable suggestions with
//! an `AUTO:` directive (for example `AUTO: scale deployment cpu-app to 4`).
//! Everything after the first marker is tokenized and matched against the
//! two supported verbs; anything else falls through to a raw command line
//! that only ever runs on the kubectl fallback path.

use serde::Serialize;
use tracing::{debug, warn};

/// Literal marker that introduces a machine-actionable directive.
const AUTO_MARKER: &str = "AUTO:";

/// Deployment targeted by heuristic (non-directive) matches.
const DEFAULT_TARGET: &str = "cpu-app";

/// A remediation intent extracted from advisory text.
///
/// Exactly one variant is produced per advisory text. `RawCommand` is a
/// deliberate security boundary: its text is never upgraded to a structured
/// API call and only runs on the lexed argument-vector fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemediationIntent {
    /// Scale a deployment to an explicit replica count.
    Scale { target: String, replicas: u32 },
    /// Rolling-restart a deployment.
    Restart { target: String },
    /// An unrecognized directive, to run verbatim on the fallback path.
    RawCommand { text: String },
    /// No actionable intent found.
    None,
}

/// Parse advisory text into a remediation intent.
///
/// An `AUTO:` directive takes priority over the keyword heuristics; the
/// heuristics only see advisory text without a marker.
#[must_use]
pub fn parse(advisory: &str, default_replicas: u32) -> RemediationIntent {
    if let Some(idx) = advisory.find(AUTO_MARKER) {
        let directive = advisory[idx + AUTO_MARKER.len()..].trim();
        return parse_directive(directive, default_replicas);
    }

    let lower = advisory.to_lowercase();
    if lower.contains("scale") && lower.contains("deployment") {
        return RemediationIntent::Scale {
            target: DEFAULT_TARGET.to_string(),
            replicas: default_replicas,
        };
    }
    if lower.contains("restart") || lower.contains("rollout") {
        return RemediationIntent::Restart {
            target: DEFAULT_TARGET.to_string(),
        };
    }

    debug!("Advisory text contains no actionable intent");
    RemediationIntent::None
}

/// Parse the text after the `AUTO:` marker.
///
/// A malformed directive (missing target token, empty text) never fails the
/// pipeline: it degrades to `RawCommand` when any directive text exists, and
/// to `None` otherwise.
fn parse_directive(directive: &str, default_replicas: u32) -> RemediationIntent {
    let tokens: Vec<&str> = directive.split_whitespace().collect();
    if tokens.is_empty() {
        warn!("AUTO: marker present but directive is empty");
        return RemediationIntent::None;
    }

    let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    let position = |word: &str| lower.iter().position(|t| t == word);

    if position("scale").is_some() && position("deployment").is_some() {
        let dep_idx = position("deployment").unwrap_or(0);
        if let Some(target) = tokens.get(dep_idx + 1) {
            let replicas = position("to")
                .and_then(|to_idx| tokens.get(to_idx + 1))
                .and_then(|t| t.parse().ok())
                .unwrap_or(default_replicas);
            return RemediationIntent::Scale {
                target: (*target).to_string(),
                replicas,
            };
        }
        warn!(directive, "Scale directive has no target; treating as raw command");
        return RemediationIntent::RawCommand {
            text: directive.to_string(),
        };
    }

    if position("restart").is_some() && position("deployment").is_some() {
        let dep_idx = position("deployment").unwrap_or(0);
        if let Some(target) = tokens.get(dep_idx + 1) {
            return RemediationIntent::Restart {
                target: (*target).to_string(),
            };
        }
        warn!(directive, "Restart directive has no target; treating as raw command");
        return RemediationIntent::RawCommand {
            text: directive.to_string(),
        };
    }

    RemediationIntent::RawCommand {
        text: directive.to_string(),
    }
}
