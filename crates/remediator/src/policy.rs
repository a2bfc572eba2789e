//! Remediation policy: decides whether and how to act on a parsed intent.
//!
//! Pure function over its inputs; all I/O lives in the executor.

use serde::Serialize;

use crate::intent::RemediationIntent;

/// Skip message when no actionable intent was found.
pub const SKIP_MANUAL_REVIEW: &str =
    "⚠️ No automated remediation performed, manual review recommended.";

/// Canned outcome for a simulated scale in demo mode.
pub const SIMULATED_SCALE: &str = "✅ (demo) simulated scale, no cluster changes made.";

/// Canned outcome for a simulated restart in demo mode.
pub const SIMULATED_RESTART: &str = "🔁 (demo) simulated restart, no cluster changes made.";

/// Canned outcome for demo mode when there is nothing to do.
pub const SIMULATED_NO_ACTION: &str = "ℹ️ (demo) no action.";

/// A concrete action for the executor to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionRequest {
    /// Patch the replica count of a deployment.
    Scale { target: String, replicas: u32 },
    /// Trigger a rolling restart of a deployment.
    Restart { target: String },
    /// Run a raw command line on the fallback path only.
    RawCommand { text: String },
}

/// Outcome of the policy decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Run this action against the cluster.
    Execute(ActionRequest),
    /// Demo mode: report a canned simulated outcome, touch nothing.
    Simulated(&'static str),
    /// Nothing to do; report why.
    Skip(&'static str),
}

/// Decide what to do with a parsed intent.
///
/// In demo mode no real action is ever issued; each intent kind maps to a
/// fixed simulated description.
#[must_use]
pub fn decide(intent: RemediationIntent, demo_mode: bool) -> Decision {
    if demo_mode {
        return match intent {
            RemediationIntent::Scale { .. } => Decision::Simulated(SIMULATED_SCALE),
            RemediationIntent::Restart { .. } => Decision::Simulated(SIMULATED_RESTART),
            RemediationIntent::RawCommand { .. } | RemediationIntent::None => {
                Decision::Simulated(SIMULATED_NO_ACTION)
            }
        };
    }

    match intent {
        RemediationIntent::Scale { target, replicas } => {
            Decision::Execute(ActionRequest::Scale { target, replicas })
        }
        RemediationIntent::Restart { target } => {
            Decision::Execute(ActionRequest::Restart { target })
        }
        RemediationIntent::RawCommand { text } => {
            Decision::Execute(ActionRequest::RawCommand { text })
        }
        RemediationIntent::None => Decision::Skip(SKIP_MANUAL_REVIEW),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_maps_to_scale_request() {
        let decision = decide(
            RemediationIntent::Scale {
                target: "cpu-app".to_string(),
                replicas: 4,
            },
            false,
        );
        assert_eq!(
            decision,
            Decision::Execute(ActionRequest::Scale {
                target: "cpu-app".to_string(),
                replicas: 4,
            })
        );
    }

    #[test]
    fn test_restart_maps_to_restart_request() {
        let decision = decide(
            RemediationIntent::Restart {
                target: "my-app".to_string(),
            },
            false,
        );
        assert_eq!(
            decision,
            Decision::Execute(ActionRequest::Restart {
                target: "my-app".to_string(),
            })
        );
    }

    #[test]
    fn test_raw_command_stays_raw() {
        let decision = decide(
            RemediationIntent::RawCommand {
                text: "kubectl get pods".to_string(),
            },
            false,
        );
        assert_eq!(
            decision,
            Decision::Execute(ActionRequest::RawCommand {
                text: "kubectl get pods".to_string(),
            })
        );
    }

    #[test]
    fn test_none_skips_with_manual_review_message() {
        let decision = decide(RemediationIntent::None, false);
        assert_eq!(decision, Decision::Skip(SKIP_MANUAL_REVIEW));
    }

    #[test]
    fn test_demo_mode_never_executes() {
        let intents = [
            RemediationIntent::Scale {
                target: "cpu-app".to_string(),
                replicas: 4,
            },
            RemediationIntent::Restart {
                target: "cpu-app".to_string(),
            },
            RemediationIntent::RawCommand {
                text: "rm -rf /".to_string(),
            },
            RemediationIntent::None,
        ];
        for intent in intents {
            assert!(matches!(decide(intent, true), Decision::Simulated(_)));
        }
    }

    #[test]
    fn test_demo_mode_fixed_strings_keyed_by_kind() {
        assert_eq!(
            decide(
                RemediationIntent::Scale {
                    target: "x".to_string(),
                    replicas: 1,
                },
                true,
            ),
            Decision::Simulated(SIMULATED_SCALE)
        );
        assert_eq!(
            decide(
                RemediationIntent::Restart {
                    target: "x".to_string(),
                },
                true,
            ),
            Decision::Simulated(SIMULATED_RESTART)
        );
        assert_eq!(
            decide(RemediationIntent::None, true),
            Decision::Simulated(SIMULATED_NO_ACTION)
        );
    }
}
