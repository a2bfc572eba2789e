//! Notification event types for the remediation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity levels for alerts and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - normal operations
    Info,
    /// Warning - something needs attention
    Warning,
    /// Critical - immediate action required
    Critical,
}

impl Severity {
    /// Get display name for this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }

    /// Map an Alertmanager `severity` label to a notification severity.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "critical" => Self::Critical,
            "warning" => Self::Warning,
            _ => Self::Info,
        }
    }
}

/// Events that can trigger notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifyEvent {
    /// An alert went through the remediation pipeline end to end.
    AlertProcessed {
        alert_name: String,
        severity: Severity,
        description: String,
        analysis: String,
        action_summary: String,
        elapsed_secs: f64,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    /// The pipeline itself failed before producing an outcome.
    AgentError {
        message: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
}

impl NotifyEvent {
    /// Get a short title for this event type.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::AlertProcessed { alert_name, .. } => format!("Alert Processed: {alert_name}"),
            Self::AgentError { .. } => "Remediation Agent Error".to_string(),
        }
    }

    /// Get the severity for this event.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::AlertProcessed { severity, .. } => *severity,
            Self::AgentError { .. } => Severity::Critical,
        }
    }

    /// Get the timestamp for this event.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::AlertProcessed { timestamp, .. } | Self::AgentError { timestamp, .. } => {
                *timestamp
            }
        }
    }
}
