//! Alertmanager webhook payload types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alertmanager webhook payload.
///
/// Reference: <https://prometheus.io/docs/alerting/latest/configuration/#webhook_config>
///
/// Only the `alerts` array is consumed; the surrounding group metadata is
/// accepted and ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookPayload {
    /// List of alerts in this notification
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// Individual alert from Alertmanager.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Alert {
    /// Status: "firing" or "resolved"
    #[serde(default = "default_status")]
    pub status: String,
    /// Alert labels
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Alert annotations
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

fn default_status() -> String {
    "firing".to_string()
}

impl Alert {
    /// Get the alert name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.labels.get("alertname").map_or("unknown", String::as_str)
    }

    /// Get the severity.
    #[must_use]
    pub fn severity(&self) -> &str {
        self.labels.get("severity").map_or("unknown", String::as_str)
    }

    /// Get the description annotation, if present.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.annotations.get("description").map(String::as_str)
    }

    /// Get the summary annotation, if present.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.annotations.get("summary").map(String::as_str)
    }

    /// Check if this is a firing alert.
    #[must_use]
    pub fn is_firing(&self) -> bool {
        self.status == "firing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_deserializes_minimal_alert() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{"alerts":[{"status":"firing","labels":{"alertname":"HighCPU","severity":"warning"},"annotations":{"description":"CPU high"}}]}"#,
        )
        .unwrap();
        assert_eq!(payload.alerts.len(), 1);

        let alert = &payload.alerts[0];
        assert_eq!(alert.name(), "HighCPU");
        assert_eq!(alert.severity(), "warning");
        assert_eq!(alert.description(), Some("CPU high"));
        assert!(alert.is_firing());
    }

    #[test]
    fn test_missing_fields_default() {
        let alert: Alert = serde_json::from_str("{}").unwrap();
        assert_eq!(alert.status, "firing");
        assert_eq!(alert.name(), "unknown");
        assert_eq!(alert.severity(), "unknown");
        assert!(alert.description().is_none());
        assert!(alert.summary().is_none());
    }

    #[test]
    fn test_empty_alerts_array() {
        let payload: WebhookPayload = serde_json::from_str(r#"{"alerts":[]}"#).unwrap();
        assert!(payload.alerts.is_empty());

        let payload: WebhookPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.alerts.is_empty());
    }
}
