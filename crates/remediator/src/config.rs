//! Configuration for the remediation agent.

use std::env;

/// Agent settings, loaded once at process start and never reloaded.
///
/// Telegram settings are owned by the `notify` crate's `from_env`.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP server port.
    pub port: u16,
    /// Gemini API key. Absent means the advisory source runs offline and
    /// returns a canned analysis.
    pub gemini_api_key: Option<String>,
    /// Preferred Gemini model; the advisory client falls back through a
    /// candidate list if this one fails.
    pub gemini_model: String,
    /// Replica count used when a scale directive omits an explicit count.
    pub default_scale_replicas: u32,
    /// Whether recommended actions are actually executed.
    pub auto_remediate: bool,
    /// Demo mode: no cluster or advisory calls, canned outputs only.
    pub demo_mode: bool,
    /// Advisory source retry attempts.
    pub advisory_retry_count: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash-latest".to_string()),
            default_scale_replicas: env::var("DEFAULT_SCALE_REPLICAS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            auto_remediate: env_flag("AUTO_REMEDIATE", true),
            demo_mode: env_flag("DEMO_MODE", false),
            advisory_retry_count: env::var("ADVISORY_RETRY_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        }
    }
}

/// Read a boolean flag from the environment, accepting `1`/`true`/`yes`.
fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        for var in [
            "PORT",
            "GEMINI_API_KEY",
            "GEMINI_MODEL",
            "DEFAULT_SCALE_REPLICAS",
            "AUTO_REMEDIATE",
            "DEMO_MODE",
            "ADVISORY_RETRY_COUNT",
        ] {
            env::remove_var(var);
        }

        let settings = Settings::default();
        assert_eq!(settings.port, 8000);
        assert!(settings.gemini_api_key.is_none());
        assert_eq!(settings.gemini_model, "gemini-1.5-flash-latest");
        assert_eq!(settings.default_scale_replicas, 4);
        assert!(settings.auto_remediate);
        assert!(!settings.demo_mode);
        assert_eq!(settings.advisory_retry_count, 3);
    }

    #[test]
    #[serial]
    fn test_env_flag_accepts_yes() {
        env::set_var("DEMO_MODE", "yes");
        env::set_var("AUTO_REMEDIATE", "0");
        let settings = Settings::default();
        assert!(settings.demo_mode);
        assert!(!settings.auto_remediate);
        env::remove_var("DEMO_MODE");
        env::remove_var("AUTO_REMEDIATE");
    }
}
