//! Configuration (layered: code > env > defaults).

use std::fmt;
use std::time::Duration;

use crate::agent_loop::PollSettings;
use crate::error::TetherError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Settings for one orchestration client.
///
/// Built explicitly and handed to the API client and poller; nothing here is
/// process-wide, so independent sessions can use different settings.
#[derive(Clone)]
pub struct TetherConfig {
    api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub poll_interval: Duration,
    pub max_polls: Option<u32>,
    pub run_deadline: Option<Duration>,
    pub request_timeout: Duration,
}

impl fmt::Debug for TetherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TetherConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .field("run_deadline", &self.run_deadline)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TetherConfig {
    /// Defaults only, no API key.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: None,
            run_deadline: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self, TetherError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TetherError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            config.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            config.base_url = url;
        }
        if let Some(model) = lookup("TETHER_MODEL") {
            config.model = model;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "TETHER_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        config.max_polls = parse_var::<u32>(&lookup, "TETHER_MAX_POLLS")?;
        config.run_deadline =
            parse_var::<u64>(&lookup, "TETHER_RUN_DEADLINE_SECS")?.map(Duration::from_secs);
        if let Some(secs) = parse_var::<u64>(&lookup, "TETHER_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: Option<u32>) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// The API key, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, TetherError> {
        self.api_key()
            .ok_or_else(|| TetherError::Configuration("Missing OPENAI_API_KEY".into()))
    }

    /// Poll pacing and bounds for [`crate::agent_loop::RunPoller`].
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: self.poll_interval,
            max_polls: self.max_polls,
            deadline: self.run_deadline,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, TetherError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            TetherError::Configuration(format!("{key}={raw:?} is not valid: {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = TetherConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.api_key(), None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.max_polls, None);
        assert_eq!(config.run_deadline, None);
    }

    #[test]
    fn env_values_override_defaults() {
        let config = TetherConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1"),
            ("TETHER_MODEL", "gpt-4o"),
            ("TETHER_POLL_INTERVAL_MS", "250"),
            ("TETHER_MAX_POLLS", "40"),
            ("TETHER_RUN_DEADLINE_SECS", "90"),
        ]))
        .unwrap();

        assert_eq!(config.api_key(), Some("sk-test"));
        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_polls, Some(40));
        assert_eq!(config.run_deadline, Some(Duration::from_secs(90)));
    }

    #[test]
    fn malformed_number_is_a_configuration_error() {
        let err = TetherConfig::from_lookup(lookup(&[("TETHER_MAX_POLLS", "lots")])).unwrap_err();

        assert!(matches!(err, TetherError::Configuration(ref msg) if msg.contains("TETHER_MAX_POLLS")));
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let config = TetherConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap();

        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = TetherConfig::new().with_api_key("sk-secret");
        let debug = format!("{config:?}");

        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn poll_settings_mirror_config() {
        let config = TetherConfig::new()
            .with_poll_interval(Duration::from_millis(5))
            .with_max_polls(Some(3));
        let settings = config.poll_settings();

        assert_eq!(settings.interval, Duration::from_millis(5));
        assert_eq!(settings.max_polls, Some(3));
        assert_eq!(settings.deadline, None);
    }
}
