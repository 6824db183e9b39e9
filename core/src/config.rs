//! Client configuration.

use std::time::Duration;

/// Production endpoint root. Endpoint names are appended as `/<name>`.
pub const DEFAULT_BASE_URL: &str = "https://brickset.com/api/v3.asmx";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the client sends requests and how long the default transport waits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `BRICKSET_BASE_URL` and `BRICKSET_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    ///
    /// Unparseable timeouts fall back to the default.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(base_url) = lookup("BRICKSET_BASE_URL") {
            config = config.with_base_url(&base_url);
        }
        if let Some(secs) = lookup("BRICKSET_TIMEOUT_SECS").and_then(|s| s.trim().parse::<u64>().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL for an endpoint name such as `getSets`.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_brickset() {
        let config = ClientConfig::default();
        assert_eq!(
            config.endpoint_url("checkKey"),
            "https://brickset.com/api/v3.asmx/checkKey"
        );
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::default().with_base_url("http://localhost:3000/api/v3.asmx/");
        assert_eq!(
            config.endpoint_url("getThemes"),
            "http://localhost:3000/api/v3.asmx/getThemes"
        );
    }

    #[test]
    fn with_timeout_overrides_default() {
        let config = ClientConfig::default().with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn hand_built_config_with_trailing_slash_joins_cleanly() {
        let config = ClientConfig {
            base_url: "http://localhost:3000/api/v3.asmx/".to_string(),
            timeout: DEFAULT_TIMEOUT,
        };
        assert_eq!(
            config.endpoint_url("getThemes"),
            "http://localhost:3000/api/v3.asmx/getThemes"
        );
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn no_variables_gives_defaults() {
        assert_eq!(ClientConfig::from_vars(vars(&[])), ClientConfig::default());
    }

    #[test]
    fn variables_override_base_url_and_timeout() {
        let config = ClientConfig::from_vars(vars(&[
            ("BRICKSET_BASE_URL", "http://127.0.0.1:8080/api/v3.asmx/"),
            ("BRICKSET_TIMEOUT_SECS", "7"),
        ]));
        assert_eq!(config.base_url, "http://127.0.0.1:8080/api/v3.asmx");
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(
            config.endpoint_url("getSets"),
            "http://127.0.0.1:8080/api/v3.asmx/getSets"
        );
    }

    #[test]
    fn bad_timeout_falls_back_to_default() {
        for raw in ["soon", "-1", "1.5", ""] {
            let config = ClientConfig::from_vars(vars(&[("BRICKSET_TIMEOUT_SECS", raw)]));
            assert_eq!(config.timeout, DEFAULT_TIMEOUT, "{raw:?}");
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
        }
    }
}
