use std::path::Path;

use crate::{Config, ThrottleConfig};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// expanded, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::from_toml(&raw)?;

        tracing::debug!(config_path = %path.display(), "configuration loaded");

        Ok(config)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_api()?;
        self.validate_retry()?;
        self.validate_throttle()?;
        Ok(())
    }

    fn validate_api(&self) -> anyhow::Result<()> {
        if self.api.base_url.is_some() && self.api.has_url_parts() {
            anyhow::bail!("api.base_url cannot be combined with api.protocol, api.host, api.port or api.path");
        }

        if let Some(ref path) = self.api.path
            && !path.is_empty()
            && !path.starts_with('/')
        {
            anyhow::bail!("api.path must start with '/': {path}");
        }

        if let Some(ref protocol) = self.api.protocol
            && protocol.contains("://")
        {
            anyhow::bail!("api.protocol must be a bare scheme such as \"https\": {protocol}");
        }

        Ok(())
    }

    fn validate_retry(&self) -> anyhow::Result<()> {
        let Some(ref retry) = self.retry else {
            return Ok(());
        };

        if retry.max_tries == 0 {
            anyhow::bail!("retry.max_tries must be at least 1");
        }

        if !retry.backoff_factor.is_finite() || retry.backoff_factor < 1.0 {
            anyhow::bail!("retry.backoff_factor must be a finite number >= 1.0");
        }

        Ok(())
    }

    fn validate_throttle(&self) -> anyhow::Result<()> {
        match self.throttle {
            ThrottleConfig::None => Ok(()),
            ThrottleConfig::MaxConcurrency { limit } if limit == 0 => {
                anyhow::bail!("throttle.limit must be greater than 0")
            }
            ThrottleConfig::Rate { requests, .. } if requests == 0 => {
                anyhow::bail!("throttle.requests must be greater than 0")
            }
            ThrottleConfig::Rate { window, .. } if window.is_zero() => {
                anyhow::bail!("throttle.window must be greater than 0")
            }
            ThrottleConfig::MaxConcurrency { .. } | ThrottleConfig::Rate { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use secrecy::ExposeSecret;

    use crate::{Config, LogFormat, ThrottleConfig};

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("").unwrap();

        assert!(config.api.base_url.is_none());
        assert!(config.retry.is_none());
        assert!(matches!(config.throttle, ThrottleConfig::None));
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn full_file_round_trips_every_section() {
        let raw = r#"
            [api]
            host = "localhost"
            port = 8080
            protocol = "http"
            api_key = "sk-test"

            [api.headers]
            x-client = "prism-tests"

            [retry]
            max_tries = 5
            initial_delay = "250ms"
            backoff_factor = 3.0
            max_delay = "10s"
            jitter = false

            [throttle]
            type = "rate"
            requests = 10
            window = "1s"

            [log]
            filter = "prism_stability=debug"
            format = "json"
        "#;

        let config = Config::from_toml(raw).unwrap();

        assert_eq!(config.api.host.as_deref(), Some("localhost"));
        assert_eq!(config.api.port, Some(8080));
        assert_eq!(config.api.api_key.as_ref().unwrap().expose_secret(), "sk-test");
        assert_eq!(config.api.headers.get("x-client").map(String::as_str), Some("prism-tests"));

        let retry = config.retry.unwrap();
        assert_eq!(retry.max_tries, 5);
        assert_eq!(retry.initial_delay, Duration::from_millis(250));
        assert_eq!(retry.max_delay, Some(Duration::from_secs(10)));
        assert!(!retry.jitter);

        assert!(matches!(
            config.throttle,
            ThrottleConfig::Rate { requests: 10, window } if window == Duration::from_secs(1)
        ));
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn retry_section_fills_defaults() {
        let config = Config::from_toml("[retry]\nmax_tries = 2").unwrap();
        let retry = config.retry.unwrap();

        assert_eq!(retry.max_tries, 2);
        assert_eq!(retry.initial_delay, Duration::from_secs(2));
        assert!((retry.backoff_factor - 2.0).abs() < f64::EPSILON);
        assert!(retry.jitter);
    }

    #[test]
    fn base_url_and_parts_are_exclusive() {
        let raw = "[api]\nbase_url = \"https://example.com/v1\"\nhost = \"other.example.com\"";
        let err = Config::from_toml(raw).unwrap_err();
        assert!(err.to_string().contains("api.base_url cannot be combined"));
    }

    #[test]
    fn relative_path_is_rejected() {
        let err = Config::from_toml("[api]\npath = \"v1\"").unwrap_err();
        assert!(err.to_string().contains("api.path must start with '/'"));
    }

    #[test]
    fn zero_tries_is_rejected() {
        let err = Config::from_toml("[retry]\nmax_tries = 0").unwrap_err();
        assert!(err.to_string().contains("retry.max_tries"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = Config::from_toml("[throttle]\ntype = \"max_concurrency\"\nlimit = 0").unwrap_err();
        assert!(err.to_string().contains("throttle.limit"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::from_toml("[api]\nhostname = \"example.com\"").unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn load_expands_environment_placeholders() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\napi_key = \"{{{{ env.PRISM_LOADER_KEY }}}}\"").unwrap();

        temp_env::with_var("PRISM_LOADER_KEY", Some("sk-from-env"), || {
            let config = Config::load(file.path()).unwrap();
            assert_eq!(config.api.api_key.unwrap().expose_secret(), "sk-from-env");
        });
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(std::path::Path::new("/nonexistent/prism.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
