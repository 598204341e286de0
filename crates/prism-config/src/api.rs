use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Connection settings for the upstream image generation API
///
/// Every field is optional; unset fields fall back to the provider's
/// defaults. `base_url` replaces the whole URL, while the individual
/// parts (`protocol`, `host`, `port`, `path`) replace only themselves.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Full base URL override (e.g. `https://api.stability.ai/v1`)
    #[serde(default)]
    pub base_url: Option<Url>,
    /// URL scheme override
    #[serde(default)]
    pub protocol: Option<String>,
    /// Host override
    #[serde(default)]
    pub host: Option<String>,
    /// Port override
    #[serde(default)]
    pub port: Option<u16>,
    /// Path prefix override (must start with `/`)
    #[serde(default)]
    pub path: Option<String>,
    /// API key; falls back to the environment when unset
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Environment variable consulted when `api_key` is unset
    #[serde(default)]
    pub environment_variable_name: Option<String>,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

impl ApiConfig {
    /// Whether any individual URL part is overridden
    pub fn has_url_parts(&self) -> bool {
        self.protocol.is_some() || self.host.is_some() || self.port.is_some() || self.path.is_some()
    }
}
