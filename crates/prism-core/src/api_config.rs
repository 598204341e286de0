use std::sync::Arc;

use http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{ACCEPT, AUTHORIZATION},
};
use prism_config::{ApiConfig, RetryConfig};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::{
    retry::{ExponentialBackoff, RetryPolicy},
    throttle::{ThrottlePolicy, Unthrottled},
};

/// Errors raised while resolving an [`ApiConfiguration`]
#[derive(Debug, thiserror::Error)]
pub enum ApiConfigError {
    /// No API key was passed and the environment variable is unset
    #[error(
        "{description} API key is missing. Pass it using the `api_key` option or set it as an environment variable named {variable}."
    )]
    MissingCredential {
        /// Environment variable that was consulted
        variable: String,
        /// Human-readable provider name
        description: String,
    },

    /// The assembled base URL is not a valid absolute URL
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// Offending URL text
        url: String,
        /// Parser message
        reason: String,
    },

    /// An endpoint path segment would leave its place in the path
    #[error("invalid path segment '{segment}': {reason}")]
    InvalidPathSegment {
        /// Segment as supplied
        segment: String,
        /// Why it was refused
        reason: String,
    },

    /// A header name or value could not be encoded
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as supplied
        name: String,
        /// Encoding error
        reason: String,
    },
}

/// Provider defaults the resolver falls back to
#[derive(Debug, Clone, Copy)]
pub struct ApiDefaults {
    /// URL scheme (e.g. "https")
    pub protocol: &'static str,
    /// Production host
    pub host: &'static str,
    /// Production port
    pub port: u16,
    /// Path prefix, starting with `/`
    pub path: &'static str,
    /// Environment variable holding the API key
    pub environment_variable_name: &'static str,
    /// Provider name used in error messages
    pub description: &'static str,
}

/// Individually overridable base URL parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseUrlParts {
    /// Scheme override
    pub protocol: Option<String>,
    /// Host override
    pub host: Option<String>,
    /// Port override
    pub port: Option<u16>,
    /// Path override
    pub path: Option<String>,
}

/// How the caller overrides the base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUrlOverride {
    /// Complete URL replacing every default part
    Url(String),
    /// Selected parts; the rest keep their defaults
    Parts(BaseUrlParts),
}

/// Inputs accepted by [`ApiConfiguration::resolve`]
#[derive(Debug, Clone, Default)]
pub struct ApiConfigurationOptions {
    /// Base URL override
    pub base_url: Option<BaseUrlOverride>,
    /// Explicit API key; takes precedence over the environment
    pub api_key: Option<SecretString>,
    /// Environment variable to read instead of the provider default
    pub environment_variable_name: Option<String>,
    /// Extra headers, applied on top of the derived auth header
    pub headers: Vec<(String, String)>,
    /// Retry policy; exponential backoff when unset
    pub retry: Option<Arc<dyn RetryPolicy>>,
    /// Throttle policy; unthrottled when unset
    pub throttle: Option<Arc<dyn ThrottlePolicy>>,
}

impl ApiConfigurationOptions {
    /// Empty options: every value comes from the provider defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from the `[api]` and `[retry]` config sections
    ///
    /// The throttle policy is left unset; it is built by the throttle
    /// crate and attached with [`Self::with_throttle`].
    pub fn from_config(api: &ApiConfig, retry: Option<&RetryConfig>) -> Self {
        let base_url = if let Some(ref url) = api.base_url {
            Some(BaseUrlOverride::Url(url.to_string()))
        } else if api.has_url_parts() {
            Some(BaseUrlOverride::Parts(BaseUrlParts {
                protocol: api.protocol.clone(),
                host: api.host.clone(),
                port: api.port,
                path: api.path.clone(),
            }))
        } else {
            None
        };

        Self {
            base_url,
            api_key: api.api_key.clone(),
            environment_variable_name: api.environment_variable_name.clone(),
            headers: api.headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            retry: retry.map(|config| Arc::new(ExponentialBackoff::from(config)) as Arc<dyn RetryPolicy>),
            throttle: None,
        }
    }

    /// Replace the whole base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(BaseUrlOverride::Url(url.into()));
        self
    }

    /// Override the scheme only
    #[must_use]
    pub fn with_protocol(self, protocol: impl Into<String>) -> Self {
        self.update_parts(|parts| parts.protocol = Some(protocol.into()))
    }

    /// Override the host only
    #[must_use]
    pub fn with_host(self, host: impl Into<String>) -> Self {
        self.update_parts(|parts| parts.host = Some(host.into()))
    }

    /// Override the port only
    #[must_use]
    pub fn with_port(self, port: u16) -> Self {
        self.update_parts(|parts| parts.port = Some(port))
    }

    /// Override the path prefix only
    #[must_use]
    pub fn with_path(self, path: impl Into<String>) -> Self {
        self.update_parts(|parts| parts.path = Some(path.into()))
    }

    /// Use an explicit API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    /// Read the key from a different environment variable
    #[must_use]
    pub fn with_environment_variable_name(mut self, name: impl Into<String>) -> Self {
        self.environment_variable_name = Some(name.into());
        self
    }

    /// Add a header sent with every request
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Use a custom retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Use a custom throttle policy
    #[must_use]
    pub fn with_throttle(mut self, throttle: Arc<dyn ThrottlePolicy>) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// A part override discards any earlier full-URL override
    fn update_parts(mut self, update: impl FnOnce(&mut BaseUrlParts)) -> Self {
        let mut parts = match self.base_url.take() {
            Some(BaseUrlOverride::Parts(parts)) => parts,
            _ => BaseUrlParts::default(),
        };
        update(&mut parts);
        self.base_url = Some(BaseUrlOverride::Parts(parts));
        self
    }
}

/// Options for [`load_api_key`]
#[derive(Debug, Clone)]
pub struct LoadApiKeyOptions<'a> {
    /// Explicit key; wins over the environment
    pub api_key: Option<SecretString>,
    /// Variable consulted when no key is passed
    pub environment_variable_name: &'a str,
    /// Provider name for the error message
    pub description: &'a str,
}

/// Resolve an API key from an explicit value or the environment
///
/// # Errors
///
/// Returns [`ApiConfigError::MissingCredential`] when no key was passed and
/// the variable is unset or blank
pub fn load_api_key(options: LoadApiKeyOptions<'_>) -> Result<SecretString, ApiConfigError> {
    if let Some(api_key) = options.api_key {
        return Ok(api_key);
    }

    match std::env::var(options.environment_variable_name) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
        _ => Err(ApiConfigError::MissingCredential {
            variable: options.environment_variable_name.to_owned(),
            description: options.description.to_owned(),
        }),
    }
}

/// Resolved connection settings shared by every call to one provider
///
/// Immutable once built and cheap to clone; safe to reuse across
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct ApiConfiguration {
    base_url: Url,
    headers: HeaderMap,
    retry: Arc<dyn RetryPolicy>,
    throttle: Arc<dyn ThrottlePolicy>,
}

impl ApiConfiguration {
    /// Resolve options against provider defaults
    ///
    /// The auth header is derived once here. When the supplied headers
    /// already carry `Authorization`, no key is loaded.
    ///
    /// # Errors
    ///
    /// Fails on a missing credential, an invalid base URL or an invalid
    /// header
    pub fn resolve(defaults: &ApiDefaults, options: ApiConfigurationOptions) -> Result<Self, ApiConfigError> {
        let base_url = resolve_base_url(defaults, options.base_url.as_ref())?;

        let mut extra = HeaderMap::new();
        for (name, value) in &options.headers {
            let header_name = HeaderName::try_from(name.as_str()).map_err(|e| ApiConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            let header_value = HeaderValue::try_from(value.as_str()).map_err(|e| ApiConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            extra.insert(header_name, header_value);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if !extra.contains_key(AUTHORIZATION) {
            let api_key = load_api_key(LoadApiKeyOptions {
                api_key: options.api_key,
                environment_variable_name: options
                    .environment_variable_name
                    .as_deref()
                    .unwrap_or(defaults.environment_variable_name),
                description: defaults.description,
            })?;
            headers.insert(AUTHORIZATION, bearer(&api_key)?);
        }

        headers.extend(extra);

        tracing::debug!(base_url = %base_url, provider = defaults.description, "api configuration resolved");

        Ok(Self {
            base_url,
            headers,
            retry: options.retry.unwrap_or_else(|| Arc::new(ExponentialBackoff::new())),
            throttle: options.throttle.unwrap_or_else(|| Arc::new(Unthrottled)),
        })
    }

    /// Base URL every endpoint path is appended to
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Headers sent with every request, including auth
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Retry policy for calls made with this configuration
    pub fn retry(&self) -> &dyn RetryPolicy {
        self.retry.as_ref()
    }

    /// Throttle policy for calls made with this configuration
    pub fn throttle(&self) -> &dyn ThrottlePolicy {
        self.throttle.as_ref()
    }

    /// Append endpoint path segments to the base URL
    ///
    /// Each segment is percent-encoded on its own, so `/`, `?` and `#`
    /// inside a segment stay part of it.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty, `.` or `..` segment
    pub fn assemble_url_segments<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, ApiConfigError> {
        let mut url = self.base_url.clone();
        let invalid_base = || ApiConfigError::InvalidBaseUrl {
            url: self.base_url.to_string(),
            reason: "URL cannot carry path segments".to_owned(),
        };

        {
            let mut path = url.path_segments_mut().map_err(|()| invalid_base())?;
            path.pop_if_empty();

            for segment in segments {
                if matches!(segment, "" | "." | "..") {
                    return Err(ApiConfigError::InvalidPathSegment {
                        segment: segment.to_owned(),
                        reason: "empty and dot segments are not allowed".to_owned(),
                    });
                }
                path.push(segment);
            }
        }

        Ok(url)
    }
}

fn resolve_base_url(defaults: &ApiDefaults, base_url: Option<&BaseUrlOverride>) -> Result<Url, ApiConfigError> {
    let text = match base_url {
        Some(BaseUrlOverride::Url(url)) => url.clone(),
        Some(BaseUrlOverride::Parts(parts)) => format!(
            "{}://{}:{}{}",
            parts.protocol.as_deref().unwrap_or(defaults.protocol),
            parts.host.as_deref().unwrap_or(defaults.host),
            parts.port.unwrap_or(defaults.port),
            parts.path.as_deref().unwrap_or(defaults.path),
        ),
        None => format!(
            "{}://{}:{}{}",
            defaults.protocol, defaults.host, defaults.port, defaults.path
        ),
    };

    let url = Url::parse(&text).map_err(|e| ApiConfigError::InvalidBaseUrl {
        url: text.clone(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ApiConfigError::InvalidBaseUrl {
            url: text,
            reason: "URL must be absolute with a host".to_owned(),
        });
    }

    Ok(url)
}

fn bearer(api_key: &SecretString) -> Result<HeaderValue, ApiConfigError> {
    let mut value = HeaderValue::try_from(format!("Bearer {}", api_key.expose_secret())).map_err(|_| {
        ApiConfigError::InvalidHeader {
            name: AUTHORIZATION.to_string(),
            reason: "API key contains characters not allowed in a header".to_owned(),
        }
    })?;
    value.set_sensitive(true);
    Ok(value)
}
