use std::time::Duration;

use prism_core::{ApiConfigError, ApiConfiguration, ApiDefaults};
use reqwest::{Response, header::RETRY_AFTER};
use url::Url;

use crate::{
    error::{ApiCallFailure, Result, StabilityError},
    http_client::http_client,
    types::StabilityImageGenerationResponse,
};

/// Stable provider id
pub const PROVIDER: &str = "stability";

/// Production endpoint and credential lookup for the Stability API
pub const STABILITY_DEFAULTS: ApiDefaults = ApiDefaults {
    protocol: "https",
    host: "api.stability.ai",
    port: 443,
    path: "/v1",
    environment_variable_name: "STABILITY_API_KEY",
    description: "Stability",
};

/// Text-to-image endpoint for `engine` under the configured base URL
///
/// The engine id is encoded as a single path segment.
///
/// # Errors
///
/// Returns an error for an empty, `.` or `..` engine id
pub fn text_to_image_url(config: &ApiConfiguration, engine: &str) -> std::result::Result<Url, ApiConfigError> {
    config.assemble_url_segments(["generation", engine, "text-to-image"])
}

/// Send one text-to-image request and classify the outcome
///
/// This is a single attempt; retries and throttling wrap it.
pub(crate) async fn post_text_to_image(
    config: &ApiConfiguration,
    url: &Url,
    body: &serde_json::Value,
) -> Result<StabilityImageGenerationResponse> {
    let response = http_client()
        .post(url.clone())
        .headers(config.headers().clone())
        .json(body)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(provider = PROVIDER, url = %url, error = %e, "text-to-image request failed");
            StabilityError::Transport {
                url: url.to_string(),
                source: e,
            }
        })?;

    let status = response.status();

    if !status.is_success() {
        let retry_after = parse_retry_after(&response);
        let failure = http_failure(status.as_u16(), url, body, response.text().await, retry_after);

        tracing::warn!(
            provider = PROVIDER,
            status = %status,
            url = %url,
            message = %failure.message,
            "Stability API error"
        );

        return Err(StabilityError::Http(Box::new(failure)));
    }

    let text = read_body(response, url).await?;

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(provider = PROVIDER, url = %url, error = %e, "failed to parse Stability response");
        StabilityError::ResponseParse {
            url: url.to_string(),
            reason: e.to_string(),
            body: text,
        }
    })
}

async fn read_body(response: Response, url: &Url) -> Result<String> {
    response.text().await.map_err(|e| StabilityError::Transport {
        url: url.to_string(),
        source: e,
    })
}

/// Classify a non-2xx response
///
/// A body that cannot be read counts as empty so the status still decides
/// whether the call is retried.
fn http_failure(
    status_code: u16,
    url: &Url,
    request_body: &serde_json::Value,
    text: reqwest::Result<String>,
    retry_after: Option<Duration>,
) -> ApiCallFailure {
    let text = text.unwrap_or_else(|e| {
        tracing::warn!(provider = PROVIDER, status = status_code, url = %url, error = %e, "failed to read error body");
        String::new()
    });

    ApiCallFailure::from_response(status_code, url.as_str(), request_body.clone(), &text, retry_after)
}

/// `Retry-After` in delta-seconds form; HTTP dates are ignored
fn parse_retry_after(response: &Response) -> Option<Duration> {
    let value = response.headers().get(RETRY_AFTER)?.to_str().ok()?;
    let seconds: f64 = value.trim().parse().ok()?;

    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use prism_core::{ApiConfigurationOptions, RetryableError};
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    use super::*;

    fn config(server: &MockServer) -> ApiConfiguration {
        ApiConfiguration::resolve(
            &STABILITY_DEFAULTS,
            ApiConfigurationOptions::new()
                .with_base_url(format!("{}/v1", server.uri()))
                .with_api_key("sk-test"),
        )
        .unwrap()
    }

    fn endpoint(config: &ApiConfiguration) -> Url {
        text_to_image_url(config, "stable-diffusion-v1-5").unwrap()
    }

    #[test]
    fn defaults_point_at_production() {
        let config = ApiConfiguration::resolve(&STABILITY_DEFAULTS, ApiConfigurationOptions::new().with_api_key("k"))
            .unwrap();

        assert_eq!(
            text_to_image_url(&config, "stable-diffusion-v1-5").unwrap().as_str(),
            "https://api.stability.ai/v1/generation/stable-diffusion-v1-5/text-to-image"
        );
    }

    #[test]
    fn engine_id_stays_inside_its_path_segment() {
        let config = ApiConfiguration::resolve(&STABILITY_DEFAULTS, ApiConfigurationOptions::new().with_api_key("k"))
            .unwrap();

        let url = text_to_image_url(&config, "a/b?c").unwrap();
        assert_eq!(url.as_str(), "https://api.stability.ai/v1/generation/a%2Fb%3Fc/text-to-image");

        let url = text_to_image_url(&config, "my-model?x=1#frag").unwrap();
        assert_eq!(url.path(), "/v1/generation/my-model%3Fx=1%23frag/text-to-image");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = text_to_image_url(&config, "../../v2/user").unwrap();
        assert!(url.path().starts_with("/v1/generation/"));

        assert!(matches!(
            text_to_image_url(&config, ".."),
            Err(ApiConfigError::InvalidPathSegment { .. })
        ));
    }

    #[tokio::test]
    async fn successful_response_is_parsed() {
        let server = MockServer::start().await;
        let body = json!({ "text_prompts": [{ "text": "a cat" }] });

        Mock::given(method("POST"))
            .and(path("/v1/generation/stable-diffusion-v1-5/text-to-image"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("accept", "application/json"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "artifacts": [{ "base64": "aGVsbG8=", "seed": 7, "finishReason": "SUCCESS" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = config(&server);
        let response = post_text_to_image(&config, &endpoint(&config), &body).await.unwrap();

        assert_eq!(response.artifacts.len(), 1);
        assert_eq!(response.artifacts[0].seed, 7);
    }

    #[tokio::test]
    async fn error_body_becomes_http_error() {
        let server = MockServer::start().await;
        let body = json!({ "text_prompts": [] });

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "id": "x", "name": "invalid_prompts", "message": "text_prompts cannot be empty"
            })))
            .mount(&server)
            .await;

        let config = config(&server);
        let err = post_text_to_image(&config, &endpoint(&config), &body).await.unwrap_err();

        let StabilityError::Http(failure) = err else {
            panic!("expected http error, got {err:?}");
        };
        assert_eq!(failure.status_code, 400);
        assert_eq!(failure.message, "text_prompts cannot be empty");
        assert_eq!(failure.request_body, body);
        assert!(failure.url.ends_with("/v1/generation/stable-diffusion-v1-5/text-to-image"));
    }

    #[tokio::test]
    async fn retry_after_header_is_captured() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "3")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let config = config(&server);
        let err = post_text_to_image(&config, &endpoint(&config), &json!({}))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "images": [] })))
            .mount(&server)
            .await;

        let config = config(&server);
        let err = post_text_to_image(&config, &endpoint(&config), &json!({}))
            .await
            .unwrap_err();

        match err {
            StabilityError::ResponseParse { body, .. } => assert_eq!(body, r#"{"images":[]}"#),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreadable_error_body_keeps_the_status() {
        let read_error = reqwest::Client::new()
            .get("http://127.0.0.1:9/")
            .send()
            .await
            .unwrap_err();
        let url = Url::parse("https://api.stability.ai/v1/generation/x/text-to-image").unwrap();

        let failure = http_failure(400, &url, &json!({}), Err(read_error), None);

        assert_eq!(failure.status_code, 400);
        assert!(failure.data.is_none());
        assert!(!StabilityError::Http(Box::new(failure)).is_retryable());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let config = ApiConfiguration::resolve(
            &STABILITY_DEFAULTS,
            ApiConfigurationOptions::new()
                .with_base_url("http://127.0.0.1:9/v1")
                .with_api_key("k"),
        )
        .unwrap();

        let err = post_text_to_image(&config, &endpoint(&config), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, StabilityError::Transport { .. }));
        assert!(err.is_retryable());
    }
}
