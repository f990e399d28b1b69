//! HTTP passthrough to the directory API for hosts that cannot reach it
//! directly. Only the three directory query families are forwarded.

use crate::core::directory::{is_relayable, DEFAULT_DIRECTORY_BASE_URL, DEFAULT_TIMEOUT_SECONDS};
use crate::utils::error::Result;
use axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8888";

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
];

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub bind_addr: String,
    pub upstream_base_url: String,
    pub timeout: Duration,
}

impl RelaySettings {
    /// `PEPPOL_RELAY_BIND` and `PEPPOL_UPSTREAM_URL` override the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("PEPPOL_RELAY_BIND").unwrap_or(defaults.bind_addr),
            upstream_base_url: std::env::var("PEPPOL_UPSTREAM_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.upstream_base_url),
            timeout: defaults.timeout,
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            upstream_base_url: DEFAULT_DIRECTORY_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

/// Shared by every request handler.
#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
    upstream_base_url: String,
}

impl RelayState {
    pub fn new(settings: &RelaySettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("peppol-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            upstream_base_url: settings.upstream_base_url.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    endpoint: Option<String>,
}

pub fn build_router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(relay).options(preflight))
        .with_state(state)
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, CORS_HEADERS)
}

async fn relay(State(state): State<RelayState>, Query(query): Query<RelayQuery>) -> Response {
    let endpoint = query.endpoint.unwrap_or_default();
    if !is_relayable(&endpoint) {
        tracing::warn!("Rejected relay request for '{}'", endpoint);
        return (
            StatusCode::BAD_REQUEST,
            CORS_HEADERS,
            Json(serde_json::json!({ "error": "Invalid or missing endpoint parameter." })),
        )
            .into_response();
    }

    let target = format!("{}{}", state.upstream_base_url, endpoint);
    tracing::info!("Relaying GET {}", target);

    let upstream = match state.client.get(&target).send().await {
        Ok(response) => response,
        Err(e) => return upstream_failed(&e),
    };

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    match upstream.bytes().await {
        Ok(body) => {
            tracing::debug!("Upstream answered {} for {}", status, endpoint);
            (
                status,
                CORS_HEADERS,
                [(header::CONTENT_TYPE, content_type)],
                body,
            )
                .into_response()
        }
        Err(e) => upstream_failed(&e),
    }
}

fn upstream_failed(error: &reqwest::Error) -> Response {
    tracing::error!("Upstream request failed: {}", error);
    (
        StatusCode::BAD_GATEWAY,
        CORS_HEADERS,
        Json(serde_json::json!({
            "error": "Upstream request failed",
            "details": error.to_string(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use httpmock::prelude::*;
    use tower::util::ServiceExt;

    fn app(upstream_base_url: String) -> Router {
        let settings = RelaySettings {
            upstream_base_url,
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        build_router(RelayState::new(&settings).unwrap())
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_preflight_returns_cors_headers() {
        let response = app("http://127.0.0.1:1".to_string())
            .oneshot(request("OPTIONS", "/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET, OPTIONS");
        assert_eq!(
            headers["access-control-allow-headers"],
            "Content-Type, Authorization"
        );
    }

    #[tokio::test]
    async fn test_missing_or_disallowed_endpoint_is_rejected() {
        for uri in ["/", "/?endpoint=", "/?endpoint=%2Fadmin%2Fusers"] {
            let response = app("http://127.0.0.1:1".to_string())
                .oneshot(request("GET", uri))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await["error"],
                "Invalid or missing endpoint parameter."
            );
        }
    }

    #[tokio::test]
    async fn test_forwards_status_and_content_type() {
        let upstream = MockServer::start();
        let mock = upstream.mock(|when, then| {
            when.method(GET)
                .path_contains("/businesscard/digitprod/iso6523-actorid-upis");
            then.status(404)
                .header("Content-Type", "application/problem+json")
                .body(r#"{"status":404}"#);
        });

        let response = app(upstream.base_url())
            .oneshot(request(
                "GET",
                "/?endpoint=%2Fbusinesscard%2Fdigitprod%2Fiso6523-actorid-upis%253A%253A0208%253A0123456749",
            ))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["content-type"],
            "application/problem+json"
        );
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(body_json(response).await["status"], 404);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let response = app("http://127.0.0.1:1".to_string())
            .oneshot(request(
                "GET",
                "/?endpoint=%2Fppidexistence%2Fdigitprod%2Fx",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Upstream request failed");
        assert!(body["details"].is_string());
    }
}
