//! HTTP client for a remote decision service.
//!
//! # Endpoints
//! - `POST {base}/v1/bot/classify` → [`BotClassification`]
//! - `POST {base}/v1/shield/inspect` → [`ShieldReport`]
//!
//! Any non-2xx status or undecodable body is a provider fault.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::{
    BotClassification, BotDecisionProvider, ProviderError, ShieldDecisionProvider, ShieldReport,
};

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    fingerprint: &'a str,
    headers: BTreeMap<&'a str, String>,
}

#[derive(Serialize)]
struct InspectRequest<'a> {
    fingerprint: &'a str,
    method: &'a str,
    url: &'a str,
    headers: BTreeMap<&'a str, String>,
}

/// Client for the remote bot/shield decision service.
#[derive(Debug, Clone)]
pub struct RemoteDecisionClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl RemoteDecisionClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ProviderError::Unavailable(format!("invalid base url: {}", e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

fn header_map(headers: &HeaderMap) -> BTreeMap<&str, String> {
    headers
        .iter()
        .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect()
}

#[async_trait]
impl BotDecisionProvider for RemoteDecisionClient {
    async fn classify(
        &self,
        fingerprint: &str,
        headers: &HeaderMap,
    ) -> Result<BotClassification, ProviderError> {
        let body = ClassifyRequest {
            fingerprint,
            headers: header_map(headers),
        };
        self.post("v1/bot/classify", &body).await
    }
}

#[async_trait]
impl ShieldDecisionProvider for RemoteDecisionClient {
    async fn inspect(
        &self,
        fingerprint: &str,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<ShieldReport, ProviderError> {
        let body = InspectRequest {
            fingerprint,
            method: method.as_str(),
            url,
            headers: header_map(headers),
        };
        self.post("v1/shield/inspect", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_classify_round_trip() {
        let router = Router::new().route(
            "/decide/v1/bot/classify",
            post(|headers: axum::http::HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers.get("authorization").unwrap(), "Bearer k1");
                assert_eq!(body["fingerprint"], "10.0.0.1");
                let ua = body["headers"]["user-agent"].as_str().unwrap_or_default();
                Json(json!({
                    "isBot": ua.contains("Scrapy"),
                    "category": "CATEGORY:SCRAPER",
                    "isAllowedCategory": false,
                }))
            }),
        );
        let addr = serve(router).await;

        let client = RemoteDecisionClient::new(
            &format!("http://{}/decide", addr),
            Some("k1".into()),
            Duration::from_secs(2),
        )
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("Scrapy/2.11"));
        let result = client.classify("10.0.0.1", &headers).await.unwrap();
        assert!(result.is_bot);
        assert_eq!(result.category, "CATEGORY:SCRAPER");
        assert!(!result.is_allowed_category);
    }

    #[tokio::test]
    async fn test_inspect_forwards_request_line() {
        let router = Router::new().route(
            "/v1/shield/inspect",
            post(|Json(body): Json<Value>| async move {
                let url = body["url"].as_str().unwrap_or_default();
                Json(json!({ "isAttack": body["method"] == "GET" && url.contains("UNION") }))
            }),
        );
        let addr = serve(router).await;

        let client =
            RemoteDecisionClient::new(&format!("http://{}", addr), None, Duration::from_secs(2))
                .unwrap();
        let report = client
            .inspect("10.0.0.1", &Method::GET, "/subjects?q=1 UNION SELECT", &HeaderMap::new())
            .await
            .unwrap();
        assert!(report.is_attack);
    }

    #[tokio::test]
    async fn test_error_status_is_a_fault() {
        let router = Router::new().route(
            "/v1/bot/classify",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let addr = serve(router).await;

        let client =
            RemoteDecisionClient::new(&format!("http://{}", addr), None, Duration::from_secs(2))
                .unwrap();
        let err = client.classify("x", &HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status(503)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_fault() {
        let router = Router::new().route("/v1/bot/classify", post(|| async { "not json" }));
        let addr = serve(router).await;

        let client =
            RemoteDecisionClient::new(&format!("http://{}", addr), None, Duration::from_secs(2))
                .unwrap();
        let err = client.classify("x", &HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = RemoteDecisionClient::new("::nope::", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
