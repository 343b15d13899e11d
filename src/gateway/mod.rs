//! Typed HTTP gateway to the CV-tailoring backend.
//!
//! ## Overview
//!
//! [`ApiGateway`] is the single place where requests leave the process. It
//! owns the `reqwest` client and base URL, attaches the bearer token from the
//! shared [`TokenStore`], and normalizes every response into the crate's
//! [`ApiError`] union:
//!
//! - success bodies are decoded against the `cvtailor-contract` schemas and
//!   an unexpected shape fails closed as `Http`
//! - non-success bodies are mined for the backend's `{"detail": "..."}`
//!   payload, falling back to the status line
//! - a 401 from any endpoint clears the token store and broadcasts a
//!   [`SessionInvalidated`] event before the error is returned, so session
//!   state can never outlive a revoked credential
//!
//! The typed endpoint methods (one per backend route) live in `endpoints`.

mod endpoints;

pub use endpoints::DownloadedFile;

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use crate::contract::ErrorBody;
use crate::errors::{ApiError, ApiResult};
use crate::token::TokenStore;

/// Broadcast payload emitted when the backend rejects the credential.
#[derive(Debug, Clone)]
pub struct SessionInvalidated {
    pub message: String,
}

/// HTTP executor shared by the session and pipeline layers.
pub struct ApiGateway {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
    invalidations: broadcast::Sender<SessionInvalidated>,
}

impl ApiGateway {
    pub fn new(base_url: Url, http: reqwest::Client, tokens: Arc<dyn TokenStore>) -> Self {
        let (invalidations, _) = broadcast::channel(16);
        Self {
            http,
            base_url,
            tokens,
            invalidations,
        }
    }

    /// Builds a gateway with its own HTTP client and request timeout.
    pub fn from_url(
        base_url: &str,
        timeout: Duration,
        tokens: Arc<dyn TokenStore>,
    ) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::validation(format!("invalid API URL '{base_url}': {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("cvtailor/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("could not initialize HTTP client: {e}")))?;
        Ok(Self::new(base_url, http, tokens))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Receiver for credential-invalidation events. Every 401 produces one
    /// event, regardless of which endpoint hit it.
    pub fn subscribe_invalidations(&self) -> broadcast::Receiver<SessionInvalidated> {
        self.invalidations.subscribe()
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::validation(format!("invalid endpoint path '{path}': {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.http.get(self.endpoint(path)?);
        self.send_json(path, request).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let request = self.http.post(self.endpoint(path)?).json(body);
        self.send_json(path, request).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> ApiResult<T> {
        let response = self.execute(path, request).await?;
        self.decode(response).await
    }

    /// Sends one request. The bearer header is applied here, after any
    /// caller-supplied parts, so an endpoint can never unset it.
    async fn execute(&self, path: &str, request: RequestBuilder) -> ApiResult<Response> {
        let request = match self.tokens.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let started = Instant::now();
        let response = request.send().await.map_err(ApiError::from_transport)?;
        tracing::debug!(
            path,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );
        self.check_status(response).await
    }

    /// Resolves non-success statuses into typed errors. 401 triggers the
    /// global invalidation before returning.
    async fn check_status(&self, response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.detail,
            Err(_) => format!("request failed with status {status}"),
        };

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.clear();
            let _ = self.invalidations.send(SessionInvalidated {
                message: message.clone(),
            });
            return Err(ApiError::Auth(message));
        }

        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> ApiResult<T> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
        serde_json::from_slice(&bytes).map_err(|err| {
            tracing::warn!(status, error = %err, "response body did not match contract");
            ApiError::Http {
                status,
                message: "unexpected response shape".to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenStore;

    fn gateway() -> ApiGateway {
        ApiGateway::from_url(
            "http://localhost:8000",
            Duration::from_secs(5),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn from_url_rejects_malformed_url() {
        let err = ApiGateway::from_url(
            "not a url",
            Duration::from_secs(5),
            Arc::new(MemoryTokenStore::new()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn endpoint_joins_against_base_url() {
        let gw = gateway();
        let url = gw.endpoint("/cv/upload/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/cv/upload/");
    }

    #[tokio::test]
    async fn subscribers_receive_invalidation_events() {
        let gw = gateway();
        let mut rx = gw.subscribe_invalidations();
        gw.invalidations
            .send(SessionInvalidated {
                message: "token expired".to_string(),
            })
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.message, "token expired");
    }
}
