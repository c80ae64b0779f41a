//! Gateway client for the upstream data API
//!
//! One `ApiClient` serves the whole run. Every outbound call claims a slot
//! on the shared sliding-window limiter before it leaves, carries a bearer
//! token from the provider, and gets exactly one re-authentication attempt
//! when the API rejects that token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use decant_common::resilience::{SlidingWindowConfig, SlidingWindowLimiter};
use decant_common::{AccessToken, TokioClock};
use decant_core::ExtractionGateway;
use decant_domain::constants::{RATE_SAFETY_MARGIN_MS, RATE_WINDOW_MS};
use decant_domain::{
    ApiConfig, DateWindow, EntityId, ExtractionError, ResourceSpec, Result,
};
use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::errors::ApiError;
use super::provider::AccessTokenProvider;
use crate::http::HttpClient;

/// Authenticated, rate-limited client for the data API
pub struct ApiClient {
    base_url: String,
    http: HttpClient,
    tokens: Arc<dyn AccessTokenProvider>,
    limiter: SlidingWindowLimiter<TokioClock>,
}

impl ApiClient {
    /// Build a gateway from API settings and a token provider.
    ///
    /// The rate limiter lives inside the client: callers issue requests and
    /// the client paces them against the provider's global ceiling.
    ///
    /// # Errors
    /// Returns `ExtractionError::Config` if the rate limiter settings are
    /// unusable, `Transport` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, tokens: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_attempts(config.max_attempts as usize)
            .build()?;

        let limiter_config = SlidingWindowConfig::builder()
            .max_requests(config.rate_limit_per_sec)
            .window(Duration::from_millis(RATE_WINDOW_MS))
            .safety_margin(Duration::from_millis(RATE_SAFETY_MARGIN_MS))
            .build()
            .map_err(ExtractionError::Config)?;
        let limiter = SlidingWindowLimiter::with_clock(limiter_config, TokioClock)
            .map_err(ExtractionError::Config)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            tokens,
            limiter,
        })
    }

    /// Issue a rate-limited, bearer-authenticated GET for a JSON document.
    ///
    /// A 401 triggers exactly one re-authentication followed by one retried
    /// call. A second 401 means the freshly granted token was rejected too;
    /// that is fatal, there is nothing left to refresh with.
    ///
    /// # Errors
    /// Returns `Auth` for rejected tokens, `Transport` for exhausted
    /// transport retries and 5xx responses, `InvalidInput` for 4xx
    /// responses, `Serialization` for unparseable payloads.
    pub async fn get_json(&self, path_and_query: &str) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path_and_query);

        let token = self.tokens.access_token().await?;
        let mut response = self.send_authorized(&url, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(%url, generation = token.generation, "Access token rejected, re-authenticating");
            let fresh = self.tokens.refresh_after_rejection(token.generation).await?;
            response = self.send_authorized(&url, &fresh).await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                warn!(%url, "Re-authenticated call was rejected again");
                return Err(ApiError::from_status(StatusCode::UNAUTHORIZED)
                    .with_context("the API rejected a freshly granted token")
                    .into());
            }
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::from_status(status).with_context(body).into());
        }

        response.json::<Value>().await.map_err(|e| {
            ExtractionError::Serialization(format!("response from {url} is not valid JSON: {e}"))
        })
    }

    async fn send_authorized(&self, url: &str, token: &AccessToken) -> Result<Response> {
        self.limiter.acquire().await;

        let request = self
            .http
            .request(Method::GET, url)
            .header("Authorization", format!("Bearer {}", token.token))
            .header("Accept", "application/json");

        self.http.send(request).await
    }
}

#[async_trait]
impl ExtractionGateway for ApiClient {
    async fn list_page(
        &self,
        resource: &ResourceSpec,
        page: u32,
        limit: u32,
        window: Option<&DateWindow>,
    ) -> Result<Vec<Value>> {
        let mut path = format!("{}?page={page}&limit={limit}", resource.path);
        if let Some(window) = window {
            path.push_str(&format!(
                "&startDate={}&endDate={}",
                window.start_param(),
                window.end_param()
            ));
        }

        let payload = self.get_json(&path).await?;
        unwrap_data_array(payload, &resource.name)
    }

    async fn fetch_detail(&self, resource: &ResourceSpec, id: &EntityId) -> Result<Value> {
        let payload = self.get_json(&format!("{}/{id}", resource.path)).await?;
        unwrap_data_object(payload, &resource.name)
    }

    async fn fetch_collection(&self, resource: &ResourceSpec) -> Result<Vec<Value>> {
        let payload = self.get_json(&resource.path).await?;
        unwrap_data_array(payload, &resource.name)
    }
}

/// Pull the record list out of a `{"data": [...]}` listing envelope.
fn unwrap_data_array(mut payload: Value, resource: &str) -> Result<Vec<Value>> {
    match payload.get_mut("data").map(Value::take) {
        Some(Value::Array(records)) => Ok(records),
        Some(_) | None => Err(ExtractionError::Serialization(format!(
            "listing response for '{resource}' is missing its data array"
        ))),
    }
}

/// Pull the record out of a `{"data": {...}}` detail envelope.
fn unwrap_data_object(mut payload: Value, resource: &str) -> Result<Value> {
    match payload.get_mut("data").map(Value::take) {
        Some(Value::Null) | None => Err(ExtractionError::Serialization(format!(
            "detail response for '{resource}' is missing its data object"
        ))),
        Some(record) => Ok(record),
    }
}
