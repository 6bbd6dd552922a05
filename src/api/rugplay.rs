//! Rugplay HTTP client.
//!
//! Thin reqwest wrapper: browser-like headers, the session cookie, one
//! request per call. Responses are decoded as JSON when the server says
//! so and kept as text otherwise.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::GameApi;
use crate::config::ApiConfig;
use crate::types::{
    BotError, ClaimResponse, CoinInfo, FlipResult, FlipSide, PortfolioSummary, TradeResult,
};

const SESSION_COOKIE: &str = "__Secure-better-auth.session_token";

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// `Cookie` header value, or `None` when no credential is configured.
fn cookie_value(config: &ApiConfig) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(cf) = &config.cf_clearance {
        parts.push(format!("cf_clearance={}", cf.expose_secret()));
    }
    if let Some(token) = &config.session_token {
        parts.push(format!("{SESSION_COOKIE}={}", token.expose_secret()));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// Default headers sent with every request.
pub fn build_headers(config: &ApiConfig) -> Result<HeaderMap> {
    let site = config.site_url.trim_end_matches('/');
    let referer = format!("{site}/");

    let pairs: [(&'static str, &str); 11] = [
        ("user-agent", config.user_agent.as_str()),
        ("accept", "application/json"),
        ("referer", referer.as_str()),
        ("origin", site),
        ("content-type", "application/json"),
        ("connection", "keep-alive"),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-origin"),
        ("dnt", "1"),
        ("priority", "u=0"),
    ];

    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).with_context(|| format!("Invalid header value for {name}"))?,
        );
    }

    if let Some(cookie) = cookie_value(config) {
        let mut value = HeaderValue::from_str(&cookie).context("Invalid cookie value")?;
        value.set_sensitive(true);
        headers.insert(reqwest::header::COOKIE, value);
    }

    Ok(headers)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Rugplay API client.
pub struct RugplayClient {
    http: Client,
    base_url: String,
}

impl RugplayClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .default_headers(build_headers(config)?)
            .build()
            .context("Failed to build HTTP client for Rugplay")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path of a per-coin endpoint.
    fn coin_path(symbol: &str, tail: &str) -> String {
        format!("/coin/{}/{tail}", urlencoding::encode(symbol))
    }

    /// Send one request and return the body as JSON (or a JSON string when
    /// the response is not JSON).
    async fn call(&self, method: Method, endpoint: &str, payload: Option<Value>) -> Result<Value> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!(method = %method, url = %url, "Calling API");

        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = &payload {
            request = request.json(body);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("{method} {endpoint} request failed"))?;

        let status = resp.status();
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);
        let body = resp
            .text()
            .await
            .with_context(|| format!("Failed to read {endpoint} response body"))?;

        if !status.is_success() {
            return Err(BotError::Api {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        debug!(endpoint, status = status.as_u16(), body = %body, "API response");

        if is_json {
            serde_json::from_str(&body)
                .with_context(|| format!("Failed to parse {endpoint} response as JSON"))
        } else {
            Ok(Value::String(body))
        }
    }

    async fn call_typed<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<Value>,
    ) -> Result<T> {
        let value = self.call(method, endpoint, payload).await?;
        serde_json::from_value(value)
            .with_context(|| format!("Unexpected response shape from {endpoint}"))
    }
}

// ---------------------------------------------------------------------------
// GameApi trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl GameApi for RugplayClient {
    async fn portfolio_summary(&self) -> Result<PortfolioSummary> {
        self.call_typed(Method::GET, "/portfolio/summary", None).await
    }

    async fn claim_reward(&self) -> Result<ClaimResponse> {
        self.call_typed(Method::POST, "/rewards/claim", Some(json!({}))).await
    }

    async fn buy(&self, symbol: &str, amount: Decimal) -> Result<TradeResult> {
        let endpoint = Self::coin_path(symbol, "trade");
        let trade: TradeResult = self
            .call_typed(
                Method::POST,
                &endpoint,
                Some(json!({ "type": "BUY", "amount": amount })),
            )
            .await?;
        info!(symbol, amount = %amount, coins = trade.coins_bought, "Buy executed");
        Ok(trade)
    }

    async fn post_comment(&self, symbol: &str, content: &str) -> Result<()> {
        let endpoint = Self::coin_path(symbol, "comments");
        self.call(Method::POST, &endpoint, Some(json!({ "content": content })))
            .await?;
        Ok(())
    }

    async fn coin_info(&self, symbol: &str) -> Result<CoinInfo> {
        let endpoint = Self::coin_path(symbol, "holders");
        self.call_typed(Method::GET, &endpoint, None).await
    }

    async fn coin_flip(&self, side: FlipSide, amount: Decimal) -> Result<FlipResult> {
        self.call_typed(
            Method::POST,
            "/arcade/coinflip",
            Some(json!({ "side": side, "amount": amount })),
        )
        .await
    }

    async fn transfer(&self, recipient: &str, amount: Decimal) -> Result<()> {
        self.call(
            Method::POST,
            "/transfer",
            Some(json!({
                "recipientUsername": recipient,
                "type": "CASH",
                "amount": amount,
            })),
        )
        .await?;
        info!(recipient, amount = %amount, "Transfer sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
