//! HTTP client for the collaborator REST API.
//!
//! All paths are relative to the configured API base URL. Authenticated calls
//! take the bearer token explicitly; a missing token fails locally without a
//! request.

use crate::error::{RestError, RestResult};
use crate::types::{ErrorBody, PortfolioResponse, SystemStatus, TradeRequest};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a client for `base_url` (e.g. `http://localhost:4000/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RestResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RestError::Http(format!("Failed to create HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /instruments/prices`. Returns the raw payload for normalization.
    pub async fn fetch_prices(&self) -> RestResult<Value> {
        let response = self.client.get(self.url("/instruments/prices")).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// `GET /portfolio` (authenticated).
    pub async fn fetch_portfolio(&self, token: Option<&str>) -> RestResult<PortfolioResponse> {
        let request = authorized(self.client.get(self.url("/portfolio")), token)?;
        let response = check_status(request.send().await?).await?;
        let portfolio: PortfolioResponse = response.json().await?;
        debug!(positions = portfolio.positions.len(), "Portfolio fetched");
        Ok(portfolio)
    }

    /// `GET /candles/{symbol}`. Records are passed through verbatim; a
    /// non-array body yields no candles.
    pub async fn fetch_candles(&self, symbol: &str) -> RestResult<Vec<Value>> {
        let response = self
            .client
            .get(self.url(&format!("/candles/{symbol}")))
            .send()
            .await?;
        let body: Value = check_status(response).await?.json().await?;
        match body {
            Value::Array(items) => Ok(items),
            other => {
                warn!(%symbol, body = %other, "Candles response is not an array");
                Ok(Vec::new())
            }
        }
    }

    /// `GET /system`.
    pub async fn fetch_system_status(&self) -> RestResult<SystemStatus> {
        let response = self.client.get(self.url("/system")).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// `POST /trade/{buy|sell}` (authenticated).
    ///
    /// Any non-2xx answer other than 401/403 becomes `TradeRejected` with the
    /// server's `error` message verbatim.
    pub async fn submit_trade(&self, token: Option<&str>, trade: &TradeRequest) -> RestResult<Value> {
        let url = self.url(&format!("/trade/{}", trade.side));
        info!(side = %trade.side, symbol = %trade.symbol, quantity = %trade.quantity, "Submitting trade");

        let request = authorized(self.client.post(url).json(trade), token)?;
        let response = request.send().await?;
        let status = response.status();

        if is_auth_failure(status) {
            return Err(RestError::AuthRequired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = rejection_message(status, &body);
            warn!(%status, reason = %message, "Trade rejected");
            return Err(RestError::TradeRejected(message));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn authorized(request: RequestBuilder, token: Option<&str>) -> RestResult<RequestBuilder> {
    match token {
        Some(t) if !t.is_empty() => Ok(request.bearer_auth(t)),
        _ => Err(RestError::AuthRequired),
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

async fn check_status(response: Response) -> RestResult<Response> {
    let status = response.status();
    if is_auth_failure(status) {
        return Err(RestError::AuthRequired);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Server `error` field if present, else the status text.
fn rejection_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        })
}
