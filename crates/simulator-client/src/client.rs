use crate::models::*;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use trade_core::{
    ApiError, ApiResult, PortfolioPosition, Stock, TradeConfirmation, TradeOrder, TradeRecord,
    TradingApi,
};

pub struct SimulatorClient {
    http: Client,
    base_url: String,
}

impl SimulatorClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(15)).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { http, base_url })
    }

    /// Create a client from `TRADESIM_API_URL`, defaulting to a local
    /// backend.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("TRADESIM_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        Self::new(base_url)
    }

    /// Base URL this client talks to (for logging/diagnostics).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TradingApi for SimulatorClient {
    async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        let url = format!("{}/login", self.base_url);

        let response = self
            .http
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let (status, detail) = read_failure(response).await;
            return Err(classify_login_failure(status, detail));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::info!("Logged in as {}", username);
        Ok(token.access_token)
    }

    async fn register(&self, username: &str, password: &str) -> ApiResult<String> {
        let url = format!("{}/register", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&RegisterRequest { username, password })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let (status, detail) = read_failure(response).await;
            return Err(classify_register_failure(status, detail));
        }

        tracing::info!("Registered account {}", username);

        // The register response carries the new profile but no token, so
        // chain the login exchange to hand the caller a usable session.
        self.login(username, password).await
    }

    async fn list_stocks(&self) -> ApiResult<Vec<Stock>> {
        let url = format!("{}/stocks/", self.base_url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let (status, detail) = read_failure(response).await;
            return Err(rejected(status, detail));
        }

        let entries = response
            .json::<Vec<StockEntry>>()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(entries.into_iter().map(entry_to_stock).collect())
    }

    async fn portfolio(&self, token: &str) -> ApiResult<Vec<PortfolioPosition>> {
        let url = format!("{}/trade/portfolio", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let (status, detail) = read_failure(response).await;
            return Err(classify_authed_failure(status, detail));
        }

        let entries = response
            .json::<Vec<PortfolioEntry>>()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(entries.into_iter().map(entry_to_position).collect())
    }

    async fn history(&self, token: &str) -> ApiResult<Vec<TradeRecord>> {
        let url = format!("{}/trade/history", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let (status, detail) = read_failure(response).await;
            return Err(classify_authed_failure(status, detail));
        }

        let entries = response
            .json::<Vec<HistoryEntry>>()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(entries.into_iter().map(entry_to_record).collect())
    }

    async fn submit_trade(&self, token: &str, order: &TradeOrder) -> ApiResult<TradeConfirmation> {
        let url = format!("{}/trade/", self.base_url);

        tracing::info!(
            "Submitting trade: {} {} x{} @ {}",
            order.side,
            order.symbol,
            order.quantity,
            order.price
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&order_to_request(order))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let (status, detail) = read_failure(response).await;
            return Err(classify_authed_failure(status, detail));
        }

        let created = response
            .json::<TradeCreated>()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::info!("Trade {} executed", created.id);
        Ok(created_to_confirmation(created))
    }
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

async fn read_failure(response: Response) -> (StatusCode, Option<String>) {
    let status = response.status();
    let detail = match response.text().await {
        Ok(body) => extract_detail(&body),
        Err(_) => None,
    };
    (status, detail)
}

/// Pull the human-readable `detail` out of an error body. FastAPI sends
/// either a plain string or, for 422s, an array of {loc, msg, type}.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(|msg| msg.as_str()))
            .map(str::to_string),
        _ => None,
    }
}

fn classify_login_failure(status: StatusCode, detail: Option<String>) -> ApiError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ApiError::InvalidCredentials(detail.unwrap_or_else(|| "Login failed".to_string()))
        }
        StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Validation(detail.unwrap_or_else(|| "Login failed".to_string()))
        }
        _ => rejected(status, detail),
    }
}

fn classify_register_failure(status: StatusCode, detail: Option<String>) -> ApiError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT => {
            let message = detail.unwrap_or_else(|| "Registration failed".to_string());
            if is_username_conflict(&message) {
                ApiError::UsernameTaken(message)
            } else {
                ApiError::Validation(message)
            }
        }
        StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Validation(detail.unwrap_or_else(|| "Registration failed".to_string()))
        }
        _ => rejected(status, detail),
    }
}

/// Classification for calls made with a bearer token: a 401/403 means the
/// session is dead and the caller must re-authenticate.
fn classify_authed_failure(status: StatusCode, detail: Option<String>) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
        StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Validation(detail.unwrap_or_else(|| "Invalid request".to_string()))
        }
        _ => rejected(status, detail),
    }
}

fn rejected(status: StatusCode, detail: Option<String>) -> ApiError {
    ApiError::Rejected {
        status: status.as_u16(),
        reason: detail.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        }),
    }
}

fn is_username_conflict(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    lower.contains("taken") || lower.contains("exists") || lower.contains("registered")
}

// ---------------------------------------------------------------------------
// Conversion helpers: wire shapes -> domain types
// ---------------------------------------------------------------------------

fn entry_to_stock(e: StockEntry) -> Stock {
    Stock {
        symbol: e.symbol,
        name: e.name,
        price: e.price,
    }
}

fn entry_to_position(e: PortfolioEntry) -> PortfolioPosition {
    PortfolioPosition {
        symbol: e.symbol,
        // Holdings are whole shares; the backend rounds its aggregate to
        // two decimals on the way out.
        quantity: e.quantity.round() as u32,
        avg_price: e.avg_price,
    }
}

fn entry_to_record(e: HistoryEntry) -> TradeRecord {
    TradeRecord {
        id: e.id,
        symbol: e.symbol,
        side: e.trade_type,
        quantity: e.quantity,
        price: e.price,
        timestamp: e.timestamp,
    }
}

fn created_to_confirmation(c: TradeCreated) -> TradeConfirmation {
    TradeConfirmation {
        id: c.id,
        symbol: c.symbol,
        quantity: c.quantity,
        price: c.price,
        timestamp: c.timestamp,
    }
}

fn order_to_request(order: &TradeOrder) -> TradeRequest<'_> {
    TradeRequest {
        symbol: &order.symbol,
        quantity: order.quantity,
        price: order.price,
        trade_type: order.side.as_str(),
    }
}
