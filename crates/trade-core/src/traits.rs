use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::{PortfolioPosition, Stock, TradeConfirmation, TradeOrder, TradeRecord};

/// The backend operations the application depends on. One method per
/// endpoint; single request, single response, no retry or token refresh.
#[async_trait]
pub trait TradingApi: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn login(&self, username: &str, password: &str) -> ApiResult<String>;

    /// Create a new account and sign it in, returning a bearer token.
    async fn register(&self, username: &str, password: &str) -> ApiResult<String>;

    /// The stock catalog with quoted prices. No authentication required.
    async fn list_stocks(&self) -> ApiResult<Vec<Stock>>;

    /// Open positions for the account behind `token`.
    async fn portfolio(&self, token: &str) -> ApiResult<Vec<PortfolioPosition>>;

    /// The trade ledger, most recent first.
    async fn history(&self, token: &str) -> ApiResult<Vec<TradeRecord>>;

    /// Execute a trade at the quoted price.
    async fn submit_trade(&self, token: &str, order: &TradeOrder) -> ApiResult<TradeConfirmation>;
}
