use rust_decimal::Decimal;

use crate::types::{PortfolioPosition, TradeRecord};

/// Number of ledger entries surfaced on the dashboard.
pub const RECENT_TRADES: usize = 5;

/// Everything the dashboard paints, computed before any output happens.
/// A `None` field means that load failed; its card shows a placeholder
/// while the other cards render normally.
#[derive(Debug, Clone)]
pub struct DashboardModel {
    pub balance: Option<Decimal>,
    /// Sum of position values at average purchase price.
    pub portfolio_value: Option<Decimal>,
    /// Always flat: the demo backend exposes no live prices to gain against.
    pub total_gain: Decimal,
    pub total_trades: Option<usize>,
    pub active_positions: Option<usize>,
    /// First `RECENT_TRADES` ledger entries, newest first.
    pub recent_trades: Option<Vec<TradeRecord>>,
}

impl DashboardModel {
    pub fn compute(
        balance: Option<Decimal>,
        portfolio: Option<&[PortfolioPosition]>,
        history: Option<&[TradeRecord]>,
    ) -> Self {
        DashboardModel {
            balance,
            portfolio_value: portfolio
                .map(|positions| positions.iter().map(|p| p.cost_value()).sum()),
            total_gain: Decimal::ZERO,
            total_trades: history.map(|trades| trades.len()),
            active_positions: portfolio.map(|positions| positions.len()),
            recent_trades: history
                .map(|trades| trades.iter().take(RECENT_TRADES).cloned().collect()),
        }
    }
}
