use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A tradable instrument with its most recent quoted price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// An open position, aggregated per symbol by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPosition {
    pub symbol: String,
    pub quantity: u32,
    pub avg_price: Decimal,
}

impl PortfolioPosition {
    /// Position value at the average purchase price.
    pub fn cost_value(&self) -> Decimal {
        self.avg_price * Decimal::from(self.quantity)
    }
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    // The backend stores sides uppercased but its trade endpoint accepts
    // lowercase, so tolerate both on the way in.
    #[serde(alias = "BUY")]
    Buy,
    #[serde(alias = "SELL")]
    Sell,
}

impl TradeSide {
    /// Wire casing expected by the trade endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }

    /// Casing used in ledgers and confirmations.
    pub fn label(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A completed trade from the account ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: i64,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: u32,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    /// Total traded value (price times quantity).
    pub fn notional(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A trade submission, priced at the quote the user was shown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOrder {
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: u32,
    pub price: Decimal,
}

/// The backend's acknowledgement of an executed trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeConfirmation {
    pub id: i64,
    pub symbol: String,
    pub quantity: u32,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}
