use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trade_core::TradeSide;

// Wire-level request and response shapes for the Trading Simulator API.
// The backend emits prices and aggregated quantities as JSON floats and
// timestamps as naive ISO-8601; everything is normalized into the domain
// types in `client.rs`.

/// POST /login and POST /register (after the chained login) response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// POST /register request body.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// GET /stocks/ entry.
#[derive(Debug, Deserialize)]
pub struct StockEntry {
    pub symbol: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// GET /trade/portfolio entry. Share counts arrive as floats because the
/// backend aggregates and rounds them to two decimals.
#[derive(Debug, Deserialize)]
pub struct PortfolioEntry {
    pub symbol: String,
    pub quantity: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_price: Decimal,
}

/// GET /trade/history entry, most recent first.
#[derive(Debug, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub symbol: String,
    pub trade_type: TradeSide,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    pub timestamp: DateTime<Utc>,
}

/// POST /trade/ request body.
#[derive(Debug, Serialize)]
pub struct TradeRequest<'a> {
    pub symbol: &'a str,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub trade_type: &'a str,
}

/// POST /trade/ response.
#[derive(Debug, Deserialize)]
pub struct TradeCreated {
    pub id: i64,
    pub symbol: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    pub timestamp: DateTime<Utc>,
}

pub mod lenient_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    /// Accepts RFC 3339 or a naive ISO-8601 datetime, which the backend
    /// emits without a timezone and means as UTC.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
