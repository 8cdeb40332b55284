use rust_decimal::Decimal;
use trade_core::{ApiError, ApiResult, Stock, TradeOrder, TradeSide};

/// An order being composed. Exists only while the trade view is open and
/// is discarded on cancel or successful submission.
#[derive(Debug, Clone)]
pub struct TradeDraft {
    stock: Stock,
    side: TradeSide,
    quantity: u32,
}

impl TradeDraft {
    pub fn open(stock: Stock, side: TradeSide) -> Self {
        Self {
            stock,
            side,
            quantity: 0,
        }
    }

    pub fn stock(&self) -> &Stock {
        &self.stock
    }

    pub fn side(&self) -> TradeSide {
        self.side
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn set_side(&mut self, side: TradeSide) {
        self.side = side;
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    /// Parse free-form quantity input; anything that is not a non-negative
    /// whole number counts as zero.
    pub fn set_quantity_input(&mut self, raw: &str) {
        self.quantity = raw.trim().parse().unwrap_or(0);
    }

    /// Live cost preview at the snapshot price, exact. The backend's
    /// execution price stays authoritative.
    pub fn cost(&self) -> Decimal {
        Decimal::from(self.quantity) * self.stock.price
    }

    /// Turn the draft into a submittable order. Zero-quantity drafts are
    /// rejected here, before any network traffic happens.
    pub fn order(&self) -> ApiResult<TradeOrder> {
        if self.quantity == 0 {
            return Err(ApiError::InvalidQuantity);
        }

        Ok(TradeOrder {
            symbol: self.stock.symbol.clone(),
            side: self.side,
            quantity: self.quantity,
            price: self.stock.price,
        })
    }
}
