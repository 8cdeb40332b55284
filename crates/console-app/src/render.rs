use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use trade_core::{DashboardModel, PortfolioPosition, Stock, TradeRecord};

use crate::draft::TradeDraft;
use crate::router::Section;

/// Notification severity, mirrored in the console marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toast {
    Success,
    Error,
    Info,
}

/// Paint surface for the app. The console implementation writes to stdout;
/// tests substitute a recording double behind the same seam.
pub trait Renderer: Send + Sync {
    fn show_login(&self);
    fn show_section(&self, section: Section);
    fn render_stocks(&self, stocks: &[Stock]);
    fn render_portfolio(&self, positions: &[PortfolioPosition]);
    fn render_history(&self, trades: &[TradeRecord]);
    fn render_dashboard(&self, model: &DashboardModel);
    fn render_draft(&self, draft: &TradeDraft);
    fn toast(&self, kind: Toast, message: &str);
    fn set_busy(&self, busy: bool);
}

/// Scoped busy indicator. Dropping the guard clears the indicator, so it
/// is cleared on success and failure paths alike.
pub struct BusyGuard {
    renderer: Arc<dyn Renderer>,
}

impl BusyGuard {
    pub fn begin(renderer: &Arc<dyn Renderer>) -> Self {
        renderer.set_busy(true);
        Self {
            renderer: Arc::clone(renderer),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.renderer.set_busy(false);
    }
}

// ---------------------------------------------------------------------------
// Console renderer
// ---------------------------------------------------------------------------

const RULE_WIDTH: usize = 72;

pub struct ConsoleRenderer;

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self
    }

    fn heading(&self, text: &str) {
        println!();
        println!("{text}");
        println!("{}", "-".repeat(RULE_WIDTH));
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for ConsoleRenderer {
    fn show_login(&self) {
        self.heading("Trading Simulator");
        println!("  You are not logged in.");
        println!("  login <username> <password>      sign in");
        println!("  register <username> <password>   create an account");
    }

    fn show_section(&self, section: Section) {
        self.heading(section.title());
    }

    fn render_stocks(&self, stocks: &[Stock]) {
        if stocks.is_empty() {
            println!("  No stocks available at the moment.");
            return;
        }

        println!("  {:<8} {:>12}  {}", "SYMBOL", "PRICE", "NAME");
        for stock in stocks {
            println!(
                "  {:<8} {:>12}  {}",
                stock.symbol,
                format_currency(stock.price),
                stock.name
            );
        }
        println!();
        println!("  trade <symbol> buy|sell opens an order");
    }

    fn render_portfolio(&self, positions: &[PortfolioPosition]) {
        if positions.is_empty() {
            println!("  Your portfolio is empty. Start trading to build your positions!");
            return;
        }

        for position in positions {
            println!(
                "  {:<8} {:>6} shares @ {:>10}   {:>12}",
                position.symbol,
                position.quantity,
                format_currency(position.avg_price),
                format_currency(position.cost_value())
            );
        }
    }

    fn render_history(&self, trades: &[TradeRecord]) {
        if trades.is_empty() {
            println!("  No trade history yet. Your completed trades will appear here.");
            return;
        }

        for trade in trades {
            println!(
                "  {:<8} {:<4} {:>6} shares @ {:>10}   {:>12}   {}",
                trade.symbol,
                trade.side.label(),
                trade.quantity,
                format_currency(trade.price),
                format_currency(trade.notional()),
                format_date(trade.timestamp)
            );
        }
    }

    fn render_dashboard(&self, model: &DashboardModel) {
        println!("  Balance:          {}", currency_or_unavailable(model.balance));
        println!(
            "  Portfolio value:  {}",
            currency_or_unavailable(model.portfolio_value)
        );
        println!("  Total gain:       {}", format_gain(model.total_gain));
        println!("  Trades:           {}", count_or_unavailable(model.total_trades));
        println!(
            "  Open positions:   {}",
            count_or_unavailable(model.active_positions)
        );
        println!();
        println!("  Recent trades");
        match &model.recent_trades {
            None => println!("    (unavailable)"),
            Some(recent) if recent.is_empty() => {
                println!("    No trades yet. Start trading to see your activity here!");
            }
            Some(recent) => {
                for trade in recent {
                    println!(
                        "    {:<8} {:<4} {:>6} shares   {:>12}",
                        trade.symbol,
                        trade.side.label(),
                        trade.quantity,
                        format_currency(trade.notional())
                    );
                }
            }
        }
    }

    fn render_draft(&self, draft: &TradeDraft) {
        let stock = draft.stock();
        self.heading(&format!("Trade {}", stock.symbol));
        println!("  {} @ {}", stock.name, format_currency(stock.price));
        println!(
            "  Side: {}   Quantity: {}   Total: {}",
            draft.side().label(),
            draft.quantity(),
            format_currency(draft.cost())
        );
        println!("  side buy|sell, qty <shares>, submit, cancel");
    }

    fn toast(&self, kind: Toast, message: &str) {
        let marker = match kind {
            Toast::Success => "ok",
            Toast::Error => "error",
            Toast::Info => "info",
        };
        println!("[{marker}] {message}");
    }

    fn set_busy(&self, busy: bool) {
        // A plain terminal cannot retract output; the pairing contract
        // still holds for renderers that can.
        if busy {
            println!("Loading...");
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// US-style currency: two fraction digits, thousands separators, leading
/// sign for negatives.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let text = rounded.abs().to_string();
    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole.to_string(), format!("{frac:0<2}")),
        None => (text, "00".to_string()),
    };

    let grouped = group_thousands(&whole);
    if negative {
        format!("-${grouped}.{frac}")
    } else {
        format!("${grouped}.{frac}")
    }
}

/// Gain display keeps an explicit sign even at zero.
pub fn format_gain(amount: Decimal) -> String {
    if amount.is_sign_negative() && !amount.is_zero() {
        format_currency(amount)
    } else {
        format!("+{}", format_currency(amount))
    }
}

pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%b %d, %Y %H:%M").to_string()
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn currency_or_unavailable(value: Option<Decimal>) -> String {
    value
        .map(format_currency)
        .unwrap_or_else(|| "(unavailable)".to_string())
}

fn count_or_unavailable(value: Option<usize>) -> String {
    value
        .map(|count| count.to_string())
        .unwrap_or_else(|| "(unavailable)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn formats_currency_like_the_locale() {
        assert_eq!(format_currency(dec!(1234.56)), "$1,234.56");
        assert_eq!(format_currency(dec!(100000)), "$100,000.00");
        assert_eq!(format_currency(dec!(0)), "$0.00");
        assert_eq!(format_currency(dec!(999)), "$999.00");
        assert_eq!(format_currency(dec!(1234567.5)), "$1,234,567.50");
    }

    #[test]
    fn negative_amounts_get_a_leading_sign() {
        assert_eq!(format_currency(dec!(-45.1)), "-$45.10");
        assert_eq!(format_currency(dec!(-0.001)), "$0.00");
    }

    #[test]
    fn amounts_round_to_cents_for_display() {
        assert_eq!(format_currency(dec!(10.239)), "$10.24");
        assert_eq!(format_currency(dec!(10.231)), "$10.23");
    }

    #[test]
    fn gains_keep_an_explicit_sign() {
        assert_eq!(format_gain(Decimal::ZERO), "+$0.00");
        assert_eq!(format_gain(dec!(12.5)), "+$12.50");
        assert_eq!(format_gain(dec!(-12.5)), "-$12.50");
    }

    #[test]
    fn dates_render_short_and_sortable_enough() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
        assert_eq!(format_date(ts), "Jan 15, 2024 14:30");
    }
}
