pub mod client;
mod models;

pub use client::SimulatorClient;
pub use trade_core::TradingApi;
