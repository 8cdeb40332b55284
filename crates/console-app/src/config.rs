use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the Trading Simulator backend.
    pub api_url: String,
    /// Where the bearer token is persisted between runs.
    pub token_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("TRADESIM_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let token_path = match env::var("TRADESIM_TOKEN_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_token_path()?,
        };

        Ok(Self {
            api_url,
            token_path,
        })
    }
}

fn default_token_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("no user data directory for the session token")?;
    Ok(base.join("tradesim").join("token"))
}
