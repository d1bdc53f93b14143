use serde::Deserialize;
use std::env;
use url::Url;

use crate::constants::{
    DEFAULT_CHAIN_EXPLORER_URL, DEFAULT_CHAIN_ID, DEFAULT_CHAIN_NAME, DEFAULT_CHAIN_RPC_URL,
    DEFAULT_CURRENCY_DECIMALS, DEFAULT_CURRENCY_NAME, DEFAULT_CURRENCY_SYMBOL,
    DEFAULT_MAX_SCORE_MS, DEFAULT_MIN_SCORE_MS, DEFAULT_RECEIPT_POLL_MS,
    DEFAULT_SCORE_CONTRACT_ADDRESS, DEFAULT_TX_CONFIRMATIONS, DEFAULT_WALLET_EVENT_POLL_MS,
};
use crate::wallet::chain::{ChainDescriptor, NativeCurrency};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Wallet provider
    pub wallet_rpc_url: Option<String>,
    pub wallet_event_poll_ms: u64,

    // Required network
    pub chain_id: u64,
    pub chain_name: String,
    pub chain_currency_name: String,
    pub chain_currency_symbol: String,
    pub chain_currency_decimals: u8,
    pub chain_rpc_urls: Vec<String>,
    pub chain_explorer_urls: Vec<String>,

    // Contract
    pub score_contract_address: String,
    pub tx_confirmations: usize,
    pub receipt_poll_ms: u64,

    // Score bounds
    pub min_score_ms: u64,
    pub max_score_ms: u64,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            wallet_rpc_url: env::var("WALLET_RPC_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            wallet_event_poll_ms: env::var("WALLET_EVENT_POLL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_WALLET_EVENT_POLL_MS),

            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| DEFAULT_CHAIN_ID.to_string())
                .parse()?,
            chain_name: env::var("CHAIN_NAME").unwrap_or_else(|_| DEFAULT_CHAIN_NAME.to_string()),
            chain_currency_name: env::var("CHAIN_CURRENCY_NAME")
                .unwrap_or_else(|_| DEFAULT_CURRENCY_NAME.to_string()),
            chain_currency_symbol: env::var("CHAIN_CURRENCY_SYMBOL")
                .unwrap_or_else(|_| DEFAULT_CURRENCY_SYMBOL.to_string()),
            chain_currency_decimals: env::var("CHAIN_CURRENCY_DECIMALS")
                .unwrap_or_else(|_| DEFAULT_CURRENCY_DECIMALS.to_string())
                .parse()?,
            chain_rpc_urls: split_list(
                &env::var("CHAIN_RPC_URLS").unwrap_or_else(|_| DEFAULT_CHAIN_RPC_URL.to_string()),
            ),
            chain_explorer_urls: split_list(
                &env::var("CHAIN_EXPLORER_URLS")
                    .unwrap_or_else(|_| DEFAULT_CHAIN_EXPLORER_URL.to_string()),
            ),

            score_contract_address: env::var("SCORE_CONTRACT_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_SCORE_CONTRACT_ADDRESS.to_string()),
            tx_confirmations: env::var("TX_CONFIRMATIONS")
                .unwrap_or_else(|_| DEFAULT_TX_CONFIRMATIONS.to_string())
                .parse()?,
            receipt_poll_ms: env::var("RECEIPT_POLL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RECEIPT_POLL_MS),

            min_score_ms: env::var("MIN_SCORE_MS")
                .unwrap_or_else(|_| DEFAULT_MIN_SCORE_MS.to_string())
                .parse()?,
            max_score_ms: env::var("MAX_SCORE_MS")
                .unwrap_or_else(|_| DEFAULT_MAX_SCORE_MS.to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chain_id == 0 {
            anyhow::bail!("CHAIN_ID must be > 0");
        }
        if self.chain_name.trim().is_empty() {
            anyhow::bail!("CHAIN_NAME is empty");
        }
        if self.chain_rpc_urls.is_empty() {
            anyhow::bail!("CHAIN_RPC_URLS is empty");
        }
        for url in self.chain_rpc_urls.iter().chain(self.chain_explorer_urls.iter()) {
            Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid chain URL {}: {}", url, e))?;
        }
        if let Some(url) = &self.wallet_rpc_url {
            Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid WALLET_RPC_URL: {}", e))?;
        } else {
            tracing::warn!(
                "WALLET_RPC_URL not set; wallet operations will report a missing provider"
            );
        }
        if !self.score_contract_address.starts_with("0x") || self.score_contract_address.len() != 42
        {
            anyhow::bail!("SCORE_CONTRACT_ADDRESS is not a 20-byte hex address");
        }
        if self.min_score_ms > self.max_score_ms {
            anyhow::bail!("MIN_SCORE_MS must not exceed MAX_SCORE_MS");
        }
        if self.tx_confirmations == 0 {
            tracing::warn!("TX_CONFIRMATIONS is 0; waiting for one confirmation instead");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_testnet(&self) -> bool {
        if self.environment == "development" || self.environment == "testnet" {
            return true;
        }
        self.chain_name.to_ascii_lowercase().contains("testnet")
    }

    pub fn chain_descriptor(&self) -> ChainDescriptor {
        ChainDescriptor {
            chain_id: self.chain_id,
            chain_name: self.chain_name.clone(),
            native_currency: NativeCurrency {
                name: self.chain_currency_name.clone(),
                symbol: self.chain_currency_symbol.clone(),
                decimals: self.chain_currency_decimals,
            },
            rpc_urls: self.chain_rpc_urls.clone(),
            block_explorer_urls: self.chain_explorer_urls.clone(),
        }
    }

    pub fn confirmations(&self) -> usize {
        self.tx_confirmations.max(1)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        environment: "development".to_string(),
        wallet_rpc_url: None,
        wallet_event_poll_ms: DEFAULT_WALLET_EVENT_POLL_MS,
        chain_id: DEFAULT_CHAIN_ID,
        chain_name: DEFAULT_CHAIN_NAME.to_string(),
        chain_currency_name: DEFAULT_CURRENCY_NAME.to_string(),
        chain_currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        chain_currency_decimals: DEFAULT_CURRENCY_DECIMALS,
        chain_rpc_urls: vec![DEFAULT_CHAIN_RPC_URL.to_string()],
        chain_explorer_urls: vec![DEFAULT_CHAIN_EXPLORER_URL.to_string()],
        score_contract_address: DEFAULT_SCORE_CONTRACT_ADDRESS.to_string(),
        tx_confirmations: 1,
        receipt_poll_ms: 10,
        min_score_ms: DEFAULT_MIN_SCORE_MS,
        max_score_ms: DEFAULT_MAX_SCORE_MS,
        cors_allowed_origins: "*".to_string(),
    }
}
