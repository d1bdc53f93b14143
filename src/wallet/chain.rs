use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Network the game contract lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl ChainDescriptor {
    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Parameter object for `wallet_switchEthereumChain`.
    pub fn switch_params(&self) -> serde_json::Value {
        serde_json::json!([{ "chainId": self.hex_chain_id() }])
    }

    /// EIP-3085 parameter object for `wallet_addEthereumChain`.
    pub fn add_params(&self) -> serde_json::Value {
        serde_json::json!([{
            "chainId": self.hex_chain_id(),
            "chainName": self.chain_name,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": self.block_explorer_urls,
        }])
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.block_explorer_urls
            .first()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

/// Parses a chain id as reported by wallets: `0x`-prefixed hex or decimal.
pub fn parse_chain_id(value: &str) -> Result<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Empty chain id".to_string()));
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .map_err(|e| AppError::BadRequest(format!("Invalid chain id hex: {}", e)));
    }
    trimmed
        .parse::<u64>()
        .map_err(|e| AppError::BadRequest(format!("Invalid chain id dec: {}", e)))
}

#[cfg(test)]
pub(crate) fn monad_testnet() -> ChainDescriptor {
    ChainDescriptor {
        chain_id: 666,
        chain_name: "Monad Testnet".to_string(),
        native_currency: NativeCurrency {
            name: "MON".to_string(),
            symbol: "MON".to_string(),
            decimals: 18,
        },
        rpc_urls: vec!["https://testnet-rpc.monad.xyz".to_string()],
        block_explorer_urls: vec!["https://testnet-explorer.monad.xyz".to_string()],
    }
}
