use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::{Address, U256};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::chain::parse_chain_id;
use super::signer::{JsonRpcSigner, TransactionSigner};
use crate::constants::{
    EVENT_CHANNEL_CAPACITY, METHOD_ACCOUNTS, METHOD_CHAIN_ID, METHOD_REQUEST_ACCOUNTS,
    RPC_INTERNAL_ERROR, RPC_USER_REJECTED,
};
use crate::error::{AppError, Result};

/// Error reported by a wallet provider, keeping the EIP-1193 code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RPC_INTERNAL_ERROR, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == RPC_USER_REJECTED
    }
}

impl From<ProviderError> for ProviderRpcError {
    fn from(err: ProviderError) -> Self {
        if let Some(response) = err.as_error_response() {
            return Self::new(response.code, response.message.clone());
        }
        Self::internal(err.to_string())
    }
}

impl From<ProviderRpcError> for AppError {
    fn from(err: ProviderRpcError) -> Self {
        if err.is_user_rejection() {
            AppError::UserRejected(err.message)
        } else {
            AppError::TransportError(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "value", rename_all = "camelCase")]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// EIP-1193 style wallet the session talks to.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<Value, ProviderRpcError>;

    /// Signing capability bound to `account`.
    fn signer(&self, account: Address) -> Arc<dyn TransactionSigner>;

    fn subscribe_events(&self) -> broadcast::Receiver<ProviderEvent>;

    /// Prompts the user for account access.
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, ProviderRpcError> {
        let value = self
            .request(METHOD_REQUEST_ACCOUNTS, serde_json::json!([]))
            .await?;
        parse_accounts(value)
    }

    /// Accounts already authorized, without prompting.
    async fn list_accounts(&self) -> std::result::Result<Vec<Address>, ProviderRpcError> {
        let value = self.request(METHOD_ACCOUNTS, serde_json::json!([])).await?;
        parse_accounts(value)
    }

    async fn chain_id(&self) -> std::result::Result<u64, ProviderRpcError> {
        let value = self.request(METHOD_CHAIN_ID, serde_json::json!([])).await?;
        match value {
            Value::String(raw) => {
                parse_chain_id(&raw).map_err(|e| ProviderRpcError::internal(e.to_string()))
            }
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| ProviderRpcError::internal("Chain id out of range")),
            other => Err(ProviderRpcError::internal(format!(
                "Unexpected chain id response: {}",
                other
            ))),
        }
    }
}

pub(crate) fn parse_accounts(value: Value) -> std::result::Result<Vec<Address>, ProviderRpcError> {
    serde_json::from_value(value)
        .map_err(|e| ProviderRpcError::internal(format!("Malformed accounts response: {}", e)))
}

/// Wallet reached over JSON-RPC. Account and chain changes are detected by polling.
pub struct JsonRpcWallet {
    provider: Provider<Http>,
    events: broadcast::Sender<ProviderEvent>,
    event_poll: Duration,
    receipt_poll: Duration,
    poller: OnceLock<JoinHandle<()>>,
}

impl JsonRpcWallet {
    pub fn connect(rpc_url: &str, event_poll: Duration, receipt_poll: Duration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| AppError::Internal(format!("Invalid wallet RPC URL: {}", e)))?
            .interval(receipt_poll);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            provider,
            events,
            event_poll,
            receipt_poll,
            poller: OnceLock::new(),
        })
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn request(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<Value, ProviderRpcError> {
        self.provider
            .request::<Value, Value>(method, params)
            .await
            .map_err(ProviderRpcError::from)
    }

    fn signer(&self, account: Address) -> Arc<dyn TransactionSigner> {
        Arc::new(JsonRpcSigner::new(
            self.provider.clone(),
            account,
            self.receipt_poll,
        ))
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.poller.get_or_init(|| {
            tokio::spawn(poll_wallet_events(
                self.provider.clone(),
                self.events.clone(),
                self.event_poll,
            ))
        });
        self.events.subscribe()
    }
}

impl Drop for JsonRpcWallet {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.get() {
            poller.abort();
        }
    }
}

async fn poll_wallet_events(
    provider: Provider<Http>,
    events: broadcast::Sender<ProviderEvent>,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    let mut last_accounts: Option<Vec<Address>> = None;
    let mut last_chain: Option<u64> = None;

    loop {
        ticker.tick().await;

        match provider.get_accounts().await {
            Ok(accounts) => {
                if let Some(change) = detect_change(&mut last_accounts, accounts) {
                    let _ = events.send(ProviderEvent::AccountsChanged(change));
                }
            }
            Err(e) => tracing::debug!("Wallet account poll failed: {}", e),
        }

        match provider.get_chainid().await {
            Ok(chain) => match checked_chain_id(chain) {
                Some(chain) => {
                    if let Some(change) = detect_change(&mut last_chain, chain) {
                        let _ = events.send(ProviderEvent::ChainChanged(change));
                    }
                }
                None => tracing::warn!("Wallet reported out of range chain id {}", chain),
            },
            Err(e) => tracing::debug!("Wallet chain poll failed: {}", e),
        }
    }
}

fn checked_chain_id(chain: U256) -> Option<u64> {
    u64::try_from(chain).ok()
}

// The first observation only seeds the baseline.
fn detect_change<T: Clone + PartialEq>(last: &mut Option<T>, current: T) -> Option<T> {
    let changed = matches!(last, Some(previous) if *previous != current);
    *last = Some(current.clone());
    changed.then_some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_rejection_maps_to_user_rejected() {
        let err: AppError = ProviderRpcError::new(4001, "User denied").into();
        assert_eq!(err, AppError::UserRejected("User denied".to_string()));
    }

    #[test]
    fn other_codes_map_to_transport_error() {
        let err: AppError = ProviderRpcError::new(-32000, "header not found").into();
        assert!(matches!(err, AppError::TransportError(msg) if msg.contains("header not found")));
    }

    #[test]
    fn parse_accounts_reads_hex_addresses() {
        let value = serde_json::json!(["0x2ae02a3e11b8b23328127e0169b8ae28867b7de2"]);
        let accounts = parse_accounts(value).unwrap();
        assert_eq!(accounts.len(), 1);
        assert!(parse_accounts(serde_json::json!("nope")).is_err());
    }

    #[test]
    fn detect_change_seeds_then_reports() {
        let mut last = None;
        assert_eq!(detect_change(&mut last, 666_u64), None);
        assert_eq!(detect_change(&mut last, 666_u64), None);
        assert_eq!(detect_change(&mut last, 1_u64), Some(1));
    }

    #[test]
    fn oversized_chain_id_is_not_truncated() {
        assert_eq!(checked_chain_id(U256::from(666)), Some(666));
        assert_eq!(checked_chain_id(U256::from(u64::MAX)), Some(u64::MAX));
        assert_eq!(checked_chain_id(U256::from(u64::MAX) + 1), None);
    }

    #[test]
    fn provider_event_serializes_for_ui() {
        let json = serde_json::to_value(ProviderEvent::ChainChanged(666)).unwrap();
        assert_eq!(json["event"], "chainChanged");
        assert_eq!(json["value"], 666);
    }
}
