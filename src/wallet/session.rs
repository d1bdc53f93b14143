use ethers::types::Address;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::chain::ChainDescriptor;
use super::provider::{ProviderEvent, ProviderRpcError, WalletProvider};
use super::signer::SigningCapability;
use crate::constants::{METHOD_ADD_CHAIN, METHOD_SWITCH_CHAIN, RPC_UNRECOGNIZED_CHAIN};
use crate::error::{AppError, Result};

#[derive(Default)]
struct SessionState {
    address: Option<Address>,
    chain_id: Option<u64>,
    capability: Option<SigningCapability>,
}

impl SessionState {
    fn is_connected(&self) -> bool {
        self.address.is_some() && self.capability.is_some()
    }
}

/// What the UI renders for the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSnapshot {
    pub is_connected: bool,
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub on_required_chain: bool,
}

pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    chain: ChainDescriptor,
    state: Mutex<SessionState>,
    snapshots: watch::Sender<WalletSnapshot>,
    subscribed: Arc<AtomicBool>,
}

impl WalletSession {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, chain: ChainDescriptor) -> Self {
        let state = SessionState::default();
        let (snapshots, _) = watch::channel(snapshot_of(&state, chain.chain_id));
        Self {
            provider,
            chain,
            state: Mutex::new(state),
            snapshots,
            subscribed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<WalletSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.lock_state().is_connected()
    }

    /// Current signing capability; cloned per submission and never cached by callers.
    pub fn capability(&self) -> Option<SigningCapability> {
        self.lock_state().capability.clone()
    }

    /// Requests account access and makes sure the wallet sits on the required chain.
    pub async fn connect(&self) -> Result<Address> {
        let provider = self.provider()?;

        let accounts = provider.request_accounts().await.map_err(|e| {
            tracing::warn!("Failed to connect wallet: {}", e);
            AppError::from(e)
        })?;
        let address = accounts
            .first()
            .copied()
            .ok_or_else(|| AppError::UserRejected("No accounts granted".to_string()))?;

        let mut chain_id = provider.chain_id().await?;
        if chain_id != self.chain.chain_id {
            tracing::info!(
                "Wallet on chain {}, switching to {} ({})",
                chain_id,
                self.chain.chain_id,
                self.chain.chain_name
            );
            self.switch_network().await?;
            chain_id = provider.chain_id().await?;
            if chain_id != self.chain.chain_id {
                return Err(AppError::NetworkSwitchFailed(format!(
                    "wallet still on chain {} after switching to {}",
                    chain_id, self.chain.chain_id
                )));
            }
        }

        let capability = SigningCapability::new(provider.signer(address));
        self.update(|state| {
            state.address = Some(address);
            state.chain_id = Some(chain_id);
            state.capability = Some(capability);
        });

        tracing::info!("Wallet connected: {:?} on chain {}", address, chain_id);
        Ok(address)
    }

    /// Asks the wallet to activate the required chain, registering it first if unknown.
    pub async fn switch_network(&self) -> Result<()> {
        let provider = self.provider()?;

        match provider
            .request(METHOD_SWITCH_CHAIN, self.chain.switch_params())
            .await
        {
            Ok(_) => {}
            Err(err) if err.code == RPC_UNRECOGNIZED_CHAIN => {
                tracing::info!(
                    "Chain {} unknown to wallet, adding {}",
                    self.chain.hex_chain_id(),
                    self.chain.chain_name
                );
                provider
                    .request(METHOD_ADD_CHAIN, self.chain.add_params())
                    .await
                    .map_err(|e| switch_error("add", e))?;
            }
            Err(err) => return Err(switch_error("switch", err)),
        }

        if self.is_connected() {
            match provider.chain_id().await {
                Ok(chain_id) => self.update(|state| {
                    if state.is_connected() {
                        state.chain_id = Some(chain_id);
                    }
                }),
                Err(e) => tracing::warn!("Failed to read chain id after switch: {}", e),
            }
        }
        Ok(())
    }

    pub fn disconnect(&self) {
        self.update(|state| *state = SessionState::default());
        tracing::info!("Wallet disconnected");
    }

    /// Picks up an already authorized account without prompting or switching networks.
    pub async fn restore_session(&self) {
        let Some(provider) = self.provider.clone() else {
            tracing::debug!("No wallet provider; skipping session restore");
            return;
        };

        let accounts = match provider.list_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!("Failed to check wallet connection: {}", e);
                return;
            }
        };
        let Some(address) = accounts.first().copied() else {
            return;
        };
        let chain_id = match provider.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(e) => {
                tracing::warn!("Failed to check wallet connection: {}", e);
                return;
            }
        };

        let capability = SigningCapability::new(provider.signer(address));
        self.update(|state| {
            state.address = Some(address);
            state.chain_id = Some(chain_id);
            state.capability = Some(capability);
        });
        tracing::info!("Restored wallet session {:?} on chain {}", address, chain_id);
    }

    pub fn apply_event(&self, event: ProviderEvent) {
        let Some(provider) = self.provider.as_ref() else {
            return;
        };
        let capability = match &event {
            ProviderEvent::AccountsChanged(accounts) => accounts
                .first()
                .map(|account| SigningCapability::new(provider.signer(*account))),
            ProviderEvent::ChainChanged(_) => None,
        };

        // Check and write under one lock so a concurrent disconnect wins.
        self.update(|state| {
            if !state.is_connected() {
                tracing::debug!("Ignoring {:?} while disconnected", event);
                return;
            }
            match (event, capability) {
                (ProviderEvent::AccountsChanged(_), None) => {
                    *state = SessionState::default();
                    tracing::info!("Wallet disconnected by provider");
                }
                (ProviderEvent::AccountsChanged(_), Some(capability)) => {
                    let account = capability.account();
                    if state.address == Some(account) {
                        return;
                    }
                    state.address = Some(account);
                    state.capability = Some(capability);
                    tracing::info!("Wallet account changed to {:?}", account);
                }
                (ProviderEvent::ChainChanged(chain_id), _) => {
                    state.chain_id = Some(chain_id);
                    if chain_id != self.chain.chain_id {
                        tracing::warn!("Wallet moved to chain {}", chain_id);
                    }
                }
            }
        });
    }

    /// Starts applying provider events. Only one subscription may be active.
    pub fn subscribe(self: &Arc<Self>) -> Result<Subscription> {
        let provider = self.provider()?;
        if self.subscribed.swap(true, Ordering::SeqCst) {
            return Err(AppError::Internal(
                "Wallet events already subscribed".to_string(),
            ));
        }

        let mut events = provider.subscribe_events();
        let session = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => session.apply_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Wallet event stream lagged, {} events skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription {
            handle,
            active: Arc::clone(&self.subscribed),
        })
    }

    fn provider(&self) -> Result<Arc<dyn WalletProvider>> {
        self.provider.clone().ok_or(AppError::ProviderMissing)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update<T>(&self, apply: impl FnOnce(&mut SessionState) -> T) -> T {
        let (result, snapshot) = {
            let mut state = self.lock_state();
            let result = apply(&mut *state);
            (result, snapshot_of(&state, self.chain.chain_id))
        };
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
        result
    }
}

fn snapshot_of(state: &SessionState, required_chain: u64) -> WalletSnapshot {
    WalletSnapshot {
        is_connected: state.is_connected(),
        address: state.address,
        chain_id: state.chain_id,
        on_required_chain: state.chain_id == Some(required_chain),
    }
}

fn switch_error(step: &str, err: ProviderRpcError) -> AppError {
    if err.is_user_rejection() {
        return AppError::UserRejected(err.message);
    }
    tracing::warn!("Failed to {} network: {}", step, err);
    AppError::NetworkSwitchFailed(err.message)
}

/// Disposer for the wallet event listener.
#[must_use = "dropping the subscription stops wallet event handling"]
pub struct Subscription {
    handle: JoinHandle<()>,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
        self.active.store(false, Ordering::SeqCst);
        tracing::debug!("Wallet event subscription disposed");
    }
}
