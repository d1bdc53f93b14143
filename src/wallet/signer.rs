use async_trait::async_trait;
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TxHash};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::provider::ProviderRpcError;

/// Sends transactions and read calls on behalf of one account.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Resolves once the wallet has accepted the transaction and assigned a hash.
    async fn send_transaction(&self, tx: TypedTransaction) -> Result<TxHash, ProviderRpcError>;

    /// `None` when the transaction was dropped before inclusion.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: usize,
    ) -> Result<Option<TransactionReceipt>, ProviderRpcError>;

    async fn call(&self, tx: TypedTransaction) -> Result<Bytes, ProviderRpcError>;
}

/// Opaque handle handed out by the wallet session for a single submission.
#[derive(Clone)]
pub struct SigningCapability {
    account: Address,
    signer: Arc<dyn TransactionSigner>,
}

impl SigningCapability {
    pub fn new(signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            account: signer.address(),
            signer,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn signer(&self) -> &Arc<dyn TransactionSigner> {
        &self.signer
    }
}

impl fmt::Debug for SigningCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCapability")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

/// Signer backed by the wallet's own `eth_sendTransaction`.
pub struct JsonRpcSigner {
    provider: Provider<Http>,
    account: Address,
    receipt_poll: Duration,
}

impl JsonRpcSigner {
    pub fn new(provider: Provider<Http>, account: Address, receipt_poll: Duration) -> Self {
        Self {
            provider,
            account,
            receipt_poll,
        }
    }
}

#[async_trait]
impl TransactionSigner for JsonRpcSigner {
    fn address(&self) -> Address {
        self.account
    }

    async fn send_transaction(&self, tx: TypedTransaction) -> Result<TxHash, ProviderRpcError> {
        let mut tx = tx;
        tx.set_from(self.account);
        let pending = self
            .provider
            .send_transaction(tx, None)
            .await
            .map_err(ProviderRpcError::from)?;
        Ok(pending.tx_hash())
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: usize,
    ) -> Result<Option<TransactionReceipt>, ProviderRpcError> {
        PendingTransaction::new(tx_hash, &self.provider)
            .interval(self.receipt_poll)
            .confirmations(confirmations)
            .await
            .map_err(ProviderRpcError::from)
    }

    async fn call(&self, tx: TypedTransaction) -> Result<Bytes, ProviderRpcError> {
        let mut tx = tx;
        tx.set_from(self.account);
        self.provider
            .call(&tx, None)
            .await
            .map_err(ProviderRpcError::from)
    }
}
