//! Scripted wallet used by unit tests.

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TxHash, U256, U64};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};

use super::provider::{ProviderEvent, ProviderRpcError, WalletProvider};
use super::signer::TransactionSigner;
use crate::constants::{
    METHOD_ACCOUNTS, METHOD_ADD_CHAIN, METHOD_CHAIN_ID, METHOD_REQUEST_ACCOUNTS,
    METHOD_SWITCH_CHAIN, RPC_UNRECOGNIZED_CHAIN,
};

pub fn account(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub struct MockWallet {
    pub granted: Mutex<Vec<Address>>,
    pub authorized: Mutex<Vec<Address>>,
    pub chain_id: Mutex<u64>,
    pub known_chains: Mutex<Vec<u64>>,
    pub failures: Mutex<HashMap<String, ProviderRpcError>>,
    pub requests: Mutex<Vec<(String, Value)>>,
    pub signer: Arc<MockSigner>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockWallet {
    pub fn new(granted: Vec<Address>, chain_id: u64) -> Self {
        let signer_account = granted.first().copied().unwrap_or_default();
        let (events, _) = broadcast::channel(16);
        Self {
            granted: Mutex::new(granted),
            authorized: Mutex::new(Vec::new()),
            chain_id: Mutex::new(chain_id),
            known_chains: Mutex::new(vec![1, chain_id]),
            failures: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            signer: Arc::new(MockSigner::new(signer_account)),
            events,
        }
    }

    pub fn knows_chain(self, chain_id: u64) -> Self {
        self.known_chains.lock().unwrap().push(chain_id);
        self
    }

    pub fn fail(&self, method: &str, error: ProviderRpcError) {
        self.failures
            .lock()
            .unwrap()
            .insert(method.to_string(), error);
    }

    pub fn authorize(&self, accounts: Vec<Address>) {
        *self.authorized.lock().unwrap() = accounts;
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    pub fn params_of(&self, method: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
    }

    fn requested_chain(params: &Value) -> Option<u64> {
        params[0]["chainId"]
            .as_str()
            .and_then(|raw| super::chain::parse_chain_id(raw).ok())
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));
        if let Some(err) = self.failures.lock().unwrap().get(method) {
            return Err(err.clone());
        }

        match method {
            METHOD_REQUEST_ACCOUNTS => {
                let granted = self.granted.lock().unwrap().clone();
                *self.authorized.lock().unwrap() = granted.clone();
                Ok(serde_json::to_value(granted).unwrap())
            }
            METHOD_ACCOUNTS => {
                let authorized = self.authorized.lock().unwrap().clone();
                Ok(serde_json::to_value(authorized).unwrap())
            }
            METHOD_CHAIN_ID => Ok(Value::String(format!(
                "{:#x}",
                *self.chain_id.lock().unwrap()
            ))),
            METHOD_SWITCH_CHAIN => {
                let target = Self::requested_chain(&params)
                    .ok_or_else(|| ProviderRpcError::new(-32602, "missing chainId"))?;
                if !self.known_chains.lock().unwrap().contains(&target) {
                    return Err(ProviderRpcError::new(
                        RPC_UNRECOGNIZED_CHAIN,
                        "Unrecognized chain ID",
                    ));
                }
                *self.chain_id.lock().unwrap() = target;
                Ok(Value::Null)
            }
            METHOD_ADD_CHAIN => {
                let target = Self::requested_chain(&params)
                    .ok_or_else(|| ProviderRpcError::new(-32602, "missing chainId"))?;
                self.known_chains.lock().unwrap().push(target);
                *self.chain_id.lock().unwrap() = target;
                Ok(Value::Null)
            }
            other => Err(ProviderRpcError::new(
                -32601,
                format!("method {} not supported", other),
            )),
        }
    }

    fn signer(&self, account: Address) -> Arc<dyn TransactionSigner> {
        *self.signer.account.lock().unwrap() = account;
        self.signer.clone()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

pub struct MockSigner {
    pub account: Mutex<Address>,
    pub tx_hash: TxHash,
    pub receipt_status: Mutex<Option<u64>>,
    pub send_error: Mutex<Option<ProviderRpcError>>,
    pub sent: Mutex<Vec<TypedTransaction>>,
    pub reads: Mutex<HashMap<Vec<u8>, Result<U256, ProviderRpcError>>>,
    pub gate: Option<Arc<Notify>>,
}

impl MockSigner {
    pub fn new(account: Address) -> Self {
        Self {
            account: Mutex::new(account),
            tx_hash: TxHash::repeat_byte(0xab),
            receipt_status: Mutex::new(Some(1)),
            send_error: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            reads: Mutex::new(HashMap::new()),
            gate: None,
        }
    }

    pub fn gated(account: Address, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(account)
        }
    }

    pub fn set_read(&self, selector: Vec<u8>, value: Result<U256, ProviderRpcError>) {
        self.reads.lock().unwrap().insert(selector, value);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl TransactionSigner for MockSigner {
    fn address(&self) -> Address {
        *self.account.lock().unwrap()
    }

    async fn send_transaction(&self, tx: TypedTransaction) -> Result<TxHash, ProviderRpcError> {
        self.sent.lock().unwrap().push(tx);
        if let Some(err) = self.send_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.tx_hash)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        _confirmations: usize,
    ) -> Result<Option<TransactionReceipt>, ProviderRpcError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let status = *self.receipt_status.lock().unwrap();
        Ok(status.map(|status| TransactionReceipt {
            transaction_hash: tx_hash,
            status: Some(U64::from(status)),
            block_number: Some(U64::from(42)),
            ..Default::default()
        }))
    }

    async fn call(&self, tx: TypedTransaction) -> Result<Bytes, ProviderRpcError> {
        let data = tx.data().cloned().unwrap_or_default();
        let selector = data.as_ref().get(..4).unwrap_or_default().to_vec();
        match self.reads.lock().unwrap().get(&selector) {
            Some(Ok(value)) => {
                let mut word = [0u8; 32];
                value.to_big_endian(&mut word);
                Ok(Bytes::from(word.to_vec()))
            }
            Some(Err(err)) => Err(err.clone()),
            None => Err(ProviderRpcError::new(3, "execution reverted")),
        }
    }
}
