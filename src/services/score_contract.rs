use ethers::abi::{AbiDecode, AbiEncode};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionReceipt, TransactionRequest, TxHash, U256};
use std::fmt;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::wallet::signer::TransactionSigner;

ethers::contract::abigen!(
    ReactionGame,
    r#"[
        function submitScore(uint256 score)
        function getMyBestScore() view returns (uint256)
        function getBestScore() view returns (uint256)
        function getTotalGames() view returns (uint256)
    ]"#
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreQuery {
    MyBest,
    GlobalBest,
    TotalGames,
}

impl ScoreQuery {
    fn calldata(self) -> Vec<u8> {
        match self {
            ScoreQuery::MyBest => GetMyBestScoreCall.encode(),
            ScoreQuery::GlobalBest => GetBestScoreCall.encode(),
            ScoreQuery::TotalGames => GetTotalGamesCall.encode(),
        }
    }
}

impl fmt::Display for ScoreQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoreQuery::MyBest => "getMyBestScore",
            ScoreQuery::GlobalBest => "getBestScore",
            ScoreQuery::TotalGames => "getTotalGames",
        };
        write!(f, "{}", s)
    }
}

/// Reaction game contract seen through one account's signer.
pub struct ScoreContract {
    address: Address,
    signer: Arc<dyn TransactionSigner>,
}

impl ScoreContract {
    pub fn new(address: Address, signer: Arc<dyn TransactionSigner>) -> Self {
        Self { address, signer }
    }

    pub async fn submit_score(&self, score: u64) -> Result<TxHash> {
        let data = SubmitScoreCall {
            score: U256::from(score),
        }
        .encode();
        let tx_hash = self.signer.send_transaction(self.request(data)).await?;
        Ok(tx_hash)
    }

    pub async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: usize,
    ) -> Result<Option<TransactionReceipt>> {
        let receipt = self
            .signer
            .wait_for_receipt(tx_hash, confirmations)
            .await?;
        Ok(receipt)
    }

    pub async fn read(&self, query: ScoreQuery) -> Result<u64> {
        let raw = self.signer.call(self.request(query.calldata())).await?;
        let value = U256::decode(raw.as_ref()).map_err(|e| {
            AppError::TransportError(format!("Malformed {} response: {}", query, e))
        })?;
        u256_to_u64(value)
    }

    fn request(&self, data: Vec<u8>) -> TypedTransaction {
        TransactionRequest::new()
            .from(self.signer.address())
            .to(self.address)
            .data(data)
            .into()
    }
}

pub fn u256_to_u64(value: U256) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(AppError::TransportError(format!(
            "Contract value {} does not fit in u64",
            value
        )));
    }
    Ok(value.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::mock::{account, MockSigner};

    fn contract_with(signer: Arc<MockSigner>) -> ScoreContract {
        ScoreContract::new(Address::repeat_byte(0x2a), signer)
    }

    #[test]
    fn submit_score_calldata_uses_selector_and_argument() {
        let data = SubmitScoreCall {
            score: U256::from(184),
        }
        .encode();
        // 4-byte selector followed by one 32-byte word
        assert_eq!(data.len(), 36);
        assert_eq!(data[35], 184);
    }

    #[test]
    fn u256_to_u64_rejects_overflow() {
        assert_eq!(u256_to_u64(U256::from(250)).unwrap(), 250);
        assert!(u256_to_u64(U256::MAX).is_err());
    }

    #[tokio::test]
    async fn submit_score_sends_to_contract_from_signer() {
        let signer = Arc::new(MockSigner::new(account(7)));
        let contract = contract_with(signer.clone());

        let hash = contract.submit_score(184).await.unwrap();

        assert_eq!(hash, signer.tx_hash);
        let sent = signer.sent.lock().unwrap();
        let tx = &sent[0];
        assert_eq!(tx.from(), Some(&account(7)));
        assert_eq!(tx.to_addr(), Some(&Address::repeat_byte(0x2a)));
        let data = tx.data().unwrap();
        assert_eq!(
            SubmitScoreCall::decode(data.as_ref()).unwrap().score,
            U256::from(184)
        );
    }

    #[tokio::test]
    async fn read_decodes_uint_result() {
        let signer = Arc::new(MockSigner::new(account(7)));
        signer.set_read(GetTotalGamesCall.encode(), Ok(U256::from(12)));
        let contract = contract_with(signer);

        assert_eq!(contract.read(ScoreQuery::TotalGames).await.unwrap(), 12);
        assert!(contract.read(ScoreQuery::MyBest).await.is_err());
    }
}
