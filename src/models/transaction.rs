use chrono::{DateTime, Utc};
use ethers::types::TxHash;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    #[default]
    Idle,
    Pending,
    Confirmed,
    Failed,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TxStatus::Confirmed | TxStatus::Failed)
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxStatus::Idle => "idle",
            TxStatus::Pending => "pending",
            TxStatus::Confirmed => "confirmed",
            TxStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One score submission as seen by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub status: TxStatus,
    pub tx_hash: Option<TxHash>,
    pub score: u64,
    pub error: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub block_number: Option<u64>,
}

impl TransactionRecord {
    pub fn prepared(score: u64) -> Self {
        Self {
            score,
            ..Self::default()
        }
    }

    pub fn tx_hash_hex(&self) -> Option<String> {
        self.tx_hash.map(|hash| format!("{:#x}", hash))
    }
}
