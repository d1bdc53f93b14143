use chrono::Utc;
use ethers::types::{Address, U64};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use super::score_contract::{ScoreContract, ScoreQuery};
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::error::{AppError, Result};
use crate::models::{ScoreLimits, ScoreStats, ScoreValue, TransactionRecord, TxStatus};
use crate::wallet::SigningCapability;

/// Submits scores on-chain and tracks the latest transaction.
pub struct ScoreSubmission {
    contract_address: Address,
    confirmations: usize,
    limits: ScoreLimits,
    record: watch::Sender<TransactionRecord>,
    transitions: broadcast::Sender<TransactionRecord>,
    in_flight: Arc<AtomicBool>,
}

struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ScoreSubmission {
    pub fn new(contract_address: Address, confirmations: usize, limits: ScoreLimits) -> Self {
        let (record, _) = watch::channel(TransactionRecord::default());
        let (transitions, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            contract_address,
            confirmations: confirmations.max(1),
            limits,
            record,
            transitions,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn record(&self) -> TransactionRecord {
        self.record.borrow().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn watch(&self) -> watch::Receiver<TransactionRecord> {
        self.record.subscribe()
    }

    /// Every record transition, in order.
    pub fn transitions(&self) -> broadcast::Receiver<TransactionRecord> {
        self.transitions.subscribe()
    }

    /// Sends `score` to the contract and waits for inclusion.
    ///
    /// Tracking runs on its own task, so the record still reaches a terminal
    /// state when the caller stops waiting. The record is already `failed`
    /// when this returns an error from the contract or the network.
    pub async fn submit(
        self: &Arc<Self>,
        score: i64,
        capability: Option<&SigningCapability>,
    ) -> Result<TransactionRecord> {
        let Some(capability) = capability else {
            tracing::warn!("Score submission attempted without a connected wallet");
            return Err(AppError::NotConnected);
        };
        let score = ScoreValue::new(score, &self.limits)?;
        let guard = self.begin()?;

        let submission = Arc::clone(self);
        let capability = capability.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            submission.run(score, &capability).await
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                let err = AppError::Internal(format!("Score submission task failed: {}", e));
                self.fail_outstanding(&err);
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        score: ScoreValue,
        capability: &SigningCapability,
    ) -> Result<TransactionRecord> {
        let mut record = TransactionRecord::prepared(score.millis());
        self.publish(&record);
        record.status = TxStatus::Pending;
        record.submitted_at = Some(Utc::now());
        self.publish(&record);

        tracing::info!(
            "Submitting score {}ms from {:?}",
            score.millis(),
            capability.account()
        );
        let contract = ScoreContract::new(self.contract_address, capability.signer().clone());

        match self.track(&contract, score, &mut record).await {
            Ok(()) => Ok(record),
            Err(err) => {
                tracing::error!("Failed to submit score: {}", err);
                record.status = TxStatus::Failed;
                record.error = Some(err.to_string());
                self.publish(&record);
                Err(err)
            }
        }
    }

    async fn track(
        &self,
        contract: &ScoreContract,
        score: ScoreValue,
        record: &mut TransactionRecord,
    ) -> Result<()> {
        let tx_hash = contract.submit_score(score.millis()).await?;
        record.tx_hash = Some(tx_hash);
        self.publish(record);
        tracing::info!("Score submission pending: {:?}", tx_hash);

        let receipt = contract
            .wait_for_receipt(tx_hash, self.confirmations)
            .await?
            .ok_or_else(|| {
                AppError::TransportError(format!(
                    "Transaction {:?} dropped before inclusion",
                    tx_hash
                ))
            })?;
        record.block_number = receipt.block_number.map(|n| n.as_u64());

        if receipt.status != Some(U64::from(1)) {
            return Err(AppError::TransactionFailed(format!(
                "Transaction {:?} reverted in block {}",
                tx_hash,
                record
                    .block_number
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            )));
        }

        record.status = TxStatus::Confirmed;
        self.publish(record);
        tracing::info!(
            "Score {}ms recorded on-chain in block {:?}",
            score.millis(),
            record.block_number
        );
        Ok(())
    }

    /// Clears the record once the latest submission has finished.
    pub fn reset(&self) -> Result<()> {
        let _guard = self.begin().inspect_err(|_| {
            tracing::warn!("Refusing to reset transaction state while a submission is outstanding");
        })?;
        self.publish(&TransactionRecord::default());
        Ok(())
    }

    pub async fn query_my_best_score(&self, capability: Option<&SigningCapability>) -> Option<u64> {
        self.query(ScoreQuery::MyBest, capability).await
    }

    pub async fn query_global_best_score(
        &self,
        capability: Option<&SigningCapability>,
    ) -> Option<u64> {
        self.query(ScoreQuery::GlobalBest, capability).await
    }

    pub async fn query_total_games(&self, capability: Option<&SigningCapability>) -> Option<u64> {
        self.query(ScoreQuery::TotalGames, capability).await
    }

    pub async fn stats(&self, capability: Option<&SigningCapability>) -> ScoreStats {
        let (my_best_score, global_best_score, total_games) = futures_util::future::join3(
            self.query_my_best_score(capability),
            self.query_global_best_score(capability),
            self.query_total_games(capability),
        )
        .await;

        ScoreStats {
            my_best_score,
            global_best_score,
            total_games,
        }
    }

    async fn query(
        &self,
        query: ScoreQuery,
        capability: Option<&SigningCapability>,
    ) -> Option<u64> {
        let capability = capability?;
        let contract = ScoreContract::new(self.contract_address, capability.signer().clone());
        match contract.read(query).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", query, e);
                None
            }
        }
    }

    fn begin(&self) -> Result<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| AppError::SubmissionInProgress)?;
        Ok(InFlightGuard(Arc::clone(&self.in_flight)))
    }

    fn fail_outstanding(&self, err: &AppError) {
        let mut record = self.record();
        if record.status.is_terminal() || record.status == TxStatus::Idle {
            return;
        }
        record.status = TxStatus::Failed;
        record.error = Some(err.to_string());
        self.publish(&record);
    }

    fn publish(&self, record: &TransactionRecord) {
        self.record.send_replace(record.clone());
        let _ = self.transitions.send(record.clone());
    }
}
