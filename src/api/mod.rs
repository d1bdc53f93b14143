// src/api/mod.rs

pub mod health;
pub mod score;
pub mod wallet;

use std::sync::Arc;

use crate::config::Config;
use crate::services::ScoreSubmission;
use crate::wallet::WalletSession;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub wallet: Arc<WalletSession>,
    pub submission: Arc<ScoreSubmission>,
}
