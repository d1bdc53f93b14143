use serde::Serialize;

use crate::error::{AppError, Result};

/// Inclusive bounds for a plausible reaction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreLimits {
    pub min_ms: u64,
    pub max_ms: u64,
}

/// Reaction time in milliseconds, already checked against [`ScoreLimits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScoreValue(u64);

impl ScoreValue {
    pub fn new(raw: i64, limits: &ScoreLimits) -> Result<Self> {
        let millis = u64::try_from(raw)
            .map_err(|_| AppError::InvalidScore(format!("{}ms is negative", raw)))?;
        if millis < limits.min_ms || millis > limits.max_ms {
            return Err(AppError::InvalidScore(format!(
                "{}ms is outside {}..={}ms",
                millis, limits.min_ms, limits.max_ms
            )));
        }
        Ok(Self(millis))
    }

    pub fn millis(self) -> u64 {
        self.0
    }
}

/// Read-only figures shown next to the game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreStats {
    pub my_best_score: Option<u64>,
    pub global_best_score: Option<u64>,
    pub total_games: Option<u64>,
}
