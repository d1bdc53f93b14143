// Score services
pub mod score_contract;
pub mod score_submission;

// Re-export for convenience
pub use score_submission::ScoreSubmission;
