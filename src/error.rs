use crate::models::{TournamentId, TournamentStatus};

/// Failures reported by an [`AwardStore`](crate::store::AwardStore).
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    /// A record changed between snapshot and commit; nothing was written.
    #[error("concurrent modification of {record}")]
    VersionConflict { record: String },

    #[error("tournament {0} not found")]
    TournamentNotFound(TournamentId),

    /// Backend unreachable or the write was refused; nothing was written.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Why a tournament could not be finalized.
///
/// An already awarded tournament is not an error; see
/// [`FinalizeOutcome::AlreadyAwarded`](crate::logic::FinalizeOutcome::AlreadyAwarded).
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum FinalizeError {
    #[error("tournament {0} not found")]
    TournamentNotFound(TournamentId),

    /// Only ongoing (or completed but not yet awarded) tournaments can be finalized.
    #[error("tournament cannot be finalized while {status:?}")]
    NotFinalizable { status: TournamentStatus },

    #[error("at least 2 participants are required to award points (found {found})")]
    InsufficientParticipants { found: usize },

    #[error("no decided result in the final round ({final_round}); there is no champion")]
    NoChampionDetermined { final_round: u32 },

    /// Commit failed; no award marker was set. Safe to retry.
    #[error("failed to persist awards: {0}")]
    Persistence(#[from] StoreError),
}

impl FinalizeError {
    /// Persistence failures may be retried; precondition failures need the data fixed first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FinalizeError::Persistence(_))
    }
}
