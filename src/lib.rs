//! Tournament awards: library with models, scoring logic and the award store.

pub mod config;
pub mod error;
pub mod events;
pub mod logic;
pub mod models;
pub mod store;

pub use config::{DecayConfig, DuplicatePolicy, PlacementPoints, ScoringConfig};
pub use error::{FinalizeError, StoreError};
pub use events::{event_channel, CompletionEvent, EventReceiver, EventSender};
pub use logic::{
    compute_awards, decay, import_results, level_from_points, parse_results_csv, rank,
    reconstruct, FinalizeOutcome, FinalizeReport, Finalizer, ImportError,
};
pub use models::{
    CompetitiveProfile, HighlightedWin, HistoryEntry, MatchResult, Participant, ParticipantStatus,
    PointsAward, PointsBreakdown, Tournament, TournamentError, TournamentId, TournamentStatus,
    UserId, Versioned,
};
pub use store::{AwardCommit, AwardStore, CommitOutcome, InMemoryStore, ProfileWrite};
