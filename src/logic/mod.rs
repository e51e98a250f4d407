//! Finalization logic: levels, decay, bracket reconstruction, ranking, scoring and awarding.

mod bracket;
mod decay;
mod finalize;
mod import;
mod level;
mod placement;
mod scoring;

pub use bracket::{bracket_depth, dedupe_results, reconstruct, BracketSummary, Defeat, PlayerRecord};
pub use decay::decay;
pub use finalize::{
    apply_score, check_finalizable, compute_awards, AwardPlan, FinalizeOutcome, FinalizeReport,
    Finalizer,
};
pub use import::{import_results, parse_results_csv, ImportError};
pub use level::{level_from_points, round2, POINTS_PER_LEVEL};
pub use placement::rank;
pub use scoring::{base_placement_points, penalty_for, ParticipantScore, ScoringContext};
