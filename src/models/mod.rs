//! Data structures: tournaments, participants, results, competitive profiles and awards.

mod award;
mod match_result;
mod participant;
mod profile;
mod tournament;

pub use award::{PointsAward, PointsBreakdown};
pub use match_result::MatchResult;
pub use participant::{Participant, ParticipantStatus, UserId};
pub use profile::{CompetitiveProfile, HighlightedWin, HistoryEntry, Versioned};
pub use tournament::{Tournament, TournamentError, TournamentId, TournamentStatus};
