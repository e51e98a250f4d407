//! CompetitiveProfile, its history records, and the versioned wrapper used by stores.

use crate::logic::level_from_points;
use crate::models::award::PointsBreakdown;
use crate::models::participant::UserId;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tournament outcome in a profile's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub tournament_id: TournamentId,
    pub tournament_name: String,
    pub game: String,
    pub placement: u32,
    pub wins: u32,
    pub losses: u32,
    pub delta: f64,
    pub breakdown: PointsBreakdown,
    pub points_after: f64,
    pub level_after: u32,
    pub recorded_at: DateTime<Utc>,
}

/// An upset: a first-time win against an opponent at least a few levels above.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HighlightedWin {
    pub tournament_id: TournamentId,
    pub tournament_name: String,
    pub opponent_id: UserId,
    pub opponent_level: u32,
    pub own_level: u32,
    pub round: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Per-user competitive state. Only the award step mutates it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveProfile {
    pub points: f64,
    /// Stored level; derived from points when absent.
    #[serde(default)]
    pub level: Option<u32>,
    pub wins: u32,
    pub losses: u32,
    pub tournaments_played: u32,
    #[serde(default)]
    pub last_competitive_at: Option<DateTime<Utc>>,
    /// Total points ever lost to inactivity.
    pub decay_total: f64,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub highlighted_wins: Vec<HighlightedWin>,
}

impl CompetitiveProfile {
    pub fn with_points(points: f64) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Stored level if present, else derived from points; never below 1.
    pub fn effective_level(&self) -> u32 {
        self.level
            .unwrap_or_else(|| level_from_points(self.points))
            .max(1)
    }

    /// Whether this tournament already left a trace in the history.
    pub fn has_history_for(&self, tournament_id: TournamentId) -> bool {
        self.history.iter().any(|h| h.tournament_id == tournament_id)
    }

    pub fn has_highlight(&self, tournament_id: TournamentId, opponent_id: UserId) -> bool {
        self.highlighted_wins
            .iter()
            .any(|h| h.tournament_id == tournament_id && h.opponent_id == opponent_id)
    }
}

/// A stored record plus its optimistic concurrency token.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }
}
