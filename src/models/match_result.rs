//! MatchResult: one reported bracket match.

use crate::models::participant::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single 1v1 bracket match as reported by the organizer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 1-based bracket round.
    pub round: u32,
    pub player_a: UserId,
    pub player_b: UserId,
    /// None if not yet decided.
    pub winner: Option<UserId>,
    /// Free-form score such as "3-1".
    #[serde(default)]
    pub score: Option<String>,
    pub reported_at: DateTime<Utc>,
}

impl MatchResult {
    pub fn new(
        round: u32,
        player_a: UserId,
        player_b: UserId,
        winner: Option<UserId>,
        reported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            round,
            player_a,
            player_b,
            winner,
            score: None,
            reported_at,
        }
    }

    /// The pair in a fixed order so (a, b) and (b, a) group together.
    pub fn unordered_pair(&self) -> (UserId, UserId) {
        if self.player_a <= self.player_b {
            (self.player_a, self.player_b)
        } else {
            (self.player_b, self.player_a)
        }
    }

    /// Structural validity: two distinct players, round ≥ 1, winner (if any) is one of them.
    pub fn is_well_formed(&self) -> bool {
        self.round >= 1
            && self.player_a != self.player_b
            && self
                .winner
                .map_or(true, |w| w == self.player_a || w == self.player_b)
    }

    /// (winner, loser) when the match has a determinate, valid winner.
    pub fn outcome(&self) -> Option<(UserId, UserId)> {
        match self.winner {
            Some(w) if w == self.player_a => Some((self.player_a, self.player_b)),
            Some(w) if w == self.player_b => Some((self.player_b, self.player_a)),
            _ => None,
        }
    }

    /// The other player, if `user` played this match.
    pub fn opponent_of(&self, user: UserId) -> Option<UserId> {
        if self.player_a == user {
            Some(self.player_b)
        } else if self.player_b == user {
            Some(self.player_a)
        } else {
            None
        }
    }
}
