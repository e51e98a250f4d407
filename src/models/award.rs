//! PointsAward and its breakdown: the immutable per-participant result of finalization.

use crate::models::participant::UserId;
use serde::{Deserialize, Serialize};

/// Every term of a point delta, each already rounded to 2 decimals.
/// `decay` is stored as a negative number (or zero); `total` equals the delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointsBreakdown {
    pub base_placement: f64,
    pub wins_points: f64,
    pub difficulty_points: f64,
    pub penalties: f64,
    pub decay: f64,
    pub total: f64,
}

/// Award for one participant in one tournament.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointsAward {
    pub user_id: UserId,
    /// 1 = champion.
    pub placement: u32,
    pub wins: u32,
    pub losses: u32,
    /// Mean of the clamped level gaps over first-time-defeated opponents.
    pub avg_difficulty: f64,
    pub delta: f64,
    pub breakdown: PointsBreakdown,
}
