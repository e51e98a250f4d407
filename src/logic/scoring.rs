//! Score composition: placement base, win points, difficulty bonus, penalties and decay.

use crate::config::{PlacementPoints, ScoringConfig};
use crate::logic::bracket::PlayerRecord;
use crate::logic::decay::decay;
use crate::logic::level::{level_from_points, round2};
use crate::models::{
    CompetitiveProfile, HighlightedWin, ParticipantStatus, PointsAward, PointsBreakdown, Tournament,
    UserId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Computed outcome for one participant, before anything is persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticipantScore {
    pub user_id: UserId,
    pub placement: u32,
    pub wins: u32,
    pub losses: u32,
    pub avg_difficulty: f64,
    pub breakdown: PointsBreakdown,
    pub old_points: f64,
    pub new_points: f64,
    pub old_level: u32,
    pub new_level: u32,
    /// Positive amount lost to inactivity.
    pub decay_loss: f64,
    pub highlights: Vec<HighlightedWin>,
}

impl ParticipantScore {
    pub fn delta(&self) -> f64 {
        self.breakdown.total
    }

    pub fn to_award(&self) -> PointsAward {
        PointsAward {
            user_id: self.user_id,
            placement: self.placement,
            wins: self.wins,
            losses: self.losses,
            avg_difficulty: self.avg_difficulty,
            delta: self.breakdown.total,
            breakdown: self.breakdown,
        }
    }
}

/// Step function of the elimination round relative to the bracket depth.
pub fn base_placement_points(lost_round: u32, total_rounds: u32, table: &PlacementPoints) -> f64 {
    if lost_round > total_rounds {
        table.champion
    } else if lost_round == total_rounds {
        table.finalist
    } else if lost_round.saturating_add(1) == total_rounds {
        table.semifinalist
    } else if lost_round.saturating_add(2) == total_rounds {
        table.quarterfinalist
    } else {
        table.other
    }
}

pub fn penalty_for(status: ParticipantStatus, config: &ScoringConfig) -> f64 {
    match status {
        ParticipantStatus::Disqualified => config.disqualified_penalty,
        ParticipantStatus::Expelled => config.expelled_penalty,
        ParticipantStatus::Registered | ParticipantStatus::Waiting => 0.0,
    }
}

/// Pre-award profile snapshot for every user the bracket mentions.
pub struct ScoringContext<'a> {
    pub tournament: &'a Tournament,
    pub total_rounds: u32,
    pub profiles: &'a HashMap<UserId, CompetitiveProfile>,
    pub completed_at: DateTime<Utc>,
    pub config: &'a ScoringConfig,
}

impl ScoringContext<'_> {
    fn level_of(&self, user_id: UserId) -> u32 {
        self.profiles
            .get(&user_id)
            .map(CompetitiveProfile::effective_level)
            .unwrap_or(1)
    }

    /// Score one ranked participant.
    pub fn score(&self, user_id: UserId, placement: u32, record: &PlayerRecord) -> ParticipantScore {
        let config = self.config;
        let default_profile = CompetitiveProfile::default();
        let profile = self.profiles.get(&user_id).unwrap_or(&default_profile);
        let own_level = profile.effective_level();
        let own = f64::from(own_level.max(1));

        let avg_opponent_level = if record.opponents.is_empty() {
            f64::from(own_level)
        } else {
            let sum: f64 = record
                .opponents
                .iter()
                .map(|&o| f64::from(self.level_of(o)))
                .sum();
            sum / record.opponents.len() as f64
        };
        let base_weight =
            (avg_opponent_level / own).clamp(config.base_weight_min, config.base_weight_max);
        let base_placement = round2(
            base_placement_points(record.lost_round, self.total_rounds, &config.placement)
                * base_weight,
        );

        let defeated_levels: Vec<u32> = record
            .defeated
            .iter()
            .map(|d| self.level_of(d.opponent))
            .collect();
        let wins_points = round2(
            defeated_levels
                .iter()
                .map(|&lvl| {
                    config.win_points
                        * (f64::from(lvl) / own).clamp(config.win_ratio_min, config.win_ratio_max)
                })
                .sum(),
        );
        let difficulty_avg = if defeated_levels.is_empty() {
            0.0
        } else {
            let sum: f64 = defeated_levels
                .iter()
                .map(|&lvl| {
                    (f64::from(lvl) - f64::from(own_level))
                        .max(0.0)
                        .clamp(0.0, config.difficulty_cap)
                })
                .sum();
            sum / defeated_levels.len() as f64
        };
        let difficulty_points = round2(difficulty_avg * config.difficulty_multiplier);

        let penalties = round2(penalty_for(record.status, config));
        let decay_loss = round2(decay(
            profile.points,
            profile.last_competitive_at,
            self.completed_at,
            &config.decay,
        ));

        let decay_term = if decay_loss > 0.0 { -decay_loss } else { 0.0 };
        let total = round2(base_placement + wins_points + difficulty_points + penalties - decay_loss);
        let breakdown = PointsBreakdown {
            base_placement,
            wins_points,
            difficulty_points,
            penalties,
            decay: decay_term,
            total,
        };

        let new_points = round2(profile.points + total).max(0.0);
        let new_level = level_from_points(new_points);

        let highlights = record
            .defeated
            .iter()
            .zip(&defeated_levels)
            .filter(|(_, lvl)| **lvl >= own_level.saturating_add(config.upset_level_gap))
            .filter(|(d, _)| !profile.has_highlight(self.tournament.id, d.opponent))
            .map(|(d, &lvl)| HighlightedWin {
                tournament_id: self.tournament.id,
                tournament_name: self.tournament.name.clone(),
                opponent_id: d.opponent,
                opponent_level: lvl,
                own_level,
                round: d.round,
                recorded_at: self.completed_at,
            })
            .collect();

        log::debug!(
            "Scored {} placement={} delta={} (base={} wins={} difficulty={} penalties={} decay={})",
            user_id,
            placement,
            total,
            base_placement,
            wins_points,
            difficulty_points,
            penalties,
            decay_term
        );

        ParticipantScore {
            user_id,
            placement,
            wins: record.wins,
            losses: record.losses,
            avg_difficulty: round2(difficulty_avg),
            breakdown,
            old_points: profile.points,
            new_points,
            old_level: own_level,
            new_level,
            decay_loss,
            highlights,
        }
    }
}
