//! Tournament finalization: guard, compute, and commit awards exactly once.

use crate::config::ScoringConfig;
use crate::error::{FinalizeError, StoreError};
use crate::events::{CompletionEvent, EventSender};
use crate::logic::bracket::{reconstruct, BracketSummary};
use crate::logic::placement::rank;
use crate::logic::scoring::{ParticipantScore, ScoringContext};
use crate::models::{
    CompetitiveProfile, HistoryEntry, PointsAward, Tournament, TournamentId, TournamentStatus,
    UserId,
};
use crate::store::{AwardCommit, AwardStore, CommitOutcome, ProfileWrite};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Computed awards for a tournament, nothing persisted yet.
#[derive(Clone, Debug)]
pub struct AwardPlan {
    pub bracket: BracketSummary,
    /// In placement order.
    pub scores: Vec<ParticipantScore>,
    pub completed_at: DateTime<Utc>,
}

impl AwardPlan {
    pub fn awards(&self) -> Vec<PointsAward> {
        self.scores.iter().map(ParticipantScore::to_award).collect()
    }
}

/// Check that a tournament may be finalized now. Does not look at results.
pub fn check_finalizable(tournament: &Tournament) -> Result<(), FinalizeError> {
    match tournament.status {
        TournamentStatus::Ongoing | TournamentStatus::Completed => Ok(()),
        status => Err(FinalizeError::NotFinalizable { status }),
    }
}

/// Pure finalization: rank everyone and compute each delta against a profile snapshot.
///
/// Callers must check `is_awarded` first; this function always computes.
pub fn compute_awards(
    tournament: &Tournament,
    profiles: &HashMap<UserId, CompetitiveProfile>,
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> Result<AwardPlan, FinalizeError> {
    check_finalizable(tournament)?;
    let bracket = reconstruct(tournament, config.duplicate_policy)?;
    let completed_at = tournament.completed_at.unwrap_or(now);

    let ctx = ScoringContext {
        tournament,
        total_rounds: bracket.total_rounds,
        profiles,
        completed_at,
        config,
    };
    let scores = rank(&bracket.records)
        .into_iter()
        .map(|(user_id, placement)| ctx.score(user_id, placement, &bracket.records[&user_id]))
        .collect();

    Ok(AwardPlan {
        bracket,
        scores,
        completed_at,
    })
}

/// The profile after this award. `None` if the tournament is already in its history.
pub fn apply_score(
    profile: &CompetitiveProfile,
    score: &ParticipantScore,
    tournament: &Tournament,
    completed_at: DateTime<Utc>,
) -> Option<CompetitiveProfile> {
    if profile.has_history_for(tournament.id) {
        return None;
    }
    let mut next = profile.clone();
    next.points = score.new_points;
    next.level = Some(score.new_level);
    next.wins += score.wins;
    next.losses += score.losses;
    next.tournaments_played += 1;
    next.last_competitive_at = Some(completed_at);
    next.decay_total += score.decay_loss;
    next.history.push(HistoryEntry {
        tournament_id: tournament.id,
        tournament_name: tournament.name.clone(),
        game: tournament.game.clone(),
        placement: score.placement,
        wins: score.wins,
        losses: score.losses,
        delta: score.delta(),
        breakdown: score.breakdown,
        points_after: score.new_points,
        level_after: score.new_level,
        recorded_at: completed_at,
    });
    next.highlighted_wins.extend(score.highlights.iter().cloned());
    Some(next)
}

/// Result of a successful commit.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalizeReport {
    pub tournament_id: TournamentId,
    pub awards: Vec<PointsAward>,
    /// Profiles as written, in placement order.
    pub profiles: Vec<(UserId, CompetitiveProfile)>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FinalizeOutcome {
    /// This call computed and committed the awards.
    Awarded(FinalizeReport),
    /// Awards already existed (earlier call or a concurrent winner); nothing was written.
    AlreadyAwarded(Vec<PointsAward>),
}

impl FinalizeOutcome {
    pub fn awards(&self) -> &[PointsAward] {
        match self {
            FinalizeOutcome::Awarded(report) => &report.awards,
            FinalizeOutcome::AlreadyAwarded(awards) => awards,
        }
    }

    pub fn was_awarded_now(&self) -> bool {
        matches!(self, FinalizeOutcome::Awarded(_))
    }
}

/// Runs finalization against a store: snapshot, guard, compute, conditional commit.
pub struct Finalizer<S> {
    store: S,
    config: ScoringConfig,
    events: Option<EventSender>,
}

impl<S: AwardStore> Finalizer<S> {
    pub fn new(store: S, config: ScoringConfig) -> Self {
        Self {
            store,
            config,
            events: None,
        }
    }

    /// Send completion and level-up events here after each successful commit.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Finalize a tournament. Repeated or concurrent calls return the first stored awards.
    pub fn finalize(
        &self,
        tournament_id: TournamentId,
        now: DateTime<Utc>,
    ) -> Result<FinalizeOutcome, FinalizeError> {
        let max_attempts = self.config.max_commit_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_finalize(tournament_id, now) {
                Err(FinalizeError::Persistence(StoreError::VersionConflict { record }))
                    if attempt < max_attempts =>
                {
                    log::warn!(
                        "Finalize {}: {} changed during commit, retrying ({}/{})",
                        tournament_id,
                        record,
                        attempt,
                        max_attempts
                    );
                }
                other => return other,
            }
        }
    }

    fn try_finalize(
        &self,
        tournament_id: TournamentId,
        now: DateTime<Utc>,
    ) -> Result<FinalizeOutcome, FinalizeError> {
        let snapshot = self
            .store
            .load_tournament(tournament_id)
            .map_err(|e| match e {
                StoreError::TournamentNotFound(id) => FinalizeError::TournamentNotFound(id),
                other => FinalizeError::Persistence(other),
            })?;
        let tournament = &snapshot.value;
        if tournament.is_awarded() {
            log::info!("Tournament {} already awarded; returning stored awards", tournament_id);
            return Ok(FinalizeOutcome::AlreadyAwarded(tournament.points_awards.clone()));
        }

        let user_ids: Vec<UserId> = tournament.user_participants().map(|(id, _)| id).collect();
        let versioned = self.store.load_profiles(&user_ids)?;
        let profiles: HashMap<UserId, CompetitiveProfile> = versioned
            .iter()
            .map(|(id, v)| (*id, v.value.clone()))
            .collect();

        let plan = compute_awards(tournament, &profiles, &self.config, now)?;

        let mut writes = Vec::with_capacity(plan.scores.len());
        for score in &plan.scores {
            let current = versioned.get(&score.user_id).cloned().unwrap_or_default();
            match apply_score(&current.value, score, tournament, plan.completed_at) {
                Some(profile) => writes.push(ProfileWrite {
                    user_id: score.user_id,
                    expected_version: current.version,
                    profile,
                }),
                None => log::warn!(
                    "Profile {} already records tournament {}; leaving it unchanged",
                    score.user_id,
                    tournament_id
                ),
            }
        }

        let awards = plan.awards();
        let commit = AwardCommit {
            tournament_id,
            expected_tournament_version: snapshot.version,
            awards: awards.clone(),
            awarded_at: now,
            completed_at: plan.completed_at,
            profiles: writes.clone(),
        };

        match self.store.commit_award(commit)? {
            CommitOutcome::AlreadyAwarded(existing) => {
                log::info!(
                    "Tournament {} was awarded concurrently; discarding this computation",
                    tournament_id
                );
                Ok(FinalizeOutcome::AlreadyAwarded(existing))
            }
            CommitOutcome::Committed => {
                log::info!(
                    "Tournament {} finalized: {} award(s), champion {}",
                    tournament_id,
                    awards.len(),
                    plan.bracket.champion
                );
                self.emit(tournament_id, &plan.scores);
                Ok(FinalizeOutcome::Awarded(FinalizeReport {
                    tournament_id,
                    awards,
                    profiles: writes.into_iter().map(|w| (w.user_id, w.profile)).collect(),
                }))
            }
        }
    }

    fn emit(&self, tournament_id: TournamentId, scores: &[ParticipantScore]) {
        let Some(events) = &self.events else {
            return;
        };
        for score in scores {
            let mut batch = vec![CompletionEvent::TournamentCompleted {
                tournament_id,
                user_id: score.user_id,
                placement: score.placement,
                delta: score.delta(),
            }];
            if score.new_level > score.old_level {
                batch.push(CompletionEvent::LevelUp {
                    user_id: score.user_id,
                    old_level: score.old_level,
                    new_level: score.new_level,
                });
            }
            for event in batch {
                if events.send(event).is_err() {
                    log::debug!("No event consumer attached; dropping completion events");
                    return;
                }
            }
        }
    }
}
