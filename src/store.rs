//! Persistence seam for finalization, plus the in-memory store used by the web binary.

use crate::error::StoreError;
use crate::models::{
    CompetitiveProfile, PointsAward, Tournament, TournamentError, TournamentId, TournamentStatus,
    UserId, Versioned,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One staged profile write, valid only if the stored version still matches.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileWrite {
    pub user_id: UserId,
    pub expected_version: u64,
    pub profile: CompetitiveProfile,
}

/// Everything a finalization writes, applied all-or-nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct AwardCommit {
    pub tournament_id: TournamentId,
    pub expected_tournament_version: u64,
    pub awards: Vec<PointsAward>,
    pub awarded_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub profiles: Vec<ProfileWrite>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommitOutcome {
    Committed,
    /// Someone else awarded first; these are their stored awards and nothing was written.
    AlreadyAwarded(Vec<PointsAward>),
}

/// Storage collaborator for the finalizer.
///
/// `commit_award` must be conditional on the tournament not being awarded and on
/// every version in the commit, and must write either everything or nothing.
pub trait AwardStore {
    fn load_tournament(&self, id: TournamentId) -> Result<Versioned<Tournament>, StoreError>;

    /// Unknown users come back as a default profile at version 0.
    fn load_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, Versioned<CompetitiveProfile>>, StoreError>;

    fn commit_award(&self, commit: AwardCommit) -> Result<CommitOutcome, StoreError>;
}

impl<S: AwardStore + ?Sized> AwardStore for Arc<S> {
    fn load_tournament(&self, id: TournamentId) -> Result<Versioned<Tournament>, StoreError> {
        (**self).load_tournament(id)
    }

    fn load_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, Versioned<CompetitiveProfile>>, StoreError> {
        (**self).load_profiles(ids)
    }

    fn commit_award(&self, commit: AwardCommit) -> Result<CommitOutcome, StoreError> {
        (**self).commit_award(commit)
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    tournaments: HashMap<TournamentId, Versioned<Tournament>>,
    profiles: HashMap<UserId, Versioned<CompetitiveProfile>>,
}

/// Tournaments and profiles behind one lock. Every mutation bumps the record's version.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreInner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreInner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    /// Insert or replace a tournament (version starts at 1).
    pub fn insert_tournament(&self, tournament: Tournament) -> Result<(), StoreError> {
        let mut g = self.write()?;
        let version = g
            .tournaments
            .get(&tournament.id)
            .map_or(1, |existing| existing.version + 1);
        g.tournaments
            .insert(tournament.id, Versioned::new(version, tournament));
        Ok(())
    }

    pub fn tournament(&self, id: TournamentId) -> Result<Tournament, StoreError> {
        self.load_tournament(id).map(|v| v.value)
    }

    /// Apply an edit to a stored tournament. The version only moves if the edit succeeds.
    pub fn update_tournament<R>(
        &self,
        id: TournamentId,
        edit: impl FnOnce(&mut Tournament) -> Result<R, TournamentError>,
    ) -> Result<Result<R, TournamentError>, StoreError> {
        let mut g = self.write()?;
        let entry = g
            .tournaments
            .get_mut(&id)
            .ok_or(StoreError::TournamentNotFound(id))?;
        let mut draft = entry.value.clone();
        let outcome = edit(&mut draft);
        if outcome.is_ok() {
            entry.value = draft;
            entry.version += 1;
        }
        Ok(outcome)
    }

    pub fn profile(&self, user_id: UserId) -> Result<CompetitiveProfile, StoreError> {
        let g = self.read()?;
        Ok(g.profiles
            .get(&user_id)
            .map(|v| v.value.clone())
            .unwrap_or_default())
    }

    /// Overwrite a profile (admin seeding). Bumps the version.
    pub fn put_profile(&self, user_id: UserId, profile: CompetitiveProfile) -> Result<(), StoreError> {
        let mut g = self.write()?;
        let entry = g.profiles.entry(user_id).or_default();
        entry.version += 1;
        entry.value = profile;
        Ok(())
    }
}

impl AwardStore for InMemoryStore {
    fn load_tournament(&self, id: TournamentId) -> Result<Versioned<Tournament>, StoreError> {
        let g = self.read()?;
        g.tournaments
            .get(&id)
            .cloned()
            .ok_or(StoreError::TournamentNotFound(id))
    }

    fn load_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, Versioned<CompetitiveProfile>>, StoreError> {
        let g = self.read()?;
        Ok(ids
            .iter()
            .map(|id| (*id, g.profiles.get(id).cloned().unwrap_or_default()))
            .collect())
    }

    fn commit_award(&self, commit: AwardCommit) -> Result<CommitOutcome, StoreError> {
        let mut g = self.write()?;
        let inner = &mut *g;

        let tournament = inner
            .tournaments
            .get(&commit.tournament_id)
            .ok_or(StoreError::TournamentNotFound(commit.tournament_id))?;
        if tournament.value.is_awarded() {
            return Ok(CommitOutcome::AlreadyAwarded(
                tournament.value.points_awards.clone(),
            ));
        }
        if tournament.version != commit.expected_tournament_version {
            return Err(StoreError::VersionConflict {
                record: format!("tournament {}", commit.tournament_id),
            });
        }
        for write in &commit.profiles {
            let current = inner.profiles.get(&write.user_id).map_or(0, |p| p.version);
            if current != write.expected_version {
                return Err(StoreError::VersionConflict {
                    record: format!("profile {}", write.user_id),
                });
            }
        }

        // All checks passed; nothing below can fail.
        for write in commit.profiles {
            let entry = inner.profiles.entry(write.user_id).or_default();
            entry.version += 1;
            entry.value = write.profile;
        }
        if let Some(entry) = inner.tournaments.get_mut(&commit.tournament_id) {
            let t = &mut entry.value;
            t.points_awards = commit.awards;
            t.awarded_at = Some(commit.awarded_at);
            t.status = TournamentStatus::Completed;
            t.completed_at.get_or_insert(commit.completed_at);
            entry.version += 1;
        }
        Ok(CommitOutcome::Committed)
    }
}
