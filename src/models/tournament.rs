//! Tournament and TournamentStatus.

use crate::models::award::PointsAward;
use crate::models::match_result::MatchResult;
use crate::models::participant::{Participant, ParticipantStatus, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur while building up a tournament (registration and result ingestion).
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Tournament is not in a state that allows this action.
    #[error("invalid state for this action: tournament is {0:?}")]
    InvalidState(TournamentStatus),
    /// Points were already awarded; results and participants are frozen.
    #[error("tournament has already been awarded")]
    AlreadyAwarded,
    /// The user is already registered.
    #[error("user {0} is already a participant")]
    DuplicateParticipant(UserId),
    /// The user is not a participant of this tournament.
    #[error("user {0} is not a participant")]
    ParticipantNotFound(UserId),
    /// Need at least 2 participants with a user reference to start.
    #[error("need at least 2 participants to start (have {found})")]
    NotEnoughParticipants { found: usize },
    /// Result is structurally invalid (same player twice, round 0, foreign winner).
    #[error("invalid result: {0}")]
    InvalidResult(&'static str),
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Lifecycle of a tournament as seen by the surrounding platform.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting participants; no matches yet.
    #[default]
    Registration,
    /// Matches are being played and results reported.
    Ongoing,
    /// Finished. Points are awarded exactly once.
    Completed,
    Cancelled,
}

/// Full tournament record: entrants, reported results and, once finalized, the awards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// Game tag, e.g. "sf6".
    pub game: String,
    pub organizer_id: UserId,
    pub status: TournamentStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub participants: Vec<Participant>,
    pub results: Vec<MatchResult>,
    /// Set exactly once, together with `points_awards`.
    pub awarded_at: Option<DateTime<Utc>>,
    pub points_awards: Vec<PointsAward>,
}

impl Tournament {
    /// Create a new tournament in Registration with no participants.
    pub fn new(
        name: impl Into<String>,
        game: impl Into<String>,
        organizer_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            game: game.into(),
            organizer_id,
            status: TournamentStatus::Registration,
            created_at,
            completed_at: None,
            participants: Vec::new(),
            results: Vec::new(),
            awarded_at: None,
            points_awards: Vec::new(),
        }
    }

    /// Awarded once `awarded_at` is set or any award has been stored.
    pub fn is_awarded(&self) -> bool {
        self.awarded_at.is_some() || !self.points_awards.is_empty()
    }

    /// Participants that reference a user, with their user id.
    pub fn user_participants(&self) -> impl Iterator<Item = (UserId, ParticipantStatus)> + '_ {
        self.participants
            .iter()
            .filter_map(|p| p.user_id.map(|id| (id, p.status)))
    }

    pub fn participant(&self, user_id: UserId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.user_id == Some(user_id))
    }

    /// Register a user (Registration or Ongoing). Users are unique.
    pub fn add_participant(&mut self, user_id: UserId) -> Result<(), TournamentError> {
        self.ensure_open()?;
        if self.participant(user_id).is_some() {
            return Err(TournamentError::DuplicateParticipant(user_id));
        }
        self.participants.push(Participant::new(user_id));
        Ok(())
    }

    /// Remove a participant (only valid in Registration).
    pub fn remove_participant(&mut self, user_id: UserId) -> Result<(), TournamentError> {
        if self.status != TournamentStatus::Registration {
            return Err(TournamentError::InvalidState(self.status));
        }
        let idx = self
            .participants
            .iter()
            .position(|p| p.user_id == Some(user_id))
            .ok_or(TournamentError::ParticipantNotFound(user_id))?;
        self.participants.remove(idx);
        Ok(())
    }

    /// Change a participant's status (e.g. disqualify). Frozen once awarded.
    pub fn set_participant_status(
        &mut self,
        user_id: UserId,
        status: ParticipantStatus,
    ) -> Result<(), TournamentError> {
        self.ensure_open()?;
        let p = self
            .participants
            .iter_mut()
            .find(|p| p.user_id == Some(user_id))
            .ok_or(TournamentError::ParticipantNotFound(user_id))?;
        p.status = status;
        Ok(())
    }

    /// Registration -> Ongoing. Needs 2 participants with a user reference.
    pub fn start(&mut self) -> Result<(), TournamentError> {
        if self.status != TournamentStatus::Registration {
            return Err(TournamentError::InvalidState(self.status));
        }
        let found = self.user_participants().count();
        if found < 2 {
            return Err(TournamentError::NotEnoughParticipants { found });
        }
        self.status = TournamentStatus::Ongoing;
        Ok(())
    }

    /// Validate and append a result (Ongoing only). Malformed results never reach the engine.
    pub fn record_result(&mut self, result: MatchResult) -> Result<(), TournamentError> {
        if self.is_awarded() {
            return Err(TournamentError::AlreadyAwarded);
        }
        if self.status != TournamentStatus::Ongoing {
            return Err(TournamentError::InvalidState(self.status));
        }
        if result.round == 0 {
            return Err(TournamentError::InvalidResult("round must be 1 or higher"));
        }
        if result.player_a == result.player_b {
            return Err(TournamentError::InvalidResult("a player cannot face themselves"));
        }
        if !result.is_well_formed() {
            return Err(TournamentError::InvalidResult(
                "winner must be one of the two players",
            ));
        }
        for player in [result.player_a, result.player_b] {
            if self.participant(player).is_none() {
                return Err(TournamentError::ParticipantNotFound(player));
            }
        }
        self.results.push(result);
        Ok(())
    }

    /// Cancel a tournament that has not been awarded.
    pub fn cancel(&mut self) -> Result<(), TournamentError> {
        self.ensure_open()?;
        self.status = TournamentStatus::Cancelled;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), TournamentError> {
        if self.is_awarded() {
            return Err(TournamentError::AlreadyAwarded);
        }
        match self.status {
            TournamentStatus::Registration | TournamentStatus::Ongoing => Ok(()),
            other => Err(TournamentError::InvalidState(other)),
        }
    }
}
