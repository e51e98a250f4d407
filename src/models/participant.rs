//! Participant and ParticipantStatus.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user (used in results, profiles and rankings).
pub type UserId = Uuid;

/// Registration status of a participant inside one tournament.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    #[default]
    Registered,
    Waiting,
    Disqualified,
    Expelled,
}

impl ParticipantStatus {
    /// Disqualified or expelled: only scored (with a penalty) if they played.
    pub fn is_removed(self) -> bool {
        matches!(self, ParticipantStatus::Disqualified | ParticipantStatus::Expelled)
    }
}

/// A tournament entry. `user_id` is `None` for placeholder slots (e.g. a deleted account).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: Option<UserId>,
    pub status: ParticipantStatus,
}

impl Participant {
    /// A registered participant for the given user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            status: ParticipantStatus::Registered,
        }
    }
}
