//! Notifications emitted after a successful award commit.

use crate::models::{TournamentId, UserId};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletionEvent {
    TournamentCompleted {
        tournament_id: TournamentId,
        user_id: UserId,
        placement: u32,
        delta: f64,
    },
    LevelUp {
        user_id: UserId,
        old_level: u32,
        new_level: u32,
    },
}

pub type EventSender = UnboundedSender<CompletionEvent>;
pub type EventReceiver = UnboundedReceiver<CompletionEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
