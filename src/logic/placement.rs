//! Placement ranking.

use crate::logic::bracket::PlayerRecord;
use crate::models::UserId;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Rank by elimination round (desc), wins (desc), then user id (asc).
/// Anyone who never met an opponent sorts below everyone who did.
/// Returns `(user, placement)` with placements `1..=n`, champion first.
pub fn rank(records: &BTreeMap<UserId, PlayerRecord>) -> Vec<(UserId, u32)> {
    let mut ids: Vec<UserId> = records.keys().copied().collect();
    ids.sort_by_key(|id| {
        let r = &records[id];
        (Reverse(r.lost_round), Reverse(r.wins), Reverse(r.played()), *id)
    });
    ids.into_iter()
        .enumerate()
        .map(|(idx, id)| (id, idx as u32 + 1))
        .collect()
}
