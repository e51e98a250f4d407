//! Bracket reconstruction: bracket depth, deduplicated results, per-player tallies and elimination round.

use crate::config::DuplicatePolicy;
use crate::error::FinalizeError;
use crate::models::{MatchResult, ParticipantStatus, Tournament, UserId};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// A first-time win over a given opponent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Defeat {
    pub opponent: UserId,
    pub round: u32,
}

/// Everything the bracket says about one participant.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PlayerRecord {
    pub status: ParticipantStatus,
    /// Every surviving decided match counts, including repeat legs.
    pub wins: u32,
    pub losses: u32,
    /// Highest round lost in; `total_rounds + 1` for the champion, 0 if never eliminated.
    pub lost_round: u32,
    /// Distinct opponents met in any surviving result.
    pub opponents: BTreeSet<UserId>,
    /// First-time defeats, in bracket order.
    pub defeated: Vec<Defeat>,
}

impl PlayerRecord {
    pub fn played(&self) -> bool {
        !self.opponents.is_empty()
    }
}

/// Result of reading a tournament's results as a single-elimination bracket.
#[derive(Clone, Debug)]
pub struct BracketSummary {
    pub slots: u32,
    pub total_rounds: u32,
    pub champion: UserId,
    /// Participants that take part in ranking, keyed by user.
    pub records: BTreeMap<UserId, PlayerRecord>,
    /// Results that survived validation and deduplication, in processing order.
    pub surviving: Vec<MatchResult>,
}

/// `slots = next_power_of_two(n)`, `total_rounds = log2(slots)`.
///
/// Counts beyond the largest `u32` power of two clamp to `2^31` slots.
pub fn bracket_depth(participants: usize) -> (u32, u32) {
    let slots = u32::try_from(participants.max(1))
        .ok()
        .and_then(u32::checked_next_power_of_two)
        .unwrap_or(1 << 31);
    (slots, slots.trailing_zeros())
}

/// Keep one result per (round, unordered pair). Invalid or foreign results are dropped.
///
/// Selection is by `(reported_at, input position)`: the minimum for
/// [`DuplicatePolicy::FirstReported`], the maximum for [`DuplicatePolicy::LastReported`].
/// The output is sorted by round, then report time, so later steps do not
/// depend on how the input was ordered.
pub fn dedupe_results(
    results: &[MatchResult],
    eligible: &HashSet<UserId>,
    policy: DuplicatePolicy,
) -> Vec<MatchResult> {
    let mut chosen: BTreeMap<(u32, UserId, UserId), usize> = BTreeMap::new();
    for (idx, result) in results.iter().enumerate() {
        if !result.is_well_formed() {
            log::warn!(
                "Skipping malformed result in round {} ({} vs {})",
                result.round,
                result.player_a,
                result.player_b
            );
            continue;
        }
        if !eligible.contains(&result.player_a) || !eligible.contains(&result.player_b) {
            log::warn!(
                "Skipping result in round {} for a non-participant ({} vs {})",
                result.round,
                result.player_a,
                result.player_b
            );
            continue;
        }
        let (low, high) = result.unordered_pair();
        let key = (result.round, low, high);
        let candidate = (result.reported_at, idx);
        chosen
            .entry(key)
            .and_modify(|kept| {
                let current = (results[*kept].reported_at, *kept);
                let replace = match policy {
                    DuplicatePolicy::FirstReported => candidate < current,
                    DuplicatePolicy::LastReported => candidate > current,
                };
                if replace {
                    *kept = idx;
                }
            })
            .or_insert(idx);
    }
    let dropped = results.len() - chosen.len();
    if dropped > 0 {
        log::debug!("Discarded {} duplicate or invalid result(s)", dropped);
    }

    let mut surviving: Vec<&MatchResult> = chosen.values().map(|&idx| &results[idx]).collect();
    surviving.sort_by(|a, b| {
        (a.round, a.reported_at, a.unordered_pair()).cmp(&(b.round, b.reported_at, b.unordered_pair()))
    });
    surviving.into_iter().cloned().collect()
}

/// Rebuild the bracket from the tournament's participants and raw results.
///
/// Fails with `InsufficientParticipants` below 2 user participants and with
/// `NoChampionDetermined` when no decided result exists in the final round.
pub fn reconstruct(
    tournament: &Tournament,
    policy: DuplicatePolicy,
) -> Result<BracketSummary, FinalizeError> {
    let mut statuses: BTreeMap<UserId, ParticipantStatus> = BTreeMap::new();
    for (user_id, status) in tournament.user_participants() {
        statuses.entry(user_id).or_insert(status);
    }
    let found = statuses.len();
    if found < 2 {
        return Err(FinalizeError::InsufficientParticipants { found });
    }
    let (slots, total_rounds) = bracket_depth(found);

    let eligible: HashSet<UserId> = statuses.keys().copied().collect();
    let surviving = dedupe_results(&tournament.results, &eligible, policy);

    let mut records: BTreeMap<UserId, PlayerRecord> = statuses
        .iter()
        .map(|(&id, &status)| {
            (
                id,
                PlayerRecord {
                    status,
                    ..PlayerRecord::default()
                },
            )
        })
        .collect();

    let mut first_defeats: HashSet<(UserId, UserId)> = HashSet::new();
    let mut champion: Option<UserId> = None;

    for result in &surviving {
        for me in [result.player_a, result.player_b] {
            if let (Some(record), Some(other)) = (records.get_mut(&me), result.opponent_of(me)) {
                record.opponents.insert(other);
            }
        }
        let Some((winner, loser)) = result.outcome() else {
            continue;
        };
        if let Some(record) = records.get_mut(&winner) {
            record.wins += 1;
        }
        if let Some(record) = records.get_mut(&loser) {
            record.losses += 1;
        }
        if first_defeats.insert((winner, loser)) {
            if let Some(record) = records.get_mut(&winner) {
                record.defeated.push(Defeat {
                    opponent: loser,
                    round: result.round,
                });
            }
            if let Some(record) = records.get_mut(&loser) {
                record.lost_round = record.lost_round.max(result.round);
            }
        }
        if result.round == total_rounds && champion.is_none() {
            champion = Some(winner);
        }
    }

    let champion = champion.ok_or(FinalizeError::NoChampionDetermined {
        final_round: total_rounds,
    })?;
    if let Some(record) = records.get_mut(&champion) {
        record.lost_round = total_rounds + 1;
    }

    // Removed participants only count if they actually played.
    records.retain(|_, record| !record.status.is_removed() || record.played());

    Ok(BracketSummary {
        slots,
        total_rounds,
        champion,
        records,
        surviving,
    })
}
