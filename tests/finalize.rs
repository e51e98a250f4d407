//! Integration tests for finalization: scoring, awarding, idempotency and failure handling.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tournament_awards::logic::{apply_score, base_placement_points};
use tournament_awards::{
    compute_awards, event_channel, AwardCommit, AwardStore, CommitOutcome, CompetitiveProfile,
    CompletionEvent, FinalizeError, FinalizeOutcome, Finalizer, InMemoryStore, MatchResult,
    ParticipantStatus, PlacementPoints, PointsAward, ScoringConfig, StoreError, Tournament, TournamentId,
    TournamentStatus, UserId, Versioned,
};
use uuid::Uuid;

fn uid(n: u128) -> UserId {
    Uuid::from_u128(n)
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 21, 0, 0).unwrap()
}

fn tournament_with(n: u128) -> Tournament {
    let mut t = Tournament::new("Friday Brawl", "tekken8", uid(999), now() - Duration::days(1));
    for i in 1..=n {
        t.add_participant(uid(i)).unwrap();
    }
    t.start().unwrap();
    t
}

fn report(t: &mut Tournament, round: u32, winner: u128, loser: u128) {
    let at = now() - Duration::hours(3) + Duration::minutes(t.results.len() as i64);
    t.record_result(MatchResult::new(round, uid(winner), uid(loser), Some(uid(winner)), at))
        .unwrap();
}

/// Four players: 1 beats 2, 3 beats 4, 1 beats 3 in the final.
fn four_player_cup() -> Tournament {
    let mut t = tournament_with(4);
    report(&mut t, 1, 1, 2);
    report(&mut t, 1, 3, 4);
    report(&mut t, 2, 1, 3);
    t
}

fn store_with(t: &Tournament, profiles: &[(u128, CompetitiveProfile)]) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.insert_tournament(t.clone()).unwrap();
    for (id, p) in profiles {
        store.put_profile(uid(*id), p.clone()).unwrap();
    }
    store
}

fn award_for(awards: &[PointsAward], n: u128) -> &PointsAward {
    awards.iter().find(|a| a.user_id == uid(n)).unwrap()
}

#[test]
fn four_player_cup_placements_and_deltas() {
    let t = four_player_cup();
    let store = store_with(&t, &[]);
    let finalizer = Finalizer::new(store.clone(), ScoringConfig::default());

    let outcome = finalizer.finalize(t.id, now()).unwrap();
    assert!(outcome.was_awarded_now());
    let awards = outcome.awards();

    let placements: Vec<(UserId, u32)> = awards.iter().map(|a| (a.user_id, a.placement)).collect();
    assert_eq!(
        placements,
        vec![(uid(1), 1), (uid(3), 2), (uid(2), 3), (uid(4), 4)]
    );

    // Everyone level 1: champion 25 + two wins at 3.
    assert_eq!(award_for(awards, 1).delta, 31.0);
    assert_eq!(award_for(awards, 3).delta, 21.0);
    assert_eq!(award_for(awards, 2).delta, 14.0);
    assert_eq!(award_for(awards, 4).delta, 14.0);
    assert_eq!(award_for(awards, 1).wins, 2);
    assert_eq!(award_for(awards, 1).losses, 0);

    let champion = store.profile(uid(1)).unwrap();
    assert_eq!(champion.points, 31.0);
    assert_eq!(champion.level, Some(1));
    assert_eq!(champion.wins, 2);
    assert_eq!(champion.tournaments_played, 1);
    assert_eq!(champion.last_competitive_at, Some(now()));
    assert_eq!(champion.history.len(), 1);
    assert_eq!(champion.history[0].placement, 1);
    assert_eq!(champion.history[0].breakdown, award_for(awards, 1).breakdown);

    let stored = store.tournament(t.id).unwrap();
    assert_eq!(stored.status, TournamentStatus::Completed);
    assert_eq!(stored.awarded_at, Some(now()));
    assert_eq!(stored.completed_at, Some(now()));
    assert_eq!(stored.points_awards, awards.to_vec());
}

#[test]
fn second_finalize_returns_stored_awards_without_touching_profiles() {
    let t = four_player_cup();
    let store = store_with(&t, &[]);
    let finalizer = Finalizer::new(store.clone(), ScoringConfig::default());

    let first = finalizer.finalize(t.id, now()).unwrap();
    let after_first = store.profile(uid(1)).unwrap();

    let second = finalizer
        .finalize(t.id, now() + Duration::hours(2))
        .unwrap();
    assert!(matches!(second, FinalizeOutcome::AlreadyAwarded(_)));
    assert_eq!(first.awards(), second.awards());
    assert_eq!(store.profile(uid(1)).unwrap(), after_first);
    assert_eq!(store.profile(uid(1)).unwrap().tournaments_played, 1);
}

#[test]
fn disqualified_winner_gets_penalty_but_no_decay_when_recently_active() {
    let mut t = tournament_with(4);
    report(&mut t, 1, 1, 2);
    report(&mut t, 1, 4, 3);
    report(&mut t, 2, 1, 4);
    t.set_participant_status(uid(4), ParticipantStatus::Disqualified)
        .unwrap();

    let recent = CompetitiveProfile {
        points: 50.0,
        last_competitive_at: Some(now() - Duration::days(3)),
        ..CompetitiveProfile::default()
    };
    let store = store_with(&t, &[(4, recent)]);
    let finalizer = Finalizer::new(store, ScoringConfig::default());
    let outcome = finalizer.finalize(t.id, now()).unwrap();

    let award = award_for(outcome.awards(), 4);
    let b = award.breakdown;
    assert_eq!(b.penalties, -10.0);
    assert_eq!(b.decay, 0.0);
    assert_eq!(b.base_placement, 18.0);
    assert_eq!(b.wins_points, 3.0);
    assert_eq!(award.delta, b.base_placement + b.wins_points - 10.0);
    assert_eq!(award.placement, 2);
}

#[test]
fn inactive_champion_pays_decay_and_gets_weighted_base() {
    let t = four_player_cup();
    let veteran = CompetitiveProfile {
        points: 200.0,
        last_competitive_at: Some(now() - Duration::days(40)),
        ..CompetitiveProfile::default()
    };
    let store = store_with(&t, &[(1, veteran)]);
    let finalizer = Finalizer::new(store.clone(), ScoringConfig::default());
    let outcome = finalizer.finalize(t.id, now()).unwrap();

    let b = award_for(outcome.awards(), 1).breakdown;
    // Level 3 against level 1 opponents: base weight clamps to 0.3..1.2 -> 1/3.
    assert_eq!(b.base_placement, 8.33);
    assert_eq!(b.wins_points, 2.0);
    assert_eq!(b.difficulty_points, 0.0);
    assert_eq!(b.decay, -8.0);
    assert_eq!(b.total, 2.33);

    let profile = store.profile(uid(1)).unwrap();
    assert_eq!(profile.points, 202.33);
    assert_eq!(profile.level, Some(3));
    assert_eq!(profile.decay_total, 8.0);
}

#[test]
fn three_player_field_finalizes_with_a_bye() {
    let mut t = tournament_with(3);
    report(&mut t, 1, 1, 2);
    report(&mut t, 2, 1, 3);

    let store = store_with(&t, &[]);
    let finalizer = Finalizer::new(store, ScoringConfig::default());
    let outcome = finalizer.finalize(t.id, now()).unwrap();
    let awards = outcome.awards();

    assert_eq!(award_for(awards, 1).placement, 1);
    assert_eq!(award_for(awards, 3).placement, 2);
    assert_eq!(award_for(awards, 2).placement, 3);
    // uid(3) had a bye and lost the final.
    assert_eq!(award_for(awards, 3).breakdown.base_placement, 18.0);
    assert_eq!(award_for(awards, 3).wins, 0);
    assert_eq!(award_for(awards, 2).breakdown.base_placement, 14.0);
}

#[test]
fn points_never_drop_below_zero() {
    let mut t = four_player_cup();
    t.set_participant_status(uid(2), ParticipantStatus::Expelled)
        .unwrap();
    let fading = CompetitiveProfile {
        points: 5.0,
        last_competitive_at: Some(now() - Duration::days(100)),
        ..CompetitiveProfile::default()
    };
    let store = store_with(&t, &[(2, fading)]);
    let finalizer = Finalizer::new(store.clone(), ScoringConfig::default());
    let outcome = finalizer.finalize(t.id, now()).unwrap();

    // 14 for a first-round exit, -15 expelled, -5 decay (capped at current points).
    let award = award_for(outcome.awards(), 2);
    assert_eq!(award.breakdown.penalties, -15.0);
    assert_eq!(award.breakdown.decay, -5.0);
    assert_eq!(award.delta, -6.0);
    assert_eq!(store.profile(uid(2)).unwrap().points, 0.0);
    assert_eq!(store.profile(uid(2)).unwrap().level, Some(1));
}

#[test]
fn upset_wins_are_highlighted_once_per_opponent() {
    let mut t = tournament_with(4);
    report(&mut t, 1, 1, 2);
    report(&mut t, 1, 3, 4);
    report(&mut t, 2, 1, 3);
    let favourite = CompetitiveProfile::with_points(450.0); // level 5
    let mid = CompetitiveProfile::with_points(150.0); // level 2
    let store = store_with(&t, &[(2, favourite), (3, mid)]);
    let finalizer = Finalizer::new(store.clone(), ScoringConfig::default());
    let outcome = finalizer.finalize(t.id, now()).unwrap();

    let champion = store.profile(uid(1)).unwrap();
    assert_eq!(champion.highlighted_wins.len(), 1);
    let upset = &champion.highlighted_wins[0];
    assert_eq!(upset.opponent_id, uid(2));
    assert_eq!(upset.opponent_level, 5);
    assert_eq!(upset.own_level, 1);
    assert_eq!(upset.round, 1);

    // Difficulty: gaps 4 and 1 -> mean 2.5 -> 5 points.
    let award = award_for(outcome.awards(), 1);
    assert_eq!(award.avg_difficulty, 2.5);
    assert_eq!(award.breakdown.difficulty_points, 5.0);
    // Win ratios clamp at 1.25: 3 * 1.25 + 3 * 1.25.
    assert_eq!(award.breakdown.wins_points, 7.5);
}

#[test]
fn placement_table_covers_every_tier() {
    let table = PlacementPoints::default();
    // Four rounds: 16 slots.
    assert_eq!(base_placement_points(5, 4, &table), 25.0);
    assert_eq!(base_placement_points(4, 4, &table), 18.0);
    assert_eq!(base_placement_points(3, 4, &table), 14.0);
    assert_eq!(base_placement_points(2, 4, &table), 10.0);
    assert_eq!(base_placement_points(1, 4, &table), 6.0);
    assert_eq!(base_placement_points(0, 4, &table), 6.0);
    // One round: the loser of the only match is the finalist.
    assert_eq!(base_placement_points(2, 1, &table), 25.0);
    assert_eq!(base_placement_points(1, 1, &table), 18.0);
    assert_eq!(base_placement_points(0, 1, &table), 14.0);
    assert_eq!(base_placement_points(u32::MAX, u32::MAX, &table), 18.0);
    assert_eq!(base_placement_points(0, u32::MAX, &table), 6.0);
}

#[test]
fn sixteen_player_bracket_pays_quarterfinal_and_first_round_tiers() {
    let mut t = tournament_with(16);
    // Lower odd id wins every match.
    let mut alive: Vec<u128> = (1..=16).collect();
    let mut round = 1;
    while alive.len() > 1 {
        let mut next = Vec::new();
        for pair in alive.chunks(2) {
            report(&mut t, round, pair[0], pair[1]);
            next.push(pair[0]);
        }
        alive = next;
        round += 1;
    }
    let store = store_with(&t, &[]);
    let finalizer = Finalizer::new(store, ScoringConfig::default());
    let outcome = finalizer.finalize(t.id, now()).unwrap();
    let awards = outcome.awards();
    assert_eq!(awards.len(), 16);

    assert_eq!(award_for(awards, 1).breakdown.base_placement, 25.0);
    assert_eq!(award_for(awards, 9).breakdown.base_placement, 18.0);
    for semi in [5, 13] {
        assert_eq!(award_for(awards, semi).breakdown.base_placement, 14.0);
    }
    for quarter in [3, 7, 11, 15] {
        assert_eq!(award_for(awards, quarter).breakdown.base_placement, 10.0);
    }
    for first_round in (2..=16).step_by(2) {
        let award = award_for(awards, first_round);
        assert_eq!(award.breakdown.base_placement, 6.0);
        assert_eq!(award.delta, 6.0);
    }
}

#[test]
fn maximal_stored_level_does_not_overflow_upset_check() {
    let mut t = tournament_with(2);
    report(&mut t, 1, 1, 2);
    let profiles: HashMap<UserId, CompetitiveProfile> = [(
        uid(1),
        CompetitiveProfile {
            level: Some(u32::MAX),
            ..CompetitiveProfile::default()
        },
    )]
    .into_iter()
    .collect();

    let plan = compute_awards(&t, &profiles, &ScoringConfig::default(), now()).unwrap();
    let champion = plan.scores.iter().find(|s| s.user_id == uid(1)).unwrap();
    assert_eq!(champion.old_level, u32::MAX);
    assert!(champion.highlights.is_empty());
    assert_eq!(champion.breakdown.difficulty_points, 0.0);
}

#[test]
fn breakdown_terms_sum_to_the_delta() {
    let t = four_player_cup();
    let profiles: HashMap<UserId, CompetitiveProfile> = [
        (uid(1), CompetitiveProfile::with_points(333.33)),
        (uid(2), CompetitiveProfile::with_points(12.5)),
        (
            uid(3),
            CompetitiveProfile {
                points: 780.0,
                last_competitive_at: Some(now() - Duration::days(61)),
                ..CompetitiveProfile::default()
            },
        ),
    ]
    .into_iter()
    .collect();
    let plan = compute_awards(&t, &profiles, &ScoringConfig::default(), now()).unwrap();

    for award in plan.awards() {
        let b = award.breakdown;
        let recomputed = b.base_placement + b.wins_points + b.difficulty_points + b.penalties + b.decay;
        assert!((recomputed - b.total).abs() < 0.005, "{:?}", b);
        assert_eq!(award.delta, b.total);
    }
}

#[test]
fn result_order_does_not_change_awards() {
    let mut t = tournament_with(8);
    report(&mut t, 1, 1, 2);
    report(&mut t, 1, 3, 4);
    report(&mut t, 1, 5, 6);
    report(&mut t, 1, 8, 7);
    report(&mut t, 2, 3, 1);
    report(&mut t, 2, 5, 8);
    report(&mut t, 3, 5, 3);
    let profiles: HashMap<UserId, CompetitiveProfile> = (1..=8)
        .map(|i| (uid(i), CompetitiveProfile::with_points(i as f64 * 57.0)))
        .collect();
    let config = ScoringConfig::default();
    let expected = compute_awards(&t, &profiles, &config, now()).unwrap().awards();

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let mut shuffled = t.clone();
        shuffled.results.shuffle(&mut rng);
        let awards = compute_awards(&shuffled, &profiles, &config, now())
            .unwrap()
            .awards();
        assert_eq!(awards, expected);
    }
}

/// Single-elimination with byes: the last player of an odd round sits out.
fn random_bracket(n: u128, rng: &mut StdRng) -> Tournament {
    let mut t = tournament_with(n);
    let mut alive: Vec<u128> = (1..=n).collect();
    alive.shuffle(rng);
    let mut round = 1;
    while alive.len() > 1 {
        let mut next = Vec::new();
        for pair in alive.chunks(2) {
            match pair {
                [a, b] => {
                    let (w, l) = if rng.gen_bool(0.5) { (*a, *b) } else { (*b, *a) };
                    report(&mut t, round, w, l);
                    next.push(w);
                }
                [bye] => next.push(*bye),
                _ => unreachable!(),
            }
        }
        alive = next;
        round += 1;
    }
    t
}

#[test]
fn placements_are_a_permutation_for_any_field_size() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in 2..=17u128 {
        let t = random_bracket(n, &mut rng);
        let plan = compute_awards(&t, &HashMap::new(), &ScoringConfig::default(), now()).unwrap();
        let mut placements: Vec<u32> = plan.awards().iter().map(|a| a.placement).collect();
        placements.sort_unstable();
        let expected: Vec<u32> = (1..=n as u32).collect();
        assert_eq!(placements, expected, "field of {n}");
        let champion = plan.awards()[0].user_id;
        assert_eq!(champion, plan.bracket.champion);
    }
}

#[test]
fn guard_failures_leave_everything_untouched() {
    let mut t = tournament_with(4);
    report(&mut t, 1, 1, 2);
    report(&mut t, 1, 3, 4);
    let store = store_with(&t, &[]);
    let finalizer = Finalizer::new(store.clone(), ScoringConfig::default());

    let err = finalizer.finalize(t.id, now()).unwrap_err();
    assert_eq!(err, FinalizeError::NoChampionDetermined { final_round: 2 });
    assert!(!err.is_retryable());
    assert_eq!(store.tournament(t.id).unwrap(), t);
    assert_eq!(store.profile(uid(1)).unwrap(), CompetitiveProfile::default());
}

#[test]
fn registration_and_cancelled_tournaments_cannot_be_finalized() {
    let mut t = Tournament::new("Not yet", "sf6", uid(999), now());
    t.add_participant(uid(1)).unwrap();
    t.add_participant(uid(2)).unwrap();
    let store = store_with(&t, &[]);
    let finalizer = Finalizer::new(store, ScoringConfig::default());
    assert_eq!(
        finalizer.finalize(t.id, now()).unwrap_err(),
        FinalizeError::NotFinalizable {
            status: TournamentStatus::Registration
        }
    );

    let mut cancelled = tournament_with(2);
    cancelled.cancel().unwrap();
    let store = store_with(&cancelled, &[]);
    let finalizer = Finalizer::new(store, ScoringConfig::default());
    assert!(matches!(
        finalizer.finalize(cancelled.id, now()),
        Err(FinalizeError::NotFinalizable { .. })
    ));
}

#[test]
fn completed_but_unawarded_tournament_keeps_its_completion_time() {
    let mut t = four_player_cup();
    let finished = now() - Duration::days(2);
    t.status = TournamentStatus::Completed;
    t.completed_at = Some(finished);
    let store = store_with(&t, &[]);
    let finalizer = Finalizer::new(store.clone(), ScoringConfig::default());
    finalizer.finalize(t.id, now()).unwrap();

    let stored = store.tournament(t.id).unwrap();
    assert_eq!(stored.completed_at, Some(finished));
    assert_eq!(stored.awarded_at, Some(now()));
    assert_eq!(
        store.profile(uid(1)).unwrap().last_competitive_at,
        Some(finished)
    );
}

#[test]
fn unknown_tournament_is_reported() {
    let finalizer = Finalizer::new(Arc::new(InMemoryStore::new()), ScoringConfig::default());
    let id = Uuid::from_u128(12345);
    assert_eq!(
        finalizer.finalize(id, now()).unwrap_err(),
        FinalizeError::TournamentNotFound(id)
    );
}

#[test]
fn concurrent_finalize_awards_exactly_once() {
    let t = four_player_cup();
    let store = store_with(&t, &[]);
    let finalizer = Finalizer::new(store.clone(), ScoringConfig::default());

    let outcomes: Vec<FinalizeOutcome> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| finalizer.finalize(t.id, now()).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = outcomes.iter().filter(|o| o.was_awarded_now()).count();
    assert_eq!(winners, 1);
    for o in &outcomes {
        assert_eq!(o.awards(), outcomes[0].awards());
    }
    let champion = store.profile(uid(1)).unwrap();
    assert_eq!(champion.tournaments_played, 1);
    assert_eq!(champion.points, 31.0);
}

/// Fails every commit, as a broken database would.
struct FailingStore {
    inner: Arc<InMemoryStore>,
}

impl AwardStore for FailingStore {
    fn load_tournament(&self, id: TournamentId) -> Result<Versioned<Tournament>, StoreError> {
        self.inner.load_tournament(id)
    }

    fn load_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, Versioned<CompetitiveProfile>>, StoreError> {
        self.inner.load_profiles(ids)
    }

    fn commit_award(&self, _commit: AwardCommit) -> Result<CommitOutcome, StoreError> {
        Err(StoreError::Unavailable("connection reset".to_string()))
    }
}

#[test]
fn persistence_failure_is_retryable_and_leaves_no_award() {
    let t = four_player_cup();
    let store = store_with(&t, &[]);
    let failing = Finalizer::new(
        FailingStore {
            inner: store.clone(),
        },
        ScoringConfig::default(),
    );

    let err = failing.finalize(t.id, now()).unwrap_err();
    assert!(err.is_retryable());
    assert!(!store.tournament(t.id).unwrap().is_awarded());
    assert_eq!(store.profile(uid(1)).unwrap(), CompetitiveProfile::default());

    // Retrying against a healthy store succeeds with the same numbers.
    let healthy = Finalizer::new(store.clone(), ScoringConfig::default());
    let outcome = healthy.finalize(t.id, now()).unwrap();
    assert_eq!(award_for(outcome.awards(), 1).delta, 31.0);
}

/// Touches a profile right before the first commit, like a concurrent writer would.
struct InterferingStore {
    inner: Arc<InMemoryStore>,
    interfered: AtomicBool,
}

impl AwardStore for InterferingStore {
    fn load_tournament(&self, id: TournamentId) -> Result<Versioned<Tournament>, StoreError> {
        self.inner.load_tournament(id)
    }

    fn load_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, Versioned<CompetitiveProfile>>, StoreError> {
        self.inner.load_profiles(ids)
    }

    fn commit_award(&self, commit: AwardCommit) -> Result<CommitOutcome, StoreError> {
        if !self.interfered.swap(true, Ordering::SeqCst) {
            self.inner
                .put_profile(uid(3), CompetitiveProfile::with_points(100.0))?;
        }
        self.inner.commit_award(commit)
    }
}

#[test]
fn version_conflict_recomputes_from_fresh_profiles() {
    let t = four_player_cup();
    let store = store_with(&t, &[]);
    let finalizer = Finalizer::new(
        InterferingStore {
            inner: store.clone(),
            interfered: AtomicBool::new(false),
        },
        ScoringConfig::default(),
    );

    let outcome = finalizer.finalize(t.id, now()).unwrap();
    assert!(outcome.was_awarded_now());
    // The finalist's points came from the concurrent write, not the stale snapshot.
    let finalist = store.profile(uid(3)).unwrap();
    assert_eq!(finalist.points, 100.0 + award_for(outcome.awards(), 3).delta);
    assert_eq!(finalist.tournaments_played, 1);
}

#[test]
fn version_conflicts_give_up_after_configured_attempts() {
    let t = four_player_cup();
    let store = store_with(&t, &[]);
    let config = ScoringConfig {
        max_commit_attempts: 1,
        ..ScoringConfig::default()
    };
    let finalizer = Finalizer::new(
        InterferingStore {
            inner: store.clone(),
            interfered: AtomicBool::new(false),
        },
        config,
    );

    let err = finalizer.finalize(t.id, now()).unwrap_err();
    assert!(matches!(
        err,
        FinalizeError::Persistence(StoreError::VersionConflict { .. })
    ));
    assert!(!store.tournament(t.id).unwrap().is_awarded());
}

#[test]
fn events_are_emitted_after_commit_only() {
    let t = four_player_cup();
    let close_to_level_two = CompetitiveProfile::with_points(90.0);
    let store = store_with(&t, &[(1, close_to_level_two)]);
    let (tx, mut rx) = event_channel();
    let finalizer = Finalizer::new(store, ScoringConfig::default()).with_events(tx);

    finalizer.finalize(t.id, now()).unwrap();
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    let completed: HashSet<UserId> = events
        .iter()
        .filter_map(|e| match e {
            CompletionEvent::TournamentCompleted { user_id, .. } => Some(*user_id),
            _ => None,
        })
        .collect();
    assert_eq!(completed.len(), 4);
    assert!(events.contains(&CompletionEvent::LevelUp {
        user_id: uid(1),
        old_level: 1,
        new_level: 2,
    }));

    finalizer.finalize(t.id, now()).unwrap();
    assert!(rx.try_recv().is_err());
}

#[test]
fn profile_that_already_holds_the_tournament_is_not_applied_twice() {
    let t = four_player_cup();
    let plan = compute_awards(&t, &HashMap::new(), &ScoringConfig::default(), now()).unwrap();
    let score = &plan.scores[0];

    let once = apply_score(&CompetitiveProfile::default(), score, &t, now()).unwrap();
    assert_eq!(once.tournaments_played, 1);
    assert!(apply_score(&once, score, &t, now()).is_none());
}
