//! Session controller integration tests.
//!
//! All tests run on a paused tokio clock, so the one-second ticker and the
//! mismatch delay elapse instantly and deterministically.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use cat_pairs::cards::pair_counts;
use cat_pairs::session::{LOAD_ERROR_MESSAGE, NO_PAIRS_MESSAGE};
use cat_pairs::{CardId, GameController, Phase};

use common::{
    non_partner, pairs, partner, spawn, start_playing, test_config, Flaky, NumberedCats, Offline,
    SlowThenFast, Stingy,
};

// =============================================================================
// Starting Sessions
// =============================================================================

/// A successful start deals 2N covered, unmatched cards, two per image.
#[tokio::test(start_paused = true)]
async fn test_start_deals_pairs_face_down() {
    let handle = spawn(NumberedCats::default());

    let playing = start_playing(&handle, 6).await;

    assert_eq!(playing.cards.len(), 12);
    assert_eq!(playing.elapsed_seconds, 0);
    assert_eq!(playing.first_selected, None);
    assert_eq!(playing.second_selected, None);

    let counts = pair_counts(playing.cards.iter());
    assert_eq!(counts.len(), 6);
    assert!(counts.values().all(|&n| n == 2));

    for card in &playing.cards {
        assert!(card.is_covered);
        assert!(!card.is_matched);
        assert!(!card.is_revealed);
        assert_eq!(card.visible_url(), None);
    }
}

/// Start goes through Loading before Playing.
#[tokio::test(start_paused = true)]
async fn test_start_publishes_loading_first() {
    let handle = spawn(NumberedCats::default());
    let mut sub = handle.subscribe();

    handle.start_session(3).await.unwrap();

    let phases: Vec<Phase> = vec![
        sub.next().await.unwrap().phase.clone(),
        sub.next().await.unwrap().phase.clone(),
        sub.next().await.unwrap().phase.clone(),
    ];
    assert_eq!(phases, vec![Phase::Idle, Phase::Loading, Phase::Playing]);
}

/// The same seed deals the same layout.
#[tokio::test(start_paused = true)]
async fn test_seeded_deal_is_reproducible() {
    let a = GameController::spawn(NumberedCats::default(), test_config());
    let b = GameController::spawn(NumberedCats::default(), test_config());

    let first = start_playing(&a, 6).await;
    let second = start_playing(&b, 6).await;

    assert_eq!(first.cards, second.cards);
}

/// Restarting fetches a brand-new deck.
#[tokio::test(start_paused = true)]
async fn test_restart_fetches_again() {
    let source = std::sync::Arc::new(NumberedCats::default());
    let handle = GameController::spawn(std::sync::Arc::clone(&source), test_config());

    let first = start_playing(&handle, 6).await;
    let second = start_playing(&handle, 6).await;

    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(first.epoch, 1);
    assert_eq!(second.epoch, 2);
    assert!(second.cards.iter().all(|c| c.is_covered));
}

// =============================================================================
// Failures
// =============================================================================

/// A failing source ends in Failed with no ticker running.
#[tokio::test(start_paused = true)]
async fn test_fetch_failure() {
    let handle = spawn(Offline);
    let mut sub = handle.subscribe();

    handle.start_session(6).await.unwrap();
    let failed = sub.wait_for(|s| s.phase.error().is_some()).await.unwrap();

    assert_eq!(failed.phase, Phase::Failed(LOAD_ERROR_MESSAGE.to_string()));
    assert!(failed.cards.is_empty());

    tokio::time::sleep(Duration::from_secs(3)).await;
    let later = handle.snapshot();
    assert_eq!(later.revision, failed.revision);
    assert_eq!(later.elapsed_seconds, 0);
}

/// Retrying after a failure recovers.
#[tokio::test(start_paused = true)]
async fn test_retry_after_failure() {
    let handle = spawn(Flaky {
        failures: 1,
        calls: Default::default(),
    });
    let mut sub = handle.subscribe();

    handle.start_session(6).await.unwrap();
    sub.wait_for(|s| s.phase.error().is_some()).await.unwrap();

    let playing = start_playing(&handle, 6).await;
    assert_eq!(playing.cards.len(), 12);
}

/// Too few distinct images fail the whole batch.
#[tokio::test(start_paused = true)]
async fn test_insufficient_images_fail() {
    let handle = spawn(Stingy);
    let mut sub = handle.subscribe();

    handle.start_session(6).await.unwrap();
    let failed = sub.wait_for(|s| s.phase.error().is_some()).await.unwrap();

    assert_eq!(failed.phase.error(), Some(LOAD_ERROR_MESSAGE));
}

/// Zero pairs is rejected without contacting the source.
#[tokio::test(start_paused = true)]
async fn test_zero_pairs() {
    let handle = spawn(Offline);
    let mut sub = handle.subscribe();

    handle.start_session(0).await.unwrap();
    let failed = sub.wait_for(|s| s.phase.error().is_some()).await.unwrap();

    assert_eq!(failed.phase.error(), Some(NO_PAIRS_MESSAGE));
}

/// A late response from a superseded start never replaces the newer deck.
#[tokio::test(start_paused = true)]
async fn test_stale_fetch_is_discarded() {
    let handle = spawn(SlowThenFast::default());
    let mut sub = handle.subscribe();

    handle.start_session(2).await.unwrap();
    handle.start_session(2).await.unwrap();

    let playing = sub.wait_for(|s| s.phase.is_playing()).await.unwrap();
    assert_eq!(playing.epoch, 2);
    assert!(playing.cards.iter().all(|c| c.image.id.starts_with("fast")));

    // Let the slow first fetch complete.
    tokio::time::sleep(Duration::from_millis(6500)).await;

    let after = handle.snapshot();
    assert_eq!(after.epoch, 2);
    assert_eq!(after.phase, Phase::Playing);
    assert_eq!(after.cards, playing.cards);
    assert_eq!(after.elapsed_seconds, 6);
}

// =============================================================================
// Tapping
// =============================================================================

/// The first tap flips exactly one card.
#[tokio::test(start_paused = true)]
async fn test_first_tap_flips_one_card() {
    let handle = spawn(NumberedCats::default());
    let playing = start_playing(&handle, 6).await;
    let target = playing.cards[3].id;

    let mut sub = handle.subscribe();
    handle.tap(target).await.unwrap();
    let revealed = sub
        .wait_for(|s| s.first_selected == Some(target))
        .await
        .unwrap();

    for (before, after) in playing.cards.iter().zip(revealed.cards.iter()) {
        if after.id == target {
            assert!(!after.is_covered);
            assert!(after.is_revealed);
            assert!(after.visible_url().is_some());
        } else {
            assert_eq!(before, after);
        }
    }
}

/// A matching pair marks exactly those two cards.
#[tokio::test(start_paused = true)]
async fn test_matching_pair_marks_only_those_cards() {
    let handle = spawn(NumberedCats::default());
    let playing = start_playing(&handle, 6).await;
    let first = playing.cards[0].id;
    let second = partner(&playing, first);

    let mut sub = handle.subscribe();
    handle.tap(first).await.unwrap();
    handle.tap(second).await.unwrap();
    let matched = sub.wait_for(|s| s.matched_pairs() == 1).await.unwrap();

    let mut matched_ids: Vec<CardId> = matched
        .cards
        .iter()
        .filter(|c| c.is_matched)
        .map(|c| c.id)
        .collect();
    matched_ids.sort_unstable();
    let mut expected = vec![first, second];
    expected.sort_unstable();

    assert_eq!(matched_ids, expected);
    assert_eq!(matched.pending_pair(), None);
    assert_eq!(matched.first_selected, None);
}

/// A mismatched pair shakes, then turns back over after the delay.
#[tokio::test(start_paused = true)]
async fn test_mismatch_covers_both_after_delay() {
    let handle = spawn(NumberedCats::default());
    let playing = start_playing(&handle, 6).await;
    let first = playing.cards[0].id;
    let second = non_partner(&playing, first);

    let mut sub = handle.subscribe();
    handle.tap(first).await.unwrap();
    handle.tap(second).await.unwrap();

    let shaking = sub.wait_for(|s| s.pending_pair().is_some()).await.unwrap();
    assert!(shaking.card(first).unwrap().is_shaking);
    assert!(shaking.card(second).unwrap().is_shaking);
    let shaken_at = tokio::time::Instant::now();

    let resolved = sub.wait_for(|s| s.pending_pair().is_none()).await.unwrap();
    assert!(shaken_at.elapsed() >= Duration::from_millis(1000));

    for card in &resolved.cards {
        assert!(card.is_covered);
        assert!(!card.is_revealed);
        assert!(!card.is_matched);
        assert!(!card.is_shaking);
    }
    assert_eq!(resolved.first_selected, None);
    assert_eq!(resolved.second_selected, None);
}

/// Taps during the mismatch window are ignored.
#[tokio::test(start_paused = true)]
async fn test_third_tap_blocked_while_mismatch_pending() {
    let handle = spawn(NumberedCats::default());
    let playing = start_playing(&handle, 6).await;
    let first = playing.cards[0].id;
    let second = non_partner(&playing, first);
    let third = playing
        .cards
        .iter()
        .map(|c| c.id)
        .find(|&id| id != first && id != second)
        .unwrap();

    let mut sub = handle.subscribe();
    handle.tap(first).await.unwrap();
    handle.tap(second).await.unwrap();
    handle.tap(third).await.unwrap();

    sub.wait_for(|s| s.pending_pair().is_some()).await.unwrap();
    let resolved = sub
        .wait_for(|s| {
            assert!(s.card(third).unwrap().is_covered, "third card flipped early");
            s.pending_pair().is_none()
        })
        .await
        .unwrap();
    assert_eq!(resolved.first_selected, None);

    // Once resolved, the same tap works.
    handle.tap(third).await.unwrap();
    let revealed = sub
        .wait_for(|s| s.first_selected == Some(third))
        .await
        .unwrap();
    assert!(!revealed.card(third).unwrap().is_covered);
}

/// 6 pairs: a mismatch on the first card, then its real partner.
#[tokio::test(start_paused = true)]
async fn test_mismatch_then_match_scenario() {
    let handle = spawn(NumberedCats::default());
    let playing = start_playing(&handle, 6).await;
    let card0 = playing.cards[0].id;
    let wrong = non_partner(&playing, card0);
    let right = partner(&playing, card0);

    let mut sub = handle.subscribe();
    handle.tap(card0).await.unwrap();
    handle.tap(wrong).await.unwrap();
    sub.wait_for(|s| s.pending_pair().is_some()).await.unwrap();
    let resolved = sub.wait_for(|s| s.pending_pair().is_none()).await.unwrap();
    assert!(resolved.card(card0).unwrap().is_covered);
    assert!(resolved.card(wrong).unwrap().is_covered);

    handle.tap(card0).await.unwrap();
    handle.tap(right).await.unwrap();
    let matched = sub.wait_for(|s| s.matched_pairs() == 1).await.unwrap();

    assert!(matched.card(card0).unwrap().is_matched);
    assert!(matched.card(right).unwrap().is_matched);
    assert!(!matched.card(wrong).unwrap().is_matched);
}

/// Taps before any session starts do nothing.
#[tokio::test(start_paused = true)]
async fn test_tap_while_idle_is_ignored() {
    let handle = spawn(NumberedCats::default());

    handle.tap(CardId::new(0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.revision, 0);
    assert_eq!(snapshot.phase, Phase::Idle);
}

// =============================================================================
// Ticker and Finishing
// =============================================================================

/// Elapsed time advances once per second while playing.
#[tokio::test(start_paused = true)]
async fn test_ticker_counts_seconds() {
    let handle = spawn(NumberedCats::default());
    start_playing(&handle, 6).await;

    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(handle.snapshot().elapsed_seconds, 3);
}

/// Restarting resets the clock and never runs two tickers.
#[tokio::test(start_paused = true)]
async fn test_restart_replaces_ticker() {
    let handle = spawn(NumberedCats::default());
    start_playing(&handle, 6).await;
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(handle.snapshot().elapsed_seconds, 2);

    let restarted = start_playing(&handle, 6).await;
    assert_eq!(restarted.elapsed_seconds, 0);

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(handle.snapshot().elapsed_seconds, 3);
}

/// Matching every pair finishes the game and freezes the clock.
#[tokio::test(start_paused = true)]
async fn test_all_pairs_matched_finishes() {
    let handle = spawn(NumberedCats::default());
    let playing = start_playing(&handle, 6).await;
    let all_pairs = pairs(&playing);
    assert_eq!(all_pairs.len(), 6);

    let mut sub = handle.subscribe();
    for &(a, b) in &all_pairs[..5] {
        handle.tap(a).await.unwrap();
        handle.tap(b).await.unwrap();
    }
    let five = sub.wait_for(|s| s.matched_pairs() == 5).await.unwrap();
    assert_eq!(five.phase, Phase::Playing);

    tokio::time::sleep(Duration::from_millis(2500)).await;

    let (a, b) = all_pairs[5];
    handle.tap(a).await.unwrap();
    handle.tap(b).await.unwrap();
    let finished = sub.wait_for(|s| s.phase.is_finished()).await.unwrap();

    assert!(finished.cards.iter().all(|c| c.is_matched));
    assert_eq!(finished.elapsed_seconds, 2);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let later = handle.snapshot();
    assert_eq!(later.elapsed_seconds, 2);
    assert_eq!(later.revision, finished.revision);
}

/// Every snapshot of a game with mistakes satisfies the invariants.
#[tokio::test(start_paused = true)]
async fn test_invariants_hold_across_a_game() {
    let handle = spawn(NumberedCats::default());
    let playing = start_playing(&handle, 4).await;
    let all_pairs = pairs(&playing);

    let mut sub = handle.subscribe();
    for &(a, b) in &all_pairs {
        // One wrong guess before each right one, while any are left.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let current = handle.snapshot();
        let image = current.card(a).unwrap().image.clone();
        let wrong = current
            .cards
            .iter()
            .find(|c| !c.is_matched && !c.image.same_as(&image))
            .map(|c| c.id);
        if let Some(wrong) = wrong {
            handle.tap(a).await.unwrap();
            handle.tap(wrong).await.unwrap();
            tokio::time::sleep(Duration::from_millis(1100)).await;
        }

        handle.tap(a).await.unwrap();
        handle.tap(b).await.unwrap();
    }

    let finished = sub
        .wait_for(|s| {
            if let Err(violation) = s.check_invariants() {
                panic!("invariant violated at {} seconds: {violation}", s.elapsed_seconds);
            }
            s.phase.is_finished()
        })
        .await
        .unwrap();
    assert_eq!(finished.matched_pairs(), 4);
}

/// A restart during the mismatch window drops the pending resolution.
#[tokio::test(start_paused = true)]
async fn test_restart_during_mismatch_window() {
    let handle = spawn(NumberedCats::default());
    let playing = start_playing(&handle, 6).await;
    let first = playing.cards[0].id;
    let second = non_partner(&playing, first);

    let mut sub = handle.subscribe();
    handle.tap(first).await.unwrap();
    handle.tap(second).await.unwrap();
    sub.wait_for(|s| s.pending_pair().is_some()).await.unwrap();

    let restarted = start_playing(&handle, 6).await;
    assert_eq!(restarted.pending_pair(), None);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let later = handle.snapshot();
    assert_eq!(later.epoch, restarted.epoch);
    assert_eq!(later.cards, restarted.cards);
    assert!(later.check_invariants().is_ok());
}

/// Shutting down stops the ticker.
#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_everything() {
    let handle = spawn(NumberedCats::default());
    start_playing(&handle, 6).await;
    tokio::time::sleep(Duration::from_millis(1500)).await;

    handle.shutdown().await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(handle.snapshot().elapsed_seconds, 1);
    assert!(handle.restart().await.is_err());
}
