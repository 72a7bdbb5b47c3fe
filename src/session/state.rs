//! Session state: the card-matching state machine.
//!
//! `SessionState` is a plain value. Every transition is a method that
//! mutates it in place and reports what happened; scheduling timers and
//! publishing snapshots is the controller's job.
//!
//! ## Phases
//!
//! ```text
//! Idle ──start──▶ Loading ──images──▶ Playing ──all matched──▶ Finished
//!                    │
//!                    └──fetch error──▶ Failed(message)
//! ```
//!
//! Any phase goes back to `Loading` when a new session starts; the old
//! state is discarded, not mutated.
//!
//! ## Selection
//!
//! Two slots, `first_selected` and `second_selected`. A pair is evaluated
//! as soon as the second slot fills. A match clears both slots at once; a
//! mismatch keeps both filled until `resolve_mismatch`, which blocks
//! further taps for the feedback window.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::{pair_counts, Card, CardId};

/// Coarse lifecycle state of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No session has been started yet.
    #[default]
    Idle,
    /// Waiting for the image source.
    Loading,
    /// Cards are on the table and the clock is running.
    Playing,
    /// Every pair has been found.
    Finished,
    /// The image fetch failed. Carries a user-facing message.
    Failed(String),
}

impl Phase {
    #[must_use]
    pub fn is_playing(&self) -> bool {
        matches!(self, Phase::Playing)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Phase::Finished)
    }

    /// The failure message, if the session failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Phase::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// What a tap did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    /// Nothing changed.
    Ignored,
    /// The card became the first selection.
    Revealed,
    /// The card completed a matching pair.
    Matched {
        /// Was this the last pair?
        finished: bool,
    },
    /// The card completed a non-matching pair. Both cards stay face-up
    /// until `resolve_mismatch(first, second)`.
    Mismatched { first: CardId, second: CardId },
}

/// Snapshot of one game session.
///
/// Uses `im::Vector` for the cards so publishing a snapshot is an O(1)
/// clone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Session generation. Incremented on every start.
    pub epoch: u64,

    /// Cards in display order.
    pub cards: Vector<Card>,

    pub first_selected: Option<CardId>,
    pub second_selected: Option<CardId>,

    /// Whole seconds spent in `Playing`.
    pub elapsed_seconds: u64,

    pub phase: Phase,
}

impl SessionState {
    /// State before any session has started.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Fresh state for a session whose images are being fetched.
    #[must_use]
    pub fn loading(epoch: u64) -> Self {
        Self {
            epoch,
            phase: Phase::Loading,
            ..Self::default()
        }
    }

    /// Fresh state with the dealt cards on the table.
    #[must_use]
    pub fn playing(epoch: u64, cards: Vector<Card>) -> Self {
        Self {
            epoch,
            cards,
            phase: Phase::Playing,
            ..Self::default()
        }
    }

    /// State of a session whose start failed.
    #[must_use]
    pub fn failed(epoch: u64, message: impl Into<String>) -> Self {
        Self {
            epoch,
            phase: Phase::Failed(message.into()),
            ..Self::default()
        }
    }

    // === Queries ===

    /// Position of a card in display order.
    #[must_use]
    pub fn index_of(&self, card_id: CardId) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }

    #[must_use]
    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    fn card_mut(&mut self, card_id: CardId) -> Option<&mut Card> {
        let index = self.index_of(card_id)?;
        self.cards.get_mut(index)
    }

    /// Are there cards on the table and are they all matched?
    #[must_use]
    pub fn all_matched(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(|c| c.is_matched)
    }

    /// Number of pairs found so far.
    #[must_use]
    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.is_matched).count() / 2
    }

    /// Number of pairs dealt.
    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.cards.len() / 2
    }

    /// The mismatched pair waiting to be turned back, if any.
    #[must_use]
    pub fn pending_pair(&self) -> Option<(CardId, CardId)> {
        self.first_selected.zip(self.second_selected)
    }

    // === Transitions ===

    /// Handle a tap on a card.
    ///
    /// Ignored unless the session is playing and the card exists and is
    /// face-down. Ineligible taps are never errors.
    pub fn tap(&mut self, card_id: CardId) -> TapOutcome {
        if !self.phase.is_playing() {
            return TapOutcome::Ignored;
        }
        match self.card(card_id) {
            Some(card) if card.is_covered => {}
            _ => return TapOutcome::Ignored,
        }

        match (self.first_selected, self.second_selected) {
            (None, _) => {
                self.first_selected = Some(card_id);
                self.flip_up(card_id);
                TapOutcome::Revealed
            }
            (Some(first), None) if first != card_id => {
                self.second_selected = Some(card_id);
                self.flip_up(card_id);
                self.evaluate_pair(first, card_id)
            }
            _ => TapOutcome::Ignored,
        }
    }

    /// Turn a mismatched pair face-down again and free both slots.
    ///
    /// Returns false (and changes nothing) if `first`/`second` are not the
    /// pair currently held, e.g. because a new session started meanwhile.
    pub fn resolve_mismatch(&mut self, first: CardId, second: CardId) -> bool {
        if self.pending_pair() != Some((first, second)) {
            return false;
        }
        for id in [first, second] {
            if let Some(card) = self.card_mut(id) {
                card.cover();
            }
        }
        self.first_selected = None;
        self.second_selected = None;
        true
    }

    /// Advance the clock by one second while playing.
    pub fn tick(&mut self) -> bool {
        if !self.phase.is_playing() {
            return false;
        }
        self.elapsed_seconds += 1;
        true
    }

    fn flip_up(&mut self, card_id: CardId) {
        if let Some(card) = self.card_mut(card_id) {
            card.flip_up();
        }
    }

    fn evaluate_pair(&mut self, first: CardId, second: CardId) -> TapOutcome {
        let is_pair = match (self.card(first), self.card(second)) {
            (Some(a), Some(b)) => a.pairs_with(b),
            _ => false,
        };

        if is_pair {
            for id in [first, second] {
                if let Some(card) = self.card_mut(id) {
                    card.mark_matched();
                }
            }
            self.first_selected = None;
            self.second_selected = None;

            let finished = self.all_matched();
            if finished {
                self.phase = Phase::Finished;
            }
            TapOutcome::Matched { finished }
        } else {
            for id in [first, second] {
                if let Some(card) = self.card_mut(id) {
                    card.set_shaking(true);
                }
            }
            TapOutcome::Mismatched { first, second }
        }
    }

    // === Invariants ===

    /// Check the structural invariants of the session.
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut ids: Vec<CardId> = self.cards.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.cards.len() {
            return Err("card ids are not unique".to_string());
        }

        if let Some((image, count)) = pair_counts(self.cards.iter())
            .into_iter()
            .find(|&(_, count)| count != 2)
        {
            return Err(format!("image {image} appears on {count} cards"));
        }

        for card in &self.cards {
            if card.is_matched && card.is_covered {
                return Err(format!("{} is matched but covered", card.id));
            }
            if card.is_revealed == card.is_covered {
                return Err(format!("{} revealed flag disagrees with cover", card.id));
            }
            if card.is_shaking && !card.is_pending() {
                return Err(format!("{} is shaking while not pending", card.id));
            }
        }

        let pending = self.cards.iter().filter(|c| c.is_pending()).count();
        if pending > 2 {
            return Err(format!("{pending} unmatched cards are face-up"));
        }

        let selected = [self.first_selected, self.second_selected]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        if selected.len() != pending {
            return Err(format!(
                "{} cards selected but {pending} face-up and unmatched",
                selected.len()
            ));
        }
        for id in selected {
            if !self.card(id).is_some_and(Card::is_pending) {
                return Err(format!("selected {id} is not face-up and unmatched"));
            }
        }

        if self.phase.is_finished() != self.all_matched() {
            return Err(format!(
                "phase {:?} disagrees with all-matched = {}",
                self.phase,
                self.all_matched()
            ));
        }

        Ok(())
    }
}
