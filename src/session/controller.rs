//! Session controller: the single actor that owns the game.
//!
//! ## Message Flow
//!
//! ```text
//! GameHandle ──Command──▶ ┌────────────────┐ ──Snapshot──▶ Subscription
//!                          │ GameController │
//! fetch / ticker / delay ─▶└────────────────┘
//!              (Event, tagged with epoch)
//! ```
//!
//! Commands from handles and events from background tasks are both
//! processed on the controller task, one at a time, so the session state
//! needs no locks.
//!
//! ## Epochs
//!
//! Every `start_session` bumps the epoch. Background work (image fetch,
//! ticker, mismatch delay) carries the epoch it was started for, and the
//! controller drops anything whose epoch is no longer current. A slow
//! fetch from an abandoned session can therefore never overwrite a newer
//! one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::state::{SessionState, TapOutcome};
use super::store::{Snapshot, StateReader, StateStore, Subscription};
use crate::cards::{deal, select_distinct, CardId, CardImage};
use crate::core::{Error, GameConfig, GameRng, ImageSourceError, Result, MAX_PAIR_COUNT};
use crate::images::ImageSource;

/// Message shown to the player when images cannot be loaded.
pub const LOAD_ERROR_MESSAGE: &str = "Error loading images";

/// Message shown when a session is started with nothing to deal.
pub const NO_PAIRS_MESSAGE: &str = "No pairs to deal";

/// Message shown when a session asks for more than `MAX_PAIR_COUNT` pairs.
pub const TOO_MANY_PAIRS_MESSAGE: &str = "Too many pairs to deal";

const COMMAND_CAPACITY: usize = 32;

/// Requests from handles.
#[derive(Debug)]
enum Command {
    StartSession { pair_count: usize },
    Tap { card_id: CardId },
    Shutdown,
}

/// Reports from background tasks.
#[derive(Debug)]
enum Event {
    ImagesLoaded {
        epoch: u64,
        pair_count: usize,
        result: std::result::Result<Vec<CardImage>, ImageSourceError>,
    },
    Tick {
        epoch: u64,
    },
    MismatchElapsed {
        epoch: u64,
        first: CardId,
        second: CardId,
    },
}

/// The elapsed-time ticker of one session.
///
/// Stopped through the `watch` shutdown channel; the `JoinHandle` is
/// aborted as well so a task stuck between ticks cannot outlive it.
struct Ticker {
    epoch: u64,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn spawn(epoch: u64, period: Duration, events: mpsc::UnboundedSender<Event>) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            // First tick one full period after the session starts.
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if events.send(Event::Tick { epoch }).is_err() {
                            // Controller gone.
                            break;
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            trace!("Ticker for session {} stopped", epoch);
        });

        Self {
            epoch,
            shutdown_tx,
            handle,
        }
    }

    fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        self.handle.abort();
        debug!("Stopped ticker for session {}", self.epoch);
    }
}

/// Owner of the session state. Runs on its own task; talk to it through
/// a `GameHandle`.
pub struct GameController<S> {
    source: Arc<S>,
    config: GameConfig,
    rng: GameRng,
    state: SessionState,
    store: StateStore,
    epoch: u64,
    ticker: Option<Ticker>,
    pending_resolution: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<Event>,
}

impl<S: ImageSource + 'static> GameController<S> {
    /// Spawn a controller on the current tokio runtime.
    ///
    /// The controller starts `Idle`; call `GameHandle::start_session` (or
    /// `restart`) to deal the first game. It runs until `shutdown` is
    /// called or every handle has been dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(source: S, config: GameConfig) -> GameHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let state = SessionState::idle();
        let store = StateStore::new(state.clone(), config.event_capacity);
        let reader = store.reader();
        let rng = GameRng::from_seed_or_entropy(config.seed);
        debug!("Game controller using shuffle seed {}", rng.seed());

        let handle = GameHandle {
            commands: commands_tx,
            reader,
            default_pair_count: config.pair_count,
        };

        let controller = Self {
            source: Arc::new(source),
            config,
            rng,
            state,
            store,
            epoch: 0,
            ticker: None,
            pending_resolution: None,
            events_tx,
        };
        tokio::spawn(controller.run(commands_rx, events_rx));

        handle
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }

        self.stop_background_tasks();
        info!("Game controller stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::StartSession { pair_count } => self.start_session(pair_count),
            Command::Tap { card_id } => self.tap(card_id),
            Command::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::ImagesLoaded {
                epoch,
                pair_count,
                result,
            } => {
                if epoch != self.epoch {
                    debug!(
                        "Discarding images for superseded session {} (current {})",
                        epoch, self.epoch
                    );
                    return;
                }
                self.images_loaded(pair_count, result);
            }
            Event::Tick { epoch } => {
                if epoch == self.epoch && self.state.tick() {
                    self.publish();
                }
            }
            Event::MismatchElapsed {
                epoch,
                first,
                second,
            } => {
                if epoch != self.epoch {
                    return;
                }
                self.pending_resolution = None;
                if self.state.resolve_mismatch(first, second) {
                    trace!("Covered {} and {} again", first, second);
                    self.publish();
                }
            }
        }
    }

    // === Transitions ===

    fn start_session(&mut self, pair_count: usize) {
        self.stop_background_tasks();
        self.epoch += 1;
        let epoch = self.epoch;

        if pair_count == 0 {
            warn!("Session {} requested with zero pairs", epoch);
            self.replace_state(SessionState::failed(epoch, NO_PAIRS_MESSAGE));
            return;
        }
        if pair_count > MAX_PAIR_COUNT {
            warn!(
                "Session {} requested {} pairs, more than {}",
                epoch, pair_count, MAX_PAIR_COUNT
            );
            self.replace_state(SessionState::failed(epoch, TOO_MANY_PAIRS_MESSAGE));
            return;
        }

        info!("Starting session {} with {} pairs", epoch, pair_count);
        self.replace_state(SessionState::loading(epoch));

        let source = Arc::clone(&self.source);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch(pair_count).await;
            let _ = events.send(Event::ImagesLoaded {
                epoch,
                pair_count,
                result,
            });
        });
    }

    fn images_loaded(
        &mut self,
        pair_count: usize,
        result: std::result::Result<Vec<CardImage>, ImageSourceError>,
    ) {
        let epoch = self.epoch;
        match result.and_then(|images| select_distinct(images, pair_count)) {
            Ok(images) => {
                let mut rng = self.rng.for_session(epoch);
                let cards = deal(&images, &mut rng);
                info!("Session {} dealt {} cards", epoch, cards.len());

                self.replace_state(SessionState::playing(epoch, cards));
                self.ticker = Some(Ticker::spawn(
                    epoch,
                    self.config.tick_interval(),
                    self.events_tx.clone(),
                ));
            }
            Err(e) => {
                warn!("Failed to load images for session {}: {}", epoch, e);
                self.replace_state(SessionState::failed(epoch, LOAD_ERROR_MESSAGE));
            }
        }
    }

    fn tap(&mut self, card_id: CardId) {
        match self.state.tap(card_id) {
            TapOutcome::Ignored => {
                trace!("Ignored tap on {}", card_id);
            }
            TapOutcome::Revealed => {
                self.publish();
            }
            TapOutcome::Matched { finished } => {
                self.publish();
                if finished {
                    self.stop_ticker();
                    info!(
                        "Session {} finished in {} seconds",
                        self.epoch, self.state.elapsed_seconds
                    );
                }
            }
            TapOutcome::Mismatched { first, second } => {
                self.publish();
                self.schedule_mismatch_resolution(first, second);
            }
        }
    }

    fn schedule_mismatch_resolution(&mut self, first: CardId, second: CardId) {
        let epoch = self.epoch;
        let delay = self.config.mismatch_delay();
        let events = self.events_tx.clone();

        self.pending_resolution = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::MismatchElapsed {
                epoch,
                first,
                second,
            });
        }));
    }

    // === Helpers ===

    fn replace_state(&mut self, state: SessionState) {
        self.state = state;
        self.publish();
    }

    fn publish(&mut self) {
        debug_assert!(
            self.state.check_invariants().is_ok(),
            "{:?}",
            self.state.check_invariants()
        );
        self.store.publish(self.state.clone());
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    fn stop_background_tasks(&mut self) {
        self.stop_ticker();
        if let Some(handle) = self.pending_resolution.take() {
            handle.abort();
        }
    }
}

/// Cloneable handle for driving a `GameController`.
#[derive(Clone, Debug)]
pub struct GameHandle {
    commands: mpsc::Sender<Command>,
    reader: StateReader,
    default_pair_count: usize,
}

impl GameHandle {
    /// Discard the current session and start a new one with `pair_count`
    /// pairs.
    pub async fn start_session(&self, pair_count: usize) -> Result<()> {
        self.send(Command::StartSession { pair_count }).await
    }

    /// Start a new session with the configured number of pairs.
    pub async fn restart(&self) -> Result<()> {
        self.start_session(self.default_pair_count).await
    }

    /// Tap a card. Ineligible taps are silently ignored by the controller.
    pub async fn tap(&self, card_id: CardId) -> Result<()> {
        self.send(Command::Tap { card_id }).await
    }

    /// Stop the controller and every background task it owns.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.reader.current()
    }

    /// Subscribe to every snapshot published from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.reader.subscribe()
    }

    /// Number of pairs dealt by `restart`.
    #[must_use]
    pub fn default_pair_count(&self) -> usize {
        self.default_pair_count
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::ControllerClosed)
    }
}
