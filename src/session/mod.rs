//! Game sessions: the matching state machine and the actor that runs it.
//!
//! ## Key Types
//!
//! - `SessionState`: Immutable-by-convention snapshot with pure transitions
//! - `Phase`: Idle, Loading, Playing, Finished, Failed
//! - `GameController` / `GameHandle`: Single-writer actor plus its handle
//! - `StateStore` / `Subscription`: Ordered snapshot delivery

pub mod controller;
pub mod state;
pub mod store;

pub use controller::{
    GameController, GameHandle, LOAD_ERROR_MESSAGE, NO_PAIRS_MESSAGE, TOO_MANY_PAIRS_MESSAGE,
};
pub use state::{Phase, SessionState, TapOutcome};
pub use store::{Snapshot, StateReader, StateStore, Subscription};
