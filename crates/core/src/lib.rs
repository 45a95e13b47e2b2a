//! Game rules for an Othello variant played on a configurable board of up to
//! 64 cells, optionally with permanently blocked cells.
//!
//! ```
//! use othello_core::{Action, BoardConfig, GameState};
//!
//! let state = GameState::new(&BoardConfig::default()).unwrap();
//! let next = state.next(state.legal_actions()[0]).unwrap();
//! assert_eq!(next.depth(), 1);
//! assert_ne!(next.legal_actions(), vec![Action::Pass]);
//! ```

mod action;
mod config;
mod error;
mod state;

/// Feature planes per cell: own, opponent, empty, blocked
pub const FEATURE_PLANES: usize = 4;

pub use action::Action;
pub use config::{BoardConfig, MAX_CELLS};
pub use error::{BoardError, Result};
pub use state::{Cell, GameState, Player};
