//! AlphaZero-style PV-MCTS for the Othello variant in `othello-core`.
//!
//! ```
//! use othello_core::{BoardConfig, GameState};
//! use othello_mcts::{Mcts, MctsConfig};
//! use othello_nn::NnModel;
//!
//! let state = GameState::new(&BoardConfig::default()).unwrap();
//! let model = NnModel::zeros(state.feature_len(), state.policy_len());
//! let config = MctsConfig::default().with_simulations(16).with_temperature(0.0);
//!
//! let result = Mcts::with_seed(1).search(&state, &model, &config).unwrap();
//! assert!(state.legal_actions().contains(&result.action));
//! ```

// Module declarations
mod backup;
mod config;
mod dirichlet;
mod error;
mod evaluation;
mod expansion;
mod mcts;
mod search_result;
mod selection;
mod tree;

// Public exports
pub use config::MctsConfig;
pub use error::{MctsError, Result};
pub use evaluation::{predict, softmax_legal_actions, PolicyValueModel, Prediction};
pub use mcts::Mcts;
pub use search_result::SearchResult;
