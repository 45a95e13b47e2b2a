//! Self-play system for AlphaZero-style reinforcement learning
//!
//! This crate provides functionality for:
//! - Playing self-play games using MCTS, sequentially or on worker threads
//! - Converting games to training examples
//! - Saving training data to NPY files
//! - Evaluation matches between two model versions
//! - The self-play / train / evaluate / promote cycle
//!
//! # Example
//!
//! ```
//! use othello_core::BoardConfig;
//! use othello_mcts::MctsConfig;
//! use othello_nn::NnModel;
//! use othello_selfplay::{game_to_training_examples, play_game, SelfPlayConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let board = BoardConfig::new(4, 4);
//! let model = NnModel::zeros(board.feature_len(), board.policy_len());
//!
//! let config = SelfPlayConfig::default().with_mcts(
//!     MctsConfig::default()
//!         .with_simulations(8)
//!         .with_temperature(1.0)
//!         .with_seed(42),
//! );
//!
//! let record = play_game(&model, &board, &config)?;
//! let examples = game_to_training_examples(&record);
//! assert_eq!(examples.len(), record.len());
//! # Ok(())
//! # }
//! ```

mod arena;
mod config;
mod cycle;
mod data;
mod error;
mod game;
mod parallel;
pub mod storage;
mod stream;
mod trainer;

// Re-export public API
pub use arena::{evaluate_models, play_match, MatchReport};
pub use config::SelfPlayConfig;
pub use cycle::{
    CycleConfig, CycleReport, CycleStage, CycleSummary, ModelRepository, NpyModelRepository,
    TrainingCycle,
};
pub use data::{GameRecord, GameResult, TrainingExample};
pub use error::{CycleError, SelfPlayError};
pub use game::{game_to_training_examples, play_game, play_game_with};
pub use parallel::play_games_parallel;
pub use storage::{load_training_data, sanitize_examples, save_training_data};
pub use stream::SelfPlayStream;
pub use trainer::{SgdTrainer, SgdTrainerConfig, Trainer};
