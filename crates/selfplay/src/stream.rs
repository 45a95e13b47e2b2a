use anyhow::Result;
use othello_core::BoardConfig;
use othello_mcts::{Mcts, PolicyValueModel};

use crate::config::SelfPlayConfig;
use crate::data::TrainingExample;
use crate::game::{game_to_training_examples, play_game_with};

/// Lazily plays `config.games` self-play games, one per `next()` call.
///
/// Each item holds the training examples of one finished game. The stream
/// ends after the configured number of games, or right after the first
/// error, and cannot be restarted.
pub struct SelfPlayStream<'a, M> {
    model: &'a M,
    board: BoardConfig,
    config: SelfPlayConfig,
    mcts: Mcts,
    played: usize,
    failed: bool,
}

impl<'a, M: PolicyValueModel> SelfPlayStream<'a, M> {
    pub fn new(model: &'a M, board: BoardConfig, config: SelfPlayConfig) -> Self {
        let mcts = Mcts::from_config(&config.mcts);
        Self {
            model,
            board,
            config,
            mcts,
            played: 0,
            failed: false,
        }
    }

    /// Games finished so far
    pub fn games_played(&self) -> usize {
        self.played
    }
}

impl<M: PolicyValueModel> Iterator for SelfPlayStream<'_, M> {
    type Item = Result<Vec<TrainingExample>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.played >= self.config.games {
            return None;
        }

        match play_game_with(&mut self.mcts, self.model, &self.board, &self.config) {
            Ok(record) => {
                self.played += 1;
                Some(Ok(game_to_training_examples(&record)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed {
            0
        } else {
            self.config.games - self.played
        };
        (0, Some(remaining))
    }
}
