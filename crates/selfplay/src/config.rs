use othello_mcts::MctsConfig;
use serde::{Deserialize, Serialize};

/// Settings for generating self-play games
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// Search settings; `mcts.temperature` applies until the cutoff ply
    pub mcts: MctsConfig,

    /// Ply from which moves are picked greedily
    pub temperature_cutoff_ply: u32,

    /// Number of games to play
    pub games: usize,

    /// Worker threads for parallel self-play (1 = sequential)
    pub threads: usize,
}

impl SelfPlayConfig {
    pub fn with_mcts(mut self, mcts: MctsConfig) -> Self {
        self.mcts = mcts;
        self
    }

    pub fn with_games(mut self, games: usize) -> Self {
        self.games = games;
        self
    }

    pub fn with_temperature_cutoff(mut self, ply: u32) -> Self {
        self.temperature_cutoff_ply = ply;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Search settings for the move at `ply`
    pub fn mcts_for_ply(&self, ply: u32) -> MctsConfig {
        if ply < self.temperature_cutoff_ply {
            self.mcts.clone()
        } else {
            self.mcts.clone().with_temperature(0.0)
        }
    }
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            mcts: MctsConfig::default(),
            temperature_cutoff_ply: 30,
            games: 100,
            threads: 1,
        }
    }
}
