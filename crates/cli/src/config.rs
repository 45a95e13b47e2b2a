use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use othello_selfplay::{CycleConfig, SgdTrainerConfig};
use serde::Deserialize;

/// Contents of a JSON config file: cycle settings plus a `trainer` section
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    #[serde(flatten)]
    pub cycle: CycleConfig,
    pub trainer: SgdTrainerConfig,
}

/// Read the config file; missing fields take their defaults
pub fn load_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: FileConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config
        .cycle
        .board
        .validate()
        .with_context(|| format!("invalid board in {}", path.display()))?;
    Ok(config)
}

/// Command line values that replace config file entries
#[derive(Debug, Default, Clone, clap::Args)]
pub struct Overrides {
    /// Games per self-play run
    #[arg(long)]
    pub games: Option<usize>,

    /// MCTS simulations per move
    #[arg(long)]
    pub simulations: Option<u32>,

    /// Self-play worker threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// Seed for search sampling and noise
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, mut config: CycleConfig) -> CycleConfig {
        let self_play = &mut config.self_play;
        if let Some(games) = self.games {
            self_play.games = games;
        }
        if let Some(simulations) = self.simulations {
            self_play.mcts.num_simulations = simulations;
        }
        if let Some(threads) = self.threads {
            self_play.threads = threads.max(1);
        }
        if let Some(seed) = self.seed {
            self_play.mcts.seed = Some(seed);
        }
        config
    }
}
