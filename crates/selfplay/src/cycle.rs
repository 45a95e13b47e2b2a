use std::fmt;
use std::path::PathBuf;

use anyhow::Context;
use othello_core::BoardConfig;
use othello_mcts::{MctsConfig, PolicyValueModel};
use othello_nn::NnModel;
use serde::{Deserialize, Serialize};

use crate::arena::{evaluate_models, MatchReport};
use crate::config::SelfPlayConfig;
use crate::data::TrainingExample;
use crate::error::CycleError;
use crate::game::game_to_training_examples;
use crate::parallel::play_games_parallel;
use crate::storage::{sanitize_examples, save_training_data};
use crate::stream::SelfPlayStream;
use crate::trainer::Trainer;

/// Where a model version lives between cycles
pub trait ModelRepository {
    type Model;

    fn load_best(&self) -> anyhow::Result<Self::Model>;
    fn save_best(&mut self, model: &Self::Model) -> anyhow::Result<()>;
    fn save_latest(&mut self, model: &Self::Model) -> anyhow::Result<()>;
}

/// Stores `best/` and `latest/` model directories under one root
#[derive(Debug, Clone)]
pub struct NpyModelRepository {
    root: PathBuf,
}

impl NpyModelRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn best_dir(&self) -> PathBuf {
        self.root.join("best")
    }

    pub fn latest_dir(&self) -> PathBuf {
        self.root.join("latest")
    }
}

impl ModelRepository for NpyModelRepository {
    type Model = NnModel;

    fn load_best(&self) -> anyhow::Result<NnModel> {
        let dir = self.best_dir();
        NnModel::load(&dir).with_context(|| format!("loading best model from {}", dir.display()))
    }

    fn save_best(&mut self, model: &NnModel) -> anyhow::Result<()> {
        let dir = self.best_dir();
        model
            .save(&dir)
            .with_context(|| format!("saving best model to {}", dir.display()))
    }

    fn save_latest(&mut self, model: &NnModel) -> anyhow::Result<()> {
        let dir = self.latest_dir();
        model
            .save(&dir)
            .with_context(|| format!("saving latest model to {}", dir.display()))
    }
}

/// Settings for the self-play / train / evaluate loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub board: BoardConfig,
    pub cycles: usize,
    pub self_play: SelfPlayConfig,
    pub eval_games: usize,
    pub eval_temperature: f32,
    /// Latest replaces best only when its score is strictly above this
    pub promotion_threshold: f32,
    /// Write each cycle's training buffer as NPY files here
    pub export_dir: Option<PathBuf>,
}

impl CycleConfig {
    pub fn with_board(mut self, board: BoardConfig) -> Self {
        self.board = board;
        self
    }

    pub fn with_cycles(mut self, cycles: usize) -> Self {
        self.cycles = cycles;
        self
    }

    pub fn with_self_play(mut self, self_play: SelfPlayConfig) -> Self {
        self.self_play = self_play;
        self
    }

    pub fn with_eval_games(mut self, games: usize) -> Self {
        self.eval_games = games;
        self
    }

    pub fn with_promotion_threshold(mut self, threshold: f32) -> Self {
        self.promotion_threshold = threshold;
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    /// Search settings for evaluation games: no root noise, eval temperature
    pub fn eval_mcts(&self) -> MctsConfig {
        self.self_play
            .mcts
            .clone()
            .without_dirichlet_noise()
            .with_temperature(self.eval_temperature)
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            cycles: 10,
            self_play: SelfPlayConfig::default(),
            eval_games: 20,
            eval_temperature: 0.0,
            promotion_threshold: 0.5,
            export_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    LoadBest,
    SelfPlay,
    Export,
    Train,
    SaveLatest,
    Evaluate,
    Promote,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleStage::LoadBest => "load best",
            CycleStage::SelfPlay => "self-play",
            CycleStage::Export => "export",
            CycleStage::Train => "training",
            CycleStage::SaveLatest => "save latest",
            CycleStage::Evaluate => "evaluation",
            CycleStage::Promote => "promotion",
        };
        f.write_str(name)
    }
}

/// What happened in one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: usize,
    pub games: usize,
    pub examples: usize,
    pub evaluation: MatchReport,
    pub promoted: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSummary {
    pub cycles: Vec<CycleReport>,
}

impl CycleSummary {
    pub fn promotions(&self) -> usize {
        self.cycles.iter().filter(|c| c.promoted).count()
    }
}

/// Runs `config.cycles` rounds of self-play, training, evaluation and promotion.
///
/// Only the best model carries over between cycles; each cycle's training
/// buffer is dropped once the trainer has consumed it.
pub struct TrainingCycle<R, T> {
    config: CycleConfig,
    repository: R,
    trainer: T,
}

impl<R, T> TrainingCycle<R, T> {
    pub fn new(config: CycleConfig, repository: R, trainer: T) -> Self {
        Self {
            config,
            repository,
            trainer,
        }
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_repository(self) -> R {
        self.repository
    }

    pub fn run(&mut self) -> Result<CycleSummary, CycleError>
    where
        R: ModelRepository,
        R::Model: PolicyValueModel + Sync,
        T: Trainer<R::Model>,
    {
        let mut summary = CycleSummary::default();
        for cycle in 0..self.config.cycles {
            summary.cycles.push(self.run_cycle(cycle)?);
        }
        log::info!(
            "finished {} cycles, {} promotions",
            summary.cycles.len(),
            summary.promotions()
        );
        Ok(summary)
    }

    fn run_cycle(&mut self, cycle: usize) -> Result<CycleReport, CycleError>
    where
        R: ModelRepository,
        R::Model: PolicyValueModel + Sync,
        T: Trainer<R::Model>,
    {
        let best = self
            .repository
            .load_best()
            .map_err(|e| CycleError::new(cycle, CycleStage::LoadBest, e))?;

        log::info!("cycle {}: self-play ({} games)", cycle, self.config.self_play.games);
        let buffer = self
            .self_play(&best)
            .map_err(|e| CycleError::new(cycle, CycleStage::SelfPlay, e))?;
        let examples = buffer.len();

        if let Some(dir) = &self.config.export_dir {
            export_buffer(dir, cycle, &buffer)
                .map_err(|e| CycleError::new(cycle, CycleStage::Export, e))?;
        }

        log::info!("cycle {}: training on {} examples", cycle, examples);
        let latest = self
            .trainer
            .train(&best, &buffer)
            .map_err(|e| CycleError::new(cycle, CycleStage::Train, e))?;
        drop(buffer);
        self.repository
            .save_latest(&latest)
            .map_err(|e| CycleError::new(cycle, CycleStage::SaveLatest, e))?;

        let evaluation = evaluate_models(
            &latest,
            &best,
            &self.config.board,
            self.config.eval_games,
            &self.config.eval_mcts(),
        )
        .map_err(|e| CycleError::new(cycle, CycleStage::Evaluate, e))?;

        let promoted = evaluation.score() > self.config.promotion_threshold;
        log::info!(
            "cycle {}: latest vs best {}-{}-{} (score {:.3}), {}",
            cycle,
            evaluation.wins,
            evaluation.draws,
            evaluation.losses,
            evaluation.score(),
            if promoted { "promoted" } else { "kept best" }
        );
        if promoted {
            self.repository
                .save_best(&latest)
                .map_err(|e| CycleError::new(cycle, CycleStage::Promote, e))?;
        }

        Ok(CycleReport {
            cycle,
            games: self.config.self_play.games,
            examples,
            evaluation,
            promoted,
        })
    }

    fn self_play<M>(&self, model: &M) -> anyhow::Result<Vec<TrainingExample>>
    where
        M: PolicyValueModel + Sync,
    {
        let board = &self.config.board;
        let config = &self.config.self_play;

        let mut buffer = Vec::new();
        if config.threads > 1 {
            for record in play_games_parallel(model, board, config)? {
                buffer.extend(game_to_training_examples(&record));
            }
        } else {
            for game in SelfPlayStream::new(model, board.clone(), config.clone()) {
                buffer.extend(game?);
            }
        }

        Ok(sanitize_examples(
            buffer,
            board.feature_len(),
            board.policy_len(),
        ))
    }
}

fn export_buffer(
    dir: &std::path::Path,
    cycle: usize,
    buffer: &[TrainingExample],
) -> anyhow::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;
    save_training_data(buffer, dir.join(format!("cycle_{:04}", cycle)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_mcts_disables_noise() {
        let mut config = CycleConfig::default();
        config.self_play.mcts = MctsConfig::default()
            .with_temperature(1.0)
            .with_dirichlet_noise(0.3, 0.25);
        config.eval_temperature = 0.0;

        let eval = config.eval_mcts();
        assert!(!eval.add_dirichlet_noise);
        assert_eq!(eval.temperature, 0.0);
        assert_eq!(eval.num_simulations, config.self_play.mcts.num_simulations);
    }

    #[test]
    fn test_stage_display() {
        let err = CycleError::new(3, CycleStage::Train, anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "Cycle 3 failed during training: boom");
    }

    #[test]
    fn test_npy_repository_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = NpyModelRepository::new(dir.path());
        let model = NnModel::random(16, 5, 7);

        assert!(repo.load_best().is_err());
        repo.save_best(&model).unwrap();
        repo.save_latest(&NnModel::zeros(16, 5)).unwrap();

        assert_eq!(repo.load_best().unwrap(), model);
        assert!(repo.latest_dir().join("policy_weight.npy").exists());
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: CycleConfig =
            serde_json::from_str(r#"{"cycles": 2, "board": {"rows": 4, "cols": 4}}"#).unwrap();
        assert_eq!(config.cycles, 2);
        assert_eq!(config.board.rows, 4);
        assert_eq!(config.promotion_threshold, 0.5);
        assert_eq!(config.self_play, SelfPlayConfig::default());
    }
}
