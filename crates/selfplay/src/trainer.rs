use anyhow::Result;
use ndarray::{Axis, Slice};
use othello_nn::{Loss, NnModel};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::data::TrainingExample;
use crate::storage::to_arrays;

/// Produces a new model version from the current best and a training buffer
pub trait Trainer<M> {
    fn train(&mut self, model: &M, examples: &[TrainingExample]) -> Result<M>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgdTrainerConfig {
    pub learning_rate: f32,
    pub epochs: usize,
    pub batch_size: usize,
    /// Shuffle seed; entropy when unset
    pub seed: Option<u64>,
}

impl SgdTrainerConfig {
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for SgdTrainerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            epochs: 4,
            batch_size: 64,
            seed: None,
        }
    }
}

/// Mini-batch gradient descent on a copy of the model
pub struct SgdTrainer {
    config: SgdTrainerConfig,
    rng: StdRng,
    last_loss: Option<Loss>,
}

impl SgdTrainer {
    pub fn new(config: SgdTrainerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            last_loss: None,
        }
    }

    /// Mean loss of the last epoch of the most recent `train` call
    pub fn last_loss(&self) -> Option<Loss> {
        self.last_loss
    }
}

impl Trainer<NnModel> for SgdTrainer {
    fn train(&mut self, model: &NnModel, examples: &[TrainingExample]) -> Result<NnModel> {
        let mut trained = model.clone();
        if examples.is_empty() {
            log::warn!("empty training buffer, keeping model unchanged");
            return Ok(trained);
        }

        let (states, policies, values) =
            to_arrays(examples, model.input_len(), model.policy_len())?;
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let batch_size = self.config.batch_size.max(1);

        for epoch in 0..self.config.epochs {
            order.shuffle(&mut self.rng);
            let states = states.select(Axis(0), &order);
            let policies = policies.select(Axis(0), &order);
            let values = values.select(Axis(0), &order);

            let mut total = Loss {
                policy: 0.0,
                value: 0.0,
            };
            let mut batches = 0;
            for start in (0..order.len()).step_by(batch_size) {
                let rows = Slice::from(start..(start + batch_size).min(order.len()));
                let loss = trained.train_step(
                    states.slice_axis(Axis(0), rows),
                    policies.slice_axis(Axis(0), rows),
                    values.slice_axis(Axis(0), rows),
                    self.config.learning_rate,
                )?;
                total.policy += loss.policy;
                total.value += loss.value;
                batches += 1;
            }

            let mean = Loss {
                policy: total.policy / batches as f32,
                value: total.value / batches as f32,
            };
            log::debug!(
                "epoch {}: policy loss {:.4}, value loss {:.4}",
                epoch,
                mean.policy,
                mean.value
            );
            self.last_loss = Some(mean);
        }

        Ok(trained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examples(feature_len: usize, policy_len: usize) -> Vec<TrainingExample> {
        (0..12)
            .map(|i| {
                let mut state = vec![0.0; feature_len];
                state[i % feature_len] = 1.0;
                let mut policy = vec![0.0; policy_len];
                policy[i % 2] = 1.0;
                let value = if i % 2 == 0 { 1.0 } else { -1.0 };
                TrainingExample::new(state, policy, value)
            })
            .collect()
    }

    #[test]
    fn test_training_reduces_loss() {
        let model = NnModel::zeros(16, 5);
        let data = examples(16, 5);
        let config = SgdTrainerConfig::default()
            .with_learning_rate(0.5)
            .with_batch_size(4)
            .with_seed(3);

        let mut short = SgdTrainer::new(config.clone().with_epochs(1));
        short.train(&model, &data).unwrap();
        let mut long = SgdTrainer::new(config.with_epochs(30));
        long.train(&model, &data).unwrap();

        assert!(long.last_loss().unwrap().total() < short.last_loss().unwrap().total());
    }

    #[test]
    fn test_training_leaves_input_model_untouched() {
        let model = NnModel::zeros(16, 5);
        let mut trainer = SgdTrainer::new(SgdTrainerConfig::default().with_seed(1));
        let trained = trainer.train(&model, &examples(16, 5)).unwrap();

        assert_eq!(model, NnModel::zeros(16, 5));
        assert_ne!(trained, model);
    }

    #[test]
    fn test_seeded_training_is_reproducible() {
        let model = NnModel::random(16, 5, 4);
        let data = examples(16, 5);
        let config = SgdTrainerConfig::default().with_batch_size(5).with_seed(8);

        let a = SgdTrainer::new(config.clone()).train(&model, &data).unwrap();
        let b = SgdTrainer::new(config).train(&model, &data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrong_shapes_fail() {
        let model = NnModel::zeros(16, 5);
        let mut trainer = SgdTrainer::new(SgdTrainerConfig::default());
        assert!(trainer.train(&model, &examples(8, 5)).is_err());
    }

    #[test]
    fn test_empty_buffer_returns_copy() {
        let model = NnModel::random(16, 5, 2);
        let mut trainer = SgdTrainer::new(SgdTrainerConfig::default());
        assert_eq!(trainer.train(&model, &[]).unwrap(), model);
    }
}
