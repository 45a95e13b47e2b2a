use std::fs;
use std::path::Path;

use ndarray::{Array, Array1, Array2, ArrayView1, ArrayView2};
use ndarray_npy::{read_npy, write_npy};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{NnError, Result};

const POLICY_WEIGHT: &str = "policy_weight.npy";
const POLICY_BIAS: &str = "policy_bias.npy";
const VALUE_WEIGHT: &str = "value_weight.npy";
const VALUE_BIAS: &str = "value_bias.npy";

/// Single-layer policy/value predictor.
///
/// The policy head produces one logit per policy slot, the value head a tanh
/// squashed scalar in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct NnModel {
    pub(crate) policy_weight: Array2<f32>,
    pub(crate) policy_bias: Array1<f32>,
    pub(crate) value_weight: Array1<f32>,
    pub(crate) value_bias: Array1<f32>,
}

impl NnModel {
    /// Model whose parameters are all zero (uniform policy, zero value)
    pub fn zeros(input_len: usize, policy_len: usize) -> Self {
        Self {
            policy_weight: Array2::zeros((policy_len, input_len)),
            policy_bias: Array1::zeros(policy_len),
            value_weight: Array1::zeros(input_len),
            value_bias: Array1::zeros(1),
        }
    }

    /// Model with small uniformly random weights
    pub fn random(input_len: usize, policy_len: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let scale = 1.0 / (input_len.max(1) as f32).sqrt();
        let dist = Uniform::new_inclusive(-scale, scale);

        Self {
            policy_weight: Array::from_shape_fn((policy_len, input_len), |_| dist.sample(&mut rng)),
            policy_bias: Array1::zeros(policy_len),
            value_weight: Array::from_shape_fn(input_len, |_| dist.sample(&mut rng)),
            value_bias: Array1::zeros(1),
        }
    }

    pub fn input_len(&self) -> usize {
        self.value_weight.len()
    }

    pub fn policy_len(&self) -> usize {
        self.policy_bias.len()
    }

    /// Evaluate one input vector, returning (policy logits, value)
    pub fn forward(&self, input: ArrayView1<f32>) -> Result<(Array1<f32>, f32)> {
        self.check_input(input.len())?;
        let logits = self.policy_weight.dot(&input) + &self.policy_bias;
        let value = (self.value_weight.dot(&input) + self.value_bias[0]).tanh();
        Ok((logits, value))
    }

    /// Evaluate a batch of inputs (one per row)
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Result<(Array2<f32>, Array1<f32>)> {
        self.check_input(inputs.ncols())?;
        let logits = inputs.dot(&self.policy_weight.t()) + &self.policy_bias;
        let values = (inputs.dot(&self.value_weight) + self.value_bias[0]).mapv(f32::tanh);
        Ok((logits, values))
    }

    fn check_input(&self, got: usize) -> Result<()> {
        if got != self.input_len() {
            return Err(NnError::ShapeMismatch {
                what: "input",
                expected: self.input_len(),
                got,
            });
        }
        Ok(())
    }

    /// Load a model saved by [`NnModel::save`] from `dir`
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let model = Self {
            policy_weight: read(dir, POLICY_WEIGHT)?,
            policy_bias: read(dir, POLICY_BIAS)?,
            value_weight: read(dir, VALUE_WEIGHT)?,
            value_bias: read(dir, VALUE_BIAS)?,
        };
        model.check_consistent()?;
        Ok(model)
    }

    /// Write the parameters as four `.npy` files under `dir`, creating it if needed
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        write(dir, POLICY_WEIGHT, &self.policy_weight)?;
        write(dir, POLICY_BIAS, &self.policy_bias)?;
        write(dir, VALUE_WEIGHT, &self.value_weight)?;
        write(dir, VALUE_BIAS, &self.value_bias)?;
        Ok(())
    }

    fn check_consistent(&self) -> Result<()> {
        let (policy_len, input_len) = self.policy_weight.dim();
        let checks = [
            ("policy bias", policy_len, self.policy_bias.len()),
            ("value weight", input_len, self.value_weight.len()),
            ("value bias", 1, self.value_bias.len()),
        ];
        for (what, expected, got) in checks {
            if expected != got {
                return Err(NnError::ShapeMismatch {
                    what,
                    expected,
                    got,
                });
            }
        }
        Ok(())
    }
}

fn read<D>(dir: &Path, name: &str) -> Result<Array<f32, D>>
where
    D: ndarray::Dimension,
{
    let path = dir.join(name);
    read_npy(&path).map_err(|source| NnError::Read { path, source })
}

fn write<D>(dir: &Path, name: &str, array: &Array<f32, D>) -> Result<()>
where
    D: ndarray::Dimension,
{
    let path = dir.join(name);
    write_npy(&path, array).map_err(|source| NnError::Write { path, source })
}
