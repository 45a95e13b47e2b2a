use ndarray::{Array2, ArrayView1, ArrayView2, Axis, Zip};

use crate::error::{NnError, Result};
use crate::model::NnModel;

/// Losses measured on a batch before the parameter update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loss {
    /// Cross-entropy between target policy and predicted softmax
    pub policy: f32,
    /// Mean squared error of the value head
    pub value: f32,
}

impl Loss {
    pub fn total(&self) -> f32 {
        self.policy + self.value
    }
}

impl NnModel {
    /// One gradient descent step on a batch.
    ///
    /// `states` is (N, input_len), `policies` is (N, policy_len) and
    /// `values` is (N). Returns the loss before the update.
    pub fn train_step(
        &mut self,
        states: ArrayView2<f32>,
        policies: ArrayView2<f32>,
        values: ArrayView1<f32>,
        learning_rate: f32,
    ) -> Result<Loss> {
        let n = states.nrows();
        if n == 0 {
            return Err(NnError::EmptyBatch);
        }
        check_rows("policies", n, policies.nrows())?;
        check_rows("values", n, values.len())?;
        if policies.ncols() != self.policy_len() {
            return Err(NnError::ShapeMismatch {
                what: "policy target",
                expected: self.policy_len(),
                got: policies.ncols(),
            });
        }

        let (logits, predicted) = self.forward_batch(states)?;
        let probs = softmax_rows(&logits);
        let scale = 1.0 / n as f32;

        // Policy head: d(cross-entropy)/d(logits) = softmax - target
        let log_probs = probs.mapv(|p| p.max(1e-12).ln());
        let policy_loss = -(&policies * &log_probs).sum() * scale;
        let grad_logits = (&probs - &policies) * scale;
        let grad_policy_weight = grad_logits.t().dot(&states);
        let grad_policy_bias = grad_logits.sum_axis(Axis(0));

        // Value head: loss (tanh(u) - z)^2
        let value_loss = Zip::from(&predicted)
            .and(&values)
            .fold(0.0f32, |acc, &v, &z| acc + (v - z) * (v - z))
            * scale;
        let grad_pre = Zip::from(&predicted)
            .and(&values)
            .map_collect(|&v, &z| 2.0 * (v - z) * (1.0 - v * v) * scale);
        let grad_value_weight = states.t().dot(&grad_pre);
        let grad_value_bias = grad_pre.sum();

        self.policy_weight
            .scaled_add(-learning_rate, &grad_policy_weight);
        self.policy_bias.scaled_add(-learning_rate, &grad_policy_bias);
        self.value_weight
            .scaled_add(-learning_rate, &grad_value_weight);
        self.value_bias[0] -= learning_rate * grad_value_bias;

        Ok(Loss {
            policy: policy_loss,
            value: value_loss,
        })
    }
}

fn check_rows(what: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(NnError::ShapeMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

/// Row-wise numerically stable softmax
pub fn softmax_rows(logits: &Array2<f32>) -> Array2<f32> {
    let mut probs = logits.clone();
    for mut row in probs.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
        row.mapv_inplace(|x| (x - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|x| x / sum);
    }
    probs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let logits = array![[1.0f32, 2.0, 3.0], [1000.0, 1000.0, 1000.0]];
        let probs = softmax_rows(&logits);
        for row in probs.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-5);
        }
        assert!(probs[[0, 2]] > probs[[0, 1]]);
        assert_relative_eq!(probs[[1, 0]], 1.0 / 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_training_reduces_loss() {
        let mut model = NnModel::zeros(4, 3);
        let states = array![[1.0f32, 0.0, 0.0, 1.0], [0.0, 1.0, 1.0, 0.0]];
        let policies = array![[1.0f32, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let values = array![1.0f32, -1.0];

        let first = model
            .train_step(states.view(), policies.view(), values.view(), 0.5)
            .unwrap();
        let mut last = first;
        for _ in 0..50 {
            last = model
                .train_step(states.view(), policies.view(), values.view(), 0.5)
                .unwrap();
        }

        assert!(last.total() < first.total());
        let (logits, value) = model.forward(states.row(0)).unwrap();
        assert!(logits[0] > logits[1] && logits[0] > logits[2]);
        assert!(value > 0.0);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let mut model = NnModel::zeros(4, 3);
        let states = Array2::<f32>::zeros((0, 4));
        let policies = Array2::<f32>::zeros((0, 3));
        let values = Array1::<f32>::zeros(0);
        assert!(matches!(
            model.train_step(states.view(), policies.view(), values.view(), 0.1),
            Err(NnError::EmptyBatch)
        ));
    }

    #[test]
    fn test_policy_width_must_match() {
        let mut model = NnModel::zeros(4, 3);
        let states = Array2::<f32>::zeros((1, 4));
        let policies = Array2::<f32>::zeros((1, 5));
        let values = Array1::<f32>::zeros(1);
        assert!(model
            .train_step(states.view(), policies.view(), values.view(), 0.1)
            .is_err());
    }
}
