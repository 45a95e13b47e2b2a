use ndarray::{Array1, ArrayView1};
use othello_core::{Action, GameState};
use othello_nn::NnModel;

use crate::error::{MctsError, Result};

/// Minimal interface required from a policy-value network
pub trait PolicyValueModel {
    /// Map a feature vector to (policy logits over `cells + 1` slots, value)
    fn forward(&self, features: ArrayView1<f32>) -> othello_nn::Result<(Array1<f32>, f32)>;
}

impl PolicyValueModel for NnModel {
    fn forward(&self, features: ArrayView1<f32>) -> othello_nn::Result<(Array1<f32>, f32)> {
        NnModel::forward(self, features)
    }
}

impl<M: PolicyValueModel + ?Sized> PolicyValueModel for &M {
    fn forward(&self, features: ArrayView1<f32>) -> othello_nn::Result<(Array1<f32>, f32)> {
        (**self).forward(features)
    }
}

/// Evaluator output restricted to the legal actions of a state
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// (action, prior) for every legal action, ascending by action, summing to 1
    pub priors: Vec<(Action, f32)>,

    /// Position value for the player to move, in [-1, 1]
    pub value: f32,
}

/// Evaluate a position with the network
pub fn predict<M: PolicyValueModel>(state: &GameState, model: &M) -> Result<Prediction> {
    let (logits, value) = evaluate_with_nn(state, model)?;
    let priors = softmax_legal_actions(&logits, &state.legal_actions(), state.cell_count());
    Ok(Prediction {
        priors,
        value: value.clamp(-1.0, 1.0),
    })
}

/// Run the network on a position
///
/// Returns (policy_logits, value) where policy_logits has one entry per cell
/// plus the pass slot.
pub fn evaluate_with_nn<M: PolicyValueModel>(state: &GameState, model: &M) -> Result<(Vec<f32>, f32)> {
    let features = state.to_features();
    let (policy, value) = model.forward(ArrayView1::from(&features[..]))?;

    if policy.len() != state.policy_len() {
        return Err(MctsError::EvaluationFailed(format!(
            "Expected policy of length {}, got {}",
            state.policy_len(),
            policy.len()
        )));
    }
    if !value.is_finite() {
        return Err(MctsError::EvaluationFailed(format!("Non-finite value {value}")));
    }

    Ok((policy.to_vec(), value))
}

/// Compute softmax over legal actions only
///
/// Illegal slots get no probability; the remaining mass sums to 1. Falls back
/// to a uniform distribution when the logits are not usable.
pub fn softmax_legal_actions(logits: &[f32], legal: &[Action], cells: usize) -> Vec<(Action, f32)> {
    if legal.is_empty() {
        return Vec::new();
    }

    let max = legal
        .iter()
        .map(|a| logits[a.policy_index(cells)])
        .fold(f32::NEG_INFINITY, f32::max);

    let exp_vals: Vec<f32> = legal
        .iter()
        .map(|a| (logits[a.policy_index(cells)] - max).exp())
        .collect();
    let exp_sum: f32 = exp_vals.iter().sum();

    if !exp_sum.is_finite() || exp_sum <= 0.0 {
        let uniform = 1.0 / legal.len() as f32;
        return legal.iter().map(|&a| (a, uniform)).collect();
    }

    legal
        .iter()
        .zip(exp_vals)
        .map(|(&a, e)| (a, e / exp_sum))
        .collect()
}
