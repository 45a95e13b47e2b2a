use std::path::Path;

use anyhow::{Context, Result};
use ndarray::{Array, Array1, Array2};
use ndarray_npy::{read_npy, write_npy};

use crate::data::TrainingExample;
use crate::error::SelfPlayError;

const POLICY_TOLERANCE: f32 = 1e-4;

/// Save training data to NPY files
///
/// Creates three separate files:
/// - `{path}_states.npy`: (N, F) feature vectors
/// - `{path}_policies.npy`: (N, P) policy distributions
/// - `{path}_values.npy`: (N,) value targets
///
/// All examples must share the feature and policy lengths of the first one.
///
/// # Example
/// ```no_run
/// use othello_selfplay::storage::save_training_data;
/// use othello_selfplay::TrainingExample;
///
/// let mut policy = vec![0.0; 37];
/// policy[36] = 1.0;
/// let examples = vec![TrainingExample::new(vec![0.0; 144], policy, 1.0)];
/// save_training_data(&examples, "selfplay_data").unwrap();
/// // Creates: selfplay_data_states.npy, selfplay_data_policies.npy, selfplay_data_values.npy
/// ```
pub fn save_training_data<P: AsRef<Path>>(examples: &[TrainingExample], path: P) -> Result<()> {
    let Some(first) = examples.first() else {
        anyhow::bail!("Cannot save empty training data");
    };
    let (states, policies, values) =
        to_arrays(examples, first.state.len(), first.policy.len())?;

    let base = path.as_ref().display().to_string();
    write_npy(format!("{}_states.npy", base), &states)
        .with_context(|| format!("writing {}_states.npy", base))?;
    write_npy(format!("{}_policies.npy", base), &policies)
        .with_context(|| format!("writing {}_policies.npy", base))?;
    write_npy(format!("{}_values.npy", base), &values)
        .with_context(|| format!("writing {}_values.npy", base))?;

    Ok(())
}

/// Read back the files written by [`save_training_data`]
pub fn load_training_data<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingExample>> {
    let base = path.as_ref().display().to_string();
    let states: Array2<f32> = read_npy(format!("{}_states.npy", base))
        .with_context(|| format!("reading {}_states.npy", base))?;
    let policies: Array2<f32> = read_npy(format!("{}_policies.npy", base))
        .with_context(|| format!("reading {}_policies.npy", base))?;
    let values: Array1<f32> = read_npy(format!("{}_values.npy", base))
        .with_context(|| format!("reading {}_values.npy", base))?;

    if states.nrows() != policies.nrows() || states.nrows() != values.len() {
        anyhow::bail!(
            "Row counts differ: {} states, {} policies, {} values",
            states.nrows(),
            policies.nrows(),
            values.len()
        );
    }

    Ok(states
        .outer_iter()
        .zip(policies.outer_iter())
        .zip(values.iter())
        .map(|((s, p), &v)| TrainingExample::new(s.to_vec(), p.to_vec(), v))
        .collect())
}

/// Stack examples into (states, policies, values) arrays
pub fn to_arrays(
    examples: &[TrainingExample],
    feature_len: usize,
    policy_len: usize,
) -> Result<(Array2<f32>, Array2<f32>, Array1<f32>)> {
    let n = examples.len();
    let mut states = Vec::with_capacity(n * feature_len);
    let mut policies = Vec::with_capacity(n * policy_len);
    for (index, e) in examples.iter().enumerate() {
        if e.state.len() != feature_len || e.policy.len() != policy_len {
            return Err(SelfPlayError::CorruptTrainingBuffer {
                index,
                reason: format!(
                    "expected {feature_len} features and {policy_len} policy slots, got {} and {}",
                    e.state.len(),
                    e.policy.len()
                ),
            }
            .into());
        }
        states.extend_from_slice(&e.state);
        policies.extend_from_slice(&e.policy);
    }

    let states = Array::from_shape_vec((n, feature_len), states)?;
    let policies = Array::from_shape_vec((n, policy_len), policies)?;
    let values = examples.iter().map(|e| e.value).collect::<Array1<f32>>();
    Ok((states, policies, values))
}

/// Check one example against the expected shapes and target ranges
pub fn validate_example(
    index: usize,
    example: &TrainingExample,
    feature_len: usize,
    policy_len: usize,
) -> std::result::Result<(), SelfPlayError> {
    let corrupt = |reason: String| SelfPlayError::CorruptTrainingBuffer { index, reason };

    if example.state.len() != feature_len {
        return Err(corrupt(format!(
            "state has {} features, expected {feature_len}",
            example.state.len()
        )));
    }
    if example.policy.len() != policy_len {
        return Err(corrupt(format!(
            "policy has {} slots, expected {policy_len}",
            example.policy.len()
        )));
    }
    if example.state.iter().any(|x| !x.is_finite()) {
        return Err(corrupt("state contains non-finite values".to_string()));
    }
    if example.policy.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(corrupt("policy contains negative or non-finite values".to_string()));
    }
    let sum: f32 = example.policy.iter().sum();
    if (sum - 1.0).abs() > POLICY_TOLERANCE {
        return Err(corrupt(format!("policy sums to {sum}")));
    }
    if ![-1.0, 0.0, 1.0].contains(&example.value) {
        return Err(corrupt(format!("value {} is not a game outcome", example.value)));
    }
    Ok(())
}

/// Drop corrupt examples, logging each one
pub fn sanitize_examples(
    examples: Vec<TrainingExample>,
    feature_len: usize,
    policy_len: usize,
) -> Vec<TrainingExample> {
    let before = examples.len();
    let kept: Vec<_> = examples
        .into_iter()
        .enumerate()
        .filter_map(|(index, e)| match validate_example(index, &e, feature_len, policy_len) {
            Ok(()) => Some(e),
            Err(err) => {
                log::warn!("dropping training example: {}", err);
                None
            }
        })
        .collect();

    if kept.len() < before {
        log::warn!("dropped {} of {} training examples", before - kept.len(), before);
    }
    kept
}
