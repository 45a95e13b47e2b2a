use crate::error::Result;
use crate::evaluation::{predict, PolicyValueModel, Prediction};
use crate::tree::{NodeId, SearchTree};

/// Expand a leaf and return its value for the player to move there.
///
/// A finished position stays childless and returns its true outcome without
/// querying the model.
pub fn expand_and_evaluate<M: PolicyValueModel>(
    tree: &mut SearchTree,
    leaf: NodeId,
    model: &M,
) -> Result<f32> {
    if let Some(value) = tree[leaf].terminal_value() {
        return Ok(value);
    }

    let prediction = predict(&tree[leaf].state, model)?;
    expand_with_prediction(tree, leaf, &prediction)
}

/// Create one child per legal action using precomputed priors.
pub fn expand_with_prediction(
    tree: &mut SearchTree,
    leaf: NodeId,
    prediction: &Prediction,
) -> Result<f32> {
    let state = tree[leaf].state;
    for &(action, prior) in &prediction.priors {
        tree.add_child(leaf, action, state.next(action)?, prior);
    }
    Ok(prediction.value)
}
