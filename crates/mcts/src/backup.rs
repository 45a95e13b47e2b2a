use crate::tree::{NodeId, SearchTree};

/// Propagate `value` from a leaf back to the root.
///
/// `value` is from the perspective of the player to move at the leaf. Each
/// step up the path changes the player to move, so the sign flips per ply.
pub fn backup(tree: &mut SearchTree, leaf: NodeId, mut value: f32) {
    let mut next = Some(leaf);
    while let Some(id) = next {
        let node = &mut tree[id];
        node.visits += 1;
        node.value_sum += value;
        next = node.parent;
        value = -value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use othello_core::{Action, BoardConfig, GameState};

    fn state() -> GameState {
        GameState::new(&BoardConfig::default()).unwrap()
    }

    /// root -> 1 -> 2 -> ... chain of `depth` children
    fn chain(depth: usize) -> SearchTree {
        let mut tree = SearchTree::new();
        tree.reset_root(state());
        for parent in 0..depth {
            tree.add_child(parent, Action::Place(parent), state(), 1.0);
        }
        tree
    }

    #[test]
    fn test_backup_single_node() {
        let mut tree = chain(0);
        backup(&mut tree, 0, 0.5);

        assert_eq!(tree[0].visits, 1);
        assert_eq!(tree[0].value_sum, 0.5);
    }

    #[test]
    fn test_backup_negates_value() {
        let mut tree = chain(1);
        backup(&mut tree, 1, 0.5);

        assert_eq!(tree[1].visits, 1);
        assert_eq!(tree[1].value_sum, 0.5);
        assert_eq!(tree[0].visits, 1);
        assert_eq!(tree[0].value_sum, -0.5);
    }

    #[test]
    fn test_backup_multiple_visits() {
        let mut tree = chain(0);

        backup(&mut tree, 0, 0.5);
        backup(&mut tree, 0, 0.3);

        assert_eq!(tree[0].visits, 2);
        assert!((tree[0].value_sum - 0.8).abs() < 1e-6);
        assert!((tree[0].mean_value() - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_backup_two_ply_path() {
        let mut tree = chain(2);

        // Grandchild +1 -> child -1 -> root +1
        backup(&mut tree, 2, 1.0);

        assert_eq!(tree[2].value_sum, 1.0);
        assert_eq!(tree[1].value_sum, -1.0);
        assert_eq!(tree[0].value_sum, 1.0);
        for id in 0..tree.len() {
            assert_eq!(tree[id].visits, 1);
        }
    }

    #[test]
    fn test_backup_leaves_siblings_untouched() {
        let mut tree = chain(1);
        let sibling_id = tree.add_child(0, Action::Place(9), state(), 0.5);

        backup(&mut tree, 1, -0.25);

        assert_eq!(tree[sibling_id].visits, 0);
        assert_eq!(tree[sibling_id].value_sum, 0.0);
        assert_eq!(tree[0].value_sum, 0.25);
    }
}
