use crate::tree::{NodeId, SearchNode, SearchTree};

/// Descend from `root` to the first node without children.
///
/// That node is either unexpanded or a finished position. At every expanded
/// node the child with the highest PUCT score is taken. Children are stored in
/// ascending action order and only a strictly higher score replaces the
/// current best, so ties go to the lowest action.
pub fn select(tree: &SearchTree, root: NodeId, c_puct: f32) -> NodeId {
    let mut current = root;

    while tree[current].is_expanded() {
        let node = &tree[current];
        let sqrt_parent = (node.visits as f32).sqrt();
        let mut best = node.children[0];
        let mut best_score = f32::NEG_INFINITY;
        for &child in &node.children {
            let score = puct_value(&tree[child], sqrt_parent, c_puct);
            if score > best_score {
                best = child;
                best_score = score;
            }
        }
        current = best;
    }

    current
}

/// PUCT(s, a) = Q(s, a) + c_puct * P(s, a) * sqrt(N(s)) / (1 + N(s, a))
///
/// The child's statistics are kept from the child's mover perspective, so
/// Q(s, a) for the parent is the negated child mean.
pub(crate) fn puct_value(child: &SearchNode, sqrt_parent: f32, c_puct: f32) -> f32 {
    let q = -child.mean_value();
    let u = c_puct * child.prior * sqrt_parent / (1.0 + child.visits as f32);
    q + u
}
