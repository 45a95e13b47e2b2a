//! Arena search tree: nodes live in one `Vec` and point at each other by index.

use std::ops::{Index, IndexMut};

use othello_core::{Action, GameState};

/// Index of a node in its [`SearchTree`]
pub type NodeId = usize;

/// One position reached during a search.
///
/// `visits` and `value_sum` are seen from the player to move at this node. A
/// node is expanded once it has children; a finished position never gets any
/// and is scored by [`SearchNode::terminal_value`] instead.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub state: GameState,
    /// Move that led here from the parent; `None` at the root
    pub action: Option<Action>,
    pub parent: Option<NodeId>,
    /// Ascending action order
    pub children: Vec<NodeId>,
    pub visits: u32,
    pub value_sum: f32,
    pub prior: f32,
}

impl SearchNode {
    fn new(state: GameState, action: Option<Action>, parent: Option<NodeId>, prior: f32) -> Self {
        Self {
            state,
            action,
            parent,
            children: Vec::new(),
            visits: 0,
            value_sum: 0.0,
            prior,
        }
    }

    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    /// True outcome for the player to move, once the game is over here
    pub fn terminal_value(&self) -> Option<f32> {
        self.state.terminal_value()
    }

    /// Average backed-up value; 0 before the first visit
    pub fn mean_value(&self) -> f32 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f32
        }
    }
}

/// Nodes of one search, root first
#[derive(Debug, Default)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl SearchTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous search and start a new one at `state`
    pub fn reset_root(&mut self, state: GameState) -> NodeId {
        self.nodes.clear();
        self.nodes.push(SearchNode::new(state, None, None, 1.0));
        Self::ROOT
    }

    /// Append a child to `parent`; callers add children in ascending action order
    pub fn add_child(
        &mut self,
        parent: NodeId,
        action: Action,
        state: GameState,
        prior: f32,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SearchNode::new(state, Some(action), Some(parent), prior));
        self.nodes[parent].children.push(id);
        id
    }

    pub fn root(&self) -> Option<&SearchNode> {
        self.nodes.get(Self::ROOT)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &SearchNode> + '_ {
        self.nodes[id].children.iter().map(move |&child| &self.nodes[child])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl Index<NodeId> for SearchTree {
    type Output = SearchNode;

    fn index(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id]
    }
}

impl IndexMut<NodeId> for SearchTree {
    fn index_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id]
    }
}
