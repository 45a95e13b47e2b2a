use std::fmt;

/// A move on the board.
///
/// The derived ordering sorts placements by cell index and puts `Pass` last,
/// which matches the policy slot layout (`Pass` lives at slot `cells`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Place(usize),
    Pass,
}

impl Action {
    /// Index of this action in a policy vector of length `cells + 1`
    pub fn policy_index(self, cells: usize) -> usize {
        match self {
            Action::Place(i) => i,
            Action::Pass => cells,
        }
    }

    /// Inverse of [`Action::policy_index`]
    pub fn from_policy_index(index: usize, cells: usize) -> Option<Self> {
        match index {
            i if i < cells => Some(Action::Place(i)),
            i if i == cells => Some(Action::Pass),
            _ => None,
        }
    }

    pub fn is_pass(self) -> bool {
        matches!(self, Action::Pass)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Place(i) => write!(f, "{i}"),
            Action::Pass => write!(f, "pass"),
        }
    }
}
