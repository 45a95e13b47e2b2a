use othello_core::Action;

/// Result of MCTS search
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Action chosen for this move
    pub action: Action,

    /// Normalized root visit counts over `cells + 1` policy slots
    pub policy_distribution: Vec<f32>,

    /// Q-value of the root node
    pub root_value: f32,

    /// Number of simulations actually run
    pub num_simulations_run: u32,

    /// Visit counts for each legal action from root: (action, visit_count)
    pub root_visit_counts: Vec<(Action, u32)>,
}

impl SearchResult {
    /// Result for a position where passing is the only option
    pub fn forced_pass(policy_len: usize) -> Self {
        let mut policy_distribution = vec![0.0; policy_len];
        if let Some(slot) = policy_distribution.last_mut() {
            *slot = 1.0;
        }
        Self {
            action: Action::Pass,
            policy_distribution,
            root_value: 0.0,
            num_simulations_run: 0,
            root_visit_counts: Vec::new(),
        }
    }

    /// Get the visit count for a specific action
    pub fn visit_count_for(&self, action: Action) -> u32 {
        self.root_visit_counts
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    /// Get the total number of visits to root children
    pub fn total_visits(&self) -> u32 {
        self.root_visit_counts.iter().map(|(_, v)| v).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_pass_is_one_hot_on_pass_slot() {
        let result = SearchResult::forced_pass(37);
        assert_eq!(result.action, Action::Pass);
        assert_eq!(result.policy_distribution.len(), 37);
        assert_eq!(result.policy_distribution[36], 1.0);
        assert_eq!(result.policy_distribution.iter().sum::<f32>(), 1.0);
        assert_eq!(result.total_visits(), 0);
    }

    #[test]
    fn test_visit_lookup() {
        let result = SearchResult {
            action: Action::Place(3),
            policy_distribution: vec![],
            root_value: 0.0,
            num_simulations_run: 9,
            root_visit_counts: vec![(Action::Place(3), 6), (Action::Place(8), 2)],
        };
        assert_eq!(result.visit_count_for(Action::Place(3)), 6);
        assert_eq!(result.visit_count_for(Action::Place(4)), 0);
        assert_eq!(result.total_visits(), 8);
    }
}
