use othello_core::{Action, GameState};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backup::backup;
use crate::config::MctsConfig;
use crate::dirichlet::add_dirichlet_noise_to_root;
use crate::error::{MctsError, Result};
use crate::evaluation::PolicyValueModel;
use crate::expansion::expand_and_evaluate;
use crate::search_result::SearchResult;
use crate::selection::select;
use crate::tree::{NodeId, SearchTree};

/// Policy/value guided Monte Carlo Tree Search.
///
/// One call to [`Mcts::search`] decides one move; the tree is rebuilt from
/// scratch on every call. Simulations run sequentially.
pub struct Mcts {
    tree: SearchTree,
    rng: StdRng,
}

impl Mcts {
    /// Create a new MCTS instance seeded from entropy
    pub fn new() -> Self {
        Self {
            tree: SearchTree::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Create an instance whose sampling and noise are reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self {
            tree: SearchTree::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from `config.seed` when set, from entropy otherwise
    pub fn from_config(config: &MctsConfig) -> Self {
        match config.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        }
    }

    /// Run MCTS search from a given position
    ///
    /// Returns the chosen action and the root visit distribution. A position
    /// with only a pass returns immediately without touching the model.
    pub fn search<M: PolicyValueModel>(
        &mut self,
        state: &GameState,
        model: &M,
        config: &MctsConfig,
    ) -> Result<SearchResult> {
        if state.is_done() {
            return Err(MctsError::TerminalPosition);
        }
        if state.is_pass() {
            return Ok(SearchResult::forced_pass(state.policy_len()));
        }

        // The first simulation expands the root.
        let root = self.tree.reset_root(*state);
        let value = expand_and_evaluate(&mut self.tree, root, model)?;
        backup(&mut self.tree, root, value);

        if config.add_dirichlet_noise {
            add_dirichlet_noise_to_root(&mut self.tree, root, config, &mut self.rng)?;
        }

        let num_simulations = config.num_simulations.max(1);
        for _ in 1..num_simulations {
            let leaf = select(&self.tree, root, config.c_puct);
            let value = expand_and_evaluate(&mut self.tree, leaf, model)?;
            backup(&mut self.tree, leaf, value);
        }

        self.create_search_result(root, state.policy_len(), config, num_simulations)
    }

    /// Create search result from root node statistics
    fn create_search_result(
        &mut self,
        root: NodeId,
        policy_len: usize,
        config: &MctsConfig,
        num_simulations: u32,
    ) -> Result<SearchResult> {
        let cells = policy_len - 1;

        let mut move_visits = Vec::with_capacity(self.tree[root].children.len());
        let mut priors = Vec::with_capacity(self.tree[root].children.len());
        for child in self.tree.children(root) {
            if let Some(action) = child.action {
                move_visits.push((action, child.visits));
                priors.push(child.prior);
            }
        }
        if move_visits.is_empty() {
            return Err(MctsError::NoLegalMoves);
        }

        // With a single simulation no child has been visited yet; fall back to priors.
        let total_visits: u32 = move_visits.iter().map(|(_, v)| v).sum();
        let weights: Vec<f32> = if total_visits > 0 {
            move_visits
                .iter()
                .map(|&(_, v)| v as f32 / total_visits as f32)
                .collect()
        } else {
            let sum: f32 = priors.iter().sum();
            priors.iter().map(|p| p / sum).collect()
        };

        let mut policy_distribution = vec![0.0f32; policy_len];
        for (&(action, _), &w) in move_visits.iter().zip(&weights) {
            policy_distribution[action.policy_index(cells)] = w;
        }

        let root_value = self.tree[root].mean_value();
        log::trace!(
            "search done: {} simulations, {} root visits, value {:.3}",
            num_simulations,
            self.tree[root].visits,
            root_value
        );
        let action = if total_visits > 0 {
            self.select_move(&move_visits, config)
        } else {
            move_visits[argmax_lowest(&weights)].0
        };

        Ok(SearchResult {
            action,
            policy_distribution,
            root_value,
            num_simulations_run: num_simulations,
            root_visit_counts: move_visits,
        })
    }

    /// Select move based on temperature
    ///
    /// - temperature = 0: most visited, ties to the lowest action
    /// - temperature > 0: sample proportional to visits^(1/t)
    fn select_move(&mut self, move_visits: &[(Action, u32)], config: &MctsConfig) -> Action {
        let visits: Vec<f32> = move_visits.iter().map(|&(_, v)| v as f32).collect();
        let greedy = move_visits[argmax_lowest(&visits)].0;

        if config.is_greedy() {
            return greedy;
        }

        let inv_temp = 1.0f64 / config.temperature as f64;
        let weights: Vec<f64> = move_visits
            .iter()
            .map(|&(_, v)| if v == 0 { 0.0 } else { (v as f64).powf(inv_temp) })
            .collect();

        match WeightedIndex::new(&weights) {
            Ok(dist) => move_visits[dist.sample(&mut self.rng)].0,
            Err(e) => {
                log::trace!("falling back to greedy move: {}", e);
                greedy
            }
        }
    }

    /// Reset the tree (clear all nodes)
    pub fn reset(&mut self) {
        self.tree.clear();
    }

    /// Get the number of nodes in the tree
    pub fn tree_size(&self) -> usize {
        self.tree.len()
    }

    /// Root statistics of the last search: (visit count, Σ child visits)
    pub fn root_visits(&self) -> Option<(u32, u32)> {
        let root = self.tree.root()?;
        let children = self
            .tree
            .children(SearchTree::ROOT)
            .map(|child| child.visits)
            .sum();
        Some((root.visits, children))
    }
}

impl Default for Mcts {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the largest value; the first one wins ties
fn argmax_lowest(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
