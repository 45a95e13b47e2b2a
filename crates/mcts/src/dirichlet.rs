use rand::Rng;
use rand_distr::{Dirichlet, Distribution};

use crate::config::MctsConfig;
use crate::error::{MctsError, Result};
use crate::tree::{NodeId, SearchTree};

/// Mix Dirichlet noise into the root priors: P' = (1-ε)*P + ε*noise
///
/// Only the root is perturbed. A root with a single child is left alone.
pub fn add_dirichlet_noise_to_root<R: Rng + ?Sized>(
    tree: &mut SearchTree,
    root: NodeId,
    config: &MctsConfig,
    rng: &mut R,
) -> Result<()> {
    if !tree[root].is_expanded() {
        return Err(MctsError::RootNotInitialized);
    }

    let n = tree[root].children.len();
    if n < 2 {
        return Ok(());
    }

    let alpha = vec![config.dirichlet_alpha as f64; n];
    let dirichlet = Dirichlet::new(&alpha).map_err(|e| MctsError::DirichletError(e.to_string()))?;
    let noise = dirichlet.sample(rng);

    let eps = config.dirichlet_epsilon;
    let children = tree[root].children.clone();
    for (child, x) in children.into_iter().zip(noise) {
        let prior = &mut tree[child].prior;
        *prior = (1.0 - eps) * *prior + eps * x as f32;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use othello_core::{Action, BoardConfig, GameState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn root_with_priors(priors: &[f32]) -> SearchTree {
        let state = GameState::new(&BoardConfig::default()).unwrap();
        let mut tree = SearchTree::new();
        let root = tree.reset_root(state);
        for (i, &prior) in priors.iter().enumerate() {
            tree.add_child(root, Action::Place(i), state, prior);
        }
        tree
    }

    fn priors(tree: &SearchTree) -> Vec<f32> {
        tree.children(SearchTree::ROOT).map(|child| child.prior).collect()
    }

    #[test]
    fn test_dirichlet_noise_changes_priors() {
        let mut tree = root_with_priors(&[1.0 / 3.0; 3]);
        let original = priors(&tree);

        let config = MctsConfig::default().with_dirichlet_noise(0.3, 0.25);
        let mut rng = StdRng::seed_from_u64(1);
        add_dirichlet_noise_to_root(&mut tree, 0, &config, &mut rng).unwrap();

        let noisy = priors(&tree);
        assert!(original
            .iter()
            .zip(noisy.iter())
            .any(|(o, n)| (o - n).abs() > 1e-6));
        assert_relative_eq!(noisy.iter().sum::<f32>(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_dirichlet_noise_is_reproducible_with_seed() {
        let config = MctsConfig::default().with_dirichlet_noise(0.3, 0.25);

        let mut a = root_with_priors(&[0.5, 0.3, 0.2]);
        let mut b = root_with_priors(&[0.5, 0.3, 0.2]);
        add_dirichlet_noise_to_root(&mut a, 0, &config, &mut StdRng::seed_from_u64(5)).unwrap();
        add_dirichlet_noise_to_root(&mut b, 0, &config, &mut StdRng::seed_from_u64(5)).unwrap();

        assert_eq!(priors(&a), priors(&b));
    }

    #[test]
    fn test_dirichlet_noise_single_child_untouched() {
        let mut tree = root_with_priors(&[1.0]);
        let config = MctsConfig::default().with_dirichlet_noise(0.3, 0.25);
        let mut rng = StdRng::seed_from_u64(1);

        add_dirichlet_noise_to_root(&mut tree, 0, &config, &mut rng).unwrap();
        assert_eq!(priors(&tree), vec![1.0]);
    }

    #[test]
    fn test_dirichlet_noise_not_expanded() {
        let state = GameState::new(&BoardConfig::default()).unwrap();
        let mut tree = SearchTree::new();
        tree.reset_root(state);

        let config = MctsConfig::default().with_dirichlet_noise(0.3, 0.25);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            add_dirichlet_noise_to_root(&mut tree, 0, &config, &mut rng),
            Err(MctsError::RootNotInitialized)
        ));
    }
}
