use std::thread;

use anyhow::Result;
use crossbeam_channel::{bounded, unbounded};
use othello_core::BoardConfig;
use othello_mcts::{Mcts, MctsConfig, PolicyValueModel};

use crate::config::SelfPlayConfig;
use crate::data::GameRecord;
use crate::error::SelfPlayError;
use crate::game::play_game_with;

/// Play `config.games` games on `config.threads` worker threads.
///
/// Every worker owns its search tree and RNG; with `config.mcts.seed` set,
/// worker `i` is seeded with `seed + i`. Records are returned in completion
/// order. The first failing game aborts the run once all workers stop.
pub fn play_games_parallel<M>(
    model: &M,
    board: &BoardConfig,
    config: &SelfPlayConfig,
) -> Result<Vec<GameRecord>>
where
    M: PolicyValueModel + Sync,
{
    let threads = config.threads.max(1).min(config.games.max(1));
    let (job_tx, job_rx) = bounded::<usize>(config.games);
    let (result_tx, result_rx) = unbounded::<Result<GameRecord>>();

    for game in 0..config.games {
        // Capacity equals the job count.
        let _ = job_tx.send(game);
    }
    drop(job_tx);

    thread::scope(|scope| -> Result<Vec<GameRecord>> {
        let mut handles = Vec::with_capacity(threads);
        for worker in 0..threads {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            handles.push(scope.spawn(move || {
                let mut mcts = worker_search(&config.mcts, worker);
                for game in job_rx.iter() {
                    let record = play_game_with(&mut mcts, model, board, config);
                    let failed = record.is_err();
                    if result_tx.send(record).is_err() || failed {
                        break;
                    }
                    log::debug!("worker {} finished game {}", worker, game);
                }
            }));
        }
        drop(result_tx);

        let mut records = Vec::with_capacity(config.games);
        let mut first_error = None;
        for result in result_rx.iter() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        for handle in handles {
            if handle.join().is_err() {
                return Err(SelfPlayError::WorkerPanicked.into());
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(records),
        }
    })
}

fn worker_search(config: &MctsConfig, worker: usize) -> Mcts {
    match config.seed {
        Some(seed) => Mcts::with_seed(seed.wrapping_add(worker as u64)),
        None => Mcts::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use othello_nn::NnModel;

    #[test]
    fn test_parallel_plays_all_games() {
        let board = BoardConfig::new(4, 4);
        let model = NnModel::random(board.feature_len(), board.policy_len(), 3);
        let config = SelfPlayConfig::default()
            .with_games(6)
            .with_threads(3)
            .with_mcts(MctsConfig::default().with_simulations(8).with_seed(9));

        let records = play_games_parallel(&model, &board, &config).unwrap();

        assert_eq!(records.len(), 6);
        for record in &records {
            assert!(!record.is_empty());
            assert_eq!(record.states.len(), record.policies.len());
            assert_eq!(record.states.len(), record.actions.len());
        }
    }

    #[test]
    fn test_parallel_propagates_errors() {
        let board = BoardConfig::default();
        let model = NnModel::zeros(board.feature_len(), 2);
        let config = SelfPlayConfig::default().with_games(4).with_threads(2);

        assert!(play_games_parallel(&model, &board, &config).is_err());
    }

    #[test]
    fn test_zero_games() {
        let board = BoardConfig::new(4, 4);
        let model = NnModel::zeros(board.feature_len(), board.policy_len());
        let config = SelfPlayConfig::default().with_games(0).with_threads(4);

        assert!(play_games_parallel(&model, &board, &config).unwrap().is_empty());
    }
}
