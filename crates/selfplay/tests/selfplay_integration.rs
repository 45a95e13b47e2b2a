use othello_core::{Action, BoardConfig, GameState};
use othello_mcts::MctsConfig;
use othello_nn::NnModel;
use othello_selfplay::{
    game_to_training_examples, play_game, play_games_parallel, GameResult, SelfPlayConfig,
    SelfPlayStream,
};

fn assert_policy_valid(state: &GameState, policy: &[f32]) {
    assert_eq!(policy.len(), state.policy_len());
    let sum: f32 = policy.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6, "policy sums to {}", sum);
    for (slot, p) in policy.iter().enumerate() {
        if *p > 0.0 {
            let action = Action::from_policy_index(slot, state.cell_count()).unwrap();
            assert!(state.is_legal(action), "mass on illegal {:?}", action);
        }
    }
}

#[test]
fn tiny_board_single_game() {
    // Nothing can ever be flanked on 2x2, so the opening is already final.
    let board = BoardConfig::new(2, 2).with_opening(vec![0], vec![3]);
    let model = NnModel::zeros(board.feature_len(), board.policy_len());
    let config = SelfPlayConfig::default()
        .with_games(1)
        .with_mcts(MctsConfig::default().with_simulations(10).with_seed(0));

    let games: Vec<_> = SelfPlayStream::new(&model, board.clone(), config.clone())
        .collect::<anyhow::Result<_>>()
        .unwrap();
    assert_eq!(games.len(), 1);

    let record = play_game(&model, &board, &config).unwrap();
    assert_eq!(games[0].len(), record.len());
    assert!(record.actions.is_empty());
    assert_eq!(record.winner, GameResult::Draw);
}

#[test]
fn forced_pass_is_recorded_as_a_ply() {
    // X cannot move from the opening, O then fills the last cell.
    let board = BoardConfig::new(1, 3).with_opening(vec![1], vec![0]);
    let model = NnModel::zeros(board.feature_len(), board.policy_len());
    let config = SelfPlayConfig::default()
        .with_mcts(MctsConfig::default().with_simulations(10).with_seed(0));

    let record = play_game(&model, &board, &config).unwrap();
    assert_eq!(record.actions, vec![Action::Pass, Action::Place(2)]);
    assert_eq!(record.winner, GameResult::SecondPlayerWin);

    let examples = game_to_training_examples(&record);
    assert_eq!(examples.len(), 2);
    for (state, example) in record.states.iter().zip(&examples) {
        assert_policy_valid(state, &example.policy);
        assert_eq!(example.state.len(), board.feature_len());
    }
    assert_eq!(examples[0].value, -1.0);
    assert_eq!(examples[1].value, 1.0);
}

#[test]
fn four_by_four_game_targets() {
    let board = BoardConfig::new(4, 4);
    let model = NnModel::random(board.feature_len(), board.policy_len(), 21);
    let config = SelfPlayConfig::default()
        .with_temperature_cutoff(4)
        .with_mcts(MctsConfig::default().with_simulations(16).with_seed(5));

    let record = play_game(&model, &board, &config).unwrap();
    let examples = game_to_training_examples(&record);

    assert!(!record.is_empty());
    assert!(record.len() <= board.cell_count());
    assert_eq!(examples.len(), record.len());

    let mut state = GameState::new(&board).unwrap();
    for (i, (recorded, action)) in record.states.iter().zip(&record.actions).enumerate() {
        assert_eq!(*recorded, state);
        assert_eq!(recorded.depth() as usize, i);
        assert_policy_valid(recorded, &record.policies[i]);
        state = state.next(*action).unwrap();
    }
    assert!(state.is_done());
    assert_eq!(GameResult::from_final_state(&state), Some(record.winner));

    // The mover changes every ply, so outcomes alternate in sign.
    for pair in examples.windows(2) {
        assert_eq!(pair[0].value, -pair[1].value);
    }
}

#[test]
fn seeded_self_play_is_reproducible() {
    let board = BoardConfig::new(4, 4);
    let model = NnModel::random(board.feature_len(), board.policy_len(), 2);
    let config = SelfPlayConfig::default().with_mcts(
        MctsConfig::default()
            .with_simulations(12)
            .with_dirichlet_noise(0.3, 0.25)
            .with_seed(99),
    );

    let a = play_game(&model, &board, &config).unwrap();
    let b = play_game(&model, &board, &config).unwrap();
    assert_eq!(a.actions, b.actions);
    assert_eq!(a.policies, b.policies);
}

#[test]
fn blocked_cells_never_played() {
    let board = BoardConfig::new(4, 4).with_blocks(vec![0, 15]);
    let model = NnModel::random(board.feature_len(), board.policy_len(), 8);
    let config = SelfPlayConfig::default()
        .with_games(4)
        .with_threads(2)
        .with_mcts(MctsConfig::default().with_simulations(8).with_seed(1));

    let records = play_games_parallel(&model, &board, &config).unwrap();
    assert_eq!(records.len(), 4);
    for record in records {
        assert!(!record.actions.contains(&Action::Place(0)));
        assert!(!record.actions.contains(&Action::Place(15)));
    }
}
