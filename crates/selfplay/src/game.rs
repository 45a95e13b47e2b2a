use anyhow::{Context, Result};
use othello_core::{BoardConfig, GameState};
use othello_mcts::{Mcts, PolicyValueModel};

use crate::config::SelfPlayConfig;
use crate::data::{GameRecord, GameResult, TrainingExample};

/// Play a single self-play game
///
/// # Arguments
/// * `model` - Policy/value model guiding both sides
/// * `board` - Board variant to play on
/// * `config` - Search and temperature settings
///
/// # Returns
/// A complete game record with all states, policies, and the final result
pub fn play_game<M: PolicyValueModel>(
    model: &M,
    board: &BoardConfig,
    config: &SelfPlayConfig,
) -> Result<GameRecord> {
    let mut mcts = Mcts::from_config(&config.mcts);
    play_game_with(&mut mcts, model, board, config)
}

/// Same as [`play_game`] but reuses a caller-owned search (and its RNG)
pub fn play_game_with<M: PolicyValueModel>(
    mcts: &mut Mcts,
    model: &M,
    board: &BoardConfig,
    config: &SelfPlayConfig,
) -> Result<GameRecord> {
    let mut state = GameState::new(board)?;
    let mut record = GameRecord::new();

    while !state.is_done() {
        let search_config = config.mcts_for_ply(state.depth());
        let result = mcts
            .search(&state, model, &search_config)
            .with_context(|| format!("search failed at ply {}", state.depth()))?;

        record.add_move(state, result.policy_distribution, result.action);
        state = state.next(result.action)?;

        // The tree is rebuilt for every move.
        mcts.reset();
    }

    let winner = determine_winner(&state)?;
    record.set_winner(winner);
    log::debug!(
        "self-play game finished after {} plies: {:?} ({}-{})",
        record.len(),
        winner,
        state.first_player_count(),
        state.second_player_count()
    );

    Ok(record)
}

/// Determine the winner from a finished position
fn determine_winner(state: &GameState) -> Result<GameResult> {
    GameResult::from_final_state(state).context("Game is not over")
}

/// Convert game record to training examples
///
/// Each position in the game is converted to a training example with:
/// - state: the position features
/// - policy: the MCTS visit distribution
/// - value: the game outcome from the perspective of that ply's mover
pub fn game_to_training_examples(record: &GameRecord) -> Vec<TrainingExample> {
    record
        .states
        .iter()
        .zip(record.policies.iter())
        .map(|(state, policy)| {
            TrainingExample::new(
                state.to_features(),
                policy.clone(),
                calculate_value(state, record.winner),
            )
        })
        .collect()
}

/// +1.0 if the player to move in `state` won, -1.0 if they lost, 0.0 for a draw
fn calculate_value(state: &GameState, winner: GameResult) -> f32 {
    winner.value_for(state.player_to_move())
}
