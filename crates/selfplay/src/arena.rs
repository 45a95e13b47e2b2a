use anyhow::{Context, Result};
use othello_core::{BoardConfig, GameState, Player};
use othello_mcts::{Mcts, MctsConfig, PolicyValueModel};

use crate::data::GameResult;

/// Outcome of an evaluation match, counted for the candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchReport {
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
}

impl MatchReport {
    pub fn games(&self) -> usize {
        self.wins + self.draws + self.losses
    }

    /// (wins + draws / 2) / games; 0 for an empty match
    pub fn score(&self) -> f32 {
        let games = self.games();
        if games == 0 {
            return 0.0;
        }
        (self.wins as f32 + 0.5 * self.draws as f32) / games as f32
    }

    fn record(&mut self, result: GameResult, candidate: Player) {
        match result.value_for(candidate) {
            v if v > 0.0 => self.wins += 1,
            v if v < 0.0 => self.losses += 1,
            _ => self.draws += 1,
        }
    }
}

/// Play one game between two models and return its result
pub fn play_match<A, B>(
    first: &A,
    second: &B,
    board: &BoardConfig,
    config: &MctsConfig,
    mcts: &mut Mcts,
) -> Result<GameResult>
where
    A: PolicyValueModel,
    B: PolicyValueModel,
{
    let mut state = GameState::new(board)?;
    while !state.is_done() {
        let result = match state.player_to_move() {
            Player::First => mcts.search(&state, first, config),
            Player::Second => mcts.search(&state, second, config),
        }
        .with_context(|| format!("evaluation search failed at ply {}", state.depth()))?;
        state = state.next(result.action)?;
        mcts.reset();
    }
    GameResult::from_final_state(&state).context("Game is not over")
}

/// Play `games` games of `candidate` against `incumbent`, alternating who moves first
///
/// The candidate moves first in even-numbered games.
pub fn evaluate_models<A, B>(
    candidate: &A,
    incumbent: &B,
    board: &BoardConfig,
    games: usize,
    config: &MctsConfig,
) -> Result<MatchReport>
where
    A: PolicyValueModel,
    B: PolicyValueModel,
{
    let mut mcts = Mcts::from_config(config);
    let mut report = MatchReport::default();

    for game in 0..games {
        let (result, candidate_side) = if game % 2 == 0 {
            (play_match(candidate, incumbent, board, config, &mut mcts)?, Player::First)
        } else {
            (play_match(incumbent, candidate, board, config, &mut mcts)?, Player::Second)
        };
        report.record(result, candidate_side);
        log::debug!("evaluation game {}: {:?} (candidate {:?})", game, result, candidate_side);
    }

    Ok(report)
}
