use othello_core::{Action, GameState, Player};

/// Result of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    FirstPlayerWin,
    SecondPlayerWin,
    Draw,
}

impl GameResult {
    /// Outcome of a finished position
    pub fn from_final_state(state: &GameState) -> Option<Self> {
        if !state.is_done() {
            return None;
        }
        Some(match state.winner() {
            Some(Player::First) => GameResult::FirstPlayerWin,
            Some(Player::Second) => GameResult::SecondPlayerWin,
            None => GameResult::Draw,
        })
    }

    /// +1 / -1 / 0 for `player`
    pub fn value_for(self, player: Player) -> f32 {
        match (self, player) {
            (GameResult::Draw, _) => 0.0,
            (GameResult::FirstPlayerWin, Player::First)
            | (GameResult::SecondPlayerWin, Player::Second) => 1.0,
            _ => -1.0,
        }
    }
}

/// Record of a single game
#[derive(Debug, Clone)]
pub struct GameRecord {
    /// Position before each move
    pub states: Vec<GameState>,
    /// Root visit distribution (`cells + 1` slots) at each move
    pub policies: Vec<Vec<f32>>,
    /// Action taken at each move
    pub actions: Vec<Action>,
    /// Final result of the game
    pub winner: GameResult,
}

impl GameRecord {
    /// Create a new empty game record
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            policies: Vec::new(),
            actions: Vec::new(),
            winner: GameResult::Draw,
        }
    }

    /// Set the winner
    pub fn set_winner(&mut self, winner: GameResult) {
        self.winner = winner;
    }

    /// Add a move to the record
    pub fn add_move(&mut self, state: GameState, policy: Vec<f32>, action: Action) {
        self.states.push(state);
        self.policies.push(policy);
        self.actions.push(action);
    }

    /// Number of plies in this game
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl Default for GameRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Training example for the policy/value network
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    /// Position features (4 planes of `cells` each)
    pub state: Vec<f32>,
    /// Target policy distribution (`cells + 1` slots)
    pub policy: Vec<f32>,
    /// Game outcome for the player to move (-1.0, 0.0 or 1.0)
    pub value: f32,
}

impl TrainingExample {
    /// Create a new training example
    pub fn new(state: Vec<f32>, policy: Vec<f32>, value: f32) -> Self {
        Self {
            state,
            policy,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use othello_core::BoardConfig;

    #[test]
    fn test_value_for() {
        assert_eq!(GameResult::FirstPlayerWin.value_for(Player::First), 1.0);
        assert_eq!(GameResult::FirstPlayerWin.value_for(Player::Second), -1.0);
        assert_eq!(GameResult::SecondPlayerWin.value_for(Player::Second), 1.0);
        assert_eq!(GameResult::Draw.value_for(Player::First), 0.0);
    }

    #[test]
    fn test_from_final_state() {
        let config = BoardConfig::new(2, 2);
        let done = GameState::from_board_str(&config, "XOOO", 0).unwrap();
        assert_eq!(
            GameResult::from_final_state(&done),
            Some(GameResult::SecondPlayerWin)
        );

        let open = GameState::new(&BoardConfig::default()).unwrap();
        assert_eq!(GameResult::from_final_state(&open), None);
    }
}
