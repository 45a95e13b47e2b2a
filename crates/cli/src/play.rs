//! Human vs AI play as a turn state machine.
//!
//! The session never blocks: a human input or a finished AI search arrives as
//! an [`Event`], and [`PlaySession::handle`] answers with the [`Effect`] the
//! driver has to carry out.

use std::fmt::Write;

use othello_core::{Action, BoardConfig, Cell, GameState, Player};

/// A line typed by the human
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// A cell index, already range-checked against the board
    Cell(usize),
    Pass,
    Quit,
    /// Anything else; still counts as "some input"
    Other,
}

impl Input {
    /// Parse `row col` (1-based), `c3` style coordinates, `pass` or `quit`
    pub fn parse(line: &str, rows: usize, cols: usize) -> Self {
        let line = line.trim().to_ascii_lowercase();
        match line.as_str() {
            "q" | "quit" | "exit" => return Input::Quit,
            "p" | "pass" => return Input::Pass,
            _ => {}
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let coords = match parts.as_slice() {
            [row, col] => one_based(row).zip(one_based(col)),
            [word] => parse_letter_number(word),
            _ => None,
        };

        match coords {
            Some((row, col)) if row < rows && col < cols => Input::Cell(row * cols + col),
            _ => Input::Other,
        }
    }
}

fn one_based(text: &str) -> Option<usize> {
    text.parse::<usize>().ok()?.checked_sub(1)
}

/// `c3` -> (row 2, col 2)
fn parse_letter_number(word: &str) -> Option<(usize, usize)> {
    let mut chars = word.chars();
    let letter = chars.next().filter(|c| c.is_ascii_lowercase())?;
    let col = (letter as u8 - b'a') as usize;
    one_based(chars.as_str()).map(|row| (row, col))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Human(Input),
    AiMoved(Action),
    AiFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    HumanTurn,
    AiTurn,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Redraw,
    /// Redraw, then search this position and post `Event::AiMoved`
    RequestAiMove(GameState),
    Ignored,
    Quit,
}

pub struct PlaySession {
    board: BoardConfig,
    state: GameState,
    human: Player,
    phase: Phase,
}

impl PlaySession {
    pub fn new(board: BoardConfig, human: Player) -> othello_core::Result<Self> {
        let state = GameState::new(&board)?;
        let mut session = Self {
            board,
            state,
            human,
            phase: Phase::HumanTurn,
        };
        session.phase = session.phase_for_state();
        Ok(session)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn human(&self) -> Player {
        self.human
    }

    /// What the driver does before the first event
    pub fn start(&self) -> Effect {
        self.effect_for_phase()
    }

    pub fn handle(&mut self, event: Event) -> Effect {
        match (self.phase, event) {
            (_, Event::Human(Input::Quit)) => Effect::Quit,

            (Phase::Finished, Event::Human(_)) => self.restart(),

            (Phase::HumanTurn, Event::Human(input)) => {
                let action = if self.state.is_pass() {
                    Action::Pass
                } else {
                    match input {
                        Input::Cell(index) => Action::Place(index),
                        _ => return Effect::Ignored,
                    }
                };
                if !self.state.is_legal(action) {
                    return Effect::Ignored;
                }
                self.apply(action)
            }

            (Phase::AiTurn, Event::AiMoved(action)) => {
                if !self.state.is_legal(action) {
                    log::warn!("AI proposed illegal {:?}", action);
                    return Effect::Ignored;
                }
                self.apply(action)
            }

            (Phase::AiTurn, Event::AiFailed(reason)) => {
                log::error!("AI search failed: {}", reason);
                self.phase = Phase::Finished;
                Effect::Redraw
            }

            _ => Effect::Ignored,
        }
    }

    fn restart(&mut self) -> Effect {
        match GameState::new(&self.board) {
            Ok(state) => {
                self.state = state;
                self.phase = self.phase_for_state();
                self.effect_for_phase()
            }
            Err(e) => {
                log::error!("cannot restart: {}", e);
                Effect::Quit
            }
        }
    }

    fn apply(&mut self, action: Action) -> Effect {
        match self.state.next(action) {
            Ok(next) => {
                self.state = next;
                self.phase = self.phase_for_state();
                self.effect_for_phase()
            }
            Err(e) => {
                log::warn!("rejected {:?}: {}", action, e);
                Effect::Ignored
            }
        }
    }

    fn phase_for_state(&self) -> Phase {
        if self.state.is_done() {
            Phase::Finished
        } else if self.state.player_to_move() == self.human {
            Phase::HumanTurn
        } else {
            Phase::AiTurn
        }
    }

    fn effect_for_phase(&self) -> Effect {
        match self.phase {
            Phase::AiTurn => Effect::RequestAiMove(self.state),
            Phase::HumanTurn | Phase::Finished => Effect::Redraw,
        }
    }
}

/// Board with coordinates, legal moves marked `*`, then depth, turn and counts
pub fn render(state: &GameState) -> String {
    let mut out = String::new();
    let cols = state.cols();
    let legal = state.legal_moves_mask();
    let first_to_move = state.is_first_player();

    out.push_str("   ");
    for col in 0..cols {
        out.push((b'a' + col as u8) as char);
        out.push(' ');
    }
    out.push('\n');

    for row in 0..state.rows() {
        let _ = write!(out, "{:>2} ", row + 1);
        for col in 0..cols {
            let index = row * cols + col;
            let c = match (state.cell(index), first_to_move) {
                (Cell::Own, true) | (Cell::Opponent, false) => 'X',
                (Cell::Own, false) | (Cell::Opponent, true) => 'O',
                (Cell::Blocked, _) => '#',
                (Cell::Empty, _) if legal & (1u64 << index) != 0 => '*',
                (Cell::Empty, _) => '.',
            };
            out.push(c);
            out.push(' ');
        }
        out.push('\n');
    }

    let (x, o) = (state.first_player_count(), state.second_player_count());
    let _ = writeln!(out, "depth: {}", state.depth());
    let _ = writeln!(
        out,
        "turn : {}",
        match state.player_to_move() {
            Player::First => "X",
            Player::Second => "O",
        }
    );
    let _ = writeln!(out, "X {} {}", x, if x > o { "✓" } else { "" });
    let _ = writeln!(out, "O {} {}", o, if o > x { "✓" } else { "" });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PlaySession {
        PlaySession::new(BoardConfig::default(), Player::First).unwrap()
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!(Input::parse("quit", 6, 6), Input::Quit);
        assert_eq!(Input::parse(" PASS ", 6, 6), Input::Pass);
        assert_eq!(Input::parse("2 4", 6, 6), Input::Cell(9));
        assert_eq!(Input::parse("d2", 6, 6), Input::Cell(9));
        assert_eq!(Input::parse("7 1", 6, 6), Input::Other);
        assert_eq!(Input::parse("0 1", 6, 6), Input::Other);
        assert_eq!(Input::parse("z9", 6, 6), Input::Other);
        assert_eq!(Input::parse("a0", 6, 6), Input::Other);
        assert_eq!(Input::parse("hello world again", 6, 6), Input::Other);
    }

    #[test]
    fn test_human_move_then_ai_request() {
        let mut session = session();
        assert_eq!(session.start(), Effect::Redraw);
        assert_eq!(session.phase(), Phase::HumanTurn);

        let effect = session.handle(Event::Human(Input::Cell(9)));
        assert!(matches!(effect, Effect::RequestAiMove(state) if state.depth() == 1));
        assert_eq!(session.phase(), Phase::AiTurn);
    }

    #[test]
    fn test_illegal_cell_ignored() {
        let mut session = session();
        assert_eq!(session.handle(Event::Human(Input::Cell(0))), Effect::Ignored);
        assert_eq!(session.handle(Event::Human(Input::Pass)), Effect::Ignored);
        assert_eq!(session.state().depth(), 0);
    }

    #[test]
    fn test_input_during_ai_turn_ignored() {
        let mut session = session();
        session.handle(Event::Human(Input::Cell(9)));
        assert_eq!(session.handle(Event::Human(Input::Cell(8))), Effect::Ignored);
        assert_eq!(session.phase(), Phase::AiTurn);
    }

    #[test]
    fn test_ai_move_returns_turn() {
        let mut session = session();
        session.handle(Event::Human(Input::Cell(9)));
        let ai_action = session.state().legal_actions()[0];

        assert_eq!(session.handle(Event::AiMoved(ai_action)), Effect::Redraw);
        assert_eq!(session.phase(), Phase::HumanTurn);
        assert_eq!(session.state().depth(), 2);
    }

    #[test]
    fn test_stray_ai_move_ignored() {
        let mut session = session();
        assert_eq!(session.handle(Event::AiMoved(Action::Place(9))), Effect::Ignored);
    }

    /// X cannot flank from the opening; O answers by filling the last cell.
    fn forced_pass_board() -> BoardConfig {
        BoardConfig::new(1, 3).with_opening(vec![1], vec![0])
    }

    #[test]
    fn test_forced_pass_on_any_input() {
        let mut session = PlaySession::new(forced_pass_board(), Player::First).unwrap();
        assert_eq!(session.phase(), Phase::HumanTurn);

        let effect = session.handle(Event::Human(Input::Other));
        assert!(matches!(effect, Effect::RequestAiMove(state) if state.depth() == 1));
        assert_eq!(session.phase(), Phase::AiTurn);
    }

    #[test]
    fn test_dead_opening_starts_finished() {
        let board = BoardConfig::new(2, 2).with_opening(vec![0], vec![3]);
        let session = PlaySession::new(board, Player::First).unwrap();
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.start(), Effect::Redraw);
    }

    #[test]
    fn test_input_after_finish_restarts() {
        let mut session = PlaySession::new(forced_pass_board(), Player::First).unwrap();
        session.handle(Event::Human(Input::Pass));
        assert_eq!(session.handle(Event::AiMoved(Action::Place(2))), Effect::Redraw);
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.state().winner(), Some(Player::Second));

        assert_eq!(session.handle(Event::Human(Input::Cell(1))), Effect::Redraw);
        assert_eq!(session.phase(), Phase::HumanTurn);
        assert_eq!(session.state().depth(), 0);
    }

    #[test]
    fn test_ai_first_requests_move() {
        let session = PlaySession::new(BoardConfig::default(), Player::Second).unwrap();
        assert_eq!(session.phase(), Phase::AiTurn);
        assert!(matches!(session.start(), Effect::RequestAiMove(_)));
    }

    #[test]
    fn test_ai_failure_finishes_game() {
        let mut session = session();
        session.handle(Event::Human(Input::Cell(9)));
        assert_eq!(
            session.handle(Event::AiFailed("model missing".to_string())),
            Effect::Redraw
        );
        assert_eq!(session.phase(), Phase::Finished);
    }

    #[test]
    fn test_quit_always_quits() {
        let mut session = session();
        session.handle(Event::Human(Input::Cell(9)));
        assert_eq!(session.handle(Event::Human(Input::Quit)), Effect::Quit);
    }

    #[test]
    fn test_render_marks_legal_moves() {
        let state = GameState::new(&BoardConfig::default()).unwrap();
        let text = render(&state);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0].trim(), "a b c d e f");
        assert_eq!(rows[2], " 2 . . . * . . ");
        assert!(text.contains("depth: 0"));
        assert!(text.contains("X 2"));
    }
}
