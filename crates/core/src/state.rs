use std::fmt;

use crate::action::Action;
use crate::config::{mask_of, BoardConfig, Geometry};
use crate::error::{BoardError, Result};
use crate::FEATURE_PLANES;

const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// One of the two sides, fixed for the whole game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    First,
    Second,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}

/// Content of a single cell, relative to the player to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Own,
    Opponent,
    Empty,
    Blocked,
}

/// Immutable board position.
///
/// `own` always holds the pieces of the player to move; every transition swaps
/// the two bitboards. Bit `i` is cell `i = row * cols + col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameState {
    own: u64,
    opponent: u64,
    depth: u32,
    geometry: Geometry,
}

impl GameState {
    /// Opening position of `config`
    pub fn new(config: &BoardConfig) -> Result<Self> {
        let geometry = Geometry::from_config(config)?;
        Ok(Self {
            own: mask_of(&config.first_player),
            opponent: mask_of(&config.second_player),
            depth: 0,
            geometry,
        })
    }

    /// Build a position from a string of `cols * rows` cells.
    ///
    /// `X` is the first player, `O` the second, `-` or `.` empty and `#` a
    /// blocked cell (it must match `config.blocks`). Whitespace is ignored.
    /// `depth` decides who is to move.
    pub fn from_board_str(config: &BoardConfig, board: &str, depth: u32) -> Result<Self> {
        let geometry = Geometry::from_config(config)?;
        let cells: Vec<char> = board.chars().filter(|c| !c.is_whitespace()).collect();
        if cells.len() != geometry.cells() {
            return Err(BoardError::InvalidBoardString {
                index: cells.len(),
                reason: format!("expected {} cells", geometry.cells()),
            });
        }

        let (mut first, mut second) = (0u64, 0u64);
        for (index, c) in cells.into_iter().enumerate() {
            let bit = 1u64 << index;
            let blocked = geometry.blocks & bit != 0;
            match (c, blocked) {
                ('#', true) => {}
                (_, true) => {
                    return Err(BoardError::InvalidBoardString {
                        index,
                        reason: "blocked cell must be '#'".into(),
                    })
                }
                ('X', false) => first |= bit,
                ('O', false) => second |= bit,
                ('-' | '.', false) => {}
                (other, false) => {
                    return Err(BoardError::InvalidBoardString {
                        index,
                        reason: format!("unexpected character '{other}'"),
                    })
                }
            }
        }

        let (own, opponent) = if depth % 2 == 0 {
            (first, second)
        } else {
            (second, first)
        };
        Ok(Self {
            own,
            opponent,
            depth,
            geometry,
        })
    }

    pub fn rows(&self) -> usize {
        self.geometry.rows as usize
    }

    pub fn cols(&self) -> usize {
        self.geometry.cols as usize
    }

    pub fn cell_count(&self) -> usize {
        self.geometry.cells()
    }

    pub fn policy_len(&self) -> usize {
        self.cell_count() + 1
    }

    pub fn feature_len(&self) -> usize {
        FEATURE_PLANES * self.cell_count()
    }

    /// Number of plies played so far
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The first player moves on even plies
    pub fn is_first_player(&self) -> bool {
        self.depth % 2 == 0
    }

    pub fn player_to_move(&self) -> Player {
        if self.is_first_player() {
            Player::First
        } else {
            Player::Second
        }
    }

    pub fn cell(&self, index: usize) -> Cell {
        let bit = 1u64 << index;
        if self.geometry.blocks & bit != 0 {
            Cell::Blocked
        } else if self.own & bit != 0 {
            Cell::Own
        } else if self.opponent & bit != 0 {
            Cell::Opponent
        } else {
            Cell::Empty
        }
    }

    /// Pieces of the player to move
    pub fn piece_count(&self) -> u32 {
        self.own.count_ones()
    }

    /// Pieces of the player who just moved
    pub fn opponent_piece_count(&self) -> u32 {
        self.opponent.count_ones()
    }

    pub fn first_player_count(&self) -> u32 {
        if self.is_first_player() {
            self.piece_count()
        } else {
            self.opponent_piece_count()
        }
    }

    pub fn second_player_count(&self) -> u32 {
        if self.is_first_player() {
            self.opponent_piece_count()
        } else {
            self.piece_count()
        }
    }

    fn empty_mask(&self) -> u64 {
        self.geometry.playable_mask() & !(self.own | self.opponent)
    }

    /// Opponent pieces flipped by placing at `index`; zero if the move is illegal
    fn flips(&self, index: usize) -> u64 {
        let cols = self.geometry.cols as i32;
        let rows = self.geometry.rows as i32;
        let (x, y) = (index as i32 % cols, index as i32 / cols);

        let mut flips = 0u64;
        for (dx, dy) in DIRECTIONS {
            let mut line = 0u64;
            let (mut cx, mut cy) = (x + dx, y + dy);
            while (0..cols).contains(&cx) && (0..rows).contains(&cy) {
                let bit = 1u64 << (cy * cols + cx);
                if self.opponent & bit != 0 {
                    line |= bit;
                } else {
                    if self.own & bit != 0 {
                        flips |= line;
                    }
                    break;
                }
                cx += dx;
                cy += dy;
            }
        }
        flips
    }

    /// Bitmask of cells the player to move can place on
    pub fn legal_moves_mask(&self) -> u64 {
        let mut legal = 0u64;
        let mut empty = self.empty_mask();
        while empty != 0 {
            let index = empty.trailing_zeros() as usize;
            if self.flips(index) != 0 {
                legal |= 1u64 << index;
            }
            empty &= empty - 1;
        }
        legal
    }

    /// Playable cells in ascending order, or `[Pass]` if there are none
    pub fn legal_actions(&self) -> Vec<Action> {
        let mut mask = self.legal_moves_mask();
        if mask == 0 {
            return vec![Action::Pass];
        }
        let mut actions = Vec::with_capacity(mask.count_ones() as usize);
        while mask != 0 {
            actions.push(Action::Place(mask.trailing_zeros() as usize));
            mask &= mask - 1;
        }
        actions
    }

    /// Whether the player to move has nothing but a pass
    pub fn is_pass(&self) -> bool {
        self.legal_moves_mask() == 0
    }

    pub fn is_legal(&self, action: Action) -> bool {
        match action {
            Action::Pass => self.is_pass(),
            Action::Place(index) => {
                index < self.cell_count()
                    && self.empty_mask() & (1u64 << index) != 0
                    && self.flips(index) != 0
            }
        }
    }

    /// Apply `action` and hand the move to the other player
    pub fn next(&self, action: Action) -> Result<Self> {
        if self.is_done() {
            return Err(BoardError::GameOver);
        }
        if !self.is_legal(action) {
            return Err(BoardError::InvalidAction(action));
        }

        let (mut own, mut opponent) = (self.own, self.opponent);
        if let Action::Place(index) = action {
            let flips = self.flips(index);
            own |= (1u64 << index) | flips;
            opponent &= !flips;
        }

        Ok(Self {
            own: opponent,
            opponent: own,
            depth: self.depth + 1,
            geometry: self.geometry,
        })
    }

    /// Same position with the other side to move
    fn swapped(&self) -> Self {
        Self {
            own: self.opponent,
            opponent: self.own,
            ..*self
        }
    }

    /// Finished when the board is full, `depth >= cells`, one side is wiped
    /// out after `elimination_after`, or neither side has a placement left.
    pub fn is_done(&self) -> bool {
        if self.empty_mask() == 0 || self.depth as usize >= self.cell_count() {
            return true;
        }
        if self.depth > self.geometry.elimination_after && (self.own == 0 || self.opponent == 0) {
            return true;
        }
        self.is_pass() && self.swapped().is_pass()
    }

    /// Player to move has more pieces in a finished game
    pub fn is_win(&self) -> bool {
        self.is_done() && self.piece_count() > self.opponent_piece_count()
    }

    pub fn is_lose(&self) -> bool {
        self.is_done() && self.piece_count() < self.opponent_piece_count()
    }

    pub fn is_draw(&self) -> bool {
        self.is_done() && self.piece_count() == self.opponent_piece_count()
    }

    /// Final outcome for the player to move: `1.0`, `-1.0` or `0.0`
    pub fn terminal_value(&self) -> Option<f32> {
        if !self.is_done() {
            return None;
        }
        Some(if self.is_win() {
            1.0
        } else if self.is_lose() {
            -1.0
        } else {
            0.0
        })
    }

    /// Side with more pieces in a finished game; `None` for a draw or an unfinished game
    pub fn winner(&self) -> Option<Player> {
        if self.is_win() {
            Some(self.player_to_move())
        } else if self.is_lose() {
            Some(self.player_to_move().opponent())
        } else {
            None
        }
    }

    /// Network input: own, opponent, empty and blocked planes, each `cells` long
    pub fn to_features(&self) -> Vec<f32> {
        let cells = self.cell_count();
        let mut features = vec![0.0f32; FEATURE_PLANES * cells];
        for index in 0..cells {
            let plane = match self.cell(index) {
                Cell::Own => 0,
                Cell::Opponent => 1,
                Cell::Empty => 2,
                Cell::Blocked => 3,
            };
            features[plane * cells + index] = 1.0;
        }
        features
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first_to_move = self.is_first_player();
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                let c = match (self.cell(row * self.cols() + col), first_to_move) {
                    (Cell::Own, true) | (Cell::Opponent, false) => 'X',
                    (Cell::Own, false) | (Cell::Opponent, true) => 'O',
                    (Cell::Empty, _) => '.',
                    (Cell::Blocked, _) => '#',
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
