use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};

/// Largest supported board, bounded by the `u64` bitboards
pub const MAX_CELLS: usize = 64;

/// Board dimensions and fixed layout for one game variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BoardConfigFile")]
pub struct BoardConfig {
    /// Number of rows
    pub rows: usize,

    /// Number of columns
    pub cols: usize,

    /// Permanently blocked (non-playable) cells
    pub blocks: Vec<usize>,

    /// Initial cells of the first player
    pub first_player: Vec<usize>,

    /// Initial cells of the second player
    pub second_player: Vec<usize>,

    /// Ply after which a side with no pieces left ends the game
    pub elimination_after: u32,
}

impl BoardConfig {
    /// Create a `rows` x `cols` board with the usual centre opening
    pub fn new(rows: usize, cols: usize) -> Self {
        let (first_player, second_player) = centre_opening(rows, cols);
        Self {
            rows,
            cols,
            blocks: Vec::new(),
            first_player,
            second_player,
            elimination_after: 8,
        }
    }

    /// Set the blocked cells
    pub fn with_blocks(mut self, blocks: impl Into<Vec<usize>>) -> Self {
        self.blocks = blocks.into();
        self
    }

    /// Replace the opening position
    pub fn with_opening(
        mut self,
        first_player: impl Into<Vec<usize>>,
        second_player: impl Into<Vec<usize>>,
    ) -> Self {
        self.first_player = first_player.into();
        self.second_player = second_player.into();
        self
    }

    /// Set the elimination ply
    pub fn with_elimination_after(mut self, depth: u32) -> Self {
        self.elimination_after = depth;
        self
    }

    /// Number of cells including blocked ones; saturates on absurd sizes,
    /// which `validate` rejects
    pub fn cell_count(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Length of a policy vector: one slot per cell plus the pass slot
    pub fn policy_len(&self) -> usize {
        self.cell_count().saturating_add(1)
    }

    /// Length of the flat feature vector produced by `GameState::to_features`
    pub fn feature_len(&self) -> usize {
        self.cell_count().saturating_mul(crate::FEATURE_PLANES)
    }

    /// Check dimensions and that blocks and opening cells are disjoint and in range
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(BoardError::InvalidConfig(format!(
                "board must have at least one row and column, got {}x{}",
                self.rows, self.cols
            )));
        }
        let cells = match self.rows.checked_mul(self.cols) {
            Some(cells) if cells <= MAX_CELLS => cells,
            _ => {
                return Err(BoardError::InvalidConfig(format!(
                    "{}x{} board exceeds {MAX_CELLS} cells",
                    self.rows, self.cols
                )))
            }
        };

        let mut seen = 0u64;
        let groups = [
            ("blocks", &self.blocks),
            ("first_player", &self.first_player),
            ("second_player", &self.second_player),
        ];
        for (name, cells_in_group) in groups {
            for &idx in cells_in_group.iter() {
                if idx >= cells {
                    return Err(BoardError::InvalidConfig(format!(
                        "{name} cell {idx} is outside a board of {cells} cells"
                    )));
                }
                let bit = 1u64 << idx;
                if seen & bit != 0 {
                    return Err(BoardError::InvalidConfig(format!(
                        "cell {idx} is used more than once"
                    )));
                }
                seen |= bit;
            }
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(6, 6)
    }
}

/// On-disk form: a missing opening is derived from the board size
#[derive(Deserialize)]
#[serde(default)]
struct BoardConfigFile {
    rows: usize,
    cols: usize,
    blocks: Vec<usize>,
    first_player: Option<Vec<usize>>,
    second_player: Option<Vec<usize>>,
    elimination_after: u32,
}

impl Default for BoardConfigFile {
    fn default() -> Self {
        let config = BoardConfig::default();
        Self {
            rows: config.rows,
            cols: config.cols,
            blocks: config.blocks,
            first_player: None,
            second_player: None,
            elimination_after: config.elimination_after,
        }
    }
}

impl From<BoardConfigFile> for BoardConfig {
    fn from(file: BoardConfigFile) -> Self {
        let (first, second) = centre_opening(file.rows, file.cols);
        Self {
            rows: file.rows,
            cols: file.cols,
            blocks: file.blocks,
            first_player: file.first_player.unwrap_or(first),
            second_player: file.second_player.unwrap_or(second),
            elimination_after: file.elimination_after,
        }
    }
}

fn centre_opening(rows: usize, cols: usize) -> (Vec<usize>, Vec<usize>) {
    let fits = rows.checked_mul(cols).is_some_and(|cells| cells <= MAX_CELLS);
    if rows < 2 || cols < 2 || !fits {
        return (Vec::new(), Vec::new());
    }
    let (r, c) = (rows / 2 - 1, cols / 2 - 1);
    let at = |row: usize, col: usize| row * cols + col;
    (
        vec![at(r, c), at(r + 1, c + 1)],
        vec![at(r, c + 1), at(r + 1, c)],
    )
}

/// Compact, copyable view of a validated [`BoardConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Geometry {
    pub rows: u8,
    pub cols: u8,
    pub blocks: u64,
    pub elimination_after: u32,
}

impl Geometry {
    pub fn from_config(config: &BoardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rows: config.rows as u8,
            cols: config.cols as u8,
            blocks: mask_of(&config.blocks),
            elimination_after: config.elimination_after,
        })
    }

    pub fn cells(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn board_mask(&self) -> u64 {
        match self.cells() {
            MAX_CELLS => u64::MAX,
            n => (1u64 << n) - 1,
        }
    }

    pub fn playable_mask(&self) -> u64 {
        self.board_mask() & !self.blocks
    }
}

pub(crate) fn mask_of(cells: &[usize]) -> u64 {
    cells.iter().fold(0u64, |mask, &idx| mask | (1u64 << idx))
}
