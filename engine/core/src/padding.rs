//! Embedding a smaller game board inside the fixed model grid.
//!
//! One trained network serves many board sizes: the game rectangle is
//! embedded in the model grid and the rest is fenced off with padding walls.
//! Standard games sit at the top-left. Classic games sit at the bottom,
//! horizontally centered (left-biased), because the Classic goals are the
//! model's bottom corners; the bottom row's vertical walls stay open so a
//! cat can walk along it into a corner goal that lies outside the game
//! rectangle.

use crate::board::{Board, BoardError};
use crate::notation::{cell_notation, parse_cell, NotationError};
use crate::types::{Cell, Player, Variant, Wall, WallKind};

/// How a game board maps into the model grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddingConfig {
    pub model_rows: i32,
    pub model_columns: i32,
    pub game_rows: i32,
    pub game_columns: i32,
    pub row_offset: i32,
    pub col_offset: i32,
    pub variant: Variant,
}

impl PaddingConfig {
    pub fn new(
        model_rows: i32,
        model_columns: i32,
        game_rows: i32,
        game_columns: i32,
        variant: Variant,
    ) -> PaddingConfig {
        let (row_offset, col_offset) = match variant {
            Variant::Standard => (0, 0),
            Variant::Classic => (
                model_rows - game_rows,
                (model_columns - game_columns) / 2,
            ),
        };
        PaddingConfig {
            model_rows,
            model_columns,
            game_rows,
            game_columns,
            row_offset,
            col_offset,
            variant,
        }
    }

    pub fn needs_padding(&self) -> bool {
        self.game_rows != self.model_rows || self.game_columns != self.model_columns
    }

    /// Translate a game cell into model coordinates.
    pub fn transform_to_model(&self, game_cell: Cell) -> Cell {
        Cell::new(
            game_cell.column + self.col_offset,
            game_cell.row + self.row_offset,
        )
    }

    /// Translate a game wall into model coordinates.
    pub fn transform_wall_to_model(&self, game_wall: Wall) -> Wall {
        Wall::new(self.transform_to_model(game_wall.cell), game_wall.kind)
    }

    /// Translate a model cell back into game coordinates; `None` when the
    /// cell lies in the padding area.
    pub fn transform_to_game(&self, model_cell: Cell) -> Option<Cell> {
        let column = model_cell.column - self.col_offset;
        let row = model_cell.row - self.row_offset;
        if column < 0 || column >= self.game_columns || row < 0 || row >= self.game_rows {
            return None;
        }
        Some(Cell::new(column, row))
    }
}

/// Fence off everything outside the game rectangle so the search cannot
/// wander into padding. Padding walls are placed as red-owned walls; the
/// ownership never matters because they are outside the playable area.
pub fn place_padding_walls(board: &mut Board, config: &PaddingConfig) -> Result<(), BoardError> {
    if !config.needs_padding() {
        return Ok(());
    }

    let place = |board: &mut Board, wall: Wall| -> Result<(), BoardError> {
        if !board.is_blocked(wall) {
            board.place_wall(Player::Red, wall)?;
        }
        Ok(())
    };

    if config.variant == Variant::Standard {
        // Bottom boundary of the game area.
        for col in 0..config.game_columns {
            place(
                board,
                Wall::new(Cell::new(col, config.game_rows - 1), WallKind::Down),
            )?;
        }

        // Right boundary of the game area.
        for row in 0..config.game_rows {
            place(
                board,
                Wall::new(Cell::new(config.game_columns - 1, row), WallKind::Right),
            )?;
        }

        // Everything inside the padding area.
        for row in 0..config.model_rows {
            for col in 0..config.model_columns {
                if row < config.game_rows && col < config.game_columns {
                    continue;
                }
                place(board, Wall::new(Cell::new(col, row), WallKind::Right))?;
                place(board, Wall::new(Cell::new(col, row), WallKind::Down))?;
            }
        }
    } else {
        // Classic: game area sits at the bottom, centered.

        // The padding rows above the game area.
        for row in 0..config.row_offset {
            for col in 0..config.model_columns {
                if row < config.model_rows - 1 {
                    place(board, Wall::new(Cell::new(col, row), WallKind::Down))?;
                }
                place(board, Wall::new(Cell::new(col, row), WallKind::Right))?;
            }
        }

        // Top boundary of the game area.
        if config.row_offset > 0 {
            for col in config.col_offset..config.col_offset + config.game_columns {
                place(
                    board,
                    Wall::new(Cell::new(col, config.row_offset - 1), WallKind::Down),
                )?;
            }
        }

        // Left boundary, except on the bottom row (path to the corner goal).
        if config.col_offset > 0 {
            for row in config.row_offset..config.model_rows {
                if row == config.model_rows - 1 {
                    continue;
                }
                place(
                    board,
                    Wall::new(Cell::new(config.col_offset - 1, row), WallKind::Right),
                )?;
            }
        }

        // Right boundary, except on the bottom row.
        let right_boundary_col = config.col_offset + config.game_columns - 1;
        if right_boundary_col < config.model_columns - 1 {
            for row in config.row_offset..config.model_rows {
                if row == config.model_rows - 1 {
                    continue;
                }
                place(
                    board,
                    Wall::new(Cell::new(right_boundary_col, row), WallKind::Right),
                )?;
            }
        }

        // The padding columns beside the game area.
        let game_col_start = config.col_offset;
        let game_col_end = config.col_offset + config.game_columns;
        for row in config.row_offset..config.model_rows {
            for col in 0..config.model_columns {
                if col >= game_col_start && col < game_col_end {
                    continue;
                }
                place(board, Wall::new(Cell::new(col, row), WallKind::Down))?;
                if row == config.model_rows - 1 {
                    continue;
                }
                place(board, Wall::new(Cell::new(col, row), WallKind::Right))?;
            }
        }
    }

    Ok(())
}

/// Translate a move from model-coordinate official notation into
/// game-coordinate official notation.
///
/// Classic only: a pawn destination in the padding area (the corner goal of
/// a narrower game) clamps onto the nearest cell of the game's bottom row.
pub fn transform_move_notation(
    model_notation: &str,
    config: &PaddingConfig,
) -> Result<String, NotationError> {
    if !config.needs_padding() {
        return Ok(model_notation.to_string());
    }

    let mut parts = Vec::new();
    for component in model_notation.split('.') {
        let mut chars = component.chars();
        let marker = chars
            .next()
            .ok_or_else(|| NotationError::BadCell(component.to_string()))?;
        let model_cell = parse_cell(chars.as_str(), config.model_rows)?;

        match marker {
            'C' | 'M' => {
                let game_cell = match config.transform_to_game(model_cell) {
                    Some(cell) => cell,
                    None if config.variant == Variant::Classic => {
                        // Destination is a corner goal outside the game
                        // rectangle: clamp onto the game's bottom row.
                        let column = (model_cell.column - config.col_offset)
                            .clamp(0, config.game_columns - 1);
                        Cell::new(column, config.game_rows - 1)
                    }
                    None => {
                        parts.push(component.to_string());
                        continue;
                    }
                };
                parts.push(format!(
                    "{}{}",
                    marker,
                    cell_notation(game_cell, config.game_rows)?
                ));
            }
            '>' | '^' => {
                // Both conventions name a cell (for `^`, the cell below the
                // wall), so the cell translates directly.
                match config.transform_to_game(model_cell) {
                    Some(game_cell) => parts.push(format!(
                        "{}{}",
                        marker,
                        cell_notation(game_cell, config.game_rows)?
                    )),
                    None => parts.push(component.to_string()),
                }
            }
            _ => parts.push(component.to_string()),
        }
    }

    Ok(parts.join("."))
}
