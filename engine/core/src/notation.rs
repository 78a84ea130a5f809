//! Official move notation.
//!
//! Columns are letters `a..m`; rows are numbered from the bottom `1..9`,
//! then `X` for 10. Internal rows grow downward from the top, so the
//! official row of internal row `r` on a board with `R` rows is `R - r`.
//!
//! A full ply renders as up to four dot-separated components in a fixed
//! order: cat destination (`C<cell>`), mouse destination (`M<cell>`), then
//! walls sorted `>` before `^` and by cell. Two steps of the same pawn
//! collapse into a single cumulative destination. Vertical walls render as
//! `><cell>`; horizontal walls render as `^<cell-below>`.

use thiserror::Error;

use crate::types::{Action, Cell, Direction, Move, Pawn, Wall, WallKind};

const COLUMN_LABELS: [char; 13] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
];
const ROW_LABELS: [char; 10] = ['1', '2', '3', '4', '5', '6', '7', '8', '9', 'X'];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotationError {
    #[error("cell ({column}, {row}) cannot be written in official notation for {rows} rows")]
    CellOutOfRange { column: i32, row: i32, rows: i32 },

    #[error("invalid cell notation '{0}'")]
    BadCell(String),

    #[error("invalid wall notation '{0}'")]
    BadWall(String),
}

/// Format a cell in official coordinates.
pub fn cell_notation(cell: Cell, rows: i32) -> Result<String, NotationError> {
    let official_row = rows - cell.row;
    if official_row < 1
        || official_row > ROW_LABELS.len() as i32
        || cell.column < 0
        || cell.column >= COLUMN_LABELS.len() as i32
    {
        return Err(NotationError::CellOutOfRange {
            column: cell.column,
            row: cell.row,
            rows,
        });
    }
    Ok(format!(
        "{}{}",
        COLUMN_LABELS[cell.column as usize],
        ROW_LABELS[official_row as usize - 1]
    ))
}

/// Parse a cell from official coordinates into internal coordinates.
pub fn parse_cell(text: &str, rows: i32) -> Result<Cell, NotationError> {
    let bad = || NotationError::BadCell(text.to_string());

    let mut chars = text.chars();
    let column_label = chars.next().ok_or_else(bad)?;
    let column = COLUMN_LABELS
        .iter()
        .position(|&c| c == column_label)
        .ok_or_else(bad)? as i32;

    let row_text = chars.as_str();
    let official_row = if row_text == "X" {
        10
    } else {
        row_text.parse::<i32>().map_err(|_| bad())?
    };
    if official_row < 1 || official_row > rows {
        return Err(bad());
    }

    Ok(Cell::new(column, rows - official_row))
}

/// Format a wall: `><cell>` for vertical walls, `^<cell-below>` for
/// horizontal ones.
pub fn wall_notation(wall: Wall, rows: i32) -> Result<String, NotationError> {
    match wall.kind {
        WallKind::Right => Ok(format!(">{}", cell_notation(wall.cell, rows)?)),
        WallKind::Down => {
            // A Down wall at (c, r) separates rows r and r + 1; the official
            // convention names the cell below it.
            let below = wall.cell.step(Direction::Down);
            Ok(format!("^{}", cell_notation(below, rows)?))
        }
    }
}

/// Parse a wall component (with its `>`/`^` marker).
pub fn parse_wall(text: &str, rows: i32) -> Result<Wall, NotationError> {
    let mut chars = text.chars();
    let marker = chars
        .next()
        .ok_or_else(|| NotationError::BadWall(text.to_string()))?;
    let cell = parse_cell(chars.as_str(), rows)?;

    match marker {
        '>' => Ok(Wall::new(cell, WallKind::Right)),
        '^' => Ok(Wall::new(cell.step(Direction::Up), WallKind::Down)),
        _ => Err(NotationError::BadWall(text.to_string())),
    }
}

impl Move {
    /// Render a full ply in official notation, given the acting player's
    /// pawn positions before the ply.
    pub fn standard_notation(
        &self,
        cat_start: Cell,
        mouse_start: Cell,
        rows: i32,
    ) -> Result<String, NotationError> {
        let mut cat_destination: Option<Cell> = None;
        let mut mouse_destination: Option<Cell> = None;
        let mut walls: Vec<Wall> = Vec::new();

        for action in [self.first, self.second] {
            match action {
                Action::Pawn(mv) => {
                    let (destination, start) = match mv.pawn {
                        Pawn::Cat => (&mut cat_destination, cat_start),
                        Pawn::Mouse => (&mut mouse_destination, mouse_start),
                    };
                    *destination = Some(destination.unwrap_or(start).step(mv.direction));
                }
                Action::Wall(wall) => walls.push(wall),
            }
        }

        // Vertical (>) before horizontal (^), then by cell.
        walls.sort_by(|a, b| a.kind.cmp(&b.kind).then(a.cell.cmp(&b.cell)));

        let mut parts = Vec::with_capacity(3);
        if let Some(cell) = cat_destination {
            parts.push(format!("C{}", cell_notation(cell, rows)?));
        }
        if let Some(cell) = mouse_destination {
            parts.push(format!("M{}", cell_notation(cell, rows)?));
        }
        for wall in walls {
            parts.push(wall_notation(wall, rows)?);
        }

        Ok(parts.join("."))
    }
}
