//! BgsConfig parsing and coordinate adaptation.
//!
//! The wire format speaks game coordinates (`[row, col]`, row 0 at the
//! top) on a board of the configured size; the engine searches on the
//! model-sized board. This module validates session configs, builds the
//! padded model board, and converts played moves from game notation into
//! engine actions.

use serde::Deserialize;
use thiserror::Error;

use wallwars_core::board::BoardError;
use wallwars_core::notation::{parse_cell, NotationError};
use wallwars_core::padding::place_padding_walls;
use wallwars_core::{
    Action, Board, Cell, Direction, Move, PaddingConfig, Pawn, PawnMove, Player, Turn, TurnAction,
    Variant, Wall, WallKind, DIRECTIONS,
};

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("this engine only supports the 'classic' and 'standard' variants (not '{0}')")]
    UnsupportedVariant(String),

    #[error("Board dimensions must be at least 4x4 (got {width}x{height})")]
    BoardTooSmall { width: i32, height: i32 },

    #[error(
        "Board dimensions ({width}x{height}) exceed model dimensions ({model_columns}x{model_rows})"
    )]
    BoardTooLarge {
        width: i32,
        height: i32,
        model_rows: i32,
        model_columns: i32,
    },

    #[error("BgsConfig missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid wall orientation '{0}'")]
    BadOrientation(String),

    #[error("cannot parse move notation '{0}'")]
    BadMove(String),

    #[error("the mouse cannot move in the classic variant")]
    MouseMoveInClassic,

    #[error(transparent)]
    Notation(#[from] NotationError),

    #[error(transparent)]
    Board(#[from] BoardError),
}

// ============================================================================
// Wire config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BgsConfig {
    pub variant: String,
    pub board_width: i32,
    pub board_height: i32,
    pub initial_state: InitialState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitialState {
    pub pawns: Pawns,
    #[serde(default)]
    pub walls: Vec<WallSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pawns {
    pub p1: PawnSpec,
    pub p2: PawnSpec,
}

/// Pawn positions as `[row, col]`. Classic configs carry `home` (the goal
/// marker), standard configs carry `mouse`.
#[derive(Debug, Clone, Deserialize)]
pub struct PawnSpec {
    pub cat: [i32; 2],
    #[serde(default)]
    pub mouse: Option<[i32; 2]>,
    #[serde(default)]
    pub home: Option<[i32; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallSpec {
    pub cell: [i32; 2],
    pub orientation: String,
    #[serde(default = "default_player_id")]
    pub player_id: i32,
}

fn default_player_id() -> i32 {
    1
}

/// `[row, col]` to internal coordinates (both have row 0 at the top).
fn cell_from_wire(cell: [i32; 2]) -> Cell {
    Cell::new(cell[1], cell[0])
}

/// A vertical wall blocks rightward movement at its own cell; a horizontal
/// wall sits *above* its cell, so it is a Down wall one row up.
fn wall_from_wire(spec: &WallSpec) -> Result<(Wall, Player), AdapterError> {
    let cell = cell_from_wire(spec.cell);
    let wall = match spec.orientation.as_str() {
        "vertical" => Wall::new(cell, WallKind::Right),
        "horizontal" => Wall::new(Cell::new(cell.column, cell.row - 1), WallKind::Down),
        other => return Err(AdapterError::BadOrientation(other.to_string())),
    };
    let owner = if spec.player_id == 1 {
        Player::Red
    } else {
        Player::Blue
    };
    Ok((wall, owner))
}

// ============================================================================
// Validation and board construction
// ============================================================================

/// Check a session config against the model capabilities. Returns the
/// parsed variant.
pub fn validate_bgs_config(
    config: &BgsConfig,
    model_rows: i32,
    model_columns: i32,
) -> Result<Variant, AdapterError> {
    let variant = Variant::parse(&config.variant)
        .ok_or_else(|| AdapterError::UnsupportedVariant(config.variant.clone()))?;

    let (width, height) = (config.board_width, config.board_height);
    if width < 4 || height < 4 {
        return Err(AdapterError::BoardTooSmall { width, height });
    }
    if width > model_columns || height > model_rows {
        return Err(AdapterError::BoardTooLarge {
            width,
            height,
            model_rows,
            model_columns,
        });
    }

    if variant == Variant::Standard {
        if config.initial_state.pawns.p1.mouse.is_none() {
            return Err(AdapterError::MissingField("initialState.pawns.p1.mouse"));
        }
        if config.initial_state.pawns.p2.mouse.is_none() {
            return Err(AdapterError::MissingField("initialState.pawns.p2.mouse"));
        }
    }

    Ok(variant)
}

/// Build the padded model board for a session. The session always starts at
/// player 1's first action.
pub fn convert_bgs_config_to_board(
    config: &BgsConfig,
    model_rows: i32,
    model_columns: i32,
) -> Result<(Board, Turn, PaddingConfig), AdapterError> {
    let variant = validate_bgs_config(config, model_rows, model_columns)?;

    let padding = PaddingConfig::new(
        model_rows,
        model_columns,
        config.board_height,
        config.board_width,
        variant,
    );

    let pawns = &config.initial_state.pawns;
    let red_cat = padding.transform_to_model(cell_from_wire(pawns.p1.cat));
    let blue_cat = padding.transform_to_model(cell_from_wire(pawns.p2.cat));

    // Classic ignores the configured homes: the goals are the model's
    // bottom corners, which the padding layout keeps reachable.
    let (red_mouse, blue_mouse) = match variant {
        Variant::Classic => (
            Cell::new(0, model_rows - 1),
            Cell::new(model_columns - 1, model_rows - 1),
        ),
        Variant::Standard => {
            let p1 = pawns
                .p1
                .mouse
                .ok_or(AdapterError::MissingField("initialState.pawns.p1.mouse"))?;
            let p2 = pawns
                .p2
                .mouse
                .ok_or(AdapterError::MissingField("initialState.pawns.p2.mouse"))?;
            (
                padding.transform_to_model(cell_from_wire(p1)),
                padding.transform_to_model(cell_from_wire(p2)),
            )
        }
    };

    let mut board = Board::with_positions(
        model_columns,
        model_rows,
        red_cat,
        red_mouse,
        blue_cat,
        blue_mouse,
        variant,
    );
    place_padding_walls(&mut board, &padding)?;

    for spec in &config.initial_state.walls {
        let (game_wall, owner) = wall_from_wire(spec)?;
        board.place_wall(owner, padding.transform_wall_to_model(game_wall))?;
    }

    Ok((board, Turn::new(Player::Red, TurnAction::First), padding))
}

// ============================================================================
// Move parsing
// ============================================================================

/// Parse a played move from game-coordinate official notation into engine
/// actions on the model board.
///
/// Pawn destinations are resolved into one or two direction steps against
/// the live board (the notation only records the cumulative destination).
/// In Classic, a destination that was clamped onto the game's bottom row
/// may actually mean the corner goal in the padding area; both candidates
/// are tried. Pawn steps are ordered before wall placements; a ply is
/// always exactly two actions.
pub fn parse_move_notation(
    notation: &str,
    board: &Board,
    turn: Turn,
    padding: &PaddingConfig,
) -> Result<Move, AdapterError> {
    let bad = || AdapterError::BadMove(notation.to_string());

    let mut cat_dest: Option<Cell> = None;
    let mut mouse_dest: Option<Cell> = None;
    let mut walls: Vec<Wall> = Vec::new();

    for component in notation.split('.') {
        let mut chars = component.chars();
        let Some(marker) = chars.next() else {
            return Err(bad());
        };
        let coords = chars.as_str();

        match marker {
            'C' => {
                let game_cell = parse_cell(coords, padding.game_rows)?;
                cat_dest = Some(padding.transform_to_model(game_cell));
            }
            'M' => {
                if !board.allows_mouse_moves() {
                    return Err(AdapterError::MouseMoveInClassic);
                }
                let game_cell = parse_cell(coords, padding.game_rows)?;
                mouse_dest = Some(padding.transform_to_model(game_cell));
            }
            '>' => {
                let game_cell = parse_cell(coords, padding.game_rows)?;
                walls.push(Wall::new(
                    padding.transform_to_model(game_cell),
                    WallKind::Right,
                ));
            }
            '^' => {
                let game_cell = parse_cell(coords, padding.game_rows)?;
                let model_cell = padding.transform_to_model(game_cell);
                walls.push(Wall::new(
                    Cell::new(model_cell.column, model_cell.row - 1),
                    WallKind::Down,
                ));
            }
            _ => return Err(bad()),
        }
    }

    let pawn_components = usize::from(cat_dest.is_some()) + usize::from(mouse_dest.is_some());
    let budget = 2usize
        .checked_sub(walls.len())
        .filter(|&b| b >= pawn_components)
        .ok_or_else(bad)?;

    // Distribute the step budget: two pawns get one step each; a single
    // pawn takes whatever the walls leave over.
    let steps_per_pawn = if pawn_components == 2 { 1 } else { budget };

    let mut actions: Vec<Action> = Vec::with_capacity(2);

    for (pawn, dest) in [(Pawn::Cat, cat_dest), (Pawn::Mouse, mouse_dest)] {
        let Some(dest) = dest else { continue };
        if steps_per_pawn == 0 {
            return Err(bad());
        }

        let start = board.pawn_position(turn.player, pawn);

        // Classic corner goals live in the padding area; the game notation
        // clamps them onto the bottom row. When the named cell is exactly
        // the clamp of the acting player's goal, the goal itself is the
        // likelier destination, so it is tried first.
        let mut candidates = vec![dest];
        if padding.variant == Variant::Classic && pawn == Pawn::Cat {
            let goal = board.goal(turn.player);
            let clamp_max = padding.col_offset + padding.game_columns - 1;
            let goal_clamped = Cell::new(
                goal.column.clamp(padding.col_offset, clamp_max),
                padding.model_rows - 1,
            );
            if dest == goal_clamped && goal != dest {
                candidates.insert(0, goal);
            }
        }

        let directions = candidates
            .iter()
            .find_map(|&target| resolve_steps(board, start, target, steps_per_pawn))
            .ok_or_else(bad)?;

        actions.extend(
            directions
                .into_iter()
                .map(|direction| Action::Pawn(PawnMove { pawn, direction })),
        );
    }

    actions.extend(walls.into_iter().map(Action::Wall));

    if actions.len() != 2 {
        return Err(bad());
    }
    Ok(Move {
        first: actions[0],
        second: actions[1],
    })
}

/// Find a wall-respecting step sequence of exactly `steps` moves from
/// `start` to `dest`.
fn resolve_steps(board: &Board, start: Cell, dest: Cell, steps: usize) -> Option<Vec<Direction>> {
    match steps {
        1 => DIRECTIONS
            .into_iter()
            .find(|&direction| {
                start.step(direction) == dest
                    && !board.is_blocked(Wall::between(start, direction))
            })
            .map(|direction| vec![direction]),
        2 => {
            for first in DIRECTIONS {
                if board.is_blocked(Wall::between(start, first)) {
                    continue;
                }
                let middle = start.step(first);
                for second in DIRECTIONS {
                    if middle.step(second) == dest
                        && !board.is_blocked(Wall::between(middle, second))
                    {
                        return Some(vec![first, second]);
                    }
                }
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
