//! Core game types: cells, walls, pawns, turns and actions.
//!
//! Coordinates are internal model coordinates: `(column, row)` with row 0 at
//! the top of the grid and rows growing downward. Official (human-facing)
//! notation flips rows; see the `notation` module.

use std::fmt;

/// One of the four grid directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

/// All directions, in the canonical iteration order used by the board.
pub const DIRECTIONS: [Direction; 4] = [
    Direction::Right,
    Direction::Down,
    Direction::Left,
    Direction::Up,
];

impl Direction {
    /// Index into direction-keyed tables (matches `DIRECTIONS` order).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::Right => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Up => 3,
        }
    }

    /// Mirror a direction across the vertical axis.
    pub fn flip_horizontal(self) -> Self {
        match self {
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::Down | Direction::Up => self,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Right => "Right",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Up => "Up",
        };
        f.write_str(name)
    }
}

/// The two players. Red is player 1, Blue is player 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    Red,
    Blue,
}

impl Player {
    #[inline]
    pub fn other(self) -> Player {
        match self {
            Player::Red => Player::Blue,
            Player::Blue => Player::Red,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Player::Red => "Red",
            Player::Blue => "Blue",
        })
    }
}

/// Game variant. In Classic the mice never move and only mark the goals; in
/// Standard both pawns are mobile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Classic,
    Standard,
}

impl Variant {
    /// Parse the wire-format variant name.
    pub fn parse(name: &str) -> Option<Variant> {
        match name {
            "classic" => Some(Variant::Classic),
            "standard" => Some(Variant::Standard),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Variant::Classic => "classic",
            Variant::Standard => "standard",
        }
    }
}

/// Outcome of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Red,
    Blue,
    Draw,
    Undecided,
}

impl From<Player> for Winner {
    fn from(player: Player) -> Winner {
        match player {
            Player::Red => Winner::Red,
            Player::Blue => Winner::Blue,
        }
    }
}

/// A grid cell in internal coordinates (row 0 at the top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub column: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(column: i32, row: i32) -> Cell {
        Cell { column, row }
    }

    /// The neighboring cell in the given direction, ignoring walls.
    pub fn step(self, direction: Direction) -> Cell {
        match direction {
            Direction::Right => Cell::new(self.column + 1, self.row),
            Direction::Down => Cell::new(self.column, self.row + 1),
            Direction::Left => Cell::new(self.column - 1, self.row),
            Direction::Up => Cell::new(self.column, self.row - 1),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Which of a cell's two outgoing edges a wall blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WallKind {
    Right,
    Down,
}

/// A wall on the edge between two cells. Canonical form stores the cell on
/// the left (for `Right` walls) or above (for `Down` walls).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wall {
    pub cell: Cell,
    pub kind: WallKind,
}

impl Wall {
    pub const fn new(cell: Cell, kind: WallKind) -> Wall {
        Wall { cell, kind }
    }

    /// The wall crossed when stepping from `cell` in `direction`. Left and Up
    /// normalize onto the canonical neighbor.
    pub fn between(cell: Cell, direction: Direction) -> Wall {
        match direction {
            Direction::Right => Wall::new(cell, WallKind::Right),
            Direction::Down => Wall::new(cell, WallKind::Down),
            Direction::Left => Wall::new(Cell::new(cell.column - 1, cell.row), WallKind::Right),
            Direction::Up => Wall::new(Cell::new(cell.column, cell.row - 1), WallKind::Down),
        }
    }

    /// The canonical direction this wall blocks from its stored cell.
    pub fn direction(self) -> Direction {
        match self.kind {
            WallKind::Right => Direction::Right,
            WallKind::Down => Direction::Down,
        }
    }
}

impl fmt::Display for Wall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            WallKind::Right => '>',
            WallKind::Down => '^',
        };
        write!(f, "{}{}", marker, self.cell)
    }
}

/// The two pawns each player controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pawn {
    Cat,
    Mouse,
}

impl fmt::Display for Pawn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pawn::Cat => "Cat",
            Pawn::Mouse => "Mouse",
        })
    }
}

/// A single pawn step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PawnMove {
    pub pawn: Pawn,
    pub direction: Direction,
}

/// The cell a pawn just vacated, used to suppress immediate backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviousPosition {
    pub pawn: Pawn,
    pub cell: Cell,
}

impl PreviousPosition {
    /// True when moving `pawn` onto `cell` would undo the previous action.
    #[inline]
    pub fn matches(self, pawn: Pawn, cell: Cell) -> bool {
        self.pawn == pawn && self.cell == cell
    }
}

/// One of the two actions a player takes per ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Pawn(PawnMove),
    Wall(Wall),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Pawn(mv) => write!(f, "{}:{}", mv.pawn, mv.direction),
            Action::Wall(wall) => wall.fmt(f),
        }
    }
}

/// A full ply: two ordered actions by the same player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub first: Action,
    pub second: Action,
}

/// Which of a player's two actions is next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnAction {
    First,
    Second,
}

/// Whose action is about to be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Turn {
    pub player: Player,
    pub action: TurnAction,
}

impl Turn {
    pub const fn new(player: Player, action: TurnAction) -> Turn {
        Turn { player, action }
    }

    /// Advance: First -> Second for the same player, Second -> the other
    /// player's First.
    pub fn next(self) -> Turn {
        match self.action {
            TurnAction::First => Turn::new(self.player, TurnAction::Second),
            TurnAction::Second => Turn::new(self.player.other(), TurnAction::First),
        }
    }

    /// Inverse of [`Turn::next`].
    pub fn prev(self) -> Turn {
        match self.action {
            TurnAction::Second => Turn::new(self.player, TurnAction::First),
            TurnAction::First => Turn::new(self.player.other(), TurnAction::Second),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            TurnAction::First => "First",
            TurnAction::Second => "Second",
        };
        write!(f, "{}:{}", self.player, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_cycles_through_both_players() {
        let start = Turn::new(Player::Red, TurnAction::First);
        let turns: Vec<Turn> = std::iter::successors(Some(start), |t| Some(t.next()))
            .take(4)
            .collect();

        assert_eq!(turns[1], Turn::new(Player::Red, TurnAction::Second));
        assert_eq!(turns[2], Turn::new(Player::Blue, TurnAction::First));
        assert_eq!(turns[3], Turn::new(Player::Blue, TurnAction::Second));
        assert_eq!(turns[3].next(), start);

        for t in &turns {
            assert_eq!(t.next().prev(), *t);
        }
    }

    #[test]
    fn wall_normalizes_left_and_up() {
        let cell = Cell::new(3, 2);
        assert_eq!(
            Wall::between(cell, Direction::Left),
            Wall::new(Cell::new(2, 2), WallKind::Right)
        );
        assert_eq!(
            Wall::between(cell, Direction::Up),
            Wall::new(Cell::new(3, 1), WallKind::Down)
        );
        assert_eq!(
            Wall::between(cell, Direction::Right),
            Wall::new(cell, WallKind::Right)
        );
        assert_eq!(
            Wall::between(cell, Direction::Down),
            Wall::new(cell, WallKind::Down)
        );
    }

    #[test]
    fn cell_order_is_column_major() {
        assert!(Cell::new(0, 5) < Cell::new(1, 0));
        assert!(Cell::new(2, 1) < Cell::new(2, 3));
    }

    #[test]
    fn direction_flip_is_involutive() {
        for dir in DIRECTIONS {
            assert_eq!(dir.flip_horizontal().flip_horizontal(), dir);
        }
    }
}
