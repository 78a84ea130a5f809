//! Board state and legal-action generation.
//!
//! Each cell carries an 8-bit state: pawn occupancy for both players plus
//! ownership of the outgoing right/down walls. Pawn positions are stored
//! redundantly for O(1) queries. Legal wall generation runs a bridge-finding
//! pass per player so that no wall can disconnect a cat from its goal.

use std::collections::{HashSet, VecDeque};

use thiserror::Error;

use crate::types::{
    Action, Cell, Direction, Pawn, PawnMove, Player, Variant, Wall, WallKind, Winner, DIRECTIONS,
};

/// Errors for board mutations. These indicate caller bugs (the search only
/// applies actions drawn from the legal set), so callers typically propagate
/// them as fatal.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("cannot step {pawn} {direction} from {cell}: wall is blocked")]
    BlockedStep {
        pawn: Pawn,
        direction: Direction,
        cell: Cell,
    },

    #[error("cannot place {wall}: edge is already blocked")]
    WallOccupied { wall: Wall },

    #[error("the mouse cannot move in the classic variant")]
    MouseImmobile,
}

mod cell_bits {
    pub const RED_CAT: u8 = 1 << 0;
    pub const BLUE_CAT: u8 = 1 << 1;
    pub const RED_RIGHT_WALL: u8 = 1 << 2;
    pub const RED_DOWN_WALL: u8 = 1 << 3;
    pub const BLUE_RIGHT_WALL: u8 = 1 << 4;
    pub const BLUE_DOWN_WALL: u8 = 1 << 5;
    pub const RED_MOUSE: u8 = 1 << 6;
    pub const BLUE_MOUSE: u8 = 1 << 7;

    pub const RIGHT_WALL: u8 = RED_RIGHT_WALL | BLUE_RIGHT_WALL;
    pub const DOWN_WALL: u8 = RED_DOWN_WALL | BLUE_DOWN_WALL;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PlayerPawns {
    cat: Cell,
    mouse: Cell,
}

/// Iterative DFS frame for bridge finding. Kept explicit so large boards
/// cannot overflow the call stack.
#[derive(Debug, Clone, Copy)]
struct StackFrame {
    cell: Cell,
    level: i32,
    dir_index: usize,
    target_found: bool,
    min_level: i32,
}

impl StackFrame {
    const EMPTY: StackFrame = StackFrame {
        cell: Cell::new(0, 0),
        level: 0,
        dir_index: 0,
        target_found: false,
        min_level: 0,
    };
}

/// A rectangular Wallwars board.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    columns: i32,
    rows: i32,
    variant: Variant,
    red: PlayerPawns,
    blue: PlayerPawns,
    cells: Vec<u8>,
}

impl Board {
    /// Board with explicit pawn positions.
    pub fn with_positions(
        columns: i32,
        rows: i32,
        red_cat: Cell,
        red_mouse: Cell,
        blue_cat: Cell,
        blue_mouse: Cell,
        variant: Variant,
    ) -> Board {
        let mut board = Board {
            columns,
            rows,
            variant,
            red: PlayerPawns {
                cat: red_cat,
                mouse: red_mouse,
            },
            blue: PlayerPawns {
                cat: blue_cat,
                mouse: blue_mouse,
            },
            cells: vec![0; (columns * rows) as usize],
        };
        *board.cell_mut(red_cat) |= cell_bits::RED_CAT;
        *board.cell_mut(blue_cat) |= cell_bits::BLUE_CAT;
        *board.cell_mut(red_mouse) |= cell_bits::RED_MOUSE;
        *board.cell_mut(blue_mouse) |= cell_bits::BLUE_MOUSE;
        board
    }

    /// Board with the default starting position: cats in the top corners,
    /// mice in the bottom corners.
    pub fn new(columns: i32, rows: i32, variant: Variant) -> Board {
        Board::with_positions(
            columns,
            rows,
            Cell::new(0, 0),
            Cell::new(0, rows - 1),
            Cell::new(columns - 1, 0),
            Cell::new(columns - 1, rows - 1),
            variant,
        )
    }

    #[inline]
    pub fn columns(&self) -> i32 {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> i32 {
        self.rows
    }

    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[inline]
    pub fn allows_mouse_moves(&self) -> bool {
        self.variant == Variant::Standard
    }

    /// Number of pawn-move prior entries the model emits for this variant.
    pub fn move_prior_size(&self) -> usize {
        if self.allows_mouse_moves() {
            8
        } else {
            4
        }
    }

    /// Column-major cell index.
    #[inline]
    pub fn index_from_cell(&self, cell: Cell) -> usize {
        (cell.column * self.rows + cell.row) as usize
    }

    #[inline]
    pub fn cell_at_index(&self, index: usize) -> Cell {
        let index = index as i32;
        Cell::new(index / self.rows, index % self.rows)
    }

    #[inline]
    fn cell_state(&self, cell: Cell) -> u8 {
        self.cells[self.index_from_cell(cell)]
    }

    #[inline]
    fn cell_mut(&mut self, cell: Cell) -> &mut u8 {
        let index = self.index_from_cell(cell);
        &mut self.cells[index]
    }

    /// Whether the edge a wall would occupy is blocked. Grid boundaries count
    /// as permanently blocked.
    pub fn is_blocked(&self, wall: Wall) -> bool {
        let Cell { column, row } = wall.cell;
        if column < 0 || row < 0 || column >= self.columns || row >= self.rows {
            return true;
        }
        match wall.kind {
            WallKind::Down => {
                row == self.rows - 1 || self.cell_state(wall.cell) & cell_bits::DOWN_WALL != 0
            }
            WallKind::Right => {
                column == self.columns - 1
                    || self.cell_state(wall.cell) & cell_bits::RIGHT_WALL != 0
            }
        }
    }

    /// The player who placed a wall on this edge, if any. Boundary edges have
    /// no owner.
    pub fn wall_owner(&self, wall: Wall) -> Option<Player> {
        if !self.is_blocked(wall) {
            return None;
        }
        let Cell { column, row } = wall.cell;
        if column < 0 || row < 0 || column >= self.columns || row >= self.rows {
            return None;
        }
        let state = self.cell_state(wall.cell);
        let (red_bit, blue_bit) = match wall.kind {
            WallKind::Down => (cell_bits::RED_DOWN_WALL, cell_bits::BLUE_DOWN_WALL),
            WallKind::Right => (cell_bits::RED_RIGHT_WALL, cell_bits::BLUE_RIGHT_WALL),
        };
        if state & red_bit != 0 {
            Some(Player::Red)
        } else if state & blue_bit != 0 {
            Some(Player::Blue)
        } else {
            None
        }
    }

    #[inline]
    pub fn position(&self, player: Player) -> Cell {
        match player {
            Player::Red => self.red.cat,
            Player::Blue => self.blue.cat,
        }
    }

    #[inline]
    pub fn mouse(&self, player: Player) -> Cell {
        match player {
            Player::Red => self.red.mouse,
            Player::Blue => self.blue.mouse,
        }
    }

    /// A player's goal is the opposing mouse.
    #[inline]
    pub fn goal(&self, player: Player) -> Cell {
        self.mouse(player.other())
    }

    #[inline]
    pub fn pawn_position(&self, player: Player, pawn: Pawn) -> Cell {
        match pawn {
            Pawn::Cat => self.position(player),
            Pawn::Mouse => self.mouse(player),
        }
    }

    /// Directions a pawn can legally step. The mouse contributes nothing in
    /// Classic.
    pub fn legal_directions(&self, player: Player, pawn: Pawn) -> Vec<Direction> {
        if pawn == Pawn::Mouse && !self.allows_mouse_moves() {
            return Vec::new();
        }
        let position = self.pawn_position(player, pawn);
        DIRECTIONS
            .into_iter()
            .filter(|&dir| !self.is_blocked(Wall::between(position, dir)))
            .collect()
    }

    /// Walls that may be placed without disconnecting either cat from its
    /// goal. Computed as: all unblocked edges minus the union of bridges on
    /// both players' cat-to-goal paths.
    pub fn legal_walls(&self) -> Vec<Wall> {
        let mut illegal = HashSet::new();
        let cell_count = (self.columns * self.rows) as usize;
        let mut levels = vec![-1; cell_count];
        let mut stack = vec![StackFrame::EMPTY; cell_count];

        self.find_bridges(
            self.position(Player::Blue),
            self.goal(Player::Blue),
            &mut levels,
            &mut illegal,
            &mut stack,
        );
        levels.fill(-1);
        self.find_bridges(
            self.position(Player::Red),
            self.goal(Player::Red),
            &mut levels,
            &mut illegal,
            &mut stack,
        );

        let mut result = Vec::new();
        for column in 0..self.columns {
            for row in 0..self.rows {
                for kind in [WallKind::Down, WallKind::Right] {
                    let wall = Wall::new(Cell::new(column, row), kind);
                    if !self.is_blocked(wall) && !illegal.contains(&wall) {
                        result.push(wall);
                    }
                }
            }
        }
        result
    }

    /// Every legal action for `player`: cat steps, mouse steps (Standard),
    /// then walls.
    pub fn legal_actions(&self, player: Player) -> Vec<Action> {
        let cat_dirs = self.legal_directions(player, Pawn::Cat);
        let mouse_dirs = self.legal_directions(player, Pawn::Mouse);
        let walls = self.legal_walls();

        let mut result = Vec::with_capacity(cat_dirs.len() + mouse_dirs.len() + walls.len());
        result.extend(cat_dirs.into_iter().map(|direction| {
            Action::Pawn(PawnMove {
                pawn: Pawn::Cat,
                direction,
            })
        }));
        result.extend(mouse_dirs.into_iter().map(|direction| {
            Action::Pawn(PawnMove {
                pawn: Pawn::Mouse,
                direction,
            })
        }));
        result.extend(walls.into_iter().map(Action::Wall));
        result
    }

    /// Iterative bridge finding from `start` toward `target`. An edge is a
    /// bridge when the child subtree cannot reach back above the parent's DFS
    /// level and the target lies inside that subtree.
    fn find_bridges(
        &self,
        start: Cell,
        target: Cell,
        levels: &mut [i32],
        bridges: &mut HashSet<Wall>,
        stack: &mut [StackFrame],
    ) {
        levels[self.index_from_cell(start)] = 1;
        stack[0] = StackFrame {
            cell: start,
            level: 1,
            dir_index: 0,
            target_found: start == target,
            min_level: 1,
        };
        let mut stack_size = 1usize;

        while stack_size > 0 {
            let frame = stack[stack_size - 1];
            let mut advanced = false;

            for dir_index in frame.dir_index..4 {
                let dir = DIRECTIONS[dir_index];
                if self.is_blocked(Wall::between(frame.cell, dir)) {
                    continue;
                }

                let neighbor = frame.cell.step(dir);
                let neighbor_level = levels[self.index_from_cell(neighbor)];

                if neighbor_level == frame.level - 1 {
                    // parent
                    continue;
                }

                if neighbor_level == -1 {
                    levels[self.index_from_cell(neighbor)] = frame.level + 1;
                    stack[stack_size - 1].dir_index = dir_index + 1;
                    stack[stack_size] = StackFrame {
                        cell: neighbor,
                        level: frame.level + 1,
                        dir_index: 0,
                        target_found: neighbor == target,
                        min_level: frame.level + 1,
                    };
                    stack_size += 1;
                    advanced = true;
                    break;
                } else {
                    stack[stack_size - 1].min_level =
                        stack[stack_size - 1].min_level.min(neighbor_level);
                }
            }

            if !advanced {
                let done = stack[stack_size - 1];
                stack_size -= 1;

                if stack_size > 0 {
                    let parent = &mut stack[stack_size - 1];
                    parent.target_found = parent.target_found || done.target_found;
                    parent.min_level = parent.min_level.min(done.min_level);

                    if done.target_found && done.min_level > parent.level {
                        let dir = DIRECTIONS[parent.dir_index - 1];
                        bridges.insert(Wall::between(parent.cell, dir));
                    }
                }
            }
        }
    }

    /// Move a pawn one step.
    pub fn take_step(
        &mut self,
        player: Player,
        pawn: Pawn,
        direction: Direction,
    ) -> Result<(), BoardError> {
        let position = self.pawn_position(player, pawn);
        if self.is_blocked(Wall::between(position, direction)) {
            return Err(BoardError::BlockedStep {
                pawn,
                direction,
                cell: position,
            });
        }

        let bit = match (player, pawn) {
            (Player::Red, Pawn::Cat) => cell_bits::RED_CAT,
            (Player::Red, Pawn::Mouse) => cell_bits::RED_MOUSE,
            (Player::Blue, Pawn::Cat) => cell_bits::BLUE_CAT,
            (Player::Blue, Pawn::Mouse) => cell_bits::BLUE_MOUSE,
        };

        let next = position.step(direction);
        *self.cell_mut(position) &= !bit;
        *self.cell_mut(next) |= bit;

        let pawns = match player {
            Player::Red => &mut self.red,
            Player::Blue => &mut self.blue,
        };
        match pawn {
            Pawn::Cat => pawns.cat = next,
            Pawn::Mouse => pawns.mouse = next,
        }
        Ok(())
    }

    /// Place a wall owned by `player`. Placing on an already-blocked edge is
    /// an error.
    pub fn place_wall(&mut self, player: Player, wall: Wall) -> Result<(), BoardError> {
        if self.is_blocked(wall) {
            return Err(BoardError::WallOccupied { wall });
        }

        let bit = match (player, wall.kind) {
            (Player::Red, WallKind::Right) => cell_bits::RED_RIGHT_WALL,
            (Player::Red, WallKind::Down) => cell_bits::RED_DOWN_WALL,
            (Player::Blue, WallKind::Right) => cell_bits::BLUE_RIGHT_WALL,
            (Player::Blue, WallKind::Down) => cell_bits::BLUE_DOWN_WALL,
        };
        *self.cell_mut(wall.cell) |= bit;
        Ok(())
    }

    /// Apply one action for `player`.
    pub fn do_action(&mut self, player: Player, action: Action) -> Result<(), BoardError> {
        match action {
            Action::Pawn(mv) => {
                if mv.pawn == Pawn::Mouse && !self.allows_mouse_moves() {
                    return Err(BoardError::MouseImmobile);
                }
                self.take_step(player, mv.pawn, mv.direction)
            }
            Action::Wall(wall) => self.place_wall(player, wall),
        }
    }

    /// Outcome of the position. Red capturing is downgraded to a draw when
    /// blue's cat is within distance 2 of red's mouse (close-race rule); an
    /// unreachable mouse never triggers the draw.
    pub fn winner(&self) -> Winner {
        if self.red.cat == self.blue.mouse {
            if let Some(dist) = self.distance(self.blue.cat, self.red.mouse) {
                if dist <= 2 {
                    return Winner::Draw;
                }
            }
            return Winner::Red;
        }
        if self.blue.cat == self.red.mouse {
            return Winner::Blue;
        }
        Winner::Undecided
    }

    /// Position score in [-1, 1] from `player`'s perspective: exact on
    /// terminal positions, otherwise a ratio of the two cat-to-goal
    /// distances.
    pub fn score_for(&self, player: Player) -> f32 {
        match self.winner() {
            Winner::Draw => return 0.0,
            Winner::Red => return if player == Player::Red { 1.0 } else { -1.0 },
            Winner::Blue => return if player == Player::Blue { 1.0 } else { -1.0 },
            Winner::Undecided => {}
        }

        let opponent = player.other();
        let mine = self.distance(self.position(player), self.goal(player));
        let theirs = self.distance(self.position(opponent), self.goal(opponent));

        match (mine, theirs) {
            (Some(mine), Some(theirs)) => {
                let (mine, theirs) = (mine as f32, theirs as f32);
                if mine < theirs {
                    1.0 - mine / theirs
                } else {
                    -1.0 + theirs / mine
                }
            }
            (Some(_), None) => 1.0,
            (None, Some(_)) => -1.0,
            (None, None) => 0.0,
        }
    }

    /// BFS distance between two cells, or `None` when unreachable.
    pub fn distance(&self, start: Cell, target: Cell) -> Option<i32> {
        if start == target {
            return Some(0);
        }

        let mut visited = vec![false; (self.columns * self.rows) as usize];
        visited[self.index_from_cell(start)] = true;
        let mut queue = VecDeque::from([(start, 0)]);

        while let Some((cell, dist)) = queue.pop_front() {
            for dir in DIRECTIONS {
                if self.is_blocked(Wall::between(cell, dir)) {
                    continue;
                }
                let neighbor = cell.step(dir);
                if neighbor == target {
                    return Some(dist + 1);
                }
                let index = self.index_from_cell(neighbor);
                if !visited[index] {
                    visited[index] = true;
                    queue.push_back((neighbor, dist + 1));
                }
            }
        }
        None
    }

    /// Per-cell blocked-direction table, indexed like the cell grid with
    /// [`Direction::index`] as the inner index.
    pub fn blocked_directions(&self) -> Vec<[bool; 4]> {
        let cell_count = (self.columns * self.rows) as usize;
        let mut result = vec![[false; 4]; cell_count];
        for (index, entry) in result.iter_mut().enumerate() {
            let cell = self.cell_at_index(index);
            for dir in DIRECTIONS {
                entry[dir.index()] = self.is_blocked(Wall::between(cell, dir));
            }
        }
        result
    }

    /// Fill `dists` with BFS distances from `start`, scaled by
    /// `1 / (columns * rows)`. `dists` must already be initialized to 1.0
    /// (the value unreachable cells keep), and `queue` is caller-owned so
    /// repeated calls can reuse its allocation.
    pub fn fill_relative_distances(
        &self,
        start: Cell,
        dists: &mut [f32],
        blocked_dirs: &[[bool; 4]],
        queue: &mut Vec<(Cell, i32)>,
    ) {
        let cell_count = (self.columns * self.rows) as usize;
        debug_assert_eq!(dists.len(), cell_count);

        let scaling = 1.0 / cell_count as f32;

        queue.clear();
        queue.reserve(cell_count);

        dists[self.index_from_cell(start)] = 0.0;
        queue.push((start, 0));

        let mut head = 0;
        while head < queue.len() {
            let (cell, dist) = queue[head];
            head += 1;
            let cell_index = self.index_from_cell(cell);

            for dir in DIRECTIONS {
                if blocked_dirs[cell_index][dir.index()] {
                    continue;
                }
                let neighbor = cell.step(dir);
                let neighbor_index = self.index_from_cell(neighbor);
                if dists[neighbor_index] == 1.0 {
                    queue.push((neighbor, dist + 1));
                    dists[neighbor_index] = (dist + 1) as f32 * scaling;
                }
            }
        }
    }

    /// Allocating convenience wrapper around [`Board::fill_relative_distances`].
    pub fn relative_distances(&self, start: Cell) -> Vec<f32> {
        let mut dists = vec![1.0; (self.columns * self.rows) as usize];
        let mut queue = Vec::new();
        self.fill_relative_distances(start, &mut dists, &self.blocked_directions(), &mut queue);
        dists
    }

    /// Mirror a cell across the vertical axis.
    pub fn flip_horizontal(&self, cell: Cell) -> Cell {
        Cell::new(self.columns - 1 - cell.column, cell.row)
    }

    /// Mirror a wall across the vertical axis.
    pub fn flip_horizontal_wall(&self, wall: Wall) -> Wall {
        Wall::between(
            self.flip_horizontal(wall.cell),
            wall.direction().flip_horizontal(),
        )
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod tests;
