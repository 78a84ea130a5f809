//! Model interface and input-plane encoding.
//!
//! A [`Model`] executes one batch of inference synchronously; the batching
//! layer owns scheduling and runs the call on a blocking thread. The output
//! prior vector is laid out as two wall planes (Right walls then Down
//! walls, cell-indexed) followed by the pawn-move block (four cat
//! directions, then four mouse directions for Standard-capable models).

use wallwars_core::{Board, Cell, Pawn, Player, Turn, TurnAction, Wall, WallKind, DIRECTIONS};

use crate::evaluator::EvaluatorError;

/// Input planes per position, in encoding order: relative distances from the
/// acting player's cat, the opposing cat, the acting player's goal and the
/// opposing goal; blocked right/down wall planes; the player plane (1.0 for
/// Red) and the action-phase plane (1.0 for the second action).
pub const INPUT_CHANNELS: usize = 8;

/// One batch worth of model output.
#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// One value per input, in `[-1, 1]`.
    pub values: Vec<f32>,
    /// `count * prior_size()` raw priors, batch-major.
    pub priors: Vec<f32>,
}

/// A policy/value network operating on encoded board tensors.
pub trait Model: Send + Sync {
    /// Maximum inputs per batch.
    fn batch_size(&self) -> usize;

    fn rows(&self) -> i32;

    fn columns(&self) -> i32;

    /// Pawn-move prior entries: 4 (Classic-only models) or 8.
    fn move_prior_size(&self) -> usize;

    fn state_size(&self) -> usize {
        (self.rows() * self.columns()) as usize * INPUT_CHANNELS
    }

    fn wall_prior_size(&self) -> usize {
        2 * (self.rows() * self.columns()) as usize
    }

    fn prior_size(&self) -> usize {
        self.wall_prior_size() + self.move_prior_size()
    }

    /// Run inference on `count` concatenated inputs. Called from a blocking
    /// thread; implementations may take internal locks.
    fn run_batch(&self, inputs: &[f32], count: usize) -> Result<ModelOutput, EvaluatorError>;
}

/// Flat prior index for a wall.
pub fn wall_prior_index(board: &Board, wall: Wall) -> usize {
    let board_size = (board.columns() * board.rows()) as usize;
    wall.kind as usize * board_size + board.index_from_cell(wall.cell)
}

/// Encode a position into model input planes, appending to `out`.
pub fn encode_board(board: &Board, turn: Turn, out: &mut Vec<f32>) {
    let cell_count = (board.columns() * board.rows()) as usize;
    let blocked = board.blocked_directions();
    let mut queue = Vec::new();

    let me = turn.player;
    let distance_sources = [
        board.position(me),
        board.position(me.other()),
        board.goal(me),
        board.goal(me.other()),
    ];

    for source in distance_sources {
        let start = out.len();
        out.resize(start + cell_count, 1.0);
        board.fill_relative_distances(source, &mut out[start..], &blocked, &mut queue);
    }

    // Wall planes, in the same direction order as the prior layout.
    for direction in [DIRECTIONS[0], DIRECTIONS[1]] {
        for index in 0..cell_count {
            let blocked_here = blocked[index][direction.index()];
            out.push(if blocked_here { 1.0 } else { 0.0 });
        }
    }

    let player_plane = if me == Player::Red { 1.0 } else { 0.0 };
    out.extend(std::iter::repeat(player_plane).take(cell_count));

    let phase_plane = if turn.action == TurnAction::Second {
        1.0
    } else {
        0.0
    };
    out.extend(std::iter::repeat(phase_plane).take(cell_count));
}

/// Flat prior index for a pawn move (offset into the post-wall block).
pub fn pawn_prior_offset(board: &Board, pawn: Pawn) -> usize {
    let base = 2 * (board.columns() * board.rows()) as usize;
    match pawn {
        Pawn::Cat => base,
        Pawn::Mouse => base + 4,
    }
}

/// Uniform-output model for exercising the batching layer without weights.
pub struct UniformModel {
    batch_size: usize,
    rows: i32,
    columns: i32,
    move_prior_size: usize,
}

impl UniformModel {
    pub fn new(batch_size: usize, rows: i32, columns: i32, move_prior_size: usize) -> Self {
        Self {
            batch_size,
            rows,
            columns,
            move_prior_size,
        }
    }
}

impl Model for UniformModel {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn rows(&self) -> i32 {
        self.rows
    }

    fn columns(&self) -> i32 {
        self.columns
    }

    fn move_prior_size(&self) -> usize {
        self.move_prior_size
    }

    fn run_batch(&self, inputs: &[f32], count: usize) -> Result<ModelOutput, EvaluatorError> {
        if inputs.len() != count * self.state_size() {
            return Err(EvaluatorError::InvalidState(format!(
                "expected {} input floats, got {}",
                count * self.state_size(),
                inputs.len()
            )));
        }
        let uniform = 1.0 / self.prior_size() as f32;
        Ok(ModelOutput {
            values: vec![0.0; count],
            priors: vec![uniform; count * self.prior_size()],
        })
    }
}

/// Inverse of [`wall_prior_index`].
pub fn wall_from_prior_index(board: &Board, index: usize) -> Wall {
    let board_size = (board.columns() * board.rows()) as usize;
    let kind = if index < board_size {
        WallKind::Right
    } else {
        WallKind::Down
    };
    let cell_index = index % board_size;
    Wall::new(
        Cell::new(
            cell_index as i32 / board.rows(),
            cell_index as i32 % board.rows(),
        ),
        kind,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallwars_core::{Pawn, Variant, WallKind};

    #[test]
    fn encode_produces_all_planes() {
        let board = Board::new(8, 8, Variant::Classic);
        let turn = Turn::new(Player::Red, TurnAction::First);

        let mut out = Vec::new();
        encode_board(&board, turn, &mut out);
        assert_eq!(out.len(), 64 * INPUT_CHANNELS);

        // Distance plane 0 starts at the red cat: zero at its own cell.
        assert_eq!(out[board.index_from_cell(board.position(Player::Red))], 0.0);

        // Player plane is all ones for Red.
        let player_plane = &out[6 * 64..7 * 64];
        assert!(player_plane.iter().all(|&v| v == 1.0));

        // Phase plane is all zeros for the first action.
        let phase_plane = &out[7 * 64..8 * 64];
        assert!(phase_plane.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn wall_prior_layout_is_kind_major() {
        let board = Board::new(8, 8, Variant::Classic);
        let right = Wall::new(Cell::new(2, 3), WallKind::Right);
        let down = Wall::new(Cell::new(2, 3), WallKind::Down);

        assert_eq!(wall_prior_index(&board, right), board.index_from_cell(right.cell));
        assert_eq!(
            wall_prior_index(&board, down),
            64 + board.index_from_cell(down.cell)
        );
        assert_eq!(wall_from_prior_index(&board, wall_prior_index(&board, down)), down);
        assert_eq!(pawn_prior_offset(&board, Pawn::Cat), 128);
        assert_eq!(pawn_prior_offset(&board, Pawn::Mouse), 132);
    }

    #[test]
    fn uniform_model_shapes() {
        let model = UniformModel::new(8, 8, 8, 8);
        assert_eq!(model.state_size(), 64 * INPUT_CHANNELS);
        assert_eq!(model.prior_size(), 136);

        let inputs = vec![0.0; 2 * model.state_size()];
        let out = model.run_batch(&inputs, 2).unwrap();
        assert_eq!(out.values.len(), 2);
        assert_eq!(out.priors.len(), 2 * 136);
    }
}
