//! Distance-biased heuristic evaluator.
//!
//! Drives the search without a learned model: cat moves are biased toward
//! the goal, mouse moves (Standard only) away from the opposing cat, and
//! walls share whatever prior mass the pawn moves do not claim. The value
//! estimate is the board's distance-ratio score.

use async_trait::async_trait;

use wallwars_core::{Action, Board, Pawn, PawnMove, PreviousPosition, Turn};

use crate::evaluator::{renormalize, Evaluation, Evaluator, EvaluatorError};

pub struct HeuristicEvaluator {
    /// Fraction of total prior mass assigned to pawn moves, in [0, 1].
    move_prior: f32,
    /// Prior for a pawn step that improves its objective.
    good_move_bias: f32,
    /// Prior for a pawn step that worsens its objective.
    bad_move_bias: f32,
}

impl HeuristicEvaluator {
    pub fn new(move_prior: f32, good_move_bias: f32, bad_move_bias: f32) -> Self {
        Self {
            move_prior,
            good_move_bias,
            bad_move_bias,
        }
    }

    fn pawn_edges(
        &self,
        board: &Board,
        turn: Turn,
        previous: Option<PreviousPosition>,
        pawn: Pawn,
        edges: &mut Vec<(Action, f32)>,
    ) {
        let position = board.pawn_position(turn.player, pawn);
        // The cat chases its goal; the mouse flees the opposing cat.
        let target = match pawn {
            Pawn::Cat => board.goal(turn.player),
            Pawn::Mouse => board.position(turn.player.other()),
        };
        let current_dist = board.distance(position, target);

        for direction in board.legal_directions(turn.player, pawn) {
            let next = position.step(direction);
            if previous.is_some_and(|prev| prev.matches(pawn, next)) {
                continue;
            }

            let next_dist = board.distance(next, target);
            let mut prior = 1.0;
            if let (Some(current), Some(next_dist)) = (current_dist, next_dist) {
                let improves = match pawn {
                    Pawn::Cat => next_dist < current,
                    Pawn::Mouse => next_dist > current,
                };
                let worsens = match pawn {
                    Pawn::Cat => next_dist > current,
                    Pawn::Mouse => next_dist < current,
                };
                if improves {
                    prior = self.good_move_bias;
                } else if worsens {
                    prior = self.bad_move_bias;
                }
            }

            if prior > 0.0 {
                edges.push((Action::Pawn(PawnMove { pawn, direction }), prior));
            }
        }
    }
}

#[async_trait]
impl Evaluator for HeuristicEvaluator {
    async fn evaluate(
        &self,
        board: &Board,
        turn: Turn,
        previous: Option<PreviousPosition>,
    ) -> Result<Evaluation, EvaluatorError> {
        let legal_walls = if self.move_prior < 1.0 {
            board.legal_walls()
        } else {
            Vec::new()
        };

        let mut edges = Vec::with_capacity(legal_walls.len() + board.move_prior_size());

        self.pawn_edges(board, turn, previous, Pawn::Cat, &mut edges);
        if board.allows_mouse_moves() {
            self.pawn_edges(board, turn, previous, Pawn::Mouse, &mut edges);
        }

        // Scale pawn-move mass to `move_prior`, then split the remainder
        // evenly among the walls.
        let pawn_total: f32 = edges.iter().map(|(_, prior)| prior).sum();
        if pawn_total > 0.0 {
            for (_, prior) in edges.iter_mut() {
                *prior *= self.move_prior / pawn_total;
            }
        }

        if !legal_walls.is_empty() {
            let wall_prior = (1.0 - self.move_prior) / legal_walls.len() as f32;
            edges.extend(legal_walls.into_iter().map(|w| (Action::Wall(w), wall_prior)));
        }

        renormalize(&mut edges);

        Ok(Evaluation {
            value: board.score_for(turn.player),
            edges,
        })
    }
}
