//! Position evaluator interface.
//!
//! An evaluator maps `(board, turn, previous position)` to a value estimate
//! and priors over the legal actions. The neural-network stack, the
//! heuristic evaluator and the caching wrapper all implement this trait;
//! the search only ever sees the trait object.

use async_trait::async_trait;
use thiserror::Error;

use wallwars_core::{Action, Board, PreviousPosition, Turn};

/// Errors from position evaluation. Clonable so a cached evaluator can
/// deliver one failure to every subscribed waiter.
#[derive(Debug, Clone, Error)]
pub enum EvaluatorError {
    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("model error: {0}")]
    ModelError(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Result of evaluating a position.
///
/// `value` is in `[-1, 1]` from the perspective of the player to move.
/// `edges` cover every legal action except the backtrack (moving the same
/// pawn straight back onto its just-vacated cell); priors sum to 1 across
/// the emitted edges.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub value: f32,
    pub edges: Vec<(Action, f32)>,
}

/// Asynchronous position evaluator.
///
/// Implementations may suspend (the batched model waits for queue space and
/// for its batch to run). Abandoning the returned future must not corrupt
/// shared state; in-flight batched work completes and its result is
/// discarded.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        board: &Board,
        turn: Turn,
        previous: Option<PreviousPosition>,
    ) -> Result<Evaluation, EvaluatorError>;
}

/// Renormalize edge priors in place so they sum to 1. Falls back to a
/// uniform distribution when the total mass is not positive (for instance
/// when the raw model assigns all its mass to illegal actions).
pub(crate) fn renormalize(edges: &mut [(Action, f32)]) {
    let total: f32 = edges.iter().map(|(_, prior)| prior).sum();
    if total > 0.0 && total.is_finite() {
        for (_, prior) in edges.iter_mut() {
            *prior /= total;
        }
    } else if !edges.is_empty() {
        let uniform = 1.0 / edges.len() as f32;
        for (_, prior) in edges.iter_mut() {
            *prior = uniform;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallwars_core::{Direction, Pawn, PawnMove};

    fn pawn_edge(direction: Direction, prior: f32) -> (Action, f32) {
        (
            Action::Pawn(PawnMove {
                pawn: Pawn::Cat,
                direction,
            }),
            prior,
        )
    }

    #[test]
    fn renormalize_scales_to_unit_sum() {
        let mut edges = vec![
            pawn_edge(Direction::Right, 2.0),
            pawn_edge(Direction::Down, 6.0),
        ];
        renormalize(&mut edges);
        assert!((edges[0].1 - 0.25).abs() < 1e-6);
        assert!((edges[1].1 - 0.75).abs() < 1e-6);
    }

    #[test]
    fn renormalize_falls_back_to_uniform() {
        let mut edges = vec![
            pawn_edge(Direction::Right, 0.0),
            pawn_edge(Direction::Down, 0.0),
        ];
        renormalize(&mut edges);
        assert!((edges[0].1 - 0.5).abs() < 1e-6);
        assert!((edges[1].1 - 0.5).abs() < 1e-6);
    }
}
