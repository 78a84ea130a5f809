//! Batched inference layer.
//!
//! MCTS emits many single-position evaluations per millisecond; accelerator
//! throughput is dominated by batch size. This layer coalesces the request
//! stream into batches of up to `Model::batch_size` inputs, runs each batch
//! on one of the pre-warmed model instances, and routes per-request results
//! back to their waiters.
//!
//! Backpressure: the request queue is bounded, so producers suspend in
//! `send` while it is full. The coordinator dispatches a batch as soon as
//! it is full or the queue is momentarily empty; it never waits for
//! stragglers. Dropping a requester abandons only its result slot; the
//! batch itself always completes.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use wallwars_core::{Action, Board, Pawn, PawnMove, PreviousPosition, Turn};

use crate::evaluator::{renormalize, Evaluation, Evaluator, EvaluatorError};
use crate::model::{encode_board, pawn_prior_offset, wall_prior_index, Model};

/// Per-request inference output.
#[derive(Debug, Clone)]
pub struct InferenceResult {
    pub value: f32,
    pub priors: Vec<f32>,
}

struct InferenceRequest {
    input: Vec<f32>,
    reply: oneshot::Sender<Result<InferenceResult, EvaluatorError>>,
}

/// Coalesces single-position inference requests into model-sized batches.
pub struct BatchedModel {
    queue: mpsc::Sender<InferenceRequest>,
    state_size: usize,
    move_prior_size: usize,
    rows: i32,
    columns: i32,
}

impl BatchedModel {
    /// Spawn the coordinator over a set of interchangeable model instances.
    /// All instances must share the same dimensions.
    pub fn new(models: Vec<Arc<dyn Model>>, queue_capacity: usize) -> Arc<BatchedModel> {
        assert!(!models.is_empty(), "need at least one model instance");

        let first = &models[0];
        let state_size = first.state_size();
        let move_prior_size = first.move_prior_size();
        let rows = first.rows();
        let columns = first.columns();
        let batch_size = first.batch_size();

        let (queue_tx, queue_rx) = mpsc::channel(queue_capacity);

        // Idle pool: instances cycle through this channel; holding one means
        // exclusive use for one batch.
        let (idle_tx, idle_rx) = mpsc::channel(models.len());
        for model in models {
            idle_tx
                .try_send(model)
                .unwrap_or_else(|_| unreachable!("idle pool sized to instance count"));
        }

        tokio::spawn(coordinate(queue_rx, idle_tx, idle_rx, batch_size));

        Arc::new(BatchedModel {
            queue: queue_tx,
            state_size,
            move_prior_size,
            rows,
            columns,
        })
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn move_prior_size(&self) -> usize {
        self.move_prior_size
    }

    /// Submit one encoded position; resolves when its batch has run.
    pub async fn inference(&self, input: Vec<f32>) -> Result<InferenceResult, EvaluatorError> {
        if input.len() != self.state_size {
            return Err(EvaluatorError::InvalidState(format!(
                "input has {} floats, model expects {}",
                input.len(),
                self.state_size
            )));
        }

        let (reply, response) = oneshot::channel();
        self.queue
            .send(InferenceRequest { input, reply })
            .await
            .map_err(|_| EvaluatorError::EvaluationFailed("inference queue closed".into()))?;

        response
            .await
            .map_err(|_| EvaluatorError::EvaluationFailed("inference batch dropped".into()))?
    }
}

async fn coordinate(
    mut queue: mpsc::Receiver<InferenceRequest>,
    idle_tx: mpsc::Sender<Arc<dyn Model>>,
    mut idle_rx: mpsc::Receiver<Arc<dyn Model>>,
    batch_size: usize,
) {
    while let Some(first) = queue.recv().await {
        let mut batch = vec![first];
        // Fill up from whatever is already queued; a partial batch is fine.
        while batch.len() < batch_size {
            match queue.try_recv() {
                Ok(request) => batch.push(request),
                Err(_) => break,
            }
        }

        let Some(model) = idle_rx.recv().await else {
            break;
        };

        debug!(batch_len = batch.len(), "dispatching inference batch");
        tokio::spawn(run_batch(model, batch, idle_tx.clone()));
    }
}

async fn run_batch(
    model: Arc<dyn Model>,
    batch: Vec<InferenceRequest>,
    idle: mpsc::Sender<Arc<dyn Model>>,
) {
    let count = batch.len();
    let mut inputs = Vec::with_capacity(count * model.state_size());
    for request in &batch {
        inputs.extend_from_slice(&request.input);
    }

    let compute_model = Arc::clone(&model);
    let result =
        tokio::task::spawn_blocking(move || compute_model.run_batch(&inputs, count)).await;

    match result {
        Ok(Ok(output)) => {
            let prior_size = model.prior_size();
            for (index, request) in batch.into_iter().enumerate() {
                let priors = output.priors[index * prior_size..(index + 1) * prior_size].to_vec();
                // A dropped requester just loses its slot.
                let _ = request.reply.send(Ok(InferenceResult {
                    value: output.values[index],
                    priors,
                }));
            }
        }
        Ok(Err(error)) => {
            for request in batch {
                let _ = request.reply.send(Err(error.clone()));
            }
        }
        Err(join_error) => {
            let error =
                EvaluatorError::EvaluationFailed(format!("batch task failed: {join_error}"));
            for request in batch {
                let _ = request.reply.send(Err(error.clone()));
            }
        }
    }

    let _ = idle.send(model).await;
}

/// Evaluator over a batched model: encodes the position, awaits inference,
/// and assembles priors for the legal, non-backtrack actions.
pub struct BatchedModelEvaluator {
    model: Arc<BatchedModel>,
}

impl BatchedModelEvaluator {
    pub fn new(model: Arc<BatchedModel>) -> Self {
        Self { model }
    }
}

#[async_trait::async_trait]
impl Evaluator for BatchedModelEvaluator {
    async fn evaluate(
        &self,
        board: &Board,
        turn: Turn,
        previous: Option<PreviousPosition>,
    ) -> Result<Evaluation, EvaluatorError> {
        if self.model.move_prior_size() < board.move_prior_size() {
            return Err(EvaluatorError::ModelError(
                "model does not provide the pawn-move priors this variant requires".into(),
            ));
        }

        let mut input = Vec::with_capacity(self.model.state_size);
        encode_board(board, turn, &mut input);
        let inference = self.model.inference(input).await?;

        let mut edges = Vec::new();

        let mut add_pawn_moves = |pawn: Pawn| {
            let position = board.pawn_position(turn.player, pawn);
            let offset = pawn_prior_offset(board, pawn);
            for direction in board.legal_directions(turn.player, pawn) {
                let next = position.step(direction);
                if previous.is_some_and(|prev| prev.matches(pawn, next)) {
                    continue;
                }
                edges.push((
                    Action::Pawn(PawnMove { pawn, direction }),
                    inference.priors[offset + direction.index()],
                ));
            }
        };

        add_pawn_moves(Pawn::Cat);
        if board.allows_mouse_moves() {
            add_pawn_moves(Pawn::Mouse);
        }

        for wall in board.legal_walls() {
            edges.push((
                Action::Wall(wall),
                inference.priors[wall_prior_index(board, wall)],
            ));
        }

        // Renormalize away the mass the raw output puts on illegal actions.
        renormalize(&mut edges);

        Ok(Evaluation {
            value: inference.value,
            edges,
        })
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
