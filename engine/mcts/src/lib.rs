//! Parallel Monte-Carlo tree search for Wallwars.
//!
//! The search stack, bottom up:
//!
//! 1. An [`Evaluator`] turns a position into a value and per-action priors.
//!    [`HeuristicEvaluator`] does this with BFS distances; the
//!    [`BatchedModelEvaluator`] runs a neural network.
//! 2. [`BatchedModel`] coalesces concurrent leaf evaluations into
//!    accelerator-sized batches over a pool of model instances.
//! 3. [`CachedEvaluator`] deduplicates evaluations by position fingerprint,
//!    with at most one computation in flight per key.
//! 4. [`Mcts`] runs PUCT selection with virtual loss, expands leaves via
//!    the evaluator, and keeps its tree across applied moves
//!    (`force_move`) so search work is reused from ply to ply.

pub mod batch;
pub mod cache;
pub mod evaluator;
pub mod heuristic;
pub mod model;
pub mod node;
pub mod search;
pub mod tree;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use batch::{BatchedModel, BatchedModelEvaluator, InferenceResult};
pub use cache::CachedEvaluator;
pub use evaluator::{Evaluation, Evaluator, EvaluatorError};
pub use heuristic::HeuristicEvaluator;
pub use model::{encode_board, Model, ModelOutput, UniformModel, INPUT_CHANNELS};
pub use node::{Node, NodeId, TreeEdge};
pub use search::{Mcts, MctsOptions, SearchError};
pub use tree::Tree;

#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;
