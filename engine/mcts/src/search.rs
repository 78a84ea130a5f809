//! Parallel PUCT search with virtual loss and tree reuse.
//!
//! The tree lives behind a mutex; selection (which also reserves the path
//! with virtual loss) and backpropagation are short locked sections, while
//! leaf evaluation awaits outside the lock. Up to `max_parallelism` samples
//! are in flight per search; virtual loss makes the concurrent selectors
//! diverge instead of piling onto one leaf.

use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Gamma};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::trace;

use wallwars_core::{
    Action, Board, BoardError, Move, Player, PreviousPosition, Turn, TurnAction, Winner,
};

use crate::evaluator::{Evaluator, EvaluatorError};
use crate::node::{Node, NodeId, TreeEdge};
use crate::tree::Tree;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),

    #[error("action {action} is not legal from the current position")]
    IllegalMove { action: String },

    #[error("sample task failed: {0}")]
    Task(String),
}

/// Search configuration.
#[derive(Debug, Clone, Copy)]
pub struct MctsOptions {
    pub starting_turn: Turn,
    /// Seeds the per-search RNG (root Dirichlet noise).
    pub seed: u64,
    /// Concurrent samples per search.
    pub max_parallelism: usize,
    pub c_puct: f32,
    /// Root Dirichlet noise; `dirichlet_epsilon == 0` (the default) keeps
    /// the search fully deterministic.
    pub dirichlet_alpha: f32,
    pub dirichlet_epsilon: f32,
}

impl Default for MctsOptions {
    fn default() -> Self {
        Self {
            starting_turn: Turn::new(Player::Red, TurnAction::First),
            seed: 42,
            max_parallelism: 4,
            c_puct: 1.25,
            dirichlet_alpha: 0.3,
            dirichlet_epsilon: 0.0,
        }
    }
}

/// Monte-Carlo tree search over one game.
///
/// The tree persists across moves: `force_move` advances the root along the
/// played move and keeps the explored subtree, so search work done while
/// evaluating one position carries over to the next ply.
pub struct Mcts {
    tree: Arc<Mutex<Tree>>,
    evaluator: Arc<dyn Evaluator>,
    options: MctsOptions,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

/// A leaf reserved for evaluation: virtual loss is already applied along
/// `path`.
struct PendingLeaf {
    id: NodeId,
    board: Board,
    turn: Turn,
    previous: Option<PreviousPosition>,
}

impl Mcts {
    pub fn new(evaluator: Arc<dyn Evaluator>, board: Board, options: MctsOptions) -> Mcts {
        let root = Node::new(board, options.starting_turn, None);
        Mcts {
            tree: Arc::new(Mutex::new(Tree::new(root))),
            evaluator,
            options,
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(options.seed))),
        }
    }

    /// Run `count` samples, keeping up to `max_parallelism` in flight.
    pub async fn sample(&self, count: u32) -> Result<(), SearchError> {
        let mut tasks: JoinSet<Result<(), SearchError>> = JoinSet::new();
        let parallelism = self.options.max_parallelism.max(1);
        let mut launched = 0u32;
        let mut completed = 0u32;

        while completed < count {
            while tasks.len() < parallelism && launched < count {
                let context = SampleContext {
                    tree: Arc::clone(&self.tree),
                    evaluator: Arc::clone(&self.evaluator),
                    rng: Arc::clone(&self.rng),
                    options: self.options,
                };
                tasks.spawn(async move { context.run_sample().await });
                launched += 1;
            }

            match tasks.join_next().await {
                Some(joined) => {
                    joined.map_err(|e| SearchError::Task(e.to_string()))??;
                    completed += 1;
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Mean root value in `[-1, 1]`, from the perspective of the player to
    /// move at the root.
    pub fn root_value(&self) -> f32 {
        let tree = self.tree.lock().unwrap();
        let root = tree.get(tree.root());
        root.mean_value()
    }

    /// Samples backpropagated through the current root.
    pub fn root_samples(&self) -> u32 {
        let tree = self.tree.lock().unwrap();
        tree.get(tree.root()).samples
    }

    /// Snapshot of the board at the current root.
    pub fn current_board(&self) -> Board {
        let tree = self.tree.lock().unwrap();
        tree.get(tree.root()).board.clone()
    }

    pub fn current_turn(&self) -> Turn {
        let tree = self.tree.lock().unwrap();
        tree.get(tree.root()).turn
    }

    /// Most-visited explored root action, without mutating the tree.
    pub fn peek_best_action(&self) -> Option<Action> {
        let tree = self.tree.lock().unwrap();
        let root = tree.get(tree.root());
        root.best_explored_edge().map(|i| root.edges[i].action)
    }

    /// Best full ply: the best root action followed by the best action of
    /// its child. When the child is terminal or unexplored, the second
    /// action falls back to the first legal wall (or any legal action), the
    /// way a won game still needs a complete ply on the wire.
    pub fn peek_best_move(&self) -> Option<Move> {
        let tree = self.tree.lock().unwrap();
        let root = tree.get(tree.root());

        let edge = &root.edges[root.best_explored_edge()?];
        let first = edge.action;
        let child = tree.get(edge.child?);

        let second = child
            .best_explored_edge()
            .map(|i| child.edges[i].action)
            .or_else(|| fallback_action(&child.board, child.turn))?;

        Some(Move { first, second })
    }

    /// Permanently advance the root to the best explored child, discarding
    /// every sibling subtree. Returns the committed action.
    pub fn commit_to_action(&self) -> Option<Action> {
        let mut tree = self.tree.lock().unwrap();
        let root = tree.get(tree.root());

        let edge = &root.edges[root.best_explored_edge()?];
        let action = edge.action;
        let child = edge.child.expect("explored edge always has a child");
        tree.reroot(child);
        Some(action)
    }

    /// Advance the root along a played move, preserving the explored
    /// subtree when the move was already in the tree. Errors if either
    /// action is illegal from the current position.
    pub fn force_move(&self, mv: Move) -> Result<(), SearchError> {
        for action in [mv.first, mv.second] {
            self.force_action(action)?;
        }
        Ok(())
    }

    fn force_action(&self, action: Action) -> Result<(), SearchError> {
        let mut tree = self.tree.lock().unwrap();
        let root_id = tree.root();
        let root = tree.get(root_id);
        let player = root.turn.player;

        let legal = match action {
            Action::Pawn(mv) => root
                .board
                .legal_directions(player, mv.pawn)
                .contains(&mv.direction),
            Action::Wall(wall) => root.board.legal_walls().contains(&wall),
        };
        if !legal {
            return Err(SearchError::IllegalMove {
                action: action.to_string(),
            });
        }

        let existing = root
            .edges
            .iter()
            .find(|edge| edge.action == action)
            .and_then(|edge| edge.child);

        match existing {
            Some(child) => tree.reroot(child),
            None => {
                // Unexplored (or evaluator-suppressed backtrack): start a
                // fresh subtree at the resulting position.
                let previous = previous_position(&root.board, player, action);
                let mut board = root.board.clone();
                let turn = root.turn;
                board.do_action(player, action)?;
                *tree = Tree::new(Node::new(board, turn.next(), previous));
            }
        }
        Ok(())
    }
}

/// The vacated cell a pawn action leaves behind (computed before applying).
fn previous_position(board: &Board, player: Player, action: Action) -> Option<PreviousPosition> {
    match action {
        Action::Pawn(mv) => Some(PreviousPosition {
            pawn: mv.pawn,
            cell: board.pawn_position(player, mv.pawn),
        }),
        Action::Wall(_) => None,
    }
}

/// Second-action fallback when the search has nothing explored below the
/// chosen child: prefer a wall, else any legal action.
fn fallback_action(board: &Board, turn: Turn) -> Option<Action> {
    if let Some(wall) = board.legal_walls().into_iter().next() {
        return Some(Action::Wall(wall));
    }
    board.legal_actions(turn.player).into_iter().next()
}

/// Everything one sampling task needs, cloneable into the task.
struct SampleContext {
    tree: Arc<Mutex<Tree>>,
    evaluator: Arc<dyn Evaluator>,
    rng: Arc<Mutex<ChaCha8Rng>>,
    options: MctsOptions,
}

impl SampleContext {
    async fn run_sample(&self) -> Result<(), SearchError> {
        let reserved = {
            let mut tree = self.tree.lock().unwrap();
            self.select_and_reserve(&mut tree)?
        };

        let Some((path, leaf)) = reserved else {
            // Terminal sample: already backpropagated under the lock.
            return Ok(());
        };

        // Evaluate outside the lock; this is the suspension point where
        // batched inference coalesces concurrent leaves.
        let evaluation = self
            .evaluator
            .evaluate(&leaf.board, leaf.turn, leaf.previous)
            .await;

        let mut tree = self.tree.lock().unwrap();
        match evaluation {
            Ok(evaluation) => {
                let value = evaluation.value.clamp(-1.0, 1.0);
                let is_root = leaf.id == tree.root();

                let newly_expanded = {
                    let node = tree.get_mut(leaf.id);
                    if node.expanded {
                        // A concurrent sample expanded this node while we
                        // awaited; its edges win and our value still counts.
                        false
                    } else {
                        node.expanded = true;
                        node.edges = evaluation
                            .edges
                            .into_iter()
                            .map(|(action, prior)| TreeEdge::new(action, prior))
                            .collect();
                        true
                    }
                };

                if newly_expanded && is_root && self.options.dirichlet_epsilon > 0.0 {
                    let mut rng = self.rng.lock().unwrap();
                    apply_dirichlet_noise(
                        &mut tree.get_mut(leaf.id).edges,
                        self.options.dirichlet_alpha,
                        self.options.dirichlet_epsilon,
                        &mut rng,
                    );
                }

                backpropagate(&mut tree, &path, leaf.id, value);
                Ok(())
            }
            Err(error) => {
                revert_virtual_loss(&mut tree, &path);
                Err(error.into())
            }
        }
    }

    /// Descend from the root to a leaf, applying virtual loss along the
    /// way. Terminal leaves (and expanded dead ends) are scored and
    /// backpropagated immediately; unexpanded leaves are returned for
    /// evaluation.
    fn select_and_reserve(
        &self,
        tree: &mut Tree,
    ) -> Result<Option<(Vec<(NodeId, usize)>, PendingLeaf)>, SearchError> {
        let mut path: Vec<(NodeId, usize)> = Vec::new();
        let mut node_id = tree.root();

        loop {
            let node = tree.get(node_id);

            if node.board.winner() != Winner::Undecided
                || (node.expanded && node.edges.is_empty())
            {
                let value = node.board.score_for(node.turn.player);
                backpropagate(tree, &path, node_id, value);
                return Ok(None);
            }

            if !node.expanded {
                let leaf = PendingLeaf {
                    id: node_id,
                    board: node.board.clone(),
                    turn: node.turn,
                    previous: node.previous,
                };
                return Ok(Some((path, leaf)));
            }

            let edge_index = node
                .select_edge(self.options.c_puct)
                .expect("expanded node with edges");

            let child_id = match tree.get(node_id).edges[edge_index].child {
                Some(child) => child,
                None => {
                    let parent = tree.get(node_id);
                    let action = parent.edges[edge_index].action;
                    let player = parent.turn.player;
                    let next_turn = parent.turn.next();
                    let previous = previous_position(&parent.board, player, action);
                    let mut board = parent.board.clone();
                    board.do_action(player, action)?;

                    let child = tree.allocate(Node::new(board, next_turn, previous));
                    tree.get_mut(node_id).edges[edge_index].child = Some(child);
                    child
                }
            };

            tree.get_mut(node_id).edges[edge_index].virtual_loss += 1;
            path.push((node_id, edge_index));
            node_id = child_id;
        }
    }
}

/// Add a sample along `path`: each edge gains a visit and sheds one virtual
/// loss; each node accumulates the leaf value expressed in its own player's
/// perspective (the sign flips exactly when the acting player changes).
fn backpropagate(tree: &mut Tree, path: &[(NodeId, usize)], leaf: NodeId, value: f32) {
    let leaf_player = tree.get(leaf).turn.player;

    let leaf_node = tree.get_mut(leaf);
    leaf_node.samples += 1;
    leaf_node.value_sum += value;

    for &(node_id, edge_index) in path.iter().rev() {
        let node = tree.get_mut(node_id);
        let signed = if node.turn.player == leaf_player {
            value
        } else {
            -value
        };
        node.samples += 1;
        node.value_sum += signed;

        let edge = &mut node.edges[edge_index];
        edge.visits += 1;
        edge.value_sum += signed;
        edge.virtual_loss = edge.virtual_loss.saturating_sub(1);
    }

    trace!(depth = path.len(), value, "sample backpropagated");
}

/// Roll back the reservation of an abandoned sample.
fn revert_virtual_loss(tree: &mut Tree, path: &[(NodeId, usize)]) {
    for &(node_id, edge_index) in path {
        let edge = &mut tree.get_mut(node_id).edges[edge_index];
        edge.virtual_loss = edge.virtual_loss.saturating_sub(1);
    }
}

/// Mix Dirichlet noise into root priors. Only active when
/// `dirichlet_epsilon > 0`.
fn apply_dirichlet_noise(
    edges: &mut [TreeEdge],
    alpha: f32,
    epsilon: f32,
    rng: &mut ChaCha8Rng,
) {
    if edges.is_empty() || alpha <= 0.0 || !alpha.is_finite() {
        return;
    }

    let gamma = Gamma::new(alpha as f64, 1.0).expect("alpha is positive and finite");
    let mut noise: Vec<f32> = (0..edges.len())
        .map(|_| gamma.sample(rng) as f32)
        .collect();
    let sum: f32 = noise.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        return;
    }
    for sample in &mut noise {
        *sample /= sum;
    }

    for (edge, noise) in edges.iter_mut().zip(noise) {
        edge.prior = (1.0 - epsilon) * edge.prior + epsilon * noise;
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
