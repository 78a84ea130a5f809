//! Fingerprint-keyed evaluation cache.
//!
//! Wraps any evaluator with a bounded cache keyed by a stable hash of
//! `(board, turn, previous position)`. Eviction is FIFO in insertion order;
//! position evaluations have high temporal locality within one search
//! burst and little reuse across bursts, so recency tracking buys little.
//!
//! At-most-one-inflight: when several searchers request the same missing
//! key concurrently, exactly one underlying evaluation runs; the rest
//! subscribe to its result. The computation runs on a detached task, so a
//! caller abandoning its future can never strand the other subscribers.
//! Errors propagate to every subscriber.

use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use wallwars_core::{Board, PreviousPosition, Turn};

use crate::evaluator::{Evaluation, Evaluator, EvaluatorError};

type Key = u64;
type Delivery = Result<Evaluation, EvaluatorError>;

/// Stable fingerprint of an evaluation request.
fn fingerprint(board: &Board, turn: Turn, previous: Option<PreviousPosition>) -> Key {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    board.hash(&mut hasher);
    turn.hash(&mut hasher);
    previous.hash(&mut hasher);
    hasher.finish()
}

struct CacheState {
    entries: HashMap<Key, Evaluation>,
    order: VecDeque<Key>,
    inflight: HashMap<Key, broadcast::Sender<Delivery>>,
}

impl CacheState {
    fn insert(&mut self, capacity: usize, key: Key, evaluation: Evaluation) {
        if self.entries.contains_key(&key) {
            return;
        }
        if self.entries.len() >= capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(key, evaluation);
        self.order.push_back(key);
    }
}

/// Bounded evaluation cache with inflight deduplication.
pub struct CachedEvaluator<E> {
    inner: Arc<E>,
    state: Arc<Mutex<CacheState>>,
    capacity: usize,
}

impl<E: Evaluator + 'static> CachedEvaluator<E> {
    /// Capacity is fixed at construction; at least one entry is kept.
    pub fn new(inner: E, capacity: usize) -> Self {
        Self {
            inner: Arc::new(inner),
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
                inflight: HashMap::new(),
            })),
            capacity: capacity.max(1),
        }
    }

    /// Number of cached evaluations.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<E: Evaluator + 'static> Evaluator for CachedEvaluator<E> {
    async fn evaluate(
        &self,
        board: &Board,
        turn: Turn,
        previous: Option<PreviousPosition>,
    ) -> Result<Evaluation, EvaluatorError> {
        let key = fingerprint(board, turn, previous);

        let mut receiver = {
            let mut state = self.state.lock().unwrap();

            if let Some(hit) = state.entries.get(&key) {
                trace!(key, "evaluation cache hit");
                return Ok(hit.clone());
            }

            if let Some(sender) = state.inflight.get(&key) {
                // Join the computation already in flight for this key.
                sender.subscribe()
            } else {
                let (sender, receiver) = broadcast::channel(1);
                state.inflight.insert(key, sender.clone());

                let inner = Arc::clone(&self.inner);
                let shared = Arc::clone(&self.state);
                let capacity = self.capacity;
                let board = board.clone();
                tokio::spawn(async move {
                    let result = inner.evaluate(&board, turn, previous).await;
                    {
                        let mut state = shared.lock().unwrap();
                        state.inflight.remove(&key);
                        if let Ok(evaluation) = &result {
                            state.insert(capacity, key, evaluation.clone());
                        }
                    }
                    // Receivers may all be gone when every requester was
                    // cancelled; the cache entry above still counts.
                    let _ = sender.send(result);
                });

                receiver
            }
        };

        match receiver.recv().await {
            Ok(result) => result,
            Err(_) => Err(EvaluatorError::EvaluationFailed(
                "inflight evaluation was dropped".into(),
            )),
        }
    }
}
