//! Bot game sessions and request handling.
//!
//! A session owns a persistent MCTS whose tree is reused across moves: the
//! current ply and the search state advance together under the session's
//! mutex, so an `apply_move` issued after an `evaluate_position` always
//! observes the evaluated state. The session map itself sits behind a
//! reader/writer lock; lookups are common, inserts rare.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use wallwars_core::padding::transform_move_notation;
use wallwars_core::{PaddingConfig, Player, Turn, TurnAction};
use wallwars_mcts::{Evaluator, Mcts, MctsOptions};

use crate::adapter::{self, AdapterError, BgsConfig};
use crate::protocol::{Request, Response};

/// Engine-wide configuration for all sessions.
#[derive(Debug, Clone, Copy)]
pub struct BgsEngineConfig {
    /// MCTS samples per `evaluate_position`.
    pub samples_per_move: u32,
    /// Concurrent samples within a single MCTS.
    pub max_parallel_samples: usize,
    /// Base seed combined with each session id.
    pub base_seed: u64,
    pub model_rows: i32,
    pub model_columns: i32,
}

impl Default for BgsEngineConfig {
    fn default() -> Self {
        Self {
            samples_per_move: 1000,
            max_parallel_samples: 4,
            base_seed: 42,
            model_rows: 8,
            model_columns: 8,
        }
    }
}

/// Hard cap on simultaneously active sessions.
pub const MAX_SESSIONS: usize = 256;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session {0} already exists")]
    AlreadyExists(String),

    #[error("Session {0} not found")]
    NotFound(String),

    #[error("Maximum session limit reached ({MAX_SESSIONS})")]
    LimitReached,

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Mutable per-session state, guarded by the session mutex.
struct SessionState {
    mcts: Mcts,
    /// 0 = initial position; increments after each applied move.
    ply: u32,
}

/// One bot game session.
pub struct BgsSession {
    bgs_id: String,
    padding: PaddingConfig,
    state: Mutex<SessionState>,
}

impl BgsSession {
    pub fn bgs_id(&self) -> &str {
        &self.bgs_id
    }

    /// Current ply (requires the session lock).
    pub async fn ply(&self) -> u32 {
        self.state.lock().await.ply
    }

    /// Samples currently accumulated at the search root.
    pub async fn root_samples(&self) -> u32 {
        self.state.lock().await.mcts.root_samples()
    }
}

/// Owns all active sessions and the shared evaluator.
pub struct SessionManager {
    evaluator: Arc<dyn Evaluator>,
    config: BgsEngineConfig,
    sessions: RwLock<HashMap<String, Arc<BgsSession>>>,
}

/// FNV-1a, for stable per-session seeds.
fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Player 1 (Red) acts on even plies.
fn player_for_ply(ply: u32) -> Player {
    if ply % 2 == 0 {
        Player::Red
    } else {
        Player::Blue
    }
}

impl SessionManager {
    pub fn new(evaluator: Arc<dyn Evaluator>, config: BgsEngineConfig) -> SessionManager {
        SessionManager {
            evaluator,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn seed_for(&self, bgs_id: &str) -> u64 {
        fnv1a(bgs_id) ^ self.config.base_seed
    }

    /// Create a session from a validated config.
    pub fn create_session(
        &self,
        bgs_id: &str,
        bot_id: &str,
        config: &BgsConfig,
    ) -> Result<(), SessionError> {
        let (board, turn, padding) = adapter::convert_bgs_config_to_board(
            config,
            self.config.model_rows,
            self.config.model_columns,
        )?;

        let mut sessions = self.sessions.write().unwrap();
        if sessions.contains_key(bgs_id) {
            return Err(SessionError::AlreadyExists(bgs_id.to_string()));
        }
        if sessions.len() >= MAX_SESSIONS {
            return Err(SessionError::LimitReached);
        }

        let options = MctsOptions {
            starting_turn: turn,
            seed: self.seed_for(bgs_id),
            max_parallelism: self.config.max_parallel_samples,
            ..MctsOptions::default()
        };
        let mcts = Mcts::new(Arc::clone(&self.evaluator), board, options);

        sessions.insert(
            bgs_id.to_string(),
            Arc::new(BgsSession {
                bgs_id: bgs_id.to_string(),
                padding,
                state: Mutex::new(SessionState { mcts, ply: 0 }),
            }),
        );

        info!(bgs_id, bot_id, "created BGS session");
        Ok(())
    }

    pub fn end_session(&self, bgs_id: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().unwrap();
        if sessions.remove(bgs_id).is_none() {
            return Err(SessionError::NotFound(bgs_id.to_string()));
        }
        info!(bgs_id, "ended BGS session");
        Ok(())
    }

    pub fn get_session(&self, bgs_id: &str) -> Option<Arc<BgsSession>> {
        self.sessions.read().unwrap().get(bgs_id).cloned()
    }

    pub fn has_session(&self, bgs_id: &str) -> bool {
        self.sessions.read().unwrap().contains_key(bgs_id)
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }
}

// ============================================================================
// Request handlers
// ============================================================================

pub async fn handle_start_game_session(
    manager: &SessionManager,
    bgs_id: &str,
    bot_id: &str,
    config: &BgsConfig,
) -> Response {
    match manager.create_session(bgs_id, bot_id, config) {
        Ok(()) => Response::session_started(bgs_id),
        Err(error) => Response::session_start_failed(bgs_id, error.to_string()),
    }
}

pub async fn handle_end_game_session(manager: &SessionManager, bgs_id: &str) -> Response {
    match manager.end_session(bgs_id) {
        Ok(()) => Response::session_ended(bgs_id),
        Err(error) => Response::session_end_failed(bgs_id, error.to_string()),
    }
}

pub async fn handle_evaluate_position(
    manager: &SessionManager,
    bgs_id: &str,
    expected_ply: u32,
) -> Response {
    let Some(session) = manager.get_session(bgs_id) else {
        return Response::evaluate_failed(bgs_id, expected_ply, "Session not found");
    };

    // Hold the session for the whole evaluation; requests within one BGS
    // are strictly serialized.
    let state = session.state.lock().await;

    if state.ply != expected_ply {
        return Response::evaluate_failed(
            bgs_id,
            state.ply,
            format!("Ply mismatch: expected {expected_ply}, got {}", state.ply),
        );
    }

    if let Err(error) = state.mcts.sample(manager.config.samples_per_move).await {
        return Response::evaluate_failed(bgs_id, state.ply, error.to_string());
    }

    // Capture the evaluation before peeking: root_value is from the current
    // player's perspective and must reflect the unadvanced root.
    let raw_evaluation = state.mcts.root_value();

    let Some(best_move) = state.mcts.peek_best_move() else {
        return Response::evaluate_failed(bgs_id, state.ply, "No legal move available");
    };

    let current_player = player_for_ply(state.ply);
    let board = state.mcts.current_board();

    let model_notation = match best_move.standard_notation(
        board.position(current_player),
        board.mouse(current_player),
        board.rows(),
    ) {
        Ok(notation) => notation,
        Err(error) => return Response::evaluate_failed(bgs_id, state.ply, error.to_string()),
    };
    let game_notation = match transform_move_notation(&model_notation, &session.padding) {
        Ok(notation) => notation,
        Err(error) => return Response::evaluate_failed(bgs_id, state.ply, error.to_string()),
    };

    // The wire evaluation is from player 1's perspective.
    let evaluation = match current_player {
        Player::Red => raw_evaluation,
        Player::Blue => -raw_evaluation,
    }
    .clamp(-1.0, 1.0);

    debug!(
        bgs_id,
        ply = state.ply,
        best_move = %game_notation,
        evaluation,
        "evaluated position"
    );

    Response::evaluated(bgs_id, state.ply, game_notation, evaluation)
}

pub async fn handle_apply_move(
    manager: &SessionManager,
    bgs_id: &str,
    expected_ply: u32,
    notation: &str,
) -> Response {
    let Some(session) = manager.get_session(bgs_id) else {
        return Response::move_failed(bgs_id, expected_ply, "Session not found");
    };

    let mut state = session.state.lock().await;

    if state.ply != expected_ply {
        return Response::move_failed(
            bgs_id,
            state.ply,
            format!("Ply mismatch: expected {expected_ply}, got {}", state.ply),
        );
    }

    let turn = Turn::new(player_for_ply(state.ply), TurnAction::First);
    let board = state.mcts.current_board();

    let mv = match adapter::parse_move_notation(notation, &board, turn, &session.padding) {
        Ok(mv) => mv,
        Err(error) => {
            warn!(bgs_id, notation, %error, "rejected move");
            return Response::move_failed(
                bgs_id,
                state.ply,
                format!("Failed to parse move notation: {error}"),
            );
        }
    };

    if let Err(error) = state.mcts.force_move(mv) {
        return Response::move_failed(
            bgs_id,
            state.ply,
            format!("Failed to apply move: {error}"),
        );
    }

    state.ply += 1;
    debug!(bgs_id, notation, ply = state.ply, "applied move");
    Response::move_applied(bgs_id, state.ply)
}

/// Route one parsed JSON line to its handler. Unknown or malformed requests
/// get the generic `error` response.
pub async fn handle_request(manager: &SessionManager, line: serde_json::Value) -> Response {
    let bgs_id = line
        .get("bgsId")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    match serde_json::from_value::<Request>(line) {
        Ok(Request::StartGameSession {
            bgs_id,
            bot_id,
            config,
        }) => handle_start_game_session(manager, &bgs_id, &bot_id, &config).await,
        Ok(Request::EndGameSession { bgs_id }) => handle_end_game_session(manager, &bgs_id).await,
        Ok(Request::EvaluatePosition {
            bgs_id,
            expected_ply,
        }) => handle_evaluate_position(manager, &bgs_id, expected_ply).await,
        Ok(Request::ApplyMove {
            bgs_id,
            expected_ply,
            notation,
        }) => handle_apply_move(manager, &bgs_id, expected_ply, &notation).await,
        Err(error) => {
            warn!(bgs_id, %error, "unroutable request");
            Response::Error {
                bgs_id,
                error: format!("Unknown request type: {error}"),
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
