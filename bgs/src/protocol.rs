//! Line-framed BGS protocol types.
//!
//! Each stdin line is one JSON request routed by its `type` field; each
//! response is one JSON line. Responses carry `success`/`error` instead of
//! transport-level failures so a single bad request never disturbs the
//! stream.

use serde::{Deserialize, Serialize};

use crate::adapter::BgsConfig;

/// Requests, routed by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    StartGameSession {
        bgs_id: String,
        bot_id: String,
        config: BgsConfig,
    },

    #[serde(rename_all = "camelCase")]
    EndGameSession { bgs_id: String },

    #[serde(rename_all = "camelCase")]
    EvaluatePosition { bgs_id: String, expected_ply: u32 },

    #[serde(rename_all = "camelCase")]
    ApplyMove {
        bgs_id: String,
        expected_ply: u32,
        #[serde(rename = "move")]
        notation: String,
    },
}

/// Responses, one per request (plus a generic `error` shape for requests
/// that cannot be routed).
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    GameSessionStarted {
        bgs_id: String,
        success: bool,
        error: String,
    },

    #[serde(rename_all = "camelCase")]
    GameSessionEnded {
        bgs_id: String,
        success: bool,
        error: String,
    },

    #[serde(rename_all = "camelCase")]
    EvaluateResponse {
        bgs_id: String,
        ply: u32,
        best_move: String,
        evaluation: f32,
        success: bool,
        error: String,
    },

    #[serde(rename_all = "camelCase")]
    MoveApplied {
        bgs_id: String,
        ply: u32,
        success: bool,
        error: String,
    },

    #[serde(rename_all = "camelCase")]
    Error { bgs_id: String, error: String },
}

impl Response {
    pub fn session_started(bgs_id: impl Into<String>) -> Response {
        Response::GameSessionStarted {
            bgs_id: bgs_id.into(),
            success: true,
            error: String::new(),
        }
    }

    pub fn session_start_failed(bgs_id: impl Into<String>, error: impl Into<String>) -> Response {
        Response::GameSessionStarted {
            bgs_id: bgs_id.into(),
            success: false,
            error: error.into(),
        }
    }

    pub fn session_ended(bgs_id: impl Into<String>) -> Response {
        Response::GameSessionEnded {
            bgs_id: bgs_id.into(),
            success: true,
            error: String::new(),
        }
    }

    pub fn session_end_failed(bgs_id: impl Into<String>, error: impl Into<String>) -> Response {
        Response::GameSessionEnded {
            bgs_id: bgs_id.into(),
            success: false,
            error: error.into(),
        }
    }

    pub fn evaluated(
        bgs_id: impl Into<String>,
        ply: u32,
        best_move: String,
        evaluation: f32,
    ) -> Response {
        Response::EvaluateResponse {
            bgs_id: bgs_id.into(),
            ply,
            best_move,
            evaluation,
            success: true,
            error: String::new(),
        }
    }

    pub fn evaluate_failed(bgs_id: impl Into<String>, ply: u32, error: impl Into<String>) -> Response {
        Response::EvaluateResponse {
            bgs_id: bgs_id.into(),
            ply,
            best_move: String::new(),
            evaluation: 0.0,
            success: false,
            error: error.into(),
        }
    }

    pub fn move_applied(bgs_id: impl Into<String>, ply: u32) -> Response {
        Response::MoveApplied {
            bgs_id: bgs_id.into(),
            ply,
            success: true,
            error: String::new(),
        }
    }

    pub fn move_failed(bgs_id: impl Into<String>, ply: u32, error: impl Into<String>) -> Response {
        Response::MoveApplied {
            bgs_id: bgs_id.into(),
            ply,
            success: false,
            error: error.into(),
        }
    }
}
