//! Wallwars game model.
//!
//! The board is a rectangular grid on which each player moves a cat toward
//! the opposing mouse while placing walls. This crate owns the compact board
//! representation, legal-action generation (including the bridge-finding
//! pass that keeps wall placements from disconnecting a cat from its goal),
//! official move notation, and the padding layer that embeds smaller game
//! boards into a fixed model grid.

pub mod board;
pub mod notation;
pub mod padding;
pub mod types;

pub use board::{Board, BoardError};
pub use notation::NotationError;
pub use padding::PaddingConfig;
pub use types::{
    Action, Cell, Direction, Move, Pawn, PawnMove, Player, PreviousPosition, Turn, TurnAction,
    Variant, Wall, WallKind, Winner, DIRECTIONS,
};
