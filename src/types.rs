//! Core types shared across the crate
//! This module contains pure data types with no behavior attached

use serde::{Deserialize, Serialize};

/// Board dimensions
pub const BOARD_WIDTH: u8 = 10;
pub const BOARD_HEIGHT: u8 = 20;

/// Nickname handling
pub const MAX_NICKNAME_LEN: usize = 50;
pub const DEFAULT_RANKING_NICKNAME: &str = "Jogador";
/// Slot 2 (WASD) is prompted first and labeled "Jogador 1"; slot 1
/// (arrows) is prompted second as "Jogador 2".
pub const DEFAULT_P2_NICKNAME: &str = "Jogador 1";
pub const DEFAULT_P1_NICKNAME: &str = "Jogador 2";

/// Which screen the orchestrator is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Menu,
    OnePlayer,
    TwoPlayer,
}

/// Slot identity within a match. Cross-engine effects resolve targets by
/// slot id, never by nickname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    /// The opposing slot
    pub fn other(&self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }
}

/// Logical per-slot actions resolved from key bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    MoveLeft,
    MoveRight,
    MoveDown,
    Rotate,
    HardDrop,
    Hold,
}

impl PlayerAction {
    /// Stable label used in routing logs
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerAction::MoveLeft => "moveLeft",
            PlayerAction::MoveRight => "moveRight",
            PlayerAction::MoveDown => "moveDown",
            PlayerAction::Rotate => "rotate",
            PlayerAction::HardDrop => "hardDrop",
            PlayerAction::Hold => "hold",
        }
    }
}

/// Tetromino piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

/// Clamp a prompted nickname: trim, substitute the default when blank or
/// cancelled, cut at [`MAX_NICKNAME_LEN`] characters.
pub fn clamp_nickname(raw: Option<String>, default: &str) -> String {
    let name = match raw {
        Some(s) => {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed
            }
        }
        None => default.to_string(),
    };
    name.chars().take(MAX_NICKNAME_LEN).collect()
}
