//! Simulation engine contract.
//!
//! The per-player engine (board physics, collision, scoring) lives behind
//! this trait; the orchestrator only drives it and observes the events it
//! raises. Engines signal line clears and top-outs through [`EngineEvent`]
//! values drained once per pump instead of calling back into the session.

use arrayvec::ArrayVec;
use crossterm::event::KeyCode;
use serde::{Deserialize, Serialize};

use crate::types::{PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Upper bound on events an engine can raise between two pumps.
pub const MAX_PENDING_EVENTS: usize = 8;

/// Events an engine raises for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Cleared `n` lines at once; in two-player mode this becomes garbage
    /// for the opponent.
    LinesCleared(u32),
    /// The stack reached the top; the match is over for this engine.
    ToppedOut,
}

/// Serializable snapshot of one engine's full state.
///
/// Cell encoding follows the board export convention: 0 = empty,
/// 1..=7 = piece kinds in I,O,T,S,Z,J,L order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub board: [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub hold: Option<PieceKind>,
    pub next: PieceKind,
    pub paused: bool,
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            board: [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
            score: 0,
            level: 1,
            lines: 0,
            hold: None,
            next: PieceKind::I,
            paused: false,
        }
    }
}

/// One player's simulation engine.
///
/// Implementations own the falling-piece board and its tick clock. The
/// orchestrator calls lifecycle and action methods from a single event
/// context; nothing here is expected to be thread-safe.
pub trait SimulationEngine {
    /// Start the simulation clock and spawn the first piece.
    fn start_game(&mut self);
    /// Stop the simulation clock. Safe to call when already stopped.
    fn stop_game(&mut self);
    fn toggle_pause(&mut self);
    fn is_paused(&self) -> bool;
    fn restart_game(&mut self);

    /// Generic key handler: the engine applies its own binding table,
    /// including keys the orchestrator does not route explicitly.
    fn handle_key_press(&mut self, code: KeyCode);

    fn move_left(&mut self);
    fn move_right(&mut self);
    fn move_down(&mut self);
    fn rotate(&mut self);
    fn hard_drop(&mut self);
    fn hold_piece(&mut self);

    fn set_game_over(&mut self, over: bool);
    fn set_winner(&mut self, winner: bool);
    fn is_game_over(&self) -> bool;
    fn is_winner(&self) -> bool;

    fn score(&self) -> u32;
    fn level(&self) -> u32;
    fn lines_cleared(&self) -> u32;
    fn next_piece(&self) -> PieceKind;
    fn held_piece(&self) -> Option<PieceKind>;

    /// Inject `n` penalty rows at the bottom of the board.
    fn add_garbage_lines(&mut self, n: u32);

    fn capture_state(&self) -> EngineSnapshot;
    fn load_state(&mut self, snapshot: EngineSnapshot);

    /// Drain events raised since the last pump, in raise order.
    fn drain_events(&mut self) -> ArrayVec<EngineEvent, MAX_PENDING_EVENTS>;
}

/// Allocates a fresh engine for a slot when a match starts.
pub type EngineFactory = Box<dyn FnMut() -> Box<dyn SimulationEngine>>;
