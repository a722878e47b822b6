//! Per-slot key binding tables.
//!
//! Bindings are data, not inline conditionals: each slot owns a fixed table
//! from key code to logical action, and the session validates at
//! construction that the two tables never claim the same key.
//!
//! The two slots are deliberately asymmetric: slot 1 keys are forwarded to
//! the engine's *generic* key handler (which may recognize more keys than
//! the table lists), while slot 2 keys dispatch to explicit per-action
//! engine methods.

use crossterm::event::KeyCode;

use crate::types::PlayerAction;

/// In two-player mode this key returns to the menu, overriding every slot
/// binding, either case.
pub const MENU_OVERRIDE_KEYS: [KeyCode; 2] = [KeyCode::Char('r'), KeyCode::Char('R')];

/// A fixed binding table for one slot.
#[derive(Debug, Clone, Copy)]
pub struct Keymap {
    entries: &'static [(KeyCode, PlayerAction)],
}

/// Slot 1: arrow keys, Space for hard drop, 'C' for hold.
pub const P1_KEYMAP: Keymap = Keymap {
    entries: &[
        (KeyCode::Left, PlayerAction::MoveLeft),
        (KeyCode::Right, PlayerAction::MoveRight),
        (KeyCode::Down, PlayerAction::MoveDown),
        (KeyCode::Up, PlayerAction::Rotate),
        (KeyCode::Char(' '), PlayerAction::HardDrop),
        (KeyCode::Char('c'), PlayerAction::Hold),
        (KeyCode::Char('C'), PlayerAction::Hold),
    ],
};

/// Slot 2: WASD, 'Q' for hard drop, 'E' for hold.
pub const P2_KEYMAP: Keymap = Keymap {
    entries: &[
        (KeyCode::Char('a'), PlayerAction::MoveLeft),
        (KeyCode::Char('A'), PlayerAction::MoveLeft),
        (KeyCode::Char('d'), PlayerAction::MoveRight),
        (KeyCode::Char('D'), PlayerAction::MoveRight),
        (KeyCode::Char('s'), PlayerAction::MoveDown),
        (KeyCode::Char('S'), PlayerAction::MoveDown),
        (KeyCode::Char('w'), PlayerAction::Rotate),
        (KeyCode::Char('W'), PlayerAction::Rotate),
        (KeyCode::Char('q'), PlayerAction::HardDrop),
        (KeyCode::Char('Q'), PlayerAction::HardDrop),
        (KeyCode::Char('e'), PlayerAction::Hold),
        (KeyCode::Char('E'), PlayerAction::Hold),
    ],
};

impl Keymap {
    /// Resolve a key code to this slot's action, if bound.
    pub fn lookup(&self, code: KeyCode) -> Option<PlayerAction> {
        self.entries
            .iter()
            .find(|(bound, _)| *bound == code)
            .map(|&(_, action)| action)
    }

    /// Whether this table binds the key at all.
    pub fn binds(&self, code: KeyCode) -> bool {
        self.lookup(code).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.entries.iter().map(|&(code, _)| code)
    }
}

/// Validate that neither slot table claims a key of the other and that the
/// menu-override key is free in both. Called once at session construction.
pub fn validate_keymaps(p1: &Keymap, p2: &Keymap) -> Result<(), KeyCode> {
    for code in p1.keys() {
        if p2.binds(code) {
            return Err(code);
        }
    }
    for code in MENU_OVERRIDE_KEYS {
        if p1.binds(code) || p2.binds(code) {
            return Err(code);
        }
    }
    Ok(())
}
