//! Match orchestration for one- and two-player falling-block duels.
//!
//! The crate owns everything between the presentation shell and the
//! per-player simulation engines: the menu / one-player / two-player state
//! machine, per-slot input routing, cross-engine garbage, exactly-once
//! match settlement, and save / ranking persistence. Rendering, dialogs and
//! audio playback stay behind the collaborator traits in [`shell`].
//!
//! # Module Structure
//!
//! - [`types`]: shared pure data types (match state, slot ids, actions)
//! - [`engine`]: the simulation engine contract and serializable snapshot
//! - [`input`]: declarative per-slot key binding tables
//! - [`shell`]: presentation and audio collaborator traits
//! - [`store`]: save slots, ranking table and win counters
//! - [`session`]: the match orchestrator itself

pub mod engine;
pub mod input;
pub mod session;
pub mod shell;
pub mod store;
pub mod types;

pub use engine::{EngineEvent, EngineFactory, EngineSnapshot, SimulationEngine};
pub use session::{Command, MatchSession};
pub use shell::{AudioMixer, PresentationShell};
pub use store::{JsonFileStore, MemoryStore, PersistenceStore, StoreError};
pub use types::{MatchState, PieceKind, PlayerAction, PlayerId};
