//! Match orchestrator.
//!
//! [`MatchSession`] owns the current match: which screen is active, the one
//! or two engine slots, the `match_over` latch and the loaded-save tracking
//! field. It routes key codes to slot engines, mediates garbage between
//! them, settles termination exactly once, and drives persistence and
//! scoring through the injected collaborators.
//!
//! Every operation takes `&mut self` and runs to completion; the
//! surrounding event-dispatch context serializes calls, so no internal
//! locking exists. The `match_over` latch and the `Option`-wrapped slots
//! are the idempotency guards.

use crossterm::event::KeyCode;

use crate::engine::{EngineEvent, EngineFactory, SimulationEngine};
use crate::input::{validate_keymaps, Keymap, MENU_OVERRIDE_KEYS, P1_KEYMAP, P2_KEYMAP};
use crate::shell::{AudioMixer, PresentationShell};
use crate::store::{PersistenceStore, StoreError};
use crate::types::{
    clamp_nickname, MatchState, PlayerAction, PlayerId, DEFAULT_P1_NICKNAME, DEFAULT_P2_NICKNAME,
    DEFAULT_RANKING_NICKNAME,
};

const GAMEOVER_EFFECT: &str = "gameover";

/// Discrete UI commands consumed by [`MatchSession::dispatch`]. The shell
/// turns button presses and menu choices into these instead of calling the
/// session from widget callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartOnePlayer,
    StartTwoPlayer,
    LoadGame(String),
    SaveGame(String),
    ReturnToMenu,
    Key(KeyCode),
}

/// One engine plus its nickname and binding table.
struct PlayerSlot {
    engine: Box<dyn SimulationEngine>,
    nickname: String,
    keymap: Keymap,
}

/// The match orchestrator. Engines exist exactly while the state is not
/// [`MatchState::Menu`]; in two-player mode both slots are created and
/// destroyed together.
pub struct MatchSession<S, U, A>
where
    S: PersistenceStore,
    U: PresentationShell,
    A: AudioMixer,
{
    state: MatchState,
    slot1: Option<PlayerSlot>,
    slot2: Option<PlayerSlot>,
    match_over: bool,
    loaded_save_name: Option<String>,

    engine_factory: EngineFactory,
    store: S,
    shell: U,
    audio: A,
}

impl<S, U, A> MatchSession<S, U, A>
where
    S: PersistenceStore,
    U: PresentationShell,
    A: AudioMixer,
{
    /// Build a session on the menu screen. Panics if the compiled-in
    /// binding tables overlap, which is a programming error.
    pub fn new(engine_factory: EngineFactory, store: S, shell: U, audio: A) -> Self {
        if let Err(code) = validate_keymaps(&P1_KEYMAP, &P2_KEYMAP) {
            panic!("slot binding tables overlap on {code:?}");
        }
        Self {
            state: MatchState::Menu,
            slot1: None,
            slot2: None,
            match_over: false,
            loaded_save_name: None,
            engine_factory,
            store,
            shell,
            audio,
        }
    }

    // ---------- accessors ----------

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn match_over(&self) -> bool {
        self.match_over
    }

    pub fn loaded_save_name(&self) -> Option<&str> {
        self.loaded_save_name.as_deref()
    }

    pub fn engine(&self, slot: PlayerId) -> Option<&dyn SimulationEngine> {
        self.slot(slot).map(|s| s.engine.as_ref())
    }

    pub fn engine_mut(&mut self, slot: PlayerId) -> Option<&mut dyn SimulationEngine> {
        match self.slot_mut(slot) {
            Some(s) => Some(s.engine.as_mut()),
            None => None,
        }
    }

    pub fn nickname(&self, slot: PlayerId) -> Option<&str> {
        self.slot(slot).map(|s| s.nickname.as_str())
    }

    pub fn best_score(&self) -> u32 {
        self.store.best_score()
    }

    /// Read access to the persistence collaborator (ranking display etc.).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn win_count(&self, nickname: &str) -> u32 {
        self.store.win_count(nickname)
    }

    pub fn saved_game_names(&mut self) -> Vec<String> {
        match self.store.list_saves() {
            Ok(names) => names,
            Err(err) => {
                self.report_store_error("listar saves", &err);
                Vec::new()
            }
        }
    }

    fn slot(&self, id: PlayerId) -> Option<&PlayerSlot> {
        match id {
            PlayerId::One => self.slot1.as_ref(),
            PlayerId::Two => self.slot2.as_ref(),
        }
    }

    fn slot_mut(&mut self, id: PlayerId) -> Option<&mut PlayerSlot> {
        match id {
            PlayerId::One => self.slot1.as_mut(),
            PlayerId::Two => self.slot2.as_mut(),
        }
    }

    // ---------- command dispatch ----------

    /// Single entry point for UI events.
    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::StartOnePlayer => self.start_one_player(),
            Command::StartTwoPlayer => self.start_two_player(),
            Command::LoadGame(name) => self.load_game(&name),
            Command::SaveGame(name) => self.save_current_game(&name),
            Command::ReturnToMenu => self.return_to_menu(),
            Command::Key(code) => self.handle_key_press(code),
        }
    }

    // ---------- session lifecycle ----------

    fn reset_match_fields(&mut self) {
        self.match_over = false;
        self.loaded_save_name = None;
    }

    /// Start a fresh one-player match. Always succeeds.
    pub fn start_one_player(&mut self) {
        self.state = MatchState::OnePlayer;
        self.reset_match_fields();

        let engine = (self.engine_factory)();
        self.slot1 = Some(PlayerSlot {
            engine,
            nickname: DEFAULT_RANKING_NICKNAME.to_string(),
            keymap: P1_KEYMAP,
        });
        self.slot2 = None;

        // View first, then the clock: the engine must have a surface before
        // it renders a frame.
        self.shell.show_single_view();
        self.audio.start_music();
        if let Some(slot) = self.slot1.as_mut() {
            slot.engine.start_game();
        }
        log::info!("one-player match started");
    }

    /// Start a fresh two-player match, prompting both nicknames.
    pub fn start_two_player(&mut self) {
        self.reset_match_fields();
        self.state = MatchState::TwoPlayer;

        // WASD player (slot 2) is prompted first, arrows (slot 1) second.
        let p2_nickname = clamp_nickname(
            self.shell
                .prompt("Nome do Jogador 1 (WASD):", DEFAULT_P2_NICKNAME),
            DEFAULT_P2_NICKNAME,
        );
        let p1_nickname = clamp_nickname(
            self.shell
                .prompt("Nome do Jogador 2 (Setas):", DEFAULT_P1_NICKNAME),
            DEFAULT_P1_NICKNAME,
        );

        self.slot1 = Some(PlayerSlot {
            engine: (self.engine_factory)(),
            nickname: p1_nickname,
            keymap: P1_KEYMAP,
        });
        self.slot2 = Some(PlayerSlot {
            engine: (self.engine_factory)(),
            nickname: p2_nickname,
            keymap: P2_KEYMAP,
        });

        // Both engines are wired to the split view before either clock
        // starts, so neither renders without a surface.
        self.shell.show_split_view();
        self.audio.start_music();
        if let Some(slot) = self.slot1.as_mut() {
            slot.engine.start_game();
        }
        if let Some(slot) = self.slot2.as_mut() {
            slot.engine.start_game();
        }
        log::info!("two-player match started");
    }

    /// Stop whatever is running and go back to the menu. Always succeeds,
    /// including when no engines are allocated.
    pub fn return_to_menu(&mut self) {
        if let Some(slot) = self.slot1.as_mut() {
            slot.engine.stop_game();
        }
        if let Some(slot) = self.slot2.as_mut() {
            slot.engine.stop_game();
        }
        self.audio.stop_music();
        self.slot1 = None;
        self.slot2 = None;
        self.reset_match_fields();
        self.state = MatchState::Menu;
        self.shell.show_menu();
        log::info!("returned to menu");
    }

    /// Resume a saved one-player match. A missing or malformed save is
    /// surfaced as a notification and leaves the session untouched.
    pub fn load_game(&mut self, name: &str) {
        // Deserialize before touching session state so a failure cannot
        // leave a half-started match.
        let snapshot = match self.store.load_save(name) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.report_store_error(&format!("carregar o jogo '{name}'"), &err);
                return;
            }
        };

        self.start_one_player();
        self.loaded_save_name = Some(name.to_string());

        if let Some(slot) = self.slot1.as_mut() {
            slot.engine.stop_game();
            slot.engine.toggle_pause();
            slot.engine.load_state(snapshot);
        }

        self.audio.start_music();
        self.shell.notify(&format!(
            "Jogo '{name}' carregado! Pressione 'P' para despausar."
        ));
        log::info!("resumed save '{name}'");
    }

    /// Persist the running one-player match under `name`. A no-op in any
    /// other state.
    pub fn save_current_game(&mut self, name: &str) {
        if self.state != MatchState::OnePlayer {
            return;
        }
        let snapshot = match self.slot1.as_ref() {
            Some(slot) => slot.engine.capture_state(),
            None => return,
        };

        match self.store.store_save(name, &snapshot) {
            Ok(()) => {
                // An explicit re-save commits the state; the save is no
                // longer "resumed, unmodified".
                if self.loaded_save_name.as_deref() == Some(name) {
                    self.loaded_save_name = None;
                }
                self.shell.notify(&format!("Jogo salvo como '{name}'!"));
                log::info!("saved running match as '{name}'");
            }
            Err(err) => self.report_store_error(&format!("salvar o jogo '{name}'"), &err),
        }
    }

    // ---------- termination and cross-engine effects ----------

    /// Single termination entry point, raised when `loser`'s board tops
    /// out. Idempotent: once the match is settled, later signals (the other
    /// engine in the same tick, or a repeat) do nothing.
    pub fn on_player_lost(&mut self, loser: PlayerId) {
        if self.match_over {
            return;
        }

        self.audio.play_effect(GAMEOVER_EFFECT);

        match self.state {
            MatchState::OnePlayer => self.settle_one_player_loss(loser),
            MatchState::TwoPlayer => self.settle_two_player_loss(loser),
            MatchState::Menu => {}
        }
    }

    fn settle_one_player_loss(&mut self, loser: PlayerId) {
        self.match_over = true;
        let final_score = match self.slot_mut(loser) {
            Some(slot) => {
                slot.engine.set_game_over(true);
                slot.engine.score()
            }
            None => return,
        };
        log::info!("one-player match over, score {final_score}");

        match self.store.record_best_score(final_score) {
            Ok(true) => log::info!("new best score: {final_score}"),
            Ok(false) => {}
            Err(err) => self.report_store_error("registrar recorde", &err),
        }

        if final_score > 0 {
            let answer = self.shell.prompt(
                &format!(
                    "Fim de Jogo! Pontuação: {final_score}\nDigite seu nome para o ranking:"
                ),
                DEFAULT_RANKING_NICKNAME,
            );
            // Cancelled or blank answers skip the ranking entry entirely.
            if let Some(raw) = answer {
                if !raw.trim().is_empty() {
                    let nickname = clamp_nickname(Some(raw), DEFAULT_RANKING_NICKNAME);
                    if let Err(err) = self.store.record_high_score(&nickname, final_score) {
                        self.report_store_error("salvar pontuação", &err);
                    }
                }
            }
        }

        // A lost resumed game is no longer resumable.
        if let Some(name) = self.loaded_save_name.take() {
            if let Err(err) = self.store.delete_save(&name) {
                self.report_store_error(&format!("apagar o save '{name}'"), &err);
            }
        }

        self.shell.request_redraw(loser);
    }

    fn settle_two_player_loss(&mut self, loser: PlayerId) {
        self.match_over = true;
        let winner = loser.other();

        if let Some(slot) = self.slot1.as_mut() {
            slot.engine.stop_game();
        }
        if let Some(slot) = self.slot2.as_mut() {
            slot.engine.stop_game();
        }

        if let Some(slot) = self.slot_mut(loser) {
            slot.engine.set_game_over(true);
        }
        let winner_nickname = match self.slot_mut(winner) {
            Some(slot) => {
                slot.engine.set_winner(true);
                slot.nickname.clone()
            }
            None => return,
        };

        log::info!("two-player match over, winner '{winner_nickname}'");
        if let Err(err) = self.store.record_win(&winner_nickname) {
            self.report_store_error("registrar vitória", &err);
        }

        self.shell.request_redraw(PlayerId::One);
        self.shell.request_redraw(PlayerId::Two);
    }

    /// Inject `line_count` garbage rows into the slot opposite `sender`.
    /// The sole cross-engine coupling point; checked against `match_over`
    /// first so a terminated engine never receives garbage.
    pub fn send_garbage(&mut self, sender: PlayerId, line_count: u32) {
        if self.match_over || self.state != MatchState::TwoPlayer {
            return;
        }
        if let Some(target) = self.slot_mut(sender.other()) {
            target.engine.add_garbage_lines(line_count);
        }
    }

    /// Drain pending engine events and route them: line clears become
    /// garbage for the opponent, top-outs settle the match.
    pub fn pump_events(&mut self) {
        for id in [PlayerId::One, PlayerId::Two] {
            let events = match self.slot_mut(id) {
                Some(slot) => slot.engine.drain_events(),
                None => continue,
            };
            for event in events {
                match event {
                    EngineEvent::LinesCleared(n) => self.send_garbage(id, n),
                    EngineEvent::ToppedOut => self.on_player_lost(id),
                }
            }
        }
    }

    // ---------- input routing ----------

    /// Route a raw key code according to the current state. Unrecognized
    /// codes are silently ignored; on the menu nothing is routed at all.
    pub fn handle_key_press(&mut self, code: KeyCode) {
        if self.state == MatchState::TwoPlayer && MENU_OVERRIDE_KEYS.contains(&code) {
            self.return_to_menu();
            return;
        }

        match self.state {
            MatchState::Menu => {}
            MatchState::OnePlayer => {
                // Everything goes to the engine's generic handler, even
                // keys outside the slot table (pause and friends).
                if let Some(slot) = self.slot1.as_mut() {
                    slot.engine.handle_key_press(code);
                }
            }
            MatchState::TwoPlayer => {
                // Slot 1: table membership gates the generic handler.
                if let Some(slot) = self.slot1.as_mut() {
                    if slot.keymap.binds(code) {
                        slot.engine.handle_key_press(code);
                    }
                }
                // Slot 2: table resolves to specific action methods.
                if let Some(slot) = self.slot2.as_mut() {
                    if let Some(action) = slot.keymap.lookup(code) {
                        apply_action(slot.engine.as_mut(), action);
                    }
                }
            }
        }
    }

    fn report_store_error(&mut self, what: &str, err: &StoreError) {
        log::warn!("store error while trying to {what}: {err}");
        self.shell.notify(&format!("Erro ao {what}: {err}"));
    }
}

fn apply_action(engine: &mut dyn SimulationEngine, action: PlayerAction) {
    log::debug!("slot 2 action: {}", action.as_str());
    match action {
        PlayerAction::MoveLeft => engine.move_left(),
        PlayerAction::MoveRight => engine.move_right(),
        PlayerAction::MoveDown => engine.move_down(),
        PlayerAction::Rotate => engine.rotate(),
        PlayerAction::HardDrop => engine.hard_drop(),
        PlayerAction::Hold => engine.hold_piece(),
    }
}
