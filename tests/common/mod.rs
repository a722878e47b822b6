//! Scripted collaborators for orchestrator tests.
//!
//! The session takes ownership of its engines, shell and audio mixer, so
//! every mock hands the test a shared probe handle (`Rc<RefCell<..>>`)
//! before moving into the session.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use arrayvec::ArrayVec;
use crossterm::event::KeyCode;

use tetris_versus::engine::MAX_PENDING_EVENTS;
use tetris_versus::{
    AudioMixer, EngineEvent, EngineFactory, EngineSnapshot, MatchSession, MemoryStore, PieceKind,
    PlayerId, PresentationShell, SimulationEngine,
};

// ---------- engine ----------

/// Observable state of one mock engine.
#[derive(Debug)]
pub struct EngineProbe {
    pub started: bool,
    pub stop_calls: u32,
    pub paused: bool,
    pub game_over: bool,
    pub winner: bool,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub hold: Option<PieceKind>,
    pub next: PieceKind,
    pub garbage_received: u32,
    pub keys: Vec<KeyCode>,
    pub actions: Vec<&'static str>,
    pub loaded: Option<EngineSnapshot>,
    pub pending_events: Vec<EngineEvent>,
}

impl Default for EngineProbe {
    fn default() -> Self {
        Self {
            started: false,
            stop_calls: 0,
            paused: false,
            game_over: false,
            winner: false,
            score: 0,
            level: 1,
            lines: 0,
            hold: None,
            next: PieceKind::I,
            garbage_received: 0,
            keys: Vec::new(),
            actions: Vec::new(),
            loaded: None,
            pending_events: Vec::new(),
        }
    }
}

pub struct MockEngine {
    probe: Rc<RefCell<EngineProbe>>,
}

impl SimulationEngine for MockEngine {
    fn start_game(&mut self) {
        self.probe.borrow_mut().started = true;
    }

    fn stop_game(&mut self) {
        let mut p = self.probe.borrow_mut();
        p.started = false;
        p.stop_calls += 1;
    }

    fn toggle_pause(&mut self) {
        let mut p = self.probe.borrow_mut();
        p.paused = !p.paused;
    }

    fn is_paused(&self) -> bool {
        self.probe.borrow().paused
    }

    fn restart_game(&mut self) {
        self.probe.borrow_mut().actions.push("restart");
    }

    fn handle_key_press(&mut self, code: KeyCode) {
        self.probe.borrow_mut().keys.push(code);
    }

    fn move_left(&mut self) {
        self.probe.borrow_mut().actions.push("moveLeft");
    }

    fn move_right(&mut self) {
        self.probe.borrow_mut().actions.push("moveRight");
    }

    fn move_down(&mut self) {
        self.probe.borrow_mut().actions.push("moveDown");
    }

    fn rotate(&mut self) {
        self.probe.borrow_mut().actions.push("rotate");
    }

    fn hard_drop(&mut self) {
        self.probe.borrow_mut().actions.push("hardDrop");
    }

    fn hold_piece(&mut self) {
        self.probe.borrow_mut().actions.push("hold");
    }

    fn set_game_over(&mut self, over: bool) {
        self.probe.borrow_mut().game_over = over;
    }

    fn set_winner(&mut self, winner: bool) {
        self.probe.borrow_mut().winner = winner;
    }

    fn is_game_over(&self) -> bool {
        self.probe.borrow().game_over
    }

    fn is_winner(&self) -> bool {
        self.probe.borrow().winner
    }

    fn score(&self) -> u32 {
        self.probe.borrow().score
    }

    fn level(&self) -> u32 {
        self.probe.borrow().level
    }

    fn lines_cleared(&self) -> u32 {
        self.probe.borrow().lines
    }

    fn next_piece(&self) -> PieceKind {
        self.probe.borrow().next
    }

    fn held_piece(&self) -> Option<PieceKind> {
        self.probe.borrow().hold
    }

    fn add_garbage_lines(&mut self, n: u32) {
        self.probe.borrow_mut().garbage_received += n;
    }

    fn capture_state(&self) -> EngineSnapshot {
        let p = self.probe.borrow();
        EngineSnapshot {
            score: p.score,
            level: p.level,
            lines: p.lines,
            hold: p.hold,
            next: p.next,
            paused: p.paused,
            ..EngineSnapshot::default()
        }
    }

    fn load_state(&mut self, snapshot: EngineSnapshot) {
        let mut p = self.probe.borrow_mut();
        p.score = snapshot.score;
        p.level = snapshot.level;
        p.lines = snapshot.lines;
        p.hold = snapshot.hold;
        p.next = snapshot.next;
        p.loaded = Some(snapshot);
    }

    fn drain_events(&mut self) -> ArrayVec<EngineEvent, MAX_PENDING_EVENTS> {
        let mut out = ArrayVec::new();
        for event in self.probe.borrow_mut().pending_events.drain(..) {
            let _ = out.try_push(event);
        }
        out
    }
}

// ---------- shell ----------

/// Scripted answer to one prompt.
#[derive(Debug, Clone)]
pub enum PromptAnswer {
    /// User pressed OK on the suggested default.
    AcceptDefault,
    Text(String),
    Cancel,
}

#[derive(Debug, Default)]
pub struct ShellLog {
    pub views: Vec<&'static str>,
    pub notifications: Vec<String>,
    pub prompts: Vec<String>,
    pub answers: VecDeque<PromptAnswer>,
    pub redraws: Vec<PlayerId>,
}

pub struct MockShell {
    log: Rc<RefCell<ShellLog>>,
}

impl PresentationShell for MockShell {
    fn show_menu(&mut self) {
        self.log.borrow_mut().views.push("menu");
    }

    fn show_single_view(&mut self) {
        self.log.borrow_mut().views.push("single");
    }

    fn show_split_view(&mut self) {
        self.log.borrow_mut().views.push("split");
    }

    fn notify(&mut self, message: &str) {
        self.log.borrow_mut().notifications.push(message.to_string());
    }

    fn prompt(&mut self, question: &str, default: &str) -> Option<String> {
        let mut log = self.log.borrow_mut();
        log.prompts.push(question.to_string());
        match log.answers.pop_front() {
            Some(PromptAnswer::Text(text)) => Some(text),
            Some(PromptAnswer::Cancel) => None,
            // No script: behave as OK on the default.
            Some(PromptAnswer::AcceptDefault) | None => Some(default.to_string()),
        }
    }

    fn request_redraw(&mut self, slot: PlayerId) {
        self.log.borrow_mut().redraws.push(slot);
    }
}

// ---------- audio ----------

#[derive(Debug, Default)]
pub struct AudioLog {
    pub calls: Vec<String>,
}

pub struct MockAudio {
    log: Rc<RefCell<AudioLog>>,
}

impl AudioMixer for MockAudio {
    fn start_music(&mut self) {
        self.log.borrow_mut().calls.push("start_music".to_string());
    }

    fn stop_music(&mut self) {
        self.log.borrow_mut().calls.push("stop_music".to_string());
    }

    fn play_effect(&mut self, name: &str) {
        self.log.borrow_mut().calls.push(format!("effect:{name}"));
    }
}

// ---------- harness ----------

pub struct Harness {
    /// Probes for engines the factory has allocated, in allocation order.
    pub engines: Rc<RefCell<Vec<Rc<RefCell<EngineProbe>>>>>,
    pub shell: Rc<RefCell<ShellLog>>,
    pub audio: Rc<RefCell<AudioLog>>,
}

impl Harness {
    /// Probe of the n-th engine allocated since session construction.
    pub fn engine(&self, index: usize) -> Rc<RefCell<EngineProbe>> {
        self.engines.borrow()[index].clone()
    }

    pub fn allocated_engines(&self) -> usize {
        self.engines.borrow().len()
    }

    pub fn script_answer(&self, answer: PromptAnswer) {
        self.shell.borrow_mut().answers.push_back(answer);
    }

    pub fn push_event(&self, index: usize, event: EngineEvent) {
        self.engine(index).borrow_mut().pending_events.push(event);
    }
}

/// Build a session backed by an in-memory store and scripted mocks.
pub fn new_session() -> (MatchSession<MemoryStore, MockShell, MockAudio>, Harness) {
    new_session_with_store(MemoryStore::new())
}

pub fn new_session_with_store<S: tetris_versus::PersistenceStore>(
    store: S,
) -> (MatchSession<S, MockShell, MockAudio>, Harness) {
    let engines: Rc<RefCell<Vec<Rc<RefCell<EngineProbe>>>>> = Rc::new(RefCell::new(Vec::new()));
    let shell_log = Rc::new(RefCell::new(ShellLog::default()));
    let audio_log = Rc::new(RefCell::new(AudioLog::default()));

    let factory_probes = engines.clone();
    let factory: EngineFactory = Box::new(move || {
        let probe = Rc::new(RefCell::new(EngineProbe::default()));
        factory_probes.borrow_mut().push(probe.clone());
        Box::new(MockEngine { probe })
    });

    let session = MatchSession::new(
        factory,
        store,
        MockShell {
            log: shell_log.clone(),
        },
        MockAudio {
            log: audio_log.clone(),
        },
    );

    let harness = Harness {
        engines,
        shell: shell_log,
        audio: audio_log,
    };
    (session, harness)
}
