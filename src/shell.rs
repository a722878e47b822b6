//! Presentation and audio collaborator seams.
//!
//! Rendering, menus and dialogs live outside this crate. The session talks
//! to them through these traits; modal dialogs are reduced to a synchronous
//! `prompt` returning `None` on cancel, so tests can script answers without
//! a display.

use crate::types::PlayerId;

/// View switching, notifications and user prompts.
pub trait PresentationShell {
    /// Show the main menu view.
    fn show_menu(&mut self);
    /// Show the single-board view for slot 1.
    fn show_single_view(&mut self);
    /// Show the split view with both boards side by side.
    fn show_split_view(&mut self);

    /// Dismissible, non-fatal notification.
    fn notify(&mut self, message: &str);

    /// Synchronous prompt; `None` means the user cancelled.
    fn prompt(&mut self, question: &str, default: &str) -> Option<String>;

    /// Ask the shell to repaint one slot's panel.
    fn request_redraw(&mut self, slot: PlayerId);
}

/// Background music and one-shot effect cues.
pub trait AudioMixer {
    fn start_music(&mut self);
    fn stop_music(&mut self);
    /// Play a named one-shot effect (e.g. `"gameover"`).
    fn play_effect(&mut self, name: &str);
}
