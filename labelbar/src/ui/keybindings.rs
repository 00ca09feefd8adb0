//! Keybinding dispatcher for labelbar.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` telling the event loop whether to continue, quit, or spawn a
//! store command. The dispatcher branches first on `state.mode` so that each
//! mode has an isolated handler function.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use labelbar_core::controls::Hotkey;

use crate::app::{AppState, Command, Mode};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Continue the event loop normally.
    Continue,
    /// Exit cleanly.
    Quit,
    /// Hand `Command` to [`AppState::spawn_command`].
    Command(Command),
}

/// Dispatches a key event to the handler matching the current mode.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::Normal => handle_normal(key, state),
        Mode::Insert => handle_insert(key, state),
        Mode::Label => handle_label(key, state),
    }
}

/// Maps the three bar hotkeys. Works in Normal and Insert mode.
fn hotkey_of(key: &KeyEvent) -> Option<Hotkey> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        // Many terminals report Ctrl+Space as NUL.
        KeyCode::Null => Some(Hotkey::CtrlSpace),
        KeyCode::Char(' ') if ctrl => Some(Hotkey::CtrlSpace),
        KeyCode::Enter if ctrl => Some(Hotkey::CtrlEnter),
        KeyCode::Enter if alt => Some(Hotkey::AltEnter),
        _ => None,
    }
}

/// Presses the button behind `hotkey`, or does nothing if it is absent or disabled.
fn press_hotkey(hotkey: Hotkey, state: &mut AppState) -> KeyAction {
    match state.hotkey(hotkey) {
        Some(id) => KeyAction::Command(Command::Press(id)),
        None => {
            tracing::debug!(?hotkey, "hotkey has no enabled target");
            KeyAction::Continue
        }
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(hotkey) = hotkey_of(&key) {
        return press_hotkey(hotkey, state);
    }
    if let Some(action) = handle_edit_key(key, state) {
        return action;
    }

    match key.code {
        // Bottom bar
        KeyCode::Char('h') | KeyCode::Left => {
            state.cursor_left();
            KeyAction::Continue
        }
        KeyCode::Char('l') | KeyCode::Right => {
            state.cursor_right();
            KeyAction::Continue
        }
        KeyCode::Enter => match state.focused_button() {
            Some(button) if button.enabled => KeyAction::Command(Command::Press(button.id)),
            _ => KeyAction::Continue,
        },

        // Comment box
        KeyCode::Char('c') => {
            state.comments.clear_tooltip();
            state.mode = Mode::Insert;
            KeyAction::Continue
        }

        // Entities and history. The selection stays put while an action runs.
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('[' | ']') if state.gate.is_in_progress() => {
            state.set_status("wait for the running action to finish");
            KeyAction::Continue
        }
        KeyCode::Tab => {
            state.switch_entity(true);
            KeyAction::Command(Command::SelectionChanged)
        }
        KeyCode::BackTab => {
            state.switch_entity(false);
            KeyAction::Command(Command::SelectionChanged)
        }
        KeyCode::Char('[') => {
            state.older_revision();
            KeyAction::Continue
        }
        KeyCode::Char(']') => {
            state.newer_revision();
            KeyAction::Continue
        }
        KeyCode::Char('v') => {
            state.viewing_all = !state.viewing_all;
            KeyAction::Continue
        }

        // Toolbar
        KeyCode::Char('g') => {
            if !state.has_ground_truth() {
                KeyAction::Continue
            } else if state.store.history_selected() {
                state.set_status("revisions are read-only");
                KeyAction::Continue
            } else {
                KeyAction::Command(Command::ToggleGroundTruth)
            }
        }
        KeyCode::Char('i') => {
            if state.has_instructions() {
                state.panels.toggle_description();
            }
            KeyAction::Continue
        }
        KeyCode::Char('s') => {
            state.panels.toggle_settings();
            KeyAction::Continue
        }
        KeyCode::Char('t') if state.panels.showing_settings => {
            state.enable_tooltips = !state.enable_tooltips;
            KeyAction::Continue
        }

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }

        KeyCode::Esc => {
            if state.panels.showing_settings {
                state.panels.toggle_settings();
            } else if state.panels.showing_description {
                state.panels.toggle_description();
            } else {
                state.back_to_live();
            }
            KeyAction::Continue
        }

        KeyCode::Char('q') => {
            if state.draft_is_empty() {
                KeyAction::Quit
            } else {
                state.mode = Mode::ConfirmQuit;
                KeyAction::Continue
            }
        }

        _ => KeyAction::Continue,
    }
}

/// Region and edit-history keys. `None` when the key is not one of them.
fn handle_edit_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let is_edit = matches!(
        key.code,
        KeyCode::Char('a' | 'x' | 'u' | 'U')
    ) || (ctrl && key.code == KeyCode::Char('r'));
    if !is_edit {
        return None;
    }
    if state.is_locked() {
        state.set_status("annotation is locked");
        return Some(KeyAction::Continue);
    }

    let result = match key.code {
        KeyCode::Char('a') => {
            state.label_input.clear();
            state.mode = Mode::Label;
            return Some(KeyAction::Continue);
        }
        KeyCode::Char('x') => state.store.remove_last_region(),
        _ if !state.has_edit_history() => return Some(KeyAction::Continue),
        KeyCode::Char('r') => state.store.redo(),
        KeyCode::Char('u') => state.store.undo(),
        KeyCode::Char('U') => state.store.reset_history(),
        _ => return None,
    };
    if let Err(e) = result {
        state.set_error(e.to_string());
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Insert mode (comment box)
// ---------------------------------------------------------------------------

fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(hotkey) = hotkey_of(&key) {
        state.mode = Mode::Normal;
        return press_hotkey(hotkey, state);
    }
    match key.code {
        KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        KeyCode::Enter => {
            state.mode = Mode::Normal;
            if state.draft_is_empty() {
                KeyAction::Continue
            } else {
                KeyAction::Command(Command::CommitComment)
            }
        }
        KeyCode::Backspace => {
            state.comments.pop_char();
            KeyAction::Continue
        }
        KeyCode::Char(c) => {
            state.comments.push_char(c);
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Label mode (new region)
// ---------------------------------------------------------------------------

fn handle_label(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => {
            state.label_input.clear();
            state.mode = Mode::Normal;
        }
        KeyCode::Enter => {
            state.mode = Mode::Normal;
            let label = std::mem::take(&mut state.label_input);
            let label = label.trim();
            if !label.is_empty() {
                if let Err(e) = state.store.add_region(label) {
                    state.set_error(e.to_string());
                }
            }
        }
        KeyCode::Backspace => {
            state.label_input.pop();
        }
        KeyCode::Char(c) => state.label_input.push(c),
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

/// `?`, `Esc` or `q` dismisses the overlay; `j`/`k` scroll it.
fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
        }
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => {
            state.mode = Mode::Normal;
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// ConfirmQuit mode
// ---------------------------------------------------------------------------

/// `y` quits and drops the draft; `n` or `Esc` returns to Normal mode.
fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{TWO_ANNOTATIONS, state_from_seed};
    use crate::config::Config;
    use labelbar_core::controls::ActionId;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn chord(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            handle_key(press(KeyCode::Char(c)), state);
        }
    }

    #[tokio::test]
    async fn hotkeys_map_to_enabled_buttons() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        assert_eq!(
            handle_key(chord(KeyCode::Enter, KeyModifiers::CONTROL), &mut state),
            KeyAction::Command(Command::Press(ActionId::Submit))
        );
        assert_eq!(
            handle_key(press(KeyCode::Null), &mut state),
            KeyAction::Command(Command::Press(ActionId::Skip))
        );
        // No update button on a fresh draft.
        assert_eq!(
            handle_key(chord(KeyCode::Enter, KeyModifiers::ALT), &mut state),
            KeyAction::Continue
        );
    }

    #[tokio::test]
    async fn disabled_submit_ignores_ctrl_enter() {
        let config = Config {
            interfaces: [("annotations:deny-empty".to_owned(), true), ("submit".to_owned(), true)]
                .into_iter()
                .collect(),
            ..Config::default()
        };
        let mut state = state_from_seed(TWO_ANNOTATIONS, &config).await;
        assert_eq!(
            handle_key(chord(KeyCode::Enter, KeyModifiers::CONTROL), &mut state),
            KeyAction::Continue
        );
        // Adding a region enables it.
        handle_key(press(KeyCode::Char('a')), &mut state);
        assert_eq!(state.mode, Mode::Label);
        type_text(&mut state, "dog");
        handle_key(press(KeyCode::Enter), &mut state);
        assert_eq!(state.selected().unwrap().results.len(), 1);
        assert_eq!(
            handle_key(chord(KeyCode::Enter, KeyModifiers::CONTROL), &mut state),
            KeyAction::Command(Command::Press(ActionId::Submit))
        );
    }

    #[tokio::test]
    async fn comment_box_collects_draft_and_commits_on_enter() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        handle_key(press(KeyCode::Char('c')), &mut state);
        assert_eq!(state.mode, Mode::Insert);
        type_text(&mut state, "looks ok");
        handle_key(press(KeyCode::Backspace), &mut state);
        assert_eq!(state.comments.state().current_comment, "looks o");
        assert_eq!(
            handle_key(press(KeyCode::Enter), &mut state),
            KeyAction::Command(Command::CommitComment)
        );
        assert_eq!(state.mode, Mode::Normal);
    }

    #[tokio::test]
    async fn quit_asks_first_when_a_draft_exists() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Quit);

        state.comments.set_current_comment("unsent");
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::ConfirmQuit);
        handle_key(press(KeyCode::Char('n')), &mut state);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[tokio::test]
    async fn enter_presses_the_focused_button() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        handle_key(press(KeyCode::Char('l')), &mut state);
        assert_eq!(
            handle_key(press(KeyCode::Enter), &mut state),
            KeyAction::Command(Command::Press(ActionId::Submit))
        );
        handle_key(press(KeyCode::Left), &mut state);
        assert_eq!(
            handle_key(press(KeyCode::Enter), &mut state),
            KeyAction::Command(Command::Press(ActionId::Skip))
        );
    }

    #[tokio::test]
    async fn tab_switches_entity_and_reloads() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        assert_eq!(
            handle_key(press(KeyCode::Tab), &mut state),
            KeyAction::Command(Command::SelectionChanged)
        );
        assert_eq!(state.selected().unwrap().id, "model");
    }

    #[tokio::test]
    async fn tooltips_toggle_only_inside_settings() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        handle_key(press(KeyCode::Char('t')), &mut state);
        assert!(state.enable_tooltips);
        handle_key(press(KeyCode::Char('s')), &mut state);
        handle_key(press(KeyCode::Char('t')), &mut state);
        assert!(!state.enable_tooltips);
        handle_key(press(KeyCode::Esc), &mut state);
        assert!(!state.panels.showing_settings);
    }

    #[tokio::test]
    async fn undo_reverts_a_region() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        handle_key(press(KeyCode::Char('a')), &mut state);
        type_text(&mut state, "bird");
        handle_key(press(KeyCode::Enter), &mut state);
        handle_key(press(KeyCode::Char('u')), &mut state);
        assert!(state.selected().unwrap().results.is_empty());
        handle_key(chord(KeyCode::Char('r'), KeyModifiers::CONTROL), &mut state);
        assert_eq!(state.selected().unwrap().results.len(), 1);
    }

    #[tokio::test]
    async fn selection_holds_while_an_action_runs() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        let running = state.gate.latch().try_acquire().unwrap();
        for code in [KeyCode::Tab, KeyCode::BackTab, KeyCode::Char('['), KeyCode::Char(']')] {
            assert_eq!(handle_key(press(code), &mut state), KeyAction::Continue);
        }
        assert_eq!(state.selected().unwrap().id, "draft");
        assert_eq!(state.revision_cursor, None);
        assert!(state.status.is_some());

        drop(running);
        assert_eq!(
            handle_key(press(KeyCode::Tab), &mut state),
            KeyAction::Command(Command::SelectionChanged)
        );
        assert_eq!(state.selected().unwrap().id, "model");
    }

    #[tokio::test]
    async fn ground_truth_key_follows_the_capability() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        handle_key(press(KeyCode::Tab), &mut state);
        assert_eq!(
            handle_key(press(KeyCode::Char('g')), &mut state),
            KeyAction::Command(Command::ToggleGroundTruth)
        );

        let config = Config {
            interfaces: [("skip".to_owned(), true)].into_iter().collect(),
            ..Config::default()
        };
        let mut state = state_from_seed(TWO_ANNOTATIONS, &config).await;
        handle_key(press(KeyCode::Tab), &mut state);
        assert_eq!(state.selected().unwrap().id, "model");
        assert_eq!(handle_key(press(KeyCode::Char('g')), &mut state), KeyAction::Continue);
        assert!(!state.selected().unwrap().ground_truth);
    }

    #[tokio::test]
    async fn ground_truth_key_refused_on_a_revision() {
        use labelbar_core::dispatch::ActionDispatcher;

        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        handle_key(press(KeyCode::Tab), &mut state);
        state.store.pin("model").accept_annotation().await.unwrap();
        let revision = state.store.revisions().await.unwrap().into_iter().next();
        assert!(revision.is_some());
        state.store.select_revision(revision);

        assert_eq!(handle_key(press(KeyCode::Char('g')), &mut state), KeyAction::Continue);
        assert!(state.status.is_some());
    }
}
