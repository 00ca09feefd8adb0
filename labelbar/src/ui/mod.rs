//! UI rendering module for labelbar.
//!
//! Re-exports `render()` as the single entry point called by the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`; each
//! panel has its own module.

mod bottom_bar;
mod comments;
mod entity;
pub mod help;
pub mod keybindings;
mod layout;

use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, render_status_bar};

/// Renders one complete frame: entity and comments panels, the review bar,
/// the status bar, and whichever overlay is open.
///
/// Called exactly once per `AppEvent::Render` inside `terminal.draw()`.
pub fn render(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let [entity_area, comments_area, bar_area, status_area] = compute_layout(frame);

    entity::render_entity(frame, entity_area, state, theme);
    comments::render_comments(frame, comments_area, state, theme);
    bottom_bar::render_bottom_bar(frame, bar_area, state, theme);
    render_status_bar(frame, status_area, state, theme);

    if state.panels.showing_description {
        help::render_description(frame, state, theme);
    }
    if state.panels.showing_settings {
        help::render_settings(frame, state, theme);
    }
    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::ConfirmQuit => help::render_confirm_quit(frame, theme),
        Mode::Label => entity::render_label_input(frame, entity_area, state, theme),
        Mode::Normal | Mode::Insert => {}
    }
}
