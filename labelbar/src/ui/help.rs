//! Modal overlays: help, task instructions, settings and quit confirmation.
//!
//! Each overlay is drawn inside the same `terminal.draw()` closure as the
//! panels. `frame.render_widget(Clear, area)` erases the background before the
//! bordered `Paragraph` is drawn.

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::app::AppState;
use crate::theme::Theme;

fn modal(frame: &mut Frame, area: Rect, title: &str, body: Text<'_>, scroll: u16, theme: &Theme) {
    frame.render_widget(Clear, area);
    let block = Block::bordered()
        .title(title)
        .border_style(Style::default().fg(theme.border_active));
    frame.render_widget(
        Paragraph::new(body)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        area,
    );
}

/// Renders the help overlay as a centred modal; skipped below 60 columns.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }
    let area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    modal(
        frame,
        area,
        " Help  (j/k scroll, ? or Esc to dismiss) ",
        build_help_text(),
        help_scroll,
        theme,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Review bar"),
        Line::from("  h / l         Move between buttons"),
        Line::from("  Enter         Press the focused button"),
        Line::from("  Ctrl+Space    Reject (review) / Skip"),
        Line::from("  Ctrl+Enter    Accept (review) / Submit"),
        Line::from("  Alt+Enter     Update"),
        Line::from(""),
        Line::from("Regions"),
        Line::from("  a             Add a region"),
        Line::from("  x             Remove the last region"),
        Line::from("  u / Ctrl+r    Undo / redo"),
        Line::from("  U             Reset to the last saved version"),
        Line::from(""),
        Line::from("Comments"),
        Line::from("  c             Write a comment (Enter saves, Esc leaves)"),
        Line::from(""),
        Line::from("Task"),
        Line::from("  Tab / S-Tab   Next / previous annotation"),
        Line::from("  [ / ]         Older / newer revision"),
        Line::from("  Esc           Back to the live annotation"),
        Line::from("  v             View all annotations"),
        Line::from("  g             Toggle ground truth"),
        Line::from("  i             Show instructions"),
        Line::from("  s             Settings"),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q             Quit (confirms if a draft comment exists)"),
    ])
}

pub fn render_description(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let Some(description) = state.store.snapshot().description else {
        return;
    };
    let area = frame
        .area()
        .centered(Constraint::Percentage(70), Constraint::Percentage(50));
    modal(frame, area, " Instructions (i to close) ", Text::from(description), 0, theme);
}

pub fn render_settings(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let area = frame
        .area()
        .centered(Constraint::Length(44), Constraint::Length(7));
    let check = |on: bool| if on { "[x]" } else { "[ ]" };
    let body = Text::from(vec![
        Line::from(format!("  {} Show tooltips            t", check(state.enable_tooltips))),
        Line::from(format!("  {} Review mode", check(state.context().is_review()))),
        Line::from(format!("  {} Explore mode", check(state.explore))),
        Line::from(""),
        Line::from("  s or Esc to close"),
    ]);
    modal(frame, area, " Settings ", body, 0, theme);
}

pub fn render_confirm_quit(frame: &mut Frame, theme: &Theme) {
    let area = frame
        .area()
        .centered(Constraint::Length(44), Constraint::Length(5));
    let body = Text::from(vec![
        Line::from("  The draft comment is not saved."),
        Line::from("  Quit anyway?  y / n"),
    ]);
    modal(frame, area, " Quit ", body, 0, theme);
}
