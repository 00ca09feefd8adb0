//! Responsive layout engine for labelbar.
//!
//! Pure layout arithmetic: no mutable application state lives here. Called
//! inside `terminal.draw()` on every render so every frame gets a fresh layout
//! that reflects the current terminal size.
//!
//! # Panel geometry
//!
//! At `>= 100` columns the entity panel and the comments panel sit side by
//! side (65 / 35). Narrower terminals stack them. The bottom bar (3 rows) and
//! the status bar (1 row) always span the full width.
//!
//! `Spacing::Overlap(1)` combined with `Block::merge_borders(MergeStrategy::Fuzzy)`
//! makes adjacent panel borders share a single column.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

/// Returns `[entity, comments, bottom_bar, status_bar]` for the current frame.
pub fn compute_layout(frame: &Frame) -> [Rect; 4] {
    let area = frame.area();

    let [main_area, bottom_bar, status_bar] = area.layout(&Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ]));

    let split = if area.width >= 100 {
        Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
    } else {
        Layout::vertical([Constraint::Fill(1), Constraint::Length(8)])
    };
    let [entity, comments] = main_area.layout(&split.spacing(Spacing::Overlap(1)));

    [entity, comments, bottom_bar, status_bar]
}

/// The inner `Rect` of a panel after removing the 1-cell border on each side.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Builds a bordered `Block` for a panel.
///
/// `BorderType::Thick` marks the panel that receives typed input; the rest are
/// `Plain`. `MergeStrategy::Fuzzy` is used because `Exact` produces incorrect
/// junctions when mixing `Thick` and `Plain` borders.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the 1-row status bar: mode indicator, task position, and the
/// transient status message if one is set.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" COMMENT ", theme.status_mode_insert),
        Mode::Label => (" LABEL ", theme.status_mode_insert),
        Mode::Normal | Mode::ConfirmQuit | Mode::HelpOverlay => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };

    let task = state.store.snapshot();
    let position = format!(
        " {} [{}/{}] ",
        task.id,
        (task.selected + 1).min(task.annotations.len()),
        task.annotations.len()
    );

    let mut spans = vec![
        Span::styled(mode_text, Style::default().fg(mode_fg).add_modifier(Modifier::BOLD)),
        Span::raw(position),
    ];
    if state.gate.is_in_progress() {
        spans.push(Span::raw(" working… "));
    }
    if let Some(status) = &state.status {
        let style = if status.is_error {
            Style::default().fg(theme.status_error)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {} ", status.text), style));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
