//! The review bar: toolbar items on the left, action controls on the right.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use labelbar_core::controls::{Control, Look};
use labelbar_core::ground_truth;
use labelbar_core::toolbar::ToolbarItem;

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_bottom_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let controls = state.controls();
    let focused = state.focused_button();

    let mut block = panel_block("", false, theme);
    if state.enable_tooltips {
        if let Some(button) = focused.as_ref() {
            block = block.title_bottom(Line::styled(
                format!(" {} ", button.tooltip),
                Style::default().fg(theme.muted),
            ));
        }
    }
    frame.render_widget(block, area);

    let toolbar = Line::from(toolbar_spans(&state.toolbar(), state, theme));
    let width = toolbar.width() as u16;
    let [left, right] = inner_rect(area).layout(&Layout::horizontal([
        Constraint::Length(width),
        Constraint::Fill(1),
    ]));
    frame.render_widget(Paragraph::new(toolbar), left);

    let mut spans = Vec::new();
    for control in &controls {
        match control {
            Control::SkippedNotice => spans.push(Span::styled(
                " Was skipped ",
                Style::default()
                    .fg(theme.skipped_notice)
                    .add_modifier(Modifier::BOLD),
            )),
            Control::Button(spec) => {
                let fg = match spec.look {
                    _ if !spec.enabled => theme.button_disabled,
                    Look::Primary => theme.button_primary,
                    Look::Default => theme.button_default,
                    Look::Disabled => theme.button_disabled,
                };
                let mut style = Style::default().fg(fg);
                if spec.look == Look::Primary && spec.enabled {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if focused.as_ref().is_some_and(|f| f.id == spec.id) {
                    style = style.bg(theme.button_focus_bg);
                }
                spans.push(Span::styled(format!("[ {} ]", spec.label), style));
            }
        }
        spans.push(Span::raw(" "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(ratatui::layout::Alignment::Right),
        right,
    );
}

fn toolbar_spans(items: &[ToolbarItem], state: &AppState, theme: &Theme) -> Vec<Span<'static>> {
    let on = |active: bool| {
        Style::default().fg(if active { theme.button_primary } else { theme.button_default })
    };
    let dim = |enabled: bool| {
        Style::default().fg(if enabled { theme.button_default } else { theme.button_disabled })
    };

    let mut spans = Vec::new();
    for item in items {
        match *item {
            ToolbarItem::EditHistory { can_undo, can_redo } => {
                spans.push(Span::styled("↶ u", dim(can_undo)));
                spans.push(Span::raw(" "));
                spans.push(Span::styled("↷ ^r", dim(can_redo)));
                spans.push(Span::raw(" "));
                spans.push(Span::styled("⟲ U", dim(can_undo)));
            }
            ToolbarItem::Instructions { active } => spans.push(Span::styled("ⓘ i", on(active))),
            ToolbarItem::Settings => {
                spans.push(Span::styled("⚙ s", on(state.panels.showing_settings)));
            }
            ToolbarItem::GroundTruth { active } => {
                let (glyph, fg) = if active {
                    ("★", theme.star_active)
                } else {
                    ("☆", theme.star_inactive)
                };
                spans.push(Span::styled(format!("{glyph} g"), Style::default().fg(fg)));
                if state.enable_tooltips {
                    if let Some(annotation) = state.selected() {
                        spans.push(Span::styled(
                            format!(" {}", ground_truth::tooltip(&annotation)),
                            Style::default().fg(theme.muted),
                        ));
                    }
                }
            }
        }
        spans.push(Span::raw("  "));
    }
    spans
}
