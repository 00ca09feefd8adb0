//! Entity panel: the selected annotation's regions, or a historical revision.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use labelbar_core::ground_truth;
use labelbar_core::types::{Annotation, EntityKind, Revision};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_entity(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let task = state.store.snapshot();
    let Some(annotation) = task.selected() else {
        let block = panel_block(" (no annotations) ", false, theme);
        frame.render_widget(block, area);
        return;
    };

    let title = title_line(annotation, state, theme);
    frame.render_widget(panel_block(title, false, theme), area);

    let text = match state.store.selected_revision() {
        Some(revision) => revision_text(&revision, theme),
        None if state.viewing_all => all_entities_text(&task.annotations, task.selected, theme),
        None => regions_text(annotation, theme),
    };
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner_rect(area));
}

fn title_line<'a>(annotation: &Annotation, state: &AppState, theme: &Theme) -> Line<'a> {
    let kind = match annotation.kind {
        EntityKind::Annotation => "annotation",
        EntityKind::Prediction => "prediction",
    };
    let mut spans = vec![Span::raw(format!(
        " {kind} {} · {} ",
        annotation.id,
        annotation.state.as_str()
    ))];
    if !annotation.editable {
        spans.push(Span::styled("read-only ", Style::default().fg(theme.muted)));
    }
    if let Some(i) = state.revision_cursor {
        spans.push(Span::styled(
            format!("revision {}/{} ", i + 1, state.revisions.len()),
            Style::default().fg(theme.status_mode_insert),
        ));
    }
    if ground_truth::is_visible(annotation) && annotation.ground_truth {
        spans.push(Span::styled("★ ", Style::default().fg(theme.star_active)));
    }
    Line::from(spans)
}

fn regions_text(annotation: &Annotation, theme: &Theme) -> Text<'static> {
    if annotation.results.is_empty() {
        return Text::from(Line::styled(
            "  No regions. Press a to add one.",
            Style::default().fg(theme.muted),
        ));
    }
    annotation
        .results
        .iter()
        .enumerate()
        .map(|(i, region)| {
            Line::from(vec![
                Span::styled(format!("{:>3}  ", i + 1), Style::default().fg(theme.muted)),
                Span::styled(region.label.clone(), Style::default().fg(theme.region_label)),
            ])
        })
        .collect::<Vec<_>>()
        .into()
}

fn revision_text(revision: &Revision, theme: &Theme) -> Text<'static> {
    let mut lines = vec![Line::styled(
        format!("  {} at {}", revision.action.as_str(), revision.created_at),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(reason) = &revision.reason {
        lines.push(Line::styled(format!("  reason: {reason}"), Style::default().fg(theme.muted)));
    }
    lines.push(Line::raw(""));
    lines.extend(revision.labels.iter().enumerate().map(|(i, label)| {
        Line::from(vec![
            Span::styled(format!("{:>3}  ", i + 1), Style::default().fg(theme.muted)),
            Span::styled(label.clone(), Style::default().fg(theme.region_label)),
        ])
    }));
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "  Esc returns to the live annotation",
        Style::default().fg(theme.muted),
    ));
    Text::from(lines)
}

/// One line per entity of the task, the selected one marked.
fn all_entities_text(annotations: &[Annotation], selected: usize, theme: &Theme) -> Text<'static> {
    annotations
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let marker = if i == selected { "▶ " } else { "  " };
            let labels: Vec<&str> = a.results.iter().map(|r| r.label.as_str()).collect();
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{} ", a.id), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!("({}) ", a.kind.as_str()), Style::default().fg(theme.muted)),
                Span::raw(labels.join(", ")),
            ])
        })
        .collect::<Vec<_>>()
        .into()
}

/// Draws the new-region prompt over the last rows of the entity panel.
pub fn render_label_input(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let inner = inner_rect(area);
    if inner.height < 3 {
        return;
    }
    let prompt = Rect {
        y: inner.y + inner.height - 3,
        height: 3,
        ..inner
    };
    frame.render_widget(ratatui::widgets::Clear, prompt);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(state.label_input.clone()),
            Span::styled("▏", Style::default().fg(theme.comment_draft)),
        ]))
        .block(panel_block(" New region (Enter adds, Esc cancels) ", true, theme)),
        prompt,
    );
}
