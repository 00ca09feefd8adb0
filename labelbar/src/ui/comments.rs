//! Comments panel: the committed thread, the draft, and the gate's message.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_comments(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let editing = state.mode == Mode::Insert;
    frame.render_widget(panel_block(" Comments ", editing, theme), area);

    let comment_state = state.comments.state();
    let mut lines: Vec<Line> = state
        .comments
        .thread()
        .into_iter()
        .map(|c| Line::raw(format!("• {}", c.body)))
        .collect();

    if !lines.is_empty() {
        lines.push(Line::raw(""));
    }

    let cursor = if editing { "▏" } else { "" };
    if comment_state.current_comment.is_empty() && !editing {
        lines.push(Line::styled("  press c to comment", Style::default().fg(theme.muted)));
    } else {
        lines.push(Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.comment_draft)),
            Span::styled(
                format!("{}{cursor}", comment_state.current_comment),
                Style::default().fg(theme.comment_draft),
            ),
        ]));
    }

    if let Some(message) = &comment_state.tooltip_message {
        lines.push(Line::styled(
            format!("  {message}"),
            Style::default()
                .fg(theme.comment_tooltip)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let inner = inner_rect(area);
    // Keep the draft line in view when the thread is long.
    let overflow = wrapped_rows(&lines, inner.width).saturating_sub(inner.height);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .scroll((overflow, 0)),
        inner,
    );
}

/// Rows `lines` take when wrapped to `width` columns. Empty lines take one row.
fn wrapped_rows(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_lines_count_every_wrapped_row() {
        let lines = vec![
            Line::raw("x".repeat(25)),
            Line::raw(""),
            Line::raw("> draft"),
        ];
        assert_eq!(wrapped_rows(&lines, 10), 3 + 1 + 1);
        assert_eq!(wrapped_rows(&lines, 80), 3);
    }

    #[test]
    fn zero_width_does_not_divide_by_zero() {
        assert_eq!(wrapped_rows(&[Line::raw("abc")], 0), 3);
    }
}

