use anyhow::Error;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

/// Page background and card colors of the dark dashboard theme.
pub(crate) const BACKGROUND: Color = Color::Rgb(0x0e, 0x11, 0x17);
pub(crate) const CARD: Color = Color::Rgb(0x11, 0x13, 0x18);
const HEADER_BLUE: Color = Color::Rgb(0x0b, 0x57, 0xa4);
const OVERDUE_RED: Color = Color::Rgb(0x8b, 0x1a, 0x1a);

/// Style for the loan table header row.
pub(crate) fn header_style() -> Style {
    Style::default()
        .bg(HEADER_BLUE)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

/// Style applied to whole rows whose return date has passed.
pub(crate) fn overdue_style() -> Style {
    Style::default().bg(OVERDUE_RED).fg(Color::White)
}

/// One of the four counters at the top of the dashboard.
pub(crate) fn stat_card(label: &str, value: String) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(Span::styled(
            value,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            label.to_string(),
            Style::default().fg(Color::Gray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .style(Style::default().bg(CARD)),
    )
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
