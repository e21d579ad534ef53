use ratatui::{
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use crate::models::{Event, Verse};
use crate::tui::theme;
use crate::utils::format::truncate_to_width;

fn card(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(format!(" {} ", title), theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::surface())
}

fn empty(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let paragraph = Paragraph::new(Line::from(Span::styled(message.to_string(), theme::dim())))
        .block(card(title))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn position(index: usize, total: usize) -> Line<'static> {
    Line::from(Span::styled(format!("{}/{}", index + 1, total), theme::dim())).alignment(Alignment::Right)
}

/// Single-line banner; long text is cut to the banner width.
pub fn announcement(frame: &mut Frame, area: Rect, items: &[String], index: usize) {
    let Some(text) = items.get(index) else {
        return empty(frame, area, "Announcements", "No announcements");
    };
    let width = area.width.saturating_sub(4) as usize;
    let line = Line::from(Span::styled(truncate_to_width(text, width), theme::bold()));
    let block = card("Announcements").title_bottom(position(index, items.len()));
    frame.render_widget(Paragraph::new(line).block(block).alignment(Alignment::Center), area);
}

pub fn verse(frame: &mut Frame, area: Rect, items: &[Verse], index: usize) {
    let Some(verse) = items.get(index) else {
        return empty(frame, area, "Verse", "No verses");
    };
    let lines = vec![
        Line::from(Span::styled(verse.arabic.clone(), theme::gold().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled(format!("\"{}\"", verse.translation), theme::base())),
        Line::from(Span::styled(format!("({})", verse.reference), theme::dim())),
    ];
    let block = card("Verse").title_bottom(position(index, items.len()));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

pub fn event(frame: &mut Frame, area: Rect, items: &[Event], index: usize) {
    let Some(event) = items.get(index) else {
        return empty(frame, area, "Events", "No upcoming events");
    };
    let mut lines = vec![
        Line::from(Span::styled(event.title.clone(), theme::bold())),
        Line::from(vec![
            Span::styled("  date  ", theme::dim()),
            Span::styled(format!("{}  {}", event.date, event.time), theme::amber()),
        ]),
        Line::from(vec![
            Span::styled("  place ", theme::dim()),
            Span::styled(event.location.clone(), theme::base()),
        ]),
    ];
    if !event.description.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(event.description.clone(), theme::dim())));
    }
    let block = card("Events").title_bottom(position(index, items.len()));
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}
