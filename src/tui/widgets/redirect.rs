use ratatui::{
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::models::PrayerName;
use crate::tui::theme;

pub fn render(frame: &mut Frame, prayer: PrayerName, seconds: i64) {
    let area = frame.area();
    let width = 44.min(area.width);
    let height = 9.min(area.height);
    let popup_area = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup_area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Iqamah {} is about to begin", prayer.display_name()),
            theme::bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            seconds.max(0).to_string(),
            theme::emerald().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Enter]", theme::gold()),
            Span::styled(" go now   ", theme::dim()),
            Span::styled("[c]", theme::gold()),
            Span::styled(" cancel", theme::dim()),
        ]),
    ];

    let block = Block::default()
        .title(Span::styled(" Iqamah ", theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::emerald())
        .style(theme::surface());

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, popup_area);
}
