use chrono::NaiveDateTime;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use tui_big_text::{BigText, PixelSize};

use crate::models::MosqueInfo;
use crate::tui::theme;
use crate::utils::format::truncate_to_width;
use crate::utils::hijri::HijriInfo;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    mosque: &MosqueInfo,
    now: NaiveDateTime,
    hijri: Option<&HijriInfo>,
    big_clock: bool,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::gold().add_modifier(Modifier::BOLD))
        .style(theme::base());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(35),
            Constraint::Percentage(30),
        ])
        .split(inner);

    let width = columns[0].width.saturating_sub(2) as usize;
    let identity = vec![
        Line::from(Span::styled(
            truncate_to_width(&mosque.name, width),
            theme::gold().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(truncate_to_width(&mosque.address, width), theme::dim())),
        Line::from(Span::styled(truncate_to_width(&mosque.contact, width), theme::dim())),
    ];
    frame.render_widget(Paragraph::new(identity), columns[0]);

    let clock = now.format("%H:%M:%S").to_string();
    if big_clock && columns[1].height >= 4 {
        let big = BigText::builder()
            .pixel_size(PixelSize::Quadrant)
            .style(theme::bold())
            .lines(vec![clock.into()])
            .alignment(Alignment::Center)
            .build();
        frame.render_widget(big, columns[1]);
    } else {
        let line = Line::from(Span::styled(clock, theme::bold()));
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), columns[1]);
    }

    let hijri_str = hijri.map(|h| h.formatted()).unwrap_or_else(|| "-".to_string());
    let dates = vec![
        Line::from(Span::styled(now.format("%A").to_string(), theme::bold())),
        Line::from(Span::styled(now.format("%d %B %Y").to_string(), theme::dim())),
        Line::from(Span::styled(hijri_str, theme::amber())),
    ];
    frame.render_widget(Paragraph::new(dates).alignment(Alignment::Right), columns[2]);
}
