use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use tui_big_text::{BigText, PixelSize};

use crate::prayer_times::IqamahWindow;
use crate::tui::theme;
use crate::utils::format::{format_mm_ss, format_time, progress_bar};

/// Full-screen iqamah countdown. A due window shows the terminal
/// "IQAMAH" state instead of the clock.
pub fn render(frame: &mut Frame, area: Rect, window: &IqamahWindow) {
    let border = if window.is_due() { theme::emerald() } else { theme::gold() };
    let block = Block::default()
        .title(Span::styled(
            format!(" Iqamah {} ", window.prayer.display_name()),
            theme::gold().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .style(theme::base());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Min(8),    // countdown
            Constraint::Length(2), // times
            Constraint::Length(2), // progress
        ])
        .split(inner);

    let heading = if window.is_due() {
        Line::from(Span::styled("It is time for iqamah", theme::emerald().add_modifier(Modifier::BOLD)))
    } else {
        Line::from(vec![
            Span::styled(window.prayer.display_name().to_uppercase(), theme::gold().add_modifier(Modifier::BOLD)),
            Span::styled("  ·  iqamah at ", theme::dim()),
            Span::styled(format_time(window.iqamah_at), theme::bold()),
        ])
    };
    frame.render_widget(Paragraph::new(heading).alignment(Alignment::Center), rows[0]);

    let big_line = if window.is_due() {
        "IQAMAH".to_string()
    } else {
        format_mm_ss(window.seconds_remaining)
    };
    let style = if window.is_due() {
        theme::emerald().add_modifier(Modifier::BOLD)
    } else {
        theme::amber().add_modifier(Modifier::BOLD)
    };
    let big = BigText::builder()
        .pixel_size(PixelSize::Full)
        .style(style)
        .lines(vec![big_line.into()])
        .alignment(Alignment::Center)
        .build();
    frame.render_widget(big, rows[1]);

    let times = Line::from(vec![
        Span::styled("adhan ", theme::dim()),
        Span::styled(format_time(window.adhan_at), theme::bold()),
        Span::styled("   iqamah ", theme::dim()),
        Span::styled(format_time(window.iqamah_at), theme::bold()),
        Span::styled(format!("   (+{} min)", window.offset_minutes), theme::dim()),
    ]);
    frame.render_widget(Paragraph::new(times).alignment(Alignment::Center), rows[2]);

    let width = (rows[3].width as usize).saturating_sub(8).min(60);
    let bar = Line::from(vec![
        Span::styled(progress_bar(window.progress(), width), theme::emerald()),
        Span::styled(format!(" {:>3.0}%", window.progress() * 100.0), theme::dim()),
    ]);
    frame.render_widget(Paragraph::new(bar).alignment(Alignment::Center), rows[3]);
}
