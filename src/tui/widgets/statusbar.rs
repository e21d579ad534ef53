use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::theme;

pub fn render(frame: &mut Frame, area: Rect, on_iqamah_screen: bool, notice: Option<&str>) {
    let hints: &[(&str, &str)] = if on_iqamah_screen {
        &[("[b]", " board  "), ("[r]", " refresh  "), ("[Esc]", " quit")]
    } else {
        &[("[i]", " iqamah  "), ("[r]", " refresh  "), ("[Esc]", " quit")]
    };

    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(*key, theme::gold()));
        spans.push(Span::styled(*label, theme::dim()));
    }
    if let Some(notice) = notice {
        spans.push(Span::styled("  ·  ", theme::dim()));
        spans.push(Span::styled(notice.to_string(), theme::amber()));
    }

    let line = Line::from(spans);
    let paragraph = Paragraph::new(line).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
