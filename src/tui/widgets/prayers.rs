use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem},
    Frame,
};

use crate::models::{DailySchedule, IqamahOffsets, ScheduleSource};
use crate::prayer_times::window::window_for;
use crate::prayer_times::Classification;
use crate::tui::theme;
use crate::utils::format::{format_hms, format_time};

pub fn render(
    frame: &mut Frame,
    area: Rect,
    schedule: &DailySchedule,
    offsets: &IqamahOffsets,
    classification: &Classification,
    next_in_secs: i64,
    source: ScheduleSource,
) {
    let title = match source {
        ScheduleSource::Provider => " Prayer Times ".to_string(),
        other => format!(" Prayer Times ({}) ", other.as_str()),
    };
    let block = Block::default()
        .title(Span::styled(title, theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::surface());

    let highlighted = classification.highlighted();

    let items: Vec<ListItem> = schedule
        .entries()
        .into_iter()
        .map(|(prayer, time)| {
            let is_current = highlighted == Some(prayer);
            let is_next = classification.next == prayer;

            let iqamah = window_for(prayer, time, schedule, offsets)
                .map(|w| format!("iqamah {}", format_time(w.iqamah_at)))
                .unwrap_or_default();

            let marker = if is_next {
                Span::styled(
                    format!("  ▸ {}", format_hms(next_in_secs)),
                    theme::amber().add_modifier(Modifier::BOLD),
                )
            } else if is_current {
                Span::styled("  ● now", theme::emerald())
            } else {
                Span::raw("")
            };

            let name_style = if prayer.is_prayer() { theme::bold() } else { theme::dim() };
            let line = Line::from(vec![
                Span::styled(format!("  {:<9}", prayer.display_name()), name_style),
                Span::styled(format!("{:<7}", format_time(time)), theme::gold()),
                Span::styled(format!("{:<14}", iqamah), theme::dim()),
                marker,
            ]);

            let item = ListItem::new(line);
            if is_current { item.style(theme::highlighted_row()) } else { item }
        })
        .collect();

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}
