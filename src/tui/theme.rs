use ratatui::style::{Color, Modifier, Style};

pub const BG: Color = Color::Rgb(10, 22, 18);
pub const SURFACE: Color = Color::Rgb(16, 34, 28);
pub const BORDER: Color = Color::Rgb(40, 74, 60);
pub const TEXT: Color = Color::Rgb(226, 232, 224);
pub const TEXT_DIM: Color = Color::Rgb(124, 146, 134);
pub const GOLD: Color = Color::Rgb(212, 175, 55);
pub const EMERALD: Color = Color::Rgb(16, 185, 129);
pub const AMBER: Color = Color::Rgb(226, 148, 58);
pub const HIGHLIGHT: Color = Color::Rgb(6, 95, 70);

pub fn base() -> Style {
    Style::default().fg(TEXT).bg(BG)
}

pub fn dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub fn gold() -> Style {
    Style::default().fg(GOLD)
}

pub fn emerald() -> Style {
    Style::default().fg(EMERALD)
}

pub fn amber() -> Style {
    Style::default().fg(AMBER)
}

pub fn bold() -> Style {
    Style::default().fg(TEXT).add_modifier(Modifier::BOLD)
}

pub fn surface() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub fn border() -> Style {
    Style::default().fg(BORDER)
}

/// Row style for the prayer currently in progress.
pub fn highlighted_row() -> Style {
    Style::default()
        .fg(TEXT)
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}
