use chrono::NaiveTime;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Format seconds as "HH:MM:SS". Negative values show as zero.
pub fn format_hms(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Format seconds as "MM:SS" for the iqamah countdown.
pub fn format_mm_ss(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Format a NaiveTime to "HH:MM"
pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Cut `text` to at most `width` terminal columns, ending with "…" when cut.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Create a simple block progress bar for a ratio in [0, 1]
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let ratio = ratio.clamp(0.0, 1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats() {
        assert_eq!(format_hms(3725), "01:02:05");
        assert_eq!(format_hms(-4), "00:00:00");
        assert_eq!(format_mm_ss(360), "06:00");
        assert_eq!(format_mm_ss(59), "00:59");
        assert_eq!(format_time(NaiveTime::from_hms_opt(4, 6, 59).unwrap()), "04:06");
    }

    #[test]
    fn truncation_respects_wide_chars() {
        assert_eq!(truncate_to_width("Kajian", 10), "Kajian");
        assert_eq!(truncate_to_width("Kajian rutin", 8), "Kajian …");
        // Each CJK char is two columns wide.
        assert_eq!(truncate_to_width("日本語テキスト", 6), "日本…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn progress_bar_is_clamped() {
        assert_eq!(progress_bar(0.5, 4), "██░░");
        assert_eq!(progress_bar(2.0, 3), "███");
        assert_eq!(progress_bar(-1.0, 2), "░░");
    }
}
