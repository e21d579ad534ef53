pub mod board;
pub mod prayer;

pub use board::{
    ConfigError, Event, IqamahOffsets, IqamahSettings, MosqueInfo, PrayerSettings, Verse,
};
pub use prayer::{parse_hhmm, DailySchedule, PrayerName, ScheduleError, ScheduleSource};
