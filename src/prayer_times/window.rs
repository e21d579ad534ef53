//! Current/next prayer and iqamah window arithmetic.
//!
//! Everything here is a pure function of the wall-clock time, today's
//! schedule and the iqamah offsets. Timers and screen changes belong to the
//! display loop.

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::models::prayer::{minute_of_day, DailySchedule, PrayerName};
use crate::models::IqamahOffsets;

const MINUTES_PER_DAY: i64 = 24 * 60;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IqamahWindow {
    pub prayer: PrayerName,
    pub adhan_at: NaiveTime,
    pub iqamah_at: NaiveTime,
    pub offset_minutes: u32,
    /// Floored at 0; 0 means iqamah is now.
    pub seconds_remaining: i64,
}

impl IqamahWindow {
    pub fn is_due(&self) -> bool {
        self.seconds_remaining == 0
    }

    /// True when `now` is past midnight but the window opened before it.
    pub fn began_yesterday(&self, now: NaiveTime) -> bool {
        minute_of_day(now) < minute_of_day(self.adhan_at)
    }

    /// Fraction of the waiting period already elapsed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        let total = (self.offset_minutes as i64 * 60).max(1) as f64;
        (1.0 - self.seconds_remaining as f64 / total).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub current: PrayerName,
    pub next: PrayerName,
    pub iqamah: Option<IqamahWindow>,
}

impl Classification {
    /// The event the board should highlight. Sunrise is never highlighted
    /// even while it is the current segment.
    pub fn highlighted(&self) -> Option<PrayerName> {
        if self.current.is_prayer() {
            Some(self.current)
        } else {
            None
        }
    }

    pub fn iqamah_active(&self) -> bool {
        self.iqamah.is_some()
    }
}

/// Classify `now` against today's schedule.
///
/// Segments are left-inclusive: at exactly a prayer's minute that prayer is
/// current. Anything not covered by a daytime segment is the night segment,
/// attributed to Isha with Fajr next.
pub fn classify(now: NaiveTime, schedule: &DailySchedule, offsets: &IqamahOffsets) -> Classification {
    let now_min = minute_of_day(now);
    let entries = schedule.entries();

    let mut segment = None;
    for i in 0..entries.len() {
        let (name, start) = entries[i];
        let (next_name, end) = entries[(i + 1) % entries.len()];
        let (start, end) = (minute_of_day(start), minute_of_day(end));
        let inside = if start <= end {
            now_min >= start && now_min < end
        } else {
            now_min >= start || now_min < end
        };
        if inside {
            segment = Some((name, next_name));
            break;
        }
    }
    let (current, next) = segment.unwrap_or((PrayerName::Isha, PrayerName::Fajr));

    let iqamah = PrayerName::prayers()
        .into_iter()
        .filter_map(|prayer| window_for(prayer, now, schedule, offsets))
        .find(|w| contains(w, now));

    Classification { current, next, iqamah }
}

/// Measure a window that crossed midnight against the schedule it started
/// on. `classify` only sees today's schedule and approximates such a window
/// from today's Isha.
pub fn carry_over(
    mut classification: Classification,
    now: NaiveTime,
    yesterday: &DailySchedule,
    offsets: &IqamahOffsets,
) -> Classification {
    if classification.iqamah.is_some_and(|w| w.began_yesterday(now)) {
        classification.iqamah = None;
    }
    if classification.iqamah.is_none() {
        classification.iqamah = PrayerName::prayers()
            .into_iter()
            .filter_map(|prayer| window_for(prayer, now, yesterday, offsets))
            .find(|w| contains(w, now) && w.began_yesterday(now));
    }
    classification
}

/// The iqamah window of `prayer`, whether or not `now` lies inside it.
/// `None` for Sunrise.
pub fn window_for(
    prayer: PrayerName,
    now: NaiveTime,
    schedule: &DailySchedule,
    offsets: &IqamahOffsets,
) -> Option<IqamahWindow> {
    let offset = offsets.get(prayer)?;
    let adhan_at = schedule.time_of(prayer);
    let start = minute_of_day(adhan_at);
    let iqamah_min = start + offset as i64;

    let secs = seconds_to_minute(now, start, iqamah_min);

    Some(IqamahWindow {
        prayer,
        adhan_at,
        iqamah_at: time_from_minutes(iqamah_min),
        offset_minutes: offset,
        seconds_remaining: secs.max(0),
    })
}

/// Auto-redirect trigger: the prayer whose iqamah is more than 0 and at most
/// `delay_secs` seconds away.
pub fn redirect_countdown(
    now: NaiveTime,
    schedule: &DailySchedule,
    offsets: &IqamahOffsets,
    delay_secs: u32,
) -> Option<(PrayerName, i64)> {
    PrayerName::prayers().into_iter().find_map(|prayer| {
        let offset = offsets.get(prayer)? as i64;
        let start = minute_of_day(schedule.time_of(prayer));
        let secs = seconds_to_minute(now, start, start + offset);
        (secs > 0 && secs <= delay_secs as i64).then_some((prayer, secs))
    })
}

/// Seconds until the next occurrence of `target`. A target at or before
/// `now` is taken to be tomorrow's.
pub fn seconds_until(now: NaiveTime, target: NaiveTime) -> i64 {
    let diff = target.num_seconds_from_midnight() as i64 - now.num_seconds_from_midnight() as i64;
    if diff <= 0 { diff + SECONDS_PER_DAY } else { diff }
}

fn contains(window: &IqamahWindow, now: NaiveTime) -> bool {
    let start = minute_of_day(window.adhan_at);
    let end = start + window.offset_minutes as i64;
    let now_min = unwrap_past_midnight(minute_of_day(now), start, end);
    now_min >= start && now_min <= end
}

/// Signed seconds from `now` until the start of `target_min`.
fn seconds_to_minute(now: NaiveTime, start_min: i64, target_min: i64) -> i64 {
    let now_min = unwrap_past_midnight(minute_of_day(now), start_min, target_min);
    (target_min - now_min) * 60 - now.second() as i64
}

/// A window that starts before midnight and ends after it is measured on
/// yesterday's clock: 00:03 is minute 1443 of a 23:55..00:05 window.
fn unwrap_past_midnight(now_min: i64, start_min: i64, end_min: i64) -> i64 {
    if end_min >= MINUTES_PER_DAY && now_min < start_min && now_min + MINUTES_PER_DAY <= end_min {
        now_min + MINUTES_PER_DAY
    } else {
        now_min
    }
}

fn time_from_minutes(minutes: i64) -> NaiveTime {
    let m = minutes.rem_euclid(MINUTES_PER_DAY) as u32;
    NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IqamahPhase {
    Idle,
    Counting(IqamahWindow),
    /// `first` is true on the first observation of this window's iqamah.
    Now { window: IqamahWindow, first: bool },
}

/// Turns successive classifications into phases, reporting the arrival of
/// each iqamah exactly once.
#[derive(Debug, Default)]
pub struct IqamahTracker {
    completed: Option<(NaiveDate, PrayerName)>,
}

impl IqamahTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, today: NaiveDate, classification: &Classification) -> IqamahPhase {
        match classification.iqamah {
            None => IqamahPhase::Idle,
            Some(window) if !window.is_due() => IqamahPhase::Counting(window),
            Some(window) => {
                let key = (today, window.prayer);
                let first = self.completed != Some(key);
                self.completed = Some(key);
                IqamahPhase::Now { window, first }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn fajr_ten() -> IqamahOffsets {
        IqamahOffsets::default()
    }

    #[test]
    fn example_fajr_window() {
        let schedule = DailySchedule::default();
        let offsets = fajr_ten();

        let c = classify(at(4, 30, 0), &schedule, &offsets);
        assert_eq!(c.current, PrayerName::Fajr);
        assert_eq!(c.next, PrayerName::Sunrise);
        let w = c.iqamah.expect("inside fajr window");
        assert_eq!(w.prayer, PrayerName::Fajr);
        assert_eq!(w.seconds_remaining, 360);
        assert_eq!(w.iqamah_at, at(4, 36, 0));

        let c = classify(at(4, 36, 0), &schedule, &offsets);
        let w = c.iqamah.expect("iqamah minute is still in the window");
        assert_eq!(w.seconds_remaining, 0);
        assert!(w.is_due());

        let c = classify(at(4, 37, 0), &schedule, &offsets);
        assert!(!c.iqamah_active());
    }

    #[test]
    fn boundary_minute_belongs_to_the_new_prayer() {
        let schedule = DailySchedule::default();
        let c = classify(at(12, 3, 0), &schedule, &fajr_ten());
        assert_eq!(c.current, PrayerName::Dhuhr);
        assert_eq!(c.next, PrayerName::Asr);

        let c = classify(at(12, 2, 59), &schedule, &fajr_ten());
        assert_eq!(c.current, PrayerName::Sunrise);
        assert_eq!(c.next, PrayerName::Dhuhr);
    }

    #[test]
    fn night_attributes_to_isha_then_fajr() {
        let schedule = DailySchedule::default();
        for t in [at(0, 0, 0), at(3, 0, 0), at(4, 25, 59), at(18, 59, 0), at(23, 59, 59)] {
            let c = classify(t, &schedule, &fajr_ten());
            assert_eq!((c.current, c.next), (PrayerName::Isha, PrayerName::Fajr), "at {t}");
        }
    }

    #[test]
    fn next_always_follows_current() {
        let schedule = DailySchedule::default();
        for minute in 0..(24 * 60) {
            let t = at(minute / 60, minute % 60, 30);
            let c = classify(t, &schedule, &fajr_ten());
            assert_eq!(c.next, c.current.following(), "at {t}");
        }
    }

    #[test]
    fn sunrise_is_current_but_not_highlighted() {
        let c = classify(at(9, 0, 0), &DailySchedule::default(), &fajr_ten());
        assert_eq!(c.current, PrayerName::Sunrise);
        assert_eq!(c.next, PrayerName::Dhuhr);
        assert_eq!(c.highlighted(), None);

        let c = classify(at(13, 0, 0), &DailySchedule::default(), &fajr_ten());
        assert_eq!(c.highlighted(), Some(PrayerName::Dhuhr));
    }

    #[test]
    fn isha_after_midnight_still_leaves_maghrib_current_before_it() {
        let schedule = DailySchedule::from_hhmm(["02:10", "03:40", "13:20", "17:45", "22:30", "00:40"]).unwrap();
        let c = classify(at(23, 30, 0), &schedule, &fajr_ten());
        assert_eq!((c.current, c.next), (PrayerName::Maghrib, PrayerName::Isha));
        let c = classify(at(1, 0, 0), &schedule, &fajr_ten());
        assert_eq!((c.current, c.next), (PrayerName::Isha, PrayerName::Fajr));
    }

    #[test]
    fn seconds_to_iqamah_strictly_decrease_then_hit_zero() {
        let schedule = DailySchedule::default();
        let mut offsets = fajr_ten();
        offsets.set(PrayerName::Asr, 15).unwrap();

        let mut previous = i64::MAX;
        let start = at(15, 3, 0).num_seconds_from_midnight();
        for s in (0..15 * 60).step_by(7) {
            let t = NaiveTime::from_num_seconds_from_midnight_opt(start + s, 0).unwrap();
            let w = classify(t, &schedule, &offsets).iqamah.unwrap();
            assert_eq!(w.prayer, PrayerName::Asr);
            assert!(w.seconds_remaining < previous);
            previous = w.seconds_remaining;
        }
        let w = classify(at(15, 18, 0), &schedule, &offsets).iqamah.unwrap();
        assert_eq!(w.seconds_remaining, 0);
    }

    #[test]
    fn at_most_one_window_with_valid_offsets() {
        let schedule = DailySchedule::default();
        let offsets = IqamahOffsets { fajr: 60, dhuhr: 60, asr: 60, maghrib: 60, isha: 60 };
        assert!(offsets.overlaps(&schedule).is_empty());
        for minute in 0..(24 * 60) {
            let t = at(minute / 60, minute % 60, 0);
            let active: Vec<_> = PrayerName::prayers()
                .into_iter()
                .filter_map(|p| window_for(p, t, &schedule, &offsets))
                .filter(|w| contains(w, t))
                .collect();
            assert!(active.len() <= 1, "{} windows at {t}", active.len());
        }
    }

    #[test]
    fn window_across_midnight() {
        let schedule = DailySchedule::from_hhmm(["03:00", "04:30", "12:00", "15:00", "21:00", "23:55"]).unwrap();
        let offsets = fajr_ten();
        let w = classify(at(0, 3, 0), &schedule, &offsets).iqamah.expect("still waiting for isha iqamah");
        assert_eq!(w.prayer, PrayerName::Isha);
        assert_eq!(w.iqamah_at, at(0, 5, 0));
        assert_eq!(w.seconds_remaining, 120);
        assert!(classify(at(0, 6, 0), &schedule, &offsets).iqamah.is_none());
    }

    #[test]
    fn redirect_fires_only_inside_the_delay() {
        let schedule = DailySchedule::default();
        let offsets = fajr_ten();
        assert_eq!(redirect_countdown(at(4, 35, 50), &schedule, &offsets, 5), None);
        assert_eq!(
            redirect_countdown(at(4, 35, 56), &schedule, &offsets, 5),
            Some((PrayerName::Fajr, 4))
        );
        assert_eq!(redirect_countdown(at(4, 36, 0), &schedule, &offsets, 5), None);
    }

    #[test]
    fn window_past_midnight_is_measured_from_yesterday() {
        let yesterday =
            DailySchedule::from_hhmm(["04:26", "05:50", "12:03", "15:03", "17:58", "23:55"]).unwrap();
        let today =
            DailySchedule::from_hhmm(["04:26", "05:50", "12:03", "15:03", "17:58", "23:58"]).unwrap();
        let offsets = fajr_ten();

        let c = carry_over(classify(at(0, 3, 0), &today, &offsets), at(0, 3, 0), &yesterday, &offsets);
        let w = c.iqamah.expect("yesterday's isha window is still open");
        assert_eq!(w.iqamah_at, at(0, 5, 0));
        assert_eq!(w.seconds_remaining, 120);

        let c = carry_over(classify(at(0, 6, 0), &today, &offsets), at(0, 6, 0), &yesterday, &offsets);
        assert!(!c.iqamah_active());

        // Before midnight today's own windows are untouched.
        let c = carry_over(classify(at(4, 30, 0), &today, &offsets), at(4, 30, 0), &yesterday, &offsets);
        assert_eq!(c.iqamah.unwrap().prayer, PrayerName::Fajr);
        let c = carry_over(classify(at(23, 59, 0), &today, &offsets), at(23, 59, 0), &yesterday, &offsets);
        assert_eq!(c.iqamah.unwrap().iqamah_at, at(0, 8, 0));
    }

    #[test]
    fn seconds_until_rolls_over_to_tomorrow() {
        assert_eq!(seconds_until(at(4, 0, 0), at(4, 26, 0)), 26 * 60);
        assert_eq!(seconds_until(at(4, 26, 0), at(4, 26, 0)), SECONDS_PER_DAY);
        assert_eq!(seconds_until(at(23, 0, 0), at(4, 26, 0)), 5 * 3600 + 26 * 60);
    }

    #[test]
    fn explicit_window_outside_its_time() {
        let w = window_for(PrayerName::Maghrib, at(17, 0, 0), &DailySchedule::default(), &fajr_ten()).unwrap();
        assert_eq!(w.iqamah_at, at(18, 8, 0));
        assert_eq!(w.seconds_remaining, 68 * 60);
        assert!(window_for(PrayerName::Sunrise, at(17, 0, 0), &DailySchedule::default(), &fajr_ten()).is_none());
    }

    #[test]
    fn progress_runs_from_empty_to_full() {
        let schedule = DailySchedule::default();
        let w = classify(at(4, 26, 0), &schedule, &fajr_ten()).iqamah.unwrap();
        assert_eq!(w.progress(), 0.0);
        let w = classify(at(4, 31, 0), &schedule, &fajr_ten()).iqamah.unwrap();
        assert!((w.progress() - 0.5).abs() < 1e-9);
        let w = classify(at(4, 36, 0), &schedule, &fajr_ten()).iqamah.unwrap();
        assert_eq!(w.progress(), 1.0);
    }

    #[test]
    fn tracker_reports_iqamah_once_per_window() {
        let schedule = DailySchedule::default();
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let mut tracker = IqamahTracker::new();

        let phase = tracker.observe(today, &classify(at(4, 30, 0), &schedule, &fajr_ten()));
        assert!(matches!(phase, IqamahPhase::Counting(_)));

        let phase = tracker.observe(today, &classify(at(4, 36, 0), &schedule, &fajr_ten()));
        assert!(matches!(phase, IqamahPhase::Now { first: true, .. }));
        let phase = tracker.observe(today, &classify(at(4, 36, 30), &schedule, &fajr_ten()));
        assert!(matches!(phase, IqamahPhase::Now { first: false, .. }));

        let phase = tracker.observe(today, &classify(at(4, 37, 0), &schedule, &fajr_ten()));
        assert_eq!(phase, IqamahPhase::Idle);

        let tomorrow = today.succ_opt().unwrap();
        let phase = tracker.observe(tomorrow, &classify(at(4, 36, 0), &schedule, &fajr_ten()));
        assert!(matches!(phase, IqamahPhase::Now { first: true, .. }));
    }
}
