use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::config::BoardConfig;
use crate::db::repository::CacheRepo;
use crate::models::{DailySchedule, ScheduleSource};
use crate::prayer_times::calculator::PrayerCalculator;
use crate::prayer_times::provider::TimetableProvider;
use crate::utils::hijri::{to_hijri, HijriInfo};

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchedule {
    pub date: NaiveDate,
    pub schedule: DailySchedule,
    pub source: ScheduleSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Always ask the provider first.
    Fetch,
    /// Use today's cached provider answer when there is one.
    CacheFirst,
}

/// Produces the schedule for a day, falling back from the provider to the
/// cache, to an offline estimate, to the built-in default. Never fails.
pub struct ScheduleService {
    provider: Box<dyn TimetableProvider>,
    offline_fallback: bool,
}

impl ScheduleService {
    pub fn new(provider: Box<dyn TimetableProvider>, offline_fallback: bool) -> Self {
        Self {
            provider,
            offline_fallback,
        }
    }

    pub fn resolve(
        &self,
        conn: &Connection,
        date: NaiveDate,
        board: &BoardConfig,
        mode: ResolveMode,
    ) -> ResolvedSchedule {
        let resolved = |schedule, source| ResolvedSchedule { date, schedule, source };

        if mode == ResolveMode::CacheFirst {
            if let Some(hit) = self.cached_for(conn, date) {
                return resolved(hit, ScheduleSource::Cache);
            }
        }

        match self
            .provider
            .fetch_day(date, &board.mosque_info, &board.prayer_settings)
        {
            Ok(schedule) => {
                if let Err(e) = CacheRepo::store(conn, date, &schedule, ScheduleSource::Provider) {
                    log::warn!("Could not cache prayer times for {}: {:#}", date, e);
                }
                log::info!("Fetched prayer times for {}", date);
                return resolved(schedule, ScheduleSource::Provider);
            }
            Err(e) => log::warn!("Fetching prayer times for {} failed: {}", date, e),
        }

        if let Some(hit) = self.cached_for(conn, date) {
            return resolved(hit, ScheduleSource::Cache);
        }
        match CacheRepo::latest(conn, date) {
            Ok(Some(last)) => {
                log::info!("Using last known good prayer times from {}", last.date);
                return resolved(last.schedule, ScheduleSource::Cache);
            }
            Ok(None) => {}
            Err(e) => log::warn!("Reading prayer times cache failed: {:#}", e),
        }

        if self.offline_fallback {
            let offline = PrayerCalculator::new(&board.mosque_info, &board.prayer_settings)
                .and_then(|calc| calc.times_for_date(date));
            match offline {
                Ok(schedule) => {
                    log::info!("Using offline estimate for {}", date);
                    return resolved(schedule, ScheduleSource::Offline);
                }
                Err(e) => log::warn!("Offline estimate for {} failed: {:#}", date, e),
            }
        }

        log::warn!("Using built-in default prayer times for {}", date);
        resolved(DailySchedule::default(), ScheduleSource::Default)
    }

    fn cached_for(&self, conn: &Connection, date: NaiveDate) -> Option<DailySchedule> {
        match CacheRepo::get_for_date(conn, date) {
            Ok(Some(hit)) if hit.source == ScheduleSource::Provider => Some(hit.schedule),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Reading cached prayer times for {} failed: {:#}", date, e);
                None
            }
        }
    }

    /// Hijri date from the provider, else the offline conversion.
    pub fn hijri(&self, date: NaiveDate, offset_days: i32) -> Option<HijriInfo> {
        let adjusted = date + Duration::days(offset_days as i64);
        match self.provider.fetch_hijri(adjusted) {
            Ok(info) => return Some(info),
            Err(e) => log::warn!("Fetching Hijri date failed: {}", e),
        }
        match to_hijri(date, offset_days) {
            Ok(info) => Some(info),
            Err(e) => {
                log::warn!("Offline Hijri conversion failed: {:#}", e);
                None
            }
        }
    }
}

/// Delay from `now` to the next local midnight.
pub fn until_next_midnight(now: NaiveDateTime) -> Duration {
    next_midnight(now) - now
}

fn next_midnight(now: NaiveDateTime) -> NaiveDateTime {
    let tomorrow = now.date().succ_opt().unwrap_or(now.date());
    tomorrow.and_hms_opt(0, 0, 0).unwrap_or(now)
}

/// Daily refresh: first at the next midnight, then every 24 hours.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPlan {
    next_at: NaiveDateTime,
}

impl RefreshPlan {
    pub fn starting(now: NaiveDateTime) -> Self {
        Self {
            next_at: next_midnight(now),
        }
    }

    pub fn next_at(&self) -> NaiveDateTime {
        self.next_at
    }

    pub fn due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_at
    }

    /// Returns true at most once per day; re-arms for the following
    /// midnight when it does.
    pub fn fire(&mut self, now: NaiveDateTime) -> bool {
        if !self.due(now) {
            return false;
        }
        self.next_at = next_midnight(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{parse_hhmm, MosqueInfo, PrayerSettings};
    use crate::prayer_times::provider::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FakeProvider {
        answer: Option<DailySchedule>,
        calls: Arc<AtomicU32>,
    }

    impl TimetableProvider for FakeProvider {
        fn fetch_day(
            &self,
            _date: NaiveDate,
            _mosque: &MosqueInfo,
            _settings: &PrayerSettings,
        ) -> Result<DailySchedule, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone().ok_or(ProviderError::Status(503))
        }

        fn fetch_hijri(&self, _date: NaiveDate) -> Result<HijriInfo, ProviderError> {
            Err(ProviderError::Status(503))
        }
    }

    fn service(answer: Option<DailySchedule>, offline: bool) -> (ScheduleService, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = FakeProvider { answer, calls: calls.clone() };
        (ScheduleService::new(Box::new(provider), offline), calls)
    }

    fn open() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("cache.db")).unwrap();
        run_migrations(&conn).unwrap();
        (dir, conn)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn fetched() -> DailySchedule {
        DailySchedule::from_hhmm(["04:11", "05:27", "11:33", "14:49", "17:41", "18:52"]).unwrap()
    }

    #[test]
    fn provider_answer_is_used_and_cached() {
        let (_dir, conn) = open();
        let (svc, _) = service(Some(fetched()), false);
        let r = svc.resolve(&conn, day(18), &BoardConfig::default(), ResolveMode::Fetch);
        assert_eq!(r.source, ScheduleSource::Provider);
        assert_eq!(r.schedule, fetched());
        assert_eq!(CacheRepo::get_for_date(&conn, day(18)).unwrap().unwrap().schedule, fetched());
    }

    #[test]
    fn failure_falls_back_to_last_known_good() {
        let (_dir, conn) = open();
        CacheRepo::store(&conn, day(16), &fetched(), ScheduleSource::Provider).unwrap();
        let (svc, _) = service(None, true);
        let r = svc.resolve(&conn, day(18), &BoardConfig::default(), ResolveMode::Fetch);
        assert_eq!(r.source, ScheduleSource::Cache);
        assert_eq!(r.schedule, fetched());
    }

    #[test]
    fn failure_without_cache_uses_default_when_offline_disabled() {
        let (_dir, conn) = open();
        let (svc, _) = service(None, false);
        let r = svc.resolve(&conn, day(18), &BoardConfig::default(), ResolveMode::Fetch);
        assert_eq!(r.source, ScheduleSource::Default);
        assert_eq!(r.schedule, DailySchedule::default());
    }

    #[test]
    fn failure_without_cache_estimates_offline() {
        let (_dir, conn) = open();
        let (svc, _) = service(None, true);
        let r = svc.resolve(&conn, day(18), &BoardConfig::default(), ResolveMode::Fetch);
        assert_eq!(r.source, ScheduleSource::Offline);
        // Offline answers are not cached as last known good.
        assert!(CacheRepo::latest(&conn, day(18)).unwrap().is_none());
    }

    #[test]
    fn cache_first_skips_the_provider() {
        let (_dir, conn) = open();
        let mut cached = fetched();
        cached.isha = parse_hhmm("19:00").unwrap();
        CacheRepo::store(&conn, day(18), &cached, ScheduleSource::Provider).unwrap();

        let (svc, calls) = service(Some(fetched()), false);
        let r = svc.resolve(&conn, day(18), &BoardConfig::default(), ResolveMode::CacheFirst);
        assert_eq!(r.schedule, cached);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let r = svc.resolve(&conn, day(19), &BoardConfig::default(), ResolveMode::CacheFirst);
        assert_eq!(r.source, ScheduleSource::Provider);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hijri_falls_back_to_offline_conversion() {
        let (svc, _) = service(None, false);
        let info = svc.hijri(day(18), 0).unwrap();
        assert!((1..=12).contains(&info.month));
    }

    #[test]
    fn midnight_delay() {
        let now = day(18).and_hms_opt(22, 30, 15).unwrap();
        assert_eq!(until_next_midnight(now), Duration::seconds(5385));
        let midnight = day(18).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(until_next_midnight(midnight), Duration::hours(24));
    }

    #[test]
    fn refresh_fires_once_per_day() {
        let start = day(18).and_hms_opt(9, 0, 0).unwrap();
        let mut plan = RefreshPlan::starting(start);
        assert_eq!(plan.next_at(), day(19).and_hms_opt(0, 0, 0).unwrap());
        assert!(!plan.fire(day(18).and_hms_opt(23, 59, 59).unwrap()));

        let just_after = day(19).and_hms_opt(0, 0, 1).unwrap();
        assert!(plan.fire(just_after));
        assert!(!plan.fire(day(19).and_hms_opt(0, 0, 2).unwrap()));
        assert_eq!(plan.next_at(), day(20).and_hms_opt(0, 0, 0).unwrap());
    }
}
