use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

use crate::models::{parse_hhmm, DailySchedule, ScheduleSource};

// ─── Key-value store ─────────────────────────────────────────────────────────

pub struct KvRepo;

impl KvRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        let val = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(val)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )
        .with_context(|| format!("Writing key '{}'", key))?;
        Ok(())
    }

    pub fn remove(conn: &Connection, key: &str) -> Result<bool> {
        let n = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }

    pub fn keys(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }
}

// ─── Cached prayer times ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CachedSchedule {
    pub date: NaiveDate,
    pub schedule: DailySchedule,
    pub source: ScheduleSource,
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn row_to_cached(
    date: String,
    times: [String; 6],
    source: String,
) -> Result<CachedSchedule> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .with_context(|| format!("Bad cache date '{}'", date))?;
    let [fajr, sunrise, dhuhr, asr, maghrib, isha] = times;
    Ok(CachedSchedule {
        date,
        schedule: DailySchedule {
            fajr: parse_hhmm(&fajr)?,
            sunrise: parse_hhmm(&sunrise)?,
            dhuhr: parse_hhmm(&dhuhr)?,
            asr: parse_hhmm(&asr)?,
            maghrib: parse_hhmm(&maghrib)?,
            isha: parse_hhmm(&isha)?,
        },
        source: ScheduleSource::from_str(&source)?,
    })
}

const CACHE_COLUMNS: &str = "date, fajr, sunrise, dhuhr, asr, maghrib, isha, source";

pub struct CacheRepo;

impl CacheRepo {
    fn query_one(conn: &Connection, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Option<CachedSchedule>> {
        let row = conn
            .query_row(sql, args, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    [
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                    ],
                    row.get::<_, String>(7)?,
                ))
            })
            .optional()?;

        match row {
            None => Ok(None),
            Some((date, times, source)) => Ok(Some(row_to_cached(date, times, source)?)),
        }
    }

    pub fn get_for_date(conn: &Connection, date: NaiveDate) -> Result<Option<CachedSchedule>> {
        let sql = format!("SELECT {} FROM prayer_times_cache WHERE date = ?1", CACHE_COLUMNS);
        Self::query_one(conn, &sql, &[&fmt_date(date)])
    }

    /// Most recent schedule on or before `date`; the last known good one.
    pub fn latest(conn: &Connection, date: NaiveDate) -> Result<Option<CachedSchedule>> {
        let sql = format!(
            "SELECT {} FROM prayer_times_cache WHERE date <= ?1 AND source = 'provider'
             ORDER BY date DESC LIMIT 1",
            CACHE_COLUMNS
        );
        Self::query_one(conn, &sql, &[&fmt_date(date)])
    }

    pub fn store(
        conn: &Connection,
        date: NaiveDate,
        schedule: &DailySchedule,
        source: ScheduleSource,
    ) -> Result<()> {
        let t = |time: chrono::NaiveTime| time.format("%H:%M").to_string();
        conn.execute(
            "INSERT OR REPLACE INTO prayer_times_cache
                (date, fajr, sunrise, dhuhr, asr, maghrib, isha, source, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))",
            params![
                fmt_date(date),
                t(schedule.fajr),
                t(schedule.sunrise),
                t(schedule.dhuhr),
                t(schedule.asr),
                t(schedule.maghrib),
                t(schedule.isha),
                source.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn clear_all(conn: &Connection) -> Result<()> {
        conn.execute("DELETE FROM prayer_times_cache", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn open() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("test.db")).unwrap();
        run_migrations(&conn).unwrap();
        (dir, conn)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn kv_round_trip_and_overwrite() {
        let (_dir, conn) = open();
        assert_eq!(KvRepo::get(&conn, "announcements").unwrap(), None);
        KvRepo::set(&conn, "announcements", "[]").unwrap();
        KvRepo::set(&conn, "announcements", r#"["Kajian"]"#).unwrap();
        assert_eq!(
            KvRepo::get(&conn, "announcements").unwrap().as_deref(),
            Some(r#"["Kajian"]"#)
        );
        assert_eq!(KvRepo::keys(&conn).unwrap(), vec!["announcements".to_string()]);
        assert!(KvRepo::remove(&conn, "announcements").unwrap());
        assert!(!KvRepo::remove(&conn, "announcements").unwrap());
    }

    #[test]
    fn kv_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.db");
        {
            let conn = Connection::open(&path).unwrap();
            run_migrations(&conn).unwrap();
            KvRepo::set(&conn, "mosqueInfo", "{}").unwrap();
        }
        let conn = Connection::open(&path).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(KvRepo::get(&conn, "mosqueInfo").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn cache_stores_and_finds_last_known_good() {
        let (_dir, conn) = open();
        let schedule = DailySchedule::default();
        CacheRepo::store(&conn, day(16), &schedule, ScheduleSource::Provider).unwrap();
        let mut later = schedule.clone();
        later.fajr = parse_hhmm("04:25").unwrap();
        CacheRepo::store(&conn, day(17), &later, ScheduleSource::Provider).unwrap();
        CacheRepo::store(&conn, day(18), &schedule, ScheduleSource::Offline).unwrap();

        let hit = CacheRepo::get_for_date(&conn, day(17)).unwrap().unwrap();
        assert_eq!(hit.schedule, later);
        assert_eq!(hit.source, ScheduleSource::Provider);

        // Offline estimates are never treated as last known good.
        let latest = CacheRepo::latest(&conn, day(20)).unwrap().unwrap();
        assert_eq!(latest.date, day(17));

        assert!(CacheRepo::latest(&conn, day(15)).unwrap().is_none());

        CacheRepo::clear_all(&conn).unwrap();
        assert!(CacheRepo::get_for_date(&conn, day(17)).unwrap().is_none());
    }
}
