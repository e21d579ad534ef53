use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::config::settings::ProviderConfig;
use crate::models::{DailySchedule, MosqueInfo, PrayerSettings, ScheduleError};
use crate::utils::hijri::{hijri_month_name, HijriInfo};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider answered with HTTP {0}")]
    Status(u16),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("bad time in response: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("bad value in response: {0}")]
    Field(String),
}

/// A source of daily prayer times, keyed by location and calculation
/// settings. Providers are moved onto the refresh thread.
pub trait TimetableProvider: Send {
    fn fetch_day(
        &self,
        date: NaiveDate,
        mosque: &MosqueInfo,
        settings: &PrayerSettings,
    ) -> Result<DailySchedule, ProviderError>;

    fn fetch_hijri(&self, date: NaiveDate) -> Result<HijriInfo, ProviderError>;
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct TimingsData {
    timings: Timings,
}

// Imsak, Midnight etc. are present too and ignored.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Timings {
    fajr: String,
    sunrise: String,
    dhuhr: String,
    asr: String,
    maghrib: String,
    isha: String,
}

#[derive(Deserialize)]
struct HijriData {
    hijri: HijriPayload,
}

#[derive(Deserialize)]
struct HijriPayload {
    day: String,
    month: HijriMonth,
    year: String,
}

#[derive(Deserialize)]
struct HijriMonth {
    number: usize,
}

/// "4:5 (WIB)" -> "04:05". Anything after the clock time is dropped.
pub fn normalize_time(raw: &str) -> String {
    let clock = raw.split_whitespace().next().unwrap_or("");
    match clock.split_once(':') {
        Some((h, m)) => format!("{:0>2}:{:0>2}", h, m),
        None => clock.to_string(),
    }
}

pub fn parse_timings(body: &str) -> Result<DailySchedule, ProviderError> {
    let envelope: Envelope<TimingsData> = serde_json::from_str(body)?;
    let t = envelope.data.timings;
    let times = [&t.fajr, &t.sunrise, &t.dhuhr, &t.asr, &t.maghrib, &t.isha].map(|s| normalize_time(s));
    Ok(DailySchedule::from_hhmm([
        times[0].as_str(),
        times[1].as_str(),
        times[2].as_str(),
        times[3].as_str(),
        times[4].as_str(),
        times[5].as_str(),
    ])?)
}

pub fn parse_hijri(body: &str) -> Result<HijriInfo, ProviderError> {
    let envelope: Envelope<HijriData> = serde_json::from_str(body)?;
    let h = envelope.data.hijri;
    let day = h.day.trim().parse().map_err(|_| ProviderError::Field(format!("day '{}'", h.day)))?;
    let year = h.year.trim().parse().map_err(|_| ProviderError::Field(format!("year '{}'", h.year)))?;
    if !(1..=12).contains(&h.month.number) {
        return Err(ProviderError::Field(format!("month {}", h.month.number)));
    }
    Ok(HijriInfo {
        day,
        month: h.month.number,
        year,
        month_name: hijri_month_name(h.month.number).to_string(),
    })
}

// ─── Aladhan client ──────────────────────────────────────────────────────────

pub struct AladhanClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl AladhanClient {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("moscloc/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Building HTTP client")?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn timings_url(
        &self,
        date: NaiveDate,
        mosque: &MosqueInfo,
        settings: &PrayerSettings,
    ) -> Result<Url, ProviderError> {
        let base = format!("{}/timings/{}", self.base_url, date.format("%d-%m-%Y"));
        Url::parse_with_params(
            &base,
            &[
                ("latitude", mosque.latitude.to_string()),
                ("longitude", mosque.longitude.to_string()),
                ("method", settings.method.to_string()),
                ("shafaq", settings.shafaq.clone()),
                ("tune", settings.tune.clone()),
                ("school", settings.school.to_string()),
                ("midnightMode", settings.midnight_mode.to_string()),
                ("timezonestring", settings.timezone.clone()),
            ],
        )
        .map_err(|e| ProviderError::Field(format!("url: {}", e)))
    }

    pub fn hijri_url(&self, date: NaiveDate) -> String {
        format!("{}/gToH/{}", self.base_url, date.format("%d-%m-%Y"))
    }

    fn get(&self, url: Url) -> Result<String, ProviderError> {
        log::debug!("GET {}", url);
        let resp = self.http.get(url).send()?;
        if !resp.status().is_success() {
            return Err(ProviderError::Status(resp.status().as_u16()));
        }
        Ok(resp.text()?)
    }
}

impl TimetableProvider for AladhanClient {
    fn fetch_day(
        &self,
        date: NaiveDate,
        mosque: &MosqueInfo,
        settings: &PrayerSettings,
    ) -> Result<DailySchedule, ProviderError> {
        let body = self.get(self.timings_url(date, mosque, settings)?)?;
        parse_timings(&body)
    }

    fn fetch_hijri(&self, date: NaiveDate) -> Result<HijriInfo, ProviderError> {
        let url = Url::parse(&self.hijri_url(date)).map_err(|e| ProviderError::Field(format!("url: {}", e)))?;
        let body = self.get(url)?;
        parse_hijri(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    const TIMINGS: &str = r#"{
        "code": 200,
        "status": "OK",
        "data": {
            "timings": {
                "Fajr": "04:11", "Sunrise": "5:27", "Dhuhr": "11:33",
                "Asr": "14:49", "Sunset": "17:39", "Maghrib": "17:41",
                "Isha": "18:52 (WIB)", "Imsak": "04:01", "Midnight": "23:33"
            },
            "date": { "readable": "18 Oct 2026" }
        }
    }"#;

    #[test]
    fn normalizes_provider_times() {
        assert_eq!(normalize_time("4:5"), "04:05");
        assert_eq!(normalize_time("18:52 (WIB)"), "18:52");
        assert_eq!(normalize_time("  05:27  "), "05:27");
    }

    #[test]
    fn parses_timings_response() {
        let schedule = parse_timings(TIMINGS).unwrap();
        assert_eq!(schedule.fajr, NaiveTime::from_hms_opt(4, 11, 0).unwrap());
        assert_eq!(schedule.sunrise, NaiveTime::from_hms_opt(5, 27, 0).unwrap());
        assert_eq!(schedule.isha, NaiveTime::from_hms_opt(18, 52, 0).unwrap());
    }

    #[test]
    fn rejects_bad_bodies() {
        assert!(matches!(parse_timings("<html>502</html>"), Err(ProviderError::Decode(_))));
        let bad = TIMINGS.replace("04:11", "soon");
        assert!(matches!(parse_timings(&bad), Err(ProviderError::Schedule(_))));
    }

    #[test]
    fn parses_hijri_response() {
        let body = r#"{"data":{"hijri":{"day":"26","month":{"number":4,"en":"Rabīʿ al-thānī"},"year":"1448"}}}"#;
        let info = parse_hijri(body).unwrap();
        assert_eq!((info.day, info.month, info.year), (26, 4, 1448));
        assert_eq!(info.month_name, "Rabiul Akhir");

        let body = r#"{"data":{"hijri":{"day":"26","month":{"number":13},"year":"1448"}}}"#;
        assert!(matches!(parse_hijri(body), Err(ProviderError::Field(_))));
    }

    #[test]
    fn builds_timings_url_from_settings() {
        let client = AladhanClient::new(&ProviderConfig {
            base_url: "https://api.aladhan.com/v1/".to_string(),
            ..ProviderConfig::default()
        })
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let url = client
            .timings_url(date, &MosqueInfo::default(), &PrayerSettings::default())
            .unwrap();
        assert_eq!(url.path(), "/v1/timings/18-10-2026");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("method".to_string(), "20".to_string())));
        assert!(query.contains(&("tune".to_string(), "10,10,-1,1,2,3,3,2,0".to_string())));
        assert!(query.contains(&("timezonestring".to_string(), "Asia/Jakarta".to_string())));
        assert!(query.contains(&("midnightMode".to_string(), "0".to_string())));
        assert_eq!(client.hijri_url(date), "https://api.aladhan.com/v1/gToH/18-10-2026");
    }
}
