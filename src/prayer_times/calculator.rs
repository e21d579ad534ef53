use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDate, NaiveTime};
use salah::prelude::*;

use crate::models::{DailySchedule, MosqueInfo, PrayerSettings};

/// Offline astronomical estimate of a day's schedule, used when the
/// time-table provider is unreachable and nothing has been cached.
pub struct PrayerCalculator {
    pub lat: f64,
    pub lng: f64,
    pub method_id: u8,
    pub school: u8,
    /// Per-event minute adjustments in provider order
    /// (Imsak, Fajr, Sunrise, Dhuhr, Asr, Maghrib, Isha, Midnight, Sunset).
    pub tune: Vec<i64>,
}

impl PrayerCalculator {
    pub fn new(mosque: &MosqueInfo, settings: &PrayerSettings) -> Result<Self> {
        let tune = settings
            .tune
            .split(',')
            .map(|p| p.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow!("Invalid tune '{}': {}", settings.tune, e))?;
        // Validate early
        madhab_for(settings.school)?;
        Ok(Self {
            lat: mosque.latitude,
            lng: mosque.longitude,
            method_id: settings.method,
            school: settings.school,
            tune,
        })
    }

    pub fn times_for_date(&self, date: NaiveDate) -> Result<DailySchedule> {
        let coords = Coordinates::new(self.lat, self.lng);
        let params = Configuration::with(method_for(self.method_id), madhab_for(self.school)?);

        let times = PrayerSchedule::new()
            .on(date)
            .for_location(coords)
            .with_configuration(params)
            .calculate()
            .map_err(|e| anyhow!("Prayer calculation failed: {}", e))?;

        let tuned = |utc: chrono::DateTime<chrono::Utc>, idx: usize| -> NaiveTime {
            let minutes = self.tune.get(idx).copied().unwrap_or(0);
            (utc + Duration::minutes(minutes)).with_timezone(&Local).time()
        };

        Ok(DailySchedule {
            fajr: truncate(tuned(times.time(Prayer::Fajr), 1)),
            sunrise: truncate(tuned(times.time(Prayer::Sunrise), 2)),
            dhuhr: truncate(tuned(times.time(Prayer::Dhuhr), 3)),
            asr: truncate(tuned(times.time(Prayer::Asr), 4)),
            maghrib: truncate(tuned(times.time(Prayer::Maghrib), 5)),
            isha: truncate(tuned(times.time(Prayer::Isha), 6)),
        })
    }
}

/// Schedule times are whole minutes.
fn truncate(t: NaiveTime) -> NaiveTime {
    use chrono::Timelike;
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

/// Map the provider's numeric method ids onto the closest local method.
fn method_for(id: u8) -> Method {
    match id {
        1 => Method::Karachi,
        2 => Method::NorthAmerica,
        3 => Method::MuslimWorldLeague,
        4 => Method::UmmAlQura,
        5 => Method::Egyptian,
        7 => Method::Tehran,
        8 => Method::Dubai,
        9 => Method::Kuwait,
        10 => Method::Qatar,
        // Kemenag (20) shares Singapore's 20°/18° twilight angles.
        11 | 20 => Method::Singapore,
        13 => Method::Turkey,
        15 => Method::MoonsightingCommittee,
        _ => Method::MuslimWorldLeague,
    }
}

fn madhab_for(school: u8) -> Result<Madhab> {
    match school {
        0 => Ok(Madhab::Shafi),
        1 => Ok(Madhab::Hanafi),
        _ => Err(anyhow!("Unknown school: {}", school)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_schedule_is_in_order() {
        let calc = PrayerCalculator::new(&MosqueInfo::default(), &PrayerSettings::default()).unwrap();
        let schedule = calc
            .times_for_date(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
            .unwrap();
        // Local timezone of the test machine shifts every event equally, so
        // only the gaps are checked.
        let gap = |a: NaiveTime, b: NaiveTime| (b - a).num_minutes().rem_euclid(24 * 60);
        assert!(gap(schedule.fajr, schedule.sunrise) > 30);
        assert!(gap(schedule.sunrise, schedule.dhuhr) > 180);
        assert!(gap(schedule.dhuhr, schedule.asr) > 120);
        assert!(gap(schedule.asr, schedule.maghrib) > 60);
        assert!(gap(schedule.maghrib, schedule.isha) > 30);
    }

    #[test]
    fn rejects_bad_school_and_tune() {
        let mut settings = PrayerSettings::default();
        settings.school = 3;
        assert!(PrayerCalculator::new(&MosqueInfo::default(), &settings).is_err());

        let mut settings = PrayerSettings::default();
        settings.tune = "1,x".to_string();
        assert!(PrayerCalculator::new(&MosqueInfo::default(), &settings).is_err());
    }
}
