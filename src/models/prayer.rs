use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// The six daily schedule events, in the order they occur.
///
/// `Sunrise` is a marker: it bounds the Fajr window and shows up as a row on
/// the board, but it has no iqamah and is never highlighted as current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerName {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerName {
    pub fn all() -> [PrayerName; 6] {
        [
            PrayerName::Fajr,
            PrayerName::Sunrise,
            PrayerName::Dhuhr,
            PrayerName::Asr,
            PrayerName::Maghrib,
            PrayerName::Isha,
        ]
    }

    /// The five prayers that have an adhan and an iqamah.
    pub fn prayers() -> [PrayerName; 5] {
        [
            PrayerName::Fajr,
            PrayerName::Dhuhr,
            PrayerName::Asr,
            PrayerName::Maghrib,
            PrayerName::Isha,
        ]
    }

    pub fn is_prayer(&self) -> bool {
        !matches!(self, PrayerName::Sunrise)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerName::Fajr => "fajr",
            PrayerName::Sunrise => "sunrise",
            PrayerName::Dhuhr => "dhuhr",
            PrayerName::Asr => "asr",
            PrayerName::Maghrib => "maghrib",
            PrayerName::Isha => "isha",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Sunrise => "Sunrise",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
        }
    }

    fn index(&self) -> usize {
        match self {
            PrayerName::Fajr => 0,
            PrayerName::Sunrise => 1,
            PrayerName::Dhuhr => 2,
            PrayerName::Asr => 3,
            PrayerName::Maghrib => 4,
            PrayerName::Isha => 5,
        }
    }

    /// The event that follows this one, wrapping Isha back to Fajr.
    pub fn following(&self) -> PrayerName {
        PrayerName::all()[(self.index() + 1) % 6]
    }
}

impl std::fmt::Display for PrayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PrayerName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fajr" | "subuh" | "shubuh" => Ok(PrayerName::Fajr),
            "sunrise" | "syuruq" | "shuruq" => Ok(PrayerName::Sunrise),
            "dhuhr" | "zuhr" | "dhuhur" | "dzuhur" => Ok(PrayerName::Dhuhr),
            "asr" | "ashar" => Ok(PrayerName::Asr),
            "maghrib" => Ok(PrayerName::Maghrib),
            "isha" | "isya" => Ok(PrayerName::Isha),
            _ => Err(anyhow::anyhow!("Unknown prayer: {}", s)),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("malformed time '{0}', expected HH:MM")]
    Malformed(String),
}

/// Parse a 24-hour "HH:MM" clock time. Single-digit parts are accepted.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, ScheduleError> {
    let malformed = || ScheduleError::Malformed(s.to_string());
    let (h, m) = s.trim().split_once(':').ok_or_else(malformed)?;
    let clock_part = |p: &str| (1..=2).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit());
    if !clock_part(h) || !clock_part(m) {
        return Err(malformed());
    }
    let hours: u32 = h.parse().map_err(|_| malformed())?;
    let minutes: u32 = m.parse().map_err(|_| malformed())?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(malformed)
}

/// Minutes since local midnight.
pub fn minute_of_day(t: NaiveTime) -> i64 {
    (t.hour() * 60 + t.minute()) as i64
}

/// One calendar day of prayer times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySchedule {
    pub fajr: NaiveTime,
    pub sunrise: NaiveTime,
    pub dhuhr: NaiveTime,
    pub asr: NaiveTime,
    pub maghrib: NaiveTime,
    pub isha: NaiveTime,
}

impl DailySchedule {
    /// Build from six "HH:MM" strings in schedule order.
    pub fn from_hhmm(times: [&str; 6]) -> Result<Self, ScheduleError> {
        Ok(Self {
            fajr: parse_hhmm(times[0])?,
            sunrise: parse_hhmm(times[1])?,
            dhuhr: parse_hhmm(times[2])?,
            asr: parse_hhmm(times[3])?,
            maghrib: parse_hhmm(times[4])?,
            isha: parse_hhmm(times[5])?,
        })
    }

    pub fn entries(&self) -> [(PrayerName, NaiveTime); 6] {
        [
            (PrayerName::Fajr, self.fajr),
            (PrayerName::Sunrise, self.sunrise),
            (PrayerName::Dhuhr, self.dhuhr),
            (PrayerName::Asr, self.asr),
            (PrayerName::Maghrib, self.maghrib),
            (PrayerName::Isha, self.isha),
        ]
    }

    pub fn time_of(&self, prayer: PrayerName) -> NaiveTime {
        match prayer {
            PrayerName::Fajr => self.fajr,
            PrayerName::Sunrise => self.sunrise,
            PrayerName::Dhuhr => self.dhuhr,
            PrayerName::Asr => self.asr,
            PrayerName::Maghrib => self.maghrib,
            PrayerName::Isha => self.isha,
        }
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
        Self {
            fajr: t(4, 26),
            sunrise: t(5, 50),
            dhuhr: t(12, 3),
            asr: t(15, 3),
            maghrib: t(17, 58),
            isha: t(18, 59),
        }
    }
}

/// Where the schedule currently on display came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSource {
    Provider,
    Cache,
    Offline,
    Default,
}

impl ScheduleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleSource::Provider => "provider",
            ScheduleSource::Cache => "cache",
            ScheduleSource::Offline => "offline",
            ScheduleSource::Default => "default",
        }
    }
}

impl FromStr for ScheduleSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provider" => Ok(ScheduleSource::Provider),
            "cache" => Ok(ScheduleSource::Cache),
            "offline" => Ok(ScheduleSource::Offline),
            "default" => Ok(ScheduleSource::Default),
            _ => Err(anyhow::anyhow!("Unknown schedule source: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_and_unpadded_times() {
        assert_eq!(parse_hhmm("04:26").unwrap(), NaiveTime::from_hms_opt(4, 26, 0).unwrap());
        assert_eq!(parse_hhmm("4:5").unwrap(), NaiveTime::from_hms_opt(4, 5, 0).unwrap());
        assert_eq!(parse_hhmm(" 23:59 ").unwrap(), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in ["", "0426", "04:", ":26", "ab:cd", "24:00", "12:60", "004:26", "04:26:00"] {
            assert!(parse_hhmm(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn rejects_signed_components() {
        for bad in ["+4:05", "4:+5", "-1:30", " 4: 5"] {
            assert!(parse_hhmm(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn default_schedule_is_ordered() {
        let entries = DailySchedule::default().entries();
        for pair in entries.windows(2) {
            assert!(pair[0].1 < pair[1].1);
        }
    }

    #[test]
    fn following_wraps_isha_to_fajr() {
        assert_eq!(PrayerName::Isha.following(), PrayerName::Fajr);
        assert_eq!(PrayerName::Fajr.following(), PrayerName::Sunrise);
    }

    #[test]
    fn accepts_local_aliases() {
        assert_eq!("Subuh".parse::<PrayerName>().unwrap(), PrayerName::Fajr);
        assert_eq!("zuhr".parse::<PrayerName>().unwrap(), PrayerName::Dhuhr);
        assert_eq!("isya".parse::<PrayerName>().unwrap(), PrayerName::Isha);
        assert!("tahajjud".parse::<PrayerName>().is_err());
    }

    #[test]
    fn sunrise_is_not_a_prayer() {
        assert!(!PrayerName::Sunrise.is_prayer());
        assert_eq!(PrayerName::prayers().len(), 5);
        assert!(PrayerName::prayers().iter().all(|p| p.is_prayer()));
    }
}
