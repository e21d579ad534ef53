use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::prayer::{minute_of_day, DailySchedule, PrayerName};

pub const IQAMAH_OFFSET_RANGE: std::ops::RangeInclusive<u32> = 1..=60;
pub const REDIRECT_DELAY_RANGE: std::ops::RangeInclusive<u32> = 3..=30;
pub const SHAFAQ_VALUES: &[&str] = &["general", "ahmer", "abyad"];
/// Imsak, Fajr, Sunrise, Dhuhr, Asr, Maghrib, Isha, Midnight, Sunset
pub const TUNE_FIELDS: usize = 9;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("iqamah offset for {prayer} must be between 1 and 60 minutes, got {minutes}")]
    IqamahOffset { prayer: PrayerName, minutes: u32 },
    #[error("{0} has no iqamah")]
    NoIqamah(PrayerName),
    #[error("redirect delay must be between 3 and 30 seconds, got {0}")]
    RedirectDelay(u32),
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
    #[error("school must be 0 (Shafi) or 1 (Hanafi), got {0}")]
    School(u8),
    #[error("midnight mode must be 0 (standard) or 1 (jafari), got {0}")]
    MidnightMode(u8),
    #[error("shafaq must be one of general, ahmer, abyad; got '{0}'")]
    Shafaq(String),
    #[error("tune must be 9 comma-separated integers, got '{0}'")]
    Tune(String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MosqueInfo {
    pub name: String,
    pub address: String,
    pub contact: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl MosqueInfo {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Empty("mosque name"));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::Latitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::Longitude(self.longitude));
        }
        Ok(())
    }
}

impl Default for MosqueInfo {
    fn default() -> Self {
        Self {
            name: "Masjid Darul Arqom".to_string(),
            address: "Jalan Kramatan, Kecamatan Pakisaji, Kabupaten Malang".to_string(),
            contact: "Tel: +62 21 123456".to_string(),
            latitude: -8.0679373,
            longitude: 112.5988417,
        }
    }
}

/// A community event shown on the rotating events card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: String,
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
}

impl Event {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Empty("event title"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub id: String,
    pub arabic: String,
    pub translation: String,
    pub reference: String,
}

impl Verse {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arabic.trim().is_empty() {
            return Err(ConfigError::Empty("verse text"));
        }
        Ok(())
    }
}

/// Calculation parameters forwarded to the time-table provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerSettings {
    pub method: u8,
    pub shafaq: String,
    pub tune: String,
    /// 0 = Shafi, 1 = Hanafi
    pub school: u8,
    pub midnight_mode: u8,
    #[serde(rename = "timezonestring")]
    pub timezone: String,
}

impl PrayerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SHAFAQ_VALUES.contains(&self.shafaq.as_str()) {
            return Err(ConfigError::Shafaq(self.shafaq.clone()));
        }
        if self.school > 1 {
            return Err(ConfigError::School(self.school));
        }
        if self.midnight_mode > 1 {
            return Err(ConfigError::MidnightMode(self.midnight_mode));
        }
        let parts: Vec<&str> = self.tune.split(',').collect();
        if parts.len() != TUNE_FIELDS || parts.iter().any(|p| p.trim().parse::<i32>().is_err()) {
            return Err(ConfigError::Tune(self.tune.clone()));
        }
        if self.timezone.trim().is_empty() {
            return Err(ConfigError::Empty("timezone"));
        }
        Ok(())
    }
}

impl Default for PrayerSettings {
    fn default() -> Self {
        Self {
            method: 20,
            shafaq: "general".to_string(),
            tune: "10,10,-1,1,2,3,3,2,0".to_string(),
            school: 0,
            midnight_mode: 0,
            timezone: "Asia/Jakarta".to_string(),
        }
    }
}

/// Minutes between adhan and iqamah for each of the five prayers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IqamahOffsets {
    pub fajr: u32,
    pub dhuhr: u32,
    pub asr: u32,
    pub maghrib: u32,
    pub isha: u32,
}

impl IqamahOffsets {
    /// `None` for Sunrise.
    pub fn get(&self, prayer: PrayerName) -> Option<u32> {
        match prayer {
            PrayerName::Fajr => Some(self.fajr),
            PrayerName::Sunrise => None,
            PrayerName::Dhuhr => Some(self.dhuhr),
            PrayerName::Asr => Some(self.asr),
            PrayerName::Maghrib => Some(self.maghrib),
            PrayerName::Isha => Some(self.isha),
        }
    }

    pub fn set(&mut self, prayer: PrayerName, minutes: u32) -> Result<(), ConfigError> {
        if !IQAMAH_OFFSET_RANGE.contains(&minutes) {
            return Err(ConfigError::IqamahOffset { prayer, minutes });
        }
        let slot = match prayer {
            PrayerName::Fajr => &mut self.fajr,
            PrayerName::Sunrise => return Err(ConfigError::NoIqamah(prayer)),
            PrayerName::Dhuhr => &mut self.dhuhr,
            PrayerName::Asr => &mut self.asr,
            PrayerName::Maghrib => &mut self.maghrib,
            PrayerName::Isha => &mut self.isha,
        };
        *slot = minutes;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for prayer in PrayerName::prayers() {
            let minutes = self.get(prayer).unwrap_or(0);
            if !IQAMAH_OFFSET_RANGE.contains(&minutes) {
                return Err(ConfigError::IqamahOffset { prayer, minutes });
            }
        }
        Ok(())
    }

    /// Prayers whose iqamah falls at or after the next event of `schedule`.
    /// Such offsets let two waiting windows touch or overlap.
    pub fn overlaps(&self, schedule: &DailySchedule) -> Vec<PrayerName> {
        PrayerName::prayers()
            .into_iter()
            .filter(|prayer| {
                let start = minute_of_day(schedule.time_of(*prayer));
                let end = minute_of_day(schedule.time_of(prayer.following()));
                // Isha's window runs into the night; only the next day's Fajr bounds it.
                let gap = if end > start { end - start } else { end + 24 * 60 - start };
                self.get(*prayer).map(|m| m as i64 >= gap).unwrap_or(false)
            })
            .collect()
    }
}

impl Default for IqamahOffsets {
    fn default() -> Self {
        Self {
            fajr: 10,
            dhuhr: 10,
            asr: 10,
            maghrib: 10,
            isha: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IqamahSettings {
    pub auto_redirect: bool,
    pub redirect_delay_seconds: u32,
}

impl IqamahSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !REDIRECT_DELAY_RANGE.contains(&self.redirect_delay_seconds) {
            return Err(ConfigError::RedirectDelay(self.redirect_delay_seconds));
        }
        Ok(())
    }
}

impl Default for IqamahSettings {
    fn default() -> Self {
        Self {
            auto_redirect: true,
            redirect_delay_seconds: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_outside_range_are_rejected() {
        let mut offsets = IqamahOffsets::default();
        assert!(offsets.set(PrayerName::Fajr, 0).is_err());
        assert!(offsets.set(PrayerName::Fajr, 61).is_err());
        assert_eq!(
            offsets.set(PrayerName::Sunrise, 10),
            Err(ConfigError::NoIqamah(PrayerName::Sunrise))
        );
        offsets.set(PrayerName::Asr, 60).unwrap();
        assert_eq!(offsets.asr, 60);
        assert!(offsets.validate().is_ok());
    }

    #[test]
    fn deserialized_offsets_are_checked() {
        let offsets: IqamahOffsets =
            serde_json::from_str(r#"{"fajr":0,"dhuhr":10,"asr":10,"maghrib":10,"isha":10}"#).unwrap();
        assert!(matches!(
            offsets.validate(),
            Err(ConfigError::IqamahOffset { prayer: PrayerName::Fajr, minutes: 0 })
        ));
    }

    #[test]
    fn overlap_detects_offsets_past_the_next_event() {
        let schedule = DailySchedule::default();
        assert!(IqamahOffsets::default().overlaps(&schedule).is_empty());

        // Maghrib -> Isha gap is 61 minutes.
        let mut offsets = IqamahOffsets::default();
        offsets.set(PrayerName::Maghrib, 60).unwrap();
        assert!(offsets.overlaps(&schedule).is_empty());

        let tight = DailySchedule::from_hhmm(["04:26", "04:30", "12:03", "12:20", "17:58", "18:59"]).unwrap();
        assert_eq!(
            IqamahOffsets::default().overlaps(&tight),
            vec![PrayerName::Fajr]
        );
    }

    #[test]
    fn prayer_settings_validation() {
        assert!(PrayerSettings::default().validate().is_ok());

        let mut s = PrayerSettings::default();
        s.tune = "1,2,3".to_string();
        assert!(matches!(s.validate(), Err(ConfigError::Tune(_))));

        let mut s = PrayerSettings::default();
        s.school = 2;
        assert_eq!(s.validate(), Err(ConfigError::School(2)));

        let mut s = PrayerSettings::default();
        s.shafaq = "green".to_string();
        assert!(matches!(s.validate(), Err(ConfigError::Shafaq(_))));
    }

    #[test]
    fn prayer_settings_use_provider_field_names() {
        let json = serde_json::to_value(PrayerSettings::default()).unwrap();
        assert_eq!(json["midnightMode"], 0);
        assert_eq!(json["timezonestring"], "Asia/Jakarta");
    }

    #[test]
    fn redirect_delay_bounds() {
        let mut s = IqamahSettings::default();
        assert!(s.validate().is_ok());
        s.redirect_delay_seconds = 2;
        assert_eq!(s.validate(), Err(ConfigError::RedirectDelay(2)));
        s.redirect_delay_seconds = 31;
        assert!(s.validate().is_err());
    }

    #[test]
    fn mosque_coordinates_are_bounded() {
        let mut m = MosqueInfo::default();
        assert!(m.validate().is_ok());
        m.latitude = 91.0;
        assert_eq!(m.validate(), Err(ConfigError::Latitude(91.0)));
    }
}
