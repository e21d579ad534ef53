use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::db::repository::KvRepo;
use crate::models::{
    ConfigError, Event, IqamahOffsets, IqamahSettings, MosqueInfo, PrayerSettings, Verse,
};

pub const KEY_MOSQUE: &str = "mosqueInfo";
pub const KEY_ANNOUNCEMENTS: &str = "announcements";
pub const KEY_EVENTS: &str = "events";
pub const KEY_VERSES: &str = "verses";
pub const KEY_PRAYER_SETTINGS: &str = "prayerSettings";
pub const KEY_IQAMAH_INTERVALS: &str = "iqamahIntervals";
pub const KEY_IQAMAH_SETTINGS: &str = "iqamahSettings";

pub const ALL_KEYS: &[&str] = &[
    KEY_MOSQUE,
    KEY_ANNOUNCEMENTS,
    KEY_EVENTS,
    KEY_VERSES,
    KEY_PRAYER_SETTINGS,
    KEY_IQAMAH_INTERVALS,
    KEY_IQAMAH_SETTINGS,
];

fn default_announcements() -> Vec<String> {
    vec![
        "Pengajian rutin setiap Kamis malam ba'da Isya bersama Ustadz Ahmad".to_string(),
        "Kerja bakti setiap Sabtu pagi pukul 07:00 WIB".to_string(),
        "Pendaftaran kelas Tahfidz untuk anak-anak dibuka mulai hari ini".to_string(),
        "Shalat Tarawih berjamaah setiap malam selama bulan Ramadhan".to_string(),
    ]
}

fn default_verses() -> Vec<Verse> {
    let v = |id: &str, arabic: &str, translation: &str, reference: &str| Verse {
        id: id.to_string(),
        arabic: arabic.to_string(),
        translation: translation.to_string(),
        reference: reference.to_string(),
    };
    vec![
        v(
            "1",
            "وَأَقِيمُوا الصَّلَاةَ وَآتُوا الزَّكَاةَ وَارْكَعُوا مَعَ الرَّاكِعِينَ",
            "Dan dirikanlah shalat, tunaikanlah zakat dan ruku'lah beserta orang-orang yang ruku'.",
            "Al-Baqarah 2:43",
        ),
        v(
            "2",
            "يَا أَيُّهَا الَّذِينَ آمَنُوا اسْتَعِينُوا بِالصَّبْرِ وَالصَّلَاةِ",
            "Hai orang-orang yang beriman, jadikanlah sabar dan shalat sebagai penolongmu.",
            "Al-Baqarah 2:153",
        ),
        v(
            "3",
            "وَمَا خَلَقْتُ الْجِنَّ وَالْإِنسَ إِلَّا لِيَعْبُدُونِ",
            "Dan Aku tidak menciptakan jin dan manusia melainkan supaya mereka menyembah-Ku.",
            "Adh-Dhariyat 51:56",
        ),
        v(
            "4",
            "وَبَشِّرِ الصَّابِرِينَ",
            "Dan berikanlah berita gembira kepada orang-orang yang sabar.",
            "Al-Baqarah 2:155",
        ),
        v(
            "5",
            "إِنَّ مَعَ الْعُسْرِ يُسْرًا",
            "Sesungguhnya sesudah kesulitan itu ada kemudahan.",
            "Ash-Sharh 94:6",
        ),
    ]
}

/// Everything an administrator can edit, loaded once at startup and passed
/// to whoever needs it. Each field lives under its own key in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    pub mosque_info: MosqueInfo,
    pub announcements: Vec<String>,
    pub events: Vec<Event>,
    pub verses: Vec<Verse>,
    pub prayer_settings: PrayerSettings,
    pub iqamah_intervals: IqamahOffsets,
    pub iqamah_settings: IqamahSettings,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            mosque_info: MosqueInfo::default(),
            announcements: default_announcements(),
            events: Vec::new(),
            verses: default_verses(),
            prayer_settings: PrayerSettings::default(),
            iqamah_intervals: IqamahOffsets::default(),
            iqamah_settings: IqamahSettings::default(),
        }
    }
}

/// Read and decode one key. Missing, undecodable or invalid values are
/// treated as absent.
fn read_key<T, F>(conn: &Connection, key: &str, valid: F) -> Result<Option<T>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let Some(raw) = KvRepo::get(conn, key)? else {
        return Ok(None);
    };
    match serde_json::from_str::<T>(&raw) {
        Ok(value) if valid(&value) => Ok(Some(value)),
        Ok(_) => {
            log::warn!("Stored '{}' failed validation, using default", key);
            Ok(None)
        }
        Err(e) => {
            log::warn!("Stored '{}' is malformed ({}), using default", key, e);
            Ok(None)
        }
    }
}

fn validate_announcements(announcements: &[String]) -> Result<(), ConfigError> {
    if announcements.iter().any(|a| a.trim().is_empty()) {
        return Err(ConfigError::Empty("announcement"));
    }
    Ok(())
}

fn write_key<T: Serialize>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).with_context(|| format!("Serializing '{}'", key))?;
    KvRepo::set(conn, key, &json)
}

impl BoardConfig {
    pub fn load(conn: &Connection) -> Result<Self> {
        for key in KvRepo::keys(conn)? {
            if !ALL_KEYS.contains(&key.as_str()) {
                log::debug!("Ignoring unknown stored key '{}'", key);
            }
        }
        let d = Self::default();
        Ok(Self {
            mosque_info: read_key(conn, KEY_MOSQUE, |m: &MosqueInfo| m.validate().is_ok())?
                .unwrap_or(d.mosque_info),
            announcements: read_key(conn, KEY_ANNOUNCEMENTS, |a: &Vec<String>| {
                validate_announcements(a).is_ok()
            })?
            .unwrap_or(d.announcements),
            events: read_key(conn, KEY_EVENTS, |e: &Vec<Event>| {
                e.iter().all(|e| e.validate().is_ok())
            })?
            .unwrap_or(d.events),
            verses: read_key(conn, KEY_VERSES, |v: &Vec<Verse>| {
                v.iter().all(|v| v.validate().is_ok())
            })?
            .unwrap_or(d.verses),
            prayer_settings: read_key(conn, KEY_PRAYER_SETTINGS, |s: &PrayerSettings| {
                s.validate().is_ok()
            })?
            .unwrap_or(d.prayer_settings),
            iqamah_intervals: read_key(conn, KEY_IQAMAH_INTERVALS, |o: &IqamahOffsets| {
                o.validate().is_ok()
            })?
            .unwrap_or(d.iqamah_intervals),
            iqamah_settings: read_key(conn, KEY_IQAMAH_SETTINGS, |s: &IqamahSettings| {
                s.validate().is_ok()
            })?
            .unwrap_or(d.iqamah_settings),
        })
    }

    pub fn update_mosque_info(&mut self, conn: &Connection, info: MosqueInfo) -> Result<()> {
        info.validate()?;
        write_key(conn, KEY_MOSQUE, &info)?;
        self.mosque_info = info;
        Ok(())
    }

    pub fn update_announcements(&mut self, conn: &Connection, announcements: Vec<String>) -> Result<()> {
        validate_announcements(&announcements)?;
        write_key(conn, KEY_ANNOUNCEMENTS, &announcements)?;
        self.announcements = announcements;
        Ok(())
    }

    pub fn update_events(&mut self, conn: &Connection, events: Vec<Event>) -> Result<()> {
        for e in &events {
            e.validate()?;
        }
        write_key(conn, KEY_EVENTS, &events)?;
        self.events = events;
        Ok(())
    }

    pub fn update_verses(&mut self, conn: &Connection, verses: Vec<Verse>) -> Result<()> {
        for v in &verses {
            v.validate()?;
        }
        write_key(conn, KEY_VERSES, &verses)?;
        self.verses = verses;
        Ok(())
    }

    pub fn update_prayer_settings(&mut self, conn: &Connection, settings: PrayerSettings) -> Result<()> {
        settings.validate()?;
        write_key(conn, KEY_PRAYER_SETTINGS, &settings)?;
        self.prayer_settings = settings;
        Ok(())
    }

    pub fn update_iqamah_intervals(&mut self, conn: &Connection, offsets: IqamahOffsets) -> Result<()> {
        offsets.validate()?;
        write_key(conn, KEY_IQAMAH_INTERVALS, &offsets)?;
        self.iqamah_intervals = offsets;
        Ok(())
    }

    pub fn update_iqamah_settings(&mut self, conn: &Connection, settings: IqamahSettings) -> Result<()> {
        settings.validate()?;
        write_key(conn, KEY_IQAMAH_SETTINGS, &settings)?;
        self.iqamah_settings = settings;
        Ok(())
    }

    /// Validate every section first, then persist all of them.
    pub fn replace_all(&mut self, conn: &Connection, other: BoardConfig) -> Result<()> {
        other.mosque_info.validate()?;
        validate_announcements(&other.announcements)?;
        other.events.iter().try_for_each(Event::validate)?;
        other.verses.iter().try_for_each(Verse::validate)?;
        other.prayer_settings.validate()?;
        other.iqamah_intervals.validate()?;
        other.iqamah_settings.validate()?;

        self.update_mosque_info(conn, other.mosque_info)?;
        self.update_announcements(conn, other.announcements)?;
        self.update_events(conn, other.events)?;
        self.update_verses(conn, other.verses)?;
        self.update_prayer_settings(conn, other.prayer_settings)?;
        self.update_iqamah_intervals(conn, other.iqamah_intervals)?;
        self.update_iqamah_settings(conn, other.iqamah_settings)?;
        Ok(())
    }

    /// Drop every stored key; defaults apply again.
    pub fn reset(conn: &Connection) -> Result<Self> {
        for key in ALL_KEYS {
            KvRepo::remove(conn, key)?;
        }
        Ok(Self::default())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serializing board config")
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("Parsing board config")
    }
}
