use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveTime};
use rusqlite::Connection;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use crate::cli::args::{
    AdminCommands, AnnounceCommands, ConfigCommands, EventArgs, EventCommands, IqamahCommands,
    MosqueArgs, MosqueCommands, SettingsArgs, SettingsCommands, VerseCommands,
};
use crate::config::{AppConfig, BoardConfig};
use crate::db::repository::CacheRepo;
use crate::models::{Event, MosqueInfo, PrayerName, PrayerSettings, ScheduleSource, Verse};
use crate::prayer_times::window::{classify, seconds_until};
use crate::prayer_times::{AladhanClient, IqamahPhase, IqamahTracker, ResolveMode, ScheduleService};
use crate::utils::format::{format_hms, format_mm_ss, format_time};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;212;175;55m";

fn make_service(config: &AppConfig) -> Result<ScheduleService> {
    let client = AladhanClient::new(&config.provider)?;
    Ok(ScheduleService::new(Box::new(client), config.provider.offline_fallback))
}

// ─── Times ───────────────────────────────────────────────────────────────────

/// "HH:MM" or "HH:MM:SS".
pub fn parse_clock(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M"))
        .map_err(|_| anyhow!("Invalid time '{}', expected HH:MM or HH:MM:SS", s))
}

pub fn handle_times(
    conn: &Connection,
    config: &AppConfig,
    board: &BoardConfig,
    at: Option<&str>,
) -> Result<()> {
    let now = match at {
        Some(s) => parse_clock(s)?,
        None => Local::now().time(),
    };
    let today = Local::now().date_naive();
    let service = make_service(config)?;
    let resolved = service.resolve(conn, today, board, ResolveMode::CacheFirst);
    let schedule = &resolved.schedule;
    let offsets = &board.iqamah_intervals;
    let c = classify(now, schedule, offsets);

    println!();
    println_colored!(
        GOLD,
        "  {} · {} ({})",
        board.mosque_info.name,
        today.format("%Y-%m-%d"),
        resolved.source.as_str()
    );
    println!();

    for (prayer, time) in schedule.entries() {
        let iqamah = offsets
            .get(prayer)
            .map(|m| format!("+{:>2} min", m))
            .unwrap_or_default();
        if c.highlighted() == Some(prayer) {
            println_colored!(GREEN, "  ● {:<9} {}  {}", prayer.display_name(), format_time(time), iqamah);
        } else if prayer.is_prayer() {
            println_colored!(BOLD, "    {:<9} {}  {}", prayer.display_name(), format_time(time), iqamah);
        } else {
            println_colored!(DIM, "    {:<9} {}", prayer.display_name(), format_time(time));
        }
    }

    println!();
    println_colored!(
        AMBER,
        "  Next: {} in {}",
        c.next.display_name(),
        format_hms(seconds_until(now, schedule.time_of(c.next)))
    );

    match IqamahTracker::new().observe(today, &c) {
        IqamahPhase::Idle => {}
        IqamahPhase::Counting(w) => println_colored!(
            GREEN,
            "  Iqamah {} at {} · {} left",
            w.prayer.display_name(),
            format_time(w.iqamah_at),
            format_mm_ss(w.seconds_remaining)
        ),
        IqamahPhase::Now { window, .. } => {
            println_colored!(GREEN, "  Iqamah {} now", window.prayer.display_name())
        }
    }

    for prayer in offsets.overlaps(schedule) {
        println_colored!(RED, "  ! iqamah offset for {} overlaps the next event", prayer);
    }
    println!();
    Ok(())
}

pub fn handle_hijri(config: &AppConfig) -> Result<()> {
    let service = make_service(config)?;
    let today = Local::now().date_naive();
    match service.hijri(today, config.display.hijri_offset) {
        Some(info) => println!("{}", info.formatted()),
        None => bail!("Could not determine the Hijri date"),
    }
    Ok(())
}

pub fn handle_refresh(conn: &Connection, config: &AppConfig, board: &BoardConfig) -> Result<()> {
    let service = make_service(config)?;
    let today = Local::now().date_naive();
    let resolved = service.resolve(conn, today, board, ResolveMode::Fetch);
    if resolved.source != ScheduleSource::Provider {
        bail!(
            "Provider unreachable; the board would use {} times",
            resolved.source.as_str()
        );
    }
    println_colored!(GREEN, "  ✓ Prayer times for {} fetched and cached", today);
    Ok(())
}

// ─── Config file ─────────────────────────────────────────────────────────────

pub fn handle_config(config: &AppConfig, action: &ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Path => println!("{}", AppConfig::config_path()?.display()),
        ConfigCommands::Show => print!("{}", toml::to_string_pretty(config)?),
        ConfigCommands::Init { force } => {
            let path = AppConfig::config_path()?;
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            AppConfig::default().save()?;
            println_colored!(GREEN, "  ✓ Wrote {}", path.display());
        }
    }
    Ok(())
}

// ─── Admin ───────────────────────────────────────────────────────────────────

pub fn handle_admin(conn: &Connection, board: &mut BoardConfig, section: &AdminCommands) -> Result<()> {
    match section {
        AdminCommands::Mosque { action } => handle_mosque(conn, board, action),
        AdminCommands::Announce { action } => handle_announce(conn, board, action),
        AdminCommands::Event { action } => handle_event(conn, board, action),
        AdminCommands::Verse { action } => handle_verse(conn, board, action),
        AdminCommands::Settings { action } => handle_settings(conn, board, action),
        AdminCommands::Iqamah { action } => handle_iqamah(conn, board, action),
        AdminCommands::Export => {
            println!("{}", board.to_json()?);
            Ok(())
        }
        AdminCommands::Import { file } => handle_import(conn, board, file),
        AdminCommands::Reset { yes } => {
            if !yes {
                let answer = prompt("Restore every board default? [y/N] ")?;
                if !answer.trim().eq_ignore_ascii_case("y") {
                    println!("Nothing changed.");
                    return Ok(());
                }
            }
            *board = BoardConfig::reset(conn)?;
            CacheRepo::clear_all(conn)?;
            println_colored!(GREEN, "  ✓ Board restored to defaults");
            Ok(())
        }
    }
}

pub fn apply_mosque_args(mut info: MosqueInfo, args: &MosqueArgs) -> MosqueInfo {
    if let Some(name) = &args.name {
        info.name = name.clone();
    }
    if let Some(address) = &args.address {
        info.address = address.clone();
    }
    if let Some(contact) = &args.contact {
        info.contact = contact.clone();
    }
    if let Some(lat) = args.lat {
        info.latitude = lat;
    }
    if let Some(lng) = args.lng {
        info.longitude = lng;
    }
    info
}

fn handle_mosque(conn: &Connection, board: &mut BoardConfig, action: &MosqueCommands) -> Result<()> {
    match action {
        MosqueCommands::Show => {
            let m = &board.mosque_info;
            println!();
            println_colored!(GOLD, "  {}", m.name);
            println!("  {}", m.address);
            println!("  {}", m.contact);
            println_colored!(DIM, "  {:.7}, {:.7}", m.latitude, m.longitude);
            println!();
        }
        MosqueCommands::Set(args) => {
            let before = board.mosque_info.clone();
            let info = apply_mosque_args(before.clone(), args);
            board.update_mosque_info(conn, info)?;
            if before.latitude != board.mosque_info.latitude
                || before.longitude != board.mosque_info.longitude
            {
                // Cached times belong to the old location.
                CacheRepo::clear_all(conn)?;
            }
            println_colored!(GREEN, "  ✓ Mosque info saved");
        }
    }
    Ok(())
}

fn handle_announce(conn: &Connection, board: &mut BoardConfig, action: &AnnounceCommands) -> Result<()> {
    match action {
        AnnounceCommands::List => {
            if board.announcements.is_empty() {
                println_colored!(DIM, "  No announcements");
            }
            for (i, text) in board.announcements.iter().enumerate() {
                println!("  {:>2}. {}", i + 1, text);
            }
        }
        AnnounceCommands::Add { text } => {
            let mut list = board.announcements.clone();
            list.push(text.trim().to_string());
            board.update_announcements(conn, list)?;
            println_colored!(GREEN, "  ✓ Announcement added");
        }
        AnnounceCommands::Remove { index } => {
            if *index == 0 || *index > board.announcements.len() {
                bail!("No announcement #{} (there are {})", index, board.announcements.len());
            }
            let mut list = board.announcements.clone();
            let removed = list.remove(index - 1);
            board.update_announcements(conn, list)?;
            println_colored!(AMBER, "  Removed: {}", removed);
        }
    }
    Ok(())
}

/// Millisecond timestamp ids, bumped past any id already taken.
pub fn next_id<'a>(existing: impl Iterator<Item = &'a str> + Clone, now_ms: i64) -> String {
    let mut candidate = now_ms;
    while existing.clone().any(|id| id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

fn handle_event(conn: &Connection, board: &mut BoardConfig, action: &EventCommands) -> Result<()> {
    match action {
        EventCommands::List => {
            if board.events.is_empty() {
                println_colored!(DIM, "  No events");
            }
            for e in &board.events {
                println_colored!(BOLD, "  [{}] {}", e.id, e.title);
                println_colored!(DIM, "      {} {} · {}", e.date, e.time, e.location);
            }
        }
        EventCommands::Add(args) => {
            let event = event_from_args(board, args);
            let id = event.id.clone();
            let mut list = board.events.clone();
            list.push(event);
            board.update_events(conn, list)?;
            println_colored!(GREEN, "  ✓ Event added with id {}", id);
        }
        EventCommands::Remove { id } => {
            let mut list = board.events.clone();
            let before = list.len();
            list.retain(|e| &e.id != id);
            if list.len() == before {
                bail!("No event with id {}", id);
            }
            board.update_events(conn, list)?;
            println_colored!(AMBER, "  Removed event {}", id);
        }
    }
    Ok(())
}

fn event_from_args(board: &BoardConfig, args: &EventArgs) -> Event {
    Event {
        id: next_id(board.events.iter().map(|e| e.id.as_str()), Local::now().timestamp_millis()),
        title: args.title.clone(),
        date: args.date.clone(),
        time: args.time.clone(),
        location: args.location.clone(),
        image: args.image.clone(),
        description: args.description.clone(),
    }
}

fn handle_verse(conn: &Connection, board: &mut BoardConfig, action: &VerseCommands) -> Result<()> {
    match action {
        VerseCommands::List => {
            if board.verses.is_empty() {
                println_colored!(DIM, "  No verses");
            }
            for v in &board.verses {
                println_colored!(GOLD, "  [{}] {}", v.id, v.arabic);
                println!("      {}", v.translation);
                println_colored!(DIM, "      ({})", v.reference);
            }
        }
        VerseCommands::Add { arabic, translation, reference } => {
            let verse = Verse {
                id: next_id(board.verses.iter().map(|v| v.id.as_str()), Local::now().timestamp_millis()),
                arabic: arabic.clone(),
                translation: translation.clone(),
                reference: reference.clone(),
            };
            let id = verse.id.clone();
            let mut list = board.verses.clone();
            list.push(verse);
            board.update_verses(conn, list)?;
            println_colored!(GREEN, "  ✓ Verse added with id {}", id);
        }
        VerseCommands::Remove { id } => {
            let mut list = board.verses.clone();
            let before = list.len();
            list.retain(|v| &v.id != id);
            if list.len() == before {
                bail!("No verse with id {}", id);
            }
            board.update_verses(conn, list)?;
            println_colored!(AMBER, "  Removed verse {}", id);
        }
    }
    Ok(())
}

pub fn apply_settings_args(mut settings: PrayerSettings, args: &SettingsArgs) -> PrayerSettings {
    if let Some(method) = args.method {
        settings.method = method;
    }
    if let Some(shafaq) = &args.shafaq {
        settings.shafaq = shafaq.trim().to_lowercase();
    }
    if let Some(tune) = &args.tune {
        settings.tune = tune.replace(' ', "");
    }
    if let Some(school) = args.school {
        settings.school = school;
    }
    if let Some(mode) = args.midnight_mode {
        settings.midnight_mode = mode;
    }
    if let Some(tz) = &args.timezone {
        settings.timezone = tz.trim().to_string();
    }
    settings
}

fn handle_settings(conn: &Connection, board: &mut BoardConfig, action: &SettingsCommands) -> Result<()> {
    match action {
        SettingsCommands::Show => {
            let s = &board.prayer_settings;
            println!();
            println!("  method         {}", s.method);
            println!("  shafaq         {}", s.shafaq);
            println!("  tune           {}", s.tune);
            println!("  school         {}", s.school);
            println!("  midnight mode  {}", s.midnight_mode);
            println!("  timezone       {}", s.timezone);
            println!();
        }
        SettingsCommands::Set(args) => {
            let settings = apply_settings_args(board.prayer_settings.clone(), args);
            board.update_prayer_settings(conn, settings)?;
            CacheRepo::clear_all(conn)?;
            println_colored!(GREEN, "  ✓ Prayer settings saved; run `moscloc refresh` to fetch new times");
        }
    }
    Ok(())
}

fn handle_iqamah(conn: &Connection, board: &mut BoardConfig, action: &IqamahCommands) -> Result<()> {
    match action {
        IqamahCommands::Show => {
            println!();
            for prayer in PrayerName::prayers() {
                if let Some(minutes) = board.iqamah_intervals.get(prayer) {
                    println!("  {:<9} +{} min", prayer.display_name(), minutes);
                }
            }
            let s = &board.iqamah_settings;
            println!();
            println!(
                "  auto-redirect  {} ({} s)",
                if s.auto_redirect { "on" } else { "off" },
                s.redirect_delay_seconds
            );
            println!();
        }
        IqamahCommands::Set { prayer, minutes } => {
            let prayer = PrayerName::from_str(prayer)?;
            let mut offsets = board.iqamah_intervals;
            offsets.set(prayer, *minutes)?;
            board.update_iqamah_intervals(conn, offsets)?;
            println_colored!(GREEN, "  ✓ Iqamah {} set to {} minutes after adhan", prayer, minutes);
        }
        IqamahCommands::Redirect { enable, disable, delay } => {
            let mut settings = board.iqamah_settings;
            if *enable {
                settings.auto_redirect = true;
            }
            if *disable {
                settings.auto_redirect = false;
            }
            if let Some(delay) = delay {
                settings.redirect_delay_seconds = *delay;
            }
            board.update_iqamah_settings(conn, settings)?;
            println_colored!(GREEN, "  ✓ Redirect settings saved");
        }
    }
    Ok(())
}

fn handle_import(conn: &Connection, board: &mut BoardConfig, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file).with_context(|| format!("Reading {:?}", file))?;
    let imported = BoardConfig::from_json(&content)?;
    let location_changed = imported.mosque_info.latitude != board.mosque_info.latitude
        || imported.mosque_info.longitude != board.mosque_info.longitude
        || imported.prayer_settings != board.prayer_settings;
    board.replace_all(conn, imported)?;
    if location_changed {
        CacheRepo::clear_all(conn)?;
    }
    println_colored!(GREEN, "  ✓ Board config imported from {}", file.display());
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().lock().read_line(&mut buf)?;
    Ok(buf.trim_end_matches('\n').trim_end_matches('\r').to_string())
}
