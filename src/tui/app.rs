use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    widgets::Block,
    Frame,
};
use rusqlite::Connection;

use crate::config::{AppConfig, BoardConfig};
use crate::models::{DailySchedule, PrayerName};
use crate::prayer_times::schedule::{until_next_midnight, RefreshPlan};
use crate::prayer_times::window::{carry_over, redirect_countdown, seconds_until, window_for};
use crate::prayer_times::{
    classify, AladhanClient, Classification, IqamahPhase, IqamahTracker, IqamahWindow,
    ResolvedSchedule, ScheduleService,
};
use crate::tui::events::{Event, EventHandler};
use crate::tui::refresher::{Refreshed, Refresher, Request};
use crate::tui::theme;
use crate::tui::widgets::{cards, header, iqamah, prayers, redirect, statusbar};
use crate::utils::hijri::HijriInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Board,
    /// `pinned` shows one prayer's window even when it is not active.
    Iqamah { pinned: Option<PrayerName> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reload {
    Daily,
    Manual,
}

pub struct App {
    pub view: View,
    pub config: AppConfig,
    pub board: BoardConfig,
    refresher: Refresher,
    pending: Option<Reload>,
    pub should_quit: bool,

    // Refreshed on tick
    pub now: NaiveDateTime,
    pub schedule: ResolvedSchedule,
    /// The previous day's schedule, kept for an Isha window that runs past
    /// midnight.
    yesterday: Option<DailySchedule>,
    pub hijri: Option<HijriInfo>,
    pub classification: Classification,
    pub phase: IqamahPhase,
    pub redirect: Option<(PrayerName, i64)>,
    pub notice: Option<String>,

    redirect_cancelled: Option<(NaiveDate, PrayerName)>,
    tracker: IqamahTracker,
    refresh: RefreshPlan,
    started: NaiveDateTime,
}

/// Which card of a rotating list is on screen after `elapsed_secs`.
pub fn rotation_index(elapsed_secs: i64, period_secs: u64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let period = period_secs.max(1) as i64;
    ((elapsed_secs.max(0) / period) as usize) % len
}

impl App {
    pub fn new(
        config: AppConfig,
        board: BoardConfig,
        refresher: Refresher,
        initial: Refreshed,
        now: NaiveDateTime,
    ) -> Self {
        let Refreshed { schedule, hijri } = initial;
        let classification = classify(now.time(), &schedule.schedule, &board.iqamah_intervals);

        let mut app = App {
            view: View::Board,
            config,
            board,
            refresher,
            pending: None,
            should_quit: false,
            now,
            schedule,
            yesterday: None,
            hijri,
            classification,
            phase: IqamahPhase::Idle,
            redirect: None,
            notice: None,
            redirect_cancelled: None,
            tracker: IqamahTracker::new(),
            refresh: RefreshPlan::starting(now),
            started: now,
        };
        app.warn_overlaps();
        log::debug!(
            "Next schedule refresh in {} s",
            until_next_midnight(now).num_seconds()
        );
        app
    }

    fn warn_overlaps(&self) {
        for prayer in self.board.iqamah_intervals.overlaps(&self.schedule.schedule) {
            log::warn!(
                "Iqamah offset for {} reaches the following event; windows will overlap",
                prayer
            );
        }
    }

    /// Ask the refresh thread for today's schedule and Hijri date. The
    /// current schedule stays on screen until the answer arrives.
    fn request_reload(&mut self, kind: Reload) {
        if self.pending.is_some() {
            return;
        }
        let request = Request {
            date: self.now.date(),
            board: self.board.clone(),
            hijri_offset: self.config.display.hijri_offset,
        };
        if self.refresher.request(request) {
            self.pending = Some(kind);
        } else {
            log::error!("Schedule refresh thread is gone; keeping {}", self.schedule.date);
        }
    }

    /// Apply a finished refresh, if any. Returns true when one was applied.
    pub fn poll_reload(&mut self) -> bool {
        let Some(Refreshed { schedule, hijri }) = self.refresher.try_latest() else {
            return false;
        };
        let kind = self.pending.take();

        if self.schedule.date.succ_opt() == Some(schedule.date) {
            self.yesterday = Some(self.schedule.schedule.clone());
        } else if self.schedule.date != schedule.date {
            self.yesterday = None;
        }
        self.schedule = schedule;
        self.hijri = hijri;
        self.warn_overlaps();

        if kind == Some(Reload::Manual) {
            self.notice = Some(format!("Schedule refreshed ({})", self.schedule.source.as_str()));
        }
        // A fetch that was in flight across midnight answered for yesterday.
        if self.schedule.date != self.now.date() {
            self.request_reload(Reload::Daily);
        }
        true
    }

    pub fn tick(&mut self) {
        self.tick_at(Local::now().naive_local());
    }

    pub fn tick_at(&mut self, now: NaiveDateTime) {
        self.now = now;
        self.poll_reload();
        if self.refresh.fire(now) {
            log::info!("Daily refresh of prayer times");
            self.request_reload(Reload::Daily);
        }

        self.classification = self.classify_now();
        self.phase = self.tracker.observe(now.date(), &self.classification);

        if let IqamahPhase::Now { window, first: true } = self.phase {
            log::info!("Iqamah time for {}", window.prayer);
            if self.view == View::Board && self.auto_redirect_allowed(window.prayer) {
                self.open_iqamah(None);
            }
        }

        self.update_redirect();

        if let View::Iqamah { pinned: None } = self.view {
            if !self.classification.iqamah_active() {
                self.view = View::Board;
            }
        }
    }

    fn classify_now(&self) -> Classification {
        let now = self.now.time();
        let offsets = &self.board.iqamah_intervals;
        let today = classify(now, &self.schedule.schedule, offsets);
        match &self.yesterday {
            Some(yesterday) => carry_over(today, now, yesterday, offsets),
            None => today,
        }
    }

    fn auto_redirect_allowed(&self, prayer: PrayerName) -> bool {
        self.board.iqamah_settings.auto_redirect
            && self.redirect_cancelled != Some((self.now.date(), prayer))
    }

    fn update_redirect(&mut self) {
        if self.view != View::Board || !self.board.iqamah_settings.auto_redirect {
            self.redirect = None;
            return;
        }
        let active = self.classification.iqamah;
        let schedule = match (&self.yesterday, active) {
            (Some(yesterday), Some(w)) if w.began_yesterday(self.now.time()) => yesterday,
            _ => &self.schedule.schedule,
        };
        let countdown = redirect_countdown(
            self.now.time(),
            schedule,
            &self.board.iqamah_intervals,
            self.board.iqamah_settings.redirect_delay_seconds,
        )
        .filter(|(prayer, _)| active.is_some_and(|w| w.prayer == *prayer));
        let pending = match countdown {
            Some((prayer, _)) if !self.auto_redirect_allowed(prayer) => None,
            other => other,
        };
        match pending {
            Some((_, secs)) if secs <= 1 => self.open_iqamah(None),
            other => self.redirect = other,
        }
    }

    fn open_iqamah(&mut self, pinned: Option<PrayerName>) {
        self.view = View::Iqamah { pinned };
        self.redirect = None;
    }

    /// The window the iqamah screen shows, if any.
    pub fn iqamah_window(&self) -> Option<IqamahWindow> {
        match self.view {
            View::Iqamah { pinned: Some(prayer) } => window_for(
                prayer,
                self.now.time(),
                &self.schedule.schedule,
                &self.board.iqamah_intervals,
            ),
            _ => self.classification.iqamah,
        }
    }

    pub fn next_in_secs(&self) -> i64 {
        seconds_until(
            self.now.time(),
            self.schedule.schedule.time_of(self.classification.next),
        )
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        // Only handle actual key presses; some terminals also send release/repeat
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.notice = None;

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('c') => {
                if let Some((prayer, _)) = self.redirect.take() {
                    log::info!("Redirect to iqamah {} cancelled", prayer);
                    self.redirect_cancelled = Some((self.now.date(), prayer));
                }
            }
            KeyCode::Enter => {
                if self.redirect.is_some() {
                    self.open_iqamah(None);
                }
            }
            KeyCode::Char('i') => {
                if self.classification.iqamah_active() {
                    self.open_iqamah(None);
                } else {
                    self.notice = Some("No iqamah window is active".to_string());
                }
            }
            KeyCode::Char('b') => self.view = View::Board,
            KeyCode::Char('r') => {
                if self.pending.is_some() {
                    self.notice = Some("Refresh already in progress".to_string());
                } else {
                    self.request_reload(Reload::Manual);
                    self.notice = Some("Refreshing schedule...".to_string());
                }
            }
            _ => {}
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        match (self.view, self.iqamah_window()) {
            (View::Iqamah { .. }, Some(window)) => self.draw_iqamah(frame, &window),
            _ => self.draw_board(frame),
        }
    }

    fn draw_board(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(theme::base()), area);

        let outer_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7), // header
                Constraint::Min(0),    // body
                Constraint::Length(3), // announcements
                Constraint::Length(1), // status bar
            ])
            .split(area);

        header::render(
            frame,
            outer_chunks[0],
            &self.board.mosque_info,
            self.now,
            self.hijri.as_ref(),
            self.config.display.big_clock,
        );

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(outer_chunks[1]);

        let left_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(8), // prayers
                Constraint::Min(0),    // events
            ])
            .split(columns[0]);

        prayers::render(
            frame,
            left_chunks[0],
            &self.schedule.schedule,
            &self.board.iqamah_intervals,
            &self.classification,
            self.next_in_secs(),
            self.schedule.source,
        );

        let elapsed = (self.now - self.started).num_seconds();
        let display = &self.config.display;
        cards::event(
            frame,
            left_chunks[1],
            &self.board.events,
            rotation_index(elapsed, display.event_secs, self.board.events.len()),
        );
        cards::verse(
            frame,
            columns[1],
            &self.board.verses,
            rotation_index(elapsed, display.verse_secs, self.board.verses.len()),
        );
        cards::announcement(
            frame,
            outer_chunks[2],
            &self.board.announcements,
            rotation_index(elapsed, display.announcement_secs, self.board.announcements.len()),
        );

        statusbar::render(frame, outer_chunks[3], false, self.notice.as_deref());

        if let Some((prayer, secs)) = self.redirect {
            redirect::render(frame, prayer, secs);
        }
    }

    fn draw_iqamah(&self, frame: &mut Frame, window: &IqamahWindow) {
        let area = frame.area();
        frame.render_widget(Block::default().style(theme::base()), area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        iqamah::render(frame, chunks[0], window);
        statusbar::render(frame, chunks[1], true, self.notice.as_deref());
    }
}

/// Run the board until the operator quits. The first schedule is resolved
/// before the terminal is taken over; later ones on the refresh thread,
/// which takes ownership of `conn`.
pub fn run(conn: Connection, config: AppConfig, board: BoardConfig, start: View) -> Result<()> {
    let client = AladhanClient::new(&config.provider)?;
    let service = ScheduleService::new(Box::new(client), config.provider.offline_fallback);
    let tick_ms = config.display.tick_ms;
    let now = Local::now().naive_local();

    let request = Request {
        date: now.date(),
        board: board.clone(),
        hijri_offset: config.display.hijri_offset,
    };
    let initial = Refreshed::load(&service, &conn, &request);
    let refresher = Refresher::spawn(service, conn);

    let mut app = App::new(config, board, refresher, initial, now);
    app.view = start;

    let mut terminal = ratatui::init();
    let events = EventHandler::new(tick_ms);

    let result = (|| -> Result<()> {
        loop {
            terminal.draw(|frame| app.draw(frame)).context("Drawing the board")?;

            match events.next()? {
                Event::Key(key) => {
                    app.handle_key(key);
                    if app.should_quit {
                        return Ok(());
                    }
                }
                Event::Tick => app.tick(),
            }
        }
    })();

    drop(events);
    ratatui::restore();
    result
}
