use std::sync::mpsc;
use std::thread;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::config::BoardConfig;
use crate::prayer_times::{ResolveMode, ResolvedSchedule, ScheduleService};
use crate::utils::hijri::HijriInfo;

#[derive(Debug, Clone)]
pub struct Request {
    pub date: NaiveDate,
    pub board: BoardConfig,
    pub hijri_offset: i32,
}

#[derive(Debug, Clone)]
pub struct Refreshed {
    pub schedule: ResolvedSchedule,
    pub hijri: Option<HijriInfo>,
}

impl Refreshed {
    /// Resolve the schedule and Hijri date on the calling thread.
    pub fn load(service: &ScheduleService, conn: &Connection, request: &Request) -> Self {
        Self {
            schedule: service.resolve(conn, request.date, &request.board, ResolveMode::Fetch),
            hijri: service.hijri(request.date, request.hijri_offset),
        }
    }
}

/// Resolves schedules on a background thread that owns the service and its
/// own connection, so the board keeps drawing while the provider answers.
/// The thread exits once the `Refresher` is dropped and any fetch in flight
/// has returned.
pub struct Refresher {
    tx: mpsc::Sender<Request>,
    rx: mpsc::Receiver<Refreshed>,
}

impl Refresher {
    pub fn spawn(service: ScheduleService, conn: Connection) -> Self {
        let (tx, requests) = mpsc::channel::<Request>();
        let (results, rx) = mpsc::channel();

        thread::spawn(move || {
            for request in requests {
                let refreshed = Refreshed::load(&service, &conn, &request);
                if results.send(refreshed).is_err() {
                    break;
                }
            }
            log::debug!("Schedule refresh thread stopped");
        });

        Self { tx, rx }
    }

    /// Queue a fetch. False when the worker is gone.
    pub fn request(&self, request: Request) -> bool {
        self.tx.send(request).is_ok()
    }

    /// The latest finished fetch, if one arrived since the last call.
    pub fn try_latest(&self) -> Option<Refreshed> {
        self.rx.try_iter().last()
    }
}
