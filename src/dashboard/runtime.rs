//! Event loop driving a [`DashboardController`].
//!
//! One thread owns the controller. Backend calls run on short-lived worker
//! threads and a stdin reader thread turns key presses into events; all of
//! them report back through a single channel, so controller state is never
//! touched concurrently.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::backend::Backend;
use crate::config::schema::DashboardConfig;
use crate::logging::EventLog;
use crate::model::{CommandResponse, Snapshot, TimeSeries};

use super::controller::{DashboardController, Request};
use super::poller::PollTicket;
use super::render::{self, CLEAR_SCREEN};
use super::toggle::CommandKind;

/// Keyboard commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Toggle,
    Refresh,
    Quit,
    Other,
}

impl Key {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "t" | "toggle" => Self::Toggle,
            "r" | "refresh" => Self::Refresh,
            "q" | "quit" | "exit" => Self::Quit,
            _ => Self::Other,
        }
    }
}

/// Everything that can wake the event loop.
#[derive(Debug)]
pub enum Event {
    Stats(PollTicket, Result<Snapshot>),
    TimeSeries(PollTicket, Result<TimeSeries>),
    Command(CommandKind, Result<CommandResponse>),
    Input(Key),
    InputClosed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    /// Issue a start command right away; an already running backend answers
    /// `already_running` and polling begins.
    pub attach: bool,
}

pub struct Runtime<W: Write> {
    backend: Arc<dyn Backend>,
    controller: DashboardController,
    log: EventLog,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    out: W,
    input_open: bool,
    backlog: VecDeque<Event>,
}

impl<W: Write> Runtime<W> {
    pub fn new(backend: Arc<dyn Backend>, config: &DashboardConfig, log: EventLog, out: W) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            controller: DashboardController::create(config),
            log,
            tx,
            rx,
            out,
            input_open: true,
            backlog: VecDeque::new(),
        }
    }

    /// Channel for injecting events (key presses) from outside.
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    /// Run until `q` is pressed. Returns the disposed controller.
    pub fn run(mut self, options: WatchOptions) -> Result<DashboardController> {
        let now = Instant::now();
        let initial = self.controller.refresh(now);
        self.dispatch_all(initial);
        if options.attach
            && let Some(request) = self.controller.start(now)
        {
            self.dispatch(request);
        }

        loop {
            self.flush_console();
            self.draw()?;

            if self.controller.pending_notice().is_some() {
                if !self.wait_for_dismissal() {
                    break;
                }
                continue;
            }

            let Some(event) = self.next_event() else {
                let now = Instant::now();
                let requests = self.controller.tick(now);
                self.dispatch_all(requests);
                continue;
            };

            let now = Instant::now();
            match event {
                Event::Stats(ticket, result) => self.controller.on_stats(ticket, result, now),
                Event::TimeSeries(ticket, result) => {
                    self.controller.on_time_series(ticket, result, now)
                }
                Event::Command(kind, result) => self.controller.on_command(kind, result, now),
                Event::Input(Key::Quit) => break,
                Event::Input(Key::Toggle) => {
                    if let Some(request) = self.controller.toggle(now) {
                        self.dispatch(request);
                    }
                }
                Event::Input(Key::Refresh) => {
                    let requests = self.controller.refresh(now);
                    self.dispatch_all(requests);
                }
                Event::Input(Key::Other) => {}
                Event::InputClosed => {
                    self.input_open = false;
                    self.log.info("input", "stdin closed; keyboard control disabled");
                }
            }

            let requests = self.controller.tick(now);
            self.dispatch_all(requests);
        }

        self.controller.dispose();
        self.flush_console();
        self.log.info("watch", "dashboard closed");
        Ok(self.controller)
    }

    /// Block until the open notice is dismissed, holding back other events.
    /// Returns `false` if the user asked to quit.
    fn wait_for_dismissal(&mut self) -> bool {
        if !self.input_open {
            if let Some(notice) = self.controller.dismiss_notice() {
                self.log.info("notice", format!("auto-dismissed: {}", notice.message));
            }
            return true;
        }
        match self.rx.recv() {
            Ok(Event::Input(Key::Quit)) => false,
            Ok(Event::Input(_)) => {
                self.controller.dismiss_notice();
                true
            }
            Ok(Event::InputClosed) => {
                self.input_open = false;
                true
            }
            Ok(other) => {
                self.backlog.push_back(other);
                true
            }
            Err(_) => false,
        }
    }

    /// Next queued or incoming event, or `None` when it is time to tick.
    fn next_event(&mut self) -> Option<Event> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }
        let now = Instant::now();
        match self.controller.next_wakeup(now) {
            Some(at) => match self.rx.recv_timeout(at.saturating_duration_since(now)) {
                Ok(event) => Some(event),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
            },
            // We hold a sender, so the channel never disconnects here.
            None => self.rx.recv().ok(),
        }
    }

    fn dispatch_all(&self, requests: Vec<Request>) {
        for request in requests {
            self.dispatch(request);
        }
    }

    fn dispatch(&self, request: Request) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = match request {
                Request::FetchStats(ticket) => Event::Stats(ticket, backend.get_stats()),
                Request::FetchTimeSeries(ticket) => {
                    Event::TimeSeries(ticket, backend.get_time_series())
                }
                Request::Command(CommandKind::Start) => {
                    Event::Command(CommandKind::Start, backend.start_detection())
                }
                Request::Command(CommandKind::Stop) => {
                    Event::Command(CommandKind::Stop, backend.stop_detection())
                }
            };
            // The loop may already have exited.
            let _ = tx.send(event);
        });
    }

    fn flush_console(&mut self) {
        for entry in self.controller.drain_console() {
            self.log.record(&entry);
        }
    }

    fn draw(&mut self) -> Result<()> {
        let now = Instant::now();
        let animating = self.controller.is_animating()
            || self.controller.charts().animating_until(now).is_some();
        if !self.controller.surface_mut().take_dirty() && !animating {
            return Ok(());
        }
        let frame = render::render(&self.controller, now);
        write!(self.out, "{CLEAR_SCREEN}{frame}").context("failed writing dashboard frame")?;
        self.out.flush().context("failed flushing dashboard frame")?;
        Ok(())
    }
}

/// Forward stdin lines as key events until EOF.
pub fn spawn_input_reader(tx: Sender<Event>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let key = Key::parse(&line);
            if tx.send(Event::Input(key)).is_err() || key == Key::Quit {
                return;
            }
        }
        let _ = tx.send(Event::InputClosed);
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_parsing() {
        assert_eq!(Key::parse(""), Key::Toggle);
        assert_eq!(Key::parse(" T "), Key::Toggle);
        assert_eq!(Key::parse("r"), Key::Refresh);
        assert_eq!(Key::parse("quit"), Key::Quit);
        assert_eq!(Key::parse("x"), Key::Other);
    }
}
