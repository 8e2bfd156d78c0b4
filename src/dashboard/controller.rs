//! The dashboard controller.
//!
//! Owns every piece of dashboard state (surface, charts, detection state,
//! refresh timer, running animations) and performs no I/O. Callers feed it
//! the current time and backend results; it answers with the [`Request`]s
//! to issue next. The runtime executes those requests on worker threads and
//! posts the results back, so the controller itself only ever runs on one
//! thread.

use std::collections::VecDeque;
use std::time::Instant;

use anyhow::Result;

use crate::config::schema::DashboardConfig;
use crate::logging::{Level, LogEntry};
use crate::model::{CommandResponse, Snapshot, TimeSeries};

use super::animation::{CounterTween, CounterUpdate, FadeSequence};
use super::charts::ChartRenderer;
use super::poller::{self, PollTicket};
use super::surface::{ElementId, Surface};
use super::timer::RepeatingTimer;
use super::toggle::{self, CommandKind, DetectionState, Relabel};

/// Console lines kept for the dashboard footer.
const RECENT_CONSOLE_LINES: usize = 3;

/// Work the controller wants the runtime to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    FetchStats(PollTicket),
    FetchTimeSeries(PollTicket),
    Command(CommandKind),
}

/// A blocking, user-facing error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

pub struct DashboardController {
    config: DashboardConfig,
    surface: Surface,
    charts: ChartRenderer,
    state: DetectionState,
    timer: RepeatingTimer,
    tweens: Vec<CounterTween>,
    fades: Vec<FadeSequence>,
    overlay_hide_at: Option<Instant>,
    pending_command: Option<CommandKind>,
    epoch: u64,
    next_seq: u64,
    notices: VecDeque<Notice>,
    console: Vec<LogEntry>,
    recent: VecDeque<LogEntry>,
    disposed: bool,
}

impl DashboardController {
    /// Controller with empty charts and the initial markup state.
    pub fn create(config: &DashboardConfig) -> Self {
        Self {
            config: config.clone(),
            surface: Surface::new(),
            charts: ChartRenderer::new(config),
            state: DetectionState::Inactive,
            timer: RepeatingTimer::new(config.poll_interval()),
            tweens: Vec::new(),
            fades: Vec::new(),
            overlay_hide_at: None,
            pending_command: None,
            epoch: 0,
            next_seq: 0,
            notices: VecDeque::new(),
            console: Vec::new(),
            recent: VecDeque::new(),
            disposed: false,
        }
    }

    // -- Accessors --

    pub fn state(&self) -> DetectionState {
        self.state
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn charts(&self) -> &ChartRenderer {
        &self.charts
    }

    pub fn is_polling(&self) -> bool {
        self.timer.is_running()
    }

    pub fn pending_command(&self) -> Option<CommandKind> {
        self.pending_command
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether any counter tween or fade is still running.
    pub fn is_animating(&self) -> bool {
        !self.tweens.is_empty() || !self.fades.is_empty()
    }

    // -- Polling --

    /// Fetch a fresh snapshot and time series.
    ///
    /// The loading overlay is only shown while detection is inactive, so
    /// steady-state polling does not flicker.
    pub fn refresh(&mut self, _now: Instant) -> Vec<Request> {
        if self.disposed {
            return Vec::new();
        }
        if !self.state.is_active() {
            self.show_overlay();
        }
        let ticket = PollTicket {
            epoch: self.epoch,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        vec![Request::FetchStats(ticket), Request::FetchTimeSeries(ticket)]
    }

    /// Apply a `GET /get_stats` result.
    pub fn on_stats(&mut self, ticket: PollTicket, result: Result<Snapshot>, now: Instant) {
        if self.disposed {
            return;
        }
        self.hide_overlay();

        if self.is_stale(ticket) {
            self.log(
                Level::Warn,
                "fetch_stats",
                format!("discarded statistics from stopped polling epoch {}", ticket.epoch),
            );
            return;
        }

        match result {
            Ok(snap) => self.apply_snapshot(&snap, now),
            Err(e) => self.log(
                Level::Error,
                "fetch_stats",
                format!("error fetching statistics: {e:#}"),
            ),
        }
    }

    /// Apply a `GET /get_time_series` result.
    pub fn on_time_series(&mut self, ticket: PollTicket, result: Result<TimeSeries>, now: Instant) {
        if self.disposed {
            return;
        }
        if self.is_stale(ticket) {
            self.log(
                Level::Warn,
                "fetch_time_series",
                format!("discarded time series from stopped polling epoch {}", ticket.epoch),
            );
            return;
        }

        match result {
            Ok(series) if series.is_consistent() => {
                self.charts.update_detection(&series, now);
                self.charts.update_ratio(&series, now);
                self.surface.mark_dirty();
            }
            Ok(series) => self.log(
                Level::Error,
                "fetch_time_series",
                format!(
                    "time series sequences differ in length ({} timestamps, {} bee, {} varroa, {} ratio)",
                    series.timestamps.len(),
                    series.bee_counts.len(),
                    series.varroa_counts.len(),
                    series.infestation_ratio.len()
                ),
            ),
            Err(e) => self.log(
                Level::Error,
                "fetch_time_series",
                format!("error fetching time series data: {e:#}"),
            ),
        }
    }

    fn is_stale(&self, ticket: PollTicket) -> bool {
        ticket.epoch != self.epoch
    }

    fn apply_snapshot(&mut self, snap: &Snapshot, now: Instant) {
        let duration = self.config.counter_animation();
        for (element, text) in poller::counter_targets(snap) {
            if self
                .tweens
                .iter()
                .any(|t| t.element == element && t.target_text() == text)
            {
                continue;
            }
            self.tweens.retain(|t| t.element != element);
            if let CounterUpdate::Animating(tween) =
                CounterTween::begin(&mut self.surface, element, &text, now, duration)
            {
                self.tweens.push(tween);
            }
        }

        for (element, text) in poller::label_targets(snap) {
            self.surface.set_text(element, text);
        }

        self.update_risk_badge(snap, now);
        self.charts
            .update_unique(snap.unique_bees, snap.unique_varroa, now);
        self.surface.mark_dirty();
    }

    /// Fade the badge to the snapshot's risk level unless it already shows
    /// (or is already fading to) that level.
    fn update_risk_badge(&mut self, snap: &Snapshot, now: Instant) {
        let level = snap.infestation_risk_level;
        let target = Relabel::RiskBadge(level);

        let in_flight = self
            .fades
            .iter()
            .find(|f| f.element() == ElementId::StatusBadge)
            .map(|f| f.relabel());
        let (_, class) = toggle::risk_presentation(level);
        let settled = in_flight.is_none()
            && toggle::current_risk_class(&self.surface) == Some(class)
            && self.surface.text(ElementId::StatusBadge) == format!("{level} Risk");

        if in_flight == Some(target) || settled {
            return;
        }
        self.start_fade(target, now);
    }

    // -- Detection toggle --

    /// Start when inactive, stop when active.
    pub fn toggle(&mut self, now: Instant) -> Option<Request> {
        match self.state.toggle_command() {
            CommandKind::Start => self.start(now),
            CommandKind::Stop => self.stop(now),
        }
    }

    /// Ask the backend to start detection. Only reachable from `Inactive`.
    pub fn start(&mut self, now: Instant) -> Option<Request> {
        if self.state != DetectionState::Inactive {
            return None;
        }
        self.issue(CommandKind::Start, now)
    }

    /// Ask the backend to stop detection. Only reachable from `Active`.
    pub fn stop(&mut self, now: Instant) -> Option<Request> {
        if self.state != DetectionState::Active {
            return None;
        }
        self.issue(CommandKind::Stop, now)
    }

    fn issue(&mut self, kind: CommandKind, _now: Instant) -> Option<Request> {
        if self.disposed
            || self.pending_command.is_some()
            || self.surface.is_disabled(ElementId::ToggleButton)
        {
            return None;
        }
        self.pending_command = Some(kind);
        self.surface.set_disabled(ElementId::ToggleButton, true);
        self.show_overlay();
        self.log(
            Level::Info,
            "toggle",
            format!("{} detection requested", capitalize(kind.verb())),
        );
        Some(Request::Command(kind))
    }

    /// Apply the answer to a start or stop command.
    pub fn on_command(&mut self, kind: CommandKind, result: Result<CommandResponse>, now: Instant) {
        if self.disposed {
            return;
        }
        self.pending_command = None;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.hide_overlay();
                self.surface.set_disabled(ElementId::ToggleButton, false);
                self.log(
                    Level::Error,
                    "toggle",
                    format!("error requesting detection {}: {e:#}", kind.verb()),
                );
                self.raise_notice(format!(
                    "Failed to {} detection. Check the event log for details.",
                    kind.verb()
                ));
                return;
            }
        };

        self.overlay_hide_at = Some(now + self.config.overlay_hide_delay());
        self.log(
            Level::Info,
            "toggle",
            format!("{} detection response: {}", kind.verb(), response.status),
        );

        match self.state.transition(kind, &response.status) {
            Some(next) => self.enter(next, now),
            None => {
                self.surface.set_disabled(ElementId::ToggleButton, false);
                if !kind.accepts(&response.status) {
                    self.log(
                        Level::Error,
                        "toggle",
                        format!(
                            "unexpected status '{}' to {} request",
                            response.status,
                            kind.verb()
                        ),
                    );
                    self.raise_notice(format!(
                        "Failed to {} detection: the service answered '{}'.",
                        kind.verb(),
                        response.status
                    ));
                }
            }
        }
    }

    fn enter(&mut self, next: DetectionState, now: Instant) {
        self.state = next;
        let active = next.is_active();

        self.surface.set_disabled(ElementId::ToggleButton, true);
        self.start_fade(Relabel::ToggleButton { active }, now);
        self.start_fade(Relabel::DetectionStatus { active }, now);

        if active {
            self.timer.start(now);
        } else {
            self.timer.cancel();
            // Results of refreshes issued before the stop no longer apply.
            self.epoch += 1;
        }
    }

    // -- Time --

    /// Advance animations and the refresh timer to `now`.
    pub fn tick(&mut self, now: Instant) -> Vec<Request> {
        if self.disposed {
            return Vec::new();
        }

        let surface = &mut self.surface;
        self.tweens.retain(|tween| !tween.step(surface, now));
        for fade in &mut self.fades {
            fade.advance(surface, now);
        }
        self.fades.retain(|fade| !fade.is_done());

        if let Some(at) = self.overlay_hide_at
            && at <= now
        {
            self.overlay_hide_at = None;
            self.hide_overlay();
        }

        if self.timer.poll(now) {
            return self.refresh(now);
        }
        Vec::new()
    }

    /// The next instant at which `tick` has work to do.
    pub fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        let animating = self.is_animating() || self.charts.animating_until(now).is_some();
        let frame = animating.then(|| now + self.config.frame());

        [frame, self.overlay_hide_at, self.timer.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    // -- Lifecycle --

    /// Stop polling and drop all running animations. Every later call is
    /// a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.timer.cancel();
        for fade in &mut self.fades {
            fade.finish_now(&mut self.surface);
        }
        self.fades.clear();
        self.tweens.clear();
        self.overlay_hide_at = None;
        self.pending_command = None;
        self.disposed = true;
    }

    // -- Notices and console --

    pub fn pending_notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        let notice = self.notices.pop_front();
        if notice.is_some() {
            self.surface.mark_dirty();
        }
        notice
    }

    /// Take console lines produced since the last call.
    pub fn drain_console(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.console)
    }

    /// The last few console lines, oldest first.
    pub fn recent_console(&self) -> impl Iterator<Item = &LogEntry> {
        self.recent.iter()
    }

    fn raise_notice(&mut self, message: String) {
        self.notices.push_back(Notice { message });
        self.surface.mark_dirty();
    }

    fn log(&mut self, level: Level, event: &str, message: String) {
        let entry = LogEntry::new(level, event, message);
        if self.recent.len() == RECENT_CONSOLE_LINES {
            self.recent.pop_front();
        }
        self.recent.push_back(entry.clone());
        self.console.push(entry);
    }

    // -- Helpers --

    fn start_fade(&mut self, relabel: Relabel, now: Instant) {
        // A newer transition for the same element supersedes the old one.
        self.fades.retain(|f| f.element() != relabel.element());
        let mut fade = FadeSequence::new(relabel, now, self.config.fade());
        fade.advance(&mut self.surface, now);
        if !fade.is_done() {
            self.fades.push(fade);
        }
    }

    fn show_overlay(&mut self) {
        self.overlay_hide_at = None;
        self.surface.set_visible(ElementId::LoadingOverlay, true);
    }

    fn hide_overlay(&mut self) {
        self.surface.set_visible(ElementId::LoadingOverlay, false);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
