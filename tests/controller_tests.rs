/// Dashboard controller tests.
///
/// Drives `DashboardController` with an injected clock and canned backend
/// results, checking what ends up on the surface once animations settle.
use std::time::{Duration, Instant};

use anyhow::anyhow;
use hivewatch::config::schema::DashboardConfig;
use hivewatch::dashboard::poller::PollTicket;
use hivewatch::dashboard::toggle::{current_risk_class, risk_presentation};
use hivewatch::dashboard::{
    CommandKind, DashboardController, DetectionState, ElementId, Request,
};
use hivewatch::logging::Level;
use hivewatch::model::{CommandResponse, RiskLevel, Snapshot, TimeSeries};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Long enough for every counter tween and fade to finish.
const SETTLE: Duration = Duration::from_secs(2);

fn controller() -> DashboardController {
    DashboardController::create(&DashboardConfig::default())
}

fn ticket_of(requests: &[Request]) -> PollTicket {
    match requests.first() {
        Some(Request::FetchStats(ticket)) => *ticket,
        other => panic!("expected a stats request, got {other:?}"),
    }
}

fn scenario_snapshot() -> Snapshot {
    Snapshot {
        current_bees: 5,
        current_varroa: 1,
        infestation_ratio: 0.2,
        infestation_risk_level: RiskLevel::High,
        ..Snapshot::default()
    }
}

/// Refresh, deliver `snap`, and let everything settle.
fn apply(c: &mut DashboardController, snap: Snapshot, now: Instant) -> Instant {
    let ticket = ticket_of(&c.refresh(now));
    c.on_stats(ticket, Ok(snap), now);
    let settled = now + SETTLE;
    c.tick(settled);
    settled
}

/// Bring a fresh controller to `Active` with the button usable again.
fn activate(c: &mut DashboardController, now: Instant) -> Instant {
    assert_eq!(c.toggle(now), Some(Request::Command(CommandKind::Start)));
    c.on_command(
        CommandKind::Start,
        Ok(CommandResponse::new("started")),
        now,
    );
    // Before the first refresh timer firing.
    let later = now + Duration::from_millis(500);
    assert!(c.tick(later).is_empty());
    later
}

// ---------------------------------------------------------------------------
// Stats poller
// ---------------------------------------------------------------------------

#[test]
fn snapshot_scenario_reaches_exact_text() {
    let mut c = controller();
    let t0 = Instant::now();
    apply(&mut c, scenario_snapshot(), t0);

    let s = c.surface();
    assert_eq!(s.text(ElementId::CurrentBeeCount), "5");
    assert_eq!(s.text(ElementId::CurrentVarroaCount), "1");
    assert_eq!(s.text(ElementId::InfestationRatio), "0.20");
    assert_eq!(s.text(ElementId::FpsDisplay), "0.0 FPS");
    assert_eq!(s.text(ElementId::BeeSciNotation), "n = 5");
    assert_eq!(s.text(ElementId::VarroaSciNotation), "n = 1");
    assert_eq!(s.text(ElementId::StatusBadge), "High Risk");
    assert_eq!(current_risk_class(s), Some("risk-high"));
    assert!(!c.is_animating());
}

#[test]
fn counters_are_mid_animation_before_settling() {
    let mut c = controller();
    let t0 = Instant::now();
    let ticket = ticket_of(&c.refresh(t0));
    c.on_stats(
        ticket,
        Ok(Snapshot {
            total_frames: 1000,
            ..Snapshot::default()
        }),
        t0,
    );
    assert!(c.is_animating());

    c.tick(t0 + Duration::from_millis(400));
    let mid: u64 = c.surface().text(ElementId::TotalFrames).parse().unwrap();
    assert!(mid > 0 && mid < 1000, "mid-animation value was {mid}");

    c.tick(t0 + SETTLE);
    assert_eq!(c.surface().text(ElementId::TotalFrames), "1000");
}

#[test]
fn counters_overwrite_non_numeric_text() {
    let mut c = controller();
    let t0 = Instant::now();
    c.surface_mut().set_text(ElementId::CurrentBeeCount, "n/a");
    c.surface_mut().set_text(ElementId::FpsValue, "29.97 fps");

    apply(
        &mut c,
        Snapshot {
            current_bees: 5,
            fps: 30.0,
            ..Snapshot::default()
        },
        t0,
    );
    assert_eq!(c.surface().text(ElementId::CurrentBeeCount), "5");
    assert_eq!(c.surface().text(ElementId::FpsValue), "30.0");
}

#[test]
fn fps_with_equal_value_snaps_to_new_format() {
    let mut c = controller();
    let t0 = Instant::now();
    c.surface_mut().set_text(ElementId::FpsValue, "30");
    let ticket = ticket_of(&c.refresh(t0));
    c.on_stats(
        ticket,
        Ok(Snapshot {
            fps: 30.0,
            ..Snapshot::default()
        }),
        t0,
    );
    assert_eq!(c.surface().text(ElementId::FpsValue), "30.0");
}

#[test]
fn every_risk_level_yields_only_its_class() {
    for level in RiskLevel::ALL {
        let mut c = controller();
        apply(
            &mut c,
            Snapshot {
                infestation_risk_level: level,
                ..Snapshot::default()
            },
            Instant::now(),
        );

        let (icon, class) = risk_presentation(level);
        assert_eq!(current_risk_class(c.surface()), Some(class), "{level}");
        assert_eq!(
            c.surface().get(ElementId::StatusBadge).icon.as_deref(),
            Some(icon)
        );
        assert_eq!(c.surface().text(ElementId::StatusBadge), format!("{level} Risk"));
        assert!(c.surface().has_class(ElementId::StatusBadge, "status-badge"));
    }
}

#[test]
fn risk_change_replaces_previous_class() {
    let mut c = controller();
    let t = apply(&mut c, scenario_snapshot(), Instant::now());
    apply(
        &mut c,
        Snapshot {
            infestation_risk_level: RiskLevel::Low,
            ..scenario_snapshot()
        },
        t,
    );
    assert_eq!(current_risk_class(c.surface()), Some("risk-low"));
    assert!(!c.surface().has_class(ElementId::StatusBadge, "risk-high"));
}

#[test]
fn identical_refresh_starts_no_animation() {
    let mut c = controller();
    let t1 = apply(&mut c, scenario_snapshot(), Instant::now());

    let ticket = ticket_of(&c.refresh(t1));
    c.on_stats(ticket, Ok(scenario_snapshot()), t1);
    assert!(!c.is_animating());
    assert_eq!(c.surface().text(ElementId::CurrentBeeCount), "5");
}

#[test]
fn refresh_overlay_cleared_by_stats() {
    let mut c = controller();
    let t0 = Instant::now();
    let ticket = ticket_of(&c.refresh(t0));
    assert!(c.surface().is_visible(ElementId::LoadingOverlay));

    c.on_stats(ticket, Ok(Snapshot::default()), t0);
    assert!(!c.surface().is_visible(ElementId::LoadingOverlay));
}

#[test]
fn refresh_while_active_keeps_overlay_hidden() {
    let mut c = controller();
    let t1 = activate(&mut c, Instant::now());
    assert!(!c.surface().is_visible(ElementId::LoadingOverlay));

    let ticket = ticket_of(&c.refresh(t1));
    assert!(!c.surface().is_visible(ElementId::LoadingOverlay));

    c.on_stats(ticket, Ok(scenario_snapshot()), t1);
    c.tick(t1 + SETTLE);
    assert!(!c.surface().is_visible(ElementId::LoadingOverlay));
    assert_eq!(c.surface().text(ElementId::CurrentBeeCount), "5");
}

#[test]
fn stats_failure_leaves_display_and_logs() {
    let mut c = controller();
    let t1 = apply(&mut c, scenario_snapshot(), Instant::now());
    c.drain_console();

    let ticket = ticket_of(&c.refresh(t1));
    c.on_stats(ticket, Err(anyhow!("connection refused")), t1);

    assert!(!c.surface().is_visible(ElementId::LoadingOverlay));
    assert_eq!(c.surface().text(ElementId::CurrentBeeCount), "5");
    assert_eq!(current_risk_class(c.surface()), Some("risk-high"));
    assert!(c.pending_notice().is_none());

    let console = c.drain_console();
    assert!(
        console
            .iter()
            .any(|e| e.level == Level::Error && e.message.contains("connection refused"))
    );
}

#[test]
fn time_series_updates_charts() {
    let mut c = controller();
    let t0 = Instant::now();
    let ticket = ticket_of(&c.refresh(t0));
    let series = TimeSeries {
        timestamps: vec!["10:00:00".into(), "10:00:01".into(), "10:00:02".into()],
        bee_counts: vec![4, 6, 5],
        varroa_counts: vec![0, 1, 1],
        infestation_ratio: vec![0.0, 0.1, 0.2],
    };
    c.on_time_series(ticket, Ok(series), t0);

    let charts = c.charts();
    assert_eq!(charts.detection.labels.len(), 3);
    assert_eq!(charts.detection.datasets[0].data, vec![4.0, 6.0, 5.0]);
    assert_eq!(charts.detection.datasets[1].data, vec![0.0, 1.0, 1.0]);
    assert_eq!(charts.ratio.datasets[0].data, vec![0.0, 0.1, 0.2]);
    assert_eq!(charts.update_counter(), 1);
}

#[test]
fn inconsistent_time_series_is_rejected() {
    let mut c = controller();
    let t0 = Instant::now();
    let ticket = ticket_of(&c.refresh(t0));
    let series = TimeSeries {
        timestamps: vec!["10:00:00".into(), "10:00:01".into()],
        bee_counts: vec![4],
        varroa_counts: vec![0, 1],
        infestation_ratio: vec![0.0, 0.1],
    };
    c.on_time_series(ticket, Ok(series), t0);

    assert!(c.charts().detection.labels.is_empty());
    assert!(
        c.drain_console()
            .iter()
            .any(|e| e.level == Level::Error && e.event == "fetch_time_series")
    );
}

// ---------------------------------------------------------------------------
// Detection toggle
// ---------------------------------------------------------------------------

#[test]
fn start_scenario_activates_and_polls() {
    let mut c = controller();
    let t0 = Instant::now();

    let request = c.toggle(t0);
    assert_eq!(request, Some(Request::Command(CommandKind::Start)));
    assert!(c.surface().is_disabled(ElementId::ToggleButton));
    assert!(c.surface().is_visible(ElementId::LoadingOverlay));

    c.on_command(
        CommandKind::Start,
        Ok(CommandResponse::new("started")),
        t0,
    );
    assert_eq!(c.state(), DetectionState::Active);
    assert!(c.is_polling());

    let t1 = t0 + Duration::from_millis(500);
    assert!(c.tick(t1).is_empty());
    let s = c.surface();
    assert_eq!(s.text(ElementId::ButtonText), "Stop Detection");
    assert!(s.has_class(ElementId::ToggleButton, "btn-danger"));
    assert!(!s.has_class(ElementId::ToggleButton, "btn-success"));
    assert!(s.has_class(ElementId::ButtonIcon, "fa-stop"));
    assert_eq!(s.text(ElementId::DetectionStatus), "Active");
    assert!(s.has_class(ElementId::DetectionStatus, "bg-success"));
    assert!(!s.is_disabled(ElementId::ToggleButton));
    assert!(!s.is_visible(ElementId::LoadingOverlay));

    // The refresh timer fires one poll interval after activation.
    let requests = c.tick(t0 + Duration::from_millis(1000));
    assert_eq!(requests.len(), 2);
    assert!(matches!(requests[1], Request::FetchTimeSeries(_)));
    assert!(!c.surface().is_visible(ElementId::LoadingOverlay));
}

#[test]
fn already_running_also_activates() {
    let mut c = controller();
    let t0 = Instant::now();
    c.start(t0);
    c.on_command(
        CommandKind::Start,
        Ok(CommandResponse::new("already_running")),
        t0,
    );
    assert_eq!(c.state(), DetectionState::Active);
    assert!(c.is_polling());
}

#[test]
fn already_stopped_deactivates_and_stops_polling() {
    let mut c = controller();
    let t1 = activate(&mut c, Instant::now());

    assert_eq!(c.toggle(t1), Some(Request::Command(CommandKind::Stop)));
    c.on_command(
        CommandKind::Stop,
        Ok(CommandResponse::new("already_stopped")),
        t1,
    );
    assert_eq!(c.state(), DetectionState::Inactive);
    assert!(!c.is_polling());

    for secs in 1..=10 {
        assert!(c.tick(t1 + Duration::from_secs(secs)).is_empty());
    }
    let s = c.surface();
    assert_eq!(s.text(ElementId::ButtonText), "Start Detection");
    assert!(s.has_class(ElementId::ButtonIcon, "fa-play"));
    assert_eq!(s.text(ElementId::DetectionStatus), "Inactive");
    assert!(s.has_class(ElementId::DetectionStatus, "bg-secondary"));
}

#[test]
fn error_status_keeps_state_and_raises_notice() {
    let mut c = controller();
    let t0 = Instant::now();
    c.toggle(t0);
    c.on_command(
        CommandKind::Start,
        Ok(CommandResponse::new("error")),
        t0,
    );

    assert_eq!(c.state(), DetectionState::Inactive);
    assert!(!c.is_polling());
    assert!(!c.surface().is_disabled(ElementId::ToggleButton));
    let notice = c.pending_notice().expect("notice raised");
    assert!(notice.message.contains("Failed to start detection"));
    assert!(notice.message.contains("error"));

    assert!(c.dismiss_notice().is_some());
    assert!(c.pending_notice().is_none());
    c.tick(t0 + SETTLE);
    assert_eq!(c.surface().text(ElementId::ButtonText), "Start Detection");
}

#[test]
fn stop_rejects_start_statuses() {
    let mut c = controller();
    let t1 = activate(&mut c, Instant::now());
    c.stop(t1);
    c.on_command(
        CommandKind::Stop,
        Ok(CommandResponse::new("started")),
        t1,
    );
    assert_eq!(c.state(), DetectionState::Active);
    assert!(c.is_polling());
    assert!(c.pending_notice().is_some());
}

#[test]
fn command_network_failure_restores_button() {
    let mut c = controller();
    let t0 = Instant::now();
    c.toggle(t0);
    c.on_command(CommandKind::Start, Err(anyhow!("timed out")), t0);

    assert_eq!(c.state(), DetectionState::Inactive);
    assert!(!c.surface().is_visible(ElementId::LoadingOverlay));
    assert!(!c.surface().is_disabled(ElementId::ToggleButton));
    assert!(c.pending_notice().is_some());
    assert!(c.pending_command().is_none());
}

#[test]
fn toggle_refused_while_command_pending() {
    let mut c = controller();
    let t0 = Instant::now();
    assert!(c.toggle(t0).is_some());
    assert_eq!(c.pending_command(), Some(CommandKind::Start));
    assert!(c.toggle(t0).is_none());
    assert!(c.start(t0).is_none());
}

#[test]
fn start_and_stop_gated_on_state() {
    let mut c = controller();
    let t0 = Instant::now();
    assert!(c.stop(t0).is_none());
    let t1 = activate(&mut c, t0);
    assert!(c.start(t1).is_none());
}

#[test]
fn overlay_hides_after_delay_on_success() {
    let mut c = controller();
    let t0 = Instant::now();
    c.toggle(t0);
    c.on_command(
        CommandKind::Start,
        Ok(CommandResponse::new("started")),
        t0,
    );
    c.tick(t0 + Duration::from_millis(100));
    assert!(c.surface().is_visible(ElementId::LoadingOverlay));
    c.tick(t0 + Duration::from_millis(500));
    assert!(!c.surface().is_visible(ElementId::LoadingOverlay));
}

// ---------------------------------------------------------------------------
// Polling epochs and lifecycle
// ---------------------------------------------------------------------------

#[test]
fn results_from_before_stop_are_discarded() {
    let mut c = controller();
    let t0 = Instant::now();
    activate(&mut c, t0);

    let t1 = t0 + Duration::from_millis(1000);
    let ticket = ticket_of(&c.tick(t1));

    c.stop(t1);
    c.on_command(
        CommandKind::Stop,
        Ok(CommandResponse::new("stopped")),
        t1,
    );
    c.drain_console();
    c.on_stats(ticket, Ok(scenario_snapshot()), t1);
    c.tick(t1 + SETTLE);

    assert_eq!(c.surface().text(ElementId::CurrentBeeCount), "0");
    assert_eq!(current_risk_class(c.surface()), Some("risk-unknown"));
    assert!(
        c.drain_console()
            .iter()
            .any(|e| e.level == Level::Warn && e.event == "fetch_stats")
    );
}

#[test]
fn polling_resumes_with_new_epoch_after_restart() {
    let mut c = controller();
    let t0 = Instant::now();
    let t1 = activate(&mut c, t0);
    let old = ticket_of(&c.tick(t0 + Duration::from_millis(1000)));

    c.stop(t1 + Duration::from_secs(1));
    c.on_command(
        CommandKind::Stop,
        Ok(CommandResponse::new("stopped")),
        t1 + Duration::from_secs(1),
    );
    // Let the stop transition finish so the button is usable again.
    assert!(c.tick(t1 + Duration::from_secs(2)).is_empty());
    assert!(!c.surface().is_disabled(ElementId::ToggleButton));
    let t2 = activate(&mut c, t1 + Duration::from_secs(2));
    let new = ticket_of(&c.tick(t2 + Duration::from_millis(1000)));
    assert!(new.epoch > old.epoch);

    c.on_stats(new, Ok(scenario_snapshot()), t2);
    c.tick(t2 + SETTLE);
    assert_eq!(c.surface().text(ElementId::CurrentBeeCount), "5");
}

#[test]
fn dispose_stops_everything() {
    let mut c = controller();
    let t0 = Instant::now();
    activate(&mut c, t0);
    c.dispose();
    c.dispose();

    assert!(c.is_disposed());
    assert!(!c.is_polling());
    assert!(!c.is_animating());
    assert!(c.tick(t0 + Duration::from_secs(5)).is_empty());
    assert!(c.refresh(t0).is_empty());
    assert!(c.toggle(t0).is_none());
    assert!(c.next_wakeup(t0).is_none());
}

#[test]
fn next_wakeup_tracks_timer_when_idle() {
    let mut c = controller();
    let t0 = Instant::now();
    assert!(c.next_wakeup(t0).is_none());

    let t1 = activate(&mut c, t0);
    let next = c.next_wakeup(t1).expect("timer scheduled");
    assert!(next <= t0 + Duration::from_millis(1000));
}
