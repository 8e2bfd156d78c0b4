//! Terminal rendering of the dashboard surface.

use std::time::Instant;

use colored::{ColoredString, Colorize};

use super::charts::{draw_bar_chart, draw_line_chart};
use super::controller::DashboardController;
use super::surface::{Element, ElementId, Surface};

/// Clear screen and move the cursor home.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const CHART_WIDTH: usize = 60;
const BAR_WIDTH: usize = 40;

/// Terminal glyph for an icon class.
pub fn glyph(icon: &str) -> &'static str {
    match icon {
        "fa-circle-info" => "ℹ",
        "fa-check-circle" => "✓",
        "fa-exclamation-circle" => "!",
        "fa-exclamation-triangle" => "⚠",
        "fa-radiation" => "☢",
        "fa-video" => "●",
        "fa-video-slash" => "○",
        "fa-play" => "▶",
        "fa-stop" => "■",
        "fa-microchip" => "⚙",
        _ => "·",
    }
}

/// Element text with its icon, faded elements rendered blank.
fn labelled(el: &Element) -> String {
    if el.opacity < 0.5 {
        return " ".repeat(el.text.chars().count() + 2);
    }
    match &el.icon {
        Some(icon) => format!("{} {}", glyph(icon), el.text),
        None => el.text.clone(),
    }
}

fn risk_badge(surface: &Surface) -> ColoredString {
    let text = labelled(surface.get(ElementId::StatusBadge));
    let has = |class| surface.has_class(ElementId::StatusBadge, class);
    if has("risk-low") {
        text.green().bold()
    } else if has("risk-moderate") {
        text.yellow().bold()
    } else if has("risk-high") {
        text.red().bold()
    } else if has("risk-critical") {
        text.white().on_red().bold()
    } else {
        text.dimmed()
    }
}

fn detection_badge(surface: &Surface) -> ColoredString {
    let text = labelled(surface.get(ElementId::DetectionStatus));
    if surface.has_class(ElementId::DetectionStatus, "bg-success") {
        text.green().bold()
    } else {
        text.dimmed()
    }
}

fn toggle_button(surface: &Surface) -> ColoredString {
    let button = surface.get(ElementId::ToggleButton);
    let icon = surface
        .get(ElementId::ButtonIcon)
        .classes
        .iter()
        .find(|c| c.starts_with("fa-"))
        .map(|c| glyph(c))
        .unwrap_or("·");
    let text = if button.opacity < 0.5 {
        " ".repeat(surface.text(ElementId::ButtonText).chars().count() + 6)
    } else {
        format!("[ {icon} {} ]", surface.text(ElementId::ButtonText))
    };

    if button.disabled {
        text.dimmed()
    } else if button.classes.contains("btn-danger") {
        text.red().bold()
    } else {
        text.green().bold()
    }
}

fn metric(label: &str, surface: &Surface, id: ElementId) -> String {
    format!("{:<18} {:>10}", label, surface.text(id).bold())
}

/// Draw one full frame.
pub fn render(controller: &DashboardController, now: Instant) -> String {
    let surface = controller.surface();
    let charts = controller.charts();
    let rule = "─".repeat(72).dimmed();
    let mut out = Vec::new();

    out.push(format!(
        "{}   {}   {}",
        "Bee Colony Health Monitor".bold().yellow(),
        detection_badge(surface),
        labelled(surface.get(ElementId::FpsDisplay)).cyan()
    ));
    out.push(rule.to_string());

    out.push(format!(
        "  {}  {}   {}  {}",
        metric("Current bees", surface, ElementId::CurrentBeeCount),
        surface.text(ElementId::BeeSciNotation).dimmed(),
        metric("Current varroa", surface, ElementId::CurrentVarroaCount),
        surface.text(ElementId::VarroaSciNotation).dimmed(),
    ));
    out.push(format!(
        "  {}           {}",
        metric("Total bees", surface, ElementId::TotalBeeCount),
        metric("Total varroa", surface, ElementId::TotalVarroaCount),
    ));
    out.push(format!(
        "  {}           {}",
        metric("Total frames", surface, ElementId::TotalFrames),
        metric("FPS", surface, ElementId::FpsValue),
    ));
    out.push(format!(
        "  {}           {}",
        metric("Infestation ratio", surface, ElementId::InfestationRatio),
        risk_badge(surface),
    ));
    out.push(rule.to_string());

    for line in draw_line_chart(&charts.detection, now, CHART_WIDTH) {
        out.push(line);
    }
    out.push(String::new());
    for line in draw_line_chart(&charts.ratio, now, CHART_WIDTH) {
        out.push(line);
    }
    out.push(String::new());
    for line in draw_bar_chart(&charts.unique, now, BAR_WIDTH) {
        out.push(line);
    }
    out.push(rule.to_string());

    out.push(format!(
        "  {}   {}",
        toggle_button(surface),
        "Enter/t toggle · r refresh · q quit".dimmed()
    ));
    if surface.is_visible(ElementId::LoadingOverlay) {
        out.push(format!("  {}", "Loading…".cyan().bold()));
    }

    for entry in controller.recent_console() {
        let tag = match entry.level {
            crate::logging::Level::Error => "error".red(),
            crate::logging::Level::Warn => "warn".yellow(),
            crate::logging::Level::Info => "info".dimmed(),
        };
        out.push(format!("  {tag} {}", entry.message.dimmed()));
    }

    if let Some(notice) = controller.pending_notice() {
        out.push(String::new());
        out.push(format!("  {}", "┌ Notice ".red().bold()));
        out.push(format!("  {} {}", "│".red().bold(), notice.message));
        out.push(format!(
            "  {} {}",
            "└".red().bold(),
            "press Enter to dismiss".dimmed()
        ));
    }

    let mut frame = out.join("\n");
    frame.push('\n');
    frame
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
