//! Chart models for the three dashboard charts and their terminal drawing.
//!
//! Each update replaces one chart's dataset and requests a redraw with an
//! animation duration. Redraws interpolate from the previous values to the
//! new ones over that duration, the way the web charts grow into place.

use std::time::{Duration, Instant};

use colored::{Color, Colorize};

use crate::config::schema::DashboardConfig;
use crate::model::{RISK_HIGH_BELOW, RISK_LOW_BELOW, RISK_MODERATE_BELOW, TimeSeries};

use super::animation::{progress, swing};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

// ---------------------------------------------------------------------------
// Chart model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub label: &'static str,
    pub color: Color,
    pub data: Vec<f64>,
    previous: Vec<f64>,
}

impl Dataset {
    fn new(label: &'static str, color: Color, data: Vec<f64>) -> Self {
        Self {
            label,
            color,
            previous: data.clone(),
            data,
        }
    }

    fn replace(&mut self, data: Vec<f64>) {
        self.previous = std::mem::replace(&mut self.data, data);
    }

    /// Values as drawn at animation progress `p` (0 = previous, 1 = current).
    pub fn displayed(&self, p: f64) -> Vec<f64> {
        let eased = swing(p);
        self.data
            .iter()
            .enumerate()
            .map(|(i, &to)| {
                let from = self.previous.get(i).copied().unwrap_or(0.0);
                from + (to - from) * eased
            })
            .collect()
    }
}

/// Horizontal reference line.
#[derive(Debug, Clone, Copy)]
pub struct Threshold {
    pub value: f64,
    pub label: &'static str,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: &'static str,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub thresholds: Vec<Threshold>,
    /// Duration of the most recently requested redraw.
    pub animation: Duration,
    /// Number of redraws requested so far.
    pub redraws: u64,
    last_redraw: Option<Instant>,
}

impl Chart {
    fn new(kind: ChartKind, title: &'static str, datasets: Vec<Dataset>) -> Self {
        Self {
            kind,
            title,
            labels: Vec::new(),
            datasets,
            thresholds: Vec::new(),
            animation: Duration::ZERO,
            redraws: 0,
            last_redraw: None,
        }
    }

    fn request_redraw(&mut self, animation: Duration, now: Instant) {
        self.animation = animation;
        self.redraws += 1;
        self.last_redraw = Some(now);
    }

    /// Redraw progress at `now`; 1.0 when idle.
    pub fn progress(&self, now: Instant) -> f64 {
        match self.last_redraw {
            Some(started) => progress(started, self.animation, now),
            None => 1.0,
        }
    }

    /// When the current redraw animation ends, if one is running.
    pub fn animating_until(&self, now: Instant) -> Option<Instant> {
        let started = self.last_redraw?;
        let end = started + self.animation;
        (end > now).then_some(end)
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Owns the three charts and the shared update counter.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    pub detection: Chart,
    pub unique: Chart,
    pub ratio: Chart,
    update_counter: u64,
    full_animation: Duration,
    short_animation: Duration,
    full_every: u64,
}

impl ChartRenderer {
    /// Empty charts, styled as on the web dashboard.
    pub fn new(config: &DashboardConfig) -> Self {
        let detection = Chart::new(
            ChartKind::Line,
            "Detection Trend",
            vec![
                Dataset::new("Bees", Color::Yellow, Vec::new()),
                Dataset::new("Varroa Mites", Color::Red, Vec::new()),
            ],
        );

        let mut unique = Chart::new(
            ChartKind::Bar,
            "Unique Objects",
            vec![Dataset::new("Unique Objects", Color::Yellow, vec![0.0, 0.0])],
        );
        unique.labels = vec!["Bees".to_string(), "Varroa Mites".to_string()];

        let mut ratio = Chart::new(
            ChartKind::Line,
            "Infestation Ratio",
            vec![Dataset::new("Varroa:Bee Ratio", Color::Magenta, Vec::new())],
        );
        ratio.thresholds = vec![
            Threshold {
                value: RISK_LOW_BELOW,
                label: "Low",
                color: Color::Green,
            },
            Threshold {
                value: RISK_MODERATE_BELOW,
                label: "Moderate",
                color: Color::Yellow,
            },
            Threshold {
                value: RISK_HIGH_BELOW,
                label: "High",
                color: Color::Red,
            },
        ];

        Self {
            detection,
            unique,
            ratio,
            update_counter: 0,
            full_animation: Duration::from_millis(config.chart_full_animation_ms),
            short_animation: Duration::from_millis(config.chart_short_animation_ms),
            full_every: config.full_animation_every.max(1),
        }
    }

    pub fn update_counter(&self) -> u64 {
        self.update_counter
    }

    /// Full animation every Nth update, abbreviated otherwise.
    fn trend_animation(&self) -> Duration {
        if self.update_counter % self.full_every == 0 {
            self.full_animation
        } else {
            self.short_animation
        }
    }

    /// Replace the detection trend with `series`.
    pub fn update_detection(&mut self, series: &TimeSeries, now: Instant) {
        self.detection.labels = series.timestamps.clone();
        self.detection.datasets[0].replace(series.bee_counts.iter().map(|&n| n as f64).collect());
        self.detection.datasets[1]
            .replace(series.varroa_counts.iter().map(|&n| n as f64).collect());

        self.update_counter += 1;
        let animation = self.trend_animation();
        self.detection.request_redraw(animation, now);
    }

    /// Replace the unique-object bars.
    pub fn update_unique(&mut self, bees: u64, varroa: u64, now: Instant) {
        self.unique.datasets[0].replace(vec![bees as f64, varroa as f64]);
        self.unique.request_redraw(self.full_animation, now);
    }

    /// Replace the ratio trend with `series`. Shares the counter advanced by
    /// the preceding detection update.
    pub fn update_ratio(&mut self, series: &TimeSeries, now: Instant) {
        self.ratio.labels = series.timestamps.clone();
        self.ratio.datasets[0].replace(series.infestation_ratio.clone());
        let animation = self.trend_animation();
        self.ratio.request_redraw(animation, now);
    }

    /// Latest end of any running chart animation.
    pub fn animating_until(&self, now: Instant) -> Option<Instant> {
        [&self.detection, &self.unique, &self.ratio]
            .into_iter()
            .filter_map(|chart| chart.animating_until(now))
            .max()
    }
}

// ---------------------------------------------------------------------------
// Terminal drawing
// ---------------------------------------------------------------------------

/// One character per value, scaled against `max`.
pub fn sparkline(values: &[f64], max: f64) -> String {
    values
        .iter()
        .map(|&v| {
            if max <= 0.0 || v <= 0.0 {
                return SPARK_LEVELS[0];
            }
            let idx = ((v / max) * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[idx.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

/// Draw a line chart as one sparkline row per dataset, showing the newest
/// `width` points.
pub fn draw_line_chart(chart: &Chart, now: Instant, width: usize) -> Vec<String> {
    let p = chart.progress(now);
    let series: Vec<Vec<f64>> = chart.datasets.iter().map(|ds| ds.displayed(p)).collect();

    let data_max = series
        .iter()
        .flatten()
        .copied()
        .fold(0.0_f64, f64::max);
    let threshold_max = chart
        .thresholds
        .iter()
        .map(|t| t.value)
        .fold(0.0_f64, f64::max);
    let max = data_max.max(threshold_max);

    let mut lines = Vec::new();
    lines.push(format!("{}", chart.title.bold()));

    if chart.labels.is_empty() {
        lines.push(format!("  {}", "no data yet".dimmed()));
        return lines;
    }

    let skip = chart.labels.len().saturating_sub(width);
    let first = &chart.labels[skip];
    let last = &chart.labels[chart.labels.len() - 1];

    for (ds, values) in chart.datasets.iter().zip(&series) {
        let window = &values[skip.min(values.len())..];
        let latest = window.last().copied().unwrap_or(0.0);
        let latest = if chart.thresholds.is_empty() {
            format!("{latest:.0}")
        } else {
            format!("{latest:.3}")
        };
        lines.push(format!(
            "  {:<18} {} {}",
            ds.label,
            sparkline(window, max).color(ds.color),
            latest.bold()
        ));
    }

    if !chart.thresholds.is_empty() {
        let marks: Vec<String> = chart
            .thresholds
            .iter()
            .map(|t| format!("{} {:.2}", t.label, t.value).color(t.color).to_string())
            .collect();
        lines.push(format!("  {:<18} {}", "", marks.join("  ").dimmed()));
    }

    lines.push(format!("  {:<18} {first} .. {last}", "").dimmed().to_string());
    lines
}

/// Draw a bar chart as one horizontal bar per label.
pub fn draw_bar_chart(chart: &Chart, now: Instant, width: usize) -> Vec<String> {
    let p = chart.progress(now);
    let values = chart
        .datasets
        .first()
        .map(|ds| ds.displayed(p))
        .unwrap_or_default();
    let max = values.iter().copied().fold(1.0_f64, f64::max);
    let colors = [Color::Yellow, Color::Red];

    let mut lines = vec![format!("{}", chart.title.bold())];
    for (i, label) in chart.labels.iter().enumerate() {
        let value = values.get(i).copied().unwrap_or(0.0);
        let len = ((value / max) * width as f64).round() as usize;
        let target = chart
            .datasets
            .first()
            .and_then(|ds| ds.data.get(i))
            .copied()
            .unwrap_or(0.0);
        lines.push(format!(
            "  {:<18} {} {}",
            label,
            "█".repeat(len).color(colors[i % colors.len()]),
            format!("{target:.0}").bold()
        ));
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
