//! Time-driven animations: counter tweens and fade transitions.
//!
//! Both are plain state machines advanced by the controller's `tick(now)`;
//! nothing here owns a timer or a thread.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use super::surface::{ElementId, Surface};
use super::toggle::Relabel;

/// Swing easing: slow start, fast middle, slow end.
pub fn swing(progress: f64) -> f64 {
    0.5 - (progress.clamp(0.0, 1.0) * PI).cos() / 2.0
}

/// Fraction of `duration` elapsed since `started`, clamped to `[0, 1]`.
pub fn progress(started: Instant, duration: Duration, now: Instant) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(started);
    (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
}

/// Parse the leading decimal number of `text`, ignoring whatever follows
/// (`"12.5 FPS"` → `12.5`). Returns `None` if the text does not start with
/// a number.
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    // Optional exponent, only if it is complete.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Text shown while a counter is mid-animation.
pub fn format_step(value: f64, target: f64) -> String {
    if target.fract() == 0.0 {
        format!("{}", value.floor() as i64)
    } else {
        format!("{value:.2}")
    }
}

// ---------------------------------------------------------------------------
// Counter tween
// ---------------------------------------------------------------------------

/// What happened when a new value was handed to a counter.
#[derive(Debug, Clone, PartialEq)]
pub enum CounterUpdate {
    /// Displayed text already equals the new text.
    Unchanged,
    /// Same numeric value, different formatting: written immediately.
    Snapped,
    /// A tween was started.
    Animating(CounterTween),
}

/// Animates an element's numeric text from its displayed value to a target.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterTween {
    pub element: ElementId,
    from: f64,
    to: f64,
    final_text: String,
    started: Instant,
    duration: Duration,
}

impl CounterTween {
    /// Begin moving `element` towards `new_text`.
    ///
    /// The start value is whatever the element currently shows; text that
    /// does not parse as a number counts as zero, and so does a target that
    /// does not parse.
    pub fn begin(
        surface: &mut Surface,
        element: ElementId,
        new_text: &str,
        now: Instant,
        duration: Duration,
    ) -> CounterUpdate {
        let current_text = surface.text(element);
        if current_text == new_text {
            return CounterUpdate::Unchanged;
        }

        let from = parse_leading_float(current_text).unwrap_or(0.0);
        let to = parse_leading_float(new_text).unwrap_or(0.0);
        if from == to {
            surface.set_text(element, new_text);
            return CounterUpdate::Snapped;
        }

        CounterUpdate::Animating(Self {
            element,
            from,
            to,
            final_text: new_text.to_string(),
            started: now,
            duration,
        })
    }

    pub fn target_text(&self) -> &str {
        &self.final_text
    }

    /// Write the current frame. Returns `true` once the exact final text has
    /// been written.
    pub fn step(&self, surface: &mut Surface, now: Instant) -> bool {
        let p = progress(self.started, self.duration, now);
        if p >= 1.0 {
            surface.set_text(self.element, self.final_text.as_str());
            return true;
        }
        let value = self.from + (self.to - self.from) * swing(p);
        surface.set_text(self.element, format_step(value, self.to));
        false
    }
}

// ---------------------------------------------------------------------------
// Fade transition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    FadingOut,
    FadingIn,
    Done,
}

/// Fade-out, relabel, fade-in.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeSequence {
    relabel: Relabel,
    phase: FadePhase,
    phase_started: Instant,
    half: Duration,
}

impl FadeSequence {
    pub fn new(relabel: Relabel, now: Instant, half: Duration) -> Self {
        Self {
            relabel,
            phase: FadePhase::FadingOut,
            phase_started: now,
            half,
        }
    }

    pub fn element(&self) -> ElementId {
        self.relabel.element()
    }

    pub fn relabel(&self) -> Relabel {
        self.relabel
    }

    pub fn phase(&self) -> FadePhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == FadePhase::Done
    }

    /// Advance to `now`, crossing as many phase boundaries as have elapsed.
    pub fn advance(&mut self, surface: &mut Surface, now: Instant) {
        let element = self.element();
        loop {
            match self.phase {
                FadePhase::FadingOut => {
                    let p = progress(self.phase_started, self.half, now);
                    surface.set_opacity(element, 1.0 - p);
                    if p < 1.0 {
                        return;
                    }
                    self.relabel.apply(surface);
                    self.phase = FadePhase::FadingIn;
                    self.phase_started += self.half;
                }
                FadePhase::FadingIn => {
                    let p = progress(self.phase_started, self.half, now);
                    surface.set_opacity(element, p);
                    if p < 1.0 {
                        return;
                    }
                    self.relabel.finish(surface);
                    self.phase = FadePhase::Done;
                }
                FadePhase::Done => return,
            }
        }
    }

    /// Jump straight to the end state.
    pub fn finish_now(&mut self, surface: &mut Surface) {
        if self.phase == FadePhase::FadingOut {
            self.relabel.apply(surface);
        }
        if self.phase != FadePhase::Done {
            self.relabel.finish(surface);
            surface.set_opacity(self.element(), 1.0);
            self.phase = FadePhase::Done;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskLevel;

    #[test]
    fn parse_leading_float_variants() {
        assert_eq!(parse_leading_float("12"), Some(12.0));
        assert_eq!(parse_leading_float("  0.20"), Some(0.2));
        assert_eq!(parse_leading_float("29.7 FPS"), Some(29.7));
        assert_eq!(parse_leading_float("-3.5x"), Some(-3.5));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("5."), Some(5.0));
        assert_eq!(parse_leading_float("1e3"), Some(1000.0));
        assert_eq!(parse_leading_float("2e"), Some(2.0));
        assert_eq!(parse_leading_float("n = 5"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("."), None);
    }

    #[test]
    fn swing_endpoints() {
        assert!((swing(0.0)).abs() < 1e-12);
        assert!((swing(0.5) - 0.5).abs() < 1e-12);
        assert!((swing(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn format_step_integer_vs_float() {
        assert_eq!(format_step(3.7, 10.0), "3");
        assert_eq!(format_step(0.1234, 0.2), "0.12");
    }

    #[test]
    fn counter_tween_finishes_with_exact_text() {
        let mut surface = Surface::new();
        let t0 = Instant::now();
        let duration = Duration::from_millis(800);

        let CounterUpdate::Animating(tween) =
            CounterTween::begin(&mut surface, ElementId::FpsValue, "29.7", t0, duration)
        else {
            panic!("expected a tween");
        };

        assert!(!tween.step(&mut surface, t0 + Duration::from_millis(400)));
        let mid = parse_leading_float(surface.text(ElementId::FpsValue)).unwrap();
        assert!(mid > 0.0 && mid < 29.7);

        assert!(tween.step(&mut surface, t0 + duration));
        assert_eq!(surface.text(ElementId::FpsValue), "29.7");
    }

    #[test]
    fn counter_tween_integer_steps_floor() {
        let mut surface = Surface::new();
        let t0 = Instant::now();
        let CounterUpdate::Animating(tween) = CounterTween::begin(
            &mut surface,
            ElementId::CurrentBeeCount,
            "10",
            t0,
            Duration::from_millis(800),
        ) else {
            panic!("expected a tween");
        };
        tween.step(&mut surface, t0 + Duration::from_millis(300));
        let text = surface.text(ElementId::CurrentBeeCount).to_string();
        assert!(!text.contains('.'), "integer target shows integers, got {text}");
    }

    #[test]
    fn equal_value_is_unchanged_or_snapped() {
        let mut surface = Surface::new();
        let t0 = Instant::now();
        let d = Duration::from_millis(800);
        assert_eq!(
            CounterTween::begin(&mut surface, ElementId::TotalFrames, "0", t0, d),
            CounterUpdate::Unchanged
        );
        assert_eq!(
            CounterTween::begin(&mut surface, ElementId::InfestationRatio, "0.0", t0, d),
            CounterUpdate::Snapped
        );
        assert_eq!(surface.text(ElementId::InfestationRatio), "0.0");
    }

    #[test]
    fn fade_relabels_at_midpoint() {
        let mut surface = Surface::new();
        let t0 = Instant::now();
        let half = Duration::from_millis(200);
        let mut fade = FadeSequence::new(Relabel::RiskBadge(RiskLevel::High), t0, half);

        fade.advance(&mut surface, t0 + Duration::from_millis(100));
        assert_eq!(fade.phase(), FadePhase::FadingOut);
        assert!(surface.has_class(ElementId::StatusBadge, "risk-unknown"));

        fade.advance(&mut surface, t0 + Duration::from_millis(250));
        assert_eq!(fade.phase(), FadePhase::FadingIn);
        assert!(surface.has_class(ElementId::StatusBadge, "risk-high"));
        assert!(!surface.has_class(ElementId::StatusBadge, "risk-unknown"));

        fade.advance(&mut surface, t0 + Duration::from_millis(400));
        assert!(fade.is_done());
        assert_eq!(surface.get(ElementId::StatusBadge).opacity, 1.0);
    }

    #[test]
    fn fade_crosses_both_phases_in_one_tick() {
        let mut surface = Surface::new();
        let t0 = Instant::now();
        surface.set_disabled(ElementId::ToggleButton, true);
        let mut fade = FadeSequence::new(
            Relabel::ToggleButton { active: true },
            t0,
            Duration::from_millis(200),
        );
        fade.advance(&mut surface, t0 + Duration::from_secs(5));
        assert!(fade.is_done());
        assert_eq!(surface.text(ElementId::ButtonText), "Stop Detection");
        assert!(!surface.is_disabled(ElementId::ToggleButton));
    }
}
