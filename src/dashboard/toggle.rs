//! Detection toggle state machine and the badge/button presentations it
//! drives.
//!
//! ```text
//!   Inactive --start [started | already_running]--> Active
//!   Active   --stop  [stopped | already_stopped]--> Inactive
//! ```
//!
//! Any other outcome leaves the state where it was.

use crate::model::{CommandStatus, RiskLevel};

use super::surface::{ElementId, Surface};

/// Whether the remote detection process is believed to be running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectionState {
    #[default]
    Inactive,
    Active,
}

impl DetectionState {
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// The command a toggle press issues from this state.
    pub fn toggle_command(self) -> CommandKind {
        match self {
            Self::Inactive => CommandKind::Start,
            Self::Active => CommandKind::Stop,
        }
    }

    /// State after `kind` answered `status`, or `None` if the answer does
    /// not permit a transition from here.
    pub fn transition(self, kind: CommandKind, status: &CommandStatus) -> Option<Self> {
        match (self, kind) {
            (Self::Inactive, CommandKind::Start) if kind.accepts(status) => Some(Self::Active),
            (Self::Active, CommandKind::Stop) if kind.accepts(status) => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for DetectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "Inactive"),
            Self::Active => write!(f, "Active"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Stop,
}

impl CommandKind {
    /// Statuses that confirm this command took effect.
    pub fn accepts(self, status: &CommandStatus) -> bool {
        match self {
            Self::Start => matches!(status, CommandStatus::Started | CommandStatus::AlreadyRunning),
            Self::Stop => matches!(status, CommandStatus::Stopped | CommandStatus::AlreadyStopped),
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

// ---------------------------------------------------------------------------
// Presentations
// ---------------------------------------------------------------------------

/// Every class the risk badge can carry.
pub const RISK_CLASSES: [&str; 5] = [
    "risk-unknown",
    "risk-low",
    "risk-moderate",
    "risk-high",
    "risk-critical",
];

/// Icon and CSS class for a risk level.
pub fn risk_presentation(level: RiskLevel) -> (&'static str, &'static str) {
    match level {
        RiskLevel::Unknown => ("fa-circle-info", "risk-unknown"),
        RiskLevel::Low => ("fa-check-circle", "risk-low"),
        RiskLevel::Moderate => ("fa-exclamation-circle", "risk-moderate"),
        RiskLevel::High => ("fa-exclamation-triangle", "risk-high"),
        RiskLevel::Critical => ("fa-radiation", "risk-critical"),
    }
}

/// The swap performed at the midpoint of a fade transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relabel {
    RiskBadge(RiskLevel),
    DetectionStatus { active: bool },
    ToggleButton { active: bool },
}

impl Relabel {
    pub fn element(self) -> ElementId {
        match self {
            Self::RiskBadge(_) => ElementId::StatusBadge,
            Self::DetectionStatus { .. } => ElementId::DetectionStatus,
            Self::ToggleButton { .. } => ElementId::ToggleButton,
        }
    }

    /// Runs when the element has faded out.
    pub fn apply(self, surface: &mut Surface) {
        match self {
            Self::RiskBadge(level) => {
                let (icon, class) = risk_presentation(level);
                surface.remove_classes(ElementId::StatusBadge, &RISK_CLASSES);
                surface.add_class(ElementId::StatusBadge, class);
                surface.set_icon(ElementId::StatusBadge, icon);
                surface.set_text(ElementId::StatusBadge, format!("{level} Risk"));
            }
            Self::DetectionStatus { active: true } => {
                surface.remove_class(ElementId::DetectionStatus, "bg-secondary");
                surface.add_class(ElementId::DetectionStatus, "bg-success");
                surface.set_icon(ElementId::DetectionStatus, "fa-video");
                surface.set_text(ElementId::DetectionStatus, "Active");
            }
            Self::DetectionStatus { active: false } => {
                surface.remove_class(ElementId::DetectionStatus, "bg-success");
                surface.add_class(ElementId::DetectionStatus, "bg-secondary");
                surface.set_icon(ElementId::DetectionStatus, "fa-video-slash");
                surface.set_text(ElementId::DetectionStatus, "Inactive");
            }
            Self::ToggleButton { active: true } => {
                surface.remove_class(ElementId::ToggleButton, "btn-success");
                surface.add_class(ElementId::ToggleButton, "btn-danger");
                surface.remove_class(ElementId::ButtonIcon, "fa-play");
                surface.add_class(ElementId::ButtonIcon, "fa-stop");
                surface.set_text(ElementId::ButtonText, "Stop Detection");
            }
            Self::ToggleButton { active: false } => {
                surface.remove_class(ElementId::ToggleButton, "btn-danger");
                surface.add_class(ElementId::ToggleButton, "btn-success");
                surface.remove_class(ElementId::ButtonIcon, "fa-stop");
                surface.add_class(ElementId::ButtonIcon, "fa-play");
                surface.set_text(ElementId::ButtonText, "Start Detection");
            }
        }
    }

    /// Runs when the element has faded back in.
    pub fn finish(self, surface: &mut Surface) {
        if let Self::ToggleButton { .. } = self {
            surface.set_disabled(ElementId::ToggleButton, false);
        }
    }
}

/// Name of the risk class currently on the badge, if exactly one is set.
pub fn current_risk_class(surface: &Surface) -> Option<&'static str> {
    let mut present = RISK_CLASSES
        .into_iter()
        .filter(|class| surface.has_class(ElementId::StatusBadge, class));
    let first = present.next()?;
    present.next().is_none().then_some(first)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_issues_command_for_state() {
        assert_eq!(DetectionState::Inactive.toggle_command(), CommandKind::Start);
        assert_eq!(DetectionState::Active.toggle_command(), CommandKind::Stop);
    }

    #[test]
    fn start_gated_on_status() {
        let s = DetectionState::Inactive;
        assert_eq!(
            s.transition(CommandKind::Start, &CommandStatus::Started),
            Some(DetectionState::Active)
        );
        assert_eq!(
            s.transition(CommandKind::Start, &CommandStatus::AlreadyRunning),
            Some(DetectionState::Active)
        );
        assert_eq!(
            s.transition(CommandKind::Start, &CommandStatus::Other("error".into())),
            None
        );
        assert_eq!(s.transition(CommandKind::Start, &CommandStatus::Stopped), None);
    }

    #[test]
    fn stop_gated_on_status() {
        let s = DetectionState::Active;
        assert_eq!(
            s.transition(CommandKind::Stop, &CommandStatus::AlreadyStopped),
            Some(DetectionState::Inactive)
        );
        assert_eq!(s.transition(CommandKind::Stop, &CommandStatus::Started), None);
        // Start is unreachable from Active.
        assert_eq!(s.transition(CommandKind::Start, &CommandStatus::Started), None);
    }

    #[test]
    fn each_risk_level_leaves_exactly_one_class() {
        let mut surface = Surface::new();
        for level in RiskLevel::ALL {
            Relabel::RiskBadge(level).apply(&mut surface);
            let (icon, class) = risk_presentation(level);
            assert_eq!(current_risk_class(&surface), Some(class));
            assert_eq!(surface.get(ElementId::StatusBadge).icon.as_deref(), Some(icon));
            assert_eq!(surface.text(ElementId::StatusBadge), format!("{level} Risk"));
        }
    }

    #[test]
    fn button_relabel_swaps_affordance() {
        let mut surface = Surface::new();
        Relabel::ToggleButton { active: true }.apply(&mut surface);
        assert!(surface.has_class(ElementId::ToggleButton, "btn-danger"));
        assert!(!surface.has_class(ElementId::ToggleButton, "btn-success"));
        assert!(surface.has_class(ElementId::ButtonIcon, "fa-stop"));
        assert_eq!(surface.text(ElementId::ButtonText), "Stop Detection");

        Relabel::ToggleButton { active: false }.apply(&mut surface);
        assert!(surface.has_class(ElementId::ToggleButton, "btn-success"));
        assert!(surface.has_class(ElementId::ButtonIcon, "fa-play"));
        assert_eq!(surface.text(ElementId::ButtonText), "Start Detection");
    }
}
