//! The element surface the controller writes to.
//!
//! Each display element is addressed by a stable [`ElementId`] whose string
//! form matches the markup identifiers of the web dashboard. Elements carry
//! text, an optional icon, a class set and visibility state; renderers read
//! them and never write.

use std::collections::{BTreeMap, BTreeSet};

/// Stable identifiers of every element the dashboard drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementId {
    CurrentBeeCount,
    CurrentVarroaCount,
    TotalBeeCount,
    TotalVarroaCount,
    TotalFrames,
    FpsValue,
    FpsDisplay,
    BeeSciNotation,
    VarroaSciNotation,
    InfestationRatio,
    StatusBadge,
    DetectionStatus,
    ToggleButton,
    ButtonIcon,
    ButtonText,
    LoadingOverlay,
    DetectionChart,
    UniqueObjectsChart,
    InfestationRatioChart,
}

impl ElementId {
    pub const ALL: [ElementId; 19] = [
        Self::CurrentBeeCount,
        Self::CurrentVarroaCount,
        Self::TotalBeeCount,
        Self::TotalVarroaCount,
        Self::TotalFrames,
        Self::FpsValue,
        Self::FpsDisplay,
        Self::BeeSciNotation,
        Self::VarroaSciNotation,
        Self::InfestationRatio,
        Self::StatusBadge,
        Self::DetectionStatus,
        Self::ToggleButton,
        Self::ButtonIcon,
        Self::ButtonText,
        Self::LoadingOverlay,
        Self::DetectionChart,
        Self::UniqueObjectsChart,
        Self::InfestationRatioChart,
    ];

    /// Markup identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CurrentBeeCount => "currentBeeCount",
            Self::CurrentVarroaCount => "currentVarroaCount",
            Self::TotalBeeCount => "totalBeeCount",
            Self::TotalVarroaCount => "totalVarroaCount",
            Self::TotalFrames => "totalFrames",
            Self::FpsValue => "fpsValue",
            Self::FpsDisplay => "fpsDisplay",
            Self::BeeSciNotation => "beeSciNotation",
            Self::VarroaSciNotation => "varroaSciNotation",
            Self::InfestationRatio => "infestationRatio",
            Self::StatusBadge => "statusBadge",
            Self::DetectionStatus => "detectionStatus",
            Self::ToggleButton => "toggleDetectionButton",
            Self::ButtonIcon => "buttonIcon",
            Self::ButtonText => "buttonText",
            Self::LoadingOverlay => "loading-overlay",
            Self::DetectionChart => "detectionChart",
            Self::UniqueObjectsChart => "uniqueObjectsChart",
            Self::InfestationRatioChart => "infestationRatioChart",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|el| el.as_str() == id)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display state of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub text: String,
    pub icon: Option<String>,
    pub classes: BTreeSet<String>,
    pub visible: bool,
    /// 0.0 (transparent) to 1.0 (opaque); driven by fade transitions.
    pub opacity: f64,
    pub disabled: bool,
}

impl Element {
    fn new(text: &str, classes: &[&str]) -> Self {
        Self {
            text: text.to_string(),
            icon: None,
            classes: classes.iter().map(|c| c.to_string()).collect(),
            visible: true,
            opacity: 1.0,
            disabled: false,
        }
    }

    fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// All elements, plus a dirty flag telling the renderer to redraw.
#[derive(Debug, Clone)]
pub struct Surface {
    elements: BTreeMap<ElementId, Element>,
    dirty: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// Surface in its initial markup state: zeroed counters, unknown risk,
    /// inactive detection, overlay hidden.
    pub fn new() -> Self {
        use ElementId::*;

        let mut elements = BTreeMap::new();
        for id in [
            CurrentBeeCount,
            CurrentVarroaCount,
            TotalBeeCount,
            TotalVarroaCount,
            TotalFrames,
        ] {
            elements.insert(id, Element::new("0", &[]));
        }
        elements.insert(FpsValue, Element::new("0.0", &[]));
        elements.insert(FpsDisplay, Element::new("0.0 FPS", &[]).with_icon("fa-microchip"));
        elements.insert(BeeSciNotation, Element::new("n = 0", &[]));
        elements.insert(VarroaSciNotation, Element::new("n = 0", &[]));
        elements.insert(InfestationRatio, Element::new("0.00", &[]));
        elements.insert(
            StatusBadge,
            Element::new("Unknown Risk", &["status-badge", "risk-unknown"]).with_icon("fa-circle-info"),
        );
        elements.insert(
            DetectionStatus,
            Element::new("Inactive", &["badge", "bg-secondary"]).with_icon("fa-video-slash"),
        );
        elements.insert(ToggleButton, Element::new("", &["btn", "btn-success"]));
        elements.insert(ButtonIcon, Element::new("", &["fas", "fa-play"]));
        elements.insert(ButtonText, Element::new("Start Detection", &[]));
        elements.insert(LoadingOverlay, Element::new("Loading", &[]).hidden());
        for id in [DetectionChart, UniqueObjectsChart, InfestationRatioChart] {
            elements.insert(id, Element::new("", &[]));
        }

        Self {
            elements,
            dirty: true,
        }
    }

    pub fn get(&self, id: ElementId) -> &Element {
        // Every id is inserted in `new` and never removed.
        &self.elements[&id]
    }

    fn get_mut(&mut self, id: ElementId) -> &mut Element {
        self.dirty = true;
        self.elements
            .get_mut(&id)
            .unwrap_or_else(|| unreachable!("element {id} is always present"))
    }

    pub fn text(&self, id: ElementId) -> &str {
        &self.get(id).text
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        let text = text.into();
        if self.get(id).text != text {
            self.get_mut(id).text = text;
        }
    }

    pub fn set_icon(&mut self, id: ElementId, icon: &str) {
        self.get_mut(id).icon = Some(icon.to_string());
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.get(id).classes.contains(class)
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if !self.has_class(id, class) {
            self.get_mut(id).classes.insert(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if self.has_class(id, class) {
            self.get_mut(id).classes.remove(class);
        }
    }

    pub fn remove_classes(&mut self, id: ElementId, classes: &[&str]) {
        for class in classes {
            self.remove_class(id, class);
        }
    }

    pub fn is_visible(&self, id: ElementId) -> bool {
        self.get(id).visible
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        if self.get(id).visible != visible {
            self.get_mut(id).visible = visible;
        }
    }

    pub fn set_opacity(&mut self, id: ElementId, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0);
        if (self.get(id).opacity - opacity).abs() > f64::EPSILON {
            self.get_mut(id).opacity = opacity;
        }
    }

    pub fn is_disabled(&self, id: ElementId) -> bool {
        self.get(id).disabled
    }

    pub fn set_disabled(&mut self, id: ElementId, disabled: bool) {
        if self.get(id).disabled != disabled {
            self.get_mut(id).disabled = disabled;
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Return and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
