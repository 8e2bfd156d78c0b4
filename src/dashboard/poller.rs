//! Mapping from backend responses to display targets.

use crate::model::Snapshot;

use super::surface::ElementId;

/// Tag carried by refresh requests so results can be matched to the polling
/// epoch that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PollTicket {
    pub epoch: u64,
    pub seq: u64,
}

pub fn format_fps(fps: f64) -> String {
    format!("{fps:.1}")
}

pub fn format_ratio(ratio: f64) -> String {
    format!("{ratio:.2}")
}

/// Elements whose numeric text animates towards the snapshot value, with
/// the exact text written once the animation completes.
pub fn counter_targets(snap: &Snapshot) -> [(ElementId, String); 7] {
    [
        (ElementId::CurrentBeeCount, snap.current_bees.to_string()),
        (ElementId::CurrentVarroaCount, snap.current_varroa.to_string()),
        (ElementId::TotalBeeCount, snap.total_bees.to_string()),
        (ElementId::TotalVarroaCount, snap.total_varroa.to_string()),
        (ElementId::TotalFrames, snap.total_frames.to_string()),
        (ElementId::FpsValue, format_fps(snap.fps)),
        (ElementId::InfestationRatio, format_ratio(snap.infestation_ratio)),
    ]
}

/// Elements whose text is replaced outright.
pub fn label_targets(snap: &Snapshot) -> [(ElementId, String); 3] {
    [
        (ElementId::FpsDisplay, format!("{} FPS", format_fps(snap.fps))),
        (ElementId::BeeSciNotation, format!("n = {}", snap.current_bees)),
        (ElementId::VarroaSciNotation, format!("n = {}", snap.current_varroa)),
    ]
}
