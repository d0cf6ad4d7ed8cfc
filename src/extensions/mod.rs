//! Optional decorations drawn on top of the layers.

pub mod markers;

pub use markers::{
    CartesianMarker, DefaultCartesianMarker, MarkerDrawContext, MarkerStyle, MarkerTarget,
    MarkerTargets, MarkerValue, merge_marker_targets, nearest_marker_targets,
};
