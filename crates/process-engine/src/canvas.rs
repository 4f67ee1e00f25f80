//! Marker surface for diagram elements
//!
//! Markers are CSS-class-like tags the host renders on top of shapes
//! (validation errors, bottleneck highlighting). They are view state and
//! are never written into the diagram document.

use std::collections::{BTreeSet, HashMap};

use crate::types::ElementId;

/// Marker names used by this crate
pub mod markers {
    pub const BOTTLENECK_HIGH: &str = "bottleneck-high";
    pub const VALIDATION_ERROR: &str = "validation-error";
    pub const VALIDATION_WARNING: &str = "validation-warning";
}

/// Per-element marker sets
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    markers: HashMap<ElementId, BTreeSet<String>>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a marker; adding an existing marker is a no-op
    pub fn add_marker(&mut self, element_id: &str, marker: &str) {
        self.markers
            .entry(element_id.to_string())
            .or_default()
            .insert(marker.to_string());
    }

    /// Remove a marker; missing elements or markers are ignored
    pub fn remove_marker(&mut self, element_id: &str, marker: &str) {
        if let Some(set) = self.markers.get_mut(element_id) {
            set.remove(marker);
            if set.is_empty() {
                self.markers.remove(element_id);
            }
        }
    }

    pub fn has_marker(&self, element_id: &str, marker: &str) -> bool {
        self.markers
            .get(element_id)
            .is_some_and(|set| set.contains(marker))
    }

    /// Markers on an element, sorted
    pub fn markers_of(&self, element_id: &str) -> Vec<String> {
        self.markers
            .get(element_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// IDs of elements carrying a marker, sorted
    pub fn elements_with_marker(&self, marker: &str) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self
            .markers
            .iter()
            .filter(|(_, set)| set.contains(marker))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Remove a marker from every element
    pub fn clear_marker(&mut self, marker: &str) {
        for set in self.markers.values_mut() {
            set.remove(marker);
        }
        self.markers.retain(|_, set| !set.is_empty());
    }

    /// Drop all markers
    pub fn clear(&mut self) {
        self.markers.clear();
    }
}
