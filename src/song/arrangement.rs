//! Arrangement data: pattern placements on the 16-bar timeline.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of bars on the arrangement timeline
pub const NUM_BARS: usize = 16;

/// A pattern placement in the arrangement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPlacement {
    /// Unique identifier
    pub id: String,
    /// Which pattern this placement refers to
    pub pattern_id: usize,
    /// Starting bar position (0-15)
    pub start_bar: usize,
    /// Length in bars; start_bar + length <= NUM_BARS
    pub length: usize,
}

impl PatternPlacement {
    /// Create a new one-bar placement with an auto-generated ID
    pub fn new(pattern_id: usize, start_bar: usize) -> Self {
        Self::with_length(pattern_id, start_bar, 1)
    }

    /// Create a placement with a length, clamped to the timeline end
    pub fn with_length(pattern_id: usize, start_bar: usize, length: usize) -> Self {
        let start_bar = start_bar.min(NUM_BARS - 1);
        Self {
            id: Uuid::new_v4().to_string(),
            pattern_id,
            start_bar,
            length: length.clamp(1, NUM_BARS - start_bar),
        }
    }

    /// Check if this placement covers a given bar
    pub fn covers_bar(&self, bar: usize) -> bool {
        bar >= self.start_bar && bar < self.start_bar + self.length
    }
}

/// The arrangement: all placements plus the muted-pattern set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arrangement {
    /// All pattern placements, in placement order
    pub placements: Vec<PatternPlacement>,
    /// Pattern IDs muted on the timeline
    #[serde(default)]
    pub muted_patterns: HashSet<usize>,
}

impl Arrangement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the placement starting exactly at (pattern_id, bar)
    pub fn placement_at(&self, pattern_id: usize, bar: usize) -> Option<&PatternPlacement> {
        self.placements
            .iter()
            .find(|p| p.pattern_id == pattern_id && p.start_bar == bar)
    }

    pub fn has_placement(&self, pattern_id: usize, bar: usize) -> bool {
        self.placement_at(pattern_id, bar).is_some()
    }

    /// Add a placement, enforcing at most one per (pattern_id, start_bar)
    pub fn add_placement(&mut self, placement: PatternPlacement) {
        if !self.has_placement(placement.pattern_id, placement.start_bar) {
            self.placements.push(placement);
        }
    }

    /// Remove a placement by ID
    pub fn remove_placement(&mut self, placement_id: &str) -> Option<PatternPlacement> {
        let idx = self.placements.iter().position(|p| p.id == placement_id)?;
        Some(self.placements.remove(idx))
    }

    /// Remove the placement starting at (pattern_id, bar)
    pub fn remove_placement_at(&mut self, pattern_id: usize, bar: usize) -> Option<PatternPlacement> {
        let idx = self
            .placements
            .iter()
            .position(|p| p.pattern_id == pattern_id && p.start_bar == bar)?;
        Some(self.placements.remove(idx))
    }

    /// Remove all placements for a pattern starting within a bar range
    pub fn remove_placements_in_range(
        &mut self,
        pattern_id: usize,
        start_bar: usize,
        end_bar: usize,
    ) -> Vec<PatternPlacement> {
        let mut removed = Vec::new();
        self.placements.retain(|p| {
            if p.pattern_id == pattern_id && p.start_bar >= start_bar && p.start_bar <= end_bar {
                removed.push(p.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Toggle mute for a pattern on the timeline
    pub fn toggle_pattern_mute(&mut self, pattern_id: usize) {
        if !self.muted_patterns.remove(&pattern_id) {
            self.muted_patterns.insert(pattern_id);
        }
    }

    pub fn is_pattern_muted(&self, pattern_id: usize) -> bool {
        self.muted_patterns.contains(&pattern_id)
    }

    /// Placements active at a bar, in placement enumeration order,
    /// minus muted patterns
    pub fn active_placements_at_bar(&self, bar: usize) -> Vec<&PatternPlacement> {
        self.placements
            .iter()
            .filter(|p| p.covers_bar(bar) && !self.muted_patterns.contains(&p.pattern_id))
            .collect()
    }
}
