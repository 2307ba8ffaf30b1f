//! Density profiles over a [`Mask`].
//!
//! Border lines are thin, and their pixel count scales with the card size, so
//! thresholds are applied to *normalized* density (count divided by the
//! perpendicular dimension) rather than to raw counts.

use crate::Mask;

/// Run of selected indices on one axis, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGroup {
    indices: Vec<u32>,
}

impl PixelGroup {
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn first(&self) -> u32 {
        self.indices[0]
    }

    pub fn last(&self) -> u32 {
        self.indices[self.indices.len() - 1]
    }

    /// Mean index, truncated toward zero.
    pub fn mean(&self) -> u32 {
        let sum: u64 = self.indices.iter().map(|&i| i as u64).sum();
        (sum / self.indices.len() as u64) as u32
    }
}

/// Per-column set pixel count divided by mask height.
pub fn column_density(mask: &Mask) -> Vec<f32> {
    normalize(&mask.column_counts(), mask.height())
}

/// Per-row set pixel count over the inclusive column span `[left, right]`,
/// divided by `right - left`.
pub fn row_density(mask: &Mask, left: u32, right: u32) -> Vec<f32> {
    normalize(&mask.row_counts(left..=right), right.saturating_sub(left))
}

fn normalize(counts: &[u32], len: u32) -> Vec<f32> {
    let len = len.max(1) as f32;
    counts.iter().map(|&c| c as f32 / len).collect()
}

/// Indices whose density strictly exceeds `threshold`, ascending.
pub fn dense_indices(density: &[f32], threshold: f32) -> Vec<u32> {
    density
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d > threshold)
        .map(|(i, _)| i as u32)
        .collect()
}

/// Split ascending `indices` wherever consecutive entries are more than `max_gap` apart.
pub fn group_indices(indices: &[u32], max_gap: u32) -> Vec<PixelGroup> {
    let mut groups: Vec<PixelGroup> = Vec::new();
    for &i in indices {
        match groups.last_mut() {
            Some(group) if i - group.last() <= max_gap => group.indices.push(i),
            _ => groups.push(PixelGroup { indices: vec![i] }),
        }
    }
    groups
}
