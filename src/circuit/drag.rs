//! Snap-target search for dragged junctions.

use std::collections::HashSet;

use super::graph::Circuit;
use super::types::{BranchId, DragMatch, JunctionId};
use crate::geometry::Vector2;
use crate::STICKY_THRESHOLD;

impl Circuit {
    /// Find the closest legal junction that one of `dragged` would snap onto
    /// after moving by `dx`.
    ///
    /// Only stationary junctions within [`STICKY_THRESHOLD`] are candidates.
    /// Ties go to the first pair evaluated.
    pub fn get_best_drag_match(&self, dragged: &[JunctionId], dx: Vector2) -> Option<DragMatch> {
        let moving: HashSet<JunctionId> = dragged.iter().copied().collect();
        let mut best: Option<DragMatch> = None;

        for &source in dragged {
            let Some(junction) = self.junction(source) else {
                continue;
            };
            let translated = junction.position + dx;
            let strong: HashSet<JunctionId> = self.get_strong_connections(source).into_iter().collect();

            for candidate in &self.junctions {
                if moving.contains(&candidate.id) {
                    continue;
                }
                let distance = (candidate.position - translated).norm();
                if distance >= STICKY_THRESHOLD {
                    continue;
                }
                if best.map_or(false, |b| distance >= b.distance) {
                    continue;
                }
                if self.is_legal_drag_target(source, candidate.id, &strong) {
                    best = Some(DragMatch {
                        source,
                        target: candidate.id,
                        distance,
                    });
                }
            }
        }
        best
    }

    /// Same as [`Circuit::get_best_drag_match`] for dragged branches, which
    /// drag both of their endpoints.
    pub fn get_best_drag_match_for_branches(&self, dragged: &[BranchId], dx: Vector2) -> Option<DragMatch> {
        let mut junctions = Vec::new();
        for branch in dragged.iter().filter_map(|id| self.branch(*id)) {
            for endpoint in [branch.start, branch.end] {
                if !junctions.contains(&endpoint) {
                    junctions.push(endpoint);
                }
            }
        }
        self.get_best_drag_match(&junctions, dx)
    }

    fn is_legal_drag_target(&self, source: JunctionId, target: JunctionId, strong: &HashSet<JunctionId>) -> bool {
        source != target
            && !self.has_branch_between(source, target)
            && !self.would_connection_cause_overlapping_branches(source, target)
            && !strong.contains(&target)
    }
}
