//! Circuit graph structure.
//!
//! [`Circuit`] exclusively owns every [`Junction`] and [`Branch`]. Branches
//! refer to their endpoints by [`JunctionId`]. Connectivity queries always
//! scan the live collections; nothing is cached between edits.

use std::collections::HashSet;
use std::fmt;

use log::debug;

use super::junction::{Branch, Junction};
use super::types::{BranchId, CircuitEvent, CircuitObserver, JunctionId};
use crate::components::BranchKind;
use crate::error::{CircuitError, Result};
use crate::geometry::{self, Vector2};
use crate::solver::MnaSolution;
use crate::{EPSILON, JUNCTION_RADIUS};

/// Distance a split junction moves away from the original.
pub const SPLIT_OFFSET: f64 = 1.5 * JUNCTION_RADIUS;

/// A circuit under construction: junctions, branches, and their last solved state.
pub struct Circuit {
    pub(super) junctions: Vec<Junction>,
    pub(super) branches: Vec<Branch>,
    pub(super) solution: Option<MnaSolution>,
    observers: Vec<Box<dyn CircuitObserver>>,
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circuit")
            .field("junctions", &self.junctions)
            .field("branches", &self.branches)
            .field("solution", &self.solution)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self {
            junctions: Vec::new(),
            branches: Vec::new(),
            solution: None,
            observers: Vec::new(),
        }
    }

    /// Register an observer for change notifications.
    pub fn subscribe(&mut self, observer: impl CircuitObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Deliver events to every observer, in order.
    pub(super) fn emit(&mut self, events: &[CircuitEvent]) {
        for event in events {
            for observer in &mut self.observers {
                observer.on_event(event);
            }
        }
    }

    /// Announce an electrical change.
    pub(super) fn emit_kirchhoff_changed(&mut self) {
        self.emit(&[CircuitEvent::KirchhoffChanged, CircuitEvent::CircuitChanged]);
    }

    // ============ Accessors ============

    /// All junctions.
    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    /// All branches.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub(crate) fn junctions_mut(&mut self) -> &mut [Junction] {
        &mut self.junctions
    }

    pub(crate) fn branches_mut(&mut self) -> &mut [Branch] {
        &mut self.branches
    }

    /// Look up a junction.
    pub fn junction(&self, id: JunctionId) -> Option<&Junction> {
        self.junctions.iter().find(|j| j.id == id)
    }

    pub(super) fn junction_mut(&mut self, id: JunctionId) -> Option<&mut Junction> {
        self.junctions.iter_mut().find(|j| j.id == id)
    }

    /// Look up a branch.
    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.iter().find(|b| b.id == id)
    }

    pub(super) fn branch_mut(&mut self, id: BranchId) -> Option<&mut Branch> {
        self.branches.iter_mut().find(|b| b.id == id)
    }

    /// Find a junction by label.
    pub fn find_junction(&self, label: &str) -> Option<JunctionId> {
        self.junctions
            .iter()
            .find(|j| j.label.as_deref() == Some(label))
            .map(|j| j.id)
    }

    /// Find a branch by label.
    pub fn find_branch(&self, label: &str) -> Option<BranchId> {
        self.branches
            .iter()
            .find(|b| b.label.as_deref() == Some(label))
            .map(|b| b.id)
    }

    /// Whether the junction belongs to this circuit.
    pub fn contains_junction(&self, id: JunctionId) -> bool {
        self.junction(id).is_some()
    }

    /// Position of a junction.
    pub fn position(&self, id: JunctionId) -> Option<Vector2> {
        self.junction(id).map(|j| j.position)
    }

    /// Endpoint positions of a branch.
    pub fn branch_endpoints(&self, branch: &Branch) -> Option<(Vector2, Vector2)> {
        Some((self.position(branch.start)?, self.position(branch.end)?))
    }

    /// Distance between a branch's endpoints.
    pub fn branch_length(&self, branch: &Branch) -> f64 {
        self.branch_endpoints(branch)
            .map(|(a, b)| (b - a).norm())
            .unwrap_or(0.0)
    }

    /// Solution of the last solve, if any.
    pub fn solution(&self) -> Option<&MnaSolution> {
        self.solution.as_ref()
    }

    pub(crate) fn set_solution(&mut self, solution: MnaSolution) {
        self.solution = Some(solution);
    }

    // ============ Structural edits ============

    /// Add a junction. Adding a junction whose id is already present does nothing.
    pub fn add_junction(&mut self, junction: Junction) -> JunctionId {
        let id = junction.id;
        if !self.contains_junction(id) {
            debug!("add junction {} at ({}, {})", id, junction.position.x, junction.position.y);
            self.junctions.push(junction);
            self.emit(&[CircuitEvent::CircuitChanged]);
        }
        id
    }

    /// Remove a junction together with every branch attached to it.
    ///
    /// Branches that lose their junction are removed, and their far endpoints
    /// are removed too if that leaves them orphaned.
    pub fn remove_junction(&mut self, id: JunctionId) -> Result<()> {
        if !self.contains_junction(id) {
            return Err(CircuitError::UnknownJunction(id));
        }
        let adjacent = self.get_adjacent_branches(id);
        let mut far_ends = Vec::new();
        for branch_id in &adjacent {
            if let Some(far) = self.branch(*branch_id).and_then(|b| b.opposite(id)) {
                far_ends.push(far);
            }
        }
        self.branches.retain(|b| !b.has_junction(id));
        self.junctions.retain(|j| j.id != id);
        for far in far_ends {
            self.remove_if_orphaned(far);
        }
        debug!("remove junction {} ({} branches detached)", id, adjacent.len());
        self.emit_kirchhoff_changed();
        Ok(())
    }

    /// Register a branch whose endpoints are already in the circuit.
    pub fn add_branch(&mut self, branch: Branch) -> Result<BranchId> {
        if branch.start == branch.end {
            return Err(CircuitError::invalid_topology(format!(
                "branch {} connects junction {} to itself",
                branch.id, branch.start
            )));
        }
        if self.branch(branch.id).is_some() {
            return Err(CircuitError::invalid_topology(format!(
                "branch {} is already part of the circuit",
                branch.id
            )));
        }
        for endpoint in [branch.start, branch.end] {
            if !self.contains_junction(endpoint) {
                return Err(CircuitError::UnknownJunction(endpoint));
            }
        }
        let id = branch.id;
        debug!("add {} {} ({} -> {})", branch.kind.type_name(), id, branch.start, branch.end);
        self.branches.push(branch);
        self.emit_kirchhoff_changed();
        Ok(id)
    }

    /// Add a branch between two junctions, adding either junction that is new.
    pub fn add_branch_between(&mut self, kind: BranchKind, start: Junction, end: Junction) -> Result<BranchId> {
        if start.id == end.id {
            return Err(CircuitError::invalid_topology(format!(
                "cannot connect junction {} to itself",
                start.id
            )));
        }
        let start = self.add_junction(start);
        let end = self.add_junction(end);
        self.add_branch(Branch::new(kind, start, end))
    }

    /// Remove a branch and any endpoint it leaves orphaned.
    pub fn remove_branch(&mut self, id: BranchId) -> Result<()> {
        let index = self
            .branches
            .iter()
            .position(|b| b.id == id)
            .ok_or(CircuitError::UnknownBranch(id))?;
        let branch = self.branches.remove(index);
        self.remove_if_orphaned(branch.start);
        self.remove_if_orphaned(branch.end);
        debug!("remove {} {}", branch.kind.type_name(), id);
        self.emit_kirchhoff_changed();
        Ok(())
    }

    /// Apply an edit to a branch's element parameters.
    pub fn modify_branch(&mut self, id: BranchId, edit: impl FnOnce(&mut BranchKind)) -> Result<()> {
        let branch = self.branch_mut(id).ok_or(CircuitError::UnknownBranch(id))?;
        edit(&mut branch.kind);
        self.emit_kirchhoff_changed();
        Ok(())
    }

    fn remove_if_orphaned(&mut self, id: JunctionId) {
        if !self.branches.iter().any(|b| b.has_junction(id)) {
            self.junctions.retain(|j| j.id != id);
        }
    }

    // ============ Connectivity ============

    /// Branches touching a junction.
    pub fn get_adjacent_branches(&self, junction: JunctionId) -> Vec<BranchId> {
        self.branches
            .iter()
            .filter(|b| b.has_junction(junction))
            .map(|b| b.id)
            .collect()
    }

    /// Junctions across each adjacent branch.
    pub fn get_junction_neighbors(&self, junction: JunctionId) -> Vec<JunctionId> {
        self.branches
            .iter()
            .filter_map(|b| b.opposite(junction))
            .collect()
    }

    /// Whether a branch directly joins `a` and `b`.
    pub fn has_branch_between(&self, a: JunctionId, b: JunctionId) -> bool {
        self.branches
            .iter()
            .any(|branch| branch.opposite(a) == Some(b))
    }

    /// Junctions that must move together with `junction`: reachable through
    /// circuit components only. Includes `junction` itself.
    pub fn get_strong_connections(&self, junction: JunctionId) -> Vec<JunctionId> {
        self.search_reachable(junction, |b| b.kind.is_strong_connector())
    }

    /// Junctions galvanically connected to `junction`: reachable through
    /// anything but an open switch. Includes `junction` itself.
    pub fn get_connected_subgraph(&self, junction: JunctionId) -> Vec<JunctionId> {
        self.search_reachable(junction, |b| b.kind.is_conducting())
    }

    fn search_reachable(&self, start: JunctionId, follow: impl Fn(&Branch) -> bool) -> Vec<JunctionId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            for branch in self.branches.iter().filter(|b| follow(b)) {
                if let Some(next) = branch.opposite(current) {
                    if !visited.contains(&next) {
                        stack.push(next);
                    }
                }
            }
        }
        order
    }

    /// True iff `a` and `b` share a neighbor, so joining them would create a
    /// redundant parallel path through that third junction.
    pub fn would_connection_cause_overlapping_branches(&self, a: JunctionId, b: JunctionId) -> bool {
        let neighbors_a: HashSet<JunctionId> = self.get_junction_neighbors(a).into_iter().collect();
        self.get_junction_neighbors(b)
            .iter()
            .any(|n| neighbors_a.contains(n))
    }

    // ============ Split / merge ============

    /// Split a junction into one new junction per adjacent branch.
    ///
    /// Wires get a junction nudged toward their far end. Components keep the
    /// original position and then their whole strong-connection set is
    /// translated by the same nudge. Returns the new junctions.
    pub fn split(&mut self, junction: JunctionId) -> Result<Vec<JunctionId>> {
        let origin = self
            .position(junction)
            .ok_or(CircuitError::UnknownJunction(junction))?;
        let adjacent = self.get_adjacent_branches(junction);
        let mut created = Vec::with_capacity(adjacent.len());

        for branch_id in adjacent {
            let (opposite, strong) = match self.branch(branch_id) {
                Some(b) => (b.opposite(junction), b.kind.is_strong_connector()),
                None => continue,
            };
            let Some(opposite_position) = opposite.and_then(|o| self.position(o)) else {
                continue;
            };
            let displacement = geometry::direction(origin, opposite_position) * SPLIT_OFFSET;
            let position = if strong { origin } else { origin + displacement };
            let new_id = self.push_junction(Junction::new(position));
            if let Some(branch) = self.branch_mut(branch_id) {
                branch.replace_junction(junction, new_id);
            }
            if strong {
                let group: Vec<JunctionId> = self
                    .get_strong_connections(new_id)
                    .into_iter()
                    .filter(|j| *j != junction)
                    .collect();
                self.translate(&group, displacement);
            }
            created.push(new_id);
        }

        self.junctions.retain(|j| j.id != junction);
        debug!("split junction {} into {:?}", junction, created);
        self.emit(&[
            CircuitEvent::JunctionSplit {
                original: junction,
                created: created.clone(),
            },
            CircuitEvent::KirchhoffChanged,
            CircuitEvent::CircuitChanged,
        ]);
        Ok(created)
    }

    /// Merge two coincident junctions into a fresh one.
    ///
    /// Fails unless both exist, are distinct, lie within [`EPSILON`] of each
    /// other, and are not joined directly by a branch.
    pub fn collapse_junctions(&mut self, a: JunctionId, b: JunctionId) -> Result<JunctionId> {
        if a == b {
            return Err(CircuitError::precondition(format!(
                "cannot collapse junction {} with itself",
                a
            )));
        }
        let ja = self.junction(a).ok_or(CircuitError::UnknownJunction(a))?;
        let jb = self.junction(b).ok_or(CircuitError::UnknownJunction(b))?;
        let distance = (ja.position - jb.position).norm();
        if distance > EPSILON {
            return Err(CircuitError::precondition(format!(
                "junctions {} and {} are {} apart and cannot be collapsed",
                a, b, distance
            )));
        }
        if self.has_branch_between(a, b) {
            return Err(CircuitError::precondition(format!(
                "junctions {} and {} are joined by a branch; collapsing would create a self-loop",
                a, b
            )));
        }

        let mut replacement = Junction::new(ja.position);
        replacement.fixed = ja.fixed || jb.fixed;
        replacement.label = ja.label.clone().or_else(|| jb.label.clone());
        replacement.voltage = ja.voltage;

        self.junctions.retain(|j| j.id != a && j.id != b);
        let replacement_id = self.push_junction(replacement);
        for branch in &mut self.branches {
            branch.replace_junction(a, replacement_id);
            branch.replace_junction(b, replacement_id);
        }

        debug!("collapse junctions {} and {} into {}", a, b, replacement_id);
        self.emit(&[
            CircuitEvent::JunctionsCollapsed {
                removed: [a, b],
                replacement: replacement_id,
            },
            CircuitEvent::KirchhoffChanged,
            CircuitEvent::CircuitChanged,
        ]);
        Ok(replacement_id)
    }

    /// Drop `source` onto `target`: move it (with its rigid subassembly) onto
    /// the target, then collapse the two.
    pub fn connect(&mut self, source: JunctionId, target: JunctionId) -> Result<JunctionId> {
        let from = self.junction(source).ok_or(CircuitError::UnknownJunction(source))?;
        if from.fixed {
            return Err(CircuitError::precondition(format!(
                "junction {} is fixed and cannot be moved",
                source
            )));
        }
        let from = from.position;
        let to = self
            .position(target)
            .ok_or(CircuitError::UnknownJunction(target))?;
        if source == target || self.has_branch_between(source, target) {
            return Err(CircuitError::precondition(format!(
                "junctions {} and {} cannot be connected",
                source, target
            )));
        }

        let group: Vec<JunctionId> = self
            .get_strong_connections(source)
            .into_iter()
            .filter(|j| *j != target)
            .collect();
        let saved: Vec<(JunctionId, Vector2)> = self
            .junctions
            .iter()
            .filter(|j| j.id == source || group.contains(&j.id))
            .map(|j| (j.id, j.position))
            .collect();

        self.translate(&group, to - from);
        if let Some(j) = self.junction_mut(source) {
            j.position = to;
        }
        self.collapse_junctions(source, target).map_err(|e| {
            for (id, position) in &saved {
                if let Some(j) = self.junction_mut(*id) {
                    j.position = *position;
                }
            }
            e
        })
    }

    /// Move junctions by a drag delta. Fixed junctions stay put.
    pub fn translate_junctions(&mut self, ids: &[JunctionId], delta: Vector2) {
        self.translate(ids, delta);
        self.emit(&[CircuitEvent::CircuitChanged]);
    }

    fn translate(&mut self, ids: &[JunctionId], delta: Vector2) {
        for junction in self.junctions.iter_mut() {
            if !junction.fixed && ids.contains(&junction.id) {
                junction.position += delta;
            }
        }
    }

    fn push_junction(&mut self, junction: Junction) -> JunctionId {
        let id = junction.id;
        self.junctions.push(junction);
        id
    }
}
