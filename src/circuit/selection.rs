//! Selection state.

use log::debug;

use super::graph::Circuit;
use super::types::{BranchId, CircuitEvent, JunctionId};
use crate::error::Result;

impl Circuit {
    /// Replace the selection with exactly the given junctions and branches.
    pub fn set_selection(&mut self, junctions: &[JunctionId], branches: &[BranchId]) {
        let mut changed = false;
        for junction in &mut self.junctions {
            let selected = junctions.contains(&junction.id);
            changed |= junction.selected != selected;
            junction.selected = selected;
        }
        for branch in &mut self.branches {
            let selected = branches.contains(&branch.id);
            changed |= branch.selected != selected;
            branch.selected = selected;
        }
        if changed {
            self.emit(&[CircuitEvent::SelectionChanged]);
        }
    }

    /// Select every junction and branch.
    pub fn select_all(&mut self) {
        let junctions: Vec<JunctionId> = self.junctions.iter().map(|j| j.id).collect();
        let branches: Vec<BranchId> = self.branches.iter().map(|b| b.id).collect();
        self.set_selection(&junctions, &branches);
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        self.set_selection(&[], &[]);
    }

    pub fn get_selected_junctions(&self) -> Vec<JunctionId> {
        self.junctions.iter().filter(|j| j.selected).map(|j| j.id).collect()
    }

    pub fn get_selected_branches(&self) -> Vec<BranchId> {
        self.branches.iter().filter(|b| b.selected).map(|b| b.id).collect()
    }

    /// Remove every selected branch (and the junctions that leaves orphaned).
    pub fn delete_selected_branches(&mut self) -> Result<usize> {
        let selected = self.get_selected_branches();
        for id in &selected {
            self.remove_branch(*id)?;
        }
        if !selected.is_empty() {
            debug!("deleted {} selected branches", selected.len());
            self.emit(&[CircuitEvent::SelectionChanged]);
        }
        Ok(selected.len())
    }
}
