//! Circuit validation.

use std::collections::HashSet;

use crate::error::{CircuitError, Result};

use super::Circuit;

/// Validate the structural invariants of a circuit.
///
/// Checks:
/// - Junction and branch ids are unique
/// - No branch connects a junction to itself
/// - Every branch endpoint belongs to the circuit
/// - No junction is orphaned
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    let mut junction_ids = HashSet::new();
    for junction in circuit.junctions() {
        if !junction_ids.insert(junction.id) {
            return Err(CircuitError::invalid_topology(format!(
                "junction {} appears more than once",
                junction.id
            )));
        }
    }

    let mut branch_ids = HashSet::new();
    for branch in circuit.branches() {
        if !branch_ids.insert(branch.id) {
            return Err(CircuitError::invalid_topology(format!(
                "branch {} appears more than once",
                branch.id
            )));
        }
        if branch.start == branch.end {
            return Err(CircuitError::invalid_topology(format!(
                "branch {} connects junction {} to itself",
                branch.id, branch.start
            )));
        }
        for endpoint in [branch.start, branch.end] {
            if !junction_ids.contains(&endpoint) {
                return Err(CircuitError::UnknownJunction(endpoint));
            }
        }
    }

    for junction in circuit.junctions() {
        if !circuit.branches().iter().any(|b| b.has_junction(junction.id)) {
            return Err(CircuitError::invalid_topology(format!(
                "junction {} is orphaned",
                junction.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Junction;
    use crate::components::{BranchKind, Wire};
    use crate::geometry::vec2;

    #[test]
    fn test_valid_after_edits() {
        let mut circuit = Circuit::new();
        let a = Junction::new(vec2(0.0, 0.0));
        let center = Junction::new(vec2(1.0, 0.0));
        let ic = center.id;
        circuit
            .add_branch_between(BranchKind::Wire(Wire::default()), a, center.clone())
            .unwrap();
        circuit
            .add_branch_between(BranchKind::Wire(Wire::default()), center, Junction::new(vec2(2.0, 0.0)))
            .unwrap();
        validate_circuit(&circuit).unwrap();
        circuit.split(ic).unwrap();
        validate_circuit(&circuit).unwrap();
    }

    #[test]
    fn test_orphan_is_reported() {
        let mut circuit = Circuit::new();
        circuit.add_junction(Junction::new(vec2(0.0, 0.0)));
        assert!(matches!(
            validate_circuit(&circuit),
            Err(CircuitError::InvalidTopology { .. })
        ));
    }
}
