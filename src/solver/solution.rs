//! Result of a linear solve.

use std::collections::{BTreeMap, HashMap};

use approx::AbsDiffEq;

use super::mna::{CompanionBattery, CompanionCurrentSource, CompanionResistor, ElementId};

/// Node voltages and source currents produced by [`super::MnaCircuit::solve`].
///
/// Voltages are keyed by the node numbers the circuit actually uses, which
/// need not be contiguous. Nodes never referenced by an element read 0 V. Currents are stored only for elements whose current is an
/// unknown of the system: batteries and zero-resistance resistors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MnaSolution {
    node_voltages: BTreeMap<usize, f64>,
    currents: HashMap<ElementId, f64>,
}

impl MnaSolution {
    pub fn new(node_voltages: impl IntoIterator<Item = (usize, f64)>, currents: HashMap<ElementId, f64>) -> Self {
        Self {
            node_voltages: node_voltages.into_iter().collect(),
            currents,
        }
    }

    /// Voltage at a node, 0 for unknown nodes.
    pub fn node_voltage(&self, node: usize) -> f64 {
        self.node_voltages.get(&node).copied().unwrap_or(0.0)
    }

    pub fn node_voltages(&self) -> &BTreeMap<usize, f64> {
        &self.node_voltages
    }

    /// Current unknown for an element, if the solve produced one.
    pub fn get_current(&self, id: ElementId) -> Option<f64> {
        self.currents.get(&id).copied()
    }

    /// Current through a battery, node0 to node1.
    pub fn battery_current(&self, battery: &CompanionBattery) -> f64 {
        self.get_current(battery.id).unwrap_or(0.0)
    }

    /// Current through a resistor, node0 to node1.
    pub fn resistor_current(&self, resistor: &CompanionResistor) -> f64 {
        if resistor.is_short() {
            return self.get_current(resistor.id).unwrap_or(0.0);
        }
        (self.node_voltage(resistor.node0) - self.node_voltage(resistor.node1)) / resistor.resistance
    }

    pub fn current_source_current(&self, source: &CompanionCurrentSource) -> f64 {
        source.current
    }

    /// V(node1) - V(node0).
    pub fn voltage_across(&self, node0: usize, node1: usize) -> f64 {
        self.node_voltage(node1) - self.node_voltage(node0)
    }
}

impl AbsDiffEq for MnaSolution {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        1e-9
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        let voltages_match = self
            .node_voltages
            .keys()
            .chain(other.node_voltages.keys())
            .all(|n| self.node_voltage(*n).abs_diff_eq(&other.node_voltage(*n), epsilon));

        voltages_match
            && self.currents.len() == other.currents.len()
            && self.currents.iter().all(|(id, current)| {
                other
                    .get_current(*id)
                    .is_some_and(|o| current.abs_diff_eq(&o, epsilon))
            })
    }
}
