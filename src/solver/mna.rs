//! MNA system assembly and solving.
//!
//! An [`MnaCircuit`] is an immutable snapshot of linear elements attached to
//! integer nodes. Node numbers need not be contiguous. Each connected
//! component gets its own reference node (its lowest-numbered node, held at
//! 0 V), so floating subcircuits still produce a well-posed system.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{error, trace, warn};

use super::matrix::{solve_linear_system, DenseMatrix};
use super::{MnaSolution, SolverConfig, SHORT_CIRCUIT_RESISTANCE};
use crate::error::{CircuitError, Result};

/// Identifier of a companion element inside one [`MnaCircuit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Ideal voltage source: V(node1) - V(node0) = voltage.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanionBattery {
    pub id: ElementId,
    pub node0: usize,
    pub node1: usize,
    pub voltage: f64,
}

impl CompanionBattery {
    pub fn new(id: ElementId, node0: usize, node1: usize, voltage: f64) -> Self {
        Self {
            id,
            node0,
            node1,
            voltage,
        }
    }
}

/// Linear resistor; current flows node0 to node1 when V(node0) > V(node1).
///
/// Resistances below [`SHORT_CIRCUIT_RESISTANCE`] are solved as a 0 V source,
/// so their current is an unknown of the system.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanionResistor {
    pub id: ElementId,
    pub node0: usize,
    pub node1: usize,
    pub resistance: f64,
}

impl CompanionResistor {
    pub fn new(id: ElementId, node0: usize, node1: usize, resistance: f64) -> Self {
        Self {
            id,
            node0,
            node1,
            resistance,
        }
    }

    pub fn is_short(&self) -> bool {
        self.resistance.abs() < SHORT_CIRCUIT_RESISTANCE
    }
}

/// Ideal current source pushing `current` from node0 to node1 through itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanionCurrentSource {
    pub id: ElementId,
    pub node0: usize,
    pub node1: usize,
    pub current: f64,
}

impl CompanionCurrentSource {
    pub fn new(id: ElementId, node0: usize, node1: usize, current: f64) -> Self {
        Self {
            id,
            node0,
            node1,
            current,
        }
    }
}

/// Disjoint-set forest over dense node positions.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Union keeping the smaller root, so each root is the lowest position
    /// of its set.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra < rb {
            self.parent[rb] = ra;
        } else if rb < ra {
            self.parent[ra] = rb;
        }
    }
}

/// Maps circuit node numbers to rows of the system matrix.
struct NodeLayout {
    /// Row for each non-reference node
    rows: HashMap<usize, usize>,
    unknowns: usize,
    /// Every node referenced by an element, ascending
    nodes: Vec<usize>,
}

impl NodeLayout {
    fn new(circuit: &MnaCircuit) -> Self {
        let nodes: BTreeSet<usize> = circuit.element_terminals().flat_map(|(a, b)| [a, b]).collect();
        let sorted: Vec<usize> = nodes.iter().copied().collect();
        let position: HashMap<usize, usize> = sorted.iter().enumerate().map(|(i, n)| (*n, i)).collect();

        let mut sets = UnionFind::new(sorted.len());
        for (a, b) in circuit.element_terminals() {
            sets.union(position[&a], position[&b]);
        }

        let mut rows = HashMap::new();
        for (i, node) in sorted.iter().enumerate() {
            // Roots are references; BTreeSet order makes them the lowest node.
            if sets.find(i) != i {
                let row = rows.len();
                rows.insert(*node, row);
            }
        }

        Self {
            unknowns: rows.len(),
            rows,
            nodes: sorted,
        }
    }

    fn row(&self, node: usize) -> Option<usize> {
        self.rows.get(&node).copied()
    }
}

/// A voltage-source-like unknown: batteries and zero-ohm resistors.
struct SourceRow {
    id: ElementId,
    node0: usize,
    node1: usize,
    voltage: f64,
}

/// Linear circuit ready to be solved with Modified Nodal Analysis.
#[derive(Debug, Clone, Default)]
pub struct MnaCircuit {
    batteries: Vec<CompanionBattery>,
    resistors: Vec<CompanionResistor>,
    current_sources: Vec<CompanionCurrentSource>,
    config: SolverConfig,
}

impl MnaCircuit {
    pub fn new(
        batteries: Vec<CompanionBattery>,
        resistors: Vec<CompanionResistor>,
        current_sources: Vec<CompanionCurrentSource>,
    ) -> Self {
        Self::with_config(batteries, resistors, current_sources, SolverConfig::default())
    }

    pub fn with_config(
        batteries: Vec<CompanionBattery>,
        resistors: Vec<CompanionResistor>,
        current_sources: Vec<CompanionCurrentSource>,
        config: SolverConfig,
    ) -> Self {
        Self {
            batteries,
            resistors,
            current_sources,
            config,
        }
    }

    pub fn batteries(&self) -> &[CompanionBattery] {
        &self.batteries
    }

    pub fn resistors(&self) -> &[CompanionResistor] {
        &self.resistors
    }

    pub fn current_sources(&self) -> &[CompanionCurrentSource] {
        &self.current_sources
    }

    fn element_terminals(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.batteries
            .iter()
            .map(|b| (b.node0, b.node1))
            .chain(self.resistors.iter().map(|r| (r.node0, r.node1)))
            .chain(self.current_sources.iter().map(|s| (s.node0, s.node1)))
    }

    fn source_rows(&self) -> Vec<SourceRow> {
        let batteries = self.batteries.iter().map(|b| SourceRow {
            id: b.id,
            node0: b.node0,
            node1: b.node1,
            voltage: b.voltage,
        });
        let shorts = self.resistors.iter().filter(|r| r.is_short()).map(|r| SourceRow {
            // Current through a short runs node0 to node1, so V(node1) - V(node0) = 0
            id: r.id,
            node0: r.node0,
            node1: r.node1,
            voltage: 0.0,
        });
        batteries.chain(shorts).collect()
    }

    /// Solve the circuit.
    ///
    /// Never fails: a singular system is retried with a small conductance to
    /// reference on every node and a small series resistance in every
    /// source. If that also fails the all-zero solution is returned.
    pub fn solve(&self) -> MnaSolution {
        let layout = NodeLayout::new(self);
        let sources = self.source_rows();

        let x = match self.solve_system(&layout, &sources, false) {
            Ok(x) => x,
            Err(e) => {
                warn!("{}; retrying with regularization", e);
                match self.solve_system(&layout, &sources, true) {
                    Ok(x) => x,
                    Err(e) => {
                        error!("{} even after regularization; returning zero solution", e);
                        vec![0.0; layout.unknowns + sources.len()]
                    }
                }
            }
        };

        let node_voltages: BTreeMap<usize, f64> = layout
            .nodes
            .iter()
            .map(|node| (*node, layout.row(*node).map_or(0.0, |row| x[row])))
            .collect();
        let currents = sources
            .iter()
            .enumerate()
            .map(|(k, s)| (s.id, x[layout.unknowns + k]))
            .collect();

        MnaSolution::new(node_voltages, currents)
    }

    fn solve_system(&self, layout: &NodeLayout, sources: &[SourceRow], regularize: bool) -> Result<Vec<f64>> {
        let size = layout.unknowns + sources.len();
        if size == 0 {
            return Ok(Vec::new());
        }
        trace!(
            "assembling {}x{} system ({} nodes, {} sources)",
            size,
            size,
            layout.unknowns,
            sources.len()
        );

        let mut a = DenseMatrix::new(size);
        let mut z = vec![0.0; size];

        for r in self.resistors.iter().filter(|r| !r.is_short()) {
            a.stamp_conductance(layout.row(r.node0), layout.row(r.node1), 1.0 / r.resistance);
        }

        for s in &self.current_sources {
            if let Some(i) = layout.row(s.node0) {
                z[i] -= s.current;
            }
            if let Some(j) = layout.row(s.node1) {
                z[j] += s.current;
            }
        }

        for (k, s) in sources.iter().enumerate() {
            let br = layout.unknowns + k;
            a.stamp_voltage_source(layout.row(s.node0), layout.row(s.node1), br);
            z[br] = s.voltage;
        }

        if regularize {
            for i in 0..layout.unknowns {
                a.add(i, i, self.config.min_conductance);
            }
            for k in 0..sources.len() {
                let br = layout.unknowns + k;
                a.add(br, br, self.config.source_resistance);
            }
        }

        let x = solve_linear_system(&a, &z, self.config.pivot_tolerance)?;
        if x.iter().all(|v| v.is_finite()) {
            Ok(x)
        } else {
            Err(CircuitError::SingularMatrix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn battery(id: usize, n0: usize, n1: usize, v: f64) -> CompanionBattery {
        CompanionBattery::new(ElementId(id), n0, n1, v)
    }

    fn resistor(id: usize, n0: usize, n1: usize, r: f64) -> CompanionResistor {
        CompanionResistor::new(ElementId(id), n0, n1, r)
    }

    fn source(id: usize, n0: usize, n1: usize, i: f64) -> CompanionCurrentSource {
        CompanionCurrentSource::new(ElementId(id), n0, n1, i)
    }

    /// Net current leaving `node` through every element.
    fn kcl_residual(circuit: &MnaCircuit, solution: &MnaSolution, node: usize) -> f64 {
        let mut leaving = 0.0;
        for b in circuit.batteries() {
            let i = solution.battery_current(b);
            if b.node0 == node {
                leaving += i;
            }
            if b.node1 == node {
                leaving -= i;
            }
        }
        for r in circuit.resistors() {
            let i = solution.resistor_current(r);
            if r.node0 == node {
                leaving += i;
            }
            if r.node1 == node {
                leaving -= i;
            }
        }
        for s in circuit.current_sources() {
            if s.node0 == node {
                leaving += s.current;
            }
            if s.node1 == node {
                leaving -= s.current;
            }
        }
        leaving
    }

    #[test]
    fn test_battery_resistor() {
        let b = battery(0, 0, 1, 4.0);
        let r = resistor(1, 1, 0, 4.0);
        let circuit = MnaCircuit::new(vec![b.clone()], vec![r.clone()], vec![]);
        let solution = circuit.solve();

        let expected = MnaSolution::new(
            [(0, 0.0), (1, 4.0)],
            [(ElementId(0), 1.0)].into_iter().collect(),
        );
        assert_abs_diff_eq!(solution, expected, epsilon = 1e-9);
        assert_relative_eq!(solution.battery_current(&b), 1.0, epsilon = 1e-12);
        assert_relative_eq!(solution.resistor_current(&r), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unordered_nodes() {
        // 0 -> battery -> 3 -> 5R -> 1 -> 10R -> 2 -> 10R -> 0
        let b = battery(0, 0, 3, 10.0);
        let circuit = MnaCircuit::new(
            vec![b.clone()],
            vec![resistor(1, 1, 2, 10.0), resistor(2, 2, 0, 10.0), resistor(3, 3, 1, 5.0)],
            vec![],
        );
        let solution = circuit.solve();
        assert_relative_eq!(solution.battery_current(&b), 0.4, epsilon = 1e-9);
        assert_relative_eq!(solution.node_voltage(3), 10.0, epsilon = 1e-9);
        assert_relative_eq!(solution.node_voltage(1), 8.0, epsilon = 1e-9);
        assert_relative_eq!(solution.node_voltage(2), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negated_battery_negates_currents() {
        let forward = MnaCircuit::new(vec![battery(0, 0, 1, 4.0)], vec![resistor(1, 1, 0, 2.0)], vec![]);
        let negated = MnaCircuit::new(vec![battery(0, 0, 1, -4.0)], vec![resistor(1, 1, 0, 2.0)], vec![]);
        let f = forward.solve();
        let n = negated.solve();
        assert_relative_eq!(f.battery_current(&forward.batteries()[0]), 2.0, epsilon = 1e-12);
        assert_relative_eq!(n.battery_current(&negated.batteries()[0]), -2.0, epsilon = 1e-12);
        assert_relative_eq!(f.resistor_current(&forward.resistors()[0]), 2.0, epsilon = 1e-12);
        assert_relative_eq!(n.resistor_current(&negated.resistors()[0]), -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reversed_battery_orientation() {
        let reverse = MnaCircuit::new(vec![battery(0, 1, 0, 4.0)], vec![resistor(1, 1, 0, 2.0)], vec![]);
        let r = reverse.solve();
        // Node 0 is the reference, so the free node swings negative
        assert_relative_eq!(r.voltage_across(0, 1), -4.0, epsilon = 1e-12);
        assert_relative_eq!(r.get_current(ElementId(0)).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_series_and_parallel_resistors() {
        // Series: 12V across 2R + 4R
        let series = MnaCircuit::new(
            vec![battery(0, 0, 1, 12.0)],
            vec![resistor(1, 1, 2, 2.0), resistor(2, 2, 0, 4.0)],
            vec![],
        )
        .solve();
        assert_relative_eq!(series.get_current(ElementId(0)).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(series.node_voltage(2), 8.0, epsilon = 1e-12);

        // Parallel: 6V across 3R || 6R
        let parallel = MnaCircuit::new(
            vec![battery(0, 0, 1, 6.0)],
            vec![resistor(1, 1, 0, 3.0), resistor(2, 1, 0, 6.0)],
            vec![],
        )
        .solve();
        assert_relative_eq!(parallel.get_current(ElementId(0)).unwrap(), 3.0, epsilon = 1e-12);

        // Equal resistors in parallel draw V / (R / 2)
        let equal = MnaCircuit::new(
            vec![battery(0, 0, 1, 5.0)],
            vec![resistor(1, 1, 0, 10.0), resistor(2, 0, 1, 10.0)],
            vec![],
        )
        .solve();
        assert_relative_eq!(equal.get_current(ElementId(0)).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_current_source() {
        // 2A pushed from 0 to 1 through the source, returning through 5R
        let circuit = MnaCircuit::new(vec![], vec![resistor(1, 1, 0, 5.0)], vec![source(0, 0, 1, 2.0)]);
        let solution = circuit.solve();
        assert_relative_eq!(solution.node_voltage(1), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(kcl_residual(&circuit, &solution, 1), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_resistance_carries_current() {
        let circuit = MnaCircuit::new(
            vec![battery(0, 0, 1, 3.0)],
            vec![resistor(1, 1, 2, 0.0), resistor(2, 2, 0, 1.5)],
            vec![],
        );
        let solution = circuit.solve();
        assert_relative_eq!(solution.node_voltage(2), 3.0, epsilon = 1e-12);
        assert_relative_eq!(solution.get_current(ElementId(1)).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(solution.resistor_current(&circuit.resistors()[0]), 2.0, epsilon = 1e-12);
        assert_relative_eq!(solution.resistor_current(&circuit.resistors()[1]), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_floating_components_are_independent() {
        let circuit = MnaCircuit::new(
            vec![battery(0, 0, 1, 5.0), battery(1, 10, 11, 2.0)],
            vec![resistor(2, 1, 0, 5.0), resistor(3, 11, 10, 1.0)],
            vec![],
        );
        let solution = circuit.solve();
        assert_relative_eq!(solution.get_current(ElementId(0)).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(solution.get_current(ElementId(1)).unwrap(), 2.0, epsilon = 1e-12);
        assert_eq!(solution.node_voltage(10), 0.0);
        assert_relative_eq!(solution.node_voltage(11), 2.0, epsilon = 1e-12);
        assert_eq!(solution.node_voltage(5), 0.0);
    }

    #[test]
    fn test_sourceless_resistor_reads_zero() {
        let circuit = MnaCircuit::new(vec![], vec![resistor(0, 3, 7, 10.0)], vec![]);
        let solution = circuit.solve();
        assert_eq!(solution.node_voltages().len(), 2);
        for v in solution.node_voltages().values() {
            assert!(v.is_finite());
            assert_eq!(*v, 0.0);
        }
        assert_eq!(solution.resistor_current(&circuit.resistors()[0]), 0.0);
    }

    #[test]
    fn test_sparse_node_numbers() {
        let far = 1 << 40;
        let circuit = MnaCircuit::new(vec![battery(0, 0, far, 1.0)], vec![resistor(1, far, 0, 1.0)], vec![]);
        let solution = circuit.solve();
        assert_relative_eq!(solution.node_voltage(far), 1.0, epsilon = 1e-12);
        assert_relative_eq!(solution.get_current(ElementId(0)).unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(solution.node_voltages().len(), 2);
        assert_eq!(solution.node_voltage(far - 1), 0.0);
    }

    #[test]
    fn test_largest_node_number() {
        let circuit = MnaCircuit::new(
            vec![battery(0, 2, usize::MAX, 3.0)],
            vec![resistor(1, usize::MAX, 2, 3.0)],
            vec![],
        );
        let solution = circuit.solve();
        assert_relative_eq!(solution.voltage_across(2, usize::MAX), 3.0, epsilon = 1e-12);
        assert_relative_eq!(solution.get_current(ElementId(0)).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tiny_resistance_is_a_short() {
        let circuit = MnaCircuit::new(
            vec![battery(0, 0, 1, 3.0)],
            vec![resistor(1, 1, 2, 1e-300), resistor(2, 2, 0, 1.5)],
            vec![],
        );
        assert!(circuit.resistors()[0].is_short());
        assert!(!circuit.resistors()[1].is_short());
        let solution = circuit.solve();
        assert_relative_eq!(solution.node_voltage(2), 3.0, epsilon = 1e-12);
        assert_relative_eq!(solution.resistor_current(&circuit.resistors()[0]), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_kcl_holds_on_bridge() {
        let circuit = MnaCircuit::new(
            vec![battery(0, 0, 1, 9.0)],
            vec![
                resistor(1, 1, 2, 100.0),
                resistor(2, 1, 3, 220.0),
                resistor(3, 2, 3, 470.0),
                resistor(4, 2, 0, 330.0),
                resistor(5, 3, 0, 150.0),
            ],
            vec![source(6, 3, 2, 0.01)],
        );
        let solution = circuit.solve();
        for node in 0..4 {
            assert_abs_diff_eq!(kcl_residual(&circuit, &solution, node), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_shorted_battery_does_not_panic() {
        let circuit = MnaCircuit::new(vec![battery(0, 0, 1, 5.0)], vec![resistor(1, 0, 1, 0.0)], vec![]);
        let solution = circuit.solve();
        assert!(solution.node_voltages().values().all(|v| v.is_finite()));
        assert!(solution.get_current(ElementId(0)).unwrap().is_finite());
    }

    #[test]
    fn test_parallel_batteries_are_regularized() {
        let circuit = MnaCircuit::new(
            vec![battery(0, 0, 1, 5.0), battery(1, 0, 1, 5.0)],
            vec![resistor(2, 1, 0, 10.0)],
            vec![],
        );
        let solution = circuit.solve();
        assert_relative_eq!(solution.node_voltage(1), 5.0, epsilon = 1e-6);
        let total = solution.get_current(ElementId(0)).unwrap() + solution.get_current(ElementId(1)).unwrap();
        assert_relative_eq!(total, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_circuit() {
        let solution = MnaCircuit::default().solve();
        assert!(solution.node_voltages().is_empty());
        assert_eq!(solution.get_current(ElementId(0)), None);
    }

    #[test]
    fn test_deterministic() {
        let build = || {
            MnaCircuit::new(
                vec![battery(0, 2, 7, 1.5)],
                vec![resistor(1, 7, 4, 3.0), resistor(2, 4, 2, 6.0)],
                vec![source(3, 4, 7, 0.1)],
            )
        };
        assert_eq!(build().solve(), build().solve());
    }

    #[test]
    fn test_relabeling_nodes_preserves_differences() {
        let a = MnaCircuit::new(vec![battery(0, 0, 1, 6.0)], vec![resistor(1, 1, 2, 1.0), resistor(2, 2, 0, 2.0)], vec![])
            .solve();
        let b = MnaCircuit::new(
            vec![battery(0, 20, 21, 6.0)],
            vec![resistor(1, 21, 22, 1.0), resistor(2, 22, 20, 2.0)],
            vec![],
        )
        .solve();
        assert_relative_eq!(a.voltage_across(0, 2), b.voltage_across(20, 22), epsilon = 1e-12);
        assert_relative_eq!(
            a.get_current(ElementId(0)).unwrap(),
            b.get_current(ElementId(0)).unwrap(),
            epsilon = 1e-12
        );
    }
}
