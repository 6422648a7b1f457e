//! Per-tick solve of a live [`Circuit`].

use std::collections::HashMap;

use log::{trace, warn};

use crate::circuit::{Circuit, JunctionId};
use crate::error::{CircuitError, Result};

use super::companion::{CompanionBuilder, CurrentProbe};
use super::{MnaSolution, DEFAULT_SOURCE_RESISTANCE, MIN_CONDUCTANCE, PIVOT_TOLERANCE};

/// Configuration for the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Conductance to reference added on every node when regularizing.
    pub min_conductance: f64,
    /// Series resistance added to every voltage source when regularizing.
    pub source_resistance: f64,
    /// Relative pivot magnitude below which a matrix is treated as singular.
    pub pivot_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            min_conductance: MIN_CONDUCTANCE,
            source_resistance: DEFAULT_SOURCE_RESISTANCE,
            pivot_tolerance: PIVOT_TOLERANCE,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_conductance(mut self, min_conductance: f64) -> Self {
        self.min_conductance = min_conductance;
        self
    }

    pub fn with_source_resistance(mut self, source_resistance: f64) -> Self {
        self.source_resistance = source_resistance;
        self
    }

    /// Set the singularity threshold.
    ///
    /// Larger values fall back to the regularized system sooner.
    pub fn with_pivot_tolerance(mut self, pivot_tolerance: f64) -> Self {
        self.pivot_tolerance = pivot_tolerance;
        self
    }
}

/// Advances a circuit in time, one linear solve per tick.
#[derive(Debug, Clone, Default)]
pub struct CircuitSolver {
    config: SolverConfig,
    /// Simulated time in seconds
    time: f64,
}

impl CircuitSolver {
    /// Create a new solver with default configuration.
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self { config, time: 0.0 }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Simulated time elapsed over all ticks.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Solve the circuit for one tick of length `dt` seconds.
    ///
    /// Junction voltages and branch currents are written back into the
    /// circuit and the raw solution is stored on it. A `dt` of zero solves
    /// the DC operating point with capacitors open.
    pub fn solve(&mut self, circuit: &mut Circuit, dt: f64) -> Result<()> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(CircuitError::InvalidSimulationParam {
                message: format!("time step must be finite and non-negative, got {}", dt),
            });
        }

        // Number junctions densely in storage order
        let nodes: HashMap<JunctionId, usize> = circuit
            .junctions()
            .iter()
            .enumerate()
            .map(|(index, junction)| (junction.id, index))
            .collect();

        let time = self.time;
        for branch in circuit.branches_mut() {
            if let Some(element) = branch.kind.as_dynamic_mut() {
                element.update(time, dt);
            }
        }

        let mut builder = CompanionBuilder::new(nodes.len());
        let probes: Vec<CurrentProbe> = circuit
            .branches()
            .iter()
            .map(|branch| match (nodes.get(&branch.start), nodes.get(&branch.end)) {
                (Some(&n0), Some(&n1)) => {
                    branch
                        .kind
                        .stamp_companion(n0, n1, circuit.branch_length(branch), &mut builder)
                }
                _ => {
                    warn!("branch {} has a dangling endpoint; treating it as open", branch.id);
                    CurrentProbe::Open
                }
            })
            .collect();

        let solution = builder.build(self.config.clone()).solve();
        self.write_back(circuit, &nodes, &probes, &solution);
        circuit.set_solution(solution);

        self.time += dt;
        trace!(
            "solved {} junctions, {} branches at t = {:.6}s",
            nodes.len(),
            probes.len(),
            self.time
        );
        Ok(())
    }

    fn write_back(
        &self,
        circuit: &mut Circuit,
        nodes: &HashMap<JunctionId, usize>,
        probes: &[CurrentProbe],
        solution: &MnaSolution,
    ) {
        let voltage = |id: JunctionId| nodes.get(&id).map_or(0.0, |&n| solution.node_voltage(n));

        for junction in circuit.junctions_mut() {
            junction.voltage = voltage(junction.id);
        }

        for (branch, probe) in circuit.branches_mut().iter_mut().zip(probes) {
            let current = probe.current(solution);
            branch.current = current;
            if let Some(element) = branch.kind.as_dynamic_mut() {
                element.commit(voltage(branch.start) - voltage(branch.end), current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Junction;
    use crate::components::{Battery, BranchKind, Capacitor, CurrentSource, Resistor, Switch, Wire};
    use crate::geometry::vec2;
    use approx::assert_relative_eq;

    /// Battery from `a` to `b`, resistor from `b` back to `a`.
    fn loop_circuit(voltage: f64, resistance: f64) -> (Circuit, JunctionId, JunctionId) {
        let mut circuit = Circuit::new();
        let a = Junction::new(vec2(0.0, 0.0));
        let b = Junction::new(vec2(1.0, 0.0));
        let (ia, ib) = (a.id, b.id);
        circuit
            .add_branch_between(BranchKind::Battery(Battery::new(voltage)), a.clone(), b.clone())
            .unwrap();
        circuit
            .add_branch_between(BranchKind::Resistor(Resistor::new(resistance)), b, a)
            .unwrap();
        (circuit, ia, ib)
    }

    #[test]
    fn test_write_back() {
        let (mut circuit, a, b) = loop_circuit(4.0, 4.0);
        let mut solver = CircuitSolver::new();
        solver.solve(&mut circuit, 0.0).unwrap();

        let va = circuit.junction(a).unwrap().voltage;
        let vb = circuit.junction(b).unwrap().voltage;
        assert_relative_eq!(vb - va, 4.0, epsilon = 1e-9);
        assert_relative_eq!(circuit.branches()[0].current, 1.0, epsilon = 1e-9);
        assert_relative_eq!(circuit.branches()[1].current, 1.0, epsilon = 1e-9);
        assert!(circuit.solution().is_some());
    }

    #[test]
    fn test_rejects_bad_time_step() {
        let (mut circuit, _, _) = loop_circuit(1.0, 1.0);
        let mut solver = CircuitSolver::new();
        assert!(matches!(
            solver.solve(&mut circuit, -1.0),
            Err(CircuitError::InvalidSimulationParam { .. })
        ));
        assert!(solver.solve(&mut circuit, f64::NAN).is_err());
        assert_eq!(solver.time(), 0.0);
    }

    #[test]
    fn test_open_switch_stops_current() {
        let mut circuit = Circuit::new();
        let a = Junction::new(vec2(0.0, 0.0));
        let b = Junction::new(vec2(1.0, 0.0));
        let c = Junction::new(vec2(1.0, 1.0));
        circuit
            .add_branch_between(BranchKind::Battery(Battery::new(6.0)), a.clone(), b.clone())
            .unwrap();
        let switch = circuit
            .add_branch_between(BranchKind::Switch(Switch::new(false)), b, c.clone())
            .unwrap();
        circuit
            .add_branch_between(BranchKind::Resistor(Resistor::new(3.0)), c, a)
            .unwrap();

        let mut solver = CircuitSolver::new();
        solver.solve(&mut circuit, 0.0).unwrap();
        assert_eq!(circuit.branches()[2].current, 0.0);

        circuit
            .modify_branch(switch, |kind| {
                if let BranchKind::Switch(s) = kind {
                    s.set_state(true);
                }
            })
            .unwrap();
        solver.solve(&mut circuit, 0.0).unwrap();
        assert_relative_eq!(circuit.branches()[2].current, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_capacitor_charges() {
        // 1V through 1 ohm into 1F: tau = 1s
        let mut circuit = Circuit::new();
        let a = Junction::new(vec2(0.0, 0.0));
        let b = Junction::new(vec2(1.0, 0.0));
        let c = Junction::new(vec2(1.0, 1.0));
        let (ib, ic) = (b.id, c.id);
        circuit
            .add_branch_between(BranchKind::Battery(Battery::new(1.0)), a.clone(), b.clone())
            .unwrap();
        circuit
            .add_branch_between(BranchKind::Resistor(Resistor::new(1.0)), b, c.clone())
            .unwrap();
        circuit
            .add_branch_between(BranchKind::Capacitor(Capacitor::new(1.0)), c, a)
            .unwrap();

        let mut solver = CircuitSolver::new();
        for _ in 0..100 {
            solver.solve(&mut circuit, 0.01).unwrap();
        }
        assert_relative_eq!(solver.time(), 1.0, epsilon = 1e-9);

        let vb = circuit.junction(ib).unwrap().voltage;
        let vc = circuit.junction(ic).unwrap().voltage;
        let charged = 1.0 - (-1.0f64).exp();
        // Capacitor voltage is measured from c to a, a sitting 1V below b
        assert_relative_eq!(vc - (vb - 1.0), charged, epsilon = 5e-3);
        assert_relative_eq!(circuit.branches()[2].current, 1.0 - charged, epsilon = 5e-3);
    }

    #[test]
    fn test_current_source_into_resistor() {
        let mut circuit = Circuit::new();
        let a = Junction::new(vec2(0.0, 0.0));
        let b = Junction::new(vec2(1.0, 0.0));
        let (ia, ib) = (a.id, b.id);
        circuit
            .add_branch_between(BranchKind::CurrentSource(CurrentSource::new(0.5)), a.clone(), b.clone())
            .unwrap();
        circuit
            .add_branch_between(BranchKind::Resistor(Resistor::new(10.0)), b, a)
            .unwrap();

        let mut solver = CircuitSolver::new();
        solver.solve(&mut circuit, 0.0).unwrap();
        let v = circuit.junction(ib).unwrap().voltage - circuit.junction(ia).unwrap().voltage;
        assert_relative_eq!(v, 5.0, epsilon = 1e-9);
        assert_relative_eq!(circuit.branches()[0].current, 0.5);
        assert_relative_eq!(circuit.branches()[1].current, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_resolves_after_split() {
        let mut circuit = Circuit::new();
        let a = Junction::new(vec2(0.0, 0.0));
        let b = Junction::new(vec2(1.0, 0.0));
        let c = Junction::new(vec2(2.0, 0.0));
        let ib = b.id;
        circuit
            .add_branch_between(BranchKind::Battery(Battery::new(2.0)), a.clone(), b.clone())
            .unwrap();
        circuit
            .add_branch_between(BranchKind::Wire(Wire::default()), b, c.clone())
            .unwrap();
        circuit
            .add_branch_between(BranchKind::Resistor(Resistor::new(2.0)), c, a)
            .unwrap();

        let mut solver = CircuitSolver::new();
        solver.solve(&mut circuit, 0.0).unwrap();
        assert_relative_eq!(circuit.branches()[0].current, 1.0, epsilon = 1e-3);

        circuit.split(ib).unwrap();
        solver.solve(&mut circuit, 0.0).unwrap();
        for branch in circuit.branches() {
            assert!(branch.current.abs() < 1e-9);
        }
        assert!(circuit.junctions().iter().all(|j| j.voltage.is_finite()));
    }
}
