//! Mapping of branch kinds to linear companion elements.

use super::mna::{CompanionBattery, CompanionCurrentSource, CompanionResistor, ElementId, MnaCircuit};
use super::{MnaSolution, SolverConfig};
use crate::components::BranchKind;

/// Collects companion elements, handing out element ids and internal nodes.
#[derive(Debug, Default)]
pub struct CompanionBuilder {
    batteries: Vec<CompanionBattery>,
    resistors: Vec<CompanionResistor>,
    current_sources: Vec<CompanionCurrentSource>,
    next_element: usize,
    next_node: usize,
}

impl CompanionBuilder {
    /// Create a builder whose internal nodes start at `first_free_node`.
    pub fn new(first_free_node: usize) -> Self {
        Self {
            next_node: first_free_node,
            ..Self::default()
        }
    }

    fn element_id(&mut self) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        id
    }

    /// Allocate a node that belongs to no junction.
    pub fn internal_node(&mut self) -> usize {
        let node = self.next_node;
        self.next_node += 1;
        node
    }

    pub fn battery(&mut self, node0: usize, node1: usize, voltage: f64) -> CompanionBattery {
        let battery = CompanionBattery::new(self.element_id(), node0, node1, voltage);
        self.batteries.push(battery.clone());
        battery
    }

    pub fn resistor(&mut self, node0: usize, node1: usize, resistance: f64) -> CompanionResistor {
        let resistor = CompanionResistor::new(self.element_id(), node0, node1, resistance);
        self.resistors.push(resistor.clone());
        resistor
    }

    pub fn current_source(&mut self, node0: usize, node1: usize, current: f64) -> CompanionCurrentSource {
        let source = CompanionCurrentSource::new(self.element_id(), node0, node1, current);
        self.current_sources.push(source.clone());
        source
    }

    pub fn build(self, config: SolverConfig) -> MnaCircuit {
        MnaCircuit::with_config(self.batteries, self.resistors, self.current_sources, config)
    }
}

/// How a branch's current is read back from a solution.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentProbe {
    Resistor(CompanionResistor),
    Battery(CompanionBattery),
    /// Current fixed ahead of the solve
    Fixed(f64),
    /// Resistor in parallel with a known current source
    Parallel {
        resistor: CompanionResistor,
        source_current: f64,
    },
    /// Branch carries no current
    Open,
}

impl CurrentProbe {
    /// Current through the branch, start to end.
    pub fn current(&self, solution: &MnaSolution) -> f64 {
        match self {
            CurrentProbe::Resistor(r) => solution.resistor_current(r),
            CurrentProbe::Battery(b) => solution.battery_current(b),
            CurrentProbe::Fixed(i) => *i,
            CurrentProbe::Parallel {
                resistor,
                source_current,
            } => solution.resistor_current(resistor) + source_current,
            CurrentProbe::Open => 0.0,
        }
    }
}

impl BranchKind {
    /// Emit the companion elements of a branch running from `node0` (start)
    /// to `node1` (end) and return how to read its current back.
    pub fn stamp_companion(
        &self,
        node0: usize,
        node1: usize,
        length: f64,
        builder: &mut CompanionBuilder,
    ) -> CurrentProbe {
        match self {
            BranchKind::Wire(w) => CurrentProbe::Resistor(builder.resistor(node0, node1, w.resistance(length))),
            BranchKind::Resistor(r) => CurrentProbe::Resistor(builder.resistor(node0, node1, r.resistance)),
            BranchKind::Battery(b) => match b.effective_internal_resistance() {
                Some(r) => {
                    let internal = builder.internal_node();
                    let battery = builder.battery(node0, internal, b.voltage);
                    builder.resistor(internal, node1, r);
                    CurrentProbe::Battery(battery)
                }
                None => CurrentProbe::Battery(builder.battery(node0, node1, b.voltage)),
            },
            BranchKind::Switch(s) => match s.resistance() {
                Some(r) => CurrentProbe::Resistor(builder.resistor(node0, node1, r)),
                None => CurrentProbe::Open,
            },
            BranchKind::CurrentSource(s) => {
                builder.current_source(node0, node1, s.current);
                CurrentProbe::Fixed(s.current)
            }
            BranchKind::Capacitor(c) => {
                let dt = c.dt();
                if dt <= 0.0 || c.capacitance <= 0.0 {
                    return CurrentProbe::Open;
                }
                let resistor = builder.resistor(node0, node1, 1.0 / c.conductance(dt));
                let source_current = c.current_source(dt);
                builder.current_source(node0, node1, source_current);
                CurrentProbe::Parallel {
                    resistor,
                    source_current,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Battery, Capacitor, DynamicElement, Switch, Wire};
    use approx::assert_relative_eq;

    #[test]
    fn test_wire_uses_length() {
        let mut builder = CompanionBuilder::new(2);
        let probe = BranchKind::Wire(Wire::default()).stamp_companion(0, 1, 20.0, &mut builder);
        match probe {
            CurrentProbe::Resistor(r) => assert_relative_eq!(r.resistance, 2e-3),
            other => panic!("unexpected probe {:?}", other),
        }
    }

    #[test]
    fn test_internal_resistance_adds_node() {
        let mut builder = CompanionBuilder::new(2);
        let kind = BranchKind::Battery(Battery::new(9.0).with_internal_resistance(1.0));
        let probe = kind.stamp_companion(0, 1, 1.0, &mut builder);
        BranchKind::Wire(Wire::default()).stamp_companion(1, 0, 1.0, &mut builder);

        let circuit = builder.build(SolverConfig::default());
        assert_eq!(circuit.batteries().len(), 1);
        assert_eq!(circuit.batteries()[0].node1, 2);
        assert_eq!(circuit.resistors()[0].node0, 2);

        // 9V into 1 ohm plus a short wire: about 9A
        let solution = circuit.solve();
        assert_relative_eq!(probe.current(&solution), 9.0, epsilon = 1e-2);
    }

    #[test]
    fn test_open_switch_emits_nothing() {
        let mut builder = CompanionBuilder::new(2);
        let probe = BranchKind::Switch(Switch::new(false)).stamp_companion(0, 1, 1.0, &mut builder);
        assert_eq!(probe, CurrentProbe::Open);
        let circuit = builder.build(SolverConfig::default());
        assert!(circuit.resistors().is_empty());
    }

    #[test]
    fn test_capacitor_needs_time_step() {
        let mut cap = Capacitor::new(1e-3);
        let mut builder = CompanionBuilder::new(2);
        let probe = BranchKind::Capacitor(cap.clone()).stamp_companion(0, 1, 1.0, &mut builder);
        assert_eq!(probe, CurrentProbe::Open);

        cap.update(0.0, 1e-3);
        let probe = BranchKind::Capacitor(cap).stamp_companion(0, 1, 1.0, &mut builder);
        match probe {
            CurrentProbe::Parallel { resistor, source_current } => {
                assert_relative_eq!(resistor.resistance, 0.5);
                assert_eq!(source_current, 0.0);
            }
            other => panic!("unexpected probe {:?}", other),
        }
    }
}
