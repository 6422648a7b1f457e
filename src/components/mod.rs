//! Branch kinds and their electrical parameters.
//!
//! This module provides the element types a branch can carry:
//! - Conductors: Wire, Resistor
//! - Sources: Battery, Current Source
//! - Controls: Switch
//! - Dynamic: Capacitor
//!
//! Each kind is mapped to linear companion elements by
//! [`crate::solver::CompanionBuilder`] before every solve.

mod controls;
mod linear;
mod sources;

pub use controls::Switch;
pub use linear::{Capacitor, Resistor, Wire};
pub use sources::{Battery, CurrentSource};

/// Per-frame hook for elements whose companion model depends on history.
pub trait DynamicElement {
    /// Called before the linear solve of a tick.
    fn update(&mut self, time: f64, dt: f64);

    /// Called after the solve with the voltage across (start minus end) and
    /// the current through (start to end) the element.
    fn commit(&mut self, voltage: f64, current: f64);
}

/// The element a branch carries.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchKind {
    Wire(Wire),
    Resistor(Resistor),
    Battery(Battery),
    Switch(Switch),
    CurrentSource(CurrentSource),
    Capacitor(Capacitor),
}

impl BranchKind {
    /// Whether this kind propagates rigid (move-together) connectivity.
    ///
    /// Everything except wires is a circuit component and does.
    pub fn is_strong_connector(&self) -> bool {
        !matches!(self, BranchKind::Wire(_))
    }

    /// Whether current can flow through this branch.
    pub fn is_conducting(&self) -> bool {
        !matches!(self, BranchKind::Switch(s) if !s.closed)
    }

    /// Short type name, used for labels and logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            BranchKind::Wire(_) => "wire",
            BranchKind::Resistor(_) => "resistor",
            BranchKind::Battery(_) => "battery",
            BranchKind::Switch(_) => "switch",
            BranchKind::CurrentSource(_) => "current source",
            BranchKind::Capacitor(_) => "capacitor",
        }
    }

    /// Half width of the branch body used for hit-testing.
    pub fn body_half_width(&self) -> f64 {
        match self {
            BranchKind::Wire(_) => 0.05,
            _ => 0.15,
        }
    }

    /// Access the dynamic-element hook, if this kind has one.
    pub fn as_dynamic_mut(&mut self) -> Option<&mut dyn DynamicElement> {
        match self {
            BranchKind::Capacitor(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_connectors() {
        assert!(!BranchKind::Wire(Wire::default()).is_strong_connector());
        assert!(BranchKind::Resistor(Resistor::new(1.0)).is_strong_connector());
        assert!(BranchKind::Switch(Switch::new(false)).is_strong_connector());
    }

    #[test]
    fn test_open_switch_does_not_conduct() {
        assert!(!BranchKind::Switch(Switch::new(false)).is_conducting());
        assert!(BranchKind::Switch(Switch::new(true)).is_conducting());
        assert!(BranchKind::Battery(Battery::new(1.5)).is_conducting());
    }

    #[test]
    fn test_only_capacitor_is_dynamic() {
        let mut cap = BranchKind::Capacitor(Capacitor::new(1e-6));
        assert!(cap.as_dynamic_mut().is_some());
        let mut r = BranchKind::Resistor(Resistor::new(10.0));
        assert!(r.as_dynamic_mut().is_none());
    }
}
