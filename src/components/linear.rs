//! Passive branch kinds: Wire, Resistor, Capacitor.

use super::DynamicElement;

/// A wire.
///
/// Wires are nearly ideal conductors whose resistance grows with length.
/// The floor keeps loops of wires solvable without ideal-source constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    /// Ohms per model unit of length
    pub resistivity: f64,
}

impl Wire {
    /// Default resistivity (ohms per model unit).
    pub const DEFAULT_RESISTIVITY: f64 = 1e-4;
    /// Smallest resistance a wire of any length presents.
    pub const MIN_RESISTANCE: f64 = 1e-5;

    /// Create a wire with the given resistivity.
    pub fn new(resistivity: f64) -> Self {
        Self {
            resistivity: resistivity.max(0.0),
        }
    }

    /// Get the resistance of a wire of the given length.
    pub fn resistance(&self, length: f64) -> f64 {
        (self.resistivity * length).max(Self::MIN_RESISTANCE)
    }
}

impl Default for Wire {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RESISTIVITY)
    }
}

/// A resistor component.
///
/// A resistance of exactly zero is legal and solved as a rigid short.
#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    pub resistance: f64,
}

impl Resistor {
    /// Create a new resistor. Negative or NaN values are clamped to zero.
    pub fn new(resistance: f64) -> Self {
        Self {
            resistance: resistance.max(0.0),
        }
    }

    /// Set the resistance. Negative or NaN values are clamped to zero.
    pub fn set_resistance(&mut self, resistance: f64) {
        self.resistance = resistance.max(0.0);
    }
}

/// A capacitor component.
///
/// In discrete-time simulation, a capacitor is modeled using a companion model.
/// Using the trapezoidal rule:
///   i(t) = (2C/dt) * v(t) - i_eq(t-dt)
///
/// where i_eq(t-dt) = (2C/dt) * v(t-dt) + i(t-dt)
///
/// This gives an equivalent conductance G_eq = 2C/dt and an equivalent
/// current source I_eq = -i_eq(t-dt).
#[derive(Debug, Clone, PartialEq)]
pub struct Capacitor {
    pub capacitance: f64,

    // State for discrete-time model
    /// Previous voltage across capacitor (start minus end)
    pub v_prev: f64,
    /// Previous current through capacitor (start to end)
    pub i_prev: f64,
    /// Time step of the solve in progress
    dt: f64,
}

impl Capacitor {
    /// Create a new, discharged capacitor.
    pub fn new(capacitance: f64) -> Self {
        Self {
            capacitance: capacitance.max(0.0),
            v_prev: 0.0,
            i_prev: 0.0,
            dt: 0.0,
        }
    }

    /// Time step recorded by the last [`DynamicElement::update`].
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Get the equivalent conductance for the trapezoidal companion model.
    pub fn conductance(&self, dt: f64) -> f64 {
        2.0 * self.capacitance / dt
    }

    /// Get the equivalent current source value for the companion model.
    ///
    /// The history term is subtracted from the element current, so the
    /// source pushes current from end to start.
    pub fn current_source(&self, dt: f64) -> f64 {
        -(self.conductance(dt) * self.v_prev + self.i_prev)
    }
}

impl DynamicElement for Capacitor {
    fn update(&mut self, _time: f64, dt: f64) {
        self.dt = dt;
    }

    fn commit(&mut self, voltage: f64, current: f64) {
        self.v_prev = voltage;
        self.i_prev = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_resistance_floor() {
        let w = Wire::default();
        assert!((w.resistance(10.0) - 1e-3).abs() < 1e-15);
        assert_eq!(w.resistance(0.0), Wire::MIN_RESISTANCE);
    }

    #[test]
    fn test_resistor_clamps_negative() {
        let r = Resistor::new(-5.0);
        assert_eq!(r.resistance, 0.0);
    }

    #[test]
    fn test_capacitor_companion_model() {
        let mut c = Capacitor::new(1e-3);
        let dt = 0.01;
        c.update(0.0, dt);
        assert_eq!(c.dt(), dt);

        // G_eq = 2C/dt = 0.2 S
        assert!((c.conductance(dt) - 0.2).abs() < 1e-12);

        // Initial current source should be 0
        assert!(c.current_source(dt).abs() < 1e-12);

        c.commit(1.0, 0.05);
        assert!((c.current_source(dt) + 0.25).abs() < 1e-12);
    }
}
