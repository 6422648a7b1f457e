//! Batteries and current sources.

/// A battery.
///
/// The end junction is the positive terminal: V(end) - V(start) = voltage.
/// An optional internal resistance is placed in series with the ideal source.
#[derive(Debug, Clone, PartialEq)]
pub struct Battery {
    pub voltage: f64,
    pub internal_resistance: Option<f64>,
}

impl Battery {
    /// Create an ideal battery.
    pub fn new(voltage: f64) -> Self {
        Self {
            voltage,
            internal_resistance: None,
        }
    }

    /// Give the battery a series internal resistance.
    pub fn with_internal_resistance(mut self, resistance: f64) -> Self {
        self.internal_resistance = Some(resistance);
        self
    }

    /// Set the source voltage.
    pub fn set_voltage(&mut self, voltage: f64) {
        self.voltage = voltage;
    }

    /// Internal resistance that actually takes part in the solve.
    pub fn effective_internal_resistance(&self) -> Option<f64> {
        self.internal_resistance.filter(|r| *r > 0.0)
    }
}

/// A current source component.
///
/// Current flows from the start junction to the end junction through the source.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSource {
    pub current: f64,
}

impl CurrentSource {
    /// Create a new current source.
    pub fn new(current: f64) -> Self {
        Self { current }
    }

    /// Set the source value.
    pub fn set_current(&mut self, current: f64) {
        self.current = current;
    }
}
