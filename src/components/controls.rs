//! Control components: Switch.

/// A switch component.
///
/// Modeled as:
/// - Closed: a wire-like resistance
/// - Open: no element at all, so it constrains nothing
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub closed: bool,
}

impl Switch {
    /// Resistance when closed.
    pub const CLOSED_RESISTANCE: f64 = 1e-4;

    /// Create a new switch.
    pub fn new(closed: bool) -> Self {
        Self { closed }
    }

    /// Get the current resistance, `None` when open.
    pub fn resistance(&self) -> Option<f64> {
        if self.closed {
            Some(Self::CLOSED_RESISTANCE)
        } else {
            None
        }
    }

    /// Set the switch state.
    pub fn set_state(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Toggle the switch state.
    pub fn toggle(&mut self) {
        self.closed = !self.closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_toggle() {
        let mut s = Switch::new(false);
        assert_eq!(s.resistance(), None);
        s.toggle();
        assert_eq!(s.resistance(), Some(Switch::CLOSED_RESISTANCE));
        s.set_state(false);
        assert!(!s.closed);
    }
}
