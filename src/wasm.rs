//! WASM bindings for Circuit Core.
//!
//! This module provides JavaScript-friendly bindings so a browser front end
//! can drive the simulation from its animation loop.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCircuitSim } from 'circuit_core';
//!
//! await init();
//!
//! const layout = `
//!   .junction a 0 0
//!   .junction b 4 0
//!   .junction c 4 3
//!   B1 a b 9
//!   R1 b c 10
//!   SW1 c a open
//! `;
//!
//! const sim = new WasmCircuitSim(layout);
//! sim.set_switch("SW1", true);
//!
//! // In requestAnimationFrame:
//! sim.step(1 / 60);
//! const current = sim.branch_current("R1");
//! ```

use wasm_bindgen::prelude::*;

use crate::circuit::Circuit;
use crate::components::BranchKind;
use crate::dsl;
use crate::error::CircuitError;
use crate::solver::CircuitSolver;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(error: CircuitError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// WASM-compatible circuit simulator.
///
/// Wraps a live [`Circuit`] and its [`CircuitSolver`]. Junctions and
/// branches are addressed by their layout names.
#[wasm_bindgen]
pub struct WasmCircuitSim {
    circuit: Circuit,
    solver: CircuitSolver,
}

#[wasm_bindgen]
impl WasmCircuitSim {
    /// Create a new simulator from a layout DSL string.
    ///
    /// # Returns
    /// A new `WasmCircuitSim` instance or an error if the layout is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(layout: &str) -> Result<WasmCircuitSim, JsValue> {
        let circuit = dsl::load(layout).map_err(to_js)?;
        crate::circuit::validate_circuit(&circuit).map_err(to_js)?;

        Ok(WasmCircuitSim {
            circuit,
            solver: CircuitSolver::new(),
        })
    }

    /// Advance the simulation by `dt` seconds.
    #[wasm_bindgen]
    pub fn step(&mut self, dt: f64) -> Result<(), JsValue> {
        self.solver.solve(&mut self.circuit, dt).map_err(to_js)
    }

    /// Simulated time in seconds.
    #[wasm_bindgen(getter)]
    pub fn time(&self) -> f64 {
        self.solver.time()
    }

    /// Voltage at a named junction, or `undefined` if it doesn't exist.
    #[wasm_bindgen]
    pub fn junction_voltage(&self, name: &str) -> Option<f64> {
        let id = self.circuit.find_junction(name)?;
        self.circuit.junction(id).map(|j| j.voltage)
    }

    /// Current through a named branch, or `undefined` if it doesn't exist.
    #[wasm_bindgen]
    pub fn branch_current(&self, name: &str) -> Option<f64> {
        let id = self.circuit.find_branch(name)?;
        self.circuit.branch(id).map(|b| b.current)
    }

    /// Open or close a named switch.
    #[wasm_bindgen]
    pub fn set_switch(&mut self, name: &str, closed: bool) -> Result<(), JsValue> {
        let id = self
            .circuit
            .find_branch(name)
            .ok_or_else(|| JsValue::from_str(&format!("no branch named '{}'", name)))?;
        if !matches!(self.circuit.branch(id).map(|b| &b.kind), Some(BranchKind::Switch(_))) {
            return Err(to_js(CircuitError::WasmError {
                message: format!("branch '{}' is not a switch", name),
            }));
        }
        self.circuit
            .modify_branch(id, |kind| {
                if let BranchKind::Switch(switch) = kind {
                    switch.set_state(closed);
                }
            })
            .map_err(to_js)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
