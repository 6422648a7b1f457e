//! Construction of a [`Circuit`] from a parsed layout.

use std::collections::HashMap;

use log::{debug, warn};

use super::ast::{BranchDef, BranchType, LayoutAst};
use crate::circuit::{Branch, Circuit, Junction, JunctionId};
use crate::components::{Battery, BranchKind, Capacitor, CurrentSource, Resistor, Switch, Wire};
use crate::error::{CircuitError, Result};
use crate::geometry::vec2;

/// Build a live circuit from a layout AST.
///
/// Junctions and branches carry their layout names as labels. Declared
/// junctions that no branch uses are skipped, since a circuit never holds
/// orphans.
pub fn build_circuit(ast: &LayoutAst) -> Result<Circuit> {
    let mut circuit = Circuit::new();
    let mut placed: HashMap<&str, JunctionId> = HashMap::new();

    for def in &ast.branches {
        let kind = branch_kind(def)?;
        if def.start == def.end {
            return Err(CircuitError::invalid_component(
                &def.name,
                def.line,
                format!("both ends connect to junction '{}'", def.start),
            ));
        }

        let start = place_junction(&mut circuit, &mut placed, ast, &def.start, def.line)?;
        let end = place_junction(&mut circuit, &mut placed, ast, &def.end, def.line)?;

        let branch = Branch::new(kind, start, end).with_label(&def.name);
        circuit.add_branch(branch)?;
    }

    for jdef in &ast.junctions {
        if !placed.contains_key(jdef.name.as_str()) {
            warn!(
                "junction '{}' declared at line {} is not used by any branch",
                jdef.name, jdef.line
            );
        }
    }

    debug!(
        "built circuit with {} junctions and {} branches",
        circuit.junctions().len(),
        circuit.branches().len()
    );
    Ok(circuit)
}

/// Add a declared junction the first time a branch refers to it.
fn place_junction<'a>(
    circuit: &mut Circuit,
    placed: &mut HashMap<&'a str, JunctionId>,
    ast: &'a LayoutAst,
    name: &str,
    line: usize,
) -> Result<JunctionId> {
    if let Some(id) = placed.get(name) {
        return Ok(*id);
    }
    let def = ast.junction(name).ok_or_else(|| CircuitError::UndefinedJunction {
        name: name.to_string(),
        line,
    })?;
    let mut junction = Junction::new(vec2(def.x, def.y)).with_label(&def.name);
    if def.fixed {
        junction = junction.fixed();
    }
    let id = circuit.add_junction(junction);
    placed.insert(def.name.as_str(), id);
    Ok(id)
}

fn branch_kind(def: &BranchDef) -> Result<BranchKind> {
    let value = def.value.unwrap_or(0.0);
    let non_negative = |what: &str| -> Result<f64> {
        if value < 0.0 {
            Err(CircuitError::InvalidParameter {
                component: def.name.clone(),
                param: what.to_string(),
                message: format!("must be non-negative, got {}", value),
            })
        } else {
            Ok(value)
        }
    };

    let kind = match def.branch_type {
        BranchType::Wire => {
            let resistivity = def.params.get("rho").copied().unwrap_or(Wire::DEFAULT_RESISTIVITY);
            BranchKind::Wire(Wire::new(resistivity))
        }
        BranchType::Resistor => BranchKind::Resistor(Resistor::new(non_negative("resistance")?)),
        BranchType::Battery => {
            let mut battery = Battery::new(value);
            if let Some(r) = def.params.get("r") {
                battery = battery.with_internal_resistance(*r);
            }
            BranchKind::Battery(battery)
        }
        BranchType::Switch => BranchKind::Switch(Switch::new(switch_state(def)?)),
        BranchType::CurrentSource => BranchKind::CurrentSource(CurrentSource::new(value)),
        BranchType::Capacitor => BranchKind::Capacitor(Capacitor::new(non_negative("capacitance")?)),
    };
    Ok(kind)
}

fn switch_state(def: &BranchDef) -> Result<bool> {
    match (def.params.get("state"), def.state) {
        (Some(p), Some(s)) if (*p != 0.0) != s => Err(CircuitError::InvalidParameter {
            component: def.name.clone(),
            param: "state".to_string(),
            message: format!("state={} contradicts '{}'", p, if s { "closed" } else { "open" }),
        }),
        (Some(p), _) => Ok(*p != 0.0),
        (None, s) => Ok(s.unwrap_or(false)),
    }
}
