//! Voltmeter-style measurements between two probe shapes.

use geo::{Intersects, Polygon};

use super::graph::Circuit;
use super::types::{Connection, JunctionId};
use crate::geometry;

impl Circuit {
    /// Resolve a probe shape to the point of the circuit it touches.
    ///
    /// Junctions take priority. A probe resting on a branch body is measured
    /// relative to the branch's start junction, interpolating linearly toward
    /// the end junction at the probe's centroid.
    pub fn get_connection(&self, shape: &Polygon<f64>) -> Option<Connection> {
        if let Some(junction) = self.junctions.iter().find(|j| shape.intersects(&j.shape())) {
            return Some(Connection {
                junction: junction.id,
                voltage_addon: 0.0,
            });
        }

        for branch in &self.branches {
            let Some((start, end)) = self.branch_endpoints(branch) else {
                continue;
            };
            if !shape.intersects(&branch.shape(start, end)) {
                continue;
            }
            let fraction = geometry::centroid(shape)
                .map(|p| geometry::project_fraction(p, start, end))
                .unwrap_or(0.0);
            let drop = self.junction_voltage(branch.end) - self.junction_voltage(branch.start);
            return Some(Connection {
                junction: branch.start,
                voltage_addon: fraction * drop,
            });
        }
        None
    }

    /// Voltage read by probes `a` (positive) and `b` (reference).
    ///
    /// Touching probes read 0, a probe touching nothing reads NaN.
    pub fn get_voltage(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> f64 {
        if a.intersects(b) {
            return 0.0;
        }
        match (self.get_connection(a), self.get_connection(b)) {
            (Some(ca), Some(cb)) => self.get_voltage_between_connections(&ca, &cb),
            _ => f64::NAN,
        }
    }

    /// Voltage between two resolved connections; 0 when they are not
    /// galvanically connected.
    pub fn get_voltage_between_connections(&self, a: &Connection, b: &Connection) -> f64 {
        if !self.get_connected_subgraph(a.junction).contains(&b.junction) {
            return 0.0;
        }
        let va = self.junction_voltage(a.junction) + a.voltage_addon;
        let vb = self.junction_voltage(b.junction) + b.voltage_addon;
        va - vb
    }

    fn junction_voltage(&self, id: JunctionId) -> f64 {
        self.junction(id).map(|j| j.voltage).unwrap_or(0.0)
    }
}
