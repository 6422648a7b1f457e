//! circuitsim - solve a circuit layout from the command line.
//!
//! # Usage
//!
//! ```bash
//! circuitsim flashlight.layout --ticks 60 --dt 0.016 --probe b a -v
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::{info, LevelFilter};

use circuit_core::{
    circuit::{validate_circuit, Circuit, Connection},
    dsl,
    error::{CircuitError, Result},
    CircuitSolver, DEFAULT_TIME_STEP,
};

/// Interactive circuit simulator, headless
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the layout description file
    #[arg(value_name = "LAYOUT_FILE")]
    layout_file: PathBuf,

    /// Number of solver ticks to run
    #[arg(short, long, default_value_t = 1)]
    ticks: usize,

    /// Tick length in seconds
    #[arg(long, default_value_t = DEFAULT_TIME_STEP)]
    dt: f64,

    /// Report the voltage of junction A relative to junction B
    #[arg(long, num_args = 2, value_names = ["A", "B"], action = ArgAction::Append)]
    probe: Vec<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // Parse and build the circuit
    let ast = dsl::parse_file(&args.layout_file)?;
    let mut circuit = dsl::build_circuit(&ast)?;
    validate_circuit(&circuit)?;
    info!(
        "loaded {} ({} junctions, {} branches)",
        args.layout_file.display(),
        circuit.junctions().len(),
        circuit.branches().len()
    );

    let mut solver = CircuitSolver::new();
    for _ in 0..args.ticks {
        solver.solve(&mut circuit, args.dt)?;
    }

    print_report(&circuit, solver.time());

    for pair in args.probe.chunks(2) {
        let [a, b] = pair else { continue };
        let reading = probe(&circuit, a, b)?;
        println!("V({}, {}) = {:.6} V", a, b, reading);
    }

    Ok(())
}

fn print_report(circuit: &Circuit, time: f64) {
    println!("t = {:.6} s", time);
    println!("junctions:");
    for junction in circuit.junctions() {
        let name = junction.label.clone().unwrap_or_else(|| junction.id.to_string());
        println!("  {:<12} {:>14.6} V", name, junction.voltage);
    }
    println!("branches:");
    for branch in circuit.branches() {
        let name = branch.label.clone().unwrap_or_else(|| branch.id.to_string());
        println!(
            "  {:<12} {:<16} {:>14.6} A",
            name,
            branch.kind.type_name(),
            branch.current
        );
    }
}

fn probe(circuit: &Circuit, a: &str, b: &str) -> Result<f64> {
    let connection = |name: &str| {
        circuit
            .find_junction(name)
            .map(|junction| Connection {
                junction,
                voltage_addon: 0.0,
            })
            .ok_or_else(|| CircuitError::UndefinedJunction {
                name: name.to_string(),
                line: 0,
            })
    };
    Ok(circuit.get_voltage_between_connections(&connection(a)?, &connection(b)?))
}
