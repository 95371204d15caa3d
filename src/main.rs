//! Voltaic - linear circuit transient simulator
//!
//! Runs one of the built-in demonstration circuits and prints probe readings.
//!
//! # Usage
//!
//! ```bash
//! voltaic rc --duration 5 --dt 0.01 --every 10
//! voltaic rlc --format csv > rlc.csv
//! ```

use std::io::{self, Write};

use clap::{Parser, ValueEnum};
use voltaic_core::{
    circuit::validate_circuit,
    components::{Capacitor, Inductor, Resistor, VoltageSource},
    error::Result,
    probe::{Probe, ProbeFormat, ProbeMode, ProbeSet},
    Circuit, Simulator,
};

/// Built-in demonstration circuits
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Demo {
    /// 10 V across two 1 kΩ resistors
    Divider,
    /// 5 V -> 1 kΩ -> 1 mF to ground (τ = 1 s)
    Rc,
    /// 10 V -> 100 Ω -> 100 mH to ground (τ = 1 ms)
    Rl,
    /// 10 V -> 100 Ω -> (100 mH || 10 µF) to ground
    Rlc,
    /// 10 V 50 Hz sine -> 1 kΩ -> 10 µF to ground
    Ac,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Standard,
    Csv,
}

/// Linear circuit transient simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Demonstration circuit to simulate
    #[arg(value_enum)]
    demo: Demo,

    /// Simulated duration in seconds
    #[arg(short, long, default_value_t = 0.01)]
    duration: f64,

    /// Timestep in seconds
    #[arg(long, default_value_t = 1e-5)]
    dt: f64,

    /// Print every N steps
    #[arg(short, long, default_value_t = 100)]
    every: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Standard)]
    format: Format,

    /// Start from the DC operating point instead of a discharged circuit
    #[arg(long)]
    operating_point: bool,
}

/// Build a demo circuit and the probes worth watching on it.
fn build(demo: Demo, format: ProbeFormat) -> Result<(Circuit, ProbeSet)> {
    let mut circuit = Circuit::new();
    let gnd = circuit.create_node();
    let n1 = circuit.create_node();
    let n2 = circuit.create_node();

    let source = match demo {
        Demo::Ac => VoltageSource::ac(10.0, 50.0, 0.0)?,
        Demo::Rc => VoltageSource::dc(5.0),
        _ => VoltageSource::dc(10.0),
    };
    let vs = circuit.add_component(source, n1, gnd)?;

    let r = match demo {
        Demo::Divider | Demo::Rc | Demo::Ac => circuit.add_component(Resistor::new(1e3), n1, n2)?,
        Demo::Rl | Demo::Rlc => circuit.add_component(Resistor::new(100.0), n1, n2)?,
    };

    match demo {
        Demo::Divider => {
            circuit.add_component(Resistor::new(1e3), n2, gnd)?;
        }
        Demo::Rc => {
            circuit.add_component(Capacitor::new(1e-3), n2, gnd)?;
        }
        Demo::Rl => {
            circuit.add_component(Inductor::new(0.1), n2, gnd)?;
        }
        Demo::Rlc => {
            circuit.add_component(Inductor::new(0.1), n2, gnd)?;
            circuit.add_component(Capacitor::new(1e-5), n2, gnd)?;
        }
        Demo::Ac => {
            circuit.add_component(Capacitor::new(1e-5), n2, gnd)?;
        }
    }

    let mut probes = ProbeSet::new(format);
    probes.add(&circuit, Probe::node(n1).with_label("V_in"))?;
    probes.add(&circuit, Probe::node(n2).with_label("V_out"))?;
    probes.add(&circuit, Probe::component(r).with_label("I_R"))?;
    probes.add(
        &circuit,
        Probe::component(vs)
            .with_label("I_src")
            .with_mode(ProbeMode::Current),
    )?;

    Ok((circuit, probes))
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let format = match args.format {
        Format::Standard => ProbeFormat::Standard,
        Format::Csv => ProbeFormat::Csv,
    };
    let (circuit, mut probes) = build(args.demo, format)?;
    validate_circuit(&circuit)?;

    let mut simulator = Simulator::new(circuit);
    if args.operating_point {
        simulator.operating_point()?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let every = args.every.max(1);
    let mut step = 0usize;
    simulator.simulate_with(args.duration, args.dt, |circuit, time| {
        if step % every == 0 {
            probes.record(circuit, time, &mut out)?;
        }
        step += 1;
        Ok(())
    })?;
    out.flush()?;

    Ok(())
}
