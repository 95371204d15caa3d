//! Read-only measurement of a circuit's solved state.
//!
//! A [`Probe`] reads a node voltage or a component current; a [`ProbeSet`]
//! writes a group of probes to any [`Write`] sink after each step, either as
//! human-readable lines or as CSV rows. Probes never mutate the circuit.

use std::io::Write;

use crate::circuit::{Circuit, ComponentId, NodeId};
use crate::error::{Result, VoltaicError};

/// What a probe is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTarget {
    Node(NodeId),
    Component(ComponentId),
}

/// Which quantities a probe reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    #[default]
    Voltage,
    Current,
    Both,
}

/// Output layout for a [`ProbeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeFormat {
    /// `t=0.001000s [label] V=5.000000V`, one line per probe
    #[default]
    Standard,
    /// One row per record, a header row written before the first
    Csv,
}

/// A single measurement point.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub target: ProbeTarget,
    pub mode: ProbeMode,
    pub label: String,
}

impl Probe {
    /// Voltage probe on a node.
    pub fn node(node: NodeId) -> Self {
        Self {
            target: ProbeTarget::Node(node),
            mode: ProbeMode::Voltage,
            label: node.to_string(),
        }
    }

    /// Current probe on a component.
    pub fn component(component: ComponentId) -> Self {
        Self {
            target: ProbeTarget::Component(component),
            mode: ProbeMode::Current,
            label: component.to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_mode(mut self, mode: ProbeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Node voltage, or the voltage across a component's terminals.
    pub fn voltage(&self, circuit: &Circuit) -> f64 {
        match self.target {
            ProbeTarget::Node(node) => circuit.node_voltage(node),
            ProbeTarget::Component(id) => circuit
                .component(id)
                .and_then(|c| c.nodes())
                .map_or(0.0, |[n1, n2]| {
                    circuit.node_voltage(n1) - circuit.node_voltage(n2)
                }),
        }
    }

    /// Component current; node probes read 0.
    pub fn current(&self, circuit: &Circuit) -> f64 {
        match self.target {
            ProbeTarget::Node(_) => 0.0,
            ProbeTarget::Component(id) => circuit.component_current(id),
        }
    }

    fn reports_voltage(&self) -> bool {
        matches!(self.mode, ProbeMode::Voltage | ProbeMode::Both)
    }

    fn reports_current(&self) -> bool {
        matches!(self.mode, ProbeMode::Current | ProbeMode::Both)
    }
}

/// A group of probes written together.
#[derive(Debug, Clone, Default)]
pub struct ProbeSet {
    probes: Vec<Probe>,
    format: ProbeFormat,
    header_written: bool,
}

impl ProbeSet {
    pub fn new(format: ProbeFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Add a probe, checking that its target exists in `circuit`.
    pub fn add(&mut self, circuit: &Circuit, probe: Probe) -> Result<()> {
        match probe.target {
            ProbeTarget::Node(node) if circuit.node(node).is_none() => {
                return Err(VoltaicError::NodeNotFound {
                    node: node.to_string(),
                });
            }
            ProbeTarget::Component(id) if circuit.component(id).is_none() => {
                return Err(VoltaicError::ComponentNotFound {
                    component: id.to_string(),
                });
            }
            _ => {}
        }
        self.probes.push(probe);
        Ok(())
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    pub fn format(&self) -> ProbeFormat {
        self.format
    }

    /// Write the current readings of every probe at `time`.
    pub fn record<W: Write>(&mut self, circuit: &Circuit, time: f64, out: &mut W) -> Result<()> {
        match self.format {
            ProbeFormat::Standard => self.write_standard(circuit, time, out)?,
            ProbeFormat::Csv => {
                if !self.header_written {
                    self.write_csv_header(out)?;
                    self.header_written = true;
                }
                self.write_csv_row(circuit, time, out)?;
            }
        }
        Ok(())
    }

    fn write_standard<W: Write>(
        &self,
        circuit: &Circuit,
        time: f64,
        out: &mut W,
    ) -> std::io::Result<()> {
        for probe in &self.probes {
            write!(out, "t={time:.6}s")?;
            if !probe.label.is_empty() {
                write!(out, " [{}]", probe.label)?;
            }
            if probe.reports_voltage() {
                write!(out, " V={:.6}V", probe.voltage(circuit))?;
            }
            if probe.reports_current() {
                write!(out, " I={:.6}A", probe.current(circuit))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_csv_header<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "time")?;
        for probe in &self.probes {
            if probe.reports_voltage() {
                write!(out, ",{}_V", probe.label)?;
            }
            if probe.reports_current() {
                write!(out, ",{}_I", probe.label)?;
            }
        }
        writeln!(out)
    }

    fn write_csv_row<W: Write>(
        &self,
        circuit: &Circuit,
        time: f64,
        out: &mut W,
    ) -> std::io::Result<()> {
        write!(out, "{time}")?;
        for probe in &self.probes {
            if probe.reports_voltage() {
                write!(out, ",{}", probe.voltage(circuit))?;
            }
            if probe.reports_current() {
                write!(out, ",{}", probe.current(circuit))?;
            }
        }
        writeln!(out)
    }
}
