//! Independent voltage sources and their waveforms.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::circuit::NodeId;
use crate::error::{Result, VoltaicError};
use crate::solver::SimulationState;

/// Time-dependent voltage shape of a [`VoltageSource`].
#[derive(Clone)]
pub enum Waveform {
    /// Fixed voltage
    Constant(f64),
    /// amplitude * sin(2π * frequency * t + phase), phase in radians
    Sinusoidal {
        amplitude: f64,
        frequency: f64,
        phase: f64,
    },
    /// Caller-supplied function of time
    Function(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl Waveform {
    pub fn sine(amplitude: f64, frequency: f64, phase: f64) -> Self {
        Self::Sinusoidal {
            amplitude,
            frequency,
            phase,
        }
    }

    pub fn function(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::Function(Arc::new(f))
    }

    /// Evaluate the waveform at `time` seconds.
    pub fn voltage(&self, time: f64) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Sinusoidal {
                amplitude,
                frequency,
                phase,
            } => amplitude * (2.0 * PI * frequency * time + phase).sin(),
            Self::Function(f) => f(time),
        }
    }
}

impl fmt::Debug for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::Sinusoidal {
                amplitude,
                frequency,
                phase,
            } => f
                .debug_struct("Sinusoidal")
                .field("amplitude", amplitude)
                .field("frequency", frequency)
                .field("phase", phase)
                .finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// A voltage source component.
///
/// Voltage sources require an extra row/column in the MNA matrix for the
/// branch current. The source enforces: V+ - V- = V_source(t)
#[derive(Debug, Clone)]
pub struct VoltageSource {
    pub nodes: Option<[NodeId; 2]>, // [positive, negative]
    waveform: Waveform,
    /// Solved branch current, positive out of the positive terminal
    current: f64,
}

impl VoltageSource {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            nodes: None,
            waveform,
            current: 0.0,
        }
    }

    /// Create a constant (DC) source.
    pub fn dc(voltage: f64) -> Self {
        Self::new(Waveform::Constant(voltage))
    }

    /// Create a sinusoidal source. `phase` is in radians.
    pub fn ac(amplitude: f64, frequency: f64, phase: f64) -> Result<Self> {
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(VoltaicError::invalid_component(
                "voltage source",
                format!("frequency must be finite and non-negative, got {frequency}"),
            ));
        }
        if !amplitude.is_finite() || !phase.is_finite() {
            return Err(VoltaicError::invalid_component(
                "voltage source",
                "amplitude and phase must be finite",
            ));
        }
        Ok(Self::new(Waveform::sine(amplitude, frequency, phase)))
    }

    /// Create a source driven by an arbitrary function of time.
    pub fn custom(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::new(Waveform::function(f))
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    /// Get the source voltage at `time`.
    pub fn voltage(&self, time: f64) -> f64 {
        self.waveform.voltage(time)
    }

    /// Branch current from the last solve, positive when flowing out of the
    /// positive terminal into the external circuit.
    pub fn current(&self) -> f64 {
        self.current
    }

    pub(crate) fn set_current(&mut self, current: f64) {
        self.current = current;
    }

    /// Stamp into the branch row reserved in `state.branch`.
    pub fn stamp(&self, state: &mut SimulationState<'_>) {
        let (Some([n1, n2]), Some(br)) = (self.nodes, state.branch) else {
            return;
        };
        let v = self.voltage(state.time);
        state
            .matrix
            .stamp_voltage_source(n1.matrix_index(), n2.matrix_index(), br, v);
    }
}
