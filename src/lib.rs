//! Tap-tempo LFO / clock generator core
//!
//! A sample-accurate model of a musician's tap-tempo low-frequency
//! oscillator and clock generator. The interval between two taps on a
//! pedal switch (or between edges of an external clock) becomes the period
//! of a multi-waveform control signal and a pair of synchronization
//! pulses, generated by 32-bit direct digital synthesis.
//!
//! # Features
//! - DDS phase accumulation at the PWM carrier rate (8 MHz / 256 = 31.25 kHz)
//! - Tap and external-clock tempo measurement, 0.1 Hz - 20 Hz band
//! - Optional FIFO averaging of recent tap intervals
//! - Six waveforms (sine, ramps, triangle, square, stepped random)
//! - Ten musical tempo multipliers phase-locked on a 12-cycle schedule
//! - Base-rate and double-rate sync outputs
//! - Switch debouncing, rotary-encoder mode selection, long-press resets
//! - Deterministic co-simulation of the three interrupt ranks for testing
//!
//! # Quick start
//! ```no_run
//! use tap_tempo::{Simulator, SwitchPins};
//!
//! let mut sim = Simulator::new();
//! // Two taps 500 ms apart set a 500 ms base tempo.
//! sim.press(SwitchPins::TAP);
//! sim.run_ms(20);
//! sim.release(SwitchPins::TAP);
//! sim.run_ms(480);
//! sim.press(SwitchPins::TAP);
//! sim.run_ms(20);
//! sim.release(SwitchPins::TAP);
//! sim.run_ms(2000);
//! assert_eq!(sim.system().base_tempo_ms(), 500);
//! ```
//!
//! For concurrent use the owned [`System`] can be wrapped in a
//! [`SharedSystem`], which hands out one cloneable handle per interrupt
//! rank; every handle method is a single brief lock, the host-side
//! equivalent of the firmware's interrupt-masking critical section.

#![warn(missing_docs)]

// Domain modules
pub mod constants;
pub mod input;
pub mod signal;
pub mod sim;
pub mod system;
pub mod tables;
pub mod tempo;

/// Error types for tap-tempo core operations
///
/// The signal path itself never fails at runtime: out-of-band tempos and
/// adjustments are silently rejected and the current waveform keeps
/// playing. The only fallible operation is construction with a custom
/// clock configuration.
#[derive(thiserror::Error, Debug)]
pub enum TapTempoError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Result type for tap-tempo core operations
pub type Result<T> = std::result::Result<T, TapTempoError>;

// Public API exports
pub use constants::ClockConfig;
pub use input::debounce::{Debouncer, SwitchPins};
pub use input::events::{Edge, InputEvent, InputSource};
pub use input::mode::{ModeSelect, SelectionMode};
pub use signal::dds::{DdsEngine, SampleEvents};
pub use signal::multiplier::Multiplier;
pub use signal::random::{RandomSource, XorShiftSource};
pub use signal::waveform::{Waveform, WaveformPlotter};
pub use sim::{Simulator, SyncProbe};
pub use system::outputs::OutputLines;
pub use system::shared::{PinChangeHandle, SampleClockHandle, SharedSystem, TickClockHandle};
pub use system::{StateFlags, System};
pub use tempo::averager::TempoAverager;
pub use tempo::timers::MsTimer;
