//! Signal Generation
//!
//! The DDS pipeline: a 32-bit phase accumulator advanced once per sample
//! tick, a waveform plotter mapping the accumulator's top byte to an
//! 8-bit PWM duty, the musical tempo multiplier that derives a second
//! phase-locked accumulator from the base one, and the pluggable random
//! source behind the stepped-random waveform.

pub mod dds;
pub mod multiplier;
pub mod random;
pub mod waveform;

pub use dds::{DdsEngine, SampleEvents};
pub use multiplier::Multiplier;
pub use random::{RandomSource, XorShiftSource};
pub use waveform::{Waveform, WaveformPlotter};
