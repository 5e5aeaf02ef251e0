//! Tempo Measurement
//!
//! Millisecond counters driven by the 1 kHz tick and the FIFO averager
//! that optionally smooths consecutive tap intervals.

pub mod averager;
pub mod timers;

pub use averager::TempoAverager;
pub use timers::MsTimer;
