//! Waveform Plotter
//!
//! Maps a table index in [0, 255] to an 8-bit PWM duty for the selected
//! waveform. Every waveform starts at its minimum on index 0 (the sine
//! table is realigned for this), so switching waveforms or resetting the
//! phase never produces a level jump.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use serde::{Deserialize, Serialize};

use crate::constants::{RANDOM_STEP_COUNT, RANDOM_STEP_SIZE};
use crate::signal::random::RandomSource;
use crate::tables::SINE_TABLE;

/// Selectable LFO waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
pub enum Waveform {
    /// Table-driven sine, minimum at index 0
    Sine = 0,
    /// Rising sawtooth
    RampUp,
    /// Falling sawtooth
    RampDown,
    /// Symmetric triangle
    Triangle,
    /// 50% square, low half first
    Square,
    /// Stepped random level, held for one full cycle
    Random,
}

impl Waveform {
    /// Number of selectable waveforms
    pub const COUNT: usize = 6;

    /// Move the selection by `delta` steps, wrapping at either end.
    pub fn scrolled(self, delta: i8) -> Waveform {
        let index = (self as i16 + delta as i16).rem_euclid(Self::COUNT as i16);
        Waveform::from_i16(index).unwrap_or(self)
    }

    /// Quantize an 8-bit analog selection level into a waveform.
    pub fn from_level(value: u8) -> Waveform {
        let index = (value as usize * Self::COUNT) / 256;
        Waveform::from_usize(index.min(Self::COUNT - 1)).unwrap_or(Waveform::Sine)
    }
}

impl Default for Waveform {
    fn default() -> Self {
        Waveform::Sine
    }
}

/// Plots one point of the selected waveform per sample tick
///
/// Holds the waveform selection and the latched level for the random
/// waveform; the level is refreshed once per completed base cycle.
#[derive(Debug, Clone)]
pub struct WaveformPlotter {
    waveform: Waveform,
    random_level: u8,
}

impl WaveformPlotter {
    /// Create a plotter with the default sine waveform.
    pub fn new() -> Self {
        WaveformPlotter {
            waveform: Waveform::Sine,
            random_level: 0,
        }
    }

    /// Currently selected waveform
    #[inline]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Map a table index to a PWM duty.
    #[inline]
    pub fn plot(&self, index: u8) -> u8 {
        match self.waveform {
            Waveform::Sine => SINE_TABLE[index as usize],
            Waveform::RampUp => index,
            Waveform::RampDown => 0xff - index,
            Waveform::Triangle => {
                if index < 0x80 {
                    index * 2
                } else {
                    0xff - (index - 0x80) * 2
                }
            }
            Waveform::Square => {
                if index < 0x80 {
                    0x00
                } else {
                    0xff
                }
            }
            Waveform::Random => self.random_level,
        }
    }

    /// Scroll the waveform selection, wrapping at either end.
    pub fn scroll(&mut self, delta: i8) {
        self.waveform = self.waveform.scrolled(delta);
    }

    /// Select the waveform from an 8-bit analog level.
    pub fn set_from_level(&mut self, value: u8) {
        self.waveform = Waveform::from_level(value);
    }

    /// Select a waveform directly.
    pub fn select(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Reset the selection to the default sine.
    pub fn reset(&mut self) {
        self.waveform = Waveform::Sine;
    }

    /// Latch a fresh random level, quantized to 8 steps of 32.
    pub fn refresh_random(&mut self, source: &mut dyn RandomSource) {
        self.random_level = (source.next_byte() % RANDOM_STEP_COUNT) * RANDOM_STEP_SIZE;
    }

    /// Currently latched random level
    #[inline]
    pub fn random_level(&self) -> u8 {
        self.random_level
    }
}

impl Default for WaveformPlotter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::random::XorShiftSource;

    #[test]
    fn test_scroll_wraps_both_directions() {
        assert_eq!(Waveform::Sine.scrolled(-1), Waveform::Random);
        assert_eq!(Waveform::Random.scrolled(1), Waveform::Sine);
        assert_eq!(Waveform::Triangle.scrolled(1), Waveform::Square);
    }

    #[test]
    fn test_from_level_spans_the_range() {
        assert_eq!(Waveform::from_level(0), Waveform::Sine);
        assert_eq!(Waveform::from_level(255), Waveform::Random);
        assert_eq!(Waveform::from_level(128), Waveform::Triangle);
    }

    #[test]
    fn test_all_waveforms_start_at_minimum() {
        let mut plotter = WaveformPlotter::new();
        for index in 0..Waveform::COUNT - 1 {
            plotter.select(Waveform::from_usize(index).unwrap());
            assert_eq!(plotter.plot(0), 0, "{:?} does not start low", plotter.waveform());
        }
    }

    #[test]
    fn test_ramp_shapes() {
        let mut plotter = WaveformPlotter::new();
        plotter.select(Waveform::RampUp);
        assert_eq!(plotter.plot(100), 100);
        plotter.select(Waveform::RampDown);
        assert_eq!(plotter.plot(100), 155);
    }

    #[test]
    fn test_triangle_rises_then_falls() {
        let mut plotter = WaveformPlotter::new();
        plotter.select(Waveform::Triangle);
        assert_eq!(plotter.plot(0), 0);
        assert_eq!(plotter.plot(64), 128);
        assert_eq!(plotter.plot(127), 254);
        assert_eq!(plotter.plot(128), 255);
        assert_eq!(plotter.plot(192), 127);
        assert_eq!(plotter.plot(255), 1);
    }

    #[test]
    fn test_square_halves() {
        let mut plotter = WaveformPlotter::new();
        plotter.select(Waveform::Square);
        assert_eq!(plotter.plot(127), 0x00);
        assert_eq!(plotter.plot(128), 0xff);
    }

    #[test]
    fn test_random_levels_are_quantized() {
        let mut plotter = WaveformPlotter::new();
        plotter.select(Waveform::Random);
        let mut source = XorShiftSource::with_seed(7);
        for _ in 0..64 {
            plotter.refresh_random(&mut source);
            let level = plotter.plot(42);
            assert_eq!(level % RANDOM_STEP_SIZE, 0);
            assert!((level as u16) < RANDOM_STEP_COUNT as u16 * RANDOM_STEP_SIZE as u16);
        }
    }

    #[test]
    fn test_random_holds_between_refreshes() {
        let mut plotter = WaveformPlotter::new();
        plotter.select(Waveform::Random);
        let mut source = XorShiftSource::with_seed(7);
        plotter.refresh_random(&mut source);
        let level = plotter.plot(0);
        assert_eq!(plotter.plot(128), level);
        assert_eq!(plotter.plot(255), level);
    }
}
