//! Timing Constants and Clock Configuration
//!
//! Single source of truth for every rate, window and threshold in the
//! core. All other modules take their numbers from here (or from a
//! [`ClockConfig`] derived from here), never from local literals.

use serde::{Deserialize, Serialize};

use crate::{Result, TapTempoError};

/// CPU clock frequency in Hz (internal oscillator, no clock division)
pub const CPU_FREQ_HZ: u32 = 8_000_000;

/// Waveform table resolution; one full table sweep is one LFO cycle
pub const TABLE_SIZE: u32 = 256;

/// Sample (PWM carrier) rate in Hz: one sample per table-sized timer
/// overflow, 8 MHz / 256 = 31.25 kHz
pub const SAMPLE_RATE_HZ: u32 = CPU_FREQ_HZ / TABLE_SIZE;

/// Housekeeping tick rate in Hz (switch sampling, ms counters)
pub const TICK_RATE_HZ: u32 = 1_000;

/// Milliseconds per second, used by the tempo-to-frequency conversion
pub const MS_PER_SECOND: u32 = 1_000;

/// Number of 1 ms port snapshots a switch level must hold before the
/// debouncer reports an edge
pub const DEBOUNCE_WINDOW: usize = 10;

/// Capacity of the tap-interval averaging ring
pub const AVG_CAPACITY: usize = 10;

/// Shortest accepted tempo period in ms (20 Hz)
pub const MIN_TEMPO_MS: u16 = 50;

/// Longest accepted tempo period in ms (0.1 Hz); tempo counts beyond this
/// are treated as an abandoned tap and discarded
pub const MAX_TEMPO_MS: u16 = 10_000;

/// Power-on tempo period in ms (1 Hz)
pub const DEFAULT_TEMPO_MS: u16 = 1_000;

/// New measurements within this many ms of the current tempo are ignored;
/// eliminates syncing jitter when chained to another tap-tempo chip
pub const TEMPO_HYSTERESIS_MS: u16 = 2;

/// How long the mode switch must be held before the release is taken as
/// "reset the current mode" instead of a mode change
pub const RESET_HOLD_MS: u16 = 2_000;

/// Encoder ticks closer together than this count as continuous input
pub const FAST_ENCODER_MS: u16 = 100;

/// Encoder idle gap after which the adaptive speed step decays back to 1
pub const ENCODER_IDLE_MS: u16 = 1_000;

/// Number of continuous encoder ticks per speed-step increase
pub const CONSECUTIVE_PER_STEP: u16 = 10;

/// Amount added to the speed step at each increase
pub const STEP_INCREMENT: i16 = 10;

/// Base-cycle count between the points where all tempo multipliers align
pub const ALIGNMENT_CYCLE: u8 = 12;

/// Number of discrete levels of the random waveform
pub const RANDOM_STEP_COUNT: u8 = 8;

/// Duty distance between adjacent random-waveform levels
pub const RANDOM_STEP_SIZE: u8 = 32;

/// Clock configuration for a core instance
///
/// Bundles the CPU frequency, the waveform table size and the
/// housekeeping tick rate; the sample rate is derived, never stored.
/// The defaults describe the reference hardware (8 MHz, 256-entry table,
/// 1 kHz tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// CPU clock frequency in Hz
    pub cpu_hz: u32,
    /// Waveform table resolution
    pub table_size: u32,
    /// Housekeeping tick rate in Hz
    pub tick_hz: u32,
}

impl ClockConfig {
    /// Create a validated clock configuration.
    ///
    /// The table size must be 256 (the phase accumulator's top byte is
    /// the table index), the CPU frequency must be a non-zero multiple of
    /// the table size, and the tick rate must be non-zero and no faster
    /// than the derived sample rate.
    pub fn new(cpu_hz: u32, table_size: u32, tick_hz: u32) -> Result<Self> {
        if table_size != TABLE_SIZE {
            return Err(TapTempoError::ConfigError(format!(
                "table size must be {TABLE_SIZE}, got {table_size}"
            )));
        }
        if cpu_hz == 0 || cpu_hz % table_size != 0 {
            return Err(TapTempoError::ConfigError(format!(
                "CPU frequency {cpu_hz} is not a non-zero multiple of {table_size}"
            )));
        }
        let config = ClockConfig {
            cpu_hz,
            table_size,
            tick_hz,
        };
        if tick_hz == 0 || tick_hz > config.sample_rate() {
            return Err(TapTempoError::ConfigError(format!(
                "tick rate {tick_hz} must be in 1..={}",
                config.sample_rate()
            )));
        }
        Ok(config)
    }

    /// Derived sample (PWM carrier) rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.cpu_hz / self.table_size
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            cpu_hz: CPU_FREQ_HZ,
            table_size: TABLE_SIZE,
            tick_hz: TICK_RATE_HZ,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_rates() {
        let config = ClockConfig::default();
        assert_eq!(config.sample_rate(), 31_250);
        assert_eq!(config.tick_hz, 1_000);
    }

    #[test]
    fn test_new_accepts_reference_hardware() {
        let config = ClockConfig::new(8_000_000, 256, 1_000).unwrap();
        assert_eq!(config, ClockConfig::default());
    }

    #[test]
    fn test_new_rejects_odd_table_size() {
        assert!(ClockConfig::new(8_000_000, 128, 1_000).is_err());
    }

    #[test]
    fn test_new_rejects_tick_faster_than_sample_rate() {
        assert!(ClockConfig::new(8_000_000, 256, 62_500).is_err());
        assert!(ClockConfig::new(8_000_000, 256, 0).is_err());
    }

    #[test]
    fn test_tempo_band_is_20hz_to_tenth_hz() {
        assert_eq!(MS_PER_SECOND / MIN_TEMPO_MS as u32, 20);
        assert_eq!(MAX_TEMPO_MS as u32, 10 * MS_PER_SECOND);
    }
}
