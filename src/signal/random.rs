//! Pluggable Random Source
//!
//! The stepped-random waveform only needs one fresh byte per base cycle,
//! so the source is a minimal trait that any generator can implement.
//! The default is a xorshift generator, reseeded once from the first
//! tap-measured period so the sequence differs between power cycles.

use rand_core::{RngCore, SeedableRng};
use rand_xorshift::XorShiftRng;

/// An 8-bit random source for the random waveform
pub trait RandomSource: Send {
    /// Produce the next random byte.
    fn next_byte(&mut self) -> u8;

    /// Restart the sequence from a new seed.
    fn reseed(&mut self, seed: u32);
}

/// Default xorshift-backed random source
pub struct XorShiftSource {
    rng: XorShiftRng,
}

impl XorShiftSource {
    /// Create a source with the fixed power-on seed.
    pub fn new() -> Self {
        XorShiftSource {
            rng: XorShiftRng::seed_from_u64(0),
        }
    }

    /// Create a source from an explicit seed.
    pub fn with_seed(seed: u32) -> Self {
        XorShiftSource {
            rng: XorShiftRng::seed_from_u64(seed as u64),
        }
    }
}

impl RandomSource for XorShiftSource {
    fn next_byte(&mut self) -> u8 {
        (self.rng.next_u32() >> 24) as u8
    }

    fn reseed(&mut self, seed: u32) {
        self.rng = XorShiftRng::seed_from_u64(seed as u64);
    }
}

impl Default for XorShiftSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = XorShiftSource::with_seed(500);
        let mut b = XorShiftSource::with_seed(500);
        for _ in 0..32 {
            assert_eq!(a.next_byte(), b.next_byte());
        }
    }

    #[test]
    fn test_reseed_restarts_the_sequence() {
        let mut source = XorShiftSource::new();
        let first: Vec<u8> = (0..16).map(|_| source.next_byte()).collect();
        source.reseed(0);
        let replay: Vec<u8> = (0..16).map(|_| source.next_byte()).collect();
        assert_eq!(first, replay);
    }

    #[test]
    fn test_output_varies() {
        let mut source = XorShiftSource::with_seed(123);
        let bytes: Vec<u8> = (0..64).map(|_| source.next_byte()).collect();
        assert!(bytes.windows(2).any(|w| w[0] != w[1]));
    }
}
