//! Musical Tempo Multipliers
//!
//! Ten note divisions relative to the tapped quarter note. Each division
//! carries an integer duty ratio and an alignment stride: the number of
//! base cycles between the points where the derived waveform restarts
//! exactly on the base waveform's downbeat. All ten divisions meet every
//! twelve base cycles.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use serde::{Deserialize, Serialize};

/// Musical division applied to the base tempo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
pub enum Multiplier {
    /// Whole note, 1/4 of the base rate
    Whole = 0,
    /// Dotted half note, 1/3 of the base rate
    DottedHalf,
    /// Half note, 1/2 of the base rate
    Half,
    /// Dotted quarter note, 2/3 of the base rate
    DottedQuarter,
    /// Quarter note, the base rate itself
    Quarter,
    /// Dotted eighth note, 4/3 of the base rate
    DottedEighth,
    /// Eighth note, twice the base rate
    Eighth,
    /// Dotted sixteenth note, 8/3 of the base rate
    DottedSixteenth,
    /// Triplet, three times the base rate
    Triplet,
    /// Sixteenth note, four times the base rate
    Sixteenth,
}

impl Multiplier {
    /// Number of selectable divisions
    pub const COUNT: usize = 10;

    /// Duty ratio as (numerator, denominator)
    #[inline]
    pub fn ratio(self) -> (u32, u32) {
        match self {
            Multiplier::Whole => (1, 4),
            Multiplier::DottedHalf => (1, 3),
            Multiplier::Half => (1, 2),
            Multiplier::DottedQuarter => (2, 3),
            Multiplier::Quarter => (1, 1),
            Multiplier::DottedEighth => (4, 3),
            Multiplier::Eighth => (2, 1),
            Multiplier::DottedSixteenth => (8, 3),
            Multiplier::Triplet => (3, 1),
            Multiplier::Sixteenth => (4, 1),
        }
    }

    /// Base cycles between guaranteed downbeat alignments
    #[inline]
    pub fn alignment_stride(self) -> u8 {
        match self {
            Multiplier::Whole => 4,
            Multiplier::DottedHalf => 3,
            Multiplier::Half => 2,
            Multiplier::DottedQuarter => 3,
            Multiplier::Quarter => 1,
            Multiplier::DottedEighth => 3,
            Multiplier::Eighth => 1,
            Multiplier::DottedSixteenth => 3,
            Multiplier::Triplet => 2,
            Multiplier::Sixteenth => 1,
        }
    }

    /// Move the selection by `delta` steps, stopping at either end.
    ///
    /// No wrap-around: together with the long-press reset this makes the
    /// division easier to dial in without a visual indicator.
    pub fn scrolled(self, delta: i8) -> Multiplier {
        let index = (self as i16 + delta as i16).clamp(0, Self::COUNT as i16 - 1);
        Multiplier::from_i16(index).unwrap_or(self)
    }

    /// Quantize an 8-bit analog selection level into a division.
    pub fn from_level(value: u8) -> Multiplier {
        let index = (value as usize * Self::COUNT) / 256;
        Multiplier::from_usize(index.min(Self::COUNT - 1)).unwrap_or(Multiplier::Quarter)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Multiplier::Quarter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_is_unity() {
        assert_eq!(Multiplier::Quarter.ratio(), (1, 1));
        assert_eq!(Multiplier::Quarter.alignment_stride(), 1);
        assert_eq!(Multiplier::default(), Multiplier::Quarter);
    }

    #[test]
    fn test_strides_divide_the_alignment_cycle() {
        use crate::constants::ALIGNMENT_CYCLE;
        for index in 0..Multiplier::COUNT {
            let multiplier = Multiplier::from_usize(index).unwrap();
            assert_eq!(
                ALIGNMENT_CYCLE % multiplier.alignment_stride(),
                0,
                "{multiplier:?} stride does not divide the alignment cycle"
            );
        }
    }

    #[test]
    fn test_scroll_clamps_at_both_ends() {
        assert_eq!(Multiplier::Whole.scrolled(-1), Multiplier::Whole);
        assert_eq!(Multiplier::Sixteenth.scrolled(1), Multiplier::Sixteenth);
        assert_eq!(Multiplier::Quarter.scrolled(1), Multiplier::DottedEighth);
        assert_eq!(Multiplier::Quarter.scrolled(-1), Multiplier::DottedQuarter);
    }

    #[test]
    fn test_from_level_spans_the_range() {
        assert_eq!(Multiplier::from_level(0), Multiplier::Whole);
        assert_eq!(Multiplier::from_level(128), Multiplier::DottedEighth);
        assert_eq!(Multiplier::from_level(255), Multiplier::Sixteenth);
    }
}
