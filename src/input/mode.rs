//! Mode / Selection State Machine
//!
//! A short press of the mode switch cycles what the rotary encoder
//! edits: speed, waveform or multiplier. In speed mode the encoder step
//! adapts to how fast the user is turning; quick continuous movement
//! grows the step so large tempo changes don't take dozens of detents,
//! and a second of idleness drops back to fine adjustment.

use serde::{Deserialize, Serialize};

use crate::constants::{CONSECUTIVE_PER_STEP, ENCODER_IDLE_MS, FAST_ENCODER_MS, STEP_INCREMENT};
use crate::tempo::timers::MsTimer;

/// What the rotary encoder currently edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Encoder ticks nudge the tempo in ms
    Speed,
    /// Encoder ticks scroll the waveform
    Waveform,
    /// Encoder ticks scroll the tempo multiplier
    Multiplier,
}

impl SelectionMode {
    /// The mode a short press switches to.
    pub fn next(self) -> SelectionMode {
        match self {
            SelectionMode::Speed => SelectionMode::Waveform,
            SelectionMode::Waveform => SelectionMode::Multiplier,
            SelectionMode::Multiplier => SelectionMode::Speed,
        }
    }
}

/// Selection-mode cycling plus the adaptive speed-adjust step
#[derive(Debug, Clone)]
pub struct ModeSelect {
    mode: SelectionMode,
    speed_step: i16,
    continuous_adjustments: u16,
    idle: MsTimer,
}

impl ModeSelect {
    /// Create the FSM in speed mode with a fine adjustment step.
    pub fn new() -> Self {
        ModeSelect {
            mode: SelectionMode::Speed,
            speed_step: 1,
            continuous_adjustments: 0,
            idle: MsTimer::new(),
        }
    }

    /// Current selection mode
    #[inline]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Current adaptive speed step
    #[inline]
    pub fn speed_step(&self) -> i16 {
        self.speed_step
    }

    /// Advance to the next mode and return it.
    pub fn advance(&mut self) -> SelectionMode {
        self.mode = self.mode.next();
        self.mode
    }

    /// Keep the encoder idle counter topped up (1 kHz tick).
    pub fn tick_ms(&mut self) {
        self.idle.tick_saturating();
    }

    /// Convert an encoder tick into a ms adjustment for speed mode.
    ///
    /// Ticks closer than [`FAST_ENCODER_MS`] count as continuous input;
    /// every [`CONSECUTIVE_PER_STEP`] of those grow the step by
    /// [`STEP_INCREMENT`]. A gap beyond [`ENCODER_IDLE_MS`] resets the
    /// streak. The returned value is `step * -delta`: the sign flip makes
    /// clockwise turns shrink the period, i.e. speed the LFO up.
    pub fn speed_delta(&mut self, delta: i8) -> i16 {
        if self.idle.count() < FAST_ENCODER_MS {
            self.continuous_adjustments = self.continuous_adjustments.wrapping_add(1);
            if self.continuous_adjustments % CONSECUTIVE_PER_STEP == 0 {
                self.speed_step += STEP_INCREMENT;
            }
        } else if self.idle.count() > ENCODER_IDLE_MS {
            self.speed_step = 1;
            self.continuous_adjustments = 0;
        }
        self.idle.zero();

        self.speed_step * -(delta as i16)
    }
}

impl Default for ModeSelect {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_for(select: &mut ModeSelect, ms: u16) {
        for _ in 0..ms {
            select.tick_ms();
        }
    }

    #[test]
    fn test_mode_cycle() {
        let mut select = ModeSelect::new();
        assert_eq!(select.mode(), SelectionMode::Speed);
        assert_eq!(select.advance(), SelectionMode::Waveform);
        assert_eq!(select.advance(), SelectionMode::Multiplier);
        assert_eq!(select.advance(), SelectionMode::Speed);
    }

    #[test]
    fn test_step_grows_every_ten_continuous_ticks() {
        let mut select = ModeSelect::new();
        for tick in 1..=30u16 {
            idle_for(&mut select, 50);
            let adjustment = select.speed_delta(1);
            let expected_step = match tick {
                1..=9 => 1,
                10..=19 => 11,
                20..=29 => 21,
                _ => 31,
            };
            assert_eq!(select.speed_step(), expected_step, "at tick {tick}");
            assert_eq!(adjustment, -expected_step);
        }
    }

    #[test]
    fn test_idle_gap_resets_the_step() {
        let mut select = ModeSelect::new();
        for _ in 0..12 {
            idle_for(&mut select, 50);
            select.speed_delta(1);
        }
        assert_eq!(select.speed_step(), 11);

        idle_for(&mut select, 1_500);
        assert_eq!(select.speed_delta(1), -1);
        assert_eq!(select.speed_step(), 1);
    }

    #[test]
    fn test_medium_gap_neither_grows_nor_resets() {
        let mut select = ModeSelect::new();
        for _ in 0..12 {
            idle_for(&mut select, 50);
            select.speed_delta(1);
        }
        assert_eq!(select.speed_step(), 11);

        // 500 ms is past the continuous threshold but short of idle decay.
        idle_for(&mut select, 500);
        assert_eq!(select.speed_delta(1), -11);
        assert_eq!(select.speed_step(), 11);
    }

    #[test]
    fn test_sign_flip_makes_clockwise_faster() {
        let mut select = ModeSelect::new();
        idle_for(&mut select, 2_000);
        // Clockwise (+1) must shrink the period.
        assert!(select.speed_delta(1) < 0);
        idle_for(&mut select, 2_000);
        assert!(select.speed_delta(-1) > 0);
    }
}
