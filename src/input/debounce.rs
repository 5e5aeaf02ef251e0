//! Switch Debouncer
//!
//! Debounces every switch on the input port simultaneously. The 1 kHz
//! tick stores raw port snapshots in a ten-slot ring; the main loop then
//! reduces the ring into accumulated states and compares them with the
//! previous reduction to find edges.
//!
//! The two reductions are deliberately asymmetric. A pin counts as
//! closed (switches are active-low) only when it read low in every slot
//! of the window, and as open only when it read high in every slot; a
//! single bounce in the window blocks both verdicts. A pin is therefore
//! guaranteed stable after ten consecutive identical samples, i.e. 10 ms
//! of agreement.
//!
//! Edges are one-shot: each [`Debouncer::compute_edges`] call replaces
//! the previous call's edge masks.

use bitflags::bitflags;

use crate::constants::DEBOUNCE_WINDOW;

bitflags! {
    /// Debounced switch lines on the input port (active-low)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SwitchPins: u8 {
        /// Tap-tempo footswitch
        const TAP = 1 << 0;
        /// Single-sync tap switch (phase realignment)
        const TAP_ALIGN = 1 << 2;
        /// Mode / reset switch
        const MODE = 1 << 3;
    }
}

/// Port-wide switch debouncer
#[derive(Debug, Clone)]
pub struct Debouncer {
    samples: [u8; DEBOUNCE_WINDOW],
    sample_index: usize,
    /// OR-reduced window: a clear bit means "low the whole window"
    closed_state: u8,
    /// AND-reduced window: a set bit means "high the whole window"
    open_state: u8,
    closed_changed: u8,
    open_changed: u8,
}

impl Debouncer {
    /// Create a debouncer in the all-switches-open state.
    pub fn new() -> Self {
        Debouncer {
            samples: [0xff; DEBOUNCE_WINDOW],
            sample_index: 0,
            closed_state: 0xff,
            open_state: 0xff,
            closed_changed: 0x00,
            open_changed: 0x00,
        }
    }

    /// Store one raw port snapshot (called from the 1 kHz tick).
    pub fn record_sample(&mut self, port: u8) {
        self.samples[self.sample_index] = port;
        self.sample_index += 1;
        if self.sample_index >= DEBOUNCE_WINDOW {
            self.sample_index = 0;
        }
    }

    /// Reduce the window and latch edge masks (called from the loop).
    pub fn compute_edges(&mut self) {
        let mut accumulated_closed = 0x00u8;
        let mut accumulated_open = 0xffu8;
        for &sample in &self.samples {
            accumulated_closed |= sample;
            accumulated_open &= sample;
        }

        let previous_closed = self.closed_state;
        let previous_open = self.open_state;

        self.closed_state = accumulated_closed;
        self.open_state = accumulated_open;

        self.closed_changed = self.closed_state ^ previous_closed;
        self.open_changed = self.open_state ^ previous_open;
    }

    /// Did any of the given pins just close?
    #[inline]
    pub fn was_closed(&self, pins: SwitchPins) -> bool {
        (!self.closed_state & self.closed_changed) & pins.bits() != 0
    }

    /// Did any of the given pins just open?
    #[inline]
    pub fn was_opened(&self, pins: SwitchPins) -> bool {
        (self.open_state & self.open_changed) & pins.bits() != 0
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(debouncer: &mut Debouncer, port: u8, count: usize) {
        for _ in 0..count {
            debouncer.record_sample(port);
        }
    }

    #[test]
    fn test_quiet_port_reports_no_edges() {
        let mut debouncer = Debouncer::new();
        feed(&mut debouncer, 0xff, 25);
        debouncer.compute_edges();
        assert!(!debouncer.was_closed(SwitchPins::TAP));
        assert!(!debouncer.was_opened(SwitchPins::TAP));
    }

    #[test]
    fn test_close_needs_full_window_of_lows() {
        let mut debouncer = Debouncer::new();
        let closed = 0xff & !SwitchPins::TAP.bits();

        feed(&mut debouncer, closed, DEBOUNCE_WINDOW - 1);
        debouncer.compute_edges();
        assert!(!debouncer.was_closed(SwitchPins::TAP), "9 lows is not stable");

        feed(&mut debouncer, closed, 1);
        debouncer.compute_edges();
        assert!(debouncer.was_closed(SwitchPins::TAP), "10 lows is stable");
    }

    #[test]
    fn test_bounce_inside_window_blocks_the_edge() {
        let mut debouncer = Debouncer::new();
        let closed = 0xff & !SwitchPins::TAP.bits();

        feed(&mut debouncer, closed, 5);
        feed(&mut debouncer, 0xff, 1); // contact bounce
        feed(&mut debouncer, closed, 4);
        debouncer.compute_edges();
        assert!(!debouncer.was_closed(SwitchPins::TAP));

        // Six more clean lows push the bounce out of the window.
        feed(&mut debouncer, closed, 6);
        debouncer.compute_edges();
        assert!(debouncer.was_closed(SwitchPins::TAP));
    }

    #[test]
    fn test_edges_are_one_shot() {
        let mut debouncer = Debouncer::new();
        let closed = 0xff & !SwitchPins::TAP.bits();
        feed(&mut debouncer, closed, DEBOUNCE_WINDOW);
        debouncer.compute_edges();
        assert!(debouncer.was_closed(SwitchPins::TAP));

        // Same stable state again: the edge has been consumed.
        feed(&mut debouncer, closed, 1);
        debouncer.compute_edges();
        assert!(!debouncer.was_closed(SwitchPins::TAP));
    }

    #[test]
    fn test_open_after_close_round_trip() {
        let mut debouncer = Debouncer::new();
        let closed = 0xff & !SwitchPins::MODE.bits();

        feed(&mut debouncer, closed, DEBOUNCE_WINDOW);
        debouncer.compute_edges();
        assert!(debouncer.was_closed(SwitchPins::MODE));
        assert!(!debouncer.was_opened(SwitchPins::MODE));

        feed(&mut debouncer, 0xff, DEBOUNCE_WINDOW);
        debouncer.compute_edges();
        assert!(debouncer.was_opened(SwitchPins::MODE));
        assert!(!debouncer.was_closed(SwitchPins::MODE));
    }

    #[test]
    fn test_pins_debounce_independently() {
        let mut debouncer = Debouncer::new();
        let both = 0xff & !(SwitchPins::TAP.bits() | SwitchPins::MODE.bits());

        feed(&mut debouncer, both, DEBOUNCE_WINDOW);
        debouncer.compute_edges();
        assert!(debouncer.was_closed(SwitchPins::TAP));
        assert!(debouncer.was_closed(SwitchPins::MODE));
        assert!(!debouncer.was_closed(SwitchPins::TAP_ALIGN));
    }
}
