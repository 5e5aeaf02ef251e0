//! Deterministic Co-Simulation
//!
//! Drives one [`System`] exactly the way the hardware schedules it: the
//! sample interrupt first, the 1 kHz housekeeping interrupt whenever its
//! rate-ratio accumulator fires, and the main-loop poll after every
//! housekeeping tick. Everything is counted in samples, so test runs are
//! reproducible down to the single tick.
//!
//! A [`SyncProbe`] records the sample timestamp of every transition on
//! the two sync lines; the distance between consecutive transitions is
//! the measured half-period of the output clock.

use crate::input::debounce::SwitchPins;
use crate::input::events::{Edge, InputEvent};
use crate::system::System;

/// Recorded output transitions, timestamped in samples
#[derive(Debug, Clone, Default)]
pub struct SyncProbe {
    /// Sample indices where the base sync line changed level
    pub sync_transitions: Vec<u64>,
    /// Sample indices where the 2x sync line changed level
    pub sync_2x_transitions: Vec<u64>,
}

impl SyncProbe {
    /// Distances between consecutive base sync transitions
    pub fn sync_intervals(&self) -> Vec<u64> {
        Self::intervals(&self.sync_transitions)
    }

    /// Distances between consecutive 2x sync transitions
    pub fn sync_2x_intervals(&self) -> Vec<u64> {
        Self::intervals(&self.sync_2x_transitions)
    }

    fn intervals(transitions: &[u64]) -> Vec<u64> {
        transitions.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.sync_transitions.clear();
        self.sync_2x_transitions.clear();
    }
}

/// Deterministic driver for a [`System`]
pub struct Simulator {
    system: System,
    sample_count: u64,
    ms_elapsed: u64,
    ms_accumulator: u32,
    probe: SyncProbe,
    previous_sync: bool,
    previous_sync_2x: bool,
}

impl Simulator {
    /// Simulate a freshly powered-on system.
    pub fn new() -> Self {
        Self::with_system(System::new())
    }

    /// Simulate a pre-configured system.
    pub fn with_system(system: System) -> Self {
        let previous_sync = system.outputs().sync();
        let previous_sync_2x = system.outputs().sync_2x();
        Simulator {
            system,
            sample_count: 0,
            ms_elapsed: 0,
            ms_accumulator: 0,
            probe: SyncProbe::default(),
            previous_sync,
            previous_sync_2x,
        }
    }

    /// The system under simulation
    pub fn system(&self) -> &System {
        &self.system
    }

    /// Mutable access to the system under simulation
    pub fn system_mut(&mut self) -> &mut System {
        &mut self.system
    }

    /// Transitions recorded so far
    pub fn probe(&self) -> &SyncProbe {
        &self.probe
    }

    /// Drop the recorded transitions (the system keeps running).
    pub fn clear_probe(&mut self) {
        self.probe.clear();
    }

    /// Samples executed so far
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Milliseconds of simulated time executed so far
    pub fn ms_elapsed(&self) -> u64 {
        self.ms_elapsed
    }

    /// Close switches (drive their lines low).
    pub fn press(&mut self, pins: SwitchPins) {
        let image = self.system.port_image() & !pins.bits();
        self.system.set_port_image(image);
    }

    /// Open switches (release their lines high).
    pub fn release(&mut self, pins: SwitchPins) {
        let image = self.system.port_image() | pins.bits();
        self.system.set_port_image(image);
    }

    /// Deliver an external clock transition (pin-change rank).
    pub fn external_edge(&mut self, edge: Edge) {
        self.system.dispatch(InputEvent::ExternalEdge(edge));
    }

    /// Deliver a decoded encoder movement (pin-change rank).
    pub fn encoder(&mut self, delta: i8) {
        self.system.dispatch(InputEvent::EncoderDelta(delta));
    }

    /// Deliver any input event directly.
    pub fn dispatch(&mut self, event: InputEvent) {
        self.system.dispatch(event);
    }

    /// Run for a number of simulated milliseconds.
    pub fn run_ms(&mut self, milliseconds: u64) {
        let target = self.ms_elapsed + milliseconds;
        while self.ms_elapsed < target {
            self.step_sample();
        }
    }

    /// Run for an exact number of samples.
    pub fn run_samples(&mut self, samples: u64) {
        for _ in 0..samples {
            self.step_sample();
        }
    }

    /// One sample tick, plus the lower ranks when they are due.
    fn step_sample(&mut self) {
        self.system.sample_tick();
        self.sample_count += 1;
        self.record_transitions();

        // Rate-ratio accumulator: fires the housekeeping tick every
        // sample_rate / tick_hz samples on average (31.25 at the
        // reference rates), without drift.
        self.ms_accumulator += self.system.config().tick_hz;
        if self.ms_accumulator >= self.system.config().sample_rate() {
            self.ms_accumulator -= self.system.config().sample_rate();
            self.system.tick_ms();
            self.ms_elapsed += 1;
            self.system.poll();
            self.record_transitions();
        }
    }

    fn record_transitions(&mut self) {
        let sync = self.system.outputs().sync();
        if sync != self.previous_sync {
            self.previous_sync = sync;
            self.probe.sync_transitions.push(self.sample_count);
        }
        let sync_2x = self.system.outputs().sync_2x();
        if sync_2x != self.previous_sync_2x {
            self.previous_sync_2x = sync_2x;
            self.probe.sync_2x_transitions.push(self.sample_count);
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}
