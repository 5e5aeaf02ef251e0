//! Shared System Handle
//!
//! The firmware runs one owned state machine that three interrupt ranks
//! and a main loop all touch; the hardware serializes them with brief
//! interrupt-masking sections. On a host the same guarantee comes from a
//! mutex: [`SharedSystem`] owns the [`System`] behind an
//! `Arc<parking_lot::Mutex<..>>` and hands out one cloneable handle per
//! rank. Every handle method is a single short lock.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::input::events::InputEvent;
use crate::signal::dds::SampleEvents;
use crate::system::System;

/// Shared ownership of a [`System`] across concurrent drivers
#[derive(Clone)]
pub struct SharedSystem {
    inner: Arc<Mutex<System>>,
}

impl SharedSystem {
    /// Wrap a system for shared use.
    pub fn new(system: System) -> Self {
        SharedSystem {
            inner: Arc::new(Mutex::new(system)),
        }
    }

    /// Handle for the sample-rate rank.
    pub fn sample_clock(&self) -> SampleClockHandle {
        SampleClockHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Handle for the 1 kHz housekeeping rank.
    pub fn tick_clock(&self) -> TickClockHandle {
        TickClockHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Handle for the pin-change rank.
    pub fn pin_change(&self) -> PinChangeHandle {
        PinChangeHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Run one main-loop iteration (debounce and dispatch edges).
    pub fn poll(&self) {
        self.inner.lock().poll();
    }

    /// Lock the system directly for inspection or setup.
    pub fn lock(&self) -> MutexGuard<'_, System> {
        self.inner.lock()
    }
}

/// Sample-rate rank: advances the DDS and output lines
#[derive(Clone)]
pub struct SampleClockHandle {
    inner: Arc<Mutex<System>>,
}

impl SampleClockHandle {
    /// Advance one sample.
    pub fn tick(&self) -> SampleEvents {
        self.inner.lock().sample_tick()
    }

    /// Advance a batch of samples under one lock.
    ///
    /// Returns how many base cycles completed in the batch. Batching
    /// keeps the per-sample locking overhead off the hot path; keep
    /// batches small enough that the other ranks stay responsive.
    pub fn tick_batch(&self, samples: u32) -> u32 {
        let mut system = self.inner.lock();
        let mut base_cycles = 0;
        for _ in 0..samples {
            if system.sample_tick().base_cycle_complete {
                base_cycles += 1;
            }
        }
        base_cycles
    }
}

/// Housekeeping rank: millisecond bookkeeping and switch sampling
#[derive(Clone)]
pub struct TickClockHandle {
    inner: Arc<Mutex<System>>,
}

impl TickClockHandle {
    /// Advance one millisecond.
    pub fn tick(&self) {
        self.inner.lock().tick_ms();
    }
}

/// Pin-change rank: posts asynchronous input events
#[derive(Clone)]
pub struct PinChangeHandle {
    inner: Arc<Mutex<System>>,
}

impl PinChangeHandle {
    /// Deliver one input event.
    pub fn post(&self, event: InputEvent) {
        self.inner.lock().dispatch(event);
    }

    /// Present a new raw input-port image.
    pub fn set_port_image(&self, raw: u8) {
        self.inner.lock().set_port_image(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::events::{Edge, InputSource};

    #[test]
    fn test_handles_share_one_system() {
        let shared = SharedSystem::new(System::new());
        let pins = shared.pin_change();
        pins.post(InputEvent::SourceChanged(InputSource::External));
        pins.post(InputEvent::ExternalEdge(Edge::Falling));

        let ticks = shared.tick_clock();
        for _ in 0..400 {
            ticks.tick();
        }
        pins.post(InputEvent::ExternalEdge(Edge::Rising));

        assert_eq!(shared.lock().base_tempo_ms(), 400);
    }

    #[test]
    fn test_concurrent_ranks_make_progress() {
        let shared = SharedSystem::new(System::new());
        let samples = shared.sample_clock();
        let ticks = shared.tick_clock();

        let sampler = std::thread::spawn(move || {
            let mut cycles = 0;
            for _ in 0..100 {
                cycles += samples.tick_batch(1_000);
            }
            cycles
        });
        let ticker = std::thread::spawn(move || {
            for _ in 0..3_200 {
                ticks.tick();
            }
        });

        // 100k samples at the default 1 Hz tempo is a bit over three
        // base cycles.
        let cycles = sampler.join().unwrap();
        ticker.join().unwrap();
        assert!(cycles >= 3);
    }
}
