//! System Controller
//!
//! Owns every component and glues them together: routes debounced switch
//! edges and pin-change events, arbitrates between tap and external
//! clock input, measures tempo, drives the sync outputs and keeps the
//! LFO waveform phase-coherent through it all.
//!
//! The three entry points mirror the firmware's interrupt ranks:
//! [`System::sample_tick`] is the hard-real-time sample interrupt,
//! [`System::tick_ms`] the 1 kHz housekeeping interrupt, and
//! [`System::poll`] the non-interrupt main loop. Exclusive access per
//! call (`&mut self`) is the logical critical section; concurrent
//! drivers get the same guarantee from [`shared::SharedSystem`].

pub mod outputs;
pub mod shared;

use bitflags::bitflags;

use crate::constants::{ClockConfig, DEFAULT_TEMPO_MS, MAX_TEMPO_MS, MIN_TEMPO_MS, RESET_HOLD_MS};
use crate::input::debounce::{Debouncer, SwitchPins};
use crate::input::events::{Edge, InputEvent, InputSource};
use crate::input::mode::{ModeSelect, SelectionMode};
use crate::signal::dds::{DdsEngine, SampleEvents};
use crate::signal::multiplier::Multiplier;
use crate::signal::random::{RandomSource, XorShiftSource};
use crate::signal::waveform::{Waveform, WaveformPlotter};
use crate::tempo::averager::TempoAverager;
use crate::tempo::timers::MsTimer;
use crate::Result;

use outputs::OutputLines;

bitflags! {
    /// Bit-packed controller state
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StateFlags: u16 {
        /// A tempo measurement is in progress
        const IS_COUNTING_TEMPO = 1 << 0;
        /// 2x-clock parity: the next external falling edge stops the count
        const IS_COUNTING_2X_TEMPO = 1 << 1;
        /// The mode switch is held and the hold time is being counted
        const IS_COUNTING_RESET = 1 << 2;
        /// The hold threshold fired; the coming release is not a press
        const IS_RESETTING = 1 << 3;
        /// Tempo comes from the external clock instead of the tap switch
        const EXTERNAL_SOURCE = 1 << 4;
        /// The external clock pulses twice per musical cycle
        const IS_2X_CLOCK = 1 << 5;
        /// Tap measurements run through the averager
        const AVERAGING_ENABLED = 1 << 6;
        /// At least one complete tap pair has been received
        const HAS_RECEIVED_TAP = 1 << 7;
        /// The random source has been seeded from a tap measurement
        const HAS_RANDOM_SEED = 1 << 8;
    }
}

/// The complete tap-tempo core
pub struct System {
    config: ClockConfig,
    flags: StateFlags,
    port_image: u8,

    dds: DdsEngine,
    plotter: WaveformPlotter,
    random: Box<dyn RandomSource>,

    debouncer: Debouncer,
    mode: ModeSelect,
    averager: TempoAverager,

    tempo_timer: MsTimer,
    reset_timer: MsTimer,

    outputs: OutputLines,
}

impl System {
    /// Create a core with the reference clock configuration.
    pub fn new() -> Self {
        Self::build(ClockConfig::default(), Box::new(XorShiftSource::new()))
    }

    /// Create a core with a validated custom clock configuration.
    pub fn with_config(config: ClockConfig) -> Result<Self> {
        let config = ClockConfig::new(config.cpu_hz, config.table_size, config.tick_hz)?;
        Ok(Self::build(config, Box::new(XorShiftSource::new())))
    }

    /// Create a core with a custom random source.
    pub fn with_random_source(config: ClockConfig, random: Box<dyn RandomSource>) -> Result<Self> {
        let config = ClockConfig::new(config.cpu_hz, config.table_size, config.tick_hz)?;
        Ok(Self::build(config, random))
    }

    fn build(config: ClockConfig, mut random: Box<dyn RandomSource>) -> Self {
        let mut dds = DdsEngine::new(config.sample_rate());
        dds.set_base_tempo(DEFAULT_TEMPO_MS);

        let mut plotter = WaveformPlotter::new();
        plotter.refresh_random(random.as_mut());

        let mode = ModeSelect::new();
        let mut outputs = OutputLines::new();
        outputs.set_mode_led(mode.mode());

        System {
            config,
            flags: StateFlags::empty(),
            port_image: 0xff,
            dds,
            plotter,
            random,
            debouncer: Debouncer::new(),
            mode,
            averager: TempoAverager::new(),
            tempo_timer: MsTimer::new(),
            reset_timer: MsTimer::new(),
            outputs,
        }
    }

    /// Clock configuration in use
    #[inline]
    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Current controller flags
    #[inline]
    pub fn flags(&self) -> StateFlags {
        self.flags
    }

    /// Current output line levels
    #[inline]
    pub fn outputs(&self) -> &OutputLines {
        &self.outputs
    }

    /// Read-only view of the DDS engine
    #[inline]
    pub fn dds(&self) -> &DdsEngine {
        &self.dds
    }

    /// Stored base tempo in ms
    #[inline]
    pub fn base_tempo_ms(&self) -> u16 {
        self.dds.base_tempo_ms()
    }

    /// Effective tempo in ms (base plus speed-adjust offset)
    #[inline]
    pub fn effective_tempo_ms(&self) -> u16 {
        self.dds.effective_tempo_ms()
    }

    /// Current waveform selection
    #[inline]
    pub fn waveform(&self) -> Waveform {
        self.plotter.waveform()
    }

    /// Current multiplier selection
    #[inline]
    pub fn multiplier(&self) -> Multiplier {
        self.dds.multiplier()
    }

    /// Current selection mode
    #[inline]
    pub fn selection_mode(&self) -> SelectionMode {
        self.mode.mode()
    }

    /// Tempo measurement source currently selected
    #[inline]
    pub fn input_source(&self) -> InputSource {
        if self.flags.contains(StateFlags::EXTERNAL_SOURCE) {
            InputSource::External
        } else {
            InputSource::Tap
        }
    }

    /// 2x-clock counting parity (test hook for the align-tap behavior)
    #[inline]
    pub fn two_x_parity(&self) -> bool {
        self.flags.contains(StateFlags::IS_COUNTING_2X_TEMPO)
    }

    /// Number of measurements held by the averager
    #[inline]
    pub fn averaged_measurements(&self) -> usize {
        self.averager.len()
    }

    /// Present a new raw input-port image (active-low switch lines).
    #[inline]
    pub fn set_port_image(&mut self, raw: u8) {
        self.port_image = raw;
    }

    /// Current raw input-port image
    #[inline]
    pub fn port_image(&self) -> u8 {
        self.port_image
    }

    /// Sample-rate entry point: advance the DDS and drive the outputs.
    ///
    /// Must stay cheap; everything here is integer arithmetic and table
    /// lookups. Returns the edges observed this tick.
    pub fn sample_tick(&mut self) -> SampleEvents {
        let events = self.dds.sample_tick();

        if events.base_cycle_complete {
            // While counting, the sync line is held by start/stop; the
            // 2x line keeps running regardless.
            if !self.flags.contains(StateFlags::IS_COUNTING_TEMPO) {
                self.outputs.toggle_sync();
            }
            self.outputs.toggle_sync_2x();
            self.plotter.refresh_random(self.random.as_mut());
        } else if events.base_half_crossing {
            self.outputs.toggle_sync_2x();
        }

        let duty = self.plotter.plot(events.index);
        self.outputs.set_pwm(duty);
        events
    }

    /// 1 kHz entry point: switch sampling and millisecond bookkeeping.
    pub fn tick_ms(&mut self) {
        self.debouncer.record_sample(self.port_image);

        if self.flags.contains(StateFlags::IS_COUNTING_TEMPO) {
            let count = self.tempo_timer.tick();
            if count > MAX_TEMPO_MS {
                self.timeout_count();
            }
        }

        if self.flags.contains(StateFlags::IS_COUNTING_RESET) {
            let held = self.reset_timer.tick();
            if held >= RESET_HOLD_MS {
                self.flags.insert(StateFlags::IS_RESETTING);
                self.flags.remove(StateFlags::IS_COUNTING_RESET);
                self.reset_timer.zero();
                self.reset_current_mode();
            }
        }

        self.mode.tick_ms();
    }

    /// Main-loop entry point: debounce and dispatch switch edges.
    pub fn poll(&mut self) {
        self.debouncer.compute_edges();

        if self.debouncer.was_closed(SwitchPins::TAP) {
            self.dispatch(InputEvent::TapClosed);
        }
        if self.debouncer.was_opened(SwitchPins::TAP) {
            self.dispatch(InputEvent::TapOpened);
        }
        if self.debouncer.was_closed(SwitchPins::TAP_ALIGN) {
            self.dispatch(InputEvent::AlignClosed);
        }
        if self.debouncer.was_closed(SwitchPins::MODE) {
            self.dispatch(InputEvent::ModeClosed);
        }
        if self.debouncer.was_opened(SwitchPins::MODE) {
            self.dispatch(InputEvent::ModeOpened);
        }
    }

    /// Consume one input event.
    pub fn dispatch(&mut self, event: InputEvent) {
        match event {
            InputEvent::TapClosed => self.on_tap_closed(),
            InputEvent::TapOpened => {}
            InputEvent::AlignClosed => self.on_align_closed(),
            InputEvent::ModeClosed => {
                self.flags.insert(StateFlags::IS_COUNTING_RESET);
            }
            InputEvent::ModeOpened => self.on_mode_opened(),
            InputEvent::ExternalEdge(edge) => self.on_external_edge(edge),
            InputEvent::EncoderDelta(delta) => self.on_encoder_delta(delta),
            InputEvent::SourceChanged(source) => self.on_source_changed(source),
            InputEvent::TwoXChanged(enabled) => {
                self.flags.set(StateFlags::IS_2X_CLOCK, enabled);
            }
            InputEvent::AveragingChanged(enabled) => {
                self.flags.set(StateFlags::AVERAGING_ENABLED, enabled);
                if !enabled {
                    self.averager.clear();
                }
            }
        }
    }

    /// Select the waveform from an 8-bit analog level (ADC variant).
    pub fn set_waveform_level(&mut self, value: u8) {
        self.plotter.set_from_level(value);
    }

    /// Select the multiplier from an 8-bit analog level (ADC variant).
    pub fn set_multiplier_level(&mut self, value: u8) {
        self.dds.select_multiplier(Multiplier::from_level(value));
    }

    fn on_tap_closed(&mut self) {
        // Manual taps are ignored while the external clock is in charge.
        if self.flags.contains(StateFlags::EXTERNAL_SOURCE) {
            return;
        }

        // A manual tap marks a downbeat: realign everything, then start
        // or finish the measurement. Start-or-stop and the phase reset
        // must be observed together, which exclusive access guarantees.
        if !self.flags.contains(StateFlags::IS_COUNTING_TEMPO) {
            self.dds.reset_signals();
            self.start_count();
            self.outputs.set_tap_active_led(true);
        } else {
            self.dds.reset_signals();
            let measured = self.stop_count();
            self.flags.insert(StateFlags::HAS_RECEIVED_TAP);

            // The first completed measurement seeds the random waveform
            // so the level sequence differs between power cycles.
            if let Some(milliseconds) = measured {
                if !self.flags.contains(StateFlags::HAS_RANDOM_SEED) {
                    self.flags.insert(StateFlags::HAS_RANDOM_SEED);
                    self.random.reseed(milliseconds as u32);
                    self.plotter.refresh_random(self.random.as_mut());
                }
            }
        }
    }

    fn on_align_closed(&mut self) {
        if !self.flags.contains(StateFlags::EXTERNAL_SOURCE) {
            // Realign the output phase without touching the stored
            // tempo: end any measurement, discard the count, and put the
            // sync lines where a fresh cycle start puts them.
            self.dds.reset_base_phase();
            self.timeout_count();
            self.outputs.set_sync(true);
            self.outputs.set_sync_2x(false);
        } else if self.flags.contains(StateFlags::IS_2X_CLOCK) {
            // Running off a double-speed clock, the align tap flips which
            // of the two incoming edges the single-rate output lines up
            // with: the next output pulse stretches by half a cycle.
            self.flags.toggle(StateFlags::IS_COUNTING_2X_TEMPO);
        }
    }

    fn on_mode_opened(&mut self) {
        if self.flags.contains(StateFlags::IS_RESETTING) {
            // The hold threshold already fired and reset the mode;
            // swallow the release.
            self.flags.remove(StateFlags::IS_RESETTING);
        } else {
            self.flags.remove(StateFlags::IS_COUNTING_RESET);
            self.reset_timer.zero();
            let mode = self.mode.advance();
            self.outputs.set_mode_led(mode);
        }
    }

    fn on_external_edge(&mut self, edge: Edge) {
        if !self.flags.contains(StateFlags::EXTERNAL_SOURCE) {
            return;
        }

        if self.flags.contains(StateFlags::IS_2X_CLOCK) {
            // A 2x clock falls twice per musical cycle; measure from
            // falling edge to falling edge across a full cycle, tracking
            // which edge is which with the parity flag.
            if edge == Edge::Falling {
                if self.flags.contains(StateFlags::IS_COUNTING_2X_TEMPO) {
                    self.stop_count();
                    self.flags.remove(StateFlags::IS_COUNTING_2X_TEMPO);
                } else {
                    self.start_count();
                    self.flags.insert(StateFlags::IS_COUNTING_2X_TEMPO);
                }
            }
        } else {
            match edge {
                Edge::Falling => self.start_count(),
                Edge::Rising => {
                    self.stop_count();
                }
            }
        }
    }

    fn on_encoder_delta(&mut self, delta: i8) {
        match self.mode.mode() {
            SelectionMode::Speed => {
                let adjustment = self.mode.speed_delta(delta);
                self.dds.adjust_speed(adjustment);
            }
            SelectionMode::Waveform => self.plotter.scroll(delta),
            SelectionMode::Multiplier => self.dds.set_multiplier(delta),
        }
    }

    fn on_source_changed(&mut self, source: InputSource) {
        self.flags
            .set(StateFlags::EXTERNAL_SOURCE, source == InputSource::External);

        // A measurement spanning the switchover is meaningless; so is
        // any averaging history from the previous source.
        self.timeout_count();
        self.averager.clear();
    }

    fn reset_current_mode(&mut self) {
        match self.mode.mode() {
            SelectionMode::Speed => self.dds.reset_speed_adjust(),
            SelectionMode::Waveform => self.plotter.reset(),
            SelectionMode::Multiplier => self.dds.reset_multiplier(),
        }
    }

    /// Begin a tempo measurement and pull both sync lines low.
    fn start_count(&mut self) {
        self.tempo_timer.zero();
        self.flags.insert(StateFlags::IS_COUNTING_TEMPO);

        self.dds.reset_base_phase();
        self.dds.align_waveform();

        self.outputs.set_sync(false);
        self.outputs.set_sync_2x(false);
    }

    /// Finish a measurement, commit the tempo, restore the sync lines.
    ///
    /// Returns the raw measured period when a count was actually
    /// running.
    fn stop_count(&mut self) -> Option<u16> {
        let mut measured = None;

        if self.flags.contains(StateFlags::IS_COUNTING_TEMPO) {
            self.flags.remove(StateFlags::IS_COUNTING_TEMPO);
            let milliseconds = self.tempo_timer.count();
            self.tempo_timer.zero();
            self.commit_tempo(milliseconds);
            measured = Some(milliseconds);
        }

        self.dds.reset_base_phase();
        self.dds.align_waveform();

        // The sync line has completed a half cycle, the 2x line a full
        // one.
        self.outputs.set_sync(true);
        self.outputs.set_sync_2x(false);
        self.outputs.set_tap_active_led(false);

        measured
    }

    /// Abandon a measurement without committing anything.
    fn timeout_count(&mut self) {
        self.flags.remove(StateFlags::IS_COUNTING_TEMPO);
        self.tempo_timer.zero();
        self.outputs.set_tap_active_led(false);
    }

    /// Bounds-check, optionally average, and store a measurement.
    fn commit_tempo(&mut self, milliseconds: u16) {
        if !(MIN_TEMPO_MS..=MAX_TEMPO_MS).contains(&milliseconds) {
            return;
        }

        let milliseconds = if !self.flags.contains(StateFlags::EXTERNAL_SOURCE)
            && self.flags.contains(StateFlags::AVERAGING_ENABLED)
        {
            self.averager.submit(milliseconds)
        } else {
            milliseconds
        };

        self.dds.set_base_tempo(milliseconds);
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("flags", &self.flags)
            .field("base_tempo_ms", &self.dds.base_tempo_ms())
            .field("effective_tempo_ms", &self.dds.effective_tempo_ms())
            .field("waveform", &self.plotter.waveform())
            .field("multiplier", &self.dds.multiplier())
            .field("selection_mode", &self.mode.mode())
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}
