//! Demo driver for the tap-tempo core.
//!
//! Runs a JSON script of timed input actions against the deterministic
//! simulator and prints the resulting sync timeline and settings.
//! Without arguments a built-in two-tap demo script is used.

use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use tap_tempo::{Edge, InputEvent, InputSource, Simulator, SwitchPins};

/// One timed action in a script
#[derive(Debug, Deserialize)]
struct Step {
    /// Simulated time at which the action starts
    at_ms: u64,
    #[serde(flatten)]
    action: Action,
}

/// Input actions understood by the script runner
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Action {
    /// Press and release the tap switch (40 ms of simulated time)
    Tap,
    /// Press and release the single-sync alignment switch
    AlignTap,
    /// Press and hold the mode switch for `hold_ms`, then release
    Mode {
        #[serde(default = "default_hold_ms")]
        hold_ms: u64,
    },
    /// Deliver a decoded encoder movement
    Encoder { delta: i8 },
    /// Deliver an external clock transition
    ExternalEdge { edge: Edge },
    /// Switch the tempo measurement source
    Source { source: InputSource },
    /// Enable or disable 2x-clock interpretation
    TwoX { enabled: bool },
    /// Enable or disable tap averaging
    Averaging { enabled: bool },
}

fn default_hold_ms() -> u64 {
    50
}

#[derive(Debug, Deserialize)]
struct Script {
    /// Total simulated time; defaults to 1 s past the last action
    run_ms: Option<u64>,
    steps: Vec<Step>,
}

fn builtin_script() -> Script {
    Script {
        run_ms: Some(3_000),
        steps: vec![
            Step {
                at_ms: 0,
                action: Action::Tap,
            },
            Step {
                at_ms: 500,
                action: Action::Tap,
            },
        ],
    }
}

fn switch_round_trip(sim: &mut Simulator, pins: SwitchPins, hold_ms: u64) {
    sim.press(pins);
    sim.run_ms(hold_ms);
    sim.release(pins);
    sim.run_ms(20);
}

fn apply(sim: &mut Simulator, action: &Action) {
    match action {
        Action::Tap => switch_round_trip(sim, SwitchPins::TAP, 20),
        Action::AlignTap => switch_round_trip(sim, SwitchPins::TAP_ALIGN, 20),
        Action::Mode { hold_ms } => switch_round_trip(sim, SwitchPins::MODE, *hold_ms),
        Action::Encoder { delta } => sim.encoder(*delta),
        Action::ExternalEdge { edge } => sim.external_edge(*edge),
        Action::Source { source } => sim.dispatch(InputEvent::SourceChanged(*source)),
        Action::TwoX { enabled } => sim.dispatch(InputEvent::TwoXChanged(*enabled)),
        Action::Averaging { enabled } => sim.dispatch(InputEvent::AveragingChanged(*enabled)),
    }
}

fn run_script(script: &Script) -> Result<()> {
    let mut sim = Simulator::new();
    let sample_rate = sim.system().config().sample_rate() as u64;

    let last_at = script.steps.last().map(|s| s.at_ms).unwrap_or(0);
    let run_ms = script.run_ms.unwrap_or(last_at + 1_000);

    for step in &script.steps {
        if step.at_ms < sim.ms_elapsed() {
            bail!(
                "step at {} ms is in the past (simulation already at {} ms); \
                 note that switch actions consume simulated time",
                step.at_ms,
                sim.ms_elapsed()
            );
        }
        sim.run_ms(step.at_ms - sim.ms_elapsed());
        apply(&mut sim, &step.action);
    }
    if run_ms > sim.ms_elapsed() {
        let remaining = run_ms - sim.ms_elapsed();
        sim.run_ms(remaining);
    }

    let system = sim.system();
    println!("simulated {} ms ({} samples)", sim.ms_elapsed(), sim.sample_count());
    println!(
        "base tempo {} ms (effective {} ms), waveform {:?}, multiplier {:?}, mode {:?}",
        system.base_tempo_ms(),
        system.effective_tempo_ms(),
        system.waveform(),
        system.multiplier(),
        system.selection_mode(),
    );

    let to_ms = |samples: &[u64]| -> Vec<u64> {
        samples
            .iter()
            .map(|&s| s * 1_000 / sample_rate)
            .collect()
    };
    println!(
        "sync transitions at ms: {:?}",
        to_ms(&sim.probe().sync_transitions)
    );
    println!(
        "2x sync transitions at ms: {:?}",
        to_ms(&sim.probe().sync_2x_transitions)
    );

    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let script = match args.get(1).map(String::as_str) {
        None => builtin_script(),
        Some("--help") | Some("-h") => {
            eprintln!("usage: tap-tempo [script.json]");
            eprintln!();
            eprintln!("Runs a JSON script of timed input actions against the");
            eprintln!("simulated tap-tempo core and prints the sync timeline.");
            eprintln!("Without a script, taps twice 500 ms apart.");
            return Ok(());
        }
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read script {path}"))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse script {path}"))?
        }
    };

    run_script(&script)
}
