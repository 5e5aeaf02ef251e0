//! Typed Edge Events
//!
//! The vocabulary between the input layer and the controller. Debounced
//! switch edges, pin-change notifications and decoded encoder ticks all
//! arrive as [`InputEvent`] values consumed by a single dispatch point,
//! instead of the input layer reaching into signal state directly.

use serde::{Deserialize, Serialize};

/// Direction of an external clock transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Low-to-high transition
    Rising,
    /// High-to-low transition
    Falling,
}

/// Where tempo measurements come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// The tap footswitch
    Tap,
    /// The external clock input
    External,
}

/// One input-layer event for the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Tap switch pressed
    TapClosed,
    /// Tap switch released
    TapOpened,
    /// Single-sync (alignment) tap pressed
    AlignClosed,
    /// Mode switch pressed
    ModeClosed,
    /// Mode switch released
    ModeOpened,
    /// External clock transition
    ExternalEdge(Edge),
    /// Decoded rotary-encoder movement in detents
    EncoderDelta(i8),
    /// Input-source selector changed
    SourceChanged(InputSource),
    /// 2x-clock selector changed
    TwoXChanged(bool),
    /// Averaging-enable selector changed
    AveragingChanged(bool),
}
