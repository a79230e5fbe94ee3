//! Per-approach signal counters

use serde::Serialize;

use super::config::SignalTiming;
use super::types::Direction;

/// Phase shown by a signal head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalPhase {
    Red,
    Green,
    Yellow,
}

/// Timer state of one approach's signal, in whole seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimSignal {
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
    pub min_green: u32,
    pub max_green: u32,
    /// Seconds of green this approach has been given over the run
    pub total_green: u32,
}

impl SimSignal {
    pub fn new(red: u32, timing: &SignalTiming) -> Self {
        Self {
            red,
            yellow: timing.default_yellow,
            green: timing.default_green,
            min_green: timing.min_green,
            max_green: timing.max_green,
            total_green: 0,
        }
    }

    /// Clamp a proposed green duration to this signal's bounds
    pub fn clamp_green(&self, seconds: u32) -> u32 {
        seconds.clamp(self.min_green, self.max_green)
    }

    /// Countdown text a signal head would display for the given phase
    pub fn display_text(&self, phase: SignalPhase) -> String {
        match phase {
            SignalPhase::Green if self.green == 0 => "SLOW".to_string(),
            SignalPhase::Green => self.green.to_string(),
            SignalPhase::Yellow if self.yellow == 0 => "STOP".to_string(),
            SignalPhase::Yellow => self.yellow.to_string(),
            SignalPhase::Red if self.red > 0 && self.red <= 10 => self.red.to_string(),
            SignalPhase::Red => "---".to_string(),
        }
    }
}

/// Signal state frozen for the duration of one motion frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSnapshot {
    /// Clock tick the frame belongs to
    pub tick: u64,
    /// The approach holding GREEN or YELLOW, if any
    pub active: Option<(Direction, SignalPhase)>,
}

impl PhaseSnapshot {
    pub fn all_red(tick: u64) -> Self {
        Self { tick, active: None }
    }

    pub fn serving(tick: u64, approach: Direction, phase: SignalPhase) -> Self {
        Self {
            tick,
            active: Some((approach, phase)),
        }
    }

    /// True only while `approach` holds GREEN (YELLOW does not count)
    pub fn is_green(&self, approach: Direction) -> bool {
        self.active == Some((approach, SignalPhase::Green))
    }

    pub fn phase_of(&self, approach: Direction) -> SignalPhase {
        match self.active {
            Some((active, phase)) if active == approach => phase,
            _ => SignalPhase::Red,
        }
    }
}
