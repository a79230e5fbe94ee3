//! Read-only views of the world for renderers

use super::config::SceneBounds;
use super::signal::SignalPhase;
use super::types::{Direction, Position, VehicleClass, VehicleId};

#[derive(Debug, Clone, PartialEq)]
pub struct SignalView {
    pub approach: Direction,
    pub phase: SignalPhase,
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
    pub total_green: u32,
    /// Uncrossed vehicles on the approach
    pub waiting: usize,
    pub crossed: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleView {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub direction: Direction,
    pub lane: usize,
    pub position: Position,
    pub rotation: u32,
    pub heading: Direction,
    pub crossed: bool,
}

/// Everything a frame renderer needs, copied out under the world lock
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub scene: SceneBounds,
    pub signals: Vec<SignalView>,
    pub vehicles: Vec<VehicleView>,
}

impl WorldSnapshot {
    pub fn signal(&self, approach: Direction) -> Option<&SignalView> {
        self.signals.iter().find(|view| view.approach == approach)
    }
}
