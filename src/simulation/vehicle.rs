//! Vehicle state for the intersection simulation
//!
//! Crossing and turning progress are one-way state machines. Their fields are
//! private and only move forward through the methods below.

use super::config::{ApproachGeometry, ClassProfile};
use super::types::{Axis, Direction, Position, VehicleClass, VehicleId, ROTATION_STEP};

/// What the generator decided to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleSpawn {
    pub class: VehicleClass,
    pub direction: Direction,
    pub lane: usize,
    pub will_turn: bool,
}

/// Whether a vehicle has passed its approach's stop line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingState {
    Uncrossed,
    Crossed { tick: u64 },
}

/// Progress of a turning maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    NotTurning,
    Turning { angle: u32 },
    Turned,
}

/// A vehicle in the simulation
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub direction: Direction,
    pub lane: usize,
    pub will_turn: bool,
    pub position: Position,
    /// Coordinate the leading edge may not pass while the approach is not green
    pub stop_position: f32,
    /// Clock ticks spent before crossing
    pub waiting_secs: u64,
    pub spawn_tick: u64,
    speed: f32,
    length: f32,
    width: f32,
    crossing: CrossingState,
    turn: TurnState,
}

impl SimVehicle {
    pub fn new(
        id: VehicleId,
        spawn: VehicleSpawn,
        profile: &ClassProfile,
        geometry: &ApproachGeometry,
        stop_position: f32,
        spawn_tick: u64,
    ) -> Self {
        Self {
            id,
            class: spawn.class,
            direction: spawn.direction,
            lane: spawn.lane,
            will_turn: spawn.will_turn,
            position: geometry.spawn[spawn.lane],
            stop_position,
            waiting_secs: 0,
            spawn_tick,
            speed: profile.speed,
            length: profile.length,
            width: profile.width,
            crossing: CrossingState::Uncrossed,
            turn: TurnState::NotTurning,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn crossing(&self) -> CrossingState {
        self.crossing
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn is_crossed(&self) -> bool {
        matches!(self.crossing, CrossingState::Crossed { .. })
    }

    pub fn is_turned(&self) -> bool {
        self.turn == TurnState::Turned
    }

    pub fn cross_tick(&self) -> Option<u64> {
        match self.crossing {
            CrossingState::Crossed { tick } => Some(tick),
            CrossingState::Uncrossed => None,
        }
    }

    /// Degrees rotated so far, 0 to 90
    pub fn rotation_angle(&self) -> u32 {
        match self.turn {
            TurnState::NotTurning => 0,
            TurnState::Turning { angle } => angle,
            TurnState::Turned => 90,
        }
    }

    /// Current direction of travel
    pub fn heading(&self) -> Direction {
        if self.is_turned() {
            self.direction.turned()
        } else {
            self.direction
        }
    }

    /// Visual extent along an axis, following the current heading
    pub fn extent_along(&self, axis: Axis) -> f32 {
        if self.heading().axis() == axis {
            self.length
        } else {
            self.width
        }
    }

    /// Front edge coordinate when travelling in `direction`
    pub fn leading_edge(&self, direction: Direction) -> f32 {
        let axis = direction.axis();
        let start = self.position.along(axis);
        if direction.sign() > 0.0 {
            start + self.extent_along(axis)
        } else {
            start
        }
    }

    /// Rear edge coordinate when travelling in `direction`
    pub fn trailing_edge(&self, direction: Direction) -> f32 {
        let axis = direction.axis();
        let start = self.position.along(axis);
        if direction.sign() > 0.0 {
            start
        } else {
            start + self.extent_along(axis)
        }
    }

    /// Move one speed step along `direction`
    pub(crate) fn step_along(&mut self, direction: Direction) {
        self.position
            .translate(direction.axis(), direction.sign() * self.speed);
    }

    /// Returns true only on the first call
    pub(crate) fn mark_crossed(&mut self, tick: u64) -> bool {
        match self.crossing {
            CrossingState::Uncrossed => {
                self.crossing = CrossingState::Crossed { tick };
                true
            }
            CrossingState::Crossed { .. } => false,
        }
    }

    /// Apply one rotation step; the vehicle becomes `Turned` at 90 degrees
    pub(crate) fn rotate_step(&mut self, displacement: Position) {
        let angle = match self.turn {
            TurnState::NotTurning => ROTATION_STEP,
            TurnState::Turning { angle } => angle + ROTATION_STEP,
            TurnState::Turned => return,
        };
        self.position.offset(displacement);
        self.turn = if angle >= 90 {
            TurnState::Turned
        } else {
            TurnState::Turning { angle }
        };
    }
}
