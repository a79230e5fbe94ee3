//! Core types for the intersection simulation
//!
//! Directions, vehicle classes, identifiers and the 2D scene position.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of approaches feeding the intersection
pub const APPROACH_COUNT: usize = 4;

/// Lanes per approach. The last lane is the turn lane.
pub const LANES_PER_APPROACH: usize = 3;

/// Index of the only lane whose vehicles may turn
pub const TURN_LANE: usize = 2;

/// Minimum gap kept between moving vehicles in the same lane
pub const MOVING_GAP: f32 = 15.0;

/// Gap left between chained stop positions
pub const STOPPING_GAP: f32 = 15.0;

/// Degrees of rotation applied per frame while turning (divides 90)
pub const ROTATION_STEP: u32 = 3;

/// Distance past the scene bounds a vehicle must travel before it is removed
pub const EXIT_MARGIN: f32 = 10.0;

/// A unique identifier for a spawned vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VehicleId(pub u64);

/// Axis of the scene a vehicle travels along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Direction of travel of an approach.
///
/// The discriminant doubles as the approach index used for tie-breaking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub const ALL: [Direction; APPROACH_COUNT] =
        [Direction::Right, Direction::Down, Direction::Left, Direction::Up];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The approach served after this one in index order
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % APPROACH_COUNT]
    }

    /// Heading after a completed turn (one quarter clockwise in screen space)
    pub fn turned(self) -> Self {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::Right | Direction::Left => Axis::X,
            Direction::Down | Direction::Up => Axis::Y,
        }
    }

    /// +1 when travel increases the coordinate on `axis()`, -1 otherwise
    pub fn sign(self) -> f32 {
        match self {
            Direction::Right | Direction::Down => 1.0,
            Direction::Left | Direction::Up => -1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Up => "up",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Class of vehicle, which fixes its speed, size and clearance time
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Car,
    Bike,
    Rickshaw,
    Bus,
    Truck,
    Emergency,
}

impl VehicleClass {
    pub const COUNT: usize = 6;

    pub const ALL: [VehicleClass; Self::COUNT] = [
        VehicleClass::Car,
        VehicleClass::Bike,
        VehicleClass::Rickshaw,
        VehicleClass::Bus,
        VehicleClass::Truck,
        VehicleClass::Emergency,
    ];

    /// Classes drawn uniformly by the generator when no emergency is rolled
    pub const ORDINARY: [VehicleClass; 5] = [
        VehicleClass::Car,
        VehicleClass::Bike,
        VehicleClass::Rickshaw,
        VehicleClass::Bus,
        VehicleClass::Truck,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Bike => "bike",
            VehicleClass::Rickshaw => "rickshaw",
            VehicleClass::Bus => "bus",
            VehicleClass::Truck => "truck",
            VehicleClass::Emergency => "emergency",
        }
    }

    /// Single character used by the text renderer
    pub fn glyph(self) -> char {
        match self {
            VehicleClass::Car => 'c',
            VehicleClass::Bike => 'b',
            VehicleClass::Rickshaw => 'r',
            VehicleClass::Bus => 'B',
            VehicleClass::Truck => 'T',
            VehicleClass::Emergency => 'E',
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 2D position in scene coordinates (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn along(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn translate(&mut self, axis: Axis, amount: f32) {
        match axis {
            Axis::X => self.x += amount,
            Axis::Y => self.y += amount,
        }
    }

    pub fn offset(&mut self, delta: Position) {
        self.x += delta.x;
        self.y += delta.y;
    }
}
