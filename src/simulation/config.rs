//! Static configuration for the intersection
//!
//! `SimConfig` is the serde-facing shape (keyed maps, loadable from JSON).
//! `SimParams` is the validated form the simulation runs on, with every class
//! and approach guaranteed present.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::types::{Axis, Direction, Position, VehicleClass, APPROACH_COUNT, LANES_PER_APPROACH};

/// Shortest accepted gap between generated vehicles
pub const MIN_SPAWN_INTERVAL_SECS: f32 = 0.05;

/// Per-class movement and clearance figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProfile {
    /// Distance moved per frame
    pub speed: f32,
    /// Seconds the vehicle needs to clear the intersection
    pub clearance_secs: f32,
    /// Extent along the direction of travel
    pub length: f32,
    /// Extent across the direction of travel
    pub width: f32,
}

/// Fixed geometry of one approach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApproachGeometry {
    /// Spawn point for each lane
    pub spawn: [Position; LANES_PER_APPROACH],
    /// Coordinate whose passing marks a vehicle as crossed
    pub stop_line: f32,
    /// Unchained stop coordinate for the head of a queue
    pub default_stop: f32,
    /// Coordinate at which a turning vehicle starts to rotate
    pub turn_trigger: f32,
    /// Displacement applied on every rotation step
    pub turn_step: Position,
}

/// Signal timing defaults and green bounds, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalTiming {
    pub default_red: u32,
    pub default_yellow: u32,
    pub default_green: u32,
    pub min_green: u32,
    pub max_green: u32,
    /// RED countdown value of the next approach that triggers the look-ahead
    pub detection_time: u32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            default_red: 150,
            default_yellow: 5,
            default_green: 20,
            min_green: 10,
            max_green: 60,
            detection_time: 5,
        }
    }
}

/// Visible scene extent; vehicles beyond it (plus a margin) are removed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneBounds {
    pub width: f32,
    pub height: f32,
}

impl Default for SceneBounds {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 800.0,
        }
    }
}

/// Loadable simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub classes: BTreeMap<VehicleClass, ClassProfile>,
    pub approaches: BTreeMap<Direction, ApproachGeometry>,
    pub signal: SignalTiming,
    pub scene: SceneBounds,
    /// Total simulated seconds before the run ends
    pub duration_secs: u64,
    /// Wall-clock seconds between generated vehicles
    pub spawn_interval_secs: f32,
    pub emergency_probability: f64,
    /// Probability that a turn-lane vehicle turns
    pub turn_probability: f64,
    /// Lane count used by the look-ahead estimator; the divisor is this plus one
    pub detection_lane_count: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            classes: VehicleClass::ALL
                .iter()
                .map(|&class| (class, default_profile(class)))
                .collect(),
            approaches: Direction::ALL
                .iter()
                .map(|&direction| (direction, default_geometry(direction)))
                .collect(),
            signal: SignalTiming::default(),
            scene: SceneBounds::default(),
            duration_secs: 300,
            spawn_interval_secs: 0.85,
            emergency_probability: 0.015,
            turn_probability: 0.3,
            detection_lane_count: 2,
        }
    }
}

impl SimConfig {
    /// Read a JSON configuration file. Fields left out keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse config JSON")
    }

    /// Validate and convert into the form the simulation runs on
    pub fn into_params(self) -> Result<SimParams> {
        let mut classes = [default_profile(VehicleClass::Car); VehicleClass::COUNT];
        for class in VehicleClass::ALL {
            let profile = self
                .classes
                .get(&class)
                .with_context(|| format!("Missing profile for vehicle class '{}'", class))?;
            if !(profile.speed > 0.0) {
                bail!("Vehicle class '{}' must have a positive speed", class);
            }
            if !(profile.clearance_secs > 0.0) {
                bail!("Vehicle class '{}' must have a positive clearance time", class);
            }
            if !(profile.length > 0.0 && profile.width > 0.0) {
                bail!("Vehicle class '{}' must have positive dimensions", class);
            }
            classes[class.index()] = *profile;
        }

        let mut approaches = [default_geometry(Direction::Right); APPROACH_COUNT];
        for direction in Direction::ALL {
            let geometry = self
                .approaches
                .get(&direction)
                .with_context(|| format!("Missing geometry for approach '{}'", direction))?;
            approaches[direction.index()] = *geometry;
        }

        let signal = self.signal;
        if signal.min_green == 0 {
            bail!("min_green must be at least one second");
        }
        if signal.min_green > signal.max_green {
            bail!(
                "min_green ({}) exceeds max_green ({})",
                signal.min_green,
                signal.max_green
            );
        }
        if signal.default_yellow == 0 {
            bail!("default_yellow must be at least one second");
        }
        if !(self.scene.width > 0.0 && self.scene.height > 0.0) {
            bail!("Scene bounds must be positive");
        }
        if self.duration_secs == 0 {
            bail!("duration_secs must be at least one second");
        }
        if !(self.spawn_interval_secs >= MIN_SPAWN_INTERVAL_SECS) {
            bail!(
                "spawn_interval_secs must be at least {}s, got {}",
                MIN_SPAWN_INTERVAL_SECS,
                self.spawn_interval_secs
            );
        }
        if self.detection_lane_count as usize > LANES_PER_APPROACH {
            bail!(
                "detection_lane_count ({}) exceeds the {} lanes of an approach",
                self.detection_lane_count,
                LANES_PER_APPROACH
            );
        }
        for (name, value) in [
            ("emergency_probability", self.emergency_probability),
            ("turn_probability", self.turn_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must lie in [0, 1], got {}", name, value);
            }
        }

        Ok(SimParams {
            classes,
            approaches,
            signal,
            scene: self.scene,
            duration_secs: self.duration_secs,
            spawn_interval_secs: self.spawn_interval_secs,
            emergency_probability: self.emergency_probability,
            turn_probability: self.turn_probability,
            detection_lane_count: self.detection_lane_count,
        })
    }
}

/// Validated, immutable simulation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SimParams {
    classes: [ClassProfile; VehicleClass::COUNT],
    approaches: [ApproachGeometry; APPROACH_COUNT],
    pub signal: SignalTiming,
    pub scene: SceneBounds,
    pub duration_secs: u64,
    pub spawn_interval_secs: f32,
    pub emergency_probability: f64,
    pub turn_probability: f64,
    pub detection_lane_count: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        let config = SimConfig::default();
        Self {
            classes: VehicleClass::ALL.map(default_profile),
            approaches: Direction::ALL.map(default_geometry),
            signal: config.signal,
            scene: config.scene,
            duration_secs: config.duration_secs,
            spawn_interval_secs: config.spawn_interval_secs,
            emergency_probability: config.emergency_probability,
            turn_probability: config.turn_probability,
            detection_lane_count: config.detection_lane_count,
        }
    }
}

impl SimParams {
    pub fn class(&self, class: VehicleClass) -> &ClassProfile {
        &self.classes[class.index()]
    }

    pub fn approach(&self, direction: Direction) -> &ApproachGeometry {
        &self.approaches[direction.index()]
    }

    /// Far bound of the scene along the axis a direction travels on
    pub fn scene_extent(&self, direction: Direction) -> f32 {
        match direction.axis() {
            Axis::X => self.scene.width,
            Axis::Y => self.scene.height,
        }
    }
}

fn default_profile(class: VehicleClass) -> ClassProfile {
    let (speed, clearance_secs, length, width) = match class {
        VehicleClass::Car => (1.15, 2.0, 44.0, 22.0),
        VehicleClass::Bike => (1.3, 1.0, 30.0, 12.0),
        VehicleClass::Rickshaw => (0.8, 2.25, 38.0, 22.0),
        VehicleClass::Bus => (0.6, 2.5, 64.0, 28.0),
        VehicleClass::Truck => (0.6, 2.5, 64.0, 28.0),
        VehicleClass::Emergency => (1.7, 1.0, 50.0, 24.0),
    };
    ClassProfile {
        speed,
        clearance_secs,
        length,
        width,
    }
}

fn default_geometry(direction: Direction) -> ApproachGeometry {
    match direction {
        Direction::Right => ApproachGeometry {
            spawn: [
                Position::new(0.0, 348.0),
                Position::new(0.0, 370.0),
                Position::new(0.0, 398.0),
            ],
            stop_line: 590.0,
            default_stop: 580.0,
            turn_trigger: 705.0,
            turn_step: Position::new(2.0, 1.8),
        },
        Direction::Down => ApproachGeometry {
            spawn: [
                Position::new(755.0, 0.0),
                Position::new(727.0, 0.0),
                Position::new(697.0, 0.0),
            ],
            stop_line: 330.0,
            default_stop: 320.0,
            turn_trigger: 450.0,
            turn_step: Position::new(-2.5, 2.0),
        },
        Direction::Left => ApproachGeometry {
            spawn: [
                Position::new(1400.0, 498.0),
                Position::new(1400.0, 466.0),
                Position::new(1400.0, 436.0),
            ],
            stop_line: 800.0,
            default_stop: 810.0,
            turn_trigger: 695.0,
            turn_step: Position::new(-1.8, -2.5),
        },
        Direction::Up => ApproachGeometry {
            spawn: [
                Position::new(602.0, 800.0),
                Position::new(627.0, 800.0),
                Position::new(657.0, 800.0),
            ],
            stop_line: 535.0,
            default_stop: 545.0,
            turn_trigger: 400.0,
            turn_step: Position::new(1.0, -1.0),
        },
    }
}
