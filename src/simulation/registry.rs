//! World registry: the per-lane vehicle queues and crossed counters
//!
//! Every vehicle lives in exactly one (direction, lane) queue from spawn until
//! it leaves the scene. Queues keep spawn order.

use super::config::SimParams;
use super::types::{
    Direction, VehicleClass, VehicleId, APPROACH_COUNT, LANES_PER_APPROACH, STOPPING_GAP,
};
use super::vehicle::{SimVehicle, VehicleSpawn};

#[derive(Debug, Default)]
pub struct WorldRegistry {
    lanes: [[Vec<SimVehicle>; LANES_PER_APPROACH]; APPROACH_COUNT],
    crossed: [u64; APPROACH_COUNT],
    next_id: u64,
}

impl WorldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a vehicle at the tail of its lane.
    ///
    /// The stop position chains behind the previous vehicle while that vehicle
    /// has not crossed; otherwise it is the approach's default stop.
    pub fn insert(&mut self, spawn: VehicleSpawn, params: &SimParams, tick: u64) -> VehicleId {
        let id = self.next_vehicle_id();
        let geometry = params.approach(spawn.direction);
        let sign = spawn.direction.sign();

        let queue = &mut self.lanes[spawn.direction.index()][spawn.lane];
        let stop_position = match queue.last() {
            Some(previous) if !previous.is_crossed() => {
                previous.stop_position - sign * (previous.length() + STOPPING_GAP)
            }
            _ => geometry.default_stop,
        };

        let vehicle = SimVehicle::new(
            id,
            spawn,
            params.class(spawn.class),
            geometry,
            stop_position,
            tick,
        );
        queue.push(vehicle);
        id
    }

    pub fn lane(&self, direction: Direction, lane: usize) -> &[SimVehicle] {
        &self.lanes[direction.index()][lane]
    }

    pub(crate) fn lane_mut(&mut self, direction: Direction, lane: usize) -> &mut Vec<SimVehicle> {
        &mut self.lanes[direction.index()][lane]
    }

    /// All vehicles of one approach, lane by lane
    pub fn approach(&self, direction: Direction) -> impl Iterator<Item = &SimVehicle> {
        self.lanes[direction.index()].iter().flatten()
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &SimVehicle> {
        self.lanes.iter().flatten().flatten()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles().count()
    }

    pub fn get(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles().find(|vehicle| vehicle.id == id)
    }

    /// Current queue index of a vehicle, or `None` once it has been removed
    pub fn index_of(&self, direction: Direction, lane: usize, id: VehicleId) -> Option<usize> {
        self.lane(direction, lane)
            .iter()
            .position(|vehicle| vehicle.id == id)
    }

    pub fn remove(&mut self, direction: Direction, lane: usize, id: VehicleId) -> Option<SimVehicle> {
        let index = self.index_of(direction, lane, id)?;
        Some(self.lane_mut(direction, lane).remove(index))
    }

    /// Vehicles of an approach that have not crossed its stop line
    pub fn waiting_count(&self, direction: Direction) -> usize {
        self.approach(direction)
            .filter(|vehicle| !vehicle.is_crossed())
            .count()
    }

    pub fn waiting_by_class(&self, direction: Direction) -> [usize; VehicleClass::COUNT] {
        let mut counts = [0; VehicleClass::COUNT];
        for vehicle in self.approach(direction).filter(|v| !v.is_crossed()) {
            counts[vehicle.class.index()] += 1;
        }
        counts
    }

    pub fn uncrossed_emergencies(&self) -> impl Iterator<Item = &SimVehicle> {
        self.vehicles()
            .filter(|vehicle| vehicle.class == VehicleClass::Emergency && !vehicle.is_crossed())
    }

    /// Release queue chaining for a whole approach
    pub fn reset_stop_positions(&mut self, direction: Direction, stop: f32) {
        for queue in &mut self.lanes[direction.index()] {
            for vehicle in queue.iter_mut() {
                vehicle.stop_position = stop;
            }
        }
    }

    /// Count one more waiting second for every uncrossed vehicle
    pub fn increment_waiting(&mut self) {
        for vehicle in self.lanes.iter_mut().flatten().flatten() {
            if !vehicle.is_crossed() {
                vehicle.waiting_secs += 1;
            }
        }
    }

    pub fn record_crossing(&mut self, direction: Direction) {
        self.crossed[direction.index()] += 1;
    }

    pub fn crossed_count(&self, direction: Direction) -> u64 {
        self.crossed[direction.index()]
    }

    pub fn total_crossed(&self) -> u64 {
        self.crossed.iter().sum()
    }
}
