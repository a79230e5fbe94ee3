//! Random vehicle generation

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand::SeedableRng;

use super::config::SimParams;
use super::types::{Direction, VehicleClass, LANES_PER_APPROACH, TURN_LANE};
use super::vehicle::VehicleSpawn;

/// Draws the class, approach, lane and turn intent of new vehicles
#[derive(Debug, Clone)]
pub struct VehicleGenerator {
    /// Optional seeded RNG for reproducible runs
    rng: Option<StdRng>,
    emergency_probability: f64,
    turn_probability: f64,
}

impl VehicleGenerator {
    pub fn new(params: &SimParams) -> Self {
        Self::new_internal(None, params)
    }

    pub fn new_with_seed(seed: u64, params: &SimParams) -> Self {
        Self::new_internal(Some(StdRng::seed_from_u64(seed)), params)
    }

    fn new_internal(rng: Option<StdRng>, params: &SimParams) -> Self {
        Self {
            rng,
            emergency_probability: params.emergency_probability,
            turn_probability: params.turn_probability,
        }
    }

    fn random_bool(&mut self, probability: f64) -> bool {
        match &mut self.rng {
            Some(rng) => rng.random_bool(probability),
            None => rand::rng().random_bool(probability),
        }
    }

    fn random_index(&mut self, len: usize) -> usize {
        match &mut self.rng {
            Some(rng) => rng.random_range(0..len),
            None => rand::rng().random_range(0..len),
        }
    }

    fn choose_class(&mut self) -> VehicleClass {
        let choice = match &mut self.rng {
            Some(rng) => VehicleClass::ORDINARY.choose(rng),
            None => VehicleClass::ORDINARY.choose(&mut rand::rng()),
        };
        choice.copied().unwrap_or(VehicleClass::Car)
    }

    /// Decide the next vehicle to create
    pub fn next_spawn(&mut self) -> VehicleSpawn {
        let class = if self.random_bool(self.emergency_probability) {
            VehicleClass::Emergency
        } else {
            self.choose_class()
        };
        let lane = self.random_index(LANES_PER_APPROACH);
        let direction = Direction::ALL[self.random_index(Direction::ALL.len())];
        let will_turn = lane == TURN_LANE && self.random_bool(self.turn_probability);

        VehicleSpawn {
            class,
            direction,
            lane,
            will_turn,
        }
    }
}
