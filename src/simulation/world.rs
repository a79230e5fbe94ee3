//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the registry, scheduler, clock and metrics. Every task of
//! a run works through its methods, so one lock around a `SimWorld` is enough
//! to serialise all mutation.

use log::{debug, warn};

use super::clock::SimClock;
use super::config::SimParams;
use super::generator::VehicleGenerator;
use super::metrics::{MetricsAggregator, MetricsReport};
use super::motion::{self, AdvanceResult};
use super::registry::WorldRegistry;
use super::scheduler::{SignalScheduler, TickOutcome};
use super::signal::PhaseSnapshot;
use super::snapshot::{SignalView, VehicleView, WorldSnapshot};
use super::types::{Direction, VehicleId, LANES_PER_APPROACH};
use super::vehicle::VehicleSpawn;

/// Counts from one motion frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSummary {
    pub moved: usize,
    pub crossed: usize,
    pub exited: usize,
    /// Vehicles skipped because they vanished from their lane mid-frame
    pub stale: usize,
}

/// The main simulation world
pub struct SimWorld {
    params: SimParams,
    pub registry: WorldRegistry,
    pub scheduler: SignalScheduler,
    pub clock: SimClock,
    pub metrics: MetricsAggregator,
    generator: VehicleGenerator,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new(SimParams::default())
    }
}

impl SimWorld {
    fn new_internal(params: SimParams, generator: VehicleGenerator) -> Self {
        Self {
            registry: WorldRegistry::new(),
            scheduler: SignalScheduler::new(params.signal),
            clock: SimClock::new(params.duration_secs),
            metrics: MetricsAggregator::new(),
            generator,
            params,
        }
    }

    pub fn new(params: SimParams) -> Self {
        let generator = VehicleGenerator::new(&params);
        Self::new_internal(params, generator)
    }

    /// Create a world whose generator is seeded for reproducible runs
    pub fn new_with_seed(params: SimParams, seed: u64) -> Self {
        let generator = VehicleGenerator::new_with_seed(seed, &params);
        Self::new_internal(params, generator)
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    /// Phase state for the current tick
    pub fn phase_snapshot(&self) -> PhaseSnapshot {
        self.scheduler.snapshot(self.clock.elapsed())
    }

    /// Insert a specific vehicle at the tail of its lane
    pub fn spawn_vehicle(&mut self, spawn: VehicleSpawn) -> VehicleId {
        let id = self
            .registry
            .insert(spawn, &self.params, self.clock.elapsed());
        self.metrics.record_spawn(spawn.class);
        debug!(
            "Spawned {} {:?} on {} lane {}{}",
            spawn.class,
            id,
            spawn.direction,
            spawn.lane,
            if spawn.will_turn { " (turning)" } else { "" }
        );
        id
    }

    /// Let the generator pick and insert the next vehicle
    pub fn spawn_random_vehicle(&mut self) -> VehicleId {
        let spawn = self.generator.next_spawn();
        self.spawn_vehicle(spawn)
    }

    /// Run one motion frame against the current phase
    pub fn step_frame(&mut self) -> FrameSummary {
        let phase = self.phase_snapshot();
        self.advance_vehicles(&phase)
    }

    /// Run one motion frame against an explicit phase snapshot.
    ///
    /// Vehicles are visited lane by lane in queue order, each one seeing the
    /// already-updated vehicles ahead of it.
    pub fn advance_vehicles(&mut self, phase: &PhaseSnapshot) -> FrameSummary {
        let mut summary = FrameSummary::default();

        for direction in Direction::ALL {
            for lane in 0..LANES_PER_APPROACH {
                let ids: Vec<VehicleId> = self
                    .registry
                    .lane(direction, lane)
                    .iter()
                    .map(|vehicle| vehicle.id)
                    .collect();

                for id in ids {
                    match self.advance_vehicle(direction, lane, id, phase) {
                        Some(result) => {
                            summary.moved += usize::from(result.moved);
                            summary.crossed += usize::from(result.crossing.is_some());
                            summary.exited += usize::from(result.exited);
                        }
                        None => summary.stale += 1,
                    }
                }
            }
        }

        summary
    }

    /// Advance one vehicle; `None` when it is no longer in its lane
    fn advance_vehicle(
        &mut self,
        direction: Direction,
        lane: usize,
        id: VehicleId,
        phase: &PhaseSnapshot,
    ) -> Option<AdvanceResult> {
        let Some(index) = self.registry.index_of(direction, lane, id) else {
            warn!("Vehicle {:?} left {} lane {} before it could move", id, direction, lane);
            return None;
        };

        let queue = self.registry.lane_mut(direction, lane);
        let (ahead, rest) = queue.split_at_mut(index);
        let vehicle = rest.first_mut()?;
        let result = motion::advance(vehicle, ahead, phase, &self.params);

        if let Some(event) = result.crossing {
            self.registry.record_crossing(direction);
            self.metrics.record_crossing(&event);
        }
        if result.exited {
            self.registry.remove(direction, lane, id);
        }
        Some(result)
    }

    /// Advance the clock by one second and age every waiting vehicle
    pub fn advance_clock(&mut self) -> u64 {
        let tick = self.clock.tick();
        self.registry.increment_waiting();
        tick
    }

    /// One scheduler tick at the current clock value
    pub fn step_scheduler(&mut self) -> TickOutcome {
        let now = self.clock.elapsed();
        self.scheduler.tick(&mut self.registry, &self.params, now)
    }

    /// Compute and store the look-ahead green estimate for an approach
    pub fn run_look_ahead(&mut self, approach: Direction) -> u32 {
        let green_secs = self
            .scheduler
            .estimate_green_time(approach, &self.registry, &self.params);
        self.scheduler.apply_look_ahead(approach, green_secs);
        debug!("Look-ahead green time for {}: {}s", approach, green_secs);
        green_secs
    }

    pub fn report(&self) -> MetricsReport {
        self.metrics.report(self.clock.elapsed())
    }

    /// Copy out everything a renderer reads
    pub fn snapshot(&self) -> WorldSnapshot {
        let signals = Direction::ALL
            .iter()
            .map(|&approach| {
                let signal = self.scheduler.signal(approach);
                let phase = self.scheduler.phase_of(approach);
                SignalView {
                    approach,
                    phase,
                    red: signal.red,
                    yellow: signal.yellow,
                    green: signal.green,
                    total_green: signal.total_green,
                    waiting: self.registry.waiting_count(approach),
                    crossed: self.registry.crossed_count(approach),
                    text: signal.display_text(phase),
                }
            })
            .collect();

        let vehicles = self
            .registry
            .vehicles()
            .map(|vehicle| VehicleView {
                id: vehicle.id,
                class: vehicle.class,
                direction: vehicle.direction,
                lane: vehicle.lane,
                position: vehicle.position,
                rotation: vehicle.rotation_angle(),
                heading: vehicle.heading(),
                crossed: vehicle.is_crossed(),
            })
            .collect();

        WorldSnapshot {
            tick: self.clock.elapsed(),
            scene: self.params.scene,
            signals,
            vehicles,
        }
    }
}

impl std::ops::AddAssign for FrameSummary {
    fn add_assign(&mut self, other: Self) {
        self.moved += other.moved;
        self.crossed += other.crossed;
        self.exited += other.exited;
        self.stale += other.stale;
    }
}
