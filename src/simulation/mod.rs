//! Four-approach intersection simulation
//!
//! This module contains the signal scheduler, the vehicle motion model and
//! the shared world they operate on. It has no rendering or windowing
//! dependencies and can be driven headless, single-threaded or by the
//! threaded runtime.

mod clock;
mod config;
mod generator;
mod metrics;
pub mod motion;
mod registry;
mod scheduler;
mod signal;
mod snapshot;
mod types;
mod vehicle;
mod world;

pub use clock::SimClock;
pub use config::{
    ApproachGeometry, ClassProfile, SceneBounds, SignalTiming, SimConfig, SimParams,
    MIN_SPAWN_INTERVAL_SECS,
};
pub use generator::VehicleGenerator;
pub use metrics::{MetricsAggregator, MetricsReport, WaitSummary};
pub use motion::{AdvanceResult, CrossingEvent};
pub use registry::WorldRegistry;
pub use scheduler::{
    arrival_proxy, green_for_waiting, priority_score, CycleState, Selection, SignalScheduler,
    TickOutcome, WAIT_WEIGHT,
};
pub use signal::{PhaseSnapshot, SignalPhase, SimSignal};
pub use snapshot::{SignalView, VehicleView, WorldSnapshot};
pub use types::{
    Axis, Direction, Position, VehicleClass, VehicleId, APPROACH_COUNT, EXIT_MARGIN,
    LANES_PER_APPROACH, MOVING_GAP, ROTATION_STEP, STOPPING_GAP, TURN_LANE,
};
pub use vehicle::{CrossingState, SimVehicle, TurnState, VehicleSpawn};
pub use world::{FrameSummary, SimWorld};
