//! Vehicle motion model
//!
//! One rule covers all four approaches. Each direction only contributes its
//! axis, sign and `ApproachGeometry`; the leading and trailing edges of a
//! vehicle are derived from its class dimensions and current heading.

use super::config::{ApproachGeometry, SimParams};
use super::signal::PhaseSnapshot;
use super::types::{Direction, VehicleId, EXIT_MARGIN, MOVING_GAP};
use super::vehicle::{SimVehicle, TurnState};

/// Emitted exactly once per vehicle, when it passes its stop line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossingEvent {
    pub vehicle: VehicleId,
    pub direction: Direction,
    pub spawn_tick: u64,
    pub cross_tick: u64,
}

impl CrossingEvent {
    pub fn wait_secs(&self) -> u64 {
        self.cross_tick.saturating_sub(self.spawn_tick)
    }
}

/// Result of advancing one vehicle by one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceResult {
    pub moved: bool,
    pub crossing: Option<CrossingEvent>,
    /// The vehicle has left the scene and must be removed from its lane
    pub exited: bool,
}

/// Advance a vehicle by at most one speed step.
///
/// `ahead` holds the vehicles spawned earlier in the same lane, oldest first;
/// only the last of them constrains this vehicle.
pub fn advance(
    vehicle: &mut SimVehicle,
    ahead: &[SimVehicle],
    phase: &PhaseSnapshot,
    params: &SimParams,
) -> AdvanceResult {
    let geometry = params.approach(vehicle.direction);
    let predecessor = ahead.last();

    let crossing = detect_crossing(vehicle, geometry, phase.tick);

    let moved = if vehicle.will_turn {
        turning_step(vehicle, predecessor, phase, geometry)
    } else {
        straight_step(vehicle, predecessor, phase)
    };

    let mid_turn = matches!(vehicle.turn(), TurnState::Turning { .. });
    let exited = vehicle.is_crossed() && !mid_turn && has_left_scene(vehicle, params);

    AdvanceResult {
        moved,
        crossing,
        exited,
    }
}

fn detect_crossing(
    vehicle: &mut SimVehicle,
    geometry: &ApproachGeometry,
    tick: u64,
) -> Option<CrossingEvent> {
    if vehicle.is_crossed() {
        return None;
    }
    let direction = vehicle.direction;
    let sign = direction.sign();
    if sign * vehicle.leading_edge(direction) <= sign * geometry.stop_line {
        return None;
    }
    if !vehicle.mark_crossed(tick) {
        return None;
    }
    Some(CrossingEvent {
        vehicle: vehicle.id,
        direction,
        spawn_tick: vehicle.spawn_tick,
        cross_tick: tick,
    })
}

fn straight_step(
    vehicle: &mut SimVehicle,
    predecessor: Option<&SimVehicle>,
    phase: &PhaseSnapshot,
) -> bool {
    if !may_advance_straight(vehicle, predecessor, phase) {
        return false;
    }
    vehicle.step_along(vehicle.direction);
    true
}

fn turning_step(
    vehicle: &mut SimVehicle,
    predecessor: Option<&SimVehicle>,
    phase: &PhaseSnapshot,
    geometry: &ApproachGeometry,
) -> bool {
    match vehicle.turn() {
        TurnState::NotTurning => {
            let direction = vehicle.direction;
            let sign = direction.sign();
            let reached_trigger =
                sign * vehicle.leading_edge(direction) >= sign * geometry.turn_trigger;
            if vehicle.is_crossed() && reached_trigger {
                vehicle.rotate_step(geometry.turn_step);
                true
            } else {
                straight_step(vehicle, predecessor, phase)
            }
        }
        // A vehicle already rotating always completes the turn
        TurnState::Turning { .. } => {
            vehicle.rotate_step(geometry.turn_step);
            true
        }
        TurnState::Turned => {
            let heading = vehicle.heading();
            let clear = match predecessor {
                None => true,
                Some(ahead) => {
                    gap_clear(vehicle, ahead, heading)
                        || gap_clear(vehicle, ahead, vehicle.direction)
                }
            };
            if clear {
                vehicle.step_along(heading);
            }
            clear
        }
    }
}

/// Signal and spacing gate for travel along the approach axis
fn may_advance_straight(
    vehicle: &SimVehicle,
    predecessor: Option<&SimVehicle>,
    phase: &PhaseSnapshot,
) -> bool {
    let direction = vehicle.direction;
    let sign = direction.sign();

    let within_stop =
        sign * vehicle.leading_edge(direction) + vehicle.speed() <= sign * vehicle.stop_position;
    let signal_allows = within_stop || vehicle.is_crossed() || phase.is_green(direction);
    if !signal_allows {
        return false;
    }

    match predecessor {
        None => true,
        Some(ahead) => ahead.is_turned() || gap_clear(vehicle, ahead, direction),
    }
}

/// Whether one more step along `direction` keeps `MOVING_GAP` behind `ahead`
fn gap_clear(vehicle: &SimVehicle, ahead: &SimVehicle, direction: Direction) -> bool {
    let sign = direction.sign();
    sign * vehicle.leading_edge(direction) + vehicle.speed() + MOVING_GAP
        <= sign * ahead.trailing_edge(direction)
}

fn has_left_scene(vehicle: &SimVehicle, params: &SimParams) -> bool {
    let heading = vehicle.heading();
    let trailing = vehicle.trailing_edge(heading);
    if heading.sign() > 0.0 {
        trailing > params.scene_extent(heading) + EXIT_MARGIN
    } else {
        trailing < -EXIT_MARGIN
    }
}
