//! Adaptive signal scheduler
//!
//! Serves one approach at a time through GREEN then YELLOW. At each cycle
//! boundary the next approach is picked either by emergency override or by
//! priority score, and its green time is sized from the queue length.

use log::{debug, info};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

use super::config::{SignalTiming, SimParams};
use super::registry::WorldRegistry;
use super::signal::{PhaseSnapshot, SignalPhase, SimSignal};
use super::types::{Direction, VehicleClass, APPROACH_COUNT};
use super::vehicle::SimVehicle;

/// Weight of seconds-since-served in the priority score
pub const WAIT_WEIGHT: f64 = 0.2;

/// Base seconds of the nonlinear green sizing formula
pub const GREEN_BASE_SECS: f64 = 8.0;

/// Per-vehicle coefficient of the nonlinear green sizing formula
pub const GREEN_COEFFICIENT: f64 = 1.0;

/// Exponent applied to the waiting count when sizing green time
pub const GREEN_EXPONENT: f64 = 0.85;

/// Priority score for an approach in normal (non-emergency) selection
pub fn priority_score(waiting: usize, secs_since_served: u64) -> f64 {
    waiting as f64 + WAIT_WEIGHT * secs_since_served as f64
}

/// `round(8 + waiting^0.85)` clamped to `[min_green, max_green]`
pub fn green_for_waiting(waiting: usize, min_green: u32, max_green: u32) -> u32 {
    let raw = GREEN_BASE_SECS + GREEN_COEFFICIENT * (waiting as f64).powf(GREEN_EXPONENT);
    // `as` saturates, so huge queues still land on max_green
    (raw.round() as u32).clamp(min_green, max_green)
}

/// Arrival-order proxy for an emergency vehicle: remaining distance from its
/// leading edge to the stop line, so nearer vehicles compare smaller.
pub fn arrival_proxy(vehicle: &SimVehicle, params: &SimParams) -> f32 {
    let direction = vehicle.direction;
    let stop_line = params.approach(direction).stop_line;
    direction.sign() * (stop_line - vehicle.leading_edge(direction))
}

/// Why an approach was chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    Emergency { approach: Direction, proxy: f32 },
    Priority { approach: Direction, score: f64 },
}

impl Selection {
    pub fn approach(&self) -> Direction {
        match *self {
            Selection::Emergency { approach, .. } | Selection::Priority { approach, .. } => {
                approach
            }
        }
    }
}

/// Where the scheduler is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Every approach is RED; the next tick attempts a selection
    Idle,
    Serving {
        approach: Direction,
        phase: SignalPhase,
    },
}

/// What happened during one scheduler tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    /// A new cycle started this tick
    pub selection: Option<Selection>,
    /// Green seconds assigned to the selected approach
    pub green_secs: Option<u32>,
    /// No approach had waiting vehicles
    pub idled: bool,
    /// The approach that entered YELLOW this tick
    pub entered_yellow: Option<Direction>,
    /// Approach whose green should now be estimated by the look-ahead
    pub look_ahead: Option<Direction>,
}

#[derive(Debug, Clone)]
pub struct SignalScheduler {
    signals: [SimSignal; APPROACH_COUNT],
    state: CycleState,
    last_served: [u64; APPROACH_COUNT],
    timing: SignalTiming,
}

impl SignalScheduler {
    /// Create the four signals with staggered red offsets
    pub fn new(timing: SignalTiming) -> Self {
        let second_offset = timing.default_yellow + timing.default_green;
        let signals = [
            SimSignal::new(0, &timing),
            SimSignal::new(second_offset, &timing),
            SimSignal::new(timing.default_red, &timing),
            SimSignal::new(timing.default_red, &timing),
        ];
        Self {
            signals,
            state: CycleState::Idle,
            last_served: [0; APPROACH_COUNT],
            timing,
        }
    }

    pub fn signal(&self, approach: Direction) -> &SimSignal {
        &self.signals[approach.index()]
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn phase_of(&self, approach: Direction) -> SignalPhase {
        match self.state {
            CycleState::Serving {
                approach: active,
                phase,
            } if active == approach => phase,
            _ => SignalPhase::Red,
        }
    }

    pub fn snapshot(&self, tick: u64) -> PhaseSnapshot {
        match self.state {
            CycleState::Idle => PhaseSnapshot::all_red(tick),
            CycleState::Serving { approach, phase } => {
                PhaseSnapshot::serving(tick, approach, phase)
            }
        }
    }

    /// Tick at which an approach last turned GREEN
    pub fn last_served(&self, approach: Direction) -> u64 {
        self.last_served[approach.index()]
    }

    pub fn mark_served(&mut self, approach: Direction, tick: u64) {
        self.last_served[approach.index()] = tick;
    }

    /// Pick the approach to serve next, or `None` if nothing is waiting.
    ///
    /// The nearest uncrossed emergency vehicle overrides everything. Otherwise
    /// the strictly highest priority score wins, ties going to the lowest index.
    pub fn select_next_approach(
        &self,
        registry: &WorldRegistry,
        params: &SimParams,
        now: u64,
    ) -> Option<Selection> {
        let emergency = registry
            .uncrossed_emergencies()
            .map(|vehicle| (vehicle.direction, arrival_proxy(vehicle, params)))
            .min_by_key(|&(direction, proxy)| (OrderedFloat(proxy), direction.index()));
        if let Some((approach, proxy)) = emergency {
            return Some(Selection::Emergency { approach, proxy });
        }

        Direction::ALL
            .iter()
            .filter_map(|&direction| {
                let waiting = registry.waiting_count(direction);
                if waiting == 0 {
                    return None;
                }
                let since = now.saturating_sub(self.last_served(direction));
                Some((direction, priority_score(waiting, since)))
            })
            .max_by_key(|&(direction, score)| (OrderedFloat(score), Reverse(direction.index())))
            .map(|(approach, score)| Selection::Priority { approach, score })
    }

    /// Green seconds for an approach from its current waiting count
    pub fn size_green_for(&self, approach: Direction, registry: &WorldRegistry) -> u32 {
        let signal = self.signal(approach);
        green_for_waiting(
            registry.waiting_count(approach),
            signal.min_green,
            signal.max_green,
        )
    }

    /// Look-ahead estimate from per-class clearance times.
    ///
    /// Falls back to `min_green` when there is nothing to sample.
    pub fn estimate_green_time(
        &self,
        approach: Direction,
        registry: &WorldRegistry,
        params: &SimParams,
    ) -> u32 {
        let signal = self.signal(approach);
        let counts = registry.waiting_by_class(approach);
        if counts.iter().all(|&count| count == 0) {
            debug!(
                "Look-ahead for {} found no waiting vehicles; using minimum green {}s",
                approach, signal.min_green
            );
            return signal.min_green;
        }

        let total: f64 = VehicleClass::ALL
            .iter()
            .map(|&class| counts[class.index()] as f64 * params.class(class).clearance_secs as f64)
            .sum();
        let divisor = f64::from(params.detection_lane_count) + 1.0;
        let estimate = (total / divisor).ceil();
        if !estimate.is_finite() {
            return signal.min_green;
        }
        signal.clamp_green(estimate as u32)
    }

    /// Store a look-ahead estimate as the approach's pending green
    pub fn apply_look_ahead(&mut self, approach: Direction, green_secs: u32) {
        self.signals[approach.index()].green = green_secs;
    }

    /// Advance the phase state machine by one simulated second
    pub fn tick(
        &mut self,
        registry: &mut WorldRegistry,
        params: &SimParams,
        now: u64,
    ) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if self.state == CycleState::Idle {
            let Some(selection) = self.select_next_approach(registry, params, now) else {
                debug!("No approach has waiting vehicles; idling");
                outcome.idled = true;
                return outcome;
            };
            let green_secs = self.begin_cycle(selection, registry, now);
            outcome.selection = Some(selection);
            outcome.green_secs = Some(green_secs);
        }

        let CycleState::Serving { approach, phase } = self.state else {
            return outcome;
        };

        for direction in Direction::ALL {
            let signal = &mut self.signals[direction.index()];
            if direction == approach {
                match phase {
                    SignalPhase::Green => {
                        signal.green = signal.green.saturating_sub(1);
                        signal.total_green += 1;
                    }
                    SignalPhase::Yellow => signal.yellow = signal.yellow.saturating_sub(1),
                    SignalPhase::Red => {}
                }
            } else {
                signal.red = signal.red.saturating_sub(1);
            }
        }

        let next = approach.next();
        if phase == SignalPhase::Green && self.signal(next).red == self.timing.detection_time {
            outcome.look_ahead = Some(next);
        }

        match phase {
            SignalPhase::Green if self.signal(approach).green == 0 => {
                self.state = CycleState::Serving {
                    approach,
                    phase: SignalPhase::Yellow,
                };
                registry.reset_stop_positions(approach, params.approach(approach).default_stop);
                outcome.entered_yellow = Some(approach);
                debug!("Approach {} entered yellow", approach);
            }
            SignalPhase::Yellow if self.signal(approach).yellow == 0 => {
                let signal = &mut self.signals[approach.index()];
                signal.yellow = self.timing.default_yellow;
                signal.red = self.timing.default_red;
                self.state = CycleState::Idle;
            }
            _ => {}
        }

        outcome
    }

    fn begin_cycle(&mut self, selection: Selection, registry: &WorldRegistry, now: u64) -> u32 {
        let approach = selection.approach();
        let waiting = registry.waiting_count(approach);
        let since = now.saturating_sub(self.last_served(approach));

        match selection {
            Selection::Emergency { proxy, .. } => info!(
                "EMERGENCY PRIORITY: approach {} selected (nearest emergency {:.1} from stop line), waiting vehicles: {}, waited: {}s",
                approach, proxy, waiting, since
            ),
            Selection::Priority { score, .. } => info!(
                "Approach {} selected with priority {:.2}, waiting vehicles: {}, waited: {}s",
                approach, score, waiting, since
            ),
        }

        let green_secs = self.size_green_for(approach, registry);
        let signal = &mut self.signals[approach.index()];
        signal.red = self.timing.default_red;
        signal.green = green_secs;
        self.last_served[approach.index()] = now;
        self.state = CycleState::Serving {
            approach,
            phase: SignalPhase::Green,
        };

        info!(
            "Approach {} green time set to {}s for {} waiting vehicles",
            approach, green_secs, waiting
        );
        green_secs
    }
}
