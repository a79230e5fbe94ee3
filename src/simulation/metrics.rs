//! Run metrics: wait times and throughput
//!
//! The aggregator only observes spawn and crossing events; it never reads the
//! registry. `MetricsReport` is the structured end-of-run result.

use log::info;
use serde::Serialize;
use sorted_vec::SortedVec;
use std::collections::BTreeMap;

use super::motion::CrossingEvent;
use super::types::{Direction, VehicleClass, APPROACH_COUNT};

#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    /// Seconds from spawn to crossing, kept sorted for the median
    wait_times: SortedVec<u64>,
    wait_total: u64,
    crossed: [u64; APPROACH_COUNT],
    spawned: [u64; VehicleClass::COUNT],
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_spawn(&mut self, class: VehicleClass) {
        self.spawned[class.index()] += 1;
    }

    pub fn record_crossing(&mut self, event: &CrossingEvent) {
        let wait = event.wait_secs();
        self.wait_times.insert(wait);
        self.wait_total += wait;
        self.crossed[event.direction.index()] += 1;
    }

    pub fn crossed(&self, direction: Direction) -> u64 {
        self.crossed[direction.index()]
    }

    pub fn total_crossed(&self) -> u64 {
        self.crossed.iter().sum()
    }

    pub fn total_spawned(&self) -> u64 {
        self.spawned.iter().sum()
    }

    pub fn wait_samples(&self) -> usize {
        self.wait_times.len()
    }

    /// Build the end-of-run report for `elapsed` simulated seconds
    pub fn report(&self, elapsed: u64) -> MetricsReport {
        let total = self.total_crossed();
        let samples = self.wait_times.len();

        let wait = if samples == 0 {
            WaitSummary::NoData
        } else {
            WaitSummary::Measured {
                average: self.wait_total as f64 / samples as f64,
                max: self.wait_times.last().copied().unwrap_or_default(),
                median: self.wait_times[samples / 2],
            }
        };

        MetricsReport {
            approach_counts: Direction::ALL
                .iter()
                .map(|&direction| (direction, self.crossed(direction)))
                .collect(),
            total_vehicles_passed: total,
            total_time_passed: elapsed,
            vehicles_per_unit_time: if elapsed > 0 {
                total as f64 / elapsed as f64
            } else {
                0.0
            },
            waiting_time: wait,
            vehicles_spawned: self.total_spawned(),
            spawned_by_class: VehicleClass::ALL
                .iter()
                .map(|&class| (class, self.spawned[class.index()]))
                .collect(),
        }
    }
}

/// Wait-time statistics, or an explicit marker when nothing crossed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WaitSummary {
    NoData,
    Measured { average: f64, max: u64, median: u64 },
}

/// End-of-run report handed to the metrics sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub approach_counts: BTreeMap<Direction, u64>,
    pub total_vehicles_passed: u64,
    pub total_time_passed: u64,
    pub vehicles_per_unit_time: f64,
    pub waiting_time: WaitSummary,
    pub vehicles_spawned: u64,
    pub spawned_by_class: BTreeMap<VehicleClass, u64>,
}

impl MetricsReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Log the summary block read by operators and the CLI tests
    pub fn log_summary(&self) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Approach-wise vehicle counts");
        for (direction, count) in &self.approach_counts {
            info!("  {}: {}", direction, count);
        }
        info!("Total vehicles spawned: {}", self.vehicles_spawned);
        info!("Total vehicles passed: {}", self.total_vehicles_passed);
        info!("Total time passed: {}", self.total_time_passed);
        info!("Vehicles per unit time: {:.2}", self.vehicles_per_unit_time);
        match self.waiting_time {
            WaitSummary::Measured {
                average,
                max,
                median,
            } => {
                info!("Average waiting time: {:.2} s", average);
                info!("Median waiting time: {} s", median);
                info!("Max waiting time: {} s", max);
            }
            WaitSummary::NoData => info!("No vehicles crossed, so no waiting time data."),
        }
    }
}
