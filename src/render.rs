//! Text rendering of world snapshots
//!
//! Read-only: everything here works from a `WorldSnapshot` copied out of the
//! world, never from the live state.

use std::fmt::Write;

use crate::simulation::{Direction, SignalPhase, SimParams, WorldSnapshot};

/// Characters per row of the rendered map
pub const MAP_COLUMNS: usize = 70;

/// One status line per signal, in approach order
pub fn render_signal_table(snapshot: &WorldSnapshot) -> String {
    let mut out = String::new();
    for (index, view) in snapshot.signals.iter().enumerate() {
        let label = match view.phase {
            SignalPhase::Green => " GREEN",
            SignalPhase::Yellow => "YELLOW",
            SignalPhase::Red => "   RED",
        };
        let _ = writeln!(
            out,
            "{} TS{} ({:<5}) -> r:{:<3} y:{:<2} g:{:<2} [{:>4}] waiting: {:<3} crossed: {}",
            label,
            index + 1,
            view.approach.name(),
            view.red,
            view.yellow,
            view.green,
            view.text,
            view.waiting,
            view.crossed
        );
    }
    out
}

/// Coarse ASCII map of the scene with stop lines and vehicles
pub fn render_map(snapshot: &WorldSnapshot, params: &SimParams) -> String {
    let columns = MAP_COLUMNS;
    let scale = snapshot.scene.width / columns as f32;
    let rows = ((snapshot.scene.height / scale).ceil() as usize / 2).max(1);
    // Characters are roughly twice as tall as they are wide
    let row_scale = snapshot.scene.height / rows as f32;

    let to_cell = |x: f32, y: f32| -> Option<(usize, usize)> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let col = (x / scale) as usize;
        let row = (y / row_scale) as usize;
        (col < columns && row < rows).then_some((row, col))
    };

    let mut grid = vec![vec![' '; columns]; rows];

    for direction in Direction::ALL {
        let geometry = params.approach(direction);
        for spawn in geometry.spawn {
            let cell = match direction {
                Direction::Right | Direction::Left => to_cell(geometry.stop_line, spawn.y),
                Direction::Down | Direction::Up => to_cell(spawn.x, geometry.stop_line),
            };
            if let Some((row, col)) = cell {
                grid[row][col] = match direction {
                    Direction::Right | Direction::Left => '|',
                    Direction::Down | Direction::Up => '-',
                };
            }
        }
    }

    for vehicle in &snapshot.vehicles {
        if let Some((row, col)) = to_cell(vehicle.position.x, vehicle.position.y) {
            grid[row][col] = vehicle.class.glyph();
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "=== Intersection at t={}s ===", snapshot.tick);
    let _ = writeln!(
        out,
        "Legend: c=Car b=Bike r=Rickshaw B=Bus T=Truck E=Emergency |,-=Stop line"
    );
    let border: String = std::iter::repeat('#').take(columns + 2).collect();
    let _ = writeln!(out, "{}", border);
    for row in &grid {
        let line: String = row.iter().collect();
        let _ = writeln!(out, "#{}#", line);
    }
    let _ = writeln!(out, "{}", border);
    out.push_str(&render_signal_table(snapshot));
    out
}
