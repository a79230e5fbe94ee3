//! Drivers for a full simulation run
//!
//! `LockstepRunner` advances every component in a fixed order on one thread.
//! `run_threaded` runs clock, scheduler, generator and frame loop as separate
//! tasks paced by the wall clock, all sharing one locked `SimWorld`.

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::render::render_map;
use crate::simulation::{
    Direction, FrameSummary, MetricsReport, SimWorld, TickOutcome, MIN_SPAWN_INTERVAL_SECS,
};

/// Pacing and display options shared by both drivers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Motion frames per simulated second
    pub frames_per_second: u32,
    /// Simulated seconds per wall-clock second (threaded driver only)
    pub time_scale: f64,
    /// Print the map every this many simulated seconds
    pub map_every: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            frames_per_second: 60,
            time_scale: 1.0,
            map_every: None,
        }
    }
}

/// What happened during one lockstep second
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SecondSummary {
    pub tick: u64,
    pub frames: FrameSummary,
    pub spawned: usize,
    pub scheduler: TickOutcome,
}

/// Deterministic single-threaded driver.
///
/// Each simulated second runs all motion frames (with the generator firing on
/// its interval), then the clock tick, then the scheduler tick. Motion
/// therefore always sees the phase that was in effect for the whole second.
pub struct LockstepRunner {
    world: SimWorld,
    options: RunOptions,
    /// Seconds accumulated towards the next spawn
    spawn_clock: f32,
}

impl LockstepRunner {
    pub fn new(world: SimWorld, options: RunOptions) -> Self {
        // Start full so the first frame spawns immediately
        let spawn_clock = world.params().spawn_interval_secs;
        Self {
            world,
            options,
            spawn_clock,
        }
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SimWorld {
        &mut self.world
    }

    pub fn into_world(self) -> SimWorld {
        self.world
    }

    pub fn is_finished(&self) -> bool {
        self.world.is_finished()
    }

    pub fn step_second(&mut self) -> SecondSummary {
        let frames_per_second = self.options.frames_per_second.max(1);
        let frame_secs = 1.0 / frames_per_second as f32;
        let interval = self
            .world
            .params()
            .spawn_interval_secs
            .max(MIN_SPAWN_INTERVAL_SECS);

        let mut summary = SecondSummary::default();
        for _ in 0..frames_per_second {
            self.spawn_clock += frame_secs;
            while self.spawn_clock >= interval {
                self.spawn_clock -= interval;
                self.world.spawn_random_vehicle();
                summary.spawned += 1;
            }
            summary.frames += self.world.step_frame();
        }

        summary.tick = self.world.advance_clock();
        summary.scheduler = self.world.step_scheduler();
        if let Some(approach) = summary.scheduler.look_ahead {
            self.world.run_look_ahead(approach);
        }

        if let Some(every) = self.options.map_every {
            if every > 0 && summary.tick % every == 0 {
                println!("{}", render_map(&self.world.snapshot(), self.world.params()));
            }
        }

        summary
    }

    /// Run until the clock reaches the configured duration
    pub fn run(mut self) -> MetricsReport {
        while !self.is_finished() {
            self.step_second();
        }
        self.world.report()
    }
}

fn lock_world(shared: &Mutex<SimWorld>) -> Result<MutexGuard<'_, SimWorld>> {
    shared
        .lock()
        .map_err(|_| anyhow!("Simulation state lock poisoned"))
}

/// Wall-clock duration of `secs` simulated seconds
fn scaled(secs: f64, time_scale: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs / time_scale).with_context(|| {
        format!(
            "time scale {} gives an unusable sleep for {}s of simulated time",
            time_scale, secs
        )
    })
}

/// Wall-clock driver with one thread per task.
///
/// The run ends when the clock task reaches the configured duration; every
/// other task polls the shared stop flag between sleeps and exits on its own.
pub fn run_threaded(world: SimWorld, options: RunOptions) -> Result<MetricsReport> {
    if !(options.time_scale > 0.0) {
        bail!("time scale must be positive, got {}", options.time_scale);
    }
    let frames_per_second = options.frames_per_second.max(1);
    let second = scaled(1.0, options.time_scale)?;
    let spawn_interval = scaled(
        f64::from(world.params().spawn_interval_secs),
        options.time_scale,
    )?;
    let frame = scaled(1.0 / f64::from(frames_per_second), options.time_scale)?;

    let shared = Arc::new(Mutex::new(world));
    let stop = Arc::new(AtomicBool::new(false));
    // Taken under the same lock that ends the run, so later task iterations
    // cannot leak into it
    let final_report: Arc<Mutex<Option<MetricsReport>>> = Arc::new(Mutex::new(None));

    let clock_task = {
        let shared = Arc::clone(&shared);
        let stop = Arc::clone(&stop);
        let final_report = Arc::clone(&final_report);
        move || {
            while !stop.load(Ordering::Acquire) {
                thread::sleep(second);
                let Ok(mut world) = shared.lock() else {
                    stop.store(true, Ordering::Release);
                    break;
                };
                let tick = world.advance_clock();
                if world.is_finished() {
                    info!("Clock reached {}s; ending run", tick);
                    if let Ok(mut slot) = final_report.lock() {
                        *slot = Some(world.report());
                    }
                    stop.store(true, Ordering::Release);
                    break;
                }
            }
        }
    };

    let scheduler_task = {
        let shared = Arc::clone(&shared);
        let stop = Arc::clone(&stop);
        move || {
            while !stop.load(Ordering::Acquire) {
                let outcome = match shared.lock() {
                    Ok(mut world) => world.step_scheduler(),
                    Err(_) => {
                        stop.store(true, Ordering::Release);
                        break;
                    }
                };
                if let Some(approach) = outcome.look_ahead {
                    spawn_look_ahead(Arc::clone(&shared), approach);
                }
                thread::sleep(second);
            }
        }
    };

    let generator_task = {
        let shared = Arc::clone(&shared);
        let stop = Arc::clone(&stop);
        move || {
            while !stop.load(Ordering::Acquire) {
                match shared.lock() {
                    Ok(mut world) => {
                        world.spawn_random_vehicle();
                    }
                    Err(_) => {
                        stop.store(true, Ordering::Release);
                        break;
                    }
                }
                thread::sleep(spawn_interval);
            }
        }
    };

    let tasks: [(&str, Box<dyn FnOnce() + Send>); 3] = [
        ("clock", Box::new(clock_task)),
        ("scheduler", Box::new(scheduler_task)),
        ("generator", Box::new(generator_task)),
    ];
    for (name, task) in tasks {
        if let Err(err) = thread::Builder::new().name(name.to_string()).spawn(task) {
            stop.store(true, Ordering::Release);
            return Err(err).with_context(|| format!("Failed to start {} task", name));
        }
    }

    let frames = frame_loop(&shared, &stop, frame, options.map_every);
    stop.store(true, Ordering::Release);
    let frames = frames?;
    debug!("Frame loop finished after {} frames", frames);

    let report = final_report
        .lock()
        .map_err(|_| anyhow!("Final report lock poisoned"))?
        .take();
    if let Some(report) = report {
        return Ok(report);
    }
    let world = lock_world(&shared)?;
    let report = world.report();
    Ok(report)
}

/// Detached one-shot look-ahead computation
fn spawn_look_ahead(shared: Arc<Mutex<SimWorld>>, approach: Direction) {
    let spawned = thread::Builder::new()
        .name("detection".to_string())
        .spawn(move || {
            let Ok(mut world) = shared.lock() else {
                warn!("Skipping look-ahead for {}: state lock poisoned", approach);
                return;
            };
            world.run_look_ahead(approach);
        });
    if let Err(err) = spawned {
        warn!("Failed to start look-ahead for {}: {}", approach, err);
    }
}

/// Motion and rendering on the calling thread; returns the frame count
fn frame_loop(
    shared: &Mutex<SimWorld>,
    stop: &AtomicBool,
    frame: Duration,
    map_every: Option<u64>,
) -> Result<u64> {
    let mut frames = 0;
    let mut last_map_tick = 0;

    while !stop.load(Ordering::Acquire) {
        {
            let mut world = lock_world(shared)?;
            world.step_frame();
            frames += 1;

            if let Some(every) = map_every.filter(|&every| every > 0) {
                let tick = world.clock.elapsed();
                if tick >= last_map_tick + every {
                    last_map_tick = tick;
                    println!("{}", render_map(&world.snapshot(), world.params()));
                }
            }
        }
        thread::sleep(frame);
    }

    Ok(frames)
}
