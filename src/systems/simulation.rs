//! Frame simulation system
//!
//! Drives the physics world one frame at a time:
//! - Fixed-size physics steps, `substeps` per frame
//! - Wall-clock timing of the whole engine and of its contact share
//! - A timing report every `report_interval` frames

use std::time::{Duration, Instant};
use tri2d_physics::{PhysicsWorld, StepStats};

use crate::config::SimulationConfig;

/// Timing and contact totals over the frames since the last report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Frames covered by this report
    pub frames: u32,
    /// Average engine time per frame in milliseconds
    pub ms_per_frame: f64,
    /// Share of engine time spent sweeping and resolving contacts
    pub collision_percent: f64,
    /// Pairs handed to the narrow phase
    pub candidates: usize,
    /// Contacts resolved
    pub contacts: usize,
}

/// Manages the per-frame physics loop
pub struct SimulationSystem {
    step_time: f32,
    substeps: u32,
    report_interval: u32,
    frames: u32,
    engine_time: Duration,
    collision_time: Duration,
    stats: StepStats,
}

impl SimulationSystem {
    /// Create a new simulation system
    ///
    /// A non-positive step time falls back to the default.
    pub fn new(config: &SimulationConfig) -> Self {
        let step_time = if config.step_time.is_finite() && config.step_time > 0.0 {
            config.step_time
        } else {
            let fallback = SimulationConfig::default().step_time;
            log::warn!("Invalid step time {}, using {}", config.step_time, fallback);
            fallback
        };

        Self {
            step_time,
            substeps: config.substeps.max(1),
            report_interval: config.report_interval.max(1),
            frames: 0,
            engine_time: Duration::ZERO,
            collision_time: Duration::ZERO,
            stats: StepStats::default(),
        }
    }

    /// Physics time step in seconds
    pub fn step_time(&self) -> f32 {
        self.step_time
    }

    /// Run one frame
    ///
    /// Returns a report when this frame completes a reporting interval.
    pub fn update(&mut self, world: &mut PhysicsWorld) -> Option<FrameReport> {
        for _ in 0..self.substeps {
            let begin = Instant::now();
            world.integrate(self.step_time);
            world.rebuild_grid();

            let mid = Instant::now();
            self.stats += world.resolve_contacts();

            let end = Instant::now();
            self.engine_time += end - begin;
            self.collision_time += end - mid;
        }

        self.frames += 1;
        if self.frames < self.report_interval {
            return None;
        }

        let report = self.take_report();
        log::info!(
            "Engine: {:.3}ms per frame, collisions {:.1}% ({} contacts / {} candidates)",
            report.ms_per_frame,
            report.collision_percent,
            report.contacts,
            report.candidates
        );
        Some(report)
    }

    fn take_report(&mut self) -> FrameReport {
        let engine_secs = self.engine_time.as_secs_f64();
        let collision_percent = if engine_secs > 0.0 {
            self.collision_time.as_secs_f64() / engine_secs * 100.0
        } else {
            0.0
        };

        let report = FrameReport {
            frames: self.frames,
            ms_per_frame: engine_secs * 1000.0 / self.frames as f64,
            collision_percent,
            candidates: self.stats.candidates,
            contacts: self.stats.contacts,
        };

        self.frames = 0;
        self.engine_time = Duration::ZERO;
        self.collision_time = Duration::ZERO;
        self.stats = StepStats::default();
        report
    }
}

impl Default for SimulationSystem {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}
