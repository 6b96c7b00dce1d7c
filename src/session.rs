use std::time::Duration;

use crate::geometry::{Point, Position, Rect, Size};
use crate::placement::{clamp_into, place_target, RandomSource};
use crate::runtime::{Clock, Scheduler, TimerHandle};
use crate::stopwatch::Lap;

/// Hits needed to finish a round
pub const HITS_TO_FINISH: u32 = 10;
pub const DEFAULT_TICK: Duration = Duration::from_millis(10);
pub const DEFAULT_TARGET_SIZE: Size = Size {
    width: 6,
    height: 3,
};

pub const START_LABEL: &str = "Start";
pub const STOP_LABEL: &str = "Stop";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub target_size: Size,
    pub tick_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            tick_interval: DEFAULT_TICK,
        }
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub phase: Phase,
    pub instructions_visible: bool,
    pub button_visible: bool,
    pub counter_visible: bool,
    pub target_visible: bool,
    pub button_label: &'static str,
    pub counter_text: String,
    pub elapsed_text: String,
    pub best_text: Option<String>,
    pub target_position: Option<Position>,
    pub target_size: Size,
    pub new_record: bool,
}

/// One player's game: phase machine, tap counters, stopwatch and record.
///
/// All operations are plain no-ops when called in a phase where they make no sense.
pub struct GameSession<S: Scheduler, R: RandomSource, C: Clock> {
    phase: Phase,
    tap_hits: u32,
    tap_misses: u32,
    lap: Lap,
    // record key of the current round, see `Lap::score`
    my_time: u32,
    best_score: Option<u32>,
    best_label: Option<String>,
    new_record: bool,
    target: Option<Position>,
    target_size: Size,
    viewport: Size,
    tick_interval: Duration,
    started_at: Duration,
    timer: Option<TimerHandle>,
    scheduler: S,
    rng: R,
    clock: C,
}

impl<S: Scheduler, R: RandomSource, C: Clock> GameSession<S, R, C> {
    pub fn new(scheduler: S, rng: R, clock: C, viewport: Size, settings: SessionSettings) -> Self {
        Self {
            phase: Phase::Idle,
            tap_hits: 0,
            tap_misses: 0,
            lap: Lap::default(),
            my_time: 0,
            best_score: None,
            best_label: None,
            new_record: false,
            target: None,
            target_size: settings.target_size,
            viewport: viewport.sanitized(),
            tick_interval: settings.tick_interval,
            started_at: Duration::ZERO,
            timer: None,
            scheduler,
            rng,
            clock,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tap_hits(&self) -> u32 {
        self.tap_hits
    }

    pub fn tap_misses(&self) -> u32 {
        self.tap_misses
    }

    pub fn elapsed_centiseconds(&self) -> u32 {
        self.lap.total_centiseconds()
    }

    pub fn my_time(&self) -> u32 {
        self.my_time
    }

    pub fn best_score(&self) -> Option<u32> {
        self.best_score
    }

    pub fn best_label(&self) -> Option<&str> {
        self.best_label.as_deref()
    }

    pub fn new_record(&self) -> bool {
        self.new_record
    }

    pub fn target(&self) -> Option<Position> {
        self.target
    }

    pub fn target_size(&self) -> Size {
        self.target_size
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn clock_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn counter_text(&self) -> String {
        format!("{}/{}", self.tap_hits, self.tap_hits + self.tap_misses)
    }

    pub fn elapsed_text(&self) -> String {
        self.lap.label()
    }

    pub fn request_start(&mut self) {
        if self.phase == Phase::Running {
            return;
        }

        self.tap_hits = 0;
        self.tap_misses = 0;
        self.lap = Lap::default();
        self.new_record = false;

        self.relocate_target();
        self.timer = Some(self.scheduler.schedule(self.tick_interval));
        self.started_at = self.clock.now();
        self.phase = Phase::Running;

        log::info!(
            "round started, target at {:?} in {}x{}",
            self.target,
            self.viewport.width,
            self.viewport.height
        );
    }

    pub fn request_stop(&mut self) {
        if self.phase != Phase::Running {
            return;
        }

        if let Some(handle) = self.timer.take() {
            self.scheduler.cancel(handle);
        }
        self.sample_clock();

        // only a round that reached the hit count competes for the record
        let completed = self.tap_hits >= HITS_TO_FINISH;
        let is_record = completed && self.best_score.map_or(true, |best| self.my_time < best);
        if is_record {
            self.best_score = Some(self.my_time);
            self.best_label = Some(self.lap.label());
            self.new_record = true;
            log::info!("new record {} (score {})", self.lap.label(), self.my_time);
        }

        self.phase = Phase::Finished;
        log::info!(
            "round finished in {} with {}",
            self.lap.label(),
            self.counter_text()
        );
    }

    /// The start/stop button: starts unless a round is running, then stops it
    pub fn toggle(&mut self) {
        log::debug!("start/stop pressed while {}", self.phase);
        if self.phase == Phase::Running {
            self.request_stop();
        } else {
            self.request_start();
        }
    }

    /// Classifies and counts a tap. Returns whether it hit the target.
    ///
    /// The tenth hit finishes the round before returning.
    pub fn on_tap(&mut self, point: Point) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        let Some(origin) = self.target else {
            return false;
        };

        if Rect::new(origin, self.target_size).contains_strict(point) {
            self.tap_hits += 1;
            log::debug!("hit at ({:.1}, {:.1}): {}", point.x, point.y, self.counter_text());
            if self.tap_hits == HITS_TO_FINISH {
                self.request_stop();
            }
            true
        } else {
            self.tap_misses += 1;
            log::debug!("miss at ({:.1}, {:.1}): {}", point.x, point.y, self.counter_text());
            false
        }
    }

    /// Host-side tap handling: counts the tap and moves the target after a hit that did not end the round
    pub fn tap(&mut self, point: Point) -> bool {
        let hit = self.on_tap(point);
        if hit && self.phase == Phase::Running {
            self.relocate_target();
        }
        hit
    }

    pub fn on_clock_tick(&mut self) {
        if self.phase != Phase::Running {
            return;
        }

        self.sample_clock();
        log::trace!("tick {}", self.lap.label());
    }

    fn sample_clock(&mut self) {
        let elapsed = self.clock.now().saturating_sub(self.started_at);
        self.lap = Lap::from_duration(elapsed);
        self.my_time = self.lap.score();
    }

    pub fn on_viewport_change(&mut self, viewport: Size) {
        self.viewport = viewport.sanitized();
        if let Some(target) = self.target {
            self.target = Some(clamp_into(target, self.viewport, self.target_size));
        }
        log::debug!(
            "viewport now {}x{}, target {:?}",
            self.viewport.width,
            self.viewport.height,
            self.target
        );
    }

    pub fn relocate_target(&mut self) {
        let position = place_target(&mut self.rng, self.viewport, self.target_size);
        log::debug!("target moved to ({}, {})", position.x, position.y);
        self.target = Some(position);
    }

    pub fn view(&self) -> SessionView {
        let running = self.phase == Phase::Running;
        SessionView {
            phase: self.phase,
            instructions_visible: !running,
            button_visible: true,
            counter_visible: self.phase != Phase::Idle,
            target_visible: running && self.target.is_some(),
            button_label: if running { STOP_LABEL } else { START_LABEL },
            counter_text: self.counter_text(),
            elapsed_text: self.elapsed_text(),
            best_text: self.best_label.clone(),
            target_position: self.target,
            target_size: self.target_size,
            new_record: self.new_record,
        }
    }
}
