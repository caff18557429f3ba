//! # partyroom-tick
//!
//! The fixed-rate clock behind every running game.
//!
//! A room that starts a game creates one [`TickScheduler`] and awaits
//! [`TickScheduler::wait_for_tick`] inside its `select!` loop. Dropping the
//! scheduler is how a game stops ticking: there is no background task to
//! cancel, so a stopped game can never receive a late tick.
//!
//! ```text
//!   start_game ──→ TickScheduler::new ──→ wait_for_tick ──→ TickInfo
//!                                              ▲               │
//!                                              └── record_tick_end
//! ```
//!
//! Each [`TickInfo`] carries the fixed step `dt` and the time `elapsed`
//! since the scheduler was created, read from the clock on every tick so a
//! game's timer does not drift when ticks run late or are skipped.
//!
//! All timing uses `tokio::time`, so tests can run on a paused clock.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a tick fires late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrunPolicy {
    /// Schedule the next tick one step after *now*. Missed ticks are
    /// counted in [`TickInfo::ticks_skipped`] and never run.
    #[default]
    Skip,

    /// Keep the original schedule. If we are behind, the next ticks fire
    /// back to back until the schedule is met again.
    Drop,
}

/// Settings for one scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second. Clamped to `1..=MAX_TICK_RATE_HZ`.
    pub tick_rate_hz: u32,
    pub policy: OverrunPolicy,
    /// Fraction of the tick budget that triggers a warning when a single
    /// tick's work takes longer.
    pub budget_warn_threshold: f64,
    pub metrics_enabled: bool,
    /// Random delay (0..n µs) added before the first tick so rooms started
    /// in the same instant don't all tick together.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: Self::DEFAULT_TICK_RATE_HZ,
            policy: OverrunPolicy::default(),
            budget_warn_threshold: 0.8,
            metrics_enabled: true,
            initial_jitter_us: 0,
        }
    }
}

impl TickConfig {
    pub const DEFAULT_TICK_RATE_HZ: u32 = 30;
    pub const MAX_TICK_RATE_HZ: u32 = 120;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps every field into its valid range.
    pub fn validated(mut self) -> Self {
        let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            warn!(
                rate = self.tick_rate_hz,
                clamped, "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        if !self.budget_warn_threshold.is_finite() {
            self.budget_warn_threshold = 0.8;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Length of one tick. Assumes a validated (non-zero) rate.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }
}

// ---------------------------------------------------------------------------
// Per-tick info and metrics
// ---------------------------------------------------------------------------

/// Returned by every [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// 1 for the first tick, never reset.
    pub tick: u64,
    /// The fixed step.
    pub dt: Duration,
    /// Time since the scheduler was created, measured when the tick fired.
    pub elapsed: Duration,
    /// The tick fired more than 10% of a step late.
    pub overrun: bool,
    /// Ticks given up before this one under [`OverrunPolicy::Skip`].
    pub ticks_skipped: u64,
}

/// Running totals for one scheduler.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Exponential moving average of the work done per tick.
    pub avg_tick_time: Duration,
    pub max_tick_time: Duration,
    /// Work time of the last tick as a fraction of the tick budget.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// TickScheduler
// ---------------------------------------------------------------------------

pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    started_at: Instant,
    next_tick: Instant,
    tick_count: u64,
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a scheduler whose first tick is one step from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };
        let started_at = Instant::now();

        debug!(
            rate_hz = config.tick_rate_hz,
            budget_ms = tick_duration.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            next_tick: started_at + tick_duration + jitter,
            config,
            tick_duration,
            started_at,
            tick_count: 0,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    /// Sleeps until the next tick is due.
    ///
    /// Cancel-safe: if the future is dropped (e.g. another `select!` branch
    /// won), the schedule is untouched and the next call waits for the same
    /// deadline.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let due = self.next_tick;
        time::sleep_until(due).await;

        let now = Instant::now();
        self.tick_count += 1;
        self.tick_start = Some(now);

        let step = self.tick_duration;
        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > step / 10;
        let mut ticks_skipped = 0;

        self.next_tick = match self.config.policy {
            OverrunPolicy::Skip if overrun => {
                ticks_skipped = (late_by.as_nanos() / step.as_nanos()) as u64;
                if ticks_skipped > 0 {
                    warn!(
                        tick = self.tick_count,
                        skipped = ticks_skipped,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun, skipping ahead"
                    );
                }
                now + step
            }
            OverrunPolicy::Drop if overrun => {
                warn!(
                    tick = self.tick_count,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "tick overrun, keeping schedule"
                );
                due + step
            }
            _ => due + step,
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: step,
            elapsed: now.saturating_duration_since(self.started_at),
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the work for the current tick and updates metrics.
    ///
    /// Without a preceding [`wait_for_tick`](Self::wait_for_tick) this does
    /// nothing.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let spent = start.elapsed();

        let utilization = spent.as_secs_f64() / self.tick_duration.as_secs_f64();
        self.metrics.budget_utilization = utilization;
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                spent_ms = spent.as_secs_f64() * 1000.0,
                budget_ms = self.tick_duration.as_secs_f64() * 1000.0,
                "tick work near or over budget"
            );
        }

        if self.config.metrics_enabled {
            self.metrics.max_tick_time = self.metrics.max_tick_time.max(spent);
            let alpha = 0.1;
            let avg = self.metrics.avg_tick_time.as_secs_f64() * (1.0 - alpha)
                + spent.as_secs_f64() * alpha;
            self.metrics.avg_tick_time = Duration::from_secs_f64(avg);
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }
}
