//! The pacing engine (C4): open-loop constant-rate request generation with
//! concurrent workers and thread-safe aggregation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span};

use crate::attacker::{Attacker, AttackContext};
use crate::stats::{Stats, StatsSnapshot};

/// Everything `Engine::run` needs, fully validated by the time it's built
/// (see `crate::cli`'s `TryFrom<Cli>` conversion).
pub struct RunConfig {
    pub rate: u32,
    pub workers: u32,
    pub duration: Duration,
    pub timeout: Duration,
    pub headless: bool,
}

/// §4.3's explicit run states, surfaced as `tracing` spans so tests and logs
/// can assert transitions instead of inferring them from control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Draining,
    Done,
}

/// Outcome of one full run: the final aggregate plus how many pacer ticks
/// were dropped because every worker was busy (§4.3/§9(b), recommended not
/// required).
pub struct RunReport {
    pub stats: StatsSnapshot,
    pub dropped_ticks: u64,
    pub attacker_name: &'static str,
    pub elapsed: Duration,
}

impl RunReport {
    /// Mean observed requests per second over the run's wall-clock elapsed
    /// time, `0.0` for a degenerate zero-elapsed run (§6 final report).
    pub fn mean_qps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.stats.total as f64 / secs
        }
    }
}

pub struct Engine {
    attacker: Arc<Attacker>,
    config: RunConfig,
    stats: Arc<Stats>,
}

impl Engine {
    pub fn new(attacker: Attacker, config: RunConfig) -> Self {
        Self {
            attacker: Arc::new(attacker),
            config,
            stats: Arc::new(Stats::new()),
        }
    }

    /// A handle the presenter can poll with `snapshot()` while `run` is
    /// driven concurrently in another task, so the live dashboard reflects
    /// in-progress totals rather than only the final report.
    pub fn stats_handle(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    /// Run to completion (duration elapsed or `cancel` fired), or return
    /// immediately with zero requests for a degenerate configuration.
    pub async fn run(&self, cancel: CancellationToken) -> RunReport {
        let attacker_name = self.attacker.name();

        // §4.3 edge cases: zero rate, zero workers, or zero duration do no
        // work at all — an explicit early return, not a busy-spun no-op run.
        if self.config.rate == 0 || self.config.workers == 0 || self.config.duration.is_zero() {
            info!(
                rate = self.config.rate,
                workers = self.config.workers,
                duration = ?self.config.duration,
                "degenerate run configuration, returning immediately"
            );
            return RunReport {
                stats: StatsSnapshot::empty(),
                dropped_ticks: 0,
                attacker_name,
                elapsed: Duration::ZERO,
            };
        }

        let _span = info_span!("run", state = ?RunState::Running).entered();
        let started = tokio::time::Instant::now();

        let stats = Arc::clone(&self.stats);
        let dropped_ticks = Arc::new(AtomicU64::new(0));
        let (tx, rx) = mpsc::channel::<()>(1);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let duration_timer = {
            let cancel = cancel.clone();
            let duration = self.config.duration;
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                cancel.cancel();
            })
        };

        let pacer = {
            let tx = tx.clone();
            let cancel = cancel.clone();
            let dropped_ticks = Arc::clone(&dropped_ticks);
            let period = Duration::from_secs_f64(1.0 / self.config.rate as f64);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            if tx.try_send(()).is_err() {
                                dropped_ticks.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                }
                debug!("pacer stopped");
            })
        };

        let mut workers = Vec::with_capacity(self.config.workers as usize);
        for id in 0..self.config.workers {
            let attacker = Arc::clone(&self.attacker);
            let stats = Arc::clone(&stats);
            let cancel = cancel.clone();
            let rx = Arc::clone(&rx);
            let timeout = self.config.timeout;

            workers.push(tokio::spawn(async move {
                loop {
                    let tick = {
                        let mut rx = rx.lock().await;
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => None,
                            tick = rx.recv() => tick,
                        }
                    };

                    let Some(()) = tick else { break };

                    let request_cancel = cancel.child_token();
                    let ctx = AttackContext {
                        deadline: tokio::time::Instant::now() + timeout,
                        cancel: request_cancel,
                    };

                    // `attack` races `ctx.cancel` (inherited run-wide cancellation)
                    // against `ctx.deadline` (this request's own timeout) internally —
                    // no extra per-request task needed to enforce either one.
                    let result = attacker.attack(ctx).await;

                    stats.add(&result);
                }
                debug!(worker = id, "worker stopped");
            }));
        }

        for worker in workers {
            let _ = worker.await;
        }

        let _drain_span = info_span!("run", state = ?RunState::Draining).entered();
        pacer.abort();
        duration_timer.abort();
        drop(_drain_span);

        let _done_span = info_span!("run", state = ?RunState::Done).entered();
        RunReport {
            stats: stats.snapshot(),
            dropped_ticks: dropped_ticks.load(Ordering::Relaxed),
            attacker_name,
            elapsed: started.elapsed(),
        }
    }
}
