//! Progress reporting for repository fetches.
//!
//! A [`ProgressTracker`] owns one terminal progress line for the lifetime of one fetch attempt.
//! Until git reports a real percentage, a background ticker advances the line by small random
//! steps so the user can see the fetch is alive. Once a real sample arrives the tracker switches
//! to real mode for good and the displayed value never decreases again.

use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use templet_core::ProgressSample;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// Highest fraction simulated ticks may reach
pub const SIMULATED_CEILING: f64 = 0.94;

/// Largest single simulated step
const MAX_SIMULATED_STEP: f64 = 0.10;

/// Where the displayed value currently comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMode {
    Simulated,
    Real,
}

/// Displayed fraction and signal mode of one attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    displayed: f64,
    mode: SignalMode,
    real_samples: usize,
    finished: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            displayed: 0.0,
            mode: SignalMode::Simulated,
            real_samples: 0,
            finished: false,
        }
    }
}

impl ProgressState {
    pub fn displayed(&self) -> f64 {
        self.displayed
    }

    pub fn mode(&self) -> SignalMode {
        self.mode
    }

    /// Real samples observed before completion
    pub fn real_samples(&self) -> usize {
        self.real_samples
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply a real sample; switches to real mode and never lowers the displayed value
    pub fn observe_real(&mut self, sample: ProgressSample) -> f64 {
        if !self.finished {
            self.mode = SignalMode::Real;
            self.real_samples += 1;
            self.displayed = self.displayed.max(sample.fraction());
        }
        self.displayed
    }

    /// Apply a simulated step; `None` when the tick changes nothing
    pub fn simulated_tick(&mut self, step: f64) -> Option<f64> {
        if self.finished || self.mode == SignalMode::Real {
            return None;
        }
        let next = (self.displayed + step.max(0.0)).min(SIMULATED_CEILING);
        if next <= self.displayed {
            return None;
        }
        self.displayed = next;
        Some(next)
    }

    pub fn complete(&mut self) {
        self.displayed = 1.0;
        self.finished = true;
    }
}

/// Progress line for one fetch attempt
///
/// Dropping the tracker aborts the ticker and clears the line, so every exit path releases both.
pub struct ProgressTracker {
    state: Arc<Mutex<ProgressState>>,
    bar: ProgressBar,
    ticker: Option<JoinHandle<()>>,
}

impl ProgressTracker {
    /// Tracker drawing to the terminal
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(message.to_string());
        Self::with_bar(bar)
    }

    /// Tracker that renders nothing (`fetch.progress: false`, tests)
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProgressState::default())),
            bar,
            ticker: None,
        }
    }

    /// Start the simulated ticker; must be called inside a tokio runtime
    pub fn start_ticker(&mut self, period: Duration) {
        self.stop_ticker();

        let state = Arc::clone(&self.state);
        let bar = self.bar.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let step = rand::rng().random_range(0.0..MAX_SIMULATED_STEP);
                let mut guard = lock(&state);
                match guard.simulated_tick(step) {
                    Some(fraction) => bar.set_position(to_percent(fraction)),
                    None if guard.mode() == SignalMode::Real => break,
                    None => {}
                }
            }
            trace!("Simulated progress ticker stopped");
        }));
    }

    /// Record a real sample parsed from git output
    pub fn record(&self, sample: ProgressSample) {
        let fraction = lock(&self.state).observe_real(sample);
        self.bar.set_position(to_percent(fraction));
    }

    /// Currently displayed fraction in `[0, 1]`
    pub fn displayed(&self) -> f64 {
        lock(&self.state).displayed()
    }

    pub fn is_real(&self) -> bool {
        lock(&self.state).mode() == SignalMode::Real
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Successful completion: stop the ticker, render 100% and clear the line
    ///
    /// Returns the final state of the attempt.
    pub fn finish(mut self) -> ProgressState {
        self.stop_ticker();
        let state = {
            let mut guard = lock(&self.state);
            guard.complete();
            guard.clone()
        };
        self.bar.set_position(100);
        self.bar.finish_and_clear();
        state
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.stop_ticker();
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

fn lock(state: &Mutex<ProgressState>) -> MutexGuard<'_, ProgressState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn to_percent(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u64
}
