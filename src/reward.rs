//! Partial-reinforcement reward scheduling.
//!
//! Decides the magnitude of the next reward from the history of past
//! outcomes. This is a closed-loop target tracker, not an independent-trial
//! Bernoulli draw: the realized reward rate converges *to* the configured
//! contingency instead of merely approximating it in expectation. A cat on
//! an 80 % contingency really gets 80 % of its reward attempts honored over
//! a session; the remainder are silent omissions (no reward, no cue).

use log::debug;

/// Stochastic partial-reinforcement scheduler.
///
/// The history is append-only and is the sole state behind a decision. A
/// `0` entry is a withheld reward; a positive entry is the delivered
/// magnitude.
#[derive(Debug, Clone)]
pub struct RewardScheduler {
    contingency_percent: u8,
    base_size: i16,
    history: Vec<i16>,
}

impl RewardScheduler {
    /// `contingency_percent` is the target fraction of honored reward
    /// attempts (0–100); `base_size` is the full reward magnitude.
    pub fn new(contingency_percent: u8, base_size: i16) -> Self {
        Self {
            contingency_percent: contingency_percent.min(100),
            base_size,
            history: Vec::new(),
        }
    }

    /// Decide the next reward magnitude and record it.
    ///
    /// The very first attempt is always honored. After that, the attempt is
    /// honored whenever the realized reward rate has fallen below the
    /// contingency target, so the rate tracks the target from below as the
    /// history grows. The decision itself is the record: the returned value
    /// is appended to the history before this returns.
    pub fn decide_magnitude(&mut self) -> i16 {
        let magnitude = self.next_size();
        self.history.push(magnitude);
        debug!(
            "reward decision: {magnitude} (rate {:.2} over {} attempts)",
            self.realized_rate(),
            self.history.len()
        );
        magnitude
    }

    fn next_size(&self) -> i16 {
        if self.history.is_empty() {
            return self.base_size;
        }
        let rewarded = self.history.iter().filter(|&&m| m > 0).count();
        let target = self.history.len() as f64 * f64::from(self.contingency_percent) / 100.0;
        if (rewarded as f64) < target {
            self.base_size
        } else {
            0
        }
    }

    /// Full reward magnitude for unconditional deliveries.
    pub fn base_size(&self) -> i16 {
        self.base_size
    }

    /// All past decisions, oldest first.
    pub fn history(&self) -> &[i16] {
        &self.history
    }

    /// Fraction of past attempts that were honored (0 for an empty history).
    pub fn realized_rate(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let rewarded = self.history.iter().filter(|&&m| m > 0).count();
        rewarded as f64 / self.history.len() as f64
    }
}
