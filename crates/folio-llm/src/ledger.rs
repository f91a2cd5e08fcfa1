//! Spend ledger with daily and monthly budgets.
//!
//! Counters roll over at UTC midnight (daily) and on the first of the
//! month (monthly). The ledger is process-local: it is an operational
//! guard against runaway spend, not an accounting system.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{BudgetScope, LlmError, Result};

struct LedgerInner {
    day: NaiveDate,
    month: (i32, u32),
    daily_spent: f64,
    monthly_spent: f64,
}

/// Tracks LLM spend against configured budgets.
pub struct CostLedger {
    daily_budget: f64,
    monthly_budget: f64,
    downshift_ratio: f64,
    inner: Mutex<LedgerInner>,
}

/// Point-in-time view of the ledger, served by the cost analytics endpoint.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSnapshot {
    /// Spend since UTC midnight.
    pub daily_spent_usd: f64,
    /// Daily ceiling.
    pub daily_budget_usd: f64,
    /// Remaining daily headroom.
    pub daily_remaining_usd: f64,
    /// Spend since the first of the UTC month.
    pub monthly_spent_usd: f64,
    /// Monthly ceiling.
    pub monthly_budget_usd: f64,
    /// Remaining monthly headroom.
    pub monthly_remaining_usd: f64,
    /// Whether model selection is currently held to the cheap model.
    pub downshifted: bool,
}

impl CostLedger {
    /// Create a ledger with the given budgets.
    ///
    /// `downshift_ratio` is the fraction of the daily budget past which
    /// only the cheap model should be used.
    #[must_use]
    pub fn new(daily_budget: f64, monthly_budget: f64, downshift_ratio: f64) -> Self {
        let now = Utc::now();
        Self {
            daily_budget,
            monthly_budget,
            downshift_ratio,
            inner: Mutex::new(LedgerInner {
                day: now.date_naive(),
                month: (now.year(), now.month()),
                daily_spent: 0.0,
                monthly_spent: 0.0,
            }),
        }
    }

    /// Create a ledger from LLM settings.
    #[must_use]
    pub fn from_settings(settings: &folio_settings::LlmSettings) -> Self {
        Self::new(
            settings.daily_budget_usd,
            settings.monthly_budget_usd,
            settings.budget_downshift_ratio,
        )
    }

    /// Add a completed request's cost to the ledger.
    pub fn record(&self, cost_usd: f64) {
        self.record_at(cost_usd, Utc::now());
    }

    /// Fail if spending `estimated_cost` would cross either budget.
    ///
    /// Called with a pre-request estimate, before any HTTP call is made.
    pub fn check_budget(&self, estimated_cost: f64) -> Result<()> {
        self.check_budget_at(Utc::now(), estimated_cost)
    }

    /// Whether model selection should be held to the cheap model.
    pub fn should_downshift(&self) -> bool {
        self.should_downshift_at(Utc::now())
    }

    /// Fraction of the daily budget still unspent, clamped to 0.0..=1.0.
    ///
    /// An unbudgeted ledger reports full headroom.
    pub fn daily_headroom(&self) -> f64 {
        let snap = self.snapshot();
        if snap.daily_budget_usd <= 0.0 {
            return 1.0;
        }
        (snap.daily_remaining_usd / snap.daily_budget_usd).clamp(0.0, 1.0)
    }

    /// Current spend and headroom.
    pub fn snapshot(&self) -> CostSnapshot {
        self.snapshot_at(Utc::now())
    }

    fn record_at(&self, cost_usd: f64, now: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        Self::roll_over(&mut inner, now);
        inner.daily_spent += cost_usd;
        inner.monthly_spent += cost_usd;
    }

    fn check_budget_at(&self, now: DateTime<Utc>, estimated_cost: f64) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::roll_over(&mut inner, now);
        if inner.daily_spent + estimated_cost > self.daily_budget {
            return Err(LlmError::BudgetExhausted {
                scope: BudgetScope::Daily,
                spent: inner.daily_spent,
                limit: self.daily_budget,
            });
        }
        if inner.monthly_spent + estimated_cost > self.monthly_budget {
            return Err(LlmError::BudgetExhausted {
                scope: BudgetScope::Monthly,
                spent: inner.monthly_spent,
                limit: self.monthly_budget,
            });
        }
        Ok(())
    }

    fn should_downshift_at(&self, now: DateTime<Utc>) -> bool {
        let mut inner = self.inner.lock();
        Self::roll_over(&mut inner, now);
        inner.daily_spent >= self.daily_budget * self.downshift_ratio
    }

    fn snapshot_at(&self, now: DateTime<Utc>) -> CostSnapshot {
        let mut inner = self.inner.lock();
        Self::roll_over(&mut inner, now);
        CostSnapshot {
            daily_spent_usd: inner.daily_spent,
            daily_budget_usd: self.daily_budget,
            daily_remaining_usd: (self.daily_budget - inner.daily_spent).max(0.0),
            monthly_spent_usd: inner.monthly_spent,
            monthly_budget_usd: self.monthly_budget,
            monthly_remaining_usd: (self.monthly_budget - inner.monthly_spent).max(0.0),
            downshifted: inner.daily_spent >= self.daily_budget * self.downshift_ratio,
        }
    }

    fn roll_over(inner: &mut LedgerInner, now: DateTime<Utc>) {
        let today = now.date_naive();
        if inner.day != today {
            inner.day = today;
            inner.daily_spent = 0.0;
        }
        let month = (now.year(), now.month());
        if inner.month != month {
            inner.month = month;
            inner.monthly_spent = 0.0;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn records_accumulate() {
        let ledger = CostLedger::new(5.0, 100.0, 0.8);
        let now = at(2026, 8, 1);
        ledger.record_at(1.0, now);
        ledger.record_at(0.5, now);
        let snap = ledger.snapshot_at(now);
        assert!((snap.daily_spent_usd - 1.5).abs() < 1e-9);
        assert!((snap.monthly_spent_usd - 1.5).abs() < 1e-9);
        assert!((snap.daily_remaining_usd - 3.5).abs() < 1e-9);
    }

    #[test]
    fn daily_budget_exhaustion() {
        let ledger = CostLedger::new(1.0, 100.0, 0.8);
        let now = at(2026, 8, 1);
        assert!(ledger.check_budget_at(now, 0.01).is_ok());
        ledger.record_at(1.0, now);
        let err = ledger.check_budget_at(now, 0.01).unwrap_err();
        assert!(matches!(
            err,
            LlmError::BudgetExhausted {
                scope: BudgetScope::Daily,
                ..
            }
        ));
    }

    #[test]
    fn estimate_crossing_daily_budget_is_refused() {
        let ledger = CostLedger::new(1.0, 100.0, 0.8);
        let now = at(2026, 8, 1);
        ledger.record_at(0.99, now);
        // Headroom remains, but a large estimate would blow through it.
        assert!(ledger.check_budget_at(now, 0.5).is_err());
        assert!(ledger.check_budget_at(now, 0.005).is_ok());
    }

    #[test]
    fn monthly_budget_exhaustion() {
        let ledger = CostLedger::new(10.0, 2.0, 0.8);
        let now = at(2026, 8, 1);
        ledger.record_at(2.5, now);
        // A new day resets the daily counter but not the monthly one.
        let next_day = at(2026, 8, 2);
        let err = ledger.check_budget_at(next_day, 0.01).unwrap_err();
        assert!(matches!(
            err,
            LlmError::BudgetExhausted {
                scope: BudgetScope::Monthly,
                ..
            }
        ));
    }

    #[test]
    fn daily_rollover_resets_spend() {
        let ledger = CostLedger::new(1.0, 100.0, 0.8);
        ledger.record_at(1.0, at(2026, 8, 1));
        assert!(ledger.check_budget_at(at(2026, 8, 1), 0.01).is_err());
        assert!(ledger.check_budget_at(at(2026, 8, 2), 0.01).is_ok());
        let snap = ledger.snapshot_at(at(2026, 8, 2));
        assert_eq!(snap.daily_spent_usd, 0.0);
        assert!((snap.monthly_spent_usd - 1.0).abs() < 1e-9);
    }

    #[test]
    fn monthly_rollover_resets_spend() {
        let ledger = CostLedger::new(10.0, 2.0, 0.8);
        ledger.record_at(2.5, at(2026, 8, 31));
        assert!(ledger.check_budget_at(at(2026, 9, 1), 0.01).is_ok());
        let snap = ledger.snapshot_at(at(2026, 9, 1));
        assert_eq!(snap.monthly_spent_usd, 0.0);
    }

    #[test]
    fn downshift_at_ratio() {
        let ledger = CostLedger::new(1.0, 100.0, 0.8);
        let now = at(2026, 8, 1);
        ledger.record_at(0.79, now);
        assert!(!ledger.should_downshift_at(now));
        ledger.record_at(0.01, now);
        assert!(ledger.should_downshift_at(now));
        // Downshifted but not exhausted: requests still go through.
        assert!(ledger.check_budget_at(now, 0.01).is_ok());
        assert!(ledger.snapshot_at(now).downshifted);
    }

    #[test]
    fn headroom_tracks_remaining_budget() {
        let ledger = CostLedger::new(1.0, 100.0, 0.8);
        assert!((ledger.daily_headroom() - 1.0).abs() < 1e-9);
        ledger.record(0.75);
        assert!((ledger.daily_headroom() - 0.25).abs() < 1e-9);
        let unbudgeted = CostLedger::new(0.0, 0.0, 0.8);
        assert_eq!(unbudgeted.daily_headroom(), 1.0);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let ledger = CostLedger::new(5.0, 100.0, 0.8);
        let json = serde_json::to_value(ledger.snapshot()).unwrap();
        assert!(json.get("dailySpentUsd").is_some());
        assert!(json.get("monthlyRemainingUsd").is_some());
        assert!(json.get("downshifted").is_some());
    }
}
