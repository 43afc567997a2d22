//! Monthly balance roll-forward: the canonical fixed-window monthly
//! series (period debit, period credit, running balance, cumulative
//! balance) behind every time-series view.

use crate::schema::LedgerEntry;
use crate::utils::{first_of_month, month_starts_in_window};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default reporting window: January through June 2025.
pub fn default_window() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
    )
}

/// One row of the monthly series.
///
/// `running_balance` is the net roll-forward (debit minus credit);
/// `cumulative_balance` is the gross volume cumulative (debit plus
/// credit). The two recurrences differ on purpose and must stay that
/// way; see the engine docs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyPeriod {
    /// First-of-month date, or `None` for the synthetic opening row.
    pub period_start: Option<NaiveDate>,
    /// Running balance carried from the prior period ("Solde initial").
    /// By convention this is 0 for the first real month, not the
    /// opening balance.
    pub opening_running_balance: f64,
    pub period_debit_total: f64,
    pub period_credit_total: f64,
    /// Net balance at month end ("Solde du mois").
    pub running_balance: f64,
    /// Gross debit+credit cumulative ("Solde cumulé").
    pub cumulative_balance: f64,
}

impl MonthlyPeriod {
    /// True for the synthetic leading row that carries the opening
    /// balance; it appears in tables but is excluded from date-based
    /// plotting.
    pub fn is_opening_row(&self) -> bool {
        self.period_start.is_none()
    }
}

/// Opening-balance amounts extracted from the marker rows.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OpeningBalance {
    pub debit: f64,
    pub credit: f64,
    pub entry_count: usize,
}

/// Sums the opening-balance pseudo-rows of a filtered entry set.
pub fn extract_opening_balance(entries: &[LedgerEntry]) -> OpeningBalance {
    let mut opening = OpeningBalance::default();
    for entry in entries.iter().filter(|e| e.is_opening_balance()) {
        opening.debit += entry.amount_debit;
        opening.credit += entry.amount_credit;
        opening.entry_count += 1;
    }
    opening
}

/// The roll-forward engine for a fixed calendar window.
pub struct RollForward {
    window_start: NaiveDate,
    window_end: NaiveDate,
}

impl Default for RollForward {
    fn default() -> Self {
        let (start, end) = default_window();
        Self::new(start, end)
    }
}

impl RollForward {
    pub fn new(window_start: NaiveDate, window_end: NaiveDate) -> Self {
        Self {
            window_start: first_of_month(window_start),
            window_end: first_of_month(window_end),
        }
    }

    /// Turns an already-filtered entry set into the monthly series,
    /// prefixed by the synthetic opening row.
    ///
    /// When `opening_balance` is `None` it is extracted here as the
    /// debit sum of the marker rows. Either way the marker rows are
    /// excluded from the monthly buckets, so a caller-supplied opening
    /// balance is never double counted. Rows without a parsable date
    /// are dropped from the buckets (overall totals computed upstream
    /// intentionally still include them).
    ///
    /// Always returns `window length + 1` rows, even for an empty
    /// input: months with no entries get zero debit and credit.
    pub fn roll_forward(
        &self,
        entries: &[LedgerEntry],
        opening_balance: Option<f64>,
    ) -> Vec<MonthlyPeriod> {
        let opening =
            opening_balance.unwrap_or_else(|| extract_opening_balance(entries).debit);

        let mut debits: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut credits: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for entry in entries.iter().filter(|e| !e.is_opening_balance()) {
            let Some(date) = entry.entry_date else {
                continue;
            };
            let month = first_of_month(date);
            *debits.entry(month).or_insert(0.0) += entry.amount_debit;
            *credits.entry(month).or_insert(0.0) += entry.amount_credit;
        }

        let months = month_starts_in_window(self.window_start, self.window_end);
        debug!(
            "Rolling forward {} bucketed months onto a {}-month window (opening {})",
            debits.len(),
            months.len(),
            opening
        );

        let mut series = Vec::with_capacity(months.len() + 1);
        series.push(MonthlyPeriod {
            period_start: None,
            opening_running_balance: 0.0,
            period_debit_total: opening,
            period_credit_total: 0.0,
            running_balance: 0.0,
            cumulative_balance: opening,
        });

        let mut running = opening;
        let mut cumulative = opening;
        let mut prior_running = 0.0;

        for month in months {
            let debit = debits.get(&month).copied().unwrap_or(0.0);
            let credit = credits.get(&month).copied().unwrap_or(0.0);

            running += debit - credit;
            cumulative += debit + credit;

            series.push(MonthlyPeriod {
                period_start: Some(month),
                opening_running_balance: prior_running,
                period_debit_total: debit,
                period_credit_total: credit,
                running_balance: running,
                cumulative_balance: cumulative,
            });

            prior_running = running;
        }

        series
    }
}

/// One observed month of overall activity, for the free-window monthly
/// table of the general analysis (no fixed skeleton, no opening logic).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyActivity {
    pub month: NaiveDate,
    pub entry_count: usize,
    pub debit_total: f64,
    pub credit_total: f64,
}

impl MonthlyActivity {
    pub fn net(&self) -> f64 {
        self.debit_total - self.credit_total
    }
}

/// Buckets dated entries by calendar month, in chronological order.
/// Undated rows are skipped.
pub fn monthly_activity(entries: &[LedgerEntry]) -> Vec<MonthlyActivity> {
    let mut months: BTreeMap<NaiveDate, MonthlyActivity> = BTreeMap::new();

    for entry in entries {
        let Some(date) = entry.entry_date else {
            continue;
        };
        let month = first_of_month(date);
        let stats = months.entry(month).or_insert_with(|| MonthlyActivity {
            month,
            entry_count: 0,
            debit_total: 0.0,
            credit_total: 0.0,
        });
        stats.entry_count += 1;
        stats.debit_total += entry.amount_debit;
        stats.credit_total += entry.amount_credit;
    }

    months.into_values().collect()
}
