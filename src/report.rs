//! Presentation-facing structured data: display formatting and
//! chart-ready series. The core hands these to the rendering layer as
//! plain data; nothing here draws anything.

use crate::aggregate::GroupStats;
use crate::rollforward::MonthlyPeriod;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Rounds to the nearest integer, ties to even, matching spreadsheet
/// display conventions. Stored values keep full precision; this is for
/// display only.
pub fn round_half_even(value: f64) -> i64 {
    let floor = value.floor();
    let fraction = value - floor;

    if fraction > 0.5 {
        floor as i64 + 1
    } else if fraction < 0.5 {
        floor as i64
    } else {
        let low = floor as i64;
        if low % 2 == 0 {
            low
        } else {
            low + 1
        }
    }
}

/// Formats an amount the way the dashboards display it: rounded to an
/// integer with spaces as thousands separators ("10 000").
pub fn format_amount(value: f64) -> String {
    let rounded = round_half_even(value);
    let negative = rounded < 0;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// French month label, "janvier - 2025".
pub fn month_label_fr(date: NaiveDate) -> String {
    format!("{} - {}", MONTHS_FR[date.month0() as usize], date.year())
}

/// Row label for a monthly series entry; the synthetic opening row is
/// labelled "solde d'ouverture".
pub fn period_label(period: &MonthlyPeriod) -> String {
    match period.period_start {
        Some(date) => month_label_fr(date),
        None => "solde d'ouverture".to_string(),
    }
}

/// An ordered table of pre-formatted cells with named columns, ready
/// for a grid widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// The monthly roll-forward series as a display table.
pub fn monthly_table(series: &[MonthlyPeriod]) -> Table {
    let columns = vec![
        "Date".to_string(),
        "Solde initial".to_string(),
        "DR".to_string(),
        "CR".to_string(),
        "Solde du mois".to_string(),
        "Solde cumulé".to_string(),
    ];

    let rows = series
        .iter()
        .map(|p| {
            vec![
                period_label(p),
                format_amount(p.opening_running_balance),
                format_amount(p.period_debit_total),
                format_amount(p.period_credit_total),
                format_amount(p.running_balance),
                format_amount(p.cumulative_balance),
            ]
        })
        .collect();

    Table { columns, rows }
}

/// Chart-ready vectors for the monthly bar and line charts.
///
/// The synthetic opening row is excluded from the month axis; its debit
/// instead becomes the `opening_debit` component of the first bar, so
/// stacked bars can show the opening balance distinctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyChartData {
    pub months: Vec<NaiveDate>,
    pub opening_debit: Vec<f64>,
    pub debit: Vec<f64>,
    pub credit: Vec<f64>,
    pub running_balance: Vec<f64>,
    pub cumulative_balance: Vec<f64>,
}

pub fn monthly_chart_data(series: &[MonthlyPeriod]) -> MonthlyChartData {
    let opening = series
        .iter()
        .filter(|p| p.is_opening_row())
        .map(|p| p.period_debit_total)
        .sum::<f64>();

    let real: Vec<&MonthlyPeriod> = series.iter().filter(|p| !p.is_opening_row()).collect();

    let mut opening_debit = vec![0.0; real.len()];
    if let Some(first) = opening_debit.first_mut() {
        *first = opening;
    }

    MonthlyChartData {
        months: real.iter().filter_map(|p| p.period_start).collect(),
        opening_debit,
        debit: real.iter().map(|p| p.period_debit_total).collect(),
        credit: real.iter().map(|p| p.period_credit_total).collect(),
        running_balance: real.iter().map(|p| p.running_balance).collect(),
        cumulative_balance: real.iter().map(|p| p.cumulative_balance).collect(),
    }
}

/// One category/value pair set for grouped bar charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryValue {
    pub label: String,
    pub debit: f64,
    pub credit: f64,
}

/// Debit/credit pairs per group, in the groups' given order.
pub fn category_chart_data<K: ToString>(groups: &[GroupStats<K>]) -> Vec<CategoryValue> {
    groups
        .iter()
        .map(|g| CategoryValue {
            label: g.key.to_string(),
            debit: g.debit_total,
            credit: g.credit_total,
        })
        .collect()
}
