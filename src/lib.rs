//! # Ledger Analytics
//!
//! A library for analyzing factoring ledger spreadsheets: it classifies
//! a sheet's column layout into one of two known schemas, builds a
//! typed in-memory dataset, and computes the aggregate and time-series
//! views behind a reporting dashboard.
//!
//! ## Core Concepts
//!
//! - **Layout detection**: two known column layouts (original and
//!   alternative) are recognized from marker columns; ambiguity needs an
//!   explicit user choice, anything else blocks analysis.
//! - **Entity aggregation**: count/sum statistics per client
//!   ("adhérent"), per counterparty ("tiré") and per category, with
//!   deterministic ordering and division-safe percentages.
//! - **Monthly balance roll-forward**: the canonical fixed-window
//!   monthly series. Opening-balance pseudo-rows are extracted from the
//!   stream and re-injected as a synthetic leading period; the running
//!   balance rolls net (debit−credit) while the cumulative balance
//!   rolls gross (debit+credit) — two deliberately different
//!   recurrences.
//! - **Presentation data**: tables and chart series are plain
//!   structured data; rendering is an external collaborator.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_analytics::{Session, Sheet};
//!
//! let mut session = Session::new();
//! let sheet = Sheet::new(rows_from_spreadsheet);
//! session.load(sheet, 5)?;
//!
//! let analysis = session.client_analysis("1023")?;
//! println!("opening balance: {}", analysis.summary.opening_balance);
//! for period in &analysis.monthly {
//!     println!("{:?}: solde {}", period.period_start, period.running_balance);
//! }
//! ```

pub mod aggregate;
pub mod detect;
pub mod error;
pub mod ingestion;
pub mod report;
pub mod rollforward;
pub mod schema;
pub mod session;
pub mod utils;
pub mod views;

pub use aggregate::{
    aggregate, aggregate_categories, count_distinct, percentage, sort_groups, GroupStats,
    SortMeasure,
};
pub use detect::classify;
pub use error::{LedgerError, Result};
pub use ingestion::{build_dataset, detect_layout, Sheet};
pub use report::{
    category_chart_data, format_amount, month_label_fr, monthly_chart_data, monthly_table,
    period_label, round_half_even, CategoryValue, MonthlyChartData, Table,
};
pub use rollforward::{
    default_window, extract_opening_balance, monthly_activity, MonthlyActivity, MonthlyPeriod,
    OpeningBalance, RollForward,
};
pub use schema::{
    Dataset, LedgerEntry, SchemaKind, ALT_MARKERS, OPENING_BALANCE_CATEGORY,
    OPENING_BALANCE_MARKER, ORIGINAL_MARKERS,
};
pub use session::Session;
pub use utils::{normalize_id, parse_amount, parse_entry_date};
pub use views::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn original_sheet() -> Sheet {
        let header = vec![
            "Client Number".to_string(),
            "Legal Client Name".to_string(),
            "TIRES".to_string(),
            "Debtor Number".to_string(),
            "EntryAmount".to_string(),
            "EntryAmountSAC".to_string(),
            "EntryDate".to_string(),
            "Transaction".to_string(),
            "RUB".to_string(),
            "solde".to_string(),
        ];
        let rows = vec![
            header,
            vec![
                "1023.0".into(),
                "ACME SARL".into(),
                "TR".into(),
                "501.0".into(),
                "100".into(),
                "0".into(),
                "15/01/2025".into(),
                "Solde Ouverture".into(),
                "SO".into(),
                "100".into(),
            ],
            vec![
                "1023.0".into(),
                "ACME SARL".into(),
                "CH".into(),
                "502".into(),
                "50".into(),
                "20".into(),
                "10/02/2025".into(),
                "Facture".into(),
                "FAC".into(),
                "30".into(),
            ],
        ];
        Sheet::new(rows)
    }

    #[test]
    fn test_end_to_end_client_pipeline() {
        let mut session = Session::new();
        let kind = session.load(original_sheet(), 1).unwrap();
        assert_eq!(kind, SchemaKind::Original);

        let analysis = session.client_analysis("1023").unwrap();
        assert_eq!(analysis.client_name, "ACME SARL");
        assert_eq!(analysis.summary.opening_balance, 100.0);
        assert_eq!(analysis.monthly.len(), 7);

        // Presentation data derives cleanly from the series.
        let chart = monthly_chart_data(&analysis.monthly);
        assert_eq!(chart.months.len(), 6);
        assert_eq!(chart.opening_debit[0], 100.0);

        let table = monthly_table(&analysis.monthly);
        assert_eq!(table.rows.len(), 7);
        assert_eq!(table.rows[0][0], "solde d'ouverture");
        assert_eq!(table.rows[1][0], "janvier - 2025");
    }

    #[test]
    fn test_reports_serialize_to_json() {
        let mut session = Session::new();
        session.load(original_sheet(), 1).unwrap();
        let analysis = session.client_analysis("1023").unwrap();

        let json = serde_json::to_string(&analysis).unwrap();
        assert!(json.contains("running_balance"));
        assert!(json.contains("ACME SARL"));
    }
}
