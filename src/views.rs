//! The three analysis surfaces: per-client ("adhérent"), per-debtor
//! ("tiré") and general. Each is a pure request/response computation
//! over the dataset; the UI layer is a thin caller.

use crate::aggregate::{
    aggregate, aggregate_categories, count_distinct, percentage, sort_groups, GroupStats,
    SortMeasure,
};
use crate::error::{LedgerError, Result};
use crate::rollforward::{
    extract_opening_balance, monthly_activity, MonthlyActivity, MonthlyPeriod, RollForward,
};
use crate::schema::{Dataset, LedgerEntry, SchemaKind};
use crate::utils::normalize_id;
use log::{info, warn};
use serde::Serialize;

/// Share-of-total threshold above which a counterparty line is flagged
/// as concentrated.
pub const CONCENTRATION_THRESHOLD_PCT: f64 = 25.0;

const DEFAULT_TOP_CLIENTS: usize = 15;

fn require_columns(dataset: &Dataset, view: &str, columns: &[&str]) -> Result<()> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|c| !dataset.has_column(c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::MissingColumns {
            view: view.to_string(),
            columns: missing,
        })
    }
}

fn find_entity<'a, F>(
    dataset: &'a Dataset,
    raw_input: &str,
    kind: &str,
    id_fn: F,
) -> Result<Vec<&'a LedgerEntry>>
where
    F: Fn(&LedgerEntry) -> &str,
{
    let wanted = normalize_id(raw_input);
    if wanted.is_empty() {
        return Err(LedgerError::EmptySearchInput(kind.to_string()));
    }

    let matched: Vec<&LedgerEntry> = dataset
        .entries
        .iter()
        .filter(|e| normalize_id(id_fn(e)) == wanted)
        .collect();

    if matched.is_empty() {
        return Err(LedgerError::EntityNotFound {
            kind: kind.to_string(),
            id: wanted,
        });
    }

    Ok(matched)
}

fn owned(entries: &[&LedgerEntry]) -> Vec<LedgerEntry> {
    entries.iter().map(|e| (*e).clone()).collect()
}

// ---------------------------------------------------------------------------
// Client analysis (original layout)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ClientDirectoryRow {
    pub client_id: String,
    pub client_name: String,
    pub movement_count: usize,
    pub unique_counterparties: usize,
}

/// The "Liste des adhérents" table: movement count and distinct
/// counterparty count per client, busiest clients first.
pub fn client_directory(dataset: &Dataset) -> Result<Vec<ClientDirectoryRow>> {
    require_columns(
        dataset,
        "client directory",
        &["Client Number", "Legal Client Name", "TIRES"],
    )?;

    let mut groups = aggregate(&dataset.entries, |e| {
        (e.client_id.clone(), e.client_name.clone())
    });
    sort_groups(&mut groups, SortMeasure::Count);

    let counterparties = count_distinct(
        &dataset.entries,
        |e| (e.client_id.clone(), e.client_name.clone()),
        |e| e.counterparty_label.clone().unwrap_or_default(),
    );

    Ok(groups
        .into_iter()
        .map(|g| {
            let unique = counterparties.get(&g.key).copied().unwrap_or(0);
            ClientDirectoryRow {
                client_id: g.key.0,
                client_name: g.key.1,
                movement_count: g.count,
                unique_counterparties: unique,
            }
        })
        .collect())
}

/// Headline figures for one filtered entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntitySummary {
    pub movement_count: usize,
    pub opening_balance: f64,
    pub debit_total: f64,
    pub credit_total: f64,
    /// Σ row_balance for the client view, debit minus credit for the
    /// debtor view.
    pub final_balance: f64,
}

/// One counterparty line of the per-client concentration table.
#[derive(Debug, Clone, Serialize)]
pub struct CounterpartyStats {
    pub counterparty_label: String,
    pub counterparty_id: String,
    pub count: usize,
    pub debit_total: f64,
    pub credit_total: f64,
    pub period_net: f64,
    pub pct_debit: f64,
    pub pct_credit: f64,
    pub pct_net: f64,
}

impl CounterpartyStats {
    /// True when any share column crosses the 25% concentration
    /// threshold (the net share counts in absolute value).
    pub fn is_concentrated(&self) -> bool {
        self.pct_debit > CONCENTRATION_THRESHOLD_PCT
            || self.pct_credit > CONCENTRATION_THRESHOLD_PCT
            || self.pct_net.abs() > CONCENTRATION_THRESHOLD_PCT
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientAnalysis {
    pub client_id: String,
    pub client_name: String,
    pub entries: Vec<LedgerEntry>,
    pub summary: EntitySummary,
    pub monthly: Vec<MonthlyPeriod>,
    /// `None` when the counterparty columns are absent from the layout.
    pub counterparties: Option<Vec<CounterpartyStats>>,
    /// Category (RUB) stats with the "SO" row first; `None` when the
    /// category column is absent.
    pub categories: Option<Vec<GroupStats<String>>>,
}

/// Full per-client analysis for a searched client number.
pub fn client_analysis(
    dataset: &Dataset,
    raw_input: &str,
    window: &RollForward,
) -> Result<ClientAnalysis> {
    require_columns(
        dataset,
        "client analysis",
        &["Client Number", "Legal Client Name"],
    )?;

    let matched = find_entity(dataset, raw_input, "client", |e| &e.client_id)?;
    let entries = owned(&matched);
    info!(
        "Client {} matched {} entries",
        normalize_id(raw_input),
        entries.len()
    );

    let opening = extract_opening_balance(&entries);
    let summary = EntitySummary {
        movement_count: entries.len(),
        opening_balance: opening.debit,
        debit_total: entries.iter().map(|e| e.amount_debit).sum(),
        credit_total: entries.iter().map(|e| e.amount_credit).sum(),
        final_balance: entries.iter().map(|e| e.row_balance).sum(),
    };

    let monthly = window.roll_forward(&entries, None);

    let counterparties = if dataset.has_column("TIRES") && dataset.has_column("Debtor Number") {
        Some(counterparty_stats(&entries))
    } else {
        warn!("Counterparty columns absent; skipping the tirés sub-section");
        None
    };

    let categories = if dataset.has_column("RUB") || dataset.has_column("Rubrique") {
        Some(aggregate_categories(&entries))
    } else {
        warn!("Category column absent; skipping the RUB sub-section");
        None
    };

    Ok(ClientAnalysis {
        client_id: normalize_id(raw_input),
        client_name: entries[0].client_name.clone(),
        entries,
        summary,
        monthly,
        counterparties,
        categories,
    })
}

fn counterparty_stats(entries: &[LedgerEntry]) -> Vec<CounterpartyStats> {
    let mut groups = aggregate(entries, |e| {
        (
            e.counterparty_label.clone().unwrap_or_default(),
            normalize_id(&e.counterparty_id.clone().unwrap_or_default()),
        )
    });
    sort_groups(&mut groups, SortMeasure::Volume);

    let total_debit: f64 = groups.iter().map(|g| g.debit_total).sum();
    let total_credit: f64 = groups.iter().map(|g| g.credit_total).sum();
    let total_net: f64 = groups.iter().map(|g| g.net()).sum();

    groups
        .into_iter()
        .map(|g| CounterpartyStats {
            counterparty_label: g.key.0.clone(),
            counterparty_id: g.key.1.clone(),
            count: g.count,
            debit_total: g.debit_total,
            credit_total: g.credit_total,
            period_net: g.net(),
            pct_debit: percentage(g.debit_total, total_debit),
            pct_credit: percentage(g.credit_total, total_credit),
            pct_net: percentage(g.net(), total_net),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Debtor analysis (original layout)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DebtorDirectoryRow {
    pub counterparty_label: String,
    pub counterparty_id: String,
    pub movement_count: usize,
    pub unique_clients: usize,
}

/// The "Liste des tirés" table: movement count and distinct client
/// count per counterparty.
pub fn debtor_directory(dataset: &Dataset) -> Result<Vec<DebtorDirectoryRow>> {
    require_columns(
        dataset,
        "debtor directory",
        &["TIRES", "Debtor Number", "Legal Client Name"],
    )?;

    let mut groups = aggregate(&dataset.entries, |e| {
        (
            e.counterparty_label.clone().unwrap_or_default(),
            e.counterparty_id.clone().unwrap_or_default(),
        )
    });
    sort_groups(&mut groups, SortMeasure::Count);

    let clients = count_distinct(
        &dataset.entries,
        |e| {
            (
                e.counterparty_label.clone().unwrap_or_default(),
                e.counterparty_id.clone().unwrap_or_default(),
            )
        },
        |e| e.client_name.clone(),
    );

    Ok(groups
        .into_iter()
        .map(|g| {
            let unique = clients.get(&g.key).copied().unwrap_or(0);
            DebtorDirectoryRow {
                counterparty_label: g.key.0,
                counterparty_id: g.key.1,
                movement_count: g.count,
                unique_clients: unique,
            }
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct DebtorAnalysis {
    pub counterparty_id: String,
    pub counterparty_label: String,
    pub entries: Vec<LedgerEntry>,
    pub summary: EntitySummary,
    pub monthly: Vec<MonthlyPeriod>,
    /// Clients associated with this debtor, most active first.
    pub clients: Vec<GroupStats<(String, String)>>,
    pub categories: Option<Vec<GroupStats<String>>>,
}

/// Full per-debtor analysis for a searched debtor number.
pub fn debtor_analysis(
    dataset: &Dataset,
    raw_input: &str,
    window: &RollForward,
) -> Result<DebtorAnalysis> {
    require_columns(dataset, "debtor analysis", &["TIRES", "Debtor Number"])?;

    let matched = find_entity(dataset, raw_input, "debtor", |e| {
        e.counterparty_id.as_deref().unwrap_or("")
    })?;
    let entries = owned(&matched);
    info!(
        "Debtor {} matched {} entries",
        normalize_id(raw_input),
        entries.len()
    );

    let opening = extract_opening_balance(&entries);
    let debit_total: f64 = entries.iter().map(|e| e.amount_debit).sum();
    let credit_total: f64 = entries.iter().map(|e| e.amount_credit).sum();
    let summary = EntitySummary {
        movement_count: entries.len(),
        opening_balance: opening.debit,
        debit_total,
        credit_total,
        final_balance: debit_total - credit_total,
    };

    let monthly = window.roll_forward(&entries, None);

    let mut clients = aggregate(&entries, |e| (e.client_id.clone(), e.client_name.clone()));
    sort_groups(&mut clients, SortMeasure::Count);

    let categories = if dataset.has_column("RUB") || dataset.has_column("Rubrique") {
        Some(aggregate_categories(&entries))
    } else {
        warn!("Category column absent; skipping the RUB sub-section");
        None
    };

    Ok(DebtorAnalysis {
        counterparty_id: normalize_id(raw_input),
        counterparty_label: entries[0].counterparty_label.clone().unwrap_or_default(),
        entries,
        summary,
        monthly,
        clients,
        categories,
    })
}

// ---------------------------------------------------------------------------
// General analysis (alternative layout)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GeneralOverview {
    pub client_count: usize,
    pub entry_count: usize,
    pub debit_total: f64,
    pub credit_total: f64,
}

/// One line of a keyed breakdown (category or transaction type).
#[derive(Debug, Clone, Serialize)]
pub struct BreakdownRow {
    pub key: String,
    pub count: usize,
    pub debit_total: f64,
    pub credit_total: f64,
    pub net: f64,
    pub unique_clients: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneralAnalysis {
    pub overview: GeneralOverview,
    pub categories: Vec<BreakdownRow>,
    /// `None` when the transaction-type column is absent.
    pub transaction_types: Option<Vec<BreakdownRow>>,
    pub monthly: Vec<MonthlyActivity>,
    pub top_clients: Vec<GroupStats<(String, String)>>,
}

fn breakdown<F>(entries: &[LedgerEntry], key_fn: F) -> Vec<BreakdownRow>
where
    F: Fn(&LedgerEntry) -> String + Copy,
{
    let mut groups = aggregate(entries, key_fn);
    sort_groups(&mut groups, SortMeasure::Debit);

    let clients = count_distinct(entries, key_fn, |e| e.client_id.clone());

    groups
        .into_iter()
        .map(|g| {
            let unique = clients.get(&g.key).copied().unwrap_or(0);
            BreakdownRow {
                net: g.net(),
                key: g.key,
                count: g.count,
                debit_total: g.debit_total,
                credit_total: g.credit_total,
                unique_clients: unique,
            }
        })
        .collect()
}

fn essential_general_columns(schema: SchemaKind) -> [&'static str; 5] {
    match schema {
        SchemaKind::Original => [
            "EntryAmount",
            "EntryAmountSAC",
            "Client Number",
            "Legal Client Name",
            "RUB",
        ],
        _ => [
            "Entry Amount",
            "Entry Amount SAC",
            "Client Number",
            "Legal Client Name",
            "Rubrique",
        ],
    }
}

/// Whole-ledger analysis: overview metrics, category and
/// transaction-type breakdowns, monthly activity and top clients.
pub fn general_analysis(dataset: &Dataset) -> Result<GeneralAnalysis> {
    require_columns(
        dataset,
        "general analysis",
        &essential_general_columns(dataset.schema),
    )?;

    let entries = &dataset.entries;

    let client_count = count_distinct(entries, |_| (), |e| normalize_id(&e.client_id))
        .get(&())
        .copied()
        .unwrap_or(0);

    let overview = GeneralOverview {
        client_count,
        entry_count: entries.len(),
        debit_total: entries.iter().map(|e| e.amount_debit).sum(),
        credit_total: entries.iter().map(|e| e.amount_credit).sum(),
    };

    let categories = breakdown(entries, |e| e.category_code.clone());

    let label_column = match dataset.schema {
        SchemaKind::Original => "Transaction",
        _ => "TRANSACTION",
    };
    let transaction_types = if dataset.has_column(label_column) {
        Some(breakdown(entries, |e| e.transaction_label.clone()))
    } else {
        warn!("Transaction-type column absent; skipping that breakdown");
        None
    };

    let mut top_clients = aggregate(entries, |e| (e.client_id.clone(), e.client_name.clone()));
    sort_groups(&mut top_clients, SortMeasure::Volume);
    top_clients.truncate(DEFAULT_TOP_CLIENTS);

    Ok(GeneralAnalysis {
        overview,
        categories,
        transaction_types,
        monthly: monthly_activity(entries),
        top_clients,
    })
}

/// Result of the general-analysis client search: summary plus
/// per-transaction-type and per-category breakdowns for one client.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSearchResult {
    pub client_id: String,
    pub client_name: String,
    pub entry_count: usize,
    pub debit_total: f64,
    pub credit_total: f64,
    pub net: f64,
    pub transaction_types: Vec<BreakdownRow>,
    pub categories: Vec<BreakdownRow>,
}

pub fn client_search(dataset: &Dataset, raw_input: &str) -> Result<ClientSearchResult> {
    require_columns(
        dataset,
        "client search",
        &["Client Number", "Legal Client Name"],
    )?;

    let matched = find_entity(dataset, raw_input, "client", |e| &e.client_id)?;
    let entries = owned(&matched);

    let debit_total: f64 = entries.iter().map(|e| e.amount_debit).sum();
    let credit_total: f64 = entries.iter().map(|e| e.amount_credit).sum();

    Ok(ClientSearchResult {
        client_id: normalize_id(raw_input),
        client_name: entries[0].client_name.clone(),
        entry_count: entries.len(),
        debit_total,
        credit_total,
        net: debit_total - credit_total,
        transaction_types: breakdown(&entries, |e| e.transaction_label.clone()),
        categories: breakdown(&entries, |e| e.category_code.clone()),
    })
}
