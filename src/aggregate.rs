//! Entity aggregation: group entries by an arbitrary key and compute
//! count/sum statistics with deterministic ordering.

use crate::schema::{LedgerEntry, OPENING_BALANCE_CATEGORY};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Count and amount totals for one group of entries.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats<K> {
    pub key: K,
    pub count: usize,
    pub debit_total: f64,
    pub credit_total: f64,
}

impl<K> GroupStats<K> {
    /// Net balance of the group (debit minus credit).
    pub fn net(&self) -> f64 {
        self.debit_total - self.credit_total
    }

    /// Gross volume of the group (debit plus credit).
    pub fn volume(&self) -> f64 {
        self.debit_total + self.credit_total
    }
}

/// The measure a call site designates as primary for descending sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMeasure {
    Count,
    Debit,
    Volume,
}

/// Groups entries by `key_fn` and sums their amounts.
///
/// Output order is the key's natural ascending order; call
/// [`sort_groups`] to apply a call site's primary measure.
pub fn aggregate<K, F>(entries: &[LedgerEntry], key_fn: F) -> Vec<GroupStats<K>>
where
    K: Ord + Clone,
    F: Fn(&LedgerEntry) -> K,
{
    let mut groups: BTreeMap<K, GroupStats<K>> = BTreeMap::new();

    for entry in entries {
        let key = key_fn(entry);
        let stats = groups.entry(key.clone()).or_insert_with(|| GroupStats {
            key,
            count: 0,
            debit_total: 0.0,
            credit_total: 0.0,
        });
        stats.count += 1;
        stats.debit_total += entry.amount_debit;
        stats.credit_total += entry.amount_credit;
    }

    groups.into_values().collect()
}

/// Sorts groups descending by the designated measure, ties broken by
/// key ascending so output is reproducible.
pub fn sort_groups<K: Ord>(groups: &mut [GroupStats<K>], measure: SortMeasure) {
    groups.sort_by(|a, b| {
        let (ma, mb) = match measure {
            SortMeasure::Count => (a.count as f64, b.count as f64),
            SortMeasure::Debit => (a.debit_total, b.debit_total),
            SortMeasure::Volume => (a.volume(), b.volume()),
        };
        mb.partial_cmp(&ma)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
}

/// Distinct values of `distinct_fn` per group of `key_fn`.
///
/// Used for the "unique counterparties per client" and "unique clients
/// per debtor/category" directory columns.
pub fn count_distinct<K, D, F, G>(entries: &[LedgerEntry], key_fn: F, distinct_fn: G) -> BTreeMap<K, usize>
where
    K: Ord,
    D: Ord,
    F: Fn(&LedgerEntry) -> K,
    G: Fn(&LedgerEntry) -> D,
{
    let mut sets: BTreeMap<K, BTreeSet<D>> = BTreeMap::new();
    for entry in entries {
        sets.entry(key_fn(entry))
            .or_default()
            .insert(distinct_fn(entry));
    }
    sets.into_iter().map(|(k, set)| (k, set.len())).collect()
}

/// Share of a grand total, as a percentage rounded to 2 decimals.
/// A zero grand total yields 0 for every share, never a NaN.
pub fn percentage(value: f64, grand_total: f64) -> f64 {
    if grand_total == 0.0 {
        0.0
    } else {
        (value / grand_total * 10_000.0).round() / 100.0
    }
}

/// Category (RUB/Rubrique) statistics with the opening-balance rows
/// pulled into a synthetic "SO" group that always sorts first; the
/// remaining groups are ordered by debit total descending.
pub fn aggregate_categories(entries: &[LedgerEntry]) -> Vec<GroupStats<String>> {
    let (opening, regular): (Vec<&LedgerEntry>, Vec<&LedgerEntry>) =
        entries.iter().partition(|e| e.is_opening_balance());

    let regular: Vec<LedgerEntry> = regular.into_iter().cloned().collect();
    let mut groups = aggregate(&regular, |e| e.category_code.clone());
    sort_groups(&mut groups, SortMeasure::Debit);

    let so_row = GroupStats {
        key: OPENING_BALANCE_CATEGORY.to_string(),
        count: opening.len(),
        debit_total: opening.iter().map(|e| e.amount_debit).sum(),
        credit_total: opening.iter().map(|e| e.amount_credit).sum(),
    };

    let mut result = Vec::with_capacity(groups.len() + 1);
    result.push(so_row);
    result.extend(groups);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(client: &str, category: &str, label: &str, debit: f64, credit: f64) -> LedgerEntry {
        LedgerEntry {
            amount_debit: debit,
            amount_credit: credit,
            entry_date: None,
            transaction_label: label.to_string(),
            category_code: category.to_string(),
            client_id: client.to_string(),
            client_name: format!("Client {}", client),
            counterparty_id: None,
            counterparty_label: None,
            row_balance: 0.0,
        }
    }

    #[test]
    fn test_aggregate_by_client() {
        let entries = vec![
            entry("1", "FAC", "Facture", 100.0, 0.0),
            entry("1", "FAC", "Facture", 50.0, 25.0),
            entry("2", "REG", "Reglement", 0.0, 80.0),
        ];

        let groups = aggregate(&entries, |e| e.client_id.clone());
        assert_eq!(groups.len(), 2);

        let first = groups.iter().find(|g| g.key == "1").unwrap();
        assert_eq!(first.count, 2);
        assert_eq!(first.debit_total, 150.0);
        assert_eq!(first.credit_total, 25.0);
        assert_eq!(first.net(), 125.0);
        assert_eq!(first.volume(), 175.0);
    }

    #[test]
    fn test_sort_groups_descending_with_key_tiebreak() {
        let entries = vec![
            entry("b", "X", "t", 10.0, 0.0),
            entry("a", "X", "t", 10.0, 0.0),
            entry("c", "X", "t", 99.0, 0.0),
        ];
        let mut groups = aggregate(&entries, |e| e.client_id.clone());
        sort_groups(&mut groups, SortMeasure::Debit);

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_percentage_safe_on_zero_total() {
        assert_eq!(percentage(50.0, 0.0), 0.0);
        assert_eq!(percentage(0.0, 0.0), 0.0);
        assert_eq!(percentage(25.0, 200.0), 12.5);
        assert_eq!(percentage(1.0, 3.0), 33.33);
    }

    #[test]
    fn test_aggregate_categories_so_first() {
        let entries = vec![
            entry("1", "FAC", "Facture", 500.0, 0.0),
            entry("1", "SO", "Solde Ouverture", 100.0, 0.0),
            entry("1", "REG", "Reglement", 900.0, 10.0),
        ];

        let groups = aggregate_categories(&entries);
        assert_eq!(groups[0].key, "SO");
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[0].debit_total, 100.0);
        // Remaining groups by debit descending.
        assert_eq!(groups[1].key, "REG");
        assert_eq!(groups[2].key, "FAC");
    }

    #[test]
    fn test_aggregate_categories_without_opening_rows() {
        let entries = vec![entry("1", "FAC", "Facture", 500.0, 0.0)];
        let groups = aggregate_categories(&entries);
        assert_eq!(groups[0].key, "SO");
        assert_eq!(groups[0].count, 0);
        assert_eq!(groups[0].debit_total, 0.0);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_count_distinct() {
        let entries = vec![
            entry("1", "FAC", "t", 0.0, 0.0),
            entry("1", "REG", "t", 0.0, 0.0),
            entry("1", "FAC", "t", 0.0, 0.0),
            entry("2", "FAC", "t", 0.0, 0.0),
        ];
        let distinct = count_distinct(&entries, |e| e.client_id.clone(), |e| e.category_code.clone());
        assert_eq!(distinct.get("1"), Some(&2));
        assert_eq!(distinct.get("2"), Some(&1));
    }
}
