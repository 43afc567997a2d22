//! Mapping from a raw spreadsheet grid to the typed [`Dataset`].
//!
//! The spreadsheet reader itself is an external collaborator; this
//! module starts from its output, a grid of cell strings plus a
//! user-chosen 1-based header row, and performs the fallible mapping to
//! [`LedgerEntry`] with the defaulting rules of the data model
//! (unparsable amounts become 0.0, unparsable dates become `None`).

use crate::detect::classify;
use crate::error::{LedgerError, Result};
use crate::schema::{Dataset, LedgerEntry, SchemaKind};
use crate::utils::{parse_amount, parse_entry_date};
use log::{debug, info};

/// A raw sheet: rows of cell values, exactly as read from the file.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Cleaned column names from the given 1-based header row: trimmed,
    /// embedded newlines stripped, blank cells defaulted to `Unnamed_<i>`.
    pub fn header(&self, header_row: usize) -> Result<Vec<String>> {
        if header_row == 0 || header_row > self.rows.len() {
            return Err(LedgerError::HeaderRowOutOfRange {
                row: header_row,
                sheet_rows: self.rows.len(),
            });
        }

        let columns = self.rows[header_row - 1]
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let name: String = cell
                    .trim()
                    .chars()
                    .filter(|c| *c != '\n' && *c != '\r')
                    .collect();
                if name.is_empty() {
                    format!("Unnamed_{}", i)
                } else {
                    name
                }
            })
            .collect();

        Ok(columns)
    }

    /// Data rows below the header; empty when the header row is at or
    /// past the end of the sheet.
    pub fn data_rows(&self, header_row: usize) -> &[Vec<String>] {
        self.rows.get(header_row..).unwrap_or(&[])
    }
}

/// Resolved cell positions for the typed fields of one layout.
struct ColumnMap {
    debit: Option<usize>,
    credit: Option<usize>,
    date: Option<usize>,
    label: Option<usize>,
    category: Option<usize>,
    client_id: Option<usize>,
    client_name: Option<usize>,
    counterparty_id: Option<usize>,
    counterparty_label: Option<usize>,
    row_balance: Option<usize>,
}

impl ColumnMap {
    fn resolve(columns: &[String], schema: SchemaKind) -> Self {
        let index = |name: &str| columns.iter().position(|c| c == name);

        match schema {
            SchemaKind::Alternative => Self {
                debit: index("Entry Amount"),
                credit: index("Entry Amount SAC"),
                date: index("EntryDate"),
                label: index("TRANSACTION"),
                category: index("Rubrique"),
                client_id: index("Client Number"),
                client_name: index("Legal Client Name"),
                counterparty_id: None,
                counterparty_label: None,
                row_balance: index("Solde"),
            },
            // Original is the default mapping; Mixed/Unrecognized never
            // reach entry mapping (the session blocks them first).
            _ => Self {
                debit: index("EntryAmount"),
                credit: index("EntryAmountSAC"),
                date: index("EntryDate"),
                label: index("Transaction"),
                category: index("RUB"),
                client_id: index("Client Number"),
                client_name: index("Legal Client Name"),
                counterparty_id: index("Debtor Number"),
                counterparty_label: index("TIRES"),
                row_balance: index("solde"),
            },
        }
    }
}

fn cell<'a>(row: &'a [String], index: Option<usize>) -> &'a str {
    index.and_then(|i| row.get(i)).map_or("", |s| s.as_str())
}

fn map_entry(row: &[String], map: &ColumnMap) -> LedgerEntry {
    LedgerEntry {
        amount_debit: parse_amount(cell(row, map.debit)),
        amount_credit: parse_amount(cell(row, map.credit)),
        entry_date: parse_entry_date(cell(row, map.date)),
        transaction_label: cell(row, map.label).trim().to_string(),
        category_code: cell(row, map.category).trim().to_string(),
        client_id: cell(row, map.client_id).trim().to_string(),
        client_name: cell(row, map.client_name).trim().to_string(),
        counterparty_id: map
            .counterparty_id
            .map(|_| cell(row, map.counterparty_id).trim().to_string()),
        counterparty_label: map
            .counterparty_label
            .map(|_| cell(row, map.counterparty_label).trim().to_string()),
        row_balance: parse_amount(cell(row, map.row_balance)),
    }
}

/// Builds the typed dataset for a sheet whose layout has already been
/// resolved to `Original` or `Alternative`.
pub fn build_dataset(sheet: &Sheet, header_row: usize, schema: SchemaKind) -> Result<Dataset> {
    debug_assert!(matches!(
        schema,
        SchemaKind::Original | SchemaKind::Alternative
    ));

    let columns = sheet.header(header_row)?;
    let map = ColumnMap::resolve(&columns, schema);

    let entries: Vec<LedgerEntry> = sheet
        .data_rows(header_row)
        .iter()
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .map(|row| map_entry(row, &map))
        .collect();

    info!(
        "Ingested {} entries ({} columns, {:?} layout)",
        entries.len(),
        columns.len(),
        schema
    );

    Ok(Dataset {
        columns,
        schema,
        entries,
    })
}

/// Reads the header of a sheet and classifies its layout in one step.
pub fn detect_layout(sheet: &Sheet, header_row: usize) -> Result<(Vec<String>, SchemaKind)> {
    let columns = sheet.header(header_row)?;
    let kind = classify(&columns);
    debug!("Detected layout {:?} for header row {}", kind, header_row);
    Ok((columns, kind))
}
