//! Session-scoped application state: the loaded dataset, the sticky
//! schema choice, and the last search inputs. One user, one session,
//! synchronous request/response; every view reads this state, only the
//! load/select/search actions write it.

use crate::detect::classify;
use crate::error::{LedgerError, Result};
use crate::ingestion::{build_dataset, Sheet};
use crate::rollforward::RollForward;
use crate::schema::{Dataset, SchemaKind};
use crate::views::{
    client_analysis, client_directory, client_search, debtor_analysis, debtor_directory,
    general_analysis, ClientAnalysis, ClientDirectoryRow, ClientSearchResult, DebtorAnalysis,
    DebtorDirectoryRow, GeneralAnalysis,
};
use log::{info, warn};

pub struct Session {
    dataset: Option<Dataset>,
    detected: Option<SchemaKind>,
    /// Sticky user choice after a Mixed detection.
    schema_choice: Option<SchemaKind>,
    last_client_search: String,
    last_debtor_search: String,
    window: RollForward,
    pending: Option<(Sheet, usize)>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            dataset: None,
            detected: None,
            schema_choice: None,
            last_client_search: String::new(),
            last_debtor_search: String::new(),
            window: RollForward::default(),
            pending: None,
        }
    }

    pub fn with_window(window: RollForward) -> Self {
        Self {
            window,
            ..Self::new()
        }
    }

    /// Loads a sheet, classifies its layout, and (unless the layout is
    /// ambiguous or unrecognized) builds the dataset. Clears any state
    /// from a previous load. Returns the detected [`SchemaKind`]; on
    /// `Mixed`, the caller must follow up with [`Session::choose_schema`]
    /// before any analysis.
    pub fn load(&mut self, sheet: Sheet, header_row: usize) -> Result<SchemaKind> {
        let window = std::mem::take(&mut self.window);
        *self = Self::with_window(window);

        let columns = sheet.header(header_row)?;
        let kind = classify(&columns);
        self.detected = Some(kind);

        match kind {
            SchemaKind::Original | SchemaKind::Alternative => {
                self.dataset = Some(build_dataset(&sheet, header_row, kind)?);
                info!("Dataset loaded with {:?} layout", kind);
            }
            SchemaKind::Mixed => {
                warn!("Both column layouts present; awaiting an explicit choice");
                self.pending = Some((sheet, header_row));
            }
            SchemaKind::Unrecognized => {
                warn!("Unrecognized column layout; analysis blocked");
                return Err(LedgerError::SchemaUnrecognized { columns });
            }
        }

        Ok(kind)
    }

    /// Resolves a `Mixed` detection with an explicit user choice. The
    /// choice is sticky for the rest of the session.
    pub fn choose_schema(&mut self, choice: SchemaKind) -> Result<()> {
        if !matches!(choice, SchemaKind::Original | SchemaKind::Alternative) {
            return Err(LedgerError::SchemaAmbiguous);
        }

        let (sheet, header_row) = self.pending.take().ok_or(LedgerError::NoDataset)?;
        self.dataset = Some(build_dataset(&sheet, header_row, choice)?);
        self.schema_choice = Some(choice);
        info!("Schema ambiguity resolved to {:?}", choice);
        Ok(())
    }

    /// The layout analyses run against: the sticky choice when one was
    /// made, the detected layout otherwise.
    pub fn effective_schema(&self) -> Option<SchemaKind> {
        self.schema_choice.or(self.detected)
    }

    pub fn dataset(&self) -> Result<&Dataset> {
        match self.dataset.as_ref() {
            Some(dataset) => Ok(dataset),
            None if self.pending.is_some() => Err(LedgerError::SchemaAmbiguous),
            None => Err(LedgerError::NoDataset),
        }
    }

    pub fn last_client_search(&self) -> &str {
        &self.last_client_search
    }

    pub fn last_debtor_search(&self) -> &str {
        &self.last_debtor_search
    }

    // ------------------------------------------------------------------
    // Analysis requests (pure recomputation per call)
    // ------------------------------------------------------------------

    pub fn client_directory(&self) -> Result<Vec<ClientDirectoryRow>> {
        client_directory(self.dataset()?)
    }

    pub fn client_analysis(&mut self, raw_input: &str) -> Result<ClientAnalysis> {
        self.last_client_search = raw_input.trim().to_string();
        client_analysis(self.dataset()?, raw_input, &self.window)
    }

    pub fn debtor_directory(&self) -> Result<Vec<DebtorDirectoryRow>> {
        debtor_directory(self.dataset()?)
    }

    pub fn debtor_analysis(&mut self, raw_input: &str) -> Result<DebtorAnalysis> {
        self.last_debtor_search = raw_input.trim().to_string();
        debtor_analysis(self.dataset()?, raw_input, &self.window)
    }

    pub fn general_analysis(&self) -> Result<GeneralAnalysis> {
        general_analysis(self.dataset()?)
    }

    pub fn client_search(&mut self, raw_input: &str) -> Result<ClientSearchResult> {
        self.last_client_search = raw_input.trim().to_string();
        client_search(self.dataset()?, raw_input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        vec![
            "Client Number".into(),
            "Legal Client Name".into(),
            "TIRES".into(),
            "Debtor Number".into(),
            "EntryAmount".into(),
            "EntryAmountSAC".into(),
            "EntryDate".into(),
            "Transaction".into(),
            "RUB".into(),
            "solde".into(),
        ]
    }

    fn row(client: &str, debit: &str, credit: &str, date: &str, label: &str) -> Vec<String> {
        vec![
            client.into(),
            "ACME".into(),
            "TR".into(),
            "501".into(),
            debit.into(),
            credit.into(),
            date.into(),
            label.into(),
            "FAC".into(),
            "0".into(),
        ]
    }

    fn sheet() -> Sheet {
        Sheet::new(vec![
            header(),
            row("1023.0", "100", "0", "15/01/2025", "Solde Ouverture"),
            row("1023.0", "50", "20", "10/02/2025", "Facture"),
        ])
    }

    #[test]
    fn test_load_and_analyze() {
        let mut session = Session::new();
        let kind = session.load(sheet(), 1).unwrap();
        assert_eq!(kind, SchemaKind::Original);
        assert_eq!(session.effective_schema(), Some(SchemaKind::Original));

        let analysis = session.client_analysis("1023").unwrap();
        assert_eq!(analysis.summary.opening_balance, 100.0);
        assert_eq!(session.last_client_search(), "1023");
    }

    #[test]
    fn test_unrecognized_layout_blocks() {
        let mut session = Session::new();
        let sheet = Sheet::new(vec![vec!["Date".into(), "Amount".into()]]);
        let err = session.load(sheet, 1);
        assert!(matches!(
            err,
            Err(LedgerError::SchemaUnrecognized { ref columns }) if columns.len() == 2
        ));
        assert!(matches!(session.dataset(), Err(LedgerError::NoDataset)));
    }

    #[test]
    fn test_mixed_layout_requires_choice() {
        let mut columns = header();
        columns.extend([
            "Entry Amount SAC".to_string(),
            "Rubrique".to_string(),
            "MVT".to_string(),
            "ledger item id".to_string(),
        ]);
        let mut data = row("1023.0", "10", "0", "15/01/2025", "Facture");
        data.extend(["".to_string(), "".to_string(), "".to_string(), "".to_string()]);
        let sheet = Sheet::new(vec![columns, data]);

        let mut session = Session::new();
        assert_eq!(session.load(sheet, 1).unwrap(), SchemaKind::Mixed);
        // Analysis is blocked until the user chooses.
        assert!(matches!(
            session.dataset(),
            Err(LedgerError::SchemaAmbiguous)
        ));

        session.choose_schema(SchemaKind::Original).unwrap();
        assert_eq!(session.effective_schema(), Some(SchemaKind::Original));
        assert_eq!(session.dataset().unwrap().entries.len(), 1);
    }

    #[test]
    fn test_choose_schema_rejects_non_layouts() {
        let mut session = Session::new();
        assert!(session.choose_schema(SchemaKind::Mixed).is_err());
    }

    #[test]
    fn test_new_load_clears_state() {
        let mut session = Session::new();
        session.load(sheet(), 1).unwrap();
        session.client_analysis("1023").unwrap();

        session.load(sheet(), 1).unwrap();
        assert_eq!(session.last_client_search(), "");
    }
}
