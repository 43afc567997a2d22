use crate::schema::{SchemaKind, ALT_MARKERS, ORIGINAL_MARKERS};
use log::debug;

/// Classifies a column set into one of the two known layouts.
///
/// Pure function of the column names: `Original` when all original
/// markers are present and the alternative set is incomplete,
/// `Alternative` symmetrically, `Mixed` when both sets are fully
/// present (the caller must ask the user to choose), `Unrecognized`
/// otherwise.
pub fn classify<S: AsRef<str>>(columns: &[S]) -> SchemaKind {
    let has = |name: &str| columns.iter().any(|c| c.as_ref() == name);

    let has_original = ORIGINAL_MARKERS.iter().all(|m| has(m));
    let has_alternative = ALT_MARKERS.iter().all(|m| has(m));

    let kind = match (has_original, has_alternative) {
        (true, false) => SchemaKind::Original,
        (false, true) => SchemaKind::Alternative,
        (true, true) => SchemaKind::Mixed,
        (false, false) => SchemaKind::Unrecognized,
    };

    debug!("Column layout classified as {:?}", kind);
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original_columns() -> Vec<&'static str> {
        vec![
            "TIRES",
            "Debtor Number",
            "EntryAmountSAC",
            "RUB",
            "Client Number",
            "Legal Client Name",
            "EntryAmount",
            "EntryDate",
            "Transaction",
            "solde",
        ]
    }

    fn alternative_columns() -> Vec<&'static str> {
        vec![
            "Entry Amount SAC",
            "Rubrique",
            "MVT",
            "ledger item id",
            "Entry Amount",
            "TRANSACTION",
            "Solde",
            "Client Number",
            "Legal Client Name",
            "EntryDate",
            "DueDate",
            "Document Number",
        ]
    }

    #[test]
    fn test_classify_original() {
        assert_eq!(classify(&original_columns()), SchemaKind::Original);
    }

    #[test]
    fn test_classify_alternative() {
        assert_eq!(classify(&alternative_columns()), SchemaKind::Alternative);
    }

    #[test]
    fn test_classify_mixed() {
        let mut columns = original_columns();
        columns.extend(alternative_columns());
        assert_eq!(classify(&columns), SchemaKind::Mixed);
    }

    #[test]
    fn test_classify_unrecognized() {
        assert_eq!(
            classify(&["Date", "Amount", "Description"]),
            SchemaKind::Unrecognized
        );
        // A partial marker set is not enough.
        assert_eq!(
            classify(&["TIRES", "Debtor Number", "RUB"]),
            SchemaKind::Unrecognized
        );
        assert_eq!(classify::<&str>(&[]), SchemaKind::Unrecognized);
    }

    #[test]
    fn test_classify_deterministic() {
        let columns = original_columns();
        let first = classify(&columns);
        for _ in 0..10 {
            assert_eq!(classify(&columns), first);
        }
    }
}
