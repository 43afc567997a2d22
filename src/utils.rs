use chrono::{Datelike, Days, NaiveDate};

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Ordered sequence of first-of-month dates covering `start..=end`.
pub fn month_starts_in_window(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();

    let mut current = first_of_month(start);
    while current <= end {
        dates.push(current);
        current = next_month_start(current);
    }

    dates
}

/// Canonical form of a client/debtor identifier.
///
/// Identifiers arrive as heterogeneous cell values: plain text, padded
/// text, or numbers rendered with a trailing ".0". Both sides of any
/// identifier comparison must go through this. Idempotent.
pub fn normalize_id(raw: &str) -> String {
    let mut id = raw.trim();
    while let Some(stripped) = id.strip_suffix(".0") {
        id = stripped;
    }
    id.to_string()
}

/// Parses a monetary cell into f64, defaulting to 0.0 when unparsable.
///
/// Tolerates thousands separators (regular spaces and NBSP) and a
/// decimal comma, both of which show up in the source spreadsheets.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{00A0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    cleaned.parse::<f64>().unwrap_or(0.0)
}

const EXCEL_SERIAL_MIN: f64 = 36526.0; // 2000-01-01
const EXCEL_SERIAL_MAX: f64 = 73415.0; // 2100-12-31

/// Parses an entry date cell, day-first, returning None when the value
/// cannot be read as a plausible date.
///
/// Accepts d/m/Y and d-m-Y forms, ISO dates (with or without a time
/// suffix as produced by some exports), and raw Excel serial numbers
/// (day counts from 1899-12-30). Dates outside 2000..=2100 are treated
/// as unparsable.
pub fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);

    for format in ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return in_plausible_range(date);
        }
    }

    // Excel serial fallback: numeric day count from the 1899-12-30 origin.
    if let Ok(serial) = trimmed.parse::<f64>() {
        if (EXCEL_SERIAL_MIN..=EXCEL_SERIAL_MAX).contains(&serial) {
            let origin = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            return origin
                .checked_add_days(Days::new(serial as u64))
                .and_then(in_plausible_range);
        }
    }

    None
}

fn in_plausible_range(date: NaiveDate) -> Option<NaiveDate> {
    if (2000..=2100).contains(&date.year()) {
        Some(date)
    } else {
        None
    }
}
