//! Record validator: normalizes one raw input record (form payload or
//! CSV row) into a typed record, collecting every field failure instead
//! of short-circuiting so a bulk caller sees all problems in one pass.
//! Never touches storage; defaulting is the repository's job.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{ParsedRecord, RawRecord};

/// Currency symbols, thousands separators, and other decoration
/// stripped before numeric parsing.
static NON_NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.\-]").unwrap());

/// Accepted input date formats. Valid dates are normalized to the first
/// form so stored values compare correctly in range filters.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parses a monetary amount, tolerating "$1,200.50" style input.
/// Returns None for unparseable input; negatives are returned as-is and
/// rejected by the caller where that matters.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let cleaned = NON_NUMERIC.replace_all(raw.trim(), "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a calendar date in any accepted format, normalized to
/// YYYY-MM-DD. Returns None when the input is not a real date.
pub fn parse_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Splits a delimited tag string, trimming entries and dropping empties.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Validates and normalizes one record. Returns the typed record plus
/// every validation error found; a record with a non-empty error list
/// must never be submitted.
pub fn validate(raw: &RawRecord) -> (ParsedRecord, Vec<String>) {
    let mut record = ParsedRecord::default();
    let mut errors = Vec::new();

    match present(&raw.name) {
        Some(name) => record.name = name,
        None => errors.push("Name is required".to_string()),
    }

    if let Some(value) = present(&raw.purchase_date) {
        match parse_date(&value) {
            Some(date) => record.purchase_date = Some(date),
            None => errors.push(format!("Invalid purchase date: {}", value)),
        }
    }
    if let Some(value) = present(&raw.date_last_seen) {
        match parse_date(&value) {
            Some(date) => record.date_last_seen = Some(date),
            None => errors.push(format!("Invalid date last seen: {}", value)),
        }
    }

    if let Some(value) = present(&raw.purchase_cost) {
        match parse_currency(&value).filter(|v| *v >= 0.0) {
            Some(amount) => record.purchase_cost = Some(amount),
            None => errors.push(format!("Invalid purchase cost: {}", value)),
        }
    }
    if let Some(value) = present(&raw.estimated_value) {
        match parse_currency(&value).filter(|v| *v >= 0.0) {
            Some(amount) => record.estimated_value = Some(amount),
            None => errors.push(format!("Invalid estimated value: {}", value)),
        }
    }

    if let Some(value) = present(&raw.tags) {
        record.tags = split_tags(&value);
    }

    record.description = present(&raw.description);
    record.serial_number = present(&raw.serial_number);
    record.category = present(&raw.category);
    record.notes = present(&raw.notes);
    record.location_last_seen = present(&raw.location_last_seen);

    (record, errors)
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str) -> RawRecord {
        RawRecord {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_name_required() {
        let (_, errors) = validate(&RawRecord::default());
        assert_eq!(errors, vec!["Name is required".to_string()]);

        let (_, errors) = validate(&raw("   "));
        assert_eq!(errors, vec!["Name is required".to_string()]);
    }

    #[test]
    fn test_valid_record_has_no_errors() {
        let mut input = raw("Drill");
        input.estimated_value = Some("100".to_string());
        input.category = Some("Tools".to_string());
        let (record, errors) = validate(&input);
        assert!(errors.is_empty());
        assert_eq!(record.name, "Drill");
        assert_eq!(record.estimated_value, Some(100.0));
        assert_eq!(record.category.as_deref(), Some("Tools"));
    }

    #[test]
    fn test_invalid_date_reported_and_left_unset() {
        let mut input = raw("Bike");
        input.purchase_date = Some("notadate".to_string());
        let (record, errors) = validate(&input);
        assert_eq!(errors, vec!["Invalid purchase date: notadate".to_string()]);
        assert!(record.purchase_date.is_none());
    }

    #[test]
    fn test_dates_normalized_to_iso() {
        let mut input = raw("Bike");
        input.purchase_date = Some("12/25/2023".to_string());
        input.date_last_seen = Some("2024/01/05".to_string());
        let (record, errors) = validate(&input);
        assert!(errors.is_empty());
        assert_eq!(record.purchase_date.as_deref(), Some("2023-12-25"));
        assert_eq!(record.date_last_seen.as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn test_impossible_date_rejected() {
        let mut input = raw("Bike");
        input.date_last_seen = Some("2023-02-30".to_string());
        let (_, errors) = validate(&input);
        assert_eq!(errors, vec!["Invalid date last seen: 2023-02-30".to_string()]);
    }

    #[test]
    fn test_currency_decoration_stripped() {
        let mut input = raw("TV");
        input.purchase_cost = Some("$1,200.50".to_string());
        let (record, errors) = validate(&input);
        assert!(errors.is_empty());
        assert_eq!(record.purchase_cost, Some(1200.5));
    }

    #[test]
    fn test_unparseable_and_negative_numbers_rejected() {
        let mut input = raw("TV");
        input.purchase_cost = Some("abc".to_string());
        input.estimated_value = Some("-50".to_string());
        let (record, errors) = validate(&input);
        assert_eq!(
            errors,
            vec![
                "Invalid purchase cost: abc".to_string(),
                "Invalid estimated value: -50".to_string(),
            ]
        );
        assert!(record.purchase_cost.is_none());
        assert!(record.estimated_value.is_none());
    }

    #[test]
    fn test_all_errors_collected() {
        let mut input = RawRecord::default();
        input.purchase_date = Some("never".to_string());
        input.estimated_value = Some("lots".to_string());
        let (_, errors) = validate(&input);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_tags_split_and_trimmed() {
        let mut input = raw("Bike");
        input.tags = Some(" red ; bicycle ;; commuter ".to_string());
        let (record, _) = validate(&input);
        assert_eq!(record.tags, vec!["red", "bicycle", "commuter"]);
    }

    #[test]
    fn test_validation_is_idempotent_on_valid_records() {
        let mut input = raw("Bike");
        input.description = Some("Red road bike".to_string());
        input.tags = Some("red; bicycle".to_string());
        input.purchase_cost = Some("$350".to_string());
        input.purchase_date = Some("12/25/2023".to_string());

        let (first, errors) = validate(&input);
        assert!(errors.is_empty());

        let (second, errors) = validate(&first.to_raw());
        assert!(errors.is_empty());
        assert_eq!(first, second);
    }
}
