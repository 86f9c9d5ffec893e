use serde::Serialize;
use uuid::Uuid;

use crate::models::NewItem;

/// One record as read from the input source, before validation. Every
/// field is an untyped optional string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub notes: Option<String>,
    pub purchase_cost: Option<String>,
    pub estimated_value: Option<String>,
    pub purchase_date: Option<String>,
    pub date_last_seen: Option<String>,
    pub location_last_seen: Option<String>,
}

/// The typed output of the validator. Fields that failed validation are
/// left unset so creation-time defaulting can apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRecord {
    pub name: String,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub purchase_cost: Option<f64>,
    pub estimated_value: Option<f64>,
    pub purchase_date: Option<String>,
    pub date_last_seen: Option<String>,
    pub location_last_seen: Option<String>,
}

impl ParsedRecord {
    /// Renders the record back into raw form. Re-validating the result
    /// of a successful validation is a no-op.
    pub fn to_raw(&self) -> RawRecord {
        RawRecord {
            name: Some(self.name.clone()),
            description: self.description.clone(),
            serial_number: self.serial_number.clone(),
            category: self.category.clone(),
            tags: if self.tags.is_empty() {
                None
            } else {
                Some(self.tags.join("; "))
            },
            notes: self.notes.clone(),
            purchase_cost: self.purchase_cost.map(|v| v.to_string()),
            estimated_value: self.estimated_value.map(|v| v.to_string()),
            purchase_date: self.purchase_date.clone(),
            date_last_seen: self.date_last_seen.clone(),
            location_last_seen: self.location_last_seen.clone(),
        }
    }

    /// Builds the creation payload for a validated row. Missing fields
    /// stay unset; the repository applies defaults at construction.
    pub fn into_new_item(self, owner_id: &str) -> NewItem {
        NewItem {
            name: self.name,
            owner_id: owner_id.to_string(),
            description: self.description,
            serial_number: self.serial_number,
            category: self.category,
            tags: self.tags,
            notes: self.notes,
            purchase_cost: self.purchase_cost,
            estimated_value: self.estimated_value,
            purchase_date: self.purchase_date,
            date_last_seen: self.date_last_seen,
            location_last_seen: self.location_last_seen,
            tenant_id: None,
        }
    }
}

/// One parsed row of an import source, retained through preview whether
/// or not it validated. `row_number` is the spreadsheet-visible row:
/// the header is row 1, the first data row is row 2.
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub row_number: usize,
    pub record: ParsedRecord,
    pub errors: Vec<String>,
}

impl ImportRow {
    pub fn is_ready(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A failed row in the terminal report. Pre-validation failures and
/// submission-time failures share this shape so callers need only one
/// error-rendering path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    pub row_number: usize,
    pub errors: Vec<String>,
}

/// Terminal accounting for one batch run. Built incrementally while
/// importing; immutable once the batch reaches results.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub batch_id: Uuid,
    pub success_count: usize,
    pub failed_count: usize,
    pub row_errors: Vec<RowFailure>,
}

impl ImportResult {
    pub fn new(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            success_count: 0,
            failed_count: 0,
            row_errors: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, row_number: usize, errors: Vec<String>) {
        self.failed_count += 1;
        self.row_errors.push(RowFailure { row_number, errors });
    }

    pub fn total(&self) -> usize {
        self.success_count + self.failed_count
    }
}
