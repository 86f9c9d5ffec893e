use std::time::Duration;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Caller, ImportResult, ImportRow, RawRecord};
use crate::services::ItemsService;
use crate::validate;

/// Logical fields a spreadsheet column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Description,
    SerialNumber,
    Category,
    Tags,
    Notes,
    PurchaseCost,
    EstimatedValue,
    PurchaseDate,
    DateLastSeen,
    Location,
}

/// Maps a header cell to a logical field. Tolerant of the synonyms
/// spreadsheet exports actually use; unknown headers are ignored.
fn column_for_header(header: &str) -> Option<Column> {
    match header.trim().to_lowercase().as_str() {
        "name" | "item" | "item name" | "title" => Some(Column::Name),
        "description" | "desc" | "details" => Some(Column::Description),
        "serial" | "serial number" | "serial no" | "serial #" | "s/n" => Some(Column::SerialNumber),
        "category" | "type" => Some(Column::Category),
        "tags" | "keywords" | "labels" => Some(Column::Tags),
        "notes" | "comments" | "remarks" => Some(Column::Notes),
        "cost" | "price" | "purchase cost" | "purchase price" => Some(Column::PurchaseCost),
        "value" | "estimated value" | "worth" | "current value" => Some(Column::EstimatedValue),
        "purchase date" | "date purchased" | "purchased" | "date of purchase" => {
            Some(Column::PurchaseDate)
        }
        "date last seen" | "last seen" | "date lost" | "date stolen" => Some(Column::DateLastSeen),
        "location" | "location last seen" | "last location" | "last known location" => {
            Some(Column::Location)
        }
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Pause between row submissions; backpressure on the downstream
    /// store, not a correctness requirement.
    pub row_delay: Duration,
    /// A submission exceeding this becomes a row-level failure instead
    /// of stalling the batch.
    pub row_timeout: Option<Duration>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            row_delay: Duration::from_millis(150),
            row_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Import engine states. The only re-entries are preview → upload
/// (change file) and reset, which returns to upload from anywhere.
#[derive(Debug)]
pub enum ImportState {
    Upload,
    Preview { rows: Vec<ImportRow> },
    Importing,
    Results { result: ImportResult },
}

impl ImportState {
    pub fn name(&self) -> &'static str {
        match self {
            ImportState::Upload => "upload",
            ImportState::Preview { .. } => "preview",
            ImportState::Importing => "importing",
            ImportState::Results { .. } => "results",
        }
    }
}

/// Orchestrates one bulk import: parse the source into rows, preview
/// them (errors included), then submit valid rows sequentially through
/// the item repository. A failure on one row never aborts the batch.
pub struct BulkImporter {
    items: ItemsService,
    caller: Caller,
    options: ImportOptions,
    state: ImportState,
}

impl BulkImporter {
    pub fn new(items: ItemsService, caller: Caller, options: ImportOptions) -> Self {
        Self {
            items,
            caller,
            options,
            state: ImportState::Upload,
        }
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn result(&self) -> Option<&ImportResult> {
        match &self.state {
            ImportState::Results { result } => Some(result),
            _ => None,
        }
    }

    /// upload → preview. Parses the source and retains every row,
    /// failing or not, so the caller can inspect the whole file before
    /// committing.
    pub fn load(&mut self, source: &str) -> AppResult<&[ImportRow]> {
        if !matches!(self.state, ImportState::Upload) {
            return Err(AppError::InvalidState(format!(
                "cannot load a file from the {} state",
                self.state.name()
            )));
        }

        let rows = parse_source(source)?;
        tracing::info!(
            rows = rows.len(),
            ready = rows.iter().filter(|r| r.is_ready()).count(),
            "file parsed for preview"
        );
        self.state = ImportState::Preview { rows };
        match &self.state {
            ImportState::Preview { rows } => Ok(rows),
            _ => Err(AppError::Internal("preview state lost".into())),
        }
    }

    /// preview → upload, discarding parsed rows ("change file").
    pub fn change_file(&mut self) -> AppResult<()> {
        if !matches!(self.state, ImportState::Preview { .. }) {
            return Err(AppError::InvalidState(format!(
                "cannot change file from the {} state",
                self.state.name()
            )));
        }
        self.state = ImportState::Upload;
        Ok(())
    }

    /// Returns to upload from any state, discarding rows and results.
    pub fn reset(&mut self) {
        self.state = ImportState::Upload;
    }

    /// preview → importing → results. Rows with validation errors are
    /// recorded up front; valid rows are submitted one at a time, in
    /// file order, with the configured delay between submissions.
    pub async fn run(&mut self) -> AppResult<&ImportResult> {
        let rows = match std::mem::replace(&mut self.state, ImportState::Importing) {
            ImportState::Preview { rows } => rows,
            other => {
                let message = format!("cannot start importing from the {} state", other.name());
                self.state = other;
                return Err(AppError::InvalidState(message));
            }
        };

        let batch_id = Uuid::new_v4();
        let mut result = ImportResult::new(batch_id);
        tracing::info!(
            %batch_id,
            rows = rows.len(),
            ready = rows.iter().filter(|r| r.is_ready()).count(),
            "starting import"
        );

        let mut submitted_any = false;
        for row in rows {
            if !row.errors.is_empty() {
                result.record_failure(row.row_number, row.errors);
                continue;
            }

            if submitted_any && !self.options.row_delay.is_zero() {
                tokio::time::sleep(self.options.row_delay).await;
            }
            submitted_any = true;

            let new_item = row.record.into_new_item(&self.caller.id);
            let submission = self.items.create(&self.caller, new_item);
            let outcome = match self.options.row_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, submission).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(AppError::Internal("Submission timed out".into())),
                },
                None => submission.await,
            };

            match outcome {
                Ok(item) => {
                    tracing::debug!(row = row.row_number, item_id = item.id, "row imported");
                    result.record_success();
                }
                Err(err) => {
                    tracing::warn!(row = row.row_number, error = %err, "row failed");
                    result.record_failure(row.row_number, vec![err.to_string()]);
                }
            }
        }

        tracing::info!(
            %batch_id,
            success = result.success_count,
            failed = result.failed_count,
            "import finished"
        );
        self.state = ImportState::Results { result };
        match &self.state {
            ImportState::Results { result } => Ok(result),
            _ => Err(AppError::Internal("results state lost".into())),
        }
    }
}

/// Splits the source line-based, maps the header through the synonym
/// table, and validates every data row. Row numbers are the
/// spreadsheet-visible ones: header is row 1, first data row is row 2.
fn parse_source(source: &str) -> AppResult<Vec<ImportRow>> {
    let mut lines = source.lines();
    let header = lines
        .next()
        .ok_or_else(|| AppError::InvalidInput("Import file is empty".into()))?;

    let columns: Vec<Option<Column>> = header.split(',').map(column_for_header).collect();
    if columns.iter().all(Option::is_none) {
        return Err(AppError::InvalidInput(
            "No recognized columns in header".into(),
        ));
    }
    for (cell, column) in header.split(',').zip(&columns) {
        if column.is_none() && !cell.trim().is_empty() {
            tracing::warn!(column = cell.trim(), "unrecognized column ignored");
        }
    }

    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row_number = index + 2;

        let mut raw = RawRecord::default();
        for (cell, column) in line.split(',').zip(&columns) {
            let Some(column) = column else { continue };
            let value = cell.trim();
            if value.is_empty() {
                continue;
            }
            let slot = match column {
                Column::Name => &mut raw.name,
                Column::Description => &mut raw.description,
                Column::SerialNumber => &mut raw.serial_number,
                Column::Category => &mut raw.category,
                Column::Tags => &mut raw.tags,
                Column::Notes => &mut raw.notes,
                Column::PurchaseCost => &mut raw.purchase_cost,
                Column::EstimatedValue => &mut raw.estimated_value,
                Column::PurchaseDate => &mut raw.purchase_date,
                Column::DateLastSeen => &mut raw.date_last_seen,
                Column::Location => &mut raw.location_last_seen,
            };
            *slot = Some(value.to_string());
        }

        let (record, errors) = validate::validate(&raw);
        rows.push(ImportRow {
            row_number,
            record,
            errors,
        });
    }

    Ok(rows)
}
