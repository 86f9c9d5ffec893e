pub mod bulk_import;
pub mod items_service;

pub use bulk_import::{BulkImporter, ImportOptions, ImportState};
pub use items_service::{ItemQuery, ItemsService, RawQuery};
