//! Bulk-import CLI: loads a CSV export and submits it through the full
//! import pipeline as the caller described by the environment.
//!
//! Usage:
//!   DATABASE_URL=sqlite://recover.db \
//!   IMPORT_USER_ID=<user> IMPORT_TENANT_ID=<tenant> \
//!   import-csv <file.csv>

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_recover::db::{create_pool, init_schema};
use rust_recover::models::{Caller, Role};
use rust_recover::services::{BulkImporter, ItemsService};
use rust_recover::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_recover=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let Some(path) = env::args().nth(1) else {
        bail!("usage: import-csv <file.csv>");
    };

    let user_id = env::var("IMPORT_USER_ID").context("IMPORT_USER_ID is required")?;
    let role = match env::var("IMPORT_ROLE") {
        Ok(value) => Role::from_str(&value).map_err(anyhow::Error::msg)?,
        Err(_) => Role::PropertyOwner,
    };
    let tenant_id = env::var("IMPORT_TENANT_ID").ok();
    let caller = Caller::new(user_id, role, tenant_id.as_deref());

    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path))?;

    let pool = create_pool(&config.database_url).await?;
    init_schema(&pool).await?;

    let items = ItemsService::new(pool);
    let mut importer = BulkImporter::new(items, caller, config.import_options());

    {
        let rows = importer.load(&source)?;
        tracing::info!(
            rows = rows.len(),
            ready = rows.iter().filter(|r| r.is_ready()).count(),
            "preview ready"
        );
    }

    let result = importer.run().await?;
    tracing::info!(
        batch_id = %result.batch_id,
        success = result.success_count,
        failed = result.failed_count,
        "import complete"
    );
    for failure in &result.row_errors {
        tracing::warn!(
            row = failure.row_number,
            errors = ?failure.errors,
            "row not imported"
        );
    }

    Ok(())
}
