use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{
    Caller, DeleteReceipt, EvidenceCounts, EvidenceKind, EvidenceModel, ItemModel, ItemPage,
    ItemPatch, NewItem,
};
use crate::policy::{self, TenantScope};
use crate::validate;

const ITEM_COLUMNS: &str = "id, owner_id, tenant_id, name, description, serial_number, category, \
     tags, notes, purchase_cost, estimated_value, purchase_date, date_last_seen, \
     location_last_seen, created_at, updated_at";

/// Raw, unvalidated list parameters as they arrive from a caller.
#[derive(Debug, Clone, Default)]
pub struct RawQuery {
    pub search: Option<String>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Validated list parameters.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub search: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ItemQuery {
    pub fn parse(raw: RawQuery) -> AppResult<ItemQuery> {
        let mut query = ItemQuery {
            search: non_blank(raw.search),
            ..Default::default()
        };

        if let Some(value) = non_blank(raw.min_value) {
            query.min_value = Some(parse_bound(&value).ok_or_else(|| {
                AppError::InvalidInput("Invalid minimum value. Must be a positive number.".into())
            })?);
        }
        if let Some(value) = non_blank(raw.max_value) {
            query.max_value = Some(parse_bound(&value).ok_or_else(|| {
                AppError::InvalidInput("Invalid maximum value. Must be a positive number.".into())
            })?);
        }

        if let Some(value) = non_blank(raw.start_date) {
            if chrono::NaiveDate::parse_from_str(&value, "%Y-%m-%d").is_err() {
                return Err(AppError::InvalidInput(
                    "Invalid start date format. Use YYYY-MM-DD.".into(),
                ));
            }
            query.start_date = Some(value);
        }
        if let Some(value) = non_blank(raw.end_date) {
            if chrono::NaiveDate::parse_from_str(&value, "%Y-%m-%d").is_err() {
                return Err(AppError::InvalidInput(
                    "Invalid end date format. Use YYYY-MM-DD.".into(),
                ));
            }
            query.end_date = Some(value);
        }

        if let (Some(start), Some(end)) = (&query.start_date, &query.end_date) {
            if start > end {
                return Err(AppError::InvalidInput(
                    "Start date cannot be after end date.".into(),
                ));
            }
        }

        Ok(query)
    }
}

/// Tenant-aware CRUD facade over the items store. Every operation takes
/// the resolved caller explicitly and consults the tenant access policy
/// before touching storage.
#[derive(Clone)]
pub struct ItemsService {
    pool: SqlitePool,
}

impl ItemsService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists items visible to the caller, newest first, with optional
    /// storage-level filters. `total` counts matches under the same
    /// predicate.
    pub async fn list(&self, caller: &Caller, query: &ItemQuery) -> AppResult<ItemPage> {
        let scope_tenant = match policy::scope_for(caller) {
            TenantScope::Deny => {
                return Ok(ItemPage {
                    items: Vec::new(),
                    total: 0,
                })
            }
            TenantScope::Unrestricted => None,
            TenantScope::Tenant(tenant) => Some(tenant),
        };

        // Conditions and binds are pushed in the same fixed order.
        let mut conditions: Vec<&str> = Vec::new();
        if scope_tenant.is_some() {
            conditions.push("tenant_id = ?");
        }
        if query.search.is_some() {
            conditions.push(
                "(lower(name) LIKE '%' || lower(?) || '%' \
                 OR lower(description) LIKE '%' || lower(?) || '%' \
                 OR lower(serial_number) LIKE '%' || lower(?) || '%' \
                 OR lower(location_last_seen) LIKE '%' || lower(?) || '%')",
            );
        }
        if query.min_value.is_some() {
            conditions.push("estimated_value >= ?");
        }
        if query.max_value.is_some() {
            conditions.push("estimated_value <= ?");
        }
        if query.start_date.is_some() {
            conditions.push("date_last_seen >= ?");
        }
        if query.end_date.is_some() {
            conditions.push("date_last_seen <= ?");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_sql = format!(
            "SELECT {} FROM items {} ORDER BY created_at DESC, id DESC",
            ITEM_COLUMNS, where_clause
        );
        let count_sql = format!("SELECT COUNT(*) FROM items {}", where_clause);

        let mut select = sqlx::query_as::<_, ItemModel>(&select_sql);
        let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(tenant) = &scope_tenant {
            select = select.bind(tenant);
            count = count.bind(tenant);
        }
        if let Some(term) = &query.search {
            for _ in 0..4 {
                select = select.bind(term);
                count = count.bind(term);
            }
        }
        if let Some(min) = query.min_value {
            select = select.bind(min);
            count = count.bind(min);
        }
        if let Some(max) = query.max_value {
            select = select.bind(max);
            count = count.bind(max);
        }
        if let Some(start) = &query.start_date {
            select = select.bind(start);
            count = count.bind(start);
        }
        if let Some(end) = &query.end_date {
            select = select.bind(end);
            count = count.bind(end);
        }

        let items = select.fetch_all(&self.pool).await?;
        let total = count.fetch_one(&self.pool).await?;

        Ok(ItemPage { items, total })
    }

    /// Fetches one item, enforcing the access policy. Distinguishes
    /// "doesn't exist" (NotFound) from "exists but not yours"
    /// (Forbidden); both are reachable by id guessing.
    pub async fn get(&self, caller: &Caller, id: i64) -> AppResult<ItemModel> {
        let item = self
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".into()))?;
        self.authorize(caller, &item)?;
        Ok(item)
    }

    /// Creates an item for the caller's own tenant. Any tenant supplied
    /// in the payload is ignored.
    pub async fn create(&self, caller: &Caller, new: NewItem) -> AppResult<ItemModel> {
        if new.name.trim().is_empty() {
            return Err(AppError::InvalidInput("Name is required".into()));
        }
        if new.owner_id.trim().is_empty() {
            return Err(AppError::InvalidInput("Owner is required".into()));
        }
        if new.purchase_cost.is_some_and(|v| v < 0.0) {
            return Err(AppError::InvalidInput(
                "Invalid purchase cost. Must be a positive number.".into(),
            ));
        }
        if new.estimated_value.is_some_and(|v| v < 0.0) {
            return Err(AppError::InvalidInput(
                "Invalid estimated value. Must be a positive number.".into(),
            ));
        }

        let tenant_id = caller
            .tenant_id
            .clone()
            .ok_or_else(|| AppError::Forbidden("Caller has no tenant assigned".into()))?;

        if let Some(requested) = &new.tenant_id {
            if *requested != tenant_id {
                tracing::debug!(
                    requested_tenant = %requested,
                    stamped_tenant = %tenant_id,
                    "ignoring caller-supplied tenant on create"
                );
            }
        }

        let record = new.with_defaults();

        let result = sqlx::query(
            "INSERT INTO items (owner_id, tenant_id, name, description, serial_number, category, \
             tags, notes, purchase_cost, estimated_value, purchase_date, date_last_seen, \
             location_last_seen) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.owner_id)
        .bind(&tenant_id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.serial_number)
        .bind(&record.category)
        .bind(Json(&record.tags))
        .bind(&record.notes)
        .bind(record.purchase_cost)
        .bind(record.estimated_value)
        .bind(&record.purchase_date)
        .bind(&record.date_last_seen)
        .bind(&record.location_last_seen)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(item_id = id, tenant_id = %tenant_id, "item created");

        self.fetch_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal("inserted item not found".into()))
    }

    /// Applies a partial update. Fetch-then-authorize, so an unknown id
    /// is NotFound and a foreign tenant's id is Forbidden.
    pub async fn update(&self, caller: &Caller, id: i64, patch: ItemPatch) -> AppResult<ItemModel> {
        let existing = self
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".into()))?;
        self.authorize(caller, &existing)?;

        if patch.is_empty() {
            return Ok(existing);
        }

        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::InvalidInput("Name is required".into()));
        }
        if patch.purchase_cost.is_some_and(|v| v < 0.0) {
            return Err(AppError::InvalidInput(
                "Invalid purchase cost. Must be a positive number.".into(),
            ));
        }
        if patch.estimated_value.is_some_and(|v| v < 0.0) {
            return Err(AppError::InvalidInput(
                "Invalid estimated value. Must be a positive number.".into(),
            ));
        }

        let purchase_date = parse_patch_date(&patch.purchase_date, "purchase date")?;
        let date_last_seen = parse_patch_date(&patch.date_last_seen, "date last seen")?;

        // SET fragments and binds are pushed in the same fixed order.
        let mut sets: Vec<&str> = Vec::new();
        if patch.name.is_some() {
            sets.push("name = ?");
        }
        if patch.description.is_some() {
            sets.push("description = ?");
        }
        if patch.serial_number.is_some() {
            sets.push("serial_number = ?");
        }
        if patch.category.is_some() {
            sets.push("category = ?");
        }
        if patch.tags.is_some() {
            sets.push("tags = ?");
        }
        if patch.notes.is_some() {
            sets.push("notes = ?");
        }
        if patch.purchase_cost.is_some() {
            sets.push("purchase_cost = ?");
        }
        if patch.estimated_value.is_some() {
            sets.push("estimated_value = ?");
        }
        if purchase_date.is_some() {
            sets.push("purchase_date = ?");
        }
        if date_last_seen.is_some() {
            sets.push("date_last_seen = ?");
        }
        if patch.location_last_seen.is_some() {
            sets.push("location_last_seen = ?");
        }
        sets.push("updated_at = datetime('now')");

        let sql = format!("UPDATE items SET {} WHERE id = ?", sets.join(", "));

        let mut update = sqlx::query(&sql);
        if let Some(name) = &patch.name {
            update = update.bind(name.trim().to_string());
        }
        if let Some(description) = &patch.description {
            update = update.bind(description);
        }
        if let Some(serial_number) = &patch.serial_number {
            update = update.bind(serial_number);
        }
        if let Some(category) = &patch.category {
            update = update.bind(category);
        }
        if let Some(tags) = &patch.tags {
            update = update.bind(Json(tags));
        }
        if let Some(notes) = &patch.notes {
            update = update.bind(notes);
        }
        if let Some(cost) = patch.purchase_cost {
            update = update.bind(cost);
        }
        if let Some(value) = patch.estimated_value {
            update = update.bind(value);
        }
        if let Some(date) = &purchase_date {
            update = update.bind(date);
        }
        if let Some(date) = &date_last_seen {
            update = update.bind(date);
        }
        if let Some(location) = &patch.location_last_seen {
            update = update.bind(location);
        }
        update.bind(id).execute(&self.pool).await?;

        self.fetch_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal("updated item not found".into()))
    }

    /// Deletes an item; its evidence rows go with it via the storage
    /// cascade. The receipt reports the item's name and evidence count.
    pub async fn delete(&self, caller: &Caller, id: i64) -> AppResult<DeleteReceipt> {
        let existing = self
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".into()))?;
        self.authorize(caller, &existing)?;

        let evidence_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM evidence WHERE item_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!(item_id = id, evidence_count, "item deleted");

        Ok(DeleteReceipt {
            message: format!(
                "Deleted \"{}\" and {} evidence file(s)",
                existing.name, evidence_count
            ),
        })
    }

    /// Attaches an evidence entry to an item the caller may touch. The
    /// binary payload lives in external storage; only metadata lands
    /// here.
    pub async fn add_evidence(
        &self,
        caller: &Caller,
        item_id: i64,
        kind: EvidenceKind,
        file_name: &str,
    ) -> AppResult<EvidenceModel> {
        if file_name.trim().is_empty() {
            return Err(AppError::InvalidInput("File name is required".into()));
        }
        let item = self
            .fetch_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".into()))?;
        self.authorize(caller, &item)?;

        let result = sqlx::query("INSERT INTO evidence (item_id, kind, file_name) VALUES (?, ?, ?)")
            .bind(item_id)
            .bind(kind.as_str())
            .bind(file_name.trim())
            .execute(&self.pool)
            .await?;

        let evidence: EvidenceModel = sqlx::query_as(
            "SELECT id, item_id, kind, file_name, created_at FROM evidence WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_one(&self.pool)
        .await?;

        Ok(evidence)
    }

    /// Per-kind evidence tally for one item, policy-checked.
    pub async fn evidence_counts(&self, caller: &Caller, item_id: i64) -> AppResult<EvidenceCounts> {
        let item = self
            .fetch_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".into()))?;
        self.authorize(caller, &item)?;

        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT kind, COUNT(*) FROM evidence WHERE item_id = ? GROUP BY kind")
                .bind(item_id)
                .fetch_all(&self.pool)
                .await?;

        let mut counts = EvidenceCounts::default();
        for (kind, count) in rows {
            if let Ok(kind) = kind.parse::<EvidenceKind>() {
                for _ in 0..count {
                    counts.add(kind);
                }
            }
        }
        Ok(counts)
    }

    fn authorize(&self, caller: &Caller, item: &ItemModel) -> AppResult<()> {
        if policy::can_access(caller.role, caller.tenant_id.as_deref(), &item.tenant_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have access to this item".into(),
            ))
        }
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<ItemModel>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM items WHERE id = ?",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bound(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Patch dates: blank means "no change"; present values must parse and
/// are normalized like the validator does.
fn parse_patch_date(value: &Option<String>, label: &str) -> AppResult<Option<String>> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => validate::parse_date(v)
            .map(Some)
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid {}: {}", label, v))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init_schema};
    use crate::models::Role;

    async fn setup() -> ItemsService {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        ItemsService::new(pool)
    }

    fn owner(tenant: &str) -> Caller {
        Caller::new(format!("owner-{}", tenant), Role::PropertyOwner, Some(tenant))
    }

    fn named_item(name: &str) -> NewItem {
        NewItem {
            name: name.to_string(),
            owner_id: "u1".to_string(),
            ..Default::default()
        }
    }

    async fn seed(service: &ItemsService, caller: &Caller, names: &[&str]) {
        for name in names {
            service.create(caller, named_item(name)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_list_scoped_to_caller_tenant() {
        let service = setup().await;
        seed(&service, &owner("T1"), &["a", "b", "c"]).await;
        seed(&service, &owner("T2"), &["d", "e"]).await;

        let page = service
            .list(&owner("T1"), &ItemQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 3);
        assert!(page.items.iter().all(|i| i.tenant_id == "T1"));
    }

    #[tokio::test]
    async fn test_bypass_roles_see_every_tenant() {
        let service = setup().await;
        seed(&service, &owner("T1"), &["a", "b", "c"]).await;
        seed(&service, &owner("T2"), &["d", "e"]).await;

        for role in [Role::LawEnforcement, Role::SuperAdmin] {
            let caller = Caller::new("le-1", role, None);
            let page = service.list(&caller, &ItemQuery::default()).await.unwrap();
            assert_eq!(page.total, 5);
        }
    }

    // Fail-closed deviation from the legacy empty-filter behavior.
    #[tokio::test]
    async fn test_tenantless_owner_sees_nothing() {
        let service = setup().await;
        seed(&service, &owner("T1"), &["a"]).await;

        let caller = Caller::new("drifter", Role::PropertyOwner, None);
        let page = service.list(&caller, &ItemQuery::default()).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_create_stamps_caller_tenant() {
        let service = setup().await;
        let mut new = named_item("Bike");
        new.tenant_id = Some("T9".to_string());

        let item = service.create(&owner("T1"), new).await.unwrap();
        assert_eq!(item.tenant_id, "T1");
    }

    #[tokio::test]
    async fn test_create_applies_defaults_once() {
        let service = setup().await;
        let item = service.create(&owner("T1"), named_item("Bike")).await.unwrap();
        assert_eq!(item.description, crate::models::DEFAULT_DESCRIPTION);
        assert_eq!(item.serial_number, crate::models::DEFAULT_SERIAL_NUMBER);
        assert_eq!(item.category, crate::models::DEFAULT_CATEGORY);
        assert_eq!(item.location_last_seen, crate::models::DEFAULT_LOCATION);
        assert_eq!(item.purchase_cost, 0.0);
        assert_eq!(item.estimated_value, 0.0);
        assert!(item.tags.0.is_empty());
        assert!(item.purchase_date.is_none());
    }

    #[tokio::test]
    async fn test_create_requires_name_and_owner() {
        let service = setup().await;

        let err = service.create(&owner("T1"), named_item("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(err.status_code(), 400);

        let mut new = named_item("Bike");
        new.owner_id = String::new();
        let err = service.create(&owner("T1"), new).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_value() {
        let service = setup().await;
        let mut new = named_item("Bike");
        new.estimated_value = Some(-10.0);
        let err = service.create(&owner("T1"), new).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_tenantless_caller_cannot_create() {
        let service = setup().await;
        let caller = Caller::new("drifter", Role::PropertyOwner, None);
        let err = service.create(&caller, named_item("Bike")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_not_found_and_forbidden_are_distinct() {
        let service = setup().await;
        let item = service.create(&owner("T1"), named_item("Bike")).await.unwrap();

        let err = service
            .update(&owner("T2"), 9999, ItemPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.status_code(), 404);

        let err = service
            .update(&owner("T2"), item.id, ItemPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(err.status_code(), 403);

        let err = service.delete(&owner("T2"), item.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = service.delete(&owner("T2"), 9999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bypass_role_can_update_any_tenant() {
        let service = setup().await;
        let item = service.create(&owner("T1"), named_item("Bike")).await.unwrap();

        let le = Caller::new("le-1", Role::LawEnforcement, None);
        let patch = ItemPatch {
            notes: Some("Recovered at pawn shop".to_string()),
            ..Default::default()
        };
        let updated = service.update(&le, item.id, patch).await.unwrap();
        assert_eq!(updated.notes, "Recovered at pawn shop");
        assert_eq!(updated.tenant_id, "T1");
    }

    #[tokio::test]
    async fn test_update_changes_only_patched_fields() {
        let service = setup().await;
        let mut new = named_item("Bike");
        new.description = Some("Red road bike".to_string());
        let item = service.create(&owner("T1"), new).await.unwrap();

        let patch = ItemPatch {
            name: Some("Blue Bike".to_string()),
            estimated_value: Some(250.0),
            date_last_seen: Some("03/15/2024".to_string()),
            ..Default::default()
        };
        let updated = service.update(&owner("T1"), item.id, patch).await.unwrap();
        assert_eq!(updated.name, "Blue Bike");
        assert_eq!(updated.estimated_value, 250.0);
        assert_eq!(updated.date_last_seen.as_deref(), Some("2024-03-15"));
        assert_eq!(updated.description, "Red road bike");
    }

    #[tokio::test]
    async fn test_update_rejects_bad_patch_date() {
        let service = setup().await;
        let item = service.create(&owner("T1"), named_item("Bike")).await.unwrap();

        let patch = ItemPatch {
            purchase_date: Some("notadate".to_string()),
            ..Default::default()
        };
        let err = service.update(&owner("T1"), item.id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_evidence_and_reports_count() {
        let service = setup().await;
        let caller = owner("T1");
        let item = service.create(&caller, named_item("Bike")).await.unwrap();
        service
            .add_evidence(&caller, item.id, EvidenceKind::Photo, "front.jpg")
            .await
            .unwrap();
        service
            .add_evidence(&caller, item.id, EvidenceKind::Document, "receipt.pdf")
            .await
            .unwrap();

        let receipt = service.delete(&caller, item.id).await.unwrap();
        assert!(receipt.message.contains("Bike"));
        assert!(receipt.message.contains("2 evidence file(s)"));

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM evidence")
            .fetch_one(&service.pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_add_evidence_is_policy_checked() {
        let service = setup().await;
        let item = service.create(&owner("T1"), named_item("Bike")).await.unwrap();

        let err = service
            .add_evidence(&owner("T2"), item.id, EvidenceKind::Photo, "x.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_evidence_counts() {
        let service = setup().await;
        let caller = owner("T1");
        let item = service.create(&caller, named_item("Bike")).await.unwrap();
        service
            .add_evidence(&caller, item.id, EvidenceKind::Photo, "a.jpg")
            .await
            .unwrap();
        service
            .add_evidence(&caller, item.id, EvidenceKind::Photo, "b.jpg")
            .await
            .unwrap();

        let counts = service.evidence_counts(&caller, item.id).await.unwrap();
        assert_eq!(counts.photos, 2);
        assert_eq!(counts.total(), 2);
    }

    #[tokio::test]
    async fn test_list_free_text_search() {
        let service = setup().await;
        let caller = owner("T1");
        let mut new = named_item("Cordless Drill");
        new.serial_number = Some("SN-778".to_string());
        service.create(&caller, new).await.unwrap();
        seed(&service, &caller, &["Bike"]).await;

        let query = ItemQuery {
            search: Some("drill".to_string()),
            ..Default::default()
        };
        let page = service.list(&caller, &query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Cordless Drill");

        // Serial numbers are searched too.
        let query = ItemQuery {
            search: Some("sn-778".to_string()),
            ..Default::default()
        };
        assert_eq!(service.list(&caller, &query).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_list_value_and_date_filters() {
        let service = setup().await;
        let caller = owner("T1");
        for (name, value, seen) in [
            ("cheap", 50.0, Some("2024-01-10")),
            ("mid", 300.0, Some("2024-02-10")),
            ("dear", 900.0, None),
        ] {
            let mut new = named_item(name);
            new.estimated_value = Some(value);
            new.date_last_seen = seen.map(String::from);
            service.create(&caller, new).await.unwrap();
        }

        let query = ItemQuery {
            min_value: Some(100.0),
            max_value: Some(500.0),
            ..Default::default()
        };
        let page = service.list(&caller, &query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "mid");

        let query = ItemQuery {
            start_date: Some("2024-02-01".to_string()),
            end_date: Some("2024-02-28".to_string()),
            ..Default::default()
        };
        let page = service.list(&caller, &query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "mid");
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let service = setup().await;
        let caller = owner("T1");
        seed(&service, &caller, &["first", "second", "third"]).await;

        let page = service.list(&caller, &ItemQuery::default()).await.unwrap();
        let names: Vec<&str> = page.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_query_parse_messages() {
        let err = ItemQuery::parse(RawQuery {
            min_value: Some("abc".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid minimum value. Must be a positive number."
        );

        let err = ItemQuery::parse(RawQuery {
            max_value: Some("-5".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid maximum value. Must be a positive number."
        );

        let err = ItemQuery::parse(RawQuery {
            start_date: Some("03/15/2024".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid start date format. Use YYYY-MM-DD.");

        let err = ItemQuery::parse(RawQuery {
            start_date: Some("2024-03-15".to_string()),
            end_date: Some("2024-03-01".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Start date cannot be after end date.");
    }

    #[test]
    fn test_query_parse_accepts_blank_as_absent() {
        let query = ItemQuery::parse(RawQuery {
            search: Some("  ".to_string()),
            min_value: Some("".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(query.search.is_none());
        assert!(query.min_value.is_none());
    }
}
