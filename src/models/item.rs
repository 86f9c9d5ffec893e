use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::validate;

/// Placeholder values substituted for missing optional fields at
/// creation time. Defaulting happens in exactly one place
/// ([`NewItem::with_defaults`]) so the validator, repository, and
/// import engine cannot disagree on what a missing field means.
pub const DEFAULT_DESCRIPTION: &str = "No description provided";
pub const DEFAULT_SERIAL_NUMBER: &str = "Not recorded";
pub const DEFAULT_CATEGORY: &str = "Miscellaneous";
pub const DEFAULT_LOCATION: &str = "Location not specified";

/// A persisted stolen-property record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ItemModel {
    pub id: i64,
    pub owner_id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: String,
    pub serial_number: String,
    pub category: String,
    pub tags: Json<Vec<String>>,
    pub notes: String,
    pub purchase_cost: f64,
    pub estimated_value: f64,
    pub purchase_date: Option<String>,
    pub date_last_seen: Option<String>,
    pub location_last_seen: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Creation payload. `tenant_id` is accepted for wire compatibility but
/// ignored: the repository always stamps the caller's own tenant.
///
/// Valuation fields accept either a number or a legacy string form
/// ("$1,200.50"); an unparseable string coerces to 0 on this path (the
/// CSV import path treats the same input as a hard validation error).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner_id: String,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "de_money")]
    pub purchase_cost: Option<f64>,
    #[serde(default, deserialize_with = "de_money")]
    pub estimated_value: Option<f64>,
    pub purchase_date: Option<String>,
    pub date_last_seen: Option<String>,
    pub location_last_seen: Option<String>,
    pub tenant_id: Option<String>,
}

/// A fully-defaulted record ready for insertion.
#[derive(Debug, Clone)]
pub struct NormalizedItem {
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub serial_number: String,
    pub category: String,
    pub tags: Vec<String>,
    pub notes: String,
    pub purchase_cost: f64,
    pub estimated_value: f64,
    pub purchase_date: Option<String>,
    pub date_last_seen: Option<String>,
    pub location_last_seen: String,
}

impl NewItem {
    /// The single defaulting point: missing field → documented
    /// placeholder. Invoked once, at record construction.
    pub fn with_defaults(self) -> NormalizedItem {
        NormalizedItem {
            owner_id: self.owner_id.trim().to_string(),
            name: self.name.trim().to_string(),
            description: non_blank(self.description)
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            serial_number: non_blank(self.serial_number)
                .unwrap_or_else(|| DEFAULT_SERIAL_NUMBER.to_string()),
            category: non_blank(self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags: self.tags,
            notes: non_blank(self.notes).unwrap_or_default(),
            purchase_cost: self.purchase_cost.unwrap_or(0.0),
            estimated_value: self.estimated_value.unwrap_or(0.0),
            purchase_date: non_blank(self.purchase_date),
            date_last_seen: non_blank(self.date_last_seen),
            location_last_seen: non_blank(self.location_last_seen)
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        }
    }
}

/// Field-optional update payload. `tenant_id` is not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "de_money")]
    pub purchase_cost: Option<f64>,
    #[serde(default, deserialize_with = "de_money")]
    pub estimated_value: Option<f64>,
    pub purchase_date: Option<String>,
    pub date_last_seen: Option<String>,
    pub location_last_seen: Option<String>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.serial_number.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.notes.is_none()
            && self.purchase_cost.is_none()
            && self.estimated_value.is_none()
            && self.purchase_date.is_none()
            && self.date_last_seen.is_none()
            && self.location_last_seen.is_none()
    }
}

/// One page of list results.
#[derive(Debug, Clone, Serialize)]
pub struct ItemPage {
    pub items: Vec<ItemModel>,
    pub total: i64,
}

/// Outcome of a delete, reporting the removed item and its evidence.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteReceipt {
    pub message: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts a JSON number or a legacy string form. Unparseable strings
/// coerce to 0 on this path; the CSV validator treats them as errors.
fn de_money<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Number(n)) => Some(n.as_f64().unwrap_or(0.0)),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => {
            Some(validate::parse_currency(&s).unwrap_or(0.0))
        }
        Some(_) => Some(0.0),
    })
}
