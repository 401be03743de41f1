use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type Id = Uuid;

/// How a listing captures leads on its public page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "postgres-store", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres-store",
    sqlx(type_name = "capture_mode", rename_all = "snake_case")
)]
pub enum CaptureMode {
    BookCall,
    Interested,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "postgres-store", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres-store",
    sqlx(type_name = "lead_kind", rename_all = "snake_case")
)]
pub enum LeadKind {
    Call,
    Interest,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct Listing {
    pub id: Id,
    pub owner_id: Id, // immutable after creation
    pub title: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub description: String,
    pub location: String,
    pub primary_image_url: Option<String>,
    pub image_urls: Vec<String>,
    pub capture_mode: CaptureMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewListing {
    pub title: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub primary_image_url: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub capture_mode: CaptureMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateListing {
    pub title: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub primary_image_url: Option<Option<String>>,
    pub image_urls: Option<Vec<String>>,
    pub capture_mode: Option<CaptureMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct Lead {
    pub id: Id,
    pub property_id: Id,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub kind: LeadKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewLead {
    pub property_id: Id,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub kind: LeadKind,
}

/// Append-only view-tracking row; anonymous viewers allowed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct PropertyView {
    pub id: Id,
    pub property_id: Id,
    pub viewer_id: Option<Id>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPropertyView {
    pub property_id: Id,
    #[serde(default)]
    pub viewer_id: Option<Id>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct Profile {
    pub id: Id, // == owner id
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
}

/// Derived per-owner aggregate; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsSnapshot {
    pub total_listings: u64,
    pub total_leads: u64,
    pub total_views: u64,
    pub conversion_rate: String,
    pub top_performing_listing: Option<Listing>,
    pub recent_leads: Vec<Lead>,
}

impl AnalyticsSnapshot {
    pub fn empty() -> Self {
        Self {
            total_listings: 0,
            total_leads: 0,
            total_views: 0,
            conversion_rate: "0%".to_string(),
            top_performing_listing: None,
            recent_leads: Vec::new(),
        }
    }
}
