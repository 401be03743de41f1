use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("validation: {0}")] Validation(String),
    #[error("not found")] NotFound,
    #[error("internal: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

use async_trait::async_trait;

#[async_trait]
pub trait ListingRepo: Send + Sync {
    /// All listings newest first; scoped to one owner when `owner` is given.
    async fn list_listings(&self, owner: Option<Id>) -> RepoResult<Vec<Listing>>;
    async fn get_listing(&self, id: Id) -> RepoResult<Listing>;
    async fn create_listing(&self, owner_id: Id, new: NewListing) -> RepoResult<Listing>;
    async fn update_listing(&self, id: Id, upd: UpdateListing) -> RepoResult<Listing>;
    /// Idempotent: deleting an unknown id is a no-op.
    async fn delete_listing(&self, id: Id) -> RepoResult<()>;
    async fn list_listing_ids(&self, owner: Id) -> RepoResult<Vec<Id>>;
}

#[async_trait]
pub trait LeadRepo: Send + Sync {
    /// Leads newest first, optionally filtered to one listing.
    async fn list_leads(&self, property: Option<Id>) -> RepoResult<Vec<Lead>>;
    /// Public write path: any caller may submit a lead against an existing listing.
    async fn create_lead(&self, new: NewLead) -> RepoResult<Lead>;
    async fn count_leads(&self, property_ids: &[Id]) -> RepoResult<u64>;
    /// Listing with the most leads among `property_ids`; ties break to the
    /// lowest listing id. `None` when there are no leads at all.
    async fn top_property_by_leads(&self, property_ids: &[Id]) -> RepoResult<Option<Id>>;
    async fn recent_leads(&self, property_ids: &[Id], limit: usize) -> RepoResult<Vec<Lead>>;
}

#[async_trait]
pub trait ViewRepo: Send + Sync {
    /// Append-only; never updated or deleted.
    async fn record_view(&self, new: NewPropertyView) -> RepoResult<PropertyView>;
    async fn list_views(&self, property: Option<Id>) -> RepoResult<Vec<PropertyView>>;
    async fn count_views(&self, property_ids: &[Id]) -> RepoResult<u64>;
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_profile(&self, owner_id: Id) -> RepoResult<Profile>;
    async fn upsert_profile(&self, owner_id: Id, upd: UpdateProfile) -> RepoResult<Profile>;
}

pub trait Repo: ListingRepo + LeadRepo + ViewRepo + ProfileRepo {}

impl<T> Repo for T where T: ListingRepo + LeadRepo + ViewRepo + ProfileRepo {}

// ---------------- boundary validation (shared by backends) ----------------

pub(crate) fn validate_new_listing(new: &NewListing) -> RepoResult<()> {
    if new.title.trim().is_empty() {
        return Err(RepoError::Validation("title must not be empty".into()));
    }
    if new.location.trim().is_empty() {
        return Err(RepoError::Validation("location must not be empty".into()));
    }
    if new.price <= rust_decimal::Decimal::ZERO {
        return Err(RepoError::Validation("price must be positive".into()));
    }
    check_primary_image(&new.primary_image_url, &new.image_urls)
}

pub(crate) fn validate_new_lead(new: &NewLead) -> RepoResult<()> {
    if new.name.trim().is_empty() {
        return Err(RepoError::Validation("name must not be empty".into()));
    }
    if new.email.trim().is_empty() {
        return Err(RepoError::Validation("email must not be empty".into()));
    }
    Ok(())
}

/// The primary image URL, when set, must be one of the listing's images.
pub(crate) fn check_primary_image(
    primary: &Option<String>,
    image_urls: &[String],
) -> RepoResult<()> {
    if let Some(p) = primary {
        if !image_urls.iter().any(|u| u == p) {
            return Err(RepoError::Validation(
                "primary_image_url must be one of image_urls".into(),
            ));
        }
    }
    Ok(())
}

/// Merge a partial update into an existing listing. `owner_id` is never
/// touched; `updated_at` is bumped by the caller.
pub(crate) fn merge_listing(current: &mut Listing, upd: UpdateListing) -> RepoResult<()> {
    if let Some(title) = upd.title {
        if title.trim().is_empty() {
            return Err(RepoError::Validation("title must not be empty".into()));
        }
        current.title = title;
    }
    if let Some(price) = upd.price {
        if price <= rust_decimal::Decimal::ZERO {
            return Err(RepoError::Validation("price must be positive".into()));
        }
        current.price = price;
    }
    if let Some(description) = upd.description {
        current.description = description;
    }
    if let Some(location) = upd.location {
        if location.trim().is_empty() {
            return Err(RepoError::Validation("location must not be empty".into()));
        }
        current.location = location;
    }
    if let Some(image_urls) = upd.image_urls {
        current.image_urls = image_urls;
    }
    if let Some(primary) = upd.primary_image_url {
        current.primary_image_url = primary;
    }
    if let Some(mode) = upd.capture_mode {
        current.capture_mode = mode;
    }
    check_primary_image(&current.primary_image_url, &current.image_urls)
}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, RwLock};
    use uuid::Uuid;

    const SNAPSHOT_PATH: &str = "data/state.json";

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        listings: HashMap<Id, Listing>,
        leads: HashMap<Id, Lead>,
        views: HashMap<Id, PropertyView>,
        profiles: HashMap<Id, Profile>,
    }

    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Arc<PathBuf>,
    }

    impl InMemRepo {
        fn data_dir() -> PathBuf {
            std::env::var("PROPFOLIO_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data"))
        }

        fn snapshot_path() -> PathBuf {
            if std::env::var("PROPFOLIO_DATA_DIR").is_ok() {
                let mut p = Self::data_dir();
                p.push("state.json");
                p
            } else {
                PathBuf::from(SNAPSHOT_PATH)
            }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        log::info!("[inmem] loaded snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        log::warn!(
                            "[inmem] failed to parse snapshot '{}': {e}. Starting empty.",
                            path.display()
                        );
                        State::default()
                    }
                },
                Err(_) => State::default(),
            }
        }

        fn persist(&self) {
            let path = self.snapshot_path.clone();
            if let Ok(s) = serde_json::to_vec_pretty(&*self.state.read().unwrap()) {
                if let Some(dir) = path.parent() {
                    let _ = std::fs::create_dir_all(dir);
                }
                if let Err(e) = std::fs::write(&*path, s) {
                    log::warn!("[inmem] failed to write snapshot '{}': {e}", path.display());
                }
            }
        }

        pub fn new() -> Self {
            let snapshot_path = Self::snapshot_path();
            let state = Self::load_state_from(&snapshot_path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Arc::new(snapshot_path),
            }
        }
    }

    impl Default for InMemRepo {
        fn default() -> Self { Self::new() }
    }

    // Newest first; id as a stable tie-break so repeated reads agree.
    fn newest_first<T>(items: &mut [T], created: impl Fn(&T) -> chrono::DateTime<Utc>, id: impl Fn(&T) -> Id) {
        items.sort_by(|a, b| created(b).cmp(&created(a)).then(id(a).cmp(&id(b))));
    }

    #[async_trait]
    impl ListingRepo for InMemRepo {
        async fn list_listings(&self, owner: Option<Id>) -> RepoResult<Vec<Listing>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .listings
                .values()
                .filter(|l| owner.map_or(true, |o| l.owner_id == o))
                .cloned()
                .collect();
            drop(s);
            newest_first(&mut v, |l| l.created_at, |l| l.id);
            Ok(v)
        }

        async fn get_listing(&self, id: Id) -> RepoResult<Listing> {
            let s = self.state.read().unwrap();
            s.listings.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn create_listing(&self, owner_id: Id, new: NewListing) -> RepoResult<Listing> {
            validate_new_listing(&new)?;
            let now = Utc::now();
            let listing = Listing {
                id: Uuid::new_v4(),
                owner_id,
                title: new.title,
                price: new.price,
                description: new.description,
                location: new.location,
                primary_image_url: new.primary_image_url,
                image_urls: new.image_urls,
                capture_mode: new.capture_mode,
                created_at: now,
                updated_at: now,
            };
            let mut s = self.state.write().unwrap();
            s.listings.insert(listing.id, listing.clone());
            drop(s); // release lock before persisting
            self.persist();
            Ok(listing)
        }

        async fn update_listing(&self, id: Id, upd: UpdateListing) -> RepoResult<Listing> {
            let mut s = self.state.write().unwrap();
            let listing = s.listings.get_mut(&id).ok_or(RepoError::NotFound)?;
            merge_listing(listing, upd)?;
            listing.updated_at = Utc::now();
            let updated = listing.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn delete_listing(&self, id: Id) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            // leads and views are soft-orphaned, not cascaded
            let existed = s.listings.remove(&id).is_some();
            drop(s);
            if existed {
                self.persist();
            }
            Ok(())
        }

        async fn list_listing_ids(&self, owner: Id) -> RepoResult<Vec<Id>> {
            let s = self.state.read().unwrap();
            Ok(s.listings
                .values()
                .filter(|l| l.owner_id == owner)
                .map(|l| l.id)
                .collect())
        }
    }

    #[async_trait]
    impl LeadRepo for InMemRepo {
        async fn list_leads(&self, property: Option<Id>) -> RepoResult<Vec<Lead>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .leads
                .values()
                .filter(|l| property.map_or(true, |p| l.property_id == p))
                .cloned()
                .collect();
            drop(s);
            newest_first(&mut v, |l| l.created_at, |l| l.id);
            Ok(v)
        }

        async fn create_lead(&self, new: NewLead) -> RepoResult<Lead> {
            validate_new_lead(&new)?;
            let mut s = self.state.write().unwrap();
            if !s.listings.contains_key(&new.property_id) {
                return Err(RepoError::NotFound);
            }
            let lead = Lead {
                id: Uuid::new_v4(),
                property_id: new.property_id,
                name: new.name,
                email: new.email,
                phone: new.phone,
                message: new.message,
                kind: new.kind,
                created_at: Utc::now(),
            };
            s.leads.insert(lead.id, lead.clone());
            drop(s);
            self.persist();
            Ok(lead)
        }

        async fn count_leads(&self, property_ids: &[Id]) -> RepoResult<u64> {
            let s = self.state.read().unwrap();
            Ok(s.leads
                .values()
                .filter(|l| property_ids.contains(&l.property_id))
                .count() as u64)
        }

        async fn top_property_by_leads(&self, property_ids: &[Id]) -> RepoResult<Option<Id>> {
            let s = self.state.read().unwrap();
            let mut counts: HashMap<Id, u64> = HashMap::new();
            for lead in s.leads.values() {
                if property_ids.contains(&lead.property_id) {
                    *counts.entry(lead.property_id).or_default() += 1;
                }
            }
            // highest count wins; ties break to the lowest listing id
            Ok(counts
                .into_iter()
                .max_by(|(ida, ca), (idb, cb)| ca.cmp(cb).then(idb.cmp(ida)))
                .map(|(id, _)| id))
        }

        async fn recent_leads(&self, property_ids: &[Id], limit: usize) -> RepoResult<Vec<Lead>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .leads
                .values()
                .filter(|l| property_ids.contains(&l.property_id))
                .cloned()
                .collect();
            drop(s);
            newest_first(&mut v, |l| l.created_at, |l| l.id);
            v.truncate(limit);
            Ok(v)
        }
    }

    #[async_trait]
    impl ViewRepo for InMemRepo {
        async fn record_view(&self, new: NewPropertyView) -> RepoResult<PropertyView> {
            let mut s = self.state.write().unwrap();
            if !s.listings.contains_key(&new.property_id) {
                return Err(RepoError::NotFound);
            }
            let view = PropertyView {
                id: Uuid::new_v4(),
                property_id: new.property_id,
                viewer_id: new.viewer_id,
                created_at: Utc::now(),
            };
            s.views.insert(view.id, view.clone());
            drop(s);
            self.persist();
            Ok(view)
        }

        async fn list_views(&self, property: Option<Id>) -> RepoResult<Vec<PropertyView>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .views
                .values()
                .filter(|w| property.map_or(true, |p| w.property_id == p))
                .cloned()
                .collect();
            drop(s);
            newest_first(&mut v, |w| w.created_at, |w| w.id);
            Ok(v)
        }

        async fn count_views(&self, property_ids: &[Id]) -> RepoResult<u64> {
            let s = self.state.read().unwrap();
            Ok(s.views
                .values()
                .filter(|w| property_ids.contains(&w.property_id))
                .count() as u64)
        }
    }

    #[async_trait]
    impl ProfileRepo for InMemRepo {
        async fn get_profile(&self, owner_id: Id) -> RepoResult<Profile> {
            let s = self.state.read().unwrap();
            s.profiles.get(&owner_id).cloned().ok_or(RepoError::NotFound)
        }

        async fn upsert_profile(&self, owner_id: Id, upd: UpdateProfile) -> RepoResult<Profile> {
            let mut s = self.state.write().unwrap();
            let profile = s.profiles.entry(owner_id).or_insert_with(|| Profile {
                id: owner_id,
                display_name: String::new(),
                email: String::new(),
                phone: None,
                updated_at: Utc::now(),
            });
            if let Some(name) = upd.display_name {
                profile.display_name = name;
            }
            if let Some(email) = upd.email {
                profile.email = email;
            }
            if let Some(phone) = upd.phone {
                profile.phone = phone;
            }
            profile.updated_at = Utc::now();
            let updated = profile.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use chrono::Utc;
    use sqlx::{Pool, Postgres};
    use uuid::Uuid;

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }
    }

    fn internal(e: sqlx::Error) -> RepoError {
        match e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            other => RepoError::Internal(other.to_string()),
        }
    }

    const LISTING_COLS: &str =
        "id, owner_id, title, price, description, location, primary_image_url, image_urls, capture_mode, created_at, updated_at";
    const LEAD_COLS: &str =
        "id, property_id, name, email, phone, message, kind, created_at";

    #[async_trait]
    impl ListingRepo for PgRepo {
        async fn list_listings(&self, owner: Option<Id>) -> RepoResult<Vec<Listing>> {
            let recs = sqlx::query_as::<_, Listing>(&format!(
                "SELECT {LISTING_COLS} FROM property_listings \
                 WHERE ($1::uuid IS NULL OR owner_id = $1) \
                 ORDER BY created_at DESC, id ASC"
            ))
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
            Ok(recs)
        }

        async fn get_listing(&self, id: Id) -> RepoResult<Listing> {
            sqlx::query_as::<_, Listing>(&format!(
                "SELECT {LISTING_COLS} FROM property_listings WHERE id = $1"
            ))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn create_listing(&self, owner_id: Id, new: NewListing) -> RepoResult<Listing> {
            validate_new_listing(&new)?;
            sqlx::query_as::<_, Listing>(&format!(
                "INSERT INTO property_listings \
                 (id, owner_id, title, price, description, location, primary_image_url, image_urls, capture_mode) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9) RETURNING {LISTING_COLS}"
            ))
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(&new.title)
            .bind(new.price)
            .bind(&new.description)
            .bind(&new.location)
            .bind(&new.primary_image_url)
            .bind(&new.image_urls)
            .bind(new.capture_mode)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn update_listing(&self, id: Id, upd: UpdateListing) -> RepoResult<Listing> {
            // read-merge-write so double-option fields (clearing the primary
            // image) and the membership invariant stay in one place
            let mut current = self.get_listing(id).await?;
            merge_listing(&mut current, upd)?;
            current.updated_at = Utc::now();
            sqlx::query_as::<_, Listing>(&format!(
                "UPDATE property_listings SET \
                 title=$2, price=$3, description=$4, location=$5, \
                 primary_image_url=$6, image_urls=$7, capture_mode=$8, updated_at=$9 \
                 WHERE id=$1 RETURNING {LISTING_COLS}"
            ))
            .bind(id)
            .bind(&current.title)
            .bind(current.price)
            .bind(&current.description)
            .bind(&current.location)
            .bind(&current.primary_image_url)
            .bind(&current.image_urls)
            .bind(current.capture_mode)
            .bind(current.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn delete_listing(&self, id: Id) -> RepoResult<()> {
            sqlx::query("DELETE FROM property_listings WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(internal)?;
            Ok(())
        }

        async fn list_listing_ids(&self, owner: Id) -> RepoResult<Vec<Id>> {
            let rows: Vec<(Id,)> =
                sqlx::query_as("SELECT id FROM property_listings WHERE owner_id = $1")
                    .bind(owner)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(internal)?;
            Ok(rows.into_iter().map(|(id,)| id).collect())
        }
    }

    #[async_trait]
    impl LeadRepo for PgRepo {
        async fn list_leads(&self, property: Option<Id>) -> RepoResult<Vec<Lead>> {
            sqlx::query_as::<_, Lead>(&format!(
                "SELECT {LEAD_COLS} FROM leads \
                 WHERE ($1::uuid IS NULL OR property_id = $1) \
                 ORDER BY created_at DESC, id ASC"
            ))
            .bind(property)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn create_lead(&self, new: NewLead) -> RepoResult<Lead> {
            validate_new_lead(&new)?;
            let exists: (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM property_listings WHERE id = $1)")
                    .bind(new.property_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(internal)?;
            if !exists.0 {
                return Err(RepoError::NotFound);
            }
            sqlx::query_as::<_, Lead>(&format!(
                "INSERT INTO leads (id, property_id, name, email, phone, message, kind) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING {LEAD_COLS}"
            ))
            .bind(Uuid::new_v4())
            .bind(new.property_id)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.message)
            .bind(new.kind)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn count_leads(&self, property_ids: &[Id]) -> RepoResult<u64> {
            let (n,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM leads WHERE property_id = ANY($1)")
                    .bind(property_ids)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(internal)?;
            Ok(n as u64)
        }

        async fn top_property_by_leads(&self, property_ids: &[Id]) -> RepoResult<Option<Id>> {
            let row: Option<(Id,)> = sqlx::query_as(
                "SELECT property_id FROM leads WHERE property_id = ANY($1) \
                 GROUP BY property_id ORDER BY COUNT(*) DESC, property_id ASC LIMIT 1",
            )
            .bind(property_ids)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
            Ok(row.map(|(id,)| id))
        }

        async fn recent_leads(&self, property_ids: &[Id], limit: usize) -> RepoResult<Vec<Lead>> {
            sqlx::query_as::<_, Lead>(&format!(
                "SELECT {LEAD_COLS} FROM leads WHERE property_id = ANY($1) \
                 ORDER BY created_at DESC, id ASC LIMIT $2"
            ))
            .bind(property_ids)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }
    }

    #[async_trait]
    impl ViewRepo for PgRepo {
        async fn record_view(&self, new: NewPropertyView) -> RepoResult<PropertyView> {
            let exists: (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM property_listings WHERE id = $1)")
                    .bind(new.property_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(internal)?;
            if !exists.0 {
                return Err(RepoError::NotFound);
            }
            sqlx::query_as::<_, PropertyView>(
                "INSERT INTO property_views (id, property_id, viewer_id) \
                 VALUES ($1,$2,$3) RETURNING id, property_id, viewer_id, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(new.property_id)
            .bind(new.viewer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn list_views(&self, property: Option<Id>) -> RepoResult<Vec<PropertyView>> {
            sqlx::query_as::<_, PropertyView>(
                "SELECT id, property_id, viewer_id, created_at FROM property_views \
                 WHERE ($1::uuid IS NULL OR property_id = $1) \
                 ORDER BY created_at DESC, id ASC",
            )
            .bind(property)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
        }

        async fn count_views(&self, property_ids: &[Id]) -> RepoResult<u64> {
            let (n,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM property_views WHERE property_id = ANY($1)")
                    .bind(property_ids)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(internal)?;
            Ok(n as u64)
        }
    }

    #[async_trait]
    impl ProfileRepo for PgRepo {
        async fn get_profile(&self, owner_id: Id) -> RepoResult<Profile> {
            sqlx::query_as::<_, Profile>(
                "SELECT id, display_name, email, phone, updated_at FROM profiles WHERE id = $1",
            )
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }

        async fn upsert_profile(&self, owner_id: Id, upd: UpdateProfile) -> RepoResult<Profile> {
            // COALESCE cannot express `phone: Some(None)` (an explicit clear),
            // so the "was the field provided" bit travels separately
            let phone_set = upd.phone.is_some();
            let phone = upd.phone.flatten();
            sqlx::query_as::<_, Profile>(
                "INSERT INTO profiles (id, display_name, email, phone, updated_at) \
                 VALUES ($1, COALESCE($2,''), COALESCE($3,''), $4, now()) \
                 ON CONFLICT (id) DO UPDATE SET \
                 display_name = COALESCE($2, profiles.display_name), \
                 email = COALESCE($3, profiles.email), \
                 phone = CASE WHEN $5 THEN $4 ELSE profiles.phone END, \
                 updated_at = now() \
                 RETURNING id, display_name, email, phone, updated_at",
            )
            .bind(owner_id)
            .bind(&upd.display_name)
            .bind(&upd.email)
            .bind(&phone)
            .bind(phone_set)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)
        }
    }
}
