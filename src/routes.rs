use std::sync::Arc;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_multipart::Multipart;
use futures_util::TryStreamExt as _;

use crate::analytics;
use crate::auth::Auth;
use crate::changes::{ChangeFeed, ListingEvent};
use crate::error::ApiError;
use crate::images::{ImageFile, ImageManager, UploadOutcome};
use crate::models::*;
use crate::rate_limit::RateLimiterFacade;
use crate::repo::{LeadRepo, ListingRepo, ProfileRepo, Repo, ViewRepo};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::resource("/listings")
                    .route(web::get().to(list_listings))
                    .route(web::post().to(create_listing)),
            )
            .service(
                web::resource("/listings/{id}")
                    .route(web::get().to(get_listing))
                    .route(web::patch().to(update_listing))
                    .route(web::delete().to(delete_listing)),
            )
            .service(
                web::resource("/listings/{id}/leads").route(web::get().to(list_listing_leads)),
            )
            .service(
                web::resource("/listings/{id}/images").route(web::post().to(upload_images)),
            )
            .service(
                web::resource("/leads")
                    .route(web::get().to(list_leads))
                    .route(web::post().to(create_lead)),
            )
            .service(web::resource("/views").route(web::post().to(record_view)))
            .service(
                web::resource("/profile")
                    .route(web::get().to(get_profile))
                    .route(web::put().to(update_profile)),
            )
            .service(web::resource("/analytics").route(web::get().to(get_analytics)))
            .service(
                web::resource("/images/{path:.*}").route(web::delete().to(delete_image)),
            ),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub images: ImageManager,
    pub feed: ChangeFeed,
    pub limits: RateLimiterFacade,
}

fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct ListingsQuery {
    /// Restrict to one owner's listings (public portfolio pages use this).
    pub owner: Option<Id>,
}

#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(ListingsQuery),
    responses(
        (status = 200, description = "Listings, newest first", body = [Listing])
    )
)]
pub async fn list_listings(
    data: web::Data<AppState>,
    query: web::Query<ListingsQuery>,
) -> Result<HttpResponse, ApiError> {
    let listings = data.repo.list_listings(query.owner).await?;
    Ok(HttpResponse::Ok().json(listings))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(("id" = Id, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing", body = Listing),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn get_listing(
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let listing = data.repo.get_listing(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(listing))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body = NewListing,
    responses(
        (status = 201, description = "Listing created", body = Listing),
        (status = 400, description = "Missing/invalid required field"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_listing(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<NewListing>,
) -> Result<HttpResponse, ApiError> {
    let listing = data
        .repo
        .create_listing(auth.owner_id(), payload.into_inner())
        .await?;
    data.feed.publish_listing(ListingEvent::Created(listing.id));
    Ok(HttpResponse::Created().json(listing))
}

#[utoipa::path(
    patch,
    path = "/api/v1/listings/{id}",
    request_body = UpdateListing,
    params(("id" = Id, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing updated", body = Listing),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn update_listing(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<UpdateListing>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let existing = data.repo.get_listing(id).await?;
    if existing.owner_id != auth.owner_id() {
        return Err(ApiError::Forbidden);
    }
    let listing = data.repo.update_listing(id, payload.into_inner()).await?;
    data.feed.publish_listing(ListingEvent::Updated(id));
    Ok(HttpResponse::Ok().json(listing))
}

#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    params(("id" = Id, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Deleted (idempotent; unknown id is a no-op)"),
        (status = 403, description = "Not the owner")
    )
)]
pub async fn delete_listing(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    match data.repo.get_listing(id).await {
        Ok(existing) => {
            if existing.owner_id != auth.owner_id() {
                return Err(ApiError::Forbidden);
            }
            data.repo.delete_listing(id).await?;
            data.feed.publish_listing(ListingEvent::Deleted(id));
        }
        // already gone: deletion is idempotent at this layer
        Err(crate::repo::RepoError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/leads",
    params(("id" = Id, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Leads for the listing, newest first", body = [Lead]),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn list_listing_leads(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let listing = data.repo.get_listing(id).await?;
    if listing.owner_id != auth.owner_id() {
        return Err(ApiError::Forbidden);
    }
    let leads = data.repo.list_leads(Some(id)).await?;
    Ok(HttpResponse::Ok().json(leads))
}

#[utoipa::path(
    get,
    path = "/api/v1/leads",
    responses(
        (status = 200, description = "All leads across the caller's listings, newest first", body = [Lead]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_leads(auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let ids = data.repo.list_listing_ids(auth.owner_id()).await?;
    let leads: Vec<Lead> = data
        .repo
        .list_leads(None)
        .await?
        .into_iter()
        .filter(|l| ids.contains(&l.property_id))
        .collect();
    Ok(HttpResponse::Ok().json(leads))
}

#[utoipa::path(
    post,
    path = "/api/v1/leads",
    request_body = NewLead,
    responses(
        (status = 201, description = "Lead captured", body = Lead),
        (status = 400, description = "Missing required field"),
        (status = 404, description = "Unknown listing"),
        (status = 429, description = "Rate limited")
    )
)]
pub async fn create_lead(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<NewLead>,
) -> Result<HttpResponse, ApiError> {
    // public write path: anyone with the shared listing link may submit
    if !data.limits.allow_lead(&client_ip(&req)) {
        return Err(ApiError::RateLimited);
    }
    let lead = data.repo.create_lead(payload.into_inner()).await?;
    data.feed.publish_lead(lead.clone()).await;
    Ok(HttpResponse::Created().json(lead))
}

#[utoipa::path(
    post,
    path = "/api/v1/views",
    request_body = NewPropertyView,
    responses(
        (status = 201, description = "View recorded", body = PropertyView),
        (status = 404, description = "Unknown listing"),
        (status = 429, description = "Rate limited")
    )
)]
pub async fn record_view(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<NewPropertyView>,
) -> Result<HttpResponse, ApiError> {
    if !data.limits.allow_view(&client_ip(&req)) {
        return Err(ApiError::RateLimited);
    }
    let view = data.repo.record_view(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Caller's profile", body = Profile),
        (status = 404, description = "No profile yet")
    )
)]
pub async fn get_profile(auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profile = data.repo.get_profile(auth.owner_id()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile upserted", body = Profile)
    )
)]
pub async fn update_profile(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<UpdateProfile>,
) -> Result<HttpResponse, ApiError> {
    let profile = data
        .repo
        .upsert_profile(auth.owner_id(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics",
    responses(
        (status = 200, description = "Per-owner analytics snapshot", body = AnalyticsSnapshot),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_analytics(
    auth: Auth,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let snapshot = analytics::snapshot(data.repo.as_ref(), auth.owner_id()).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

const IMAGE_SIZE_LIMIT: usize = 10 * 1024 * 1024; // 10 MB per file

const ALLOWED_MIME: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/images",
    params(("id" = Id, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Per-file upload outcomes", body = [UploadOutcome]),
        (status = 403, description = "Not the owner"),
        (status = 413, description = "A file exceeds the size limit"),
        (status = 415, description = "Unsupported media type"),
        (status = 429, description = "Rate limited")
    )
)]
pub async fn upload_images(
    req: HttpRequest,
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    use actix_web::http::StatusCode;

    if !data.limits.allow_image(&client_ip(&req)) {
        return Err(ApiError::RateLimited);
    }
    let listing_id = path.into_inner();
    let listing = data.repo.get_listing(listing_id).await?;
    if listing.owner_id != auth.owner_id() {
        return Err(ApiError::Forbidden);
    }

    let mut files: Vec<ImageFile> = Vec::new();
    while let Some(field) = payload.try_next().await.map_err(|e| {
        log::error!("multipart error: {e}");
        ApiError::Internal
    })? {
        let cd = field.content_disposition();
        if cd.get_name() != Some("file") {
            continue;
        }
        let filename = cd
            .get_filename()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mut field_stream = field;
        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field_stream.try_next().await.map_err(|e| {
            log::error!("stream read error: {e}");
            ApiError::Internal
        })? {
            if bytes.len() + chunk.len() > IMAGE_SIZE_LIMIT {
                return Ok(HttpResponse::build(StatusCode::PAYLOAD_TOO_LARGE).finish());
            }
            bytes.extend_from_slice(&chunk);
        }
        let mime = infer::get(&bytes)
            .map(|t| t.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        if !ALLOWED_MIME.contains(&mime.as_str()) {
            return Ok(HttpResponse::UnsupportedMediaType().finish());
        }
        files.push(ImageFile { filename, bytes });
    }
    if files.is_empty() {
        return Err(ApiError::Validation("no 'file' parts in request".into()));
    }

    let outcomes = data.images.upload_many(listing_id, files).await;
    Ok(HttpResponse::Ok().json(outcomes))
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ImageDeleteResponse {
    pub deleted: bool,
}

#[utoipa::path(
    delete,
    path = "/api/v1/images/{path}",
    params(("path" = String, Path, description = "Storage key, e.g. {listing_id}/{uuid}.jpg")),
    responses(
        (status = 200, description = "Best-effort delete result", body = ImageDeleteResponse),
        (status = 400, description = "Key does not start with a listing id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of the listing the key belongs to"),
        (status = 404, description = "Listing for this key no longer exists")
    )
)]
pub async fn delete_image(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();
    // keys are namespaced {listing_id}/{uuid}.{ext}; the leading segment
    // decides whose object this is
    let listing_id = key
        .split('/')
        .next()
        .and_then(|s| s.parse::<Id>().ok())
        .ok_or_else(|| ApiError::Validation("image key must start with a listing id".into()))?;
    let listing = data.repo.get_listing(listing_id).await?;
    if listing.owner_id != auth.owner_id() {
        return Err(ApiError::Forbidden);
    }
    // false is a result, not an error: callers keep cleaning up siblings
    let deleted = data.images.delete_one(&key).await;
    Ok(HttpResponse::Ok().json(ImageDeleteResponse { deleted }))
}
