use crate::images::{UploadOutcome, UploadedImage};
use crate::models::{
    AnalyticsSnapshot, CaptureMode, Lead, LeadKind, Listing, NewLead, NewListing,
    NewPropertyView, Profile, PropertyView, UpdateListing, UpdateProfile,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_listings,
        crate::routes::get_listing,
        crate::routes::create_listing,
        crate::routes::update_listing,
        crate::routes::delete_listing,
        crate::routes::list_listing_leads,
        crate::routes::list_leads,
        crate::routes::create_lead,
        crate::routes::record_view,
        crate::routes::get_profile,
        crate::routes::update_profile,
        crate::routes::get_analytics,
        crate::routes::upload_images,
        crate::routes::delete_image,
    ),
    components(schemas(
        Listing, NewListing, UpdateListing, CaptureMode,
        Lead, NewLead, LeadKind,
        PropertyView, NewPropertyView,
        Profile, UpdateProfile,
        AnalyticsSnapshot,
        UploadOutcome, UploadedImage, crate::routes::ImageDeleteResponse
    )),
    tags(
        (name = "listings", description = "Property listing operations"),
        (name = "leads", description = "Lead capture and review"),
        (name = "analytics", description = "Per-owner derived analytics"),
    )
)]
pub struct ApiDoc;
