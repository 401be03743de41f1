//! Per-owner analytics: totals, conversion rate, top performer, recent leads.
//!
//! Pure read over the repository; any failed sub-fetch aborts the whole
//! snapshot (no partial aggregates).

use rust_decimal::Decimal;

use crate::models::{AnalyticsSnapshot, Id};
use crate::repo::{LeadRepo, ListingRepo, Repo, RepoResult, ViewRepo};

const RECENT_LEADS_LIMIT: usize = 5;

/// Leads over views as a two-decimal percent string; "0%" when there are no
/// views yet.
pub fn conversion_rate(total_leads: u64, total_views: u64) -> String {
    if total_views == 0 {
        return "0%".to_string();
    }
    let rate = Decimal::from(total_leads) * Decimal::from(100) / Decimal::from(total_views);
    format!("{:.2}%", rate.round_dp(2))
}

pub async fn snapshot(repo: &dyn Repo, owner_id: Id) -> RepoResult<AnalyticsSnapshot> {
    let property_ids = repo.list_listing_ids(owner_id).await?;
    if property_ids.is_empty() {
        return Ok(AnalyticsSnapshot::empty());
    }

    let total_listings = property_ids.len() as u64;
    let total_leads = repo.count_leads(&property_ids).await?;
    let total_views = repo.count_views(&property_ids).await?;

    let top_performing_listing = match repo.top_property_by_leads(&property_ids).await? {
        Some(id) => Some(repo.get_listing(id).await?),
        None => None,
    };

    let recent_leads = repo.recent_leads(&property_ids, RECENT_LEADS_LIMIT).await?;

    Ok(AnalyticsSnapshot {
        total_listings,
        total_leads,
        total_views,
        conversion_rate: conversion_rate(total_leads, total_views),
        top_performing_listing,
        recent_leads,
    })
}
