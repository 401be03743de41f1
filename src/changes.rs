//! In-process change feed for listing and lead rows.
//!
//! Mutating route handlers publish typed events; consumers subscribe and
//! merge them into local state. Merge rules follow the two watched feeds:
//! any listing event triggers a full refetch, a lead insert is prepended to
//! the local sequence. Dropping a receiver tears the subscription down.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::models::{Id, Lead, Listing};
use crate::repo::{ListingRepo, RepoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingEvent {
    Created(Id),
    Updated(Id),
    Deleted(Id),
}

/// Broadcast hub keyed by resource: one channel for the whole listings
/// table, one channel per watched listing's leads.
#[derive(Clone)]
pub struct ChangeFeed {
    listings: broadcast::Sender<ListingEvent>,
    leads: Arc<RwLock<HashMap<Id, broadcast::Sender<Lead>>>>,
    capacity: usize,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            listings: broadcast::channel(capacity).0,
            leads: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    pub fn subscribe_listings(&self) -> broadcast::Receiver<ListingEvent> {
        self.listings.subscribe()
    }

    pub async fn subscribe_leads(&self, property_id: Id) -> broadcast::Receiver<Lead> {
        let mut channels = self.leads.write().await;
        channels
            .entry(property_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// No-op when nobody is listening.
    pub fn publish_listing(&self, event: ListingEvent) {
        let _ = self.listings.send(event);
    }

    pub async fn publish_lead(&self, lead: Lead) {
        let channels = self.leads.read().await;
        if let Some(tx) = channels.get(&lead.property_id) {
            let _ = tx.send(lead);
        }
    }

    /// Drop lead channels with zero subscribers (housekeeping).
    pub async fn cleanup(&self) {
        let mut channels = self.leads.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Local listing state for one consumer. Reaction to any table event is a
/// full refetch; last completed refresh wins regardless of whether it was
/// triggered manually or by the feed.
pub struct ListingCache {
    repo: Arc<dyn ListingRepo>,
    owner: Option<Id>,
    listings: Vec<Listing>,
}

impl ListingCache {
    pub fn new(repo: Arc<dyn ListingRepo>, owner: Option<Id>) -> Self {
        Self { repo, owner, listings: Vec::new() }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub async fn refresh(&mut self) -> RepoResult<()> {
        self.listings = self.repo.list_listings(self.owner).await?;
        Ok(())
    }

    pub async fn apply(&mut self, _event: ListingEvent) -> RepoResult<()> {
        self.refresh().await
    }
}

/// Local lead state for one watched listing. Feed inserts are delta-merged:
/// prepend unless the id is already present.
#[derive(Default)]
pub struct LeadInbox {
    leads: Vec<Lead>,
}

impl LeadInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    /// Replace local state with a manual fetch result.
    pub fn set(&mut self, leads: Vec<Lead>) {
        self.leads = leads;
    }

    /// Merge one feed insert. Safe to call at any time relative to manual
    /// fetches; a lead already known (e.g. via a racing refetch) is ignored.
    pub fn apply_insert(&mut self, lead: Lead) {
        if self.leads.iter().any(|l| l.id == lead.id) {
            return;
        }
        self.leads.insert(0, lead);
    }
}
