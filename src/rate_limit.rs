use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;

/// Sliding window in-memory rate limiter (pod local). Guards the public
/// write paths: lead capture, view tracking, image upload.
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    store: Arc<DashMap<String, VecDeque<Instant>>>,
    pub enabled: bool,
}

impl InMemoryRateLimiter {
    pub fn new(enabled: bool) -> Self {
        Self { store: Arc::new(DashMap::new()), enabled }
    }

    /// Returns true if allowed, false if limited.
    pub fn check(&self, key: &str, limit: usize, window: Duration) -> bool {
        if !self.enabled { return true; }
        let now = Instant::now();
        let mut entry = self.store.entry(key.to_string()).or_default();
        while let Some(front) = entry.front() {
            if now.duration_since(*front) >= window { entry.pop_front(); } else { break; }
        }
        if entry.len() < limit {
            entry.push_back(now);
            true
        } else {
            false
        }
    }
}

/// Per-action config derived from env.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub lead_limit: usize,
    pub lead_window: Duration,
    pub view_limit: usize,
    pub view_window: Duration,
    pub image_limit: usize,
    pub image_window: Duration,
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        fn usize_env(name: &str, default: usize) -> usize { std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default) }
        fn dur_env(name: &str, default: u64) -> Duration { Duration::from_secs(std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)) }
        Self {
            lead_limit: usize_env("RL_LEAD_LIMIT", 5),
            lead_window: dur_env("RL_LEAD_WINDOW", 300),
            view_limit: usize_env("RL_VIEW_LIMIT", 60),
            view_window: dur_env("RL_VIEW_WINDOW", 60),
            image_limit: usize_env("RL_IMAGE_LIMIT", 20),
            image_window: dur_env("RL_IMAGE_WINDOW", 3600),
        }
    }
}

/// High level guard used by handlers.
#[derive(Clone)]
pub struct RateLimiterFacade {
    pub limiter: InMemoryRateLimiter,
    pub cfg: RateLimitConfig,
}

impl RateLimiterFacade {
    pub fn new(limiter: InMemoryRateLimiter, cfg: RateLimitConfig) -> Self { Self { limiter, cfg } }
    pub fn allow_lead(&self, ip: &str) -> bool { self.limiter.check(&format!("lead:{ip}"), self.cfg.lead_limit, self.cfg.lead_window) }
    pub fn allow_view(&self, ip: &str) -> bool { self.limiter.check(&format!("view:{ip}"), self.cfg.view_limit, self.cfg.view_window) }
    pub fn allow_image(&self, ip: &str) -> bool { self.limiter.check(&format!("image:{ip}"), self.cfg.image_limit, self.cfg.image_window) }
}
