//! Sliding-window rate limiting per client address.
//!
//! Admission control runs before any routing logic. The window boundary
//! moves continuously: a burst that fills the limit becomes admissible again
//! only as individual timestamps age past the window, one at a time.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::constants::RATE_WINDOW_SECS;

/// Request-per-address limiter with a trailing 60-second window.
///
/// Each address owns its own window behind its own lock, so unrelated
/// clients never serialize on shared state; the outer map lock is only held
/// long enough to fetch or create the per-address entry.
pub struct RequestRateLimiter {
    windows: RwLock<HashMap<IpAddr, Arc<Mutex<Vec<Instant>>>>>,
    max_per_window: u32,
    window: Duration,
}

impl RequestRateLimiter {
    pub fn new(max_per_window: u32) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            max_per_window,
            window: Duration::from_secs(RATE_WINDOW_SECS),
        }
    }

    /// Admit or reject a request from this address, recording it on admission
    pub async fn check(&self, addr: IpAddr) -> bool {
        self.check_at(addr, Instant::now()).await
    }

    /// Admission decision at an explicit instant. Rejected requests are not
    /// recorded and do not extend the throttle.
    pub async fn check_at(&self, addr: IpAddr, now: Instant) -> bool {
        let window = self.window_for(addr).await;

        let mut times = window.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        // Prune entries that have aged out of the trailing window
        times.retain(|&t| now.duration_since(t) < self.window);

        if times.len() >= self.max_per_window as usize {
            return false;
        }

        times.push(now);
        true
    }

    /// Request count currently inside the window for an address
    pub async fn request_count(&self, addr: IpAddr) -> usize {
        let windows = self.windows.read().await;
        match windows.get(&addr) {
            Some(window) => {
                let times = window.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let now = Instant::now();
                times
                    .iter()
                    .filter(|&&t| now.duration_since(t) < self.window)
                    .count()
            }
            None => 0,
        }
    }

    async fn window_for(&self, addr: IpAddr) -> Arc<Mutex<Vec<Instant>>> {
        {
            let windows = self.windows.read().await;
            if let Some(window) = windows.get(&addr) {
                return window.clone();
            }
        }

        let mut windows = self.windows.write().await;
        windows
            .entry(addr)
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    /// Drop addresses whose windows hold no live entries, to bound memory
    pub async fn cleanup_expired(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        windows.retain(|_, window| {
            let mut times = window.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            times.retain(|&t| now.duration_since(t) < self.window);
            !times.is_empty()
        });
    }

    /// Start the periodic cleanup task
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                self.cleanup_expired().await;
            }
        });
    }

    /// Number of addresses currently tracked
    pub async fn tracked_addresses(&self) -> usize {
        let windows = self.windows.read().await;
        windows.len()
    }
}

// Shared reference to the limiter
pub type SharedRateLimiter = Arc<RequestRateLimiter>;
