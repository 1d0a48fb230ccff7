//! Per-user dashboard state kept between requests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::chat::ChatOrchestrator;
use crate::navigation::{NavigationSettings, NavigationShell};
use crate::plagiarism::PlagiarismForm;

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub navigation: NavigationShell,
    pub chat: ChatOrchestrator,
    pub plagiarism: PlagiarismForm,
}

impl DashboardState {
    pub fn new(settings: NavigationSettings) -> Self {
        Self {
            navigation: NavigationShell::new(settings),
            chat: ChatOrchestrator::new(),
            plagiarism: PlagiarismForm::new(),
        }
    }
}

pub type SharedDashboard = Arc<Mutex<DashboardState>>;

struct Entry {
    dashboard: SharedDashboard,
    last_seen: Instant,
}

/// Dashboards keyed by user id.
///
/// Callers hold the per-user lock only while mutating state. Upstream calls
/// are made between `begin_*` and `finish_*` with the lock released.
#[derive(Clone, Default)]
pub struct Workspaces {
    dashboards: Arc<DashMap<String, Entry>>,
    navigation: NavigationSettings,
}

impl Workspaces {
    pub fn new(navigation: NavigationSettings) -> Self {
        Self {
            dashboards: Arc::new(DashMap::new()),
            navigation,
        }
    }

    pub fn get_or_create(&self, user_id: &str) -> SharedDashboard {
        let mut entry = self
            .dashboards
            .entry(user_id.to_string())
            .or_insert_with(|| Entry {
                dashboard: Arc::new(Mutex::new(DashboardState::new(self.navigation.clone()))),
                last_seen: Instant::now(),
            });
        entry.last_seen = Instant::now();
        entry.dashboard.clone()
    }

    pub fn remove(&self, user_id: &str) {
        if self.dashboards.remove(user_id).is_some() {
            tracing::debug!(user_id, "Dashboard workspace dropped");
        }
    }

    pub fn len(&self) -> usize {
        self.dashboards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dashboards.is_empty()
    }

    /// Drop dashboards untouched for `max_idle`. A dashboard a request is
    /// still holding is kept until the next sweep.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        self.evict_idle_at(Instant::now(), max_idle)
    }

    fn evict_idle_at(&self, now: Instant, max_idle: Duration) -> usize {
        let mut evicted = 0;
        self.dashboards.retain(|_, entry| {
            let keep = now.saturating_duration_since(entry.last_seen) < max_idle
                || Arc::strong_count(&entry.dashboard) > 1;
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    /// Sweep idle dashboards every `every` on the current runtime.
    pub fn spawn_reaper(&self, max_idle: Duration, every: Duration) -> JoinHandle<()> {
        let workspaces = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let evicted = workspaces.evict_idle(max_idle);
                if evicted > 0 {
                    tracing::info!(
                        evicted,
                        remaining = workspaces.len(),
                        "Evicted idle dashboards"
                    );
                }
            }
        })
    }
}
