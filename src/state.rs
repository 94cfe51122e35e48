use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::models::Session;
use crate::services::dashboard::ReservationDashboard;
use crate::services::store::StoreConnector;

struct SessionEntry {
    dashboard: Arc<ReservationDashboard>,
    last_seen: Instant,
}

pub struct AppState {
    pub config: AppConfig,
    pub connector: Box<dyn StoreConnector>,
    dashboards: Mutex<HashMap<Session, SessionEntry>>,
}

impl AppState {
    pub fn new(config: AppConfig, connector: Box<dyn StoreConnector>) -> Self {
        Self {
            config,
            connector,
            dashboards: Mutex::new(HashMap::new()),
        }
    }

    fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.config.session_idle_secs)
    }

    /// Returns the dashboard for this session, creating it on first use.
    /// Sessions idle for longer than the configured TTL are dropped.
    pub fn dashboard_for(&self, session: &Session) -> Arc<ReservationDashboard> {
        let ttl = self.idle_ttl();
        let now = Instant::now();
        let mut dashboards = self.dashboards.lock().unwrap();

        let before = dashboards.len();
        dashboards.retain(|s, entry| s == session || now.duration_since(entry.last_seen) < ttl);
        let expired = before - dashboards.len();
        if expired > 0 {
            tracing::debug!(expired, "dropped idle dashboard sessions");
        }

        let entry = dashboards.entry(session.clone()).or_insert_with(|| SessionEntry {
            dashboard: Arc::new(ReservationDashboard::new(
                self.connector.connect(session.clone()),
            )),
            last_seen: now,
        });
        entry.last_seen = now;
        entry.dashboard.clone()
    }

    /// Drops the dashboard of a session the backend no longer accepts.
    pub fn forget(&self, session: &Session) {
        if self.dashboards.lock().unwrap().remove(session).is_some() {
            tracing::info!("dropped dashboard for rejected session");
        }
    }

    pub fn session_count(&self) -> usize {
        self.dashboards.lock().unwrap().len()
    }
}
