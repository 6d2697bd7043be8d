use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::stats::{compute_stats, AnalyticsStats};
use crate::clock::Clock;
use crate::storage::{LocalStorage, StorageError};

/// Local-storage key holding the persisted event list.
pub const ANALYTICS_KEY: &str = "analytics";

/// Persisted events beyond this count are dropped, oldest first.
pub const MAX_STORED_EVENTS: usize = 1000;

const SESSION_PREFIX: &str = "session_";
const SESSION_ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Analytics storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Analytics data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    #[serde(rename = "event")]
    pub name: String,
    #[serde(rename = "data", default)]
    pub attributes: Map<String, Value>,
    pub timestamp: i64,
    pub session: String,
    pub page: String,
}

/// Records events to local storage.
///
/// Each instance is one session: the session id is generated on construction
/// and never persisted, so a new instance (a page load) starts a new session.
pub struct Analytics {
    storage: Arc<dyn LocalStorage>,
    clock: Arc<dyn Clock>,
    session: String,
    start_time: i64,
    page: Mutex<String>,
    buffer: Mutex<Vec<AnalyticsEvent>>,
}

impl Analytics {
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        clock: Arc<dyn Clock>,
        page: impl Into<String>,
    ) -> Self {
        let start_time = clock.now_millis();
        Self {
            storage,
            clock,
            session: generate_session_id(),
            start_time,
            page: Mutex::new(page.into()),
            buffer: Mutex::new(Vec::new()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session
    }

    /// Page path attached to subsequent events.
    pub fn set_page(&self, page: impl Into<String>) {
        *lock(&self.page) = page.into();
    }

    /// Milliseconds since this recorder was created.
    pub fn time_on_page(&self) -> i64 {
        self.clock.now_millis() - self.start_time
    }

    /// Record an event and flush it to storage.
    pub fn track(&self, name: &str, attributes: Map<String, Value>) {
        let event = AnalyticsEvent {
            name: name.to_string(),
            attributes,
            timestamp: self.clock.now_millis(),
            session: self.session.clone(),
            page: lock(&self.page).clone(),
        };
        debug!(event = %event.name, page = %event.page, "Tracking analytics event");

        let mut buffer = lock(&self.buffer);
        buffer.push(event);
        if let Err(e) = self.flush(&mut buffer) {
            warn!(pending = buffer.len(), error = %e, "Failed to save analytics");
        }
    }

    pub fn track_page_view(&self, title: &str, url: &str) {
        let mut attributes = Map::new();
        attributes.insert("title".to_string(), Value::from(title));
        attributes.insert("url".to_string(), Value::from(url));
        self.track("page_view", attributes);
    }

    pub fn track_page_leave(&self) {
        let mut attributes = Map::new();
        attributes.insert("timeSpent".to_string(), Value::from(self.time_on_page()));
        self.track("page_leave", attributes);
    }

    /// Events tracked but not yet written to storage.
    pub fn pending(&self) -> usize {
        lock(&self.buffer).len()
    }

    /// Summary of the last seven days, or `None` if storage can't be read.
    pub fn stats(&self) -> Option<AnalyticsStats> {
        match self.load_persisted() {
            Ok(events) => Some(compute_stats(&events, self.clock.now_millis())),
            Err(e) => {
                warn!(error = %e, "Failed to read analytics stats");
                None
            }
        }
    }

    /// The persisted event list, oldest first.
    pub fn stored_events(&self) -> Result<Vec<AnalyticsEvent>, AnalyticsError> {
        self.load_persisted()
    }

    /// Merge the buffer into storage. The buffer is only cleared once the
    /// write succeeds, so a failed flush is retried by the next `track`.
    fn flush(&self, buffer: &mut Vec<AnalyticsEvent>) -> Result<(), AnalyticsError> {
        let mut events = self.load_persisted()?;
        events.extend(buffer.iter().cloned());
        if events.len() > MAX_STORED_EVENTS {
            let excess = events.len() - MAX_STORED_EVENTS;
            events.drain(..excess);
        }

        let contents = serde_json::to_string(&events)?;
        self.storage.set_item(ANALYTICS_KEY, &contents)?;
        buffer.clear();
        Ok(())
    }

    fn load_persisted(&self) -> Result<Vec<AnalyticsEvent>, AnalyticsError> {
        match self.storage.get_item(ANALYTICS_KEY)? {
            Some(contents) => Ok(serde_json::from_str(&contents)?),
            None => Ok(Vec::new()),
        }
    }
}

fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SESSION_ID_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}{}", SESSION_PREFIX, suffix)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
