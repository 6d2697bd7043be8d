use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::fallback::{fallback_config, fallback_content};
use super::DataError;
use crate::cache::SmartCache;
use crate::clock::Clock;
use crate::models::{Activity, Event, SiteConfig, SiteContent};
use crate::worker::{Fetcher, Request};

// ============================================================================
// Constants
// ============================================================================

pub const CONTENT_URL: &str = "/data/content.json";
pub const CONFIG_URL: &str = "/data/config.json";

const CONTENT_CACHE_KEY: &str = "content";
const CONFIG_CACHE_KEY: &str = "config";

/// Icon for events whose activity has none.
const DEFAULT_EVENT_ICON: &str = "📅";

/// Category matching every event.
pub const ALL_CATEGORIES: &str = "all";

/// Loads the site's documents and answers queries over them.
pub struct DataService {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<SmartCache>,
    clock: Arc<dyn Clock>,
    content: SiteContent,
    config: SiteConfig,
    loaded: bool,
}

impl DataService {
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: Arc<SmartCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            cache,
            clock,
            content: SiteContent::default(),
            config: SiteConfig::default(),
            loaded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn content(&self) -> &SiteContent {
        &self.content
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn events(&self) -> &[Event] {
        &self.content.events
    }

    pub fn activities(&self) -> &[Activity] {
        &self.content.activities
    }

    /// How long ago the memoized `content.json` was fetched, if it is cached.
    pub fn content_age(&self) -> Option<String> {
        self.cache.entry_age(CONTENT_CACHE_KEY)
    }

    /// Today's date according to the service clock (UTC).
    pub fn today(&self) -> NaiveDate {
        DateTime::from_timestamp_millis(self.clock.now_millis())
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }

    // ===== Loading =====

    /// Load content and config, using memoized copies when still fresh.
    ///
    /// A content failure installs the fallback content and is returned; a
    /// config failure installs the fallback config and is only logged.
    pub async fn load_all(&mut self) -> Result<(), DataError> {
        self.load(true).await
    }

    /// Like `load_all`, but always goes to the fetcher.
    pub async fn refresh(&mut self) -> Result<(), DataError> {
        self.load(false).await
    }

    async fn load(&mut self, use_cache: bool) -> Result<(), DataError> {
        let (content, config) = futures::join!(
            self.fetch_document::<SiteContent>(CONTENT_URL, CONTENT_CACHE_KEY, use_cache),
            self.fetch_document::<SiteConfig>(CONFIG_URL, CONFIG_CACHE_KEY, use_cache),
        );

        match config {
            Ok(config) => self.config = config,
            Err(e) => {
                warn!(error = %e, "Could not load config.json, using default config");
                self.config = fallback_config();
            }
        }

        match content {
            Ok(content) => {
                self.content = content;
                self.enrich_events();
                self.loaded = true;
                info!(
                    activities = self.content.activities.len(),
                    events = self.content.events.len(),
                    "Site content loaded"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Could not load content.json, using fallback content");
                self.content = fallback_content(self.today());
                self.enrich_events();
                Err(e)
            }
        }
    }

    async fn fetch_document<T>(&self, url: &str, cache_key: &str, use_cache: bool) -> Result<T, DataError>
    where
        T: DeserializeOwned + Serialize,
    {
        if use_cache {
            if let Some(document) = self.cache.get::<T>(cache_key) {
                debug!(url, "Using memoized document");
                return Ok(document);
            }
        }

        let response = self
            .fetcher
            .fetch(&Request::get(url))
            .await
            .map_err(|source| DataError::Fetch {
                url: url.to_string(),
                source,
            })?;
        if !response.is_ok() {
            return Err(DataError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        let document: T = response.json().map_err(|source| DataError::Parse {
            url: url.to_string(),
            source,
        })?;
        self.cache.set_default(cache_key, &document);
        Ok(document)
    }

    /// Attach each event's activity, icon and display name.
    fn enrich_events(&mut self) {
        let activities = &self.content.activities;
        for event in &mut self.content.events {
            let activity = activities
                .iter()
                .find(|a| Some(a.id.as_str()) == event.activity_id.as_deref())
                .cloned();

            event.icon = Some(
                activity
                    .as_ref()
                    .and_then(|a| a.icon.clone())
                    .unwrap_or_else(|| DEFAULT_EVENT_ICON.to_string()),
            );
            event.activity_name = Some(
                activity
                    .as_ref()
                    .map(|a| a.name.clone())
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| event.title.clone()),
            );
            event.activity = activity;
        }
    }

    // ===== Queries =====

    /// Events in `category`, or every event for `"all"`.
    pub fn events_by_category(&self, category: &str) -> Vec<&Event> {
        self.content
            .events
            .iter()
            .filter(|e| category == ALL_CATEGORIES || e.category == category)
            .collect()
    }

    /// Events on or after `today`, soonest first, at most `limit` of them.
    pub fn upcoming_events(&self, today: NaiveDate, limit: Option<usize>) -> Vec<&Event> {
        let mut upcoming: Vec<&Event> = self
            .content
            .events
            .iter()
            .filter(|e| e.is_upcoming(today))
            .collect();
        upcoming.sort_by_key(|e| e.date());
        if let Some(limit) = limit {
            upcoming.truncate(limit);
        }
        upcoming
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.content.activities.iter().find(|a| a.id == id)
    }

    pub fn event(&self, id: i64) -> Option<&Event> {
        self.content.events.iter().find(|e| e.id == id)
    }
}

// ============================================================================
// Tests
// ============================================================================
