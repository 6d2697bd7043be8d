//! Resource cache controller: the service worker's lifecycle and fetch
//! strategy.
//!
//! The controller owns one cache bucket named by the version tag. `install`
//! fills it with the app shell, `activate` deletes every other bucket, and
//! `handle_fetch` serves requests network-first, falling back to the bucket
//! and finally to the app shell's root document for navigations.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::cache_storage::CacheStorage;
use super::fetcher::Fetcher;
use super::http::{Destination, Method, Request, Response};
use super::notifications::{
    build_push_notification, handle_notification_click, ClickOutcome, Notification,
};
use super::{CacheStorageError, WorkerError};
use crate::clock::Clock;

// ============================================================================
// Constants
// ============================================================================

/// Version tag of the active cache bucket. Bump it to discard every
/// previously cached resource on the next activation.
pub const CACHE_VERSION: &str = "anim-media-v1.0";

/// Resources cached at install time.
pub const APP_SHELL: &[&str] = &[
    "/",
    "/index.html",
    "/assets/css/main.css",
    "/assets/css/animations.css",
    "/assets/js/main.js",
    "/assets/js/agenda.js",
    "/pages/activites.html",
    "/pages/agenda.html",
    "/pages/association.html",
    "/pages/contact.html",
    "/pages/galerie.html",
    "/pages/partenaires.html",
    "/data/events.json",
    "/data/activities.json",
    "/manifest.json",
];

/// Served for navigations that neither the network nor the cache can answer.
pub const FALLBACK_DOCUMENT: &str = "/index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Installing,
    Installed,
    Active,
    Terminated,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Idle => write!(f, "idle"),
            LifecycleState::Installing => write!(f, "installing"),
            LifecycleState::Installed => write!(f, "installed"),
            LifecycleState::Active => write!(f, "active"),
            LifecycleState::Terminated => write!(f, "terminated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    pub cache_version: String,
    pub manifest: Vec<String>,
    pub fallback_document: String,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            cache_version: CACHE_VERSION.to_string(),
            manifest: APP_SHELL.iter().map(|s| s.to_string()).collect(),
            fallback_document: FALLBACK_DOCUMENT.to_string(),
        }
    }
}

pub struct ResourceCacheController {
    settings: WorkerSettings,
    fetcher: Arc<dyn Fetcher>,
    caches: Arc<dyn CacheStorage>,
    clock: Arc<dyn Clock>,
    state: Mutex<LifecycleState>,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl ResourceCacheController {
    pub fn new(
        settings: WorkerSettings,
        fetcher: Arc<dyn Fetcher>,
        caches: Arc<dyn CacheStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            caches,
            clock,
            state: Mutex::new(LifecycleState::Idle),
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    pub fn state(&self) -> LifecycleState {
        *lock(&self.state)
    }

    fn set_state(&self, state: LifecycleState) {
        debug!(from = %self.state(), to = %state, "Worker state change");
        *lock(&self.state) = state;
    }

    // ===== Lifecycle =====

    /// Populate the active bucket with the manifest.
    ///
    /// All resources are fetched before anything is stored; one failure
    /// fails the whole install and leaves the worker terminated.
    pub async fn install(&self) -> Result<usize, WorkerError> {
        let state = self.state();
        if !matches!(state, LifecycleState::Idle | LifecycleState::Terminated) {
            return Err(WorkerError::InvalidState {
                operation: "install",
                state,
            });
        }
        self.set_state(LifecycleState::Installing);

        match self.populate_app_shell().await {
            Ok(count) => {
                info!(cache = %self.settings.cache_version, resources = count, "Worker installed");
                self.set_state(LifecycleState::Installed);
                Ok(count)
            }
            Err(e) => {
                error!(cache = %self.settings.cache_version, error = %e, "Worker install failed");
                self.set_state(LifecycleState::Terminated);
                Err(e)
            }
        }
    }

    async fn populate_app_shell(&self) -> Result<usize, WorkerError> {
        let version = &self.settings.cache_version;

        let requests: Vec<Request> = self
            .settings
            .manifest
            .iter()
            .map(|url| Request::get(url.as_str()))
            .collect();
        let results = join_all(requests.iter().map(|r| self.fetcher.fetch(r))).await;

        let mut responses = Vec::with_capacity(requests.len());
        for (request, result) in requests.iter().zip(results) {
            match result {
                Ok(response) if response.is_ok() => {
                    responses.push((request.cache_key().to_string(), response));
                }
                Ok(response) => {
                    return Err(WorkerError::Install {
                        url: request.url.clone(),
                        reason: format!("status {}", response.status),
                    });
                }
                Err(e) => {
                    return Err(WorkerError::Install {
                        url: request.url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // The bucket exists only after a complete install; `resume` relies on it
        let count = responses.len();
        self.caches.open(version).await?;
        self.caches.put_all(version, responses).await?;
        Ok(count)
    }

    /// Delete every bucket other than the active one. Returns the deleted names.
    pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
        let state = self.state();
        if !matches!(state, LifecycleState::Installed | LifecycleState::Active) {
            return Err(WorkerError::InvalidState {
                operation: "activate",
                state,
            });
        }

        let mut deleted = Vec::new();
        for name in self.caches.keys().await? {
            if name != self.settings.cache_version {
                info!(cache = %name, "Deleting stale cache");
                self.caches.delete(&name).await?;
                deleted.push(name);
            }
        }

        self.set_state(LifecycleState::Active);
        Ok(deleted)
    }

    /// Take control again without reinstalling when the bucket for this
    /// version survives from an earlier run. Returns whether the worker is
    /// now active.
    pub async fn resume(&self) -> Result<bool, WorkerError> {
        let state = self.state();
        if state == LifecycleState::Active {
            return Ok(true);
        }
        if state != LifecycleState::Idle {
            return Err(WorkerError::InvalidState {
                operation: "resume",
                state,
            });
        }

        let installed = self
            .caches
            .keys()
            .await?
            .iter()
            .any(|name| *name == self.settings.cache_version);
        if installed {
            info!(cache = %self.settings.cache_version, "Worker resumed");
            self.set_state(LifecycleState::Active);
        }
        Ok(installed)
    }

    /// Wait for background cache writes, then stop intercepting.
    pub async fn terminate(&self) {
        self.flush_pending_writes().await;
        self.set_state(LifecycleState::Terminated);
    }

    // ===== Fetch =====

    /// Network first; on network failure the cache, then the fallback
    /// document for navigations. `None` means no response can be produced.
    pub async fn handle_fetch(&self, request: Request) -> Option<Response> {
        if self.state() != LifecycleState::Active {
            // Not controlling yet: plain network
            return self.fetcher.fetch(&request).await.ok();
        }

        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                if response.status == 200 && request.method == Method::Get {
                    self.store_in_background(request.cache_key().to_string(), response.clone());
                }
                Some(response)
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Network failed, trying cache");
                self.from_cache(&request).await
            }
        }
    }

    async fn from_cache(&self, request: &Request) -> Option<Response> {
        let version = &self.settings.cache_version;

        if let Some(response) = self.cached(version, request.cache_key()).await {
            return Some(response);
        }
        if request.destination == Destination::Document {
            debug!(url = %request.url, "Serving fallback document");
            return self.cached(version, &self.settings.fallback_document).await;
        }
        None
    }

    async fn cached(&self, bucket: &str, key: &str) -> Option<Response> {
        match self.caches.match_in(bucket, key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(bucket, key, error = %e, "Failed to read cached response");
                None
            }
        }
    }

    fn store_in_background(&self, key: String, response: Response) {
        let caches = Arc::clone(&self.caches);
        let bucket = self.settings.cache_version.clone();

        let handle = tokio::spawn(async move {
            let result: Result<(), CacheStorageError> = async {
                caches.open(&bucket).await?;
                caches.put(&bucket, &key, response).await
            }
            .await;
            if let Err(e) = result {
                warn!(bucket = %bucket, key = %key, error = %e, "Failed to cache response");
            }
        });

        let mut pending = lock(&self.pending_writes);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait until every cache write started so far has completed.
    pub async fn flush_pending_writes(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *lock(&self.pending_writes));
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Cache write task failed");
            }
        }
    }

    // ===== Notifications =====

    pub fn push(&self, payload: Option<&str>) -> Notification {
        build_push_notification(payload, self.clock.now_millis())
    }

    pub fn notification_click(&self, action: Option<&str>) -> ClickOutcome {
        handle_notification_click(action)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::worker::cache_storage::MemoryCacheStorage;
    use crate::worker::testing::FakeFetcher;

    fn settings(manifest: &[&str]) -> WorkerSettings {
        WorkerSettings {
            cache_version: "v2".to_string(),
            manifest: manifest.iter().map(|s| s.to_string()).collect(),
            fallback_document: "/index.html".to_string(),
        }
    }

    fn controller(
        fetcher: Arc<FakeFetcher>,
        caches: Arc<MemoryCacheStorage>,
        manifest: &[&str],
    ) -> ResourceCacheController {
        ResourceCacheController::new(
            settings(manifest),
            fetcher,
            caches,
            Arc::new(ManualClock::new(0)),
        )
    }

    async fn active_controller(
        fetcher: Arc<FakeFetcher>,
        caches: Arc<MemoryCacheStorage>,
    ) -> ResourceCacheController {
        let controller = controller(fetcher, caches, &["/", "/index.html"]);
        controller.install().await.unwrap();
        controller.activate().await.unwrap();
        controller
    }

    #[tokio::test]
    async fn test_install_caches_manifest() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        fetcher.serve("/index.html", 200, "index");
        let caches = Arc::new(MemoryCacheStorage::new());
        let controller = controller(fetcher, caches.clone(), &["/", "/index.html"]);

        assert_eq!(controller.install().await.unwrap(), 2);
        assert_eq!(controller.state(), LifecycleState::Installed);
        assert_eq!(caches.entries("v2").await.unwrap(), vec!["/", "/index.html"]);
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        fetcher.serve("/missing.css", 404, "");
        let caches = Arc::new(MemoryCacheStorage::new());
        let controller = controller(fetcher, caches.clone(), &["/", "/missing.css"]);

        let err = controller.install().await.unwrap_err();
        assert!(matches!(err, WorkerError::Install { ref url, .. } if url == "/missing.css"));
        assert_eq!(controller.state(), LifecycleState::Terminated);
        assert!(caches.entries("v2").await.unwrap().is_empty());

        // A terminated worker cannot activate
        assert!(matches!(
            controller.activate().await,
            Err(WorkerError::InvalidState { operation: "activate", .. })
        ));
    }

    #[tokio::test]
    async fn test_install_fails_when_network_down() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        fetcher.set_offline(true);
        let caches = Arc::new(MemoryCacheStorage::new());
        let controller = controller(fetcher, caches, &["/"]);

        assert!(matches!(controller.install().await, Err(WorkerError::Install { .. })));
    }

    #[tokio::test]
    async fn test_activate_deletes_other_versions() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        fetcher.serve("/index.html", 200, "index");
        let caches = Arc::new(MemoryCacheStorage::new());
        caches.open("v1").await.unwrap();
        caches.open("images").await.unwrap();

        let controller = controller(fetcher, caches.clone(), &["/", "/index.html"]);
        controller.install().await.unwrap();
        let mut deleted = controller.activate().await.unwrap();
        deleted.sort();

        assert_eq!(deleted, vec!["images", "v1"]);
        assert_eq!(caches.keys().await.unwrap(), vec!["v2"]);
        assert_eq!(controller.state(), LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let controller = controller(
            Arc::new(FakeFetcher::new()),
            Arc::new(MemoryCacheStorage::new()),
            &[],
        );
        assert!(matches!(
            controller.activate().await,
            Err(WorkerError::InvalidState { state: LifecycleState::Idle, .. })
        ));
    }

    #[tokio::test]
    async fn test_network_success_is_returned_and_cached() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        fetcher.serve("/index.html", 200, "index");
        fetcher.serve("/data/content.json", 200, "{\"events\":[]}");
        let caches = Arc::new(MemoryCacheStorage::new());
        let controller = active_controller(fetcher, caches.clone()).await;

        let response = controller
            .handle_fetch(Request::get("/data/content.json"))
            .await
            .unwrap();
        assert_eq!(response.text(), "{\"events\":[]}");

        controller.flush_pending_writes().await;
        let cached = caches.match_in("v2", "/data/content.json").await.unwrap();
        assert_eq!(cached, Some(response));
    }

    #[tokio::test]
    async fn test_network_prefered_over_cache() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        fetcher.serve("/index.html", 200, "index v1");
        let caches = Arc::new(MemoryCacheStorage::new());
        let controller = active_controller(fetcher.clone(), caches).await;

        fetcher.serve("/index.html", 200, "index v2");
        let response = controller.handle_fetch(Request::navigate("/index.html")).await.unwrap();
        assert_eq!(response.text(), "index v2");
    }

    #[tokio::test]
    async fn test_non_200_not_cached() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        fetcher.serve("/index.html", 200, "index");
        fetcher.serve("/gone.html", 404, "not found");
        fetcher.serve("/partial", 206, "part");
        let caches = Arc::new(MemoryCacheStorage::new());
        let controller = active_controller(fetcher, caches.clone()).await;

        let response = controller.handle_fetch(Request::get("/gone.html")).await.unwrap();
        assert_eq!(response.status, 404);
        let response = controller.handle_fetch(Request::get("/partial")).await.unwrap();
        assert_eq!(response.status, 206);

        controller.flush_pending_writes().await;
        assert_eq!(caches.entries("v2").await.unwrap(), vec!["/", "/index.html"]);
    }

    #[tokio::test]
    async fn test_non_get_not_cached() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        fetcher.serve("/index.html", 200, "index");
        fetcher.serve("/contact", 200, "merci");
        let caches = Arc::new(MemoryCacheStorage::new());
        let controller = active_controller(fetcher, caches.clone()).await;

        let request = Request::get("/contact").with_method(Method::Post);
        assert!(controller.handle_fetch(request).await.is_some());
        controller.flush_pending_writes().await;
        assert_eq!(caches.match_in("v2", "/contact").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_offline_serves_cached_entry_unchanged() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        fetcher.serve("/index.html", 200, "index");
        fetcher.serve("/assets/css/main.css", 200, "body{}");
        let caches = Arc::new(MemoryCacheStorage::new());
        let controller = active_controller(fetcher.clone(), caches).await;

        let online = controller
            .handle_fetch(Request::get("/assets/css/main.css"))
            .await
            .unwrap();
        controller.flush_pending_writes().await;

        fetcher.set_offline(true);
        let offline = controller
            .handle_fetch(Request::get("/assets/css/main.css"))
            .await
            .unwrap();
        assert_eq!(offline, online);
    }

    #[tokio::test]
    async fn test_offline_navigation_falls_back_to_index() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        fetcher.serve("/index.html", 200, "index");
        let caches = Arc::new(MemoryCacheStorage::new());
        let controller = active_controller(fetcher.clone(), caches).await;
        fetcher.set_offline(true);

        let response = controller
            .handle_fetch(Request::navigate("/pages/galerie.html"))
            .await
            .unwrap();
        assert_eq!(response.text(), "index");

        // Sub-resources get nothing
        assert_eq!(
            controller.handle_fetch(Request::get("/assets/images/logo.png")).await,
            None
        );
    }

    #[tokio::test]
    async fn test_before_activation_requests_pass_through() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/data/events.json", 200, "[]");
        let caches = Arc::new(MemoryCacheStorage::new());
        let controller = controller(fetcher.clone(), caches.clone(), &[]);

        let response = controller.handle_fetch(Request::get("/data/events.json")).await;
        assert_eq!(response.map(|r| r.status), Some(200));
        controller.flush_pending_writes().await;
        assert!(caches.keys().await.unwrap().is_empty());

        fetcher.set_offline(true);
        assert_eq!(controller.handle_fetch(Request::get("/data/events.json")).await, None);
    }

    #[tokio::test]
    async fn test_push_uses_clock() {
        let controller = ResourceCacheController::new(
            settings(&[]),
            Arc::new(FakeFetcher::new()),
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(ManualClock::new(1_234)),
        );
        assert_eq!(controller.push(None).options.data.date_of_arrival, 1_234);
        assert_eq!(
            controller.notification_click(Some("explore")),
            ClickOutcome::OpenWindow("/pages/agenda.html".to_string())
        );
    }

    #[tokio::test]
    async fn test_resume_reuses_installed_bucket() {
        let fetcher = Arc::new(FakeFetcher::new());
        let caches = Arc::new(MemoryCacheStorage::new());
        caches.open("v2").await.unwrap();
        caches
            .put("v2", "/index.html", Response::new("/index.html", 200, "index"))
            .await
            .unwrap();
        let controller = controller(fetcher.clone(), caches, &["/index.html"]);

        assert!(controller.resume().await.unwrap());
        assert_eq!(controller.state(), LifecycleState::Active);
        assert_eq!(fetcher.calls(), 0);

        fetcher.set_offline(true);
        let response = controller
            .handle_fetch(Request::navigate("/pages/galerie.html"))
            .await
            .unwrap();
        assert_eq!(response.text(), "index");
    }

    #[tokio::test]
    async fn test_resume_without_bucket_stays_idle() {
        let fetcher = Arc::new(FakeFetcher::new());
        let caches = Arc::new(MemoryCacheStorage::new());
        caches.open("v1").await.unwrap();
        let controller = controller(fetcher, caches, &["/"]);

        assert!(!controller.resume().await.unwrap());
        assert_eq!(controller.state(), LifecycleState::Idle);
    }

    #[tokio::test]
    async fn test_failed_install_is_not_resumed() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.serve("/", 200, "root");
        let caches = Arc::new(MemoryCacheStorage::new());
        caches.open("v1").await.unwrap();

        let first = controller(fetcher.clone(), caches.clone(), &["/", "/index.html"]);
        assert!(first.install().await.is_err());
        assert_eq!(caches.keys().await.unwrap(), vec!["v1"]);

        let next = controller(fetcher, caches.clone(), &["/", "/index.html"]);
        assert!(!next.resume().await.unwrap());
        assert_eq!(next.state(), LifecycleState::Idle);
        // The previous version is left for a successful activation to purge
        assert_eq!(caches.keys().await.unwrap(), vec!["v1"]);
    }
}
