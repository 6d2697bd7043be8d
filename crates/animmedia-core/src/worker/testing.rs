//! Test doubles for the worker seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::fetcher::Fetcher;
use super::http::{Request, Response};
use super::FetchError;

/// Serves canned responses by URL; unknown URLs and offline mode reject.
#[derive(Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.into()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Unreachable("offline".to_string()));
        }
        let route = self.routes.lock().unwrap().get(&request.url).cloned();
        match route {
            Some((status, body)) => Ok(Response::new(request.url.clone(), status, body)),
            None => Err(FetchError::Unreachable(format!("no route for {}", request.url))),
        }
    }
}
