use std::sync::Arc;

use tracing::warn;

use crate::storage::LocalStorage;

/// Local storage key holding the visitor's consent.
pub const CONSENT_KEY: &str = "cookieConsent";

/// Cookie banner state, persisted in local storage.
pub struct CookieConsent {
    storage: Arc<dyn LocalStorage>,
}

impl CookieConsent {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// The banner is shown until consent has been recorded. An unreadable
    /// store counts as no consent.
    pub fn needs_banner(&self) -> bool {
        match self.storage.get_item(CONSENT_KEY) {
            Ok(value) => value.map_or(true, |v| v.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read cookie consent");
                true
            }
        }
    }

    pub fn accept(&self) {
        if let Err(e) = self.storage.set_item(CONSENT_KEY, "true") {
            warn!(error = %e, "Failed to store cookie consent");
        }
    }
}
