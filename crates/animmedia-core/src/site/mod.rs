//! Page-level helpers shared by every page of the site.
//!
//! - `forms`: contact and registration form validation
//! - `consent`: the cookie consent banner state

pub mod consent;
pub mod forms;

pub use consent::{CookieConsent, CONSENT_KEY};
pub use forms::{validate_form, FieldError, FieldKind, FormField};
