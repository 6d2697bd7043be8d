use once_cell::sync::Lazy;
use regex::Regex;

pub const REQUIRED_MESSAGE: &str = "Ce champ est obligatoire";
pub const INVALID_EMAIL_MESSAGE: &str = "Veuillez saisir une adresse email valide";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid EMAIL_RE regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    #[default]
    Text,
    Email,
}

/// One input of a submitted form.
#[derive(Debug, Clone, Default)]
pub struct FormField {
    pub name: String,
    pub value: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn email(mut self) -> Self {
        self.kind = FieldKind::Email;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: &'static str,
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Validate the required fields of a form, returning one error per failing
/// field. Optional fields are never checked. An empty result means the form
/// can be submitted.
pub fn validate_form(fields: &[FormField]) -> Vec<FieldError> {
    fields
        .iter()
        .filter(|f| f.required)
        .filter_map(|f| {
            let message = if f.value.trim().is_empty() {
                REQUIRED_MESSAGE
            } else if f.kind == FieldKind::Email && !is_valid_email(&f.value) {
                INVALID_EMAIL_MESSAGE
            } else {
                return None;
            };
            Some(FieldError {
                field: f.name.clone(),
                message,
            })
        })
        .collect()
}
