//! Request and response values exchanged across the worker boundary.

use std::borrow::Cow;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the requested resource will be used for.
///
/// Only `Document` changes behavior: a navigation that misses both network
/// and cache falls back to the app shell's root page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Manifest,
    #[default]
    Other,
}

impl Destination {
    /// Best guess from a URL path, the way a browser would label a plain link.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let file = path.rsplit('/').next().unwrap_or(path);

        if file.is_empty() || !file.contains('.') {
            return Destination::Document;
        }
        if file == "manifest.json" || file.ends_with(".webmanifest") {
            return Destination::Manifest;
        }
        match file.rsplit('.').next().map(|ext| ext.to_ascii_lowercase()).as_deref() {
            Some("html") | Some("htm") => Destination::Document,
            Some("css") => Destination::Style,
            Some("js") | Some("mjs") => Destination::Script,
            Some("png") | Some("jpg") | Some("jpeg") | Some("gif") | Some("svg") | Some("webp")
            | Some("ico") => Destination::Image,
            _ => Destination::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub url: String,
    #[serde(default)]
    pub method: Method,
    #[serde(default)]
    pub destination: Destination,
}

impl Request {
    /// A GET whose destination is inferred from the path.
    pub fn get(url: impl Into<String>) -> Self {
        let url = url.into();
        let destination = Destination::from_path(&url);
        Self {
            url,
            method: Method::Get,
            destination,
        }
    }

    /// A top-level navigation to `url`.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            destination: Destination::Document,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Key the response is cached under.
    pub fn cache_key(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 2xx status, as `Response.ok` in the fetch API.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
