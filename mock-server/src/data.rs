use hyper::{Method, StatusCode};
use std::{collections::HashMap, fmt};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// A request as seen by the mock, with the body already read.
#[derive(Debug, Clone)]
pub struct RequestData {
    pub method: Method,
    /// Path with any trailing slash removed (except for the root).
    pub path: String,
    /// Path and query as sent by the client.
    pub uri: String,
    pub headers: HashMap<String, String>,
    /// The body exactly as sent. Requests whose body isn't UTF-8 are answered 400
    /// before any route sees them.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseData {
    pub status_code: StatusCode,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ResponseData {
    pub fn new<S: Into<String>>(status_code: StatusCode, body: S) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// A response whose body is JSON. Empty bodies get no content type.
    pub fn json<S: Into<String>>(status_code: StatusCode, body: S) -> Self {
        let response = Self::new(status_code, body);
        if response.body.is_empty() {
            response
        } else {
            response.with_header("content-type", CONTENT_TYPE_JSON)
        }
    }

    pub fn text<S: Into<String>>(status_code: StatusCode, body: S) -> Self {
        Self::new(status_code, body).with_header("content-type", CONTENT_TYPE_TEXT)
    }

    pub fn with_header<S1: Into<String>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// One served request, in arrival order.
#[derive(Debug, Clone)]
pub struct RequestLogEntry {
    pub method: Method,
    pub path: String,
    pub uri: String,
    pub headers: HashMap<String, String>,
    pub request_body: String,
    pub status_code: StatusCode,
    pub response_body: String,
}

impl fmt::Display for RequestLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} {}",
            self.method,
            self.uri,
            self.status_code.as_u16(),
            self.response_body
        )
    }
}

pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        String::from("/")
    } else {
        String::from(trimmed)
    }
}
