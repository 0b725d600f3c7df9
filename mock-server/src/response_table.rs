use crate::{
    data::{normalize_path, ResponseData},
    error::Error,
};
use hyper::{Method, StatusCode};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref PLACEHOLDER_REGEX: Regex = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    path: String,
    method: Option<Method>,
}

/// A canned response for a literal path.
#[derive(Debug, Clone)]
pub struct RegisteredResponse {
    pub pattern: String,
    pub method: Option<Method>,
    pub status_code: StatusCode,
    pub body: String,
}

/// A canned response for a pattern containing `{name}` placeholders.
#[derive(Debug, Clone)]
pub struct DefaultResponse {
    pattern: String,
    method: Option<Method>,
    status_code: StatusCode,
    body: String,
    regex: Regex,
    placeholders: Vec<String>,
}

impl DefaultResponse {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        pattern: S1,
        method: Option<Method>,
        status_code: StatusCode,
        body: S2,
    ) -> Result<Self, Error> {
        let pattern: String = pattern.into();
        let pattern = normalize_path(&pattern);
        let (regex, placeholders) = compile_pattern(&pattern)?;

        Ok(Self {
            pattern,
            method,
            status_code,
            body: body.into(),
            regex,
            placeholders,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the body with every placeholder replaced by the matching path segment.
    fn render(&self, method: &Method, path: &str) -> Option<ResponseData> {
        if self.method.as_ref().map_or(false, |m| m != method) {
            return None;
        }

        let captures = self.regex.captures(path)?;
        let mut body = self.body.clone();
        for (index, name) in self.placeholders.iter().enumerate() {
            if let Some(value) = captures.get(index + 1) {
                body = body.replace(&format!("{{{}}}", name), value.as_str());
            }
        }

        Some(ResponseData::json(self.status_code, body))
    }
}

fn compile_pattern(pattern: &str) -> Result<(Regex, Vec<String>), Error> {
    let mut expression = String::from("^");
    let mut placeholders = Vec::new();
    let mut last = 0;

    for captures in PLACEHOLDER_REGEX.captures_iter(pattern) {
        if let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) {
            expression.push_str(&regex::escape(&pattern[last..whole.start()]));
            expression.push_str("([^/]+)");
            placeholders.push(String::from(name.as_str()));
            last = whole.end();
        }
    }
    expression.push_str(&regex::escape(&pattern[last..]));
    expression.push('$');

    Ok((Regex::new(&expression)?, placeholders))
}

#[derive(Debug, Default)]
pub struct ResponseTable {
    responses: HashMap<RouteKey, RegisteredResponse>,
    defaults: Vec<DefaultResponse>,
}

impl ResponseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, response: RegisteredResponse) {
        let key = RouteKey {
            path: normalize_path(&response.pattern),
            method: response.method.clone(),
        };
        self.responses.insert(key, response);
    }

    pub fn insert_default(&mut self, response: DefaultResponse) {
        match self
            .defaults
            .iter_mut()
            .find(|d| d.pattern == response.pattern && d.method == response.method)
        {
            Some(existing) => *existing = response,
            None => self.defaults.push(response),
        }
    }

    /// Exact (path, method) first, then (path, any method), then default patterns in
    /// registration order.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResponseData> {
        let path = normalize_path(path);
        let exact = RouteKey {
            path: path.clone(),
            method: Some(method.clone()),
        };
        let any = RouteKey { path, method: None };

        if let Some(response) = self
            .responses
            .get(&exact)
            .or_else(|| self.responses.get(&any))
        {
            return Some(ResponseData::json(
                response.status_code,
                response.body.clone(),
            ));
        }

        self.defaults
            .iter()
            .find_map(|d| d.render(method, &any.path))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.responses.len() + self.defaults.len()
    }
}
