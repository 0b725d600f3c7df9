use crate::data::{RequestData, RequestLogEntry, ResponseData};
use hyper::Method;

#[derive(Debug, Default)]
pub struct RequestRecorder {
    entries: Vec<RequestLogEntry>,
}

impl RequestRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, request: &RequestData, response: &ResponseData) -> &RequestLogEntry {
        self.entries.push(RequestLogEntry {
            method: request.method.clone(),
            path: request.path.clone(),
            uri: request.uri.clone(),
            headers: request.headers.clone(),
            request_body: request.body.clone(),
            status_code: response.status_code,
            response_body: response.body.clone(),
        });

        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[RequestLogEntry] {
        &self.entries
    }

    pub fn entries_for<'a>(
        &'a self,
        method: &'a Method,
        path: &'a str,
    ) -> impl Iterator<Item = &'a RequestLogEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.method == *method && entry.path == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
