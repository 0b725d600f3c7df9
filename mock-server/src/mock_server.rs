use crate::{
    data::{normalize_path, RequestData, RequestLogEntry, ResponseData},
    error::Error,
    handler_registry::{Handler, HandlerRegistry},
    mock_server_configuration::MockServerConfiguration,
    request_recorder::RequestRecorder,
    response_table::{DefaultResponse, RegisteredResponse, ResponseTable},
    runner::{self, RunningServer},
};
use hyper::{Method, StatusCode};
use serde::Serialize;
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

#[derive(Debug)]
pub(crate) struct ServerState {
    pub(crate) configuration: MockServerConfiguration,
    pub(crate) responses: ResponseTable,
    pub(crate) handlers: HandlerRegistry,
    pub(crate) recorder: RequestRecorder,
}

impl ServerState {
    fn new(configuration: MockServerConfiguration) -> Self {
        Self {
            configuration,
            responses: ResponseTable::new(),
            handlers: HandlerRegistry::new(),
            recorder: RequestRecorder::new(),
        }
    }
}

// Poisoning is ignored: every write to the state is a single insert or push.
pub(crate) fn lock(state: &Mutex<ServerState>) -> MutexGuard<'_, ServerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolves a request against the registered handlers and responses and records
/// the outcome.
pub(crate) fn resolve(state: &Mutex<ServerState>, request: &RequestData) -> ResponseData {
    let handler = lock(state).handlers.find(&request.path);

    // the lock is released while the handler runs, so it may use the server itself
    let response = match handler {
        Some(handler) => handler.handle(request).unwrap_or_else(|err| {
            tracing::error!(method = %request.method, path = %request.path, %err, "handler failed");
            ResponseData::text(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }),
        None => {
            let state = lock(state);
            state
                .responses
                .resolve(&request.method, &request.path)
                .unwrap_or_else(|| {
                    tracing::warn!(
                        server = state.configuration.name(),
                        method = %request.method,
                        path = %request.path,
                        "no response configured"
                    );
                    ResponseData::text(
                        state.configuration.not_configured_status(),
                        format!(
                            "no response configured for {} {}",
                            request.method, request.path
                        ),
                    )
                })
        }
    };

    record(state, request, &response);
    response
}

pub(crate) fn record(state: &Mutex<ServerState>, request: &RequestData, response: &ResponseData) {
    let mut state = lock(state);
    let name = String::from(state.configuration.name());
    let entry = state.recorder.record(request, response);
    tracing::info!(
        server = %name,
        method = %entry.method,
        path = %entry.path,
        status = entry.status_code.as_u16(),
        "{}",
        entry.response_body
    );
}

/// A local HTTP server answering with whatever the test registered.
///
/// Responses and handlers may be registered before or after [`MockServer::start`];
/// every request sees the registrations made before it arrived.
#[derive(Debug)]
pub struct MockServer {
    state: Arc<Mutex<ServerState>>,
    running: Option<RunningServer>,
}

impl MockServer {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self::with_configuration(MockServerConfiguration::new(name))
    }

    pub fn with_configuration(configuration: MockServerConfiguration) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState::new(configuration))),
            running: None,
        }
    }

    pub fn name(&self) -> String {
        String::from(lock(&self.state).configuration.name())
    }

    pub fn start(&mut self) -> Result<SocketAddr, Error> {
        if self.running.is_some() {
            return Err(Error::AlreadyStarted);
        }

        let configuration = lock(&self.state).configuration.clone();
        let running = runner::spawn(&configuration, self.state.clone())?;
        let addr = running.addr();
        tracing::debug!(server = configuration.name(), %addr, "mock server started");

        self.running = Some(running);
        Ok(addr)
    }

    pub fn stop(&mut self) -> Result<(), Error> {
        match self.running.take() {
            Some(running) => {
                let result = running.stop();
                tracing::debug!(
                    server = %self.name(),
                    requests = self.request_count(),
                    "mock server stopped"
                );
                result
            }
            None => Ok(()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn addr(&self) -> Result<SocketAddr, Error> {
        self.running
            .as_ref()
            .map(RunningServer::addr)
            .ok_or(Error::NotStarted)
    }

    /// Base URL of the server, without a trailing slash.
    pub fn url(&self) -> Result<String, Error> {
        Ok(format!("http://{}", self.addr()?))
    }

    pub fn url_for<S: AsRef<str>>(&self, path: S) -> Result<String, Error> {
        Ok(format!("{}{}", self.url()?, path.as_ref()))
    }

    /// Registers a 200 response for any method on `pattern`.
    pub fn response<S1: Into<String>, S2: Into<String>>(&self, pattern: S1, body: S2) -> &Self {
        self.response_with_code(pattern, body, StatusCode::OK)
    }

    pub fn response_with_code<S1: Into<String>, S2: Into<String>>(
        &self,
        pattern: S1,
        body: S2,
        status_code: StatusCode,
    ) -> &Self {
        self.insert_response(pattern.into(), None, status_code, body.into())
    }

    pub fn response_for<S1: Into<String>, S2: Into<String>>(
        &self,
        method: Method,
        pattern: S1,
        body: S2,
        status_code: StatusCode,
    ) -> &Self {
        self.insert_response(pattern.into(), Some(method), status_code, body.into())
    }

    /// Registers a 200 response for `method` on `pattern` with `payload` serialized as JSON.
    pub fn response_json_for<S: Into<String>, T: Serialize + ?Sized>(
        &self,
        method: Method,
        pattern: S,
        payload: &T,
    ) -> Result<&Self, Error> {
        let body = serde_json::to_string(payload)?;
        Ok(self.response_for(method, pattern, body, StatusCode::OK))
    }

    /// Registers an empty-body response with `status_code` for any method on `pattern`.
    ///
    /// Meant for 4xx and 5xx codes; a 2xx code is served as given, with a warning.
    pub fn error_response<S: Into<String>>(&self, pattern: S, status_code: StatusCode) -> &Self {
        let pattern = pattern.into();
        if status_code.is_success() {
            tracing::warn!(
                server = %self.name(),
                %pattern,
                status = status_code.as_u16(),
                "error response registered with a success code"
            );
        }
        self.insert_response(pattern, None, status_code, String::new())
    }

    /// Registers a fallback for every path matching `pattern`, where each `{name}`
    /// stands for one path segment and is substituted into `body`. `None` matches any
    /// method.
    pub fn register_default_response<S1: Into<String>, S2: Into<String>>(
        &self,
        pattern: S1,
        method: Option<Method>,
        status_code: StatusCode,
        body: S2,
    ) -> Result<&Self, Error> {
        let default = DefaultResponse::new(pattern, method, status_code, body)?;
        let mut state = lock(&self.state);
        tracing::debug!(
            server = state.configuration.name(),
            pattern = default.pattern(),
            "adding default response"
        );
        state.responses.insert_default(default);
        Ok(self)
    }

    pub fn register_default_response_json<S: Into<String>, T: Serialize + ?Sized>(
        &self,
        pattern: S,
        method: Option<Method>,
        status_code: StatusCode,
        payload: &T,
    ) -> Result<&Self, Error> {
        let body = serde_json::to_string(payload)?;
        self.register_default_response(pattern, method, status_code, body)
    }

    pub fn handler<S: Into<String>, H: Handler + 'static>(&self, pattern: S, handler: H) -> &Self {
        let pattern = pattern.into();
        let mut state = lock(&self.state);
        tracing::debug!(server = state.configuration.name(), %pattern, "adding handler");
        state.handlers.insert(pattern, handler);
        self
    }

    pub fn requests(&self) -> Vec<RequestLogEntry> {
        lock(&self.state).recorder.entries().to_vec()
    }

    pub fn requests_for<S: AsRef<str>>(&self, method: &Method, path: S) -> Vec<RequestLogEntry> {
        lock(&self.state)
            .recorder
            .entries_for(method, &normalize_path(path.as_ref()))
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.state).recorder.len()
    }

    fn insert_response(
        &self,
        pattern: String,
        method: Option<Method>,
        status_code: StatusCode,
        body: String,
    ) -> &Self {
        let mut state = lock(&self.state);
        tracing::debug!(
            server = state.configuration.name(),
            %pattern,
            method = ?method,
            status = status_code.as_u16(),
            "adding response"
        );
        state.responses.insert(RegisteredResponse {
            pattern,
            method,
            status_code,
            body,
        });
        self
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::error!(%err, "couldn't shut down the mock server");
        }
    }
}
