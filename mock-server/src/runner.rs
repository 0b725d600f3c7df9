use crate::{
    data::{normalize_path, RequestData, ResponseData},
    error::Error,
    mock_server::{self, ServerState},
    mock_server_configuration::MockServerConfiguration,
};
use hyper::{
    body,
    header::{HeaderName, HeaderValue},
    service::{make_service_fn, service_fn},
    Body, HeaderMap, Request, Response, Server, StatusCode,
};
use std::{
    collections::HashMap,
    convert::Infallible,
    net::{SocketAddr, TcpListener},
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
};
use tokio::{runtime, sync::oneshot};

#[derive(Debug)]
pub(crate) struct RunningServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    join_handle: JoinHandle<()>,
}

impl RunningServer {
    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub(crate) fn stop(self) -> Result<(), Error> {
        // the receiver is gone if the server already exited on its own
        let _ = self.shutdown.send(());
        self.join_handle
            .join()
            .map_err(|_| Error::ServerThreadPanicked)
    }
}

/// Binds the listener and serves it from a dedicated thread with its own runtime,
/// so the server works the same under `#[test]` and `#[tokio::test]`.
pub(crate) fn spawn(
    configuration: &MockServerConfiguration,
    state: Arc<Mutex<ServerState>>,
) -> Result<RunningServer, Error> {
    let listener = TcpListener::bind(configuration.bind_address())?;
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;

    let runtime = runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let builder = {
        let _guard = runtime.enter();
        Server::from_tcp(listener)?
    };

    let (shutdown, shutdown_receiver) = oneshot::channel::<()>();
    let name = String::from(configuration.name());

    let join_handle = thread::Builder::new()
        .name(format!("{}-mock-server", name))
        .spawn(move || {
            runtime.block_on(async move {
                let server = builder.serve(make_service_fn(move |_| {
                    let state = state.clone();
                    async move {
                        Ok::<_, Infallible>(service_fn(move |request| {
                            let state = state.clone();
                            async move { Ok::<_, Infallible>(handle_request(&state, request).await) }
                        }))
                    }
                }));

                tokio::select! {
                    result = server => {
                        if let Err(e) = result {
                            tracing::error!(server = %name, "mock server error: {}", e);
                        }
                    }
                    _ = shutdown_receiver => {}
                }
            });
        })?;

    Ok(RunningServer {
        addr,
        shutdown,
        join_handle,
    })
}

async fn handle_request(state: &Mutex<ServerState>, mut request: Request<Body>) -> Response<Body> {
    let mut request_data = read_request_head(&request);

    let response_data = match body::to_bytes(request.body_mut()).await {
        Ok(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => {
                request_data.body = text;
                mock_server::resolve(state, &request_data)
            }
            Err(e) => {
                tracing::warn!(
                    method = %request_data.method,
                    path = %request_data.path,
                    "request body is not UTF-8: {}",
                    e
                );
                request_data.body = String::from_utf8_lossy(e.as_bytes()).into();
                let response_data = ResponseData::text(
                    StatusCode::BAD_REQUEST,
                    format!("request body is not valid UTF-8: {}", e.utf8_error()),
                );
                mock_server::record(state, &request_data, &response_data);
                response_data
            }
        },
        Err(e) => {
            tracing::error!(
                method = %request_data.method,
                path = %request_data.path,
                "couldn't read the request body: {}",
                e
            );
            let response_data = ResponseData::text(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("ERROR: {}", Error::from(e)),
            );
            mock_server::record(state, &request_data, &response_data);
            response_data
        }
    };

    build_response(response_data).unwrap_or_else(|e| {
        tracing::error!("couldn't build the response: {}", e);
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

fn read_request_head(request: &Request<Body>) -> RequestData {
    RequestData {
        method: request.method().clone(),
        path: normalize_path(request.uri().path()),
        uri: request
            .uri()
            .path_and_query()
            .map(|p| String::from(p.as_str()))
            .unwrap_or_else(|| String::from(request.uri().path())),
        headers: request_headers(request.headers()),
        body: String::new(),
    }
}

fn build_response(response_data: ResponseData) -> Result<Response<Body>, Error> {
    let mut response_builder = Response::builder().status(response_data.status_code);

    if let Some(header_map) = response_builder.headers_mut() {
        for (name, value) in &response_data.headers {
            header_map.insert(
                HeaderName::from_bytes(name.as_bytes()).map_err(hyper::http::Error::from)?,
                HeaderValue::from_str(value).map_err(hyper::http::Error::from)?,
            );
        }
    }

    Ok(response_builder.body(Body::from(response_data.body))?)
}

/// Headers whose value isn't visible ASCII are left out of the request log.
fn request_headers(header_map: &HeaderMap) -> HashMap<String, String> {
    header_map
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (String::from(name.as_str()), String::from(value)))
        })
        .collect()
}
