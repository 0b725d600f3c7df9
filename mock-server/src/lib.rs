//! A mock HTTP server for tests: register canned responses or handlers for paths,
//! point the code under test at [`MockServer::url`], then assert on what it sent.

mod data;
mod error;
mod handler_registry;
mod mock_server;
mod mock_server_configuration;
mod request_recorder;
mod response_table;
mod runner;

pub use data::{RequestData, RequestLogEntry, ResponseData, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT};
pub use error::Error;
pub use handler_registry::Handler;
pub use hyper::{Method, StatusCode};
pub use mock_server::MockServer;
pub use mock_server_configuration::MockServerConfiguration;
