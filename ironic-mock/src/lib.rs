//! A mock Ironic API for tests of bare-metal provisioning code.
//!
//! ```no_run
//! use ironic_mock::{IronicMock, Node};
//!
//! let mut ironic = IronicMock::new()
//!     .with_default_responses()
//!     .with_node(&Node::new("uuid-1").with_name("worker-0"))
//!     .create_nodes();
//! ironic.start().unwrap();
//!
//! let endpoint = ironic.endpoint().unwrap();
//! // point the client under test at `endpoint`, then inspect `ironic.created_nodes()`
//! ```

mod data;
mod ironic_mock;

pub use data::node::{power_states, provision_states, Node};
pub use ironic_mock::{CreatedNode, IronicMock, DEFAULT_ENDPOINT};
pub use mock_server::{Error, MockServerConfiguration, StatusCode};
