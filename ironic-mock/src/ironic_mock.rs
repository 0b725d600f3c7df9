use crate::data::node::Node;
use mock_server::{
    Error, Method, MockServer, MockServerConfiguration, RequestData, ResponseData, StatusCode,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, PoisonError};

/// Endpoint handed to clients when no mock is in use.
pub const DEFAULT_ENDPOINT: &str = "https://ironic.test/v1/";

const NAME: &str = "ironic";
const NODES_PATH: &str = "/v1/nodes";

/// The body of a create-node request and the identifier the mock assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedNode {
    pub body: String,
    pub uuid: String,
}

/// A mock of the Ironic bare-metal provisioning API.
///
/// Every `with_*` method registers responses and hands the mock back, so a test can
/// describe the API state in one chain and then call [`IronicMock::start`].
#[derive(Debug)]
pub struct IronicMock {
    server: MockServer,
    created_nodes: Arc<Mutex<Vec<CreatedNode>>>,
}

impl IronicMock {
    /// Create an unstarted mock listening on an ephemeral local port once started.
    pub fn new() -> Self {
        Self::with_configuration(MockServerConfiguration::new(NAME))
    }

    /// Create an unstarted mock with the given server configuration.
    ///
    /// # Arguments
    /// `configuration` - bind address, log name and not-configured status of the server.
    ///
    /// # Returns
    /// The mock, with no responses registered.
    pub fn with_configuration(configuration: MockServerConfiguration) -> Self {
        Self {
            server: MockServer::with_configuration(configuration),
            created_nodes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn start(&mut self) -> Result<(), Error> {
        self.server.start().map(|_| ())
    }

    pub fn stop(&mut self) -> Result<(), Error> {
        self.server.stop()
    }

    /// The URL clients should use to reach the API, e.g. `http://127.0.0.1:41231/v1/`.
    ///
    /// # Returns
    /// The endpoint, or [`Error::NotStarted`] before [`IronicMock::start`].
    pub fn endpoint(&self) -> Result<String, Error> {
        Ok(format!("{}/v1/", self.server.url()?))
    }

    /// The endpoint of `mock`, or [`DEFAULT_ENDPOINT`] when there is no running mock.
    pub fn endpoint_or_default(mock: Option<&IronicMock>) -> String {
        mock.and_then(|m| m.endpoint().ok())
            .unwrap_or_else(|| String::from(DEFAULT_ENDPOINT))
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Nodes created through `POST /v1/nodes`, in creation order.
    pub fn created_nodes(&self) -> Vec<CreatedNode> {
        self.created_nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a valid answer for every node API call, then mark the API ready.
    ///
    /// Any node looked up by `/v1/nodes/<id>` is returned with `<id>` as its uuid;
    /// the provisioning and power sub-resources answer 202 and validation 200.
    pub fn with_default_responses(self) -> Self {
        self.add_default_json("/v1/nodes/{id}", StatusCode::OK, &Node::new("{id}"));
        self.add_default(
            "/v1/nodes/{id}/states/provision",
            StatusCode::ACCEPTED,
            "{}",
        );
        self.add_default("/v1/nodes/{id}/states/power", StatusCode::ACCEPTED, "{}");
        self.add_default("/v1/nodes/{id}/validate", StatusCode::OK, "{}");

        self.ready()
    }

    /// Make `/v1` answer 200 with an empty object.
    pub fn ready(self) -> Self {
        self.server.response("/v1", "{}");
        self
    }

    /// Make `/v1` answer with an error.
    ///
    /// # Arguments
    /// `error_code` - the status returned for every request to `/v1`.
    ///
    /// # Returns
    /// This mock.
    pub fn not_ready(self, error_code: StatusCode) -> Self {
        self.server.error_response("/v1", error_code);
        self
    }

    /// Make `/v1/drivers` list the `fake-hardware` driver.
    pub fn with_drivers(self) -> Self {
        let drivers = json!({
            "drivers": [{
                "hosts": [
                    "master-2.ostest.test.metalkube.org"
                ],
                "links": [
                    {
                        "href": "http://[fd00:1101::3]:6385/v1/drivers/fake-hardware",
                        "rel": "self"
                    },
                    {
                        "href": "http://[fd00:1101::3]:6385/drivers/fake-hardware",
                        "rel": "bookmark"
                    }
                ],
                "name": "fake-hardware"
            }]
        });
        self.server.response("/v1/drivers", drivers.to_string());
        self
    }

    /// Answer `GET /v1/nodes/<uuid>` and `GET /v1/nodes/<name>` with `node`.
    ///
    /// # Arguments
    /// `node` - the node to return. Empty uuid or name fields get no route.
    ///
    /// # Returns
    /// This mock.
    pub fn with_node(self, node: &Node) -> Self {
        self.with_node_for(node, Method::GET)
    }

    /// Answer `PATCH /v1/nodes/<uuid>` and `PATCH /v1/nodes/<name>` with `node`.
    pub fn with_node_update(self, node: &Node) -> Self {
        self.with_node_for(node, Method::PATCH)
    }

    fn with_node_for(self, node: &Node, method: Method) -> Self {
        for key in [&node.uuid, &node.name] {
            if key.is_empty() {
                continue;
            }
            if let Err(err) =
                self.server
                    .response_json_for(method.clone(), format!("{}/{}", NODES_PATH, key), node)
            {
                tracing::error!(server = NAME, node = %key, %err, "couldn't register the node");
            }
        }
        self
    }

    pub fn with_node_states_provision<S: AsRef<str>>(self, node_uuid: S) -> Self {
        self.with_node_states_provision_for(node_uuid.as_ref(), Method::GET)
    }

    pub fn with_node_states_provision_update<S: AsRef<str>>(self, node_uuid: S) -> Self {
        self.with_node_states_provision_for(node_uuid.as_ref(), Method::PUT)
    }

    fn with_node_states_provision_for(self, node_uuid: &str, method: Method) -> Self {
        self.server.response_for(
            method,
            format!("{}/{}/states/provision", NODES_PATH, node_uuid),
            "{}",
            StatusCode::ACCEPTED,
        );
        self
    }

    pub fn with_node_states_power<S: AsRef<str>>(self, node_uuid: S, code: StatusCode) -> Self {
        self.with_node_states_power_for(node_uuid.as_ref(), code, Method::GET)
    }

    pub fn with_node_states_power_update<S: AsRef<str>>(
        self,
        node_uuid: S,
        code: StatusCode,
    ) -> Self {
        self.with_node_states_power_for(node_uuid.as_ref(), code, Method::PUT)
    }

    fn with_node_states_power_for(self, node_uuid: &str, code: StatusCode, method: Method) -> Self {
        self.server.response_for(
            method,
            format!("{}/{}/states/power", NODES_PATH, node_uuid),
            "{}",
            code,
        );
        self
    }

    pub fn with_node_validate<S: AsRef<str>>(self, node_uuid: S) -> Self {
        self.server.response_with_code(
            format!("{}/{}/validate", NODES_PATH, node_uuid.as_ref()),
            "{}",
            StatusCode::OK,
        );
        self
    }

    /// Make `/v1/nodes/<name>` answer 404.
    pub fn no_node<S: AsRef<str>>(self, name: S) -> Self {
        self.node_error(name, StatusCode::NOT_FOUND)
    }

    pub fn node_error<S: AsRef<str>>(self, name: S, error_code: StatusCode) -> Self {
        self.server
            .error_response(format!("{}/{}", NODES_PATH, name.as_ref()), error_code);
        self
    }

    /// Accept `POST /v1/nodes`, recording each request body in [`IronicMock::created_nodes`].
    ///
    /// Nodes are assigned `node-0`, `node-1`, ... in creation order, and the response is
    /// the posted node with that value as its leading `uuid` field.
    pub fn create_nodes(self) -> Self {
        let created_nodes = self.created_nodes.clone();
        self.server.handler(NODES_PATH, move |request: &RequestData| {
            create_node(&created_nodes, request)
        });
        self
    }

    fn add_default(&self, pattern: &str, code: StatusCode, body: &str) {
        if let Err(err) = self
            .server
            .register_default_response(pattern, None, code, body)
        {
            tracing::error!(server = NAME, pattern, %err, "couldn't register default response");
        }
    }

    fn add_default_json<T: Serialize>(&self, pattern: &str, code: StatusCode, payload: &T) {
        if let Err(err) = self
            .server
            .register_default_response_json(pattern, None, code, payload)
        {
            tracing::error!(server = NAME, pattern, %err, "couldn't register default response");
        }
    }
}

impl Default for IronicMock {
    fn default() -> Self {
        Self::new()
    }
}

fn create_node(
    created_nodes: &Mutex<Vec<CreatedNode>>,
    request: &RequestData,
) -> Result<ResponseData, Error> {
    if request.method != Method::POST {
        return Ok(ResponseData::text(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("{} is not supported on {}", request.method, NODES_PATH),
        ));
    }

    tracing::debug!(server = NAME, body = %request.body, "create nodes request");

    let fields = match serde_json::from_str::<Value>(&request.body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            return Ok(ResponseData::text(
                StatusCode::BAD_REQUEST,
                "the node must be a JSON object",
            ))
        }
        Err(err) => {
            return Ok(ResponseData::text(
                StatusCode::BAD_REQUEST,
                format!("invalid node: {}", err),
            ))
        }
    };

    // node-<count> stays unique as long as the lock is held until the push
    let mut created_nodes = created_nodes.lock()?;
    let uuid = format!("node-{}", created_nodes.len());
    tracing::debug!(server = NAME, %uuid, "assigned uuid");

    let mut response = Map::with_capacity(fields.len() + 1);
    response.insert(String::from("uuid"), Value::String(uuid.clone()));
    response.extend(fields.into_iter().filter(|(key, _)| key != "uuid"));
    let body = serde_json::to_string(&response)?;

    created_nodes.push(CreatedNode {
        body: request.body.clone(),
        uuid,
    });

    Ok(ResponseData::json(StatusCode::CREATED, body))
}
