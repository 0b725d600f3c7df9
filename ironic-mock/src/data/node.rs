use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod provision_states {
    pub const ENROLL: &str = "enroll";
    pub const VERIFYING: &str = "verifying";
    pub const MANAGEABLE: &str = "manageable";
    pub const INSPECTING: &str = "inspecting";
    pub const CLEANING: &str = "cleaning";
    pub const AVAILABLE: &str = "available";
    pub const DEPLOYING: &str = "deploying";
    pub const DEPLOY_WAIT: &str = "wait call-back";
    pub const ACTIVE: &str = "active";
    pub const DELETING: &str = "deleting";
    pub const DEPLOY_FAIL: &str = "deploy failed";
    pub const ERROR: &str = "error";
}

pub mod power_states {
    pub const POWER_ON: &str = "power on";
    pub const POWER_OFF: &str = "power off";
    pub const REBOOTING: &str = "rebooting";
}

/// A bare-metal node as returned by `GET /v1/nodes/<node>`.
///
/// Empty strings mean "unset" the same way the API client treats them, and
/// only a non-empty `uuid` or `name` gets a route registered for it.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Node {
    pub uuid: String,
    pub name: String,
    pub power_state: String,
    pub target_power_state: String,
    pub provision_state: String,
    pub target_provision_state: String,
    pub maintenance: bool,
    pub maintenance_reason: String,
    pub last_error: String,
    pub driver: String,
    pub driver_info: Map<String, Value>,
    pub driver_internal_info: Map<String, Value>,
    pub properties: Map<String, Value>,
    pub instance_info: Map<String, Value>,
    pub instance_uuid: String,
    pub extra: Map<String, Value>,
    pub resource_class: String,
    pub boot_interface: String,
    pub deploy_interface: String,
    pub inspect_interface: String,
    pub management_interface: String,
    pub power_interface: String,
    pub raid_interface: String,
    pub automated_clean: Option<bool>,
}

impl Node {
    pub fn new<S: Into<String>>(uuid: S) -> Self {
        Self {
            uuid: uuid.into(),
            ..Self::default()
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_provision_state<S: Into<String>>(mut self, state: S) -> Self {
        self.provision_state = state.into();
        self
    }

    pub fn with_power_state<S: Into<String>>(mut self, state: S) -> Self {
        self.power_state = state.into();
        self
    }
}
