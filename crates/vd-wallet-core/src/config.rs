use vd_api_types::{Branch, NetId};
use vd_chain_client::{NetworkRegistry, POA_CORE};

use crate::ConnectError;

pub const DEFAULT_TITLE_SUFFIX: &str = "POA Validators DApp";

#[derive(Debug, Clone)]
pub struct ConnectConfig {
    registry: NetworkRegistry,
    default_net_id: NetId,
    title_suffix: String,
}

impl ConnectConfig {
    /// Fails unless `default_net_id` is a registry key, since it is the last
    /// resort of network resolution.
    pub fn new(registry: NetworkRegistry, default_net_id: NetId) -> Result<Self, ConnectError> {
        if !registry.contains(default_net_id) {
            return Err(ConnectError::InvalidConfig(format!(
                "default network {default_net_id} is not in the network registry"
            )));
        }

        Ok(Self {
            registry,
            default_net_id,
            title_suffix: DEFAULT_TITLE_SUFFIX.to_owned(),
        })
    }

    pub fn for_branch(registry: NetworkRegistry, branch: Branch) -> Result<Self, ConnectError> {
        let Some(default_net_id) = registry.net_id_by_branch(branch) else {
            return Err(ConnectError::InvalidConfig(format!(
                "no network registered for branch {branch}"
            )));
        };
        Self::new(registry, default_net_id)
    }

    /// Built-in POA networks, defaulting to POA Core.
    pub fn poa() -> Self {
        Self {
            registry: NetworkRegistry::poa(),
            default_net_id: POA_CORE,
            title_suffix: DEFAULT_TITLE_SUFFIX.to_owned(),
        }
    }

    pub fn with_title_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.title_suffix = suffix.into();
        self
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn default_net_id(&self) -> NetId {
        self.default_net_id
    }

    pub fn page_title(&self, network_name: &str) -> String {
        format!("{network_name} - {}", self.title_suffix)
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self::poa()
    }
}
