use anyhow::{Context, Result};
use std::collections::BTreeMap;
use vd_api_types::{Branch, NetId, NetworkEntry, ReportedNetId};

pub const POA_CORE: NetId = NetId(99);
pub const POA_SOKOL: NetId = NetId(77);
pub const XDAI: NetId = NetId(100);
pub const KOVAN: NetId = NetId(42);

/// Static table of supported networks, keyed by integer id.
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: BTreeMap<NetId, NetworkEntry>,
}

impl NetworkRegistry {
    pub fn new(entries: impl IntoIterator<Item = NetworkEntry>) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            registry.register(entry);
        }
        registry
    }

    /// Networks served by the Validators DApp.
    pub fn poa() -> Self {
        Self::new([
            entry(POA_CORE, "POA Core", "https://core.poa.network", Branch::Core),
            entry(POA_SOKOL, "POA Sokol", "https://sokol.poa.network", Branch::Sokol),
            entry(XDAI, "xDai Chain", "https://dai.poa.network", Branch::Dai),
            entry(KOVAN, "Kovan Testnet", "https://kovan.poa.network", Branch::Kovan),
        ])
    }

    /// Load a registry from a JSON array of network entries.
    pub fn from_json(raw: &str) -> Result<Self> {
        let entries: Vec<NetworkEntry> =
            serde_json::from_str(raw).context("network registry must be a JSON array of entries")?;
        Ok(Self::new(entries))
    }

    pub fn register(&mut self, entry: NetworkEntry) {
        self.networks.insert(entry.id, entry);
    }

    pub fn get(&self, id: NetId) -> Option<&NetworkEntry> {
        self.networks.get(&id)
    }

    pub fn contains(&self, id: NetId) -> bool {
        self.networks.contains_key(&id)
    }

    /// The reported id, if it names a registered network.
    pub fn known(&self, reported: &ReportedNetId) -> Option<NetId> {
        reported.as_net_id().filter(|id| self.contains(*id))
    }

    /// A stored `netId` slot value, if it names a registered network.
    pub fn known_slot(&self, raw: &str) -> Option<NetId> {
        raw.parse::<NetId>().ok().filter(|id| self.contains(*id))
    }

    pub fn net_id_by_branch(&self, branch: Branch) -> Option<NetId> {
        self.networks
            .values()
            .find(|entry| entry.branch == Some(branch))
            .map(|entry| entry.id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &NetworkEntry> {
        self.networks.values()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

fn entry(id: NetId, name: &str, rpc_url: &str, branch: Branch) -> NetworkEntry {
    NetworkEntry {
        id,
        name: name.to_owned(),
        rpc_url: rpc_url.to_owned(),
        branch: Some(branch),
    }
}
