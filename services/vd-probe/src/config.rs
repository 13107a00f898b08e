use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;
use vd_api_types::NetId;
use vd_chain_client::NetworkRegistry;
use vd_wallet_core::ConnectConfig;

pub(crate) const DEFAULT_STATE_FILE: &str = "./vd-probe-state.json";

#[derive(Debug)]
pub(crate) struct ProbeConfig {
    pub(crate) connect: ConnectConfig,
    pub(crate) state_file: PathBuf,
    pub(crate) requested_net_id: Option<NetId>,
}

impl ProbeConfig {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `VD_NETWORKS_FILE`, `VD_DEFAULT_NET_ID`, `VD_STATE_FILE` and
    /// `VD_NET_ID`. Empty values count as unset.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let registry = match var("VD_NETWORKS_FILE") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("read networks file {path}"))?;
                NetworkRegistry::from_json(&raw)?
            }
            None => NetworkRegistry::poa(),
        };

        let connect = match var("VD_DEFAULT_NET_ID") {
            Some(raw) => ConnectConfig::new(registry, parse_net_id("VD_DEFAULT_NET_ID", &raw)?)?,
            None if registry.contains(ConnectConfig::poa().default_net_id()) => {
                ConnectConfig::new(registry, ConnectConfig::poa().default_net_id())?
            }
            None => {
                return Err(anyhow!(
                    "VD_DEFAULT_NET_ID is required when the networks file has no POA Core entry"
                ));
            }
        };

        let requested_net_id = var("VD_NET_ID")
            .map(|raw| parse_net_id("VD_NET_ID", &raw))
            .transpose()?;

        let state_file = var("VD_STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

        Ok(Self {
            connect,
            state_file,
            requested_net_id,
        })
    }
}

fn parse_net_id(key: &str, raw: &str) -> Result<NetId> {
    raw.parse::<NetId>()
        .with_context(|| format!("{key} must be an integer network id, got {raw:?}"))
}
