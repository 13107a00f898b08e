use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Integer network id, the key of the network registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NetId(pub u64);

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NetId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(NetId)
    }
}

impl From<u64> for NetId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Core,
    Sokol,
    Dai,
    Kovan,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Branch::Core => "core",
            Branch::Sokol => "sokol",
            Branch::Dai => "dai",
            Branch::Kovan => "kovan",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkEntry {
    pub id: NetId,
    pub name: String,
    pub rpc_url: String,
    #[serde(default)]
    pub branch: Option<Branch>,
}

/// Network id as a provider reported it, before any registry check.
///
/// Injected providers expose `chainId` as a `0x` hex string, RPC nodes answer
/// `net_version` with a decimal string. Anything else is kept verbatim so the
/// caller can still log it; it never matches a registry key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedNetId {
    Numeric(NetId),
    Opaque(String),
}

impl ReportedNetId {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) if !hex.is_empty() => u64::from_str_radix(hex, 16).ok(),
            Some(_) => None,
            None => trimmed.parse::<u64>().ok(),
        };

        match parsed {
            Some(id) => ReportedNetId::Numeric(NetId(id)),
            None => ReportedNetId::Opaque(raw.to_owned()),
        }
    }

    pub fn as_net_id(&self) -> Option<NetId> {
        match self {
            ReportedNetId::Numeric(id) => Some(*id),
            ReportedNetId::Opaque(_) => None,
        }
    }
}

impl fmt::Display for ReportedNetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportedNetId::Numeric(id) => write!(f, "{id}"),
            ReportedNetId::Opaque(raw) => write!(f, "{raw:?}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ClientKind {
    Injected,
    Rpc { url: String },
}

/// Serializable view of an initialized connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub net_id: NetId,
    pub net_id_name: String,
    pub injected_web3: bool,
    pub default_account: Option<String>,
    pub network_match: bool,
    pub client: ClientKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_net_id_parses_hex_and_decimal() {
        assert_eq!(ReportedNetId::parse("0x63"), ReportedNetId::Numeric(NetId(99)));
        assert_eq!(ReportedNetId::parse("0X4d"), ReportedNetId::Numeric(NetId(77)));
        assert_eq!(ReportedNetId::parse("100"), ReportedNetId::Numeric(NetId(100)));
        assert_eq!(ReportedNetId::parse(" 42 "), ReportedNetId::Numeric(NetId(42)));
    }

    #[test]
    fn reported_net_id_keeps_unparseable_values() {
        let reported = ReportedNetId::parse("loading");
        assert_eq!(reported, ReportedNetId::Opaque("loading".to_owned()));
        assert_eq!(reported.as_net_id(), None);
        assert_eq!(ReportedNetId::parse("0x").as_net_id(), None);
    }

    #[test]
    fn net_id_from_storage_string() {
        assert_eq!("77".parse::<NetId>(), Ok(NetId(77)));
        assert!("sokol".parse::<NetId>().is_err());
        assert_eq!(NetId(99).to_string(), "99");
    }

    #[test]
    fn summary_uses_camel_case_keys() {
        let summary = ConnectionSummary {
            net_id: NetId(77),
            net_id_name: "POA Sokol".to_owned(),
            injected_web3: false,
            default_account: None,
            network_match: false,
            client: ClientKind::Rpc {
                url: "https://sokol.poa.network".to_owned(),
            },
        };

        let json = serde_json::to_value(&summary).expect("summary serializes");
        assert_eq!(json["netId"], 77);
        assert_eq!(json["netIdName"], "POA Sokol");
        assert_eq!(json["injectedWeb3"], false);
        assert!(json["defaultAccount"].is_null());
        assert_eq!(json["client"]["kind"], "rpc");
    }
}
