use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::rc::Rc;
use vd_api_types::{ClientKind, ReportedNetId};

mod registry;

pub use registry::{KOVAN, NetworkRegistry, POA_CORE, POA_SOKOL, XDAI};

/// A JSON-RPC request channel: an injected provider or a plain RPC endpoint.
#[async_trait(?Send)]
pub trait Transport {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
}

impl ProviderEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderEventKind::AccountsChanged => "accountsChanged",
            ProviderEventKind::ChainChanged => "chainChanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
}

/// Payload of a legacy `publicConfigStore` `update` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(default)]
    pub selected_address: Option<String>,
    #[serde(default)]
    pub network_version: Option<String>,
}

pub type EventHandler = Box<dyn FnMut(ProviderEvent)>;
pub type ConfigUpdateHandler = Box<dyn FnMut(ConfigUpdate)>;

/// Registration returned by a provider for one event listener.
///
/// Dropping the handle leaves the listener attached; only `remove` detaches it.
pub struct ListenerHandle {
    detach: Option<Box<dyn FnOnce()>>,
}

impl ListenerHandle {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Handle for a listener that cannot be removed.
    pub fn permanent() -> Self {
        Self { detach: None }
    }

    pub fn remove(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("removable", &self.detach.is_some())
            .finish()
    }
}

/// Request/event style provider (`window.ethereum`).
#[async_trait(?Send)]
pub trait RequestProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;

    /// Raw `chainId` field, if the provider exposes one.
    fn chain_id(&self) -> Option<Value>;

    fn auto_refresh_on_network_change(&self) -> bool;

    fn on(&self, event: ProviderEventKind, handler: EventHandler) -> ListenerHandle;
}

/// Legacy injected global (`window.web3`).
pub trait LegacyProvider {
    fn current_provider(&self) -> Rc<dyn Transport>;

    fn public_config_store(&self) -> Option<Rc<dyn ConfigStore>>;
}

pub trait ConfigStore {
    fn on_update(&self, handler: ConfigUpdateHandler) -> ListenerHandle;
}

/// Shape of the wallet provider found in the host page.
#[derive(Clone)]
pub enum InjectedProvider {
    Modern(Rc<dyn RequestProvider>),
    Legacy(Rc<dyn LegacyProvider>),
    None,
}

impl InjectedProvider {
    pub fn is_injected(&self) -> bool {
        !matches!(self, InjectedProvider::None)
    }

    /// Client bound to the injected provider, if there is one.
    pub fn client(&self) -> Option<Web3Client> {
        match self {
            InjectedProvider::Modern(provider) => Some(Web3Client::injected(Rc::new(
                RequestTransport(provider.clone()),
            ))),
            InjectedProvider::Legacy(provider) => {
                Some(Web3Client::injected(provider.current_provider()))
            }
            InjectedProvider::None => None,
        }
    }
}

impl fmt::Debug for InjectedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            InjectedProvider::Modern(_) => "Modern",
            InjectedProvider::Legacy(_) => "Legacy",
            InjectedProvider::None => "None",
        };
        f.write_str(shape)
    }
}

struct RequestTransport(Rc<dyn RequestProvider>);

#[async_trait(?Send)]
impl Transport for RequestTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.0.request(method, params).await
    }
}

/// Network-bound client, either over the injected provider or a plain RPC
/// endpoint.
#[derive(Clone)]
pub struct Web3Client {
    transport: Rc<dyn Transport>,
    kind: ClientKind,
}

impl Web3Client {
    pub fn injected(transport: Rc<dyn Transport>) -> Self {
        Self {
            transport,
            kind: ClientKind::Injected,
        }
    }

    pub fn rpc(url: &str, transport: Rc<dyn Transport>) -> Self {
        Self {
            transport,
            kind: ClientKind::Rpc {
                url: url.to_owned(),
            },
        }
    }

    pub fn kind(&self) -> &ClientKind {
        &self.kind
    }

    pub fn is_injected(&self) -> bool {
        matches!(self.kind, ClientKind::Injected)
    }

    pub fn transport(&self) -> Rc<dyn Transport> {
        self.transport.clone()
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.transport.request(method, params).await
    }

    pub async fn accounts(&self) -> Result<Vec<String>> {
        let value = self.transport.request("eth_accounts", json!([])).await?;
        parse_accounts(value)
    }

    pub async fn net_id(&self) -> Result<ReportedNetId> {
        let value = self.transport.request("net_version", json!([])).await?;
        Ok(reported_net_id(&value))
    }
}

impl fmt::Debug for Web3Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Web3Client").field("kind", &self.kind).finish()
    }
}

pub fn parse_accounts(value: Value) -> Result<Vec<String>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).context("eth_accounts result is not a list of addresses")
}

/// Interpret a `chainId` field or a `net_version` result.
pub fn reported_net_id(value: &Value) -> ReportedNetId {
    match value {
        Value::String(raw) => ReportedNetId::parse(raw),
        Value::Number(number) => match number.as_u64() {
            Some(id) => ReportedNetId::Numeric(id.into()),
            None => ReportedNetId::Opaque(number.to_string()),
        },
        other => ReportedNetId::Opaque(other.to_string()),
    }
}
