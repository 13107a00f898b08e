//! Scripted host for connector tests. Events are delivered synchronously
//! from `emit`, one at a time, like a browser event loop would.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use vd_chain_client::{
    ConfigStore, ConfigUpdate, ConfigUpdateHandler, EventHandler, InjectedProvider,
    LegacyProvider, ListenerHandle, ProviderEvent, ProviderEventKind, RequestProvider, Transport,
};
use vd_storage::{MemoryStore, NetIdSlots};

use crate::{AccountListener, Environment};

pub(crate) struct MockEnv {
    provider: InjectedProvider,
    pub(crate) session: Rc<MemoryStore>,
    pub(crate) durable: Rc<MemoryStore>,
    title: RefCell<Option<String>>,
    reloads: Cell<u32>,
    rpc_urls: RefCell<Vec<String>>,
}

impl MockEnv {
    pub(crate) fn new(provider: InjectedProvider) -> Rc<Self> {
        Rc::new(Self {
            provider,
            session: Rc::new(MemoryStore::new()),
            durable: Rc::new(MemoryStore::new()),
            title: RefCell::new(None),
            reloads: Cell::new(0),
            rpc_urls: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn title(&self) -> Option<String> {
        self.title.borrow().clone()
    }

    pub(crate) fn reloads(&self) -> u32 {
        self.reloads.get()
    }

    pub(crate) fn rpc_urls(&self) -> Vec<String> {
        self.rpc_urls.borrow().clone()
    }
}

impl Environment for MockEnv {
    fn provider(&self) -> InjectedProvider {
        self.provider.clone()
    }

    fn net_id_slots(&self) -> NetIdSlots {
        NetIdSlots::new(self.session.clone(), self.durable.clone())
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = Some(title.to_owned());
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }

    fn rpc_transport(&self, url: &str) -> Rc<dyn Transport> {
        self.rpc_urls.borrow_mut().push(url.to_owned());
        Rc::new(ScriptedRpc::new(json!("0"), &[]))
    }
}

/// Answers `net_version` and `eth_accounts` from fixed values.
pub(crate) struct ScriptedRpc {
    net_version: Value,
    accounts: Vec<String>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRpc {
    pub(crate) fn new(net_version: Value, accounts: &[&str]) -> Self {
        Self {
            net_version,
            accounts: accounts.iter().map(|a| (*a).to_owned()).collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedRpc {
    async fn request(&self, method: &str, _params: Value) -> Result<Value> {
        self.calls.borrow_mut().push(method.to_owned());
        match method {
            "net_version" => Ok(self.net_version.clone()),
            "eth_accounts" => Ok(json!(self.accounts)),
            other => Err(anyhow!("method {other} not scripted")),
        }
    }
}

type HandlerTable<H> = Rc<RefCell<Vec<(u64, H)>>>;

fn attach<H: 'static>(table: &HandlerTable<H>, next_id: &Cell<u64>, handler: H) -> ListenerHandle {
    let id = next_id.get();
    next_id.set(id + 1);
    table.borrow_mut().push((id, handler));

    let table = table.clone();
    ListenerHandle::new(move || table.borrow_mut().retain(|(entry, _)| *entry != id))
}

pub(crate) struct MockModernProvider {
    chain_id: Option<Value>,
    accounts: Vec<String>,
    auto_refresh: Cell<bool>,
    deny: Cell<bool>,
    fail: Cell<bool>,
    requests: RefCell<Vec<String>>,
    handlers: HandlerTable<(ProviderEventKind, EventHandler)>,
    next_id: Cell<u64>,
}

impl MockModernProvider {
    pub(crate) fn new(chain_id: Option<Value>, accounts: &[&str]) -> Rc<Self> {
        Rc::new(Self {
            chain_id,
            accounts: accounts.iter().map(|a| (*a).to_owned()).collect(),
            auto_refresh: Cell::new(false),
            deny: Cell::new(false),
            fail: Cell::new(false),
            requests: RefCell::new(Vec::new()),
            handlers: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        })
    }

    pub(crate) fn deny_access(&self) {
        self.deny.set(true);
    }

    pub(crate) fn fail_requests(&self) {
        self.fail.set(true);
    }

    pub(crate) fn set_auto_refresh(&self, enabled: bool) {
        self.auto_refresh.set(enabled);
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub(crate) fn emit(&self, event: ProviderEvent) {
        let kind = match &event {
            ProviderEvent::AccountsChanged(_) => ProviderEventKind::AccountsChanged,
            ProviderEvent::ChainChanged(_) => ProviderEventKind::ChainChanged,
        };
        for (_, (registered, handler)) in self.handlers.borrow_mut().iter_mut() {
            if *registered == kind {
                handler(event.clone());
            }
        }
    }
}

#[async_trait(?Send)]
impl RequestProvider for MockModernProvider {
    async fn request(&self, method: &str, _params: Value) -> Result<Value> {
        self.requests.borrow_mut().push(method.to_owned());
        if self.fail.get() {
            return Err(anyhow!("provider disconnected"));
        }
        match method {
            "eth_requestAccounts" if self.deny.get() => {
                Err(anyhow!("User rejected the request."))
            }
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(self.accounts)),
            other => Err(anyhow!("method {other} not scripted")),
        }
    }

    fn chain_id(&self) -> Option<Value> {
        self.chain_id.clone()
    }

    fn auto_refresh_on_network_change(&self) -> bool {
        self.auto_refresh.get()
    }

    fn on(&self, event: ProviderEventKind, handler: EventHandler) -> ListenerHandle {
        attach(&self.handlers, &self.next_id, (event, handler))
    }
}

pub(crate) struct MockLegacyProvider {
    rpc: Rc<ScriptedRpc>,
    store: Option<Rc<MockConfigStore>>,
}

impl MockLegacyProvider {
    pub(crate) fn new(net_version: &str, accounts: &[&str], with_store: bool) -> Rc<Self> {
        Rc::new(Self {
            rpc: Rc::new(ScriptedRpc::new(json!(net_version), accounts)),
            store: with_store.then(|| {
                Rc::new(MockConfigStore {
                    handlers: Rc::new(RefCell::new(Vec::new())),
                    next_id: Cell::new(0),
                })
            }),
        })
    }

    pub(crate) fn rpc_calls(&self) -> Vec<String> {
        self.rpc.calls()
    }

    pub(crate) fn emit(&self, update: ConfigUpdate) {
        if let Some(store) = &self.store {
            for (_, handler) in store.handlers.borrow_mut().iter_mut() {
                handler(update.clone());
            }
        }
    }
}

impl LegacyProvider for MockLegacyProvider {
    fn current_provider(&self) -> Rc<dyn Transport> {
        self.rpc.clone()
    }

    fn public_config_store(&self) -> Option<Rc<dyn ConfigStore>> {
        self.store
            .clone()
            .map(|store| store as Rc<dyn ConfigStore>)
    }
}

pub(crate) struct MockConfigStore {
    handlers: HandlerTable<ConfigUpdateHandler>,
    next_id: Cell<u64>,
}

impl ConfigStore for MockConfigStore {
    fn on_update(&self, handler: ConfigUpdateHandler) -> ListenerHandle {
        attach(&self.handlers, &self.next_id, handler)
    }
}

/// Records every value handed to the account listener.
#[derive(Default, Clone)]
pub(crate) struct Recorder {
    calls: Rc<RefCell<Vec<Option<String>>>>,
}

impl Recorder {
    pub(crate) fn listener(&self) -> AccountListener {
        let calls = self.calls.clone();
        Rc::new(move |account: Option<&str>| calls.borrow_mut().push(account.map(str::to_owned)))
    }

    pub(crate) fn calls(&self) -> Vec<Option<String>> {
        self.calls.borrow().clone()
    }
}
