//! `Environment` over the page the module runs in.

use anyhow::{Result, anyhow};
use gloo_storage::{LocalStorage, SessionStorage, Storage as _};
use std::rc::Rc;
use tracing::{debug, warn};
use vd_chain_client::{InjectedProvider, Transport};
use vd_chain_rpc::HttpTransport;
use vd_storage::{KeyValueStore, NetIdSlots};
use vd_wallet_core::Environment;

use crate::provider::{detect_provider, js_error_message};

#[derive(Debug, Clone, Copy)]
enum WebStorage {
    Session,
    Local,
}

impl WebStorage {
    fn raw(self) -> web_sys::Storage {
        match self {
            WebStorage::Session => SessionStorage::raw(),
            WebStorage::Local => LocalStorage::raw(),
        }
    }
}

impl KeyValueStore for WebStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.raw()
            .get_item(key)
            .map_err(|err| anyhow!("{self:?} storage get {key}: {}", js_error_message(&err)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.raw()
            .set_item(key, value)
            .map_err(|err| anyhow!("{self:?} storage set {key}: {}", js_error_message(&err)))
    }
}

pub struct BrowserEnv;

impl Environment for BrowserEnv {
    fn provider(&self) -> InjectedProvider {
        let provider = detect_provider();
        debug!(?provider, "detected wallet provider");
        provider
    }

    fn net_id_slots(&self) -> NetIdSlots {
        NetIdSlots::new(Rc::new(WebStorage::Session), Rc::new(WebStorage::Local))
    }

    fn set_title(&self, title: &str) {
        gloo_utils::document().set_title(title);
    }

    fn reload(&self) {
        if let Err(err) = gloo_utils::window().location().reload() {
            warn!("page reload failed: {}", js_error_message(&err));
        }
    }

    fn rpc_transport(&self, url: &str) -> Rc<dyn Transport> {
        Rc::new(HttpTransport::new(url))
    }
}
