//! Validators DApp wallet connector, browser bindings.
//!
//! Exposes `enableWallet` and `getWeb3` to the page. Everything else lives in
//! `vd-wallet-core`; this crate only wires it to `window`.

pub mod browser;
pub mod provider;

use js_sys::{Function, Promise};
use std::rc::Rc;
use tracing::warn;
use vd_api_types::{ClientKind, NetId};
use vd_wallet_core::{AccountListener, ConnectConfig, ConnectionResult, Environment};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::browser::BrowserEnv;
use crate::provider::{js_error_message, to_js};

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Wraps a page callback taking the account string, or `null`.
fn js_listener(callback: Function) -> AccountListener {
    Rc::new(move |account: Option<&str>| {
        let arg = account.map_or(JsValue::NULL, JsValue::from_str);
        if let Err(err) = callback.call1(&JsValue::NULL, &arg) {
            warn!("account callback threw: {}", js_error_message(&err));
        }
    })
}

/// `undefined`, `null`, `""` and `0` all mean "no explicit network".
fn requested_net_id(value: &JsValue) -> Result<Option<NetId>, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    if let Some(number) = value.as_f64() {
        if number == 0.0 {
            return Ok(None);
        }
        if number < 0.0 || number.fract() != 0.0 {
            return Err(js_error(format!("invalid network id {number}")));
        }
        return Ok(Some(NetId(number as u64)));
    }
    match value.as_string() {
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => match raw.parse::<NetId>() {
            Ok(NetId(0)) => Ok(None),
            Ok(net_id) => Ok(Some(net_id)),
            Err(err) => Err(js_error(format!("invalid network id {raw:?}: {err}"))),
        },
        None => Err(js_error("network id must be a number or a string")),
    }
}

/// Ask the wallet for account access. Resolves once the user approves, and
/// rejects with "You need to provide access to your wallet account" if they
/// decline.
#[wasm_bindgen(js_name = enableWallet)]
pub async fn enable_wallet(on_account_change: Function) -> Result<(), JsValue> {
    let listener = js_listener(on_account_change);
    vd_wallet_core::enable_wallet(&BrowserEnv, &listener)
        .await
        .map_err(js_error)
}

/// Network id chosen earlier in this tab, if any. Pages pass it back to
/// `getWeb3` after a reload to keep the same network.
#[wasm_bindgen(js_name = sessionNetId)]
pub fn session_net_id() -> Result<Option<f64>, JsValue> {
    let net_id = BrowserEnv
        .net_id_slots()
        .session_net_id()
        .map_err(|err| js_error(format!("{err:#}")))?;
    Ok(net_id.map(|NetId(id)| id as f64))
}

/// Connect to the wallet, or to the network's public RPC endpoint when the
/// wallet is missing or on another network.
#[wasm_bindgen(js_name = getWeb3)]
pub async fn get_web3(
    net_id: JsValue,
    on_account_change: Function,
) -> Result<Web3Connection, JsValue> {
    let requested = requested_net_id(&net_id)?;
    let env = Rc::new(BrowserEnv);
    let config = ConnectConfig::poa();

    let inner = vd_wallet_core::initialize(&env, &config, requested, js_listener(on_account_change))
        .await
        .map_err(js_error)?;
    Ok(Web3Connection { inner })
}

#[wasm_bindgen]
pub struct Web3Connection {
    inner: ConnectionResult,
}

#[wasm_bindgen]
impl Web3Connection {
    #[wasm_bindgen(getter, js_name = netId)]
    pub fn net_id(&self) -> f64 {
        self.inner.net_id.0 as f64
    }

    #[wasm_bindgen(getter, js_name = netIdName)]
    pub fn net_id_name(&self) -> String {
        self.inner.net_id_name.clone()
    }

    #[wasm_bindgen(getter, js_name = injectedWeb3)]
    pub fn injected_web3(&self) -> bool {
        self.inner.injected_web3
    }

    #[wasm_bindgen(getter, js_name = defaultAccount)]
    pub fn default_account(&self) -> Option<String> {
        self.inner.default_account.clone()
    }

    #[wasm_bindgen(getter, js_name = networkMatch)]
    pub fn network_match(&self) -> bool {
        self.inner.network_match
    }

    /// Endpoint in use when the connection fell back to plain RPC.
    #[wasm_bindgen(getter, js_name = rpcUrl)]
    pub fn rpc_url(&self) -> Option<String> {
        match self.inner.client.kind() {
            ClientKind::Rpc { url } => Some(url.clone()),
            ClientKind::Injected => None,
        }
    }

    #[wasm_bindgen(getter, js_name = currentAccount)]
    pub fn current_account(&self) -> Option<String> {
        self.inner.subscription.current_account()
    }

    #[wasm_bindgen(js_name = toJSON)]
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.summary())
    }

    /// Raw JSON-RPC call through the connected client.
    pub fn request(&self, method: String, params: JsValue) -> Promise {
        let client = self.inner.client.clone();
        future_to_promise(async move {
            let params = if params.is_undefined() || params.is_null() {
                serde_json::Value::Array(Vec::new())
            } else {
                serde_wasm_bindgen::from_value(params).map_err(js_error)?
            };
            let result = client
                .request(&method, params)
                .await
                .map_err(|err| js_error(format!("{err:#}")))?;
            to_js(&result)
        })
    }

    /// Detach the account and network listeners. Later wallet events are
    /// ignored.
    pub fn unsubscribe(&mut self) {
        std::mem::take(&mut self.inner.subscription).unsubscribe();
    }
}
