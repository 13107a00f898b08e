//! Adapters over the wallet objects a page can carry.
//!
//! `window.ethereum` maps to `EthereumProvider` (request/event API),
//! `window.web3.currentProvider` to `LegacyWeb3` (callback `sendAsync` plus
//! an optional `publicConfigStore`).

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use serde::Serialize;
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::warn;
use vd_chain_client::{
    ConfigStore, ConfigUpdate, ConfigUpdateHandler, EventHandler, InjectedProvider,
    LegacyProvider, ListenerHandle, ProviderEvent, ProviderEventKind, RequestProvider, Transport,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// Inspect the page globals for a wallet provider.
pub fn detect_provider() -> InjectedProvider {
    let window: JsValue = gloo_utils::window().into();

    let ethereum = property(&window, "ethereum");
    if ethereum.is_object() {
        return InjectedProvider::Modern(Rc::new(EthereumProvider { inner: ethereum }));
    }

    let web3 = property(&window, "web3");
    if web3.is_object() {
        let current = property(&web3, "currentProvider");
        if current.is_object() {
            return InjectedProvider::Legacy(Rc::new(LegacyWeb3 {
                inner: current,
                next_id: Cell::new(1),
            }));
        }
    }

    InjectedProvider::None
}

pub(crate) fn property(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn call_method(target: &JsValue, name: &str, args: &Array) -> Result<JsValue, JsValue> {
    let function: Function = Reflect::get(target, &JsValue::from_str(name))?.dyn_into()?;
    Reflect::apply(&function, target, args)
}

pub(crate) fn js_error_message(err: &JsValue) -> String {
    if let Some(message) = Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
    {
        return message;
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

fn from_js(value: JsValue) -> Result<Value> {
    if value.is_undefined() || value.is_null() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(value).map_err(|err| anyhow!("decode provider value: {err}"))
}

/// JS listener kept alive while attached. Dropped without `detach`, the
/// closure is leaked so the page can keep calling it.
struct AttachedListener {
    target: JsValue,
    event: &'static str,
    closure: Option<Closure<dyn FnMut(JsValue)>>,
}

impl AttachedListener {
    fn attach(
        target: &JsValue,
        event: &'static str,
        closure: Closure<dyn FnMut(JsValue)>,
    ) -> ListenerHandle {
        let args = Array::of2(&JsValue::from_str(event), closure.as_ref());
        if let Err(err) = call_method(target, "on", &args) {
            warn!(event, "attaching provider listener failed: {}", js_error_message(&err));
            return ListenerHandle::permanent();
        }

        let mut attached = AttachedListener {
            target: target.clone(),
            event,
            closure: Some(closure),
        };
        ListenerHandle::new(move || attached.detach())
    }

    fn detach(&mut self) {
        let Some(closure) = self.closure.take() else {
            return;
        };
        let args = Array::of2(&JsValue::from_str(self.event), closure.as_ref());
        if let Err(err) = call_method(&self.target, "removeListener", &args) {
            warn!(
                event = self.event,
                "removing provider listener failed: {}",
                js_error_message(&err)
            );
            closure.forget();
        }
    }
}

impl Drop for AttachedListener {
    fn drop(&mut self) {
        if let Some(closure) = self.closure.take() {
            closure.forget();
        }
    }
}

pub struct EthereumProvider {
    inner: JsValue,
}

#[async_trait(?Send)]
impl RequestProvider for EthereumProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let args = to_js(&json!({ "method": method, "params": params }))
            .map_err(|err| anyhow!("encode {method} request: {}", js_error_message(&err)))?;
        let promise: Promise = call_method(&self.inner, "request", &Array::of1(&args))
            .and_then(|value| value.dyn_into())
            .map_err(|err| anyhow!("{method}: {}", js_error_message(&err)))?;

        let value = JsFuture::from(promise)
            .await
            .map_err(|err| anyhow!("{method}: {}", js_error_message(&err)))?;
        from_js(value)
    }

    fn chain_id(&self) -> Option<Value> {
        let chain_id = property(&self.inner, "chainId");
        if chain_id.is_undefined() || chain_id.is_null() {
            return None;
        }
        from_js(chain_id).ok()
    }

    fn auto_refresh_on_network_change(&self) -> bool {
        property(&self.inner, "autoRefreshOnNetworkChange")
            .as_bool()
            .unwrap_or(false)
    }

    fn on(&self, event: ProviderEventKind, handler: EventHandler) -> ListenerHandle {
        let handler = RefCell::new(handler);
        let closure = Closure::wrap(Box::new(move |payload: JsValue| {
            let decoded = match event {
                ProviderEventKind::AccountsChanged => {
                    let accounts: Vec<String> =
                        serde_wasm_bindgen::from_value(payload).unwrap_or_default();
                    ProviderEvent::AccountsChanged(accounts)
                }
                ProviderEventKind::ChainChanged => {
                    let chain_id = payload
                        .as_string()
                        .unwrap_or_else(|| format!("{payload:?}"));
                    ProviderEvent::ChainChanged(chain_id)
                }
            };
            (handler.borrow_mut())(decoded);
        }) as Box<dyn FnMut(JsValue)>);

        AttachedListener::attach(&self.inner, event.as_str(), closure)
    }
}

pub struct LegacyWeb3 {
    inner: JsValue,
    next_id: Cell<u64>,
}

impl LegacyProvider for LegacyWeb3 {
    fn current_provider(&self) -> Rc<dyn Transport> {
        Rc::new(LegacyTransport {
            inner: self.inner.clone(),
            next_id: Cell::new(self.next_id.get()),
        })
    }

    fn public_config_store(&self) -> Option<Rc<dyn ConfigStore>> {
        let store = property(&self.inner, "publicConfigStore");
        if !store.is_object() {
            return None;
        }
        Some(Rc::new(PublicConfigStore { inner: store }))
    }
}

/// JSON-RPC through the legacy callback API `sendAsync(payload, cb)`.
struct LegacyTransport {
    inner: JsValue,
    next_id: Cell<u64>,
}

#[async_trait(?Send)]
impl Transport for LegacyTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));

        let payload = to_js(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .map_err(|err| anyhow!("encode {method} request: {}", js_error_message(&err)))?;

        let provider = self.inner.clone();
        let mut send_error = None;
        let promise = Promise::new(&mut |resolve: Function, reject: Function| {
            let callback = Closure::once_into_js(move |err: JsValue, response: JsValue| {
                let outcome = if err.is_null() || err.is_undefined() {
                    resolve.call1(&JsValue::NULL, &response)
                } else {
                    reject.call1(&JsValue::NULL, &err)
                };
                if let Err(err) = outcome {
                    warn!("settling legacy response failed: {}", js_error_message(&err));
                }
            });
            if let Err(err) = call_method(&provider, "sendAsync", &Array::of2(&payload, &callback)) {
                send_error = Some(err);
            }
        });
        if let Some(err) = send_error {
            return Err(anyhow!("{method}: {}", js_error_message(&err)));
        }

        let response = JsFuture::from(promise)
            .await
            .map_err(|err| anyhow!("{method}: {}", js_error_message(&err)))?;
        let response = from_js(response)?;

        if let Some(error) = response.get("error").filter(|error| !error.is_null()) {
            return Err(anyhow!("{method} RPC error: {error}"));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }
}

struct PublicConfigStore {
    inner: JsValue,
}

impl ConfigStore for PublicConfigStore {
    fn on_update(&self, handler: ConfigUpdateHandler) -> ListenerHandle {
        let handler = RefCell::new(handler);
        let closure = Closure::wrap(Box::new(move |payload: JsValue| {
            let update: ConfigUpdate = serde_wasm_bindgen::from_value(payload).unwrap_or_default();
            (handler.borrow_mut())(update);
        }) as Box<dyn FnMut(JsValue)>);

        AttachedListener::attach(&self.inner, "update", closure)
    }
}
