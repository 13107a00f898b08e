//! Headless connection probe.
//!
//! Runs the wallet connector outside a browser: no injected provider, the
//! session slot lives in memory and the durable slot in a JSON state file.
//! Prints the resolved connection as JSON after checking that the chosen
//! RPC endpoint answers on the expected network.

mod config;

use anyhow::{Context, Result, bail};
use std::rc::Rc;
use tracing::{info, warn};
use vd_chain_client::{InjectedProvider, Transport};
use vd_chain_rpc::HttpTransport;
use vd_storage::{JsonFileStore, MemoryStore, NetIdSlots};
use vd_wallet_core::{AccountListener, Environment, initialize};

use crate::config::ProbeConfig;

struct HeadlessEnv {
    slots: NetIdSlots,
}

impl Environment for HeadlessEnv {
    fn provider(&self) -> InjectedProvider {
        InjectedProvider::None
    }

    fn net_id_slots(&self) -> NetIdSlots {
        self.slots.clone()
    }

    fn set_title(&self, title: &str) {
        info!(%title, "connected");
    }

    fn reload(&self) {
        warn!("page reload requested outside a browser, ignoring");
    }

    fn rpc_transport(&self, url: &str) -> Rc<dyn Transport> {
        Rc::new(HttpTransport::new(url))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ProbeConfig::from_env()?;
    let durable = JsonFileStore::open(&config.state_file)?;
    info!(state_file = %durable.path().display(), "loaded probe state");

    let env = Rc::new(HeadlessEnv {
        slots: NetIdSlots::new(Rc::new(MemoryStore::new()), Rc::new(durable)),
    });

    let listener: AccountListener = Rc::new(|account: Option<&str>| {
        info!(account = ?account, "account changed");
    });

    let connection = initialize(&env, &config.connect, config.requested_net_id, listener).await?;

    let reported = connection
        .client
        .net_id()
        .await
        .with_context(|| format!("query net_version from {}", connection.net_id_name))?;
    if reported.as_net_id() != Some(connection.net_id) {
        bail!(
            "endpoint for {} reports network {reported}, expected {}",
            connection.net_id_name,
            connection.net_id
        );
    }

    println!("{}", serde_json::to_string_pretty(&connection.summary())?);
    Ok(())
}
