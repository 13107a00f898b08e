use std::rc::Rc;
use tracing::{debug, info, warn};
use vd_api_types::{ConnectionSummary, NetId, NetworkEntry};
use vd_chain_client::{ConfigUpdate, InjectedProvider, ProviderEvent, ProviderEventKind, Web3Client};

use crate::subscription::account_updater;
use crate::{
    AccountListener, AccountTracker, ConnectConfig, ConnectError, Environment, Subscription,
    get_accounts, get_net_id, normalize_account,
};

/// Outcome of `initialize`.
#[derive(Debug)]
pub struct ConnectionResult {
    pub client: Web3Client,
    pub net_id: NetId,
    pub net_id_name: String,
    pub injected_web3: bool,
    pub default_account: Option<String>,
    pub network_match: bool,
    pub subscription: Subscription,
}

impl ConnectionResult {
    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            net_id: self.net_id,
            net_id_name: self.net_id_name.clone(),
            injected_web3: self.injected_web3,
            default_account: self.default_account.clone(),
            network_match: self.network_match,
            client: self.client.kind().clone(),
        }
    }
}

/// Detect the wallet provider, settle on a network and return a client
/// bound to it.
///
/// With `requested_net_id` unset the network is taken from the provider,
/// then the durable `netId` slot, then `config.default_net_id()`, and the
/// result is written back to both slots. An injected client is kept only
/// when the provider is on the resolved network; otherwise a plain RPC
/// client for the registry endpoint takes its place.
pub async fn initialize<E>(
    env: &Rc<E>,
    config: &ConnectConfig,
    requested_net_id: Option<NetId>,
    listener: AccountListener,
) -> Result<ConnectionResult, ConnectError>
where
    E: Environment + ?Sized + 'static,
{
    let provider = env.provider();
    let mut client = provider.client();
    let mut subscription = Subscription::new();

    match &provider {
        InjectedProvider::Modern(modern) => {
            info!("injected web3 detected");
            if !modern.auto_refresh_on_network_change() {
                let env = env.clone();
                let closed = subscription.closed_flag();
                let handle = modern.on(
                    ProviderEventKind::ChainChanged,
                    Box::new(move |event: ProviderEvent| {
                        if closed.get() {
                            return;
                        }
                        if let ProviderEvent::ChainChanged(chain_id) = event {
                            info!(%chain_id, "wallet switched chain, reloading page");
                            env.reload();
                        }
                    }),
                );
                subscription.push(handle);
            }
        }
        InjectedProvider::Legacy(_) => info!("injected web3 detected"),
        InjectedProvider::None => debug!("no injected web3"),
    }

    let net_id = match requested_net_id {
        Some(net_id) => net_id,
        None => resolve_net_id(&**env, config, &provider, client.as_ref()).await?,
    };

    let network: NetworkEntry = config
        .registry()
        .get(net_id)
        .cloned()
        .ok_or(ConnectError::UnknownNetwork(net_id))?;

    let injected_web3 = client.is_some();
    let mut default_account = None;
    let mut network_match = false;

    if let Some(injected) = client.take() {
        let accounts = get_accounts(&provider, &injected).await?;
        default_account = normalize_account(accounts.first().map(String::as_str));
        if default_account.is_none() {
            warn!("unlock your wallet");
        }

        let tracker = AccountTracker::new(default_account.as_deref());
        subscribe_accounts(&provider, &tracker, &listener, &mut subscription);
        subscription.set_tracker(tracker);

        let live = get_net_id(&provider, &injected).await?;
        if live.as_net_id() == Some(net_id) {
            network_match = true;
            client = Some(injected);
        } else {
            info!(%live, resolved = %net_id, "wallet is on another network, using RPC endpoint");
        }
    }

    let client = match client {
        Some(client) => client,
        None => Web3Client::rpc(&network.rpc_url, env.rpc_transport(&network.rpc_url)),
    };

    env.set_title(&config.page_title(&network.name));

    Ok(ConnectionResult {
        client,
        net_id,
        net_id_name: network.name,
        injected_web3,
        default_account,
        network_match,
        subscription,
    })
}

async fn resolve_net_id<E>(
    env: &E,
    config: &ConnectConfig,
    provider: &InjectedProvider,
    client: Option<&Web3Client>,
) -> Result<NetId, ConnectError>
where
    E: Environment + ?Sized,
{
    let registry = config.registry();
    let slots = env.net_id_slots();

    let mut candidate = None;
    if let Some(client) = client {
        let live = get_net_id(provider, client).await?;
        candidate = registry.known(&live);
        if candidate.is_none() {
            info!(%live, "wallet network is not supported, trying the stored choice");
        }
    }

    if candidate.is_none() {
        let stored = slots.durable_net_id().map_err(ConnectError::Storage)?;
        candidate = stored.as_deref().and_then(|raw| registry.known_slot(raw));
        if candidate.is_none() {
            if let Some(raw) = stored {
                debug!(stored = %raw, "stored netId is not supported");
            }
        }
    }

    let net_id = candidate.unwrap_or_else(|| {
        info!(default = %config.default_net_id(), "falling back to the default network");
        config.default_net_id()
    });

    slots.persist(net_id).map_err(ConnectError::Storage)?;
    Ok(net_id)
}

fn subscribe_accounts(
    provider: &InjectedProvider,
    tracker: &AccountTracker,
    listener: &AccountListener,
    subscription: &mut Subscription,
) {
    let update = account_updater(tracker.clone(), listener.clone(), subscription.closed_flag());

    match provider {
        InjectedProvider::Modern(modern) => {
            let handle = modern.on(
                ProviderEventKind::AccountsChanged,
                Box::new(move |event: ProviderEvent| {
                    if let ProviderEvent::AccountsChanged(accounts) = event {
                        update(accounts.first().map(String::as_str));
                    }
                }),
            );
            subscription.push(handle);
        }
        InjectedProvider::Legacy(legacy) => match legacy.public_config_store() {
            Some(store) => {
                let handle = store.on_update(Box::new(move |update_event: ConfigUpdate| {
                    update(update_event.selected_address.as_deref());
                }));
                subscription.push(handle);
            }
            None => debug!("legacy provider has no config store, account changes are not tracked"),
        },
        InjectedProvider::None => {}
    }
}
