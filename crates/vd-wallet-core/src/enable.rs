use serde_json::json;
use tracing::{debug, warn};
use vd_chain_client::InjectedProvider;

use crate::{AccountListener, ConnectError, Environment, get_accounts};

/// Ask the injected provider for account access and report the first
/// authorized account. Without a request-style provider this does nothing.
pub async fn enable_wallet<E>(env: &E, listener: &AccountListener) -> Result<(), ConnectError>
where
    E: Environment + ?Sized,
{
    let injected = env.provider();
    let (InjectedProvider::Modern(provider), Some(client)) = (&injected, injected.client()) else {
        debug!(provider = ?injected, "no request-style provider, skipping wallet enable");
        return Ok(());
    };

    if let Err(err) = provider.request("eth_requestAccounts", json!([])).await {
        warn!("wallet access request rejected: {err:#}");
        listener(None);
        return Err(ConnectError::UserDeniedAccess);
    }

    let accounts = get_accounts(&injected, &client).await?;
    listener(accounts.first().map(String::as_str));
    Ok(())
}
