use serde_json::json;
use vd_api_types::ReportedNetId;
use vd_chain_client::{InjectedProvider, Web3Client, parse_accounts, reported_net_id};

use crate::ConnectError;

/// Accounts visible to the page, first entry being the selected one.
pub async fn get_accounts(
    provider: &InjectedProvider,
    client: &Web3Client,
) -> Result<Vec<String>, ConnectError> {
    match provider {
        InjectedProvider::Modern(provider) => {
            let value = provider
                .request("eth_accounts", json!([]))
                .await
                .map_err(ConnectError::Transport)?;
            parse_accounts(value).map_err(ConnectError::Transport)
        }
        InjectedProvider::Legacy(_) | InjectedProvider::None => {
            client.accounts().await.map_err(ConnectError::Transport)
        }
    }
}

/// Network the provider is on: the `chainId` field when the provider has
/// one, otherwise the client's `net_version`.
pub async fn get_net_id(
    provider: &InjectedProvider,
    client: &Web3Client,
) -> Result<ReportedNetId, ConnectError> {
    if let InjectedProvider::Modern(provider) = provider {
        if let Some(chain_id) = provider.chain_id() {
            return Ok(reported_net_id(&chain_id));
        }
    }

    client.net_id().await.map_err(ConnectError::Transport)
}
