use thiserror::Error;
use vd_api_types::NetId;

#[derive(Debug, Error)]
pub enum ConnectError {
    /// The user rejected the wallet connection prompt.
    #[error("You need to provide access to your wallet account")]
    UserDeniedAccess,

    #[error("network {0} is not in the network registry")]
    UnknownNetwork(NetId),

    #[error("invalid connector configuration: {0}")]
    InvalidConfig(String),

    #[error("netId storage: {0:#}")]
    Storage(anyhow::Error),

    #[error("provider request failed: {0:#}")]
    Transport(anyhow::Error),
}
