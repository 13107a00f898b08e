//! Wallet connection bootstrap for the Validators DApp.
//!
//! `enable_wallet` asks an injected provider for account access.
//! `initialize` picks the network, builds a client for it and keeps the
//! caller informed about account switches until the returned
//! `Subscription` is torn down.

mod config;
mod connect;
mod enable;
mod environment;
mod error;
mod probe;
mod subscription;

#[cfg(test)]
mod testing;

pub use config::ConnectConfig;
pub use connect::{ConnectionResult, initialize};
pub use enable::enable_wallet;
pub use environment::Environment;
pub use error::ConnectError;
pub use probe::{get_accounts, get_net_id};
pub use subscription::{AccountListener, AccountTracker, Subscription, normalize_account};
