// Wallet connection: provider access, network negotiation, signing capability
pub mod chain;
pub mod provider;
pub mod session;
pub mod signer;

#[cfg(test)]
pub mod mock;

pub use chain::ChainDescriptor;
pub use provider::{JsonRpcWallet, WalletProvider};
pub use session::{WalletSession, WalletSnapshot};
pub use signer::SigningCapability;
