// This file is part of Peerlink.
//
// Peerlink is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Peerlink is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Peerlink.
// If not, see https://www.gnu.org/licenses/.

use std::pin::Pin;

use alloy_rpc_types_eth::TransactionRequest;
use futures_util::Stream;
#[cfg(feature = "test-utils")]
use mockall::automock;

use super::{
    error::{PermissionResult, TransactionError},
    types::{
        ForwardedRequest, NetworkClientId, SecurityRequest, SubmittedTransaction, TransactionMeta,
    },
};
use crate::{CaipChainId, Namespaces};

/// Stream that yields whenever wallet network state may have changed
pub type WalletStateStream = Pin<Box<dyn Stream<Item = ()> + Send>>;

/// Authoritative per-origin permission source.
///
/// Never cached by callers; every lookup re-reads the store.
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait PermissionStore: Send + Sync {
    /// Chains the origin has been granted
    async fn permitted_chains(&self, origin: &str) -> PermissionResult<Vec<CaipChainId>>;

    /// Unqualified account addresses the origin has been granted
    async fn permitted_accounts(&self, origin: &str) -> PermissionResult<Vec<String>>;

    /// Full namespace grants for the origin
    async fn scoped_namespaces(&self, origin: &str) -> PermissionResult<Namespaces>;
}

/// Wallet-global and per-origin network selection
#[cfg_attr(feature = "test-utils", automock)]
pub trait NetworkSelector: Send + Sync {
    /// Chain selected wallet-wide
    fn global_chain_id(&self) -> u64;

    /// Network client selected wallet-wide
    fn global_network_client_id(&self) -> NetworkClientId;

    /// Whether each origin can have its own selected network
    fn per_origin_enabled(&self) -> bool;

    /// Chain selected for an origin's hostname, if one has been chosen
    fn origin_chain_id(&self, hostname: &str) -> Option<u64>;

    /// Network client configured for an EVM chain, `None` if the wallet does
    /// not know the chain
    fn network_client_id(&self, chain_id: u64) -> Option<NetworkClientId>;

    /// Select a network client for an origin's hostname. Idempotent.
    fn set_network_client_for_origin(&self, hostname: &str, network_client_id: &NetworkClientId);

    /// Change notifications for any of the values above
    fn subscribe(&self) -> WalletStateStream;
}

/// Wallet transaction pipeline
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Queue a transaction for user approval and broadcast
    async fn submit(
        &self,
        tx: TransactionRequest,
        origin: &str,
        network_client_id: &NetworkClientId,
    ) -> Result<SubmittedTransaction, TransactionError>;
}

/// Advisory fraud check on outgoing transactions
#[cfg_attr(feature = "test-utils", automock)]
pub trait SecurityCheck: Send + Sync {
    /// Start validating a request. Must not block; results are surfaced by
    /// the wallet, never to the caller.
    fn validate(&self, request: &SecurityRequest, meta: &TransactionMeta);
}

/// Generic wallet RPC handler.
///
/// The handler resolves the user's decision out of band and reports it back
/// through the session manager's approve and reject operations.
#[cfg_attr(feature = "test-utils", automock)]
pub trait RpcHandler: Send + Sync {
    /// Hand a request to the wallet
    fn forward(&self, request: ForwardedRequest);
}
