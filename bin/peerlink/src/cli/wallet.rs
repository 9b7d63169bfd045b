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

//! In-memory wallet services backing a replay

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use alloy_primitives::B256;
use alloy_rpc_types_eth::TransactionRequest;
use futures_util::{future, stream};
use parking_lot::RwLock;
use peerlink_types::{
    transport::{Transport, TransportResult},
    ui::{LinkError, Linker, Navigator},
    wallet::{
        ForwardedRequest, NetworkClientId, NetworkSelector, PermissionError, PermissionResult,
        PermissionStore, RpcHandler, SecurityCheck, SecurityRequest, SubmittedTransaction,
        TransactionError, TransactionMeta, TransactionSubmitter, WalletStateStream,
    },
    CaipChainId, JsonRpcResponse, Namespaces, SessionEvent, SessionRequest, Topic,
};
use peerlink_utils::origin;
use tokio::sync::watch;
use tracing::{debug, info};

use super::{
    fixture::{OriginPermissions, WalletFixture},
    output::{OutputSink, ReplayOutput},
};

struct NetworkState {
    global_chain_id: u64,
    origin_chains: HashMap<String, u64>,
}

/// Permissions, networks and transaction pipeline of the replayed wallet
pub(crate) struct ReplayWallet {
    state: RwLock<NetworkState>,
    per_origin_enabled: bool,
    networks: BTreeMap<u64, NetworkClientId>,
    permissions: HashMap<String, OriginPermissions>,
    transaction_hash: B256,
    transaction_error: Option<String>,
    next_transaction_id: AtomicU64,
    changes: watch::Sender<u64>,
    sink: Arc<OutputSink>,
}

impl ReplayWallet {
    pub(crate) fn new(fixture: WalletFixture, sink: Arc<OutputSink>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: RwLock::new(NetworkState {
                global_chain_id: fixture.global_chain_id,
                origin_chains: fixture.origin_chains,
            }),
            per_origin_enabled: fixture.per_origin_enabled,
            networks: fixture.networks,
            permissions: fixture.permissions,
            transaction_hash: fixture.transaction_hash,
            transaction_error: fixture.transaction_error,
            next_transaction_id: AtomicU64::new(1),
            changes,
            sink,
        }
    }

    /// The user picks a new global chain
    pub(crate) fn select_chain(&self, chain_id: u64) {
        info!("Wallet selected chain {chain_id}");
        self.state.write().global_chain_id = chain_id;
        self.notify();
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    // Grants are keyed by origin, but some lookups arrive with a bare hostname
    fn grants(&self, origin: &str) -> Option<&OriginPermissions> {
        self.permissions.get(origin).or_else(|| {
            self.permissions
                .iter()
                .find(|(key, _)| origin::hostname(key) == origin)
                .map(|(_, grants)| grants)
        })
    }
}

#[async_trait::async_trait]
impl PermissionStore for ReplayWallet {
    async fn permitted_chains(&self, origin: &str) -> PermissionResult<Vec<CaipChainId>> {
        Ok(self
            .grants(origin)
            .map(|g| g.chains.clone())
            .unwrap_or_default())
    }

    async fn permitted_accounts(&self, origin: &str) -> PermissionResult<Vec<String>> {
        Ok(self
            .grants(origin)
            .map(|g| g.accounts.clone())
            .unwrap_or_default())
    }

    async fn scoped_namespaces(&self, origin: &str) -> PermissionResult<Namespaces> {
        self.grants(origin)
            .map(|g| g.namespaces.clone())
            .ok_or_else(|| PermissionError::UnknownOrigin(origin.to_string()))
    }
}

impl NetworkSelector for ReplayWallet {
    fn global_chain_id(&self) -> u64 {
        self.state.read().global_chain_id
    }

    fn global_network_client_id(&self) -> NetworkClientId {
        let chain_id = self.global_chain_id();
        self.network_client_id(chain_id)
            .unwrap_or_else(|| NetworkClientId::new(chain_id.to_string()))
    }

    fn per_origin_enabled(&self) -> bool {
        self.per_origin_enabled
    }

    fn origin_chain_id(&self, hostname: &str) -> Option<u64> {
        self.state.read().origin_chains.get(hostname).copied()
    }

    fn network_client_id(&self, chain_id: u64) -> Option<NetworkClientId> {
        self.networks.get(&chain_id).cloned()
    }

    fn set_network_client_for_origin(&self, hostname: &str, network_client_id: &NetworkClientId) {
        let Some(chain_id) = self
            .networks
            .iter()
            .find(|(_, id)| *id == network_client_id)
            .map(|(chain_id, _)| *chain_id)
        else {
            return;
        };
        debug!("Origin {hostname} now on {network_client_id}");
        self.state
            .write()
            .origin_chains
            .insert(hostname.to_string(), chain_id);
        self.notify();
    }

    fn subscribe(&self) -> WalletStateStream {
        let rx = self.changes.subscribe();
        Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.changed().await.ok().map(|()| ((), rx))
        }))
    }
}

#[async_trait::async_trait]
impl TransactionSubmitter for ReplayWallet {
    async fn submit(
        &self,
        tx: TransactionRequest,
        origin: &str,
        network_client_id: &NetworkClientId,
    ) -> Result<SubmittedTransaction, TransactionError> {
        debug!("Submitting transaction from {:?} on {network_client_id}", tx.from);
        let id = self.next_transaction_id.fetch_add(1, Ordering::SeqCst);
        let result = match &self.transaction_error {
            Some(message) => Err(TransactionError::Rejected(message.clone())),
            None => Ok(self.transaction_hash),
        };
        Ok(SubmittedTransaction {
            meta: TransactionMeta {
                id: format!("tx-{id}"),
                origin: origin.to_string(),
                network_client_id: network_client_id.clone(),
            },
            result: Box::pin(future::ready(result)),
        })
    }
}

impl SecurityCheck for ReplayWallet {
    fn validate(&self, request: &SecurityRequest, meta: &TransactionMeta) {
        self.sink
            .record(ReplayOutput::SecurityCheck { request, meta });
    }
}

impl RpcHandler for ReplayWallet {
    fn forward(&self, request: ForwardedRequest) {
        self.sink.record(ReplayOutput::Forwarded { request: &request });
    }
}

/// Relay side of the replay
pub(crate) struct ReplayRelay {
    pending: Vec<SessionRequest>,
    sink: Arc<OutputSink>,
}

impl ReplayRelay {
    pub(crate) fn new(pending: Vec<SessionRequest>, sink: Arc<OutputSink>) -> Self {
        Self { pending, sink }
    }
}

#[async_trait::async_trait]
impl Transport for ReplayRelay {
    fn pending_requests(&self) -> Vec<SessionRequest> {
        self.pending.clone()
    }

    async fn respond(&self, topic: &Topic, response: JsonRpcResponse) -> TransportResult<()> {
        self.sink.record(ReplayOutput::Response {
            topic,
            response: &response,
        });
        Ok(())
    }

    async fn emit_session_event(
        &self,
        topic: &Topic,
        event: SessionEvent,
        chain_id: CaipChainId,
    ) -> TransportResult<()> {
        self.sink.record(ReplayOutput::SessionEvent {
            topic,
            event: &event,
            chain_id: &chain_id,
        });
        Ok(())
    }

    async fn update_session(&self, topic: &Topic, namespaces: Namespaces) -> TransportResult<()> {
        self.sink.record(ReplayOutput::SessionUpdate {
            topic,
            namespaces: &namespaces,
        });
        Ok(())
    }
}

/// Screens and link handling of the replayed host
pub(crate) struct ReplayScreen {
    sink: Arc<OutputSink>,
}

impl ReplayScreen {
    pub(crate) fn new(sink: Arc<OutputSink>) -> Self {
        Self { sink }
    }

    fn ui(&self, action: &'static str, url: Option<&str>) {
        self.sink.record(ReplayOutput::Ui { action, url });
    }
}

impl Navigator for ReplayScreen {
    fn show_loading(&self, _topic: &Topic) {
        self.ui("showLoading", None);
    }

    fn show_return_prompt(&self) {
        self.ui("showReturnPrompt", None);
    }

    fn minimize(&self) {
        self.ui("minimize", None);
    }
}

#[async_trait::async_trait]
impl Linker for ReplayScreen {
    async fn open_url(&self, url: &str) -> Result<(), LinkError> {
        self.ui("openUrl", Some(url));
        Ok(())
    }
}
