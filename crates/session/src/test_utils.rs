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

//! Session manager wired to mocked wallet services that record what they see

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use alloy_primitives::B256;
use futures::{channel::mpsc, future, stream};
use parking_lot::Mutex;
use peerlink_types::{
    transport::{MockTransport, TransportError},
    ui::{HandBackCapabilities, MockLinker, MockNavigator},
    wallet::{
        ForwardedRequest, MockNetworkSelector, MockPermissionStore, MockRpcHandler,
        MockSecurityCheck, MockTransactionSubmitter, NetworkClientId, SecurityRequest,
        SubmittedTransaction, TransactionError, TransactionMeta, WalletStateStream,
    },
    AccountId, CaipChainId, JsonRpcResponse, Namespace, Namespaces, PeerMetadata, Redirects, RequestId,
    Session, SessionEvent, SessionRequest, Topic, CHAIN_CHANGED_EVENT,
};
use peerlink_utils::emit::{WithTopic, EVENT_CHANNEL_CAPACITY};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::{SessionManager, SessionManagerEvent, SessionSettings, WalletContext};

pub(crate) const TOPIC: &str = "abc";
pub(crate) const PEER_URL: &str = "https://dapp.example";
pub(crate) const PEER_LINK: &str = "dapp://return";

pub(crate) fn request(id: RequestId, method: &str, params: Value, chain: &str) -> SessionRequest {
    serde_json::from_value(json!({
        "id": id,
        "topic": TOPIC,
        "method": method,
        "params": params,
        "chainId": chain,
    }))
    .unwrap()
}

pub(crate) fn network(chain_id: u64) -> NetworkClientId {
    NetworkClientId::new(format!("net-{chain_id}"))
}

/// What the mocked services saw
#[derive(Default)]
pub(crate) struct Recorded {
    pub(crate) responses: Mutex<Vec<JsonRpcResponse>>,
    pub(crate) events: Mutex<Vec<(SessionEvent, CaipChainId)>>,
    pub(crate) updates: Mutex<Vec<Namespaces>>,
    pub(crate) forwarded: Mutex<Vec<ForwardedRequest>>,
    pub(crate) origin_networks: Mutex<Vec<(String, NetworkClientId)>>,
    pub(crate) submitted: Mutex<Vec<(String, NetworkClientId)>>,
    pub(crate) screened: Mutex<Vec<SecurityRequest>>,
    pub(crate) hand_backs: Mutex<Vec<String>>,
    pub(crate) loading_shown: Mutex<usize>,
}

impl Recorded {
    pub(crate) fn errors(&self) -> Vec<(i32, String)> {
        self.responses
            .lock()
            .iter()
            .filter_map(|r| r.error_object())
            .map(|e| (e.code(), e.message().to_string()))
            .collect()
    }

    pub(crate) fn results(&self) -> Vec<Value> {
        self.responses
            .lock()
            .iter()
            .filter_map(|r| r.result().cloned())
            .collect()
    }
}

/// Wallet state behind the mocks
pub(crate) struct Harness {
    pub(crate) global_chain: Arc<AtomicU64>,
    pub(crate) per_origin: bool,
    pub(crate) origin_chain: Arc<Mutex<Option<u64>>>,
    pub(crate) known_chains: Vec<u64>,
    pub(crate) permitted_chains: Vec<u64>,
    pub(crate) permitted_accounts: Vec<String>,
    pub(crate) scoped_namespaces: Namespaces,
    pub(crate) pending: Vec<SessionRequest>,
    pub(crate) fail_session_update: bool,
    pub(crate) tx_result: Result<B256, TransactionError>,
    pub(crate) deeplink: bool,
    pub(crate) hand_back: HandBackCapabilities,
    pub(crate) wallet_changes: Option<WalletStateStream>,
    /// When set, selecting a network for the origin moves the origin chain
    /// and notifies through this sender
    pub(crate) origin_selection_notifier: Option<mpsc::UnboundedSender<()>>,
}

pub(crate) struct TestSession {
    pub(crate) manager: Arc<SessionManager>,
    pub(crate) recorded: Arc<Recorded>,
    pub(crate) events: broadcast::Receiver<WithTopic<SessionManagerEvent>>,
}

impl TestSession {
    pub(crate) fn drain_events(&mut self) -> Vec<SessionManagerEvent> {
        let mut events = vec![];
        while let Ok(event) = self.events.try_recv() {
            events.push(event.event);
        }
        events
    }
}

pub(crate) fn session_namespaces(chains: &[u64]) -> Namespaces {
    let namespace = Namespace {
        chains: chains.iter().copied().map(CaipChainId::eip155).collect(),
        accounts: chains
            .iter()
            .map(|c| format!("eip155:{c}:0x00000000000000000000000000000000000000aa"))
            .map(|a| a.parse::<AccountId>().unwrap())
            .collect(),
        methods: ["eth_sendTransaction", "personal_sign"]
            .into_iter()
            .map(str::to_string)
            .collect(),
        events: [CHAIN_CHANGED_EVENT.to_string()].into_iter().collect(),
    };
    [("eip155".to_string(), namespace)].into_iter().collect()
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            global_chain: Arc::new(AtomicU64::new(1)),
            per_origin: false,
            origin_chain: Arc::new(Mutex::new(None)),
            known_chains: vec![1, 10, 137],
            permitted_chains: vec![1],
            permitted_accounts: vec![],
            scoped_namespaces: session_namespaces(&[1]),
            pending: vec![],
            fail_session_update: false,
            tx_result: Ok(B256::repeat_byte(0x11)),
            deeplink: false,
            hand_back: HandBackCapabilities::default(),
            wallet_changes: None,
            origin_selection_notifier: None,
        }
    }

    pub(crate) fn build(self) -> TestSession {
        let recorded = Arc::new(Recorded::default());

        let mut transport = MockTransport::new();
        let pending = self.pending.clone();
        transport
            .expect_pending_requests()
            .returning(move || pending.clone());
        let r = Arc::clone(&recorded);
        transport.expect_respond().returning(move |_, response| {
            r.responses.lock().push(response);
            Ok(())
        });
        let r = Arc::clone(&recorded);
        transport
            .expect_emit_session_event()
            .returning(move |_, event, chain| {
                r.events.lock().push((event, chain));
                Ok(())
            });
        let r = Arc::clone(&recorded);
        let fail_session_update = self.fail_session_update;
        transport
            .expect_update_session()
            .returning(move |topic, namespaces| {
                if fail_session_update {
                    return Err(TransportError::SessionNotFound(topic.clone()));
                }
                r.updates.lock().push(namespaces);
                Ok(())
            });

        let mut permissions = MockPermissionStore::new();
        let permitted = self.permitted_chains.clone();
        permissions.expect_permitted_chains().returning(move |_| {
            Ok(permitted.iter().copied().map(CaipChainId::eip155).collect())
        });
        let accounts = self.permitted_accounts.clone();
        permissions
            .expect_permitted_accounts()
            .returning(move |_| Ok(accounts.clone()));
        let scoped = self.scoped_namespaces.clone();
        permissions
            .expect_scoped_namespaces()
            .returning(move |_| Ok(scoped.clone()));

        let mut networks = MockNetworkSelector::new();
        let global = Arc::clone(&self.global_chain);
        networks
            .expect_global_chain_id()
            .returning(move || global.load(Ordering::SeqCst));
        let global = Arc::clone(&self.global_chain);
        networks
            .expect_global_network_client_id()
            .returning(move || network(global.load(Ordering::SeqCst)));
        networks
            .expect_per_origin_enabled()
            .return_const(self.per_origin);
        let origin_chain = Arc::clone(&self.origin_chain);
        networks
            .expect_origin_chain_id()
            .returning(move |_| *origin_chain.lock());
        let known = self.known_chains.clone();
        networks
            .expect_network_client_id()
            .returning(move |id| known.contains(&id).then(|| network(id)));
        let r = Arc::clone(&recorded);
        let origin_chain = Arc::clone(&self.origin_chain);
        let notifier = self.origin_selection_notifier;
        networks
            .expect_set_network_client_for_origin()
            .returning(move |hostname, client| {
                r.origin_networks
                    .lock()
                    .push((hostname.to_string(), client.clone()));
                if let Some(notifier) = &notifier {
                    *origin_chain.lock() = client
                        .as_str()
                        .strip_prefix("net-")
                        .and_then(|id| id.parse().ok());
                    let _ = notifier.unbounded_send(());
                }
            });
        let changes = Mutex::new(self.wallet_changes);
        networks.expect_subscribe().returning(move || {
            changes
                .lock()
                .take()
                .unwrap_or_else(|| Box::pin(stream::pending::<()>()))
        });

        let mut transactions = MockTransactionSubmitter::new();
        let r = Arc::clone(&recorded);
        let tx_result = self.tx_result.clone();
        transactions
            .expect_submit()
            .returning(move |_, origin, client| {
                r.submitted.lock().push((origin.to_string(), client.clone()));
                Ok(SubmittedTransaction {
                    meta: TransactionMeta {
                        id: "tx-1".to_string(),
                        origin: origin.to_string(),
                        network_client_id: client.clone(),
                    },
                    result: Box::pin(future::ready(tx_result.clone())),
                })
            });

        let mut security = MockSecurityCheck::new();
        let r = Arc::clone(&recorded);
        security.expect_validate().returning(move |request, _| {
            r.screened.lock().push(request.clone());
        });

        let mut rpc_handler = MockRpcHandler::new();
        let r = Arc::clone(&recorded);
        rpc_handler.expect_forward().returning(move |request| {
            r.forwarded.lock().push(request);
        });

        let mut navigator = MockNavigator::new();
        let r = Arc::clone(&recorded);
        navigator.expect_show_loading().returning(move |_| {
            *r.loading_shown.lock() += 1;
        });
        let r = Arc::clone(&recorded);
        navigator.expect_show_return_prompt().returning(move || {
            r.hand_backs.lock().push("prompt".to_string());
        });
        let r = Arc::clone(&recorded);
        navigator.expect_minimize().returning(move || {
            r.hand_backs.lock().push("minimize".to_string());
        });

        let mut linker = MockLinker::new();
        let r = Arc::clone(&recorded);
        linker.expect_open_url().returning(move |url| {
            r.hand_backs.lock().push(format!("open:{url}"));
            Ok(())
        });

        let session = Session {
            topic: Topic::from(TOPIC),
            peer: PeerMetadata {
                name: "Dapp".to_string(),
                url: PEER_URL.to_string(),
                redirect: Some(Redirects {
                    native: Some(PEER_LINK.to_string()),
                    universal: None,
                }),
                ..Default::default()
            },
            namespaces: session_namespaces(&[1]),
            deeplink: self.deeplink,
        };
        let settings = SessionSettings {
            hand_back: self.hand_back,
            ..Default::default()
        };
        let ctx = WalletContext {
            transport: Arc::new(transport),
            permissions: Arc::new(permissions),
            networks: Arc::new(networks),
            transactions: Arc::new(transactions),
            security: Arc::new(security),
            rpc_handler: Arc::new(rpc_handler),
            navigator: Arc::new(navigator),
            linker: Arc::new(linker),
        };
        let (event_sender, events) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        TestSession {
            manager: SessionManager::new(session, settings, ctx, event_sender),
            recorded,
            events,
        }
    }
}
