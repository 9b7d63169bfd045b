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

use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use metrics::Counter;
use metrics_derive::Metrics;
use parking_lot::{Mutex, RwLock};
use peerlink_types::{
    transport::Transport,
    ui::{Linker, Navigator},
    wallet::{NetworkSelector, PermissionStore, RpcHandler, SecurityCheck, TransactionSubmitter},
    CaipChainId, JsonRpcResponse, RequestId, Session, SessionEvent, Topic, CHAIN_CHANGED_EVENT,
};
use peerlink_utils::{
    emit::WithTopic,
    log::{LogAndDrop, LogOnError},
    origin,
};
use serde_json::Value;
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};

use crate::{
    chain_switch::{ChainSwitchOutcome, ChainSwitcher},
    emit::SessionManagerEvent,
    error::{user_rejected, SessionError, SessionResult},
    permission::PermissionGate,
    redirect::{hand_back_strategy, RedirectCoordinator},
    registry::PendingRequestRegistry,
    settings::SessionSettings,
    watcher,
};

/// The wallet-side services a session manager drives
#[derive(Clone)]
pub struct WalletContext {
    /// Relay to the peer
    pub transport: Arc<dyn Transport>,
    /// Permission grants per origin
    pub permissions: Arc<dyn PermissionStore>,
    /// Active network selection
    pub networks: Arc<dyn NetworkSelector>,
    /// Transaction pipeline
    pub transactions: Arc<dyn TransactionSubmitter>,
    /// Advisory transaction screening
    pub security: Arc<dyn SecurityCheck>,
    /// Handler for requests answered by the wallet's own RPC stack
    pub rpc_handler: Arc<dyn RpcHandler>,
    /// Wallet screens
    pub navigator: Arc<dyn Navigator>,
    /// Opens external links
    pub linker: Arc<dyn Linker>,
}

/// Manages one live session: admits and dispatches peer requests, answers
/// them, keeps the session on the wallet's chain and hands control back to
/// the peer.
pub struct SessionManager {
    pub(crate) session: RwLock<Session>,
    pub(crate) settings: SessionSettings,
    pub(crate) ctx: WalletContext,
    pub(crate) registry: PendingRequestRegistry,
    pub(crate) gate: PermissionGate,
    pub(crate) chain_switcher: ChainSwitcher,
    redirects: RedirectCoordinator,
    handling_request: AtomicBool,
    last_chain_id: Mutex<u64>,
    shutdown: CancellationToken,
    event_sender: broadcast::Sender<WithTopic<SessionManagerEvent>>,
    pub(crate) metrics: SessionMetrics,
}

impl SessionManager {
    /// Create a manager for `session`. No background work runs until
    /// [`SessionManager::start`] is called.
    pub fn new(
        session: Session,
        settings: SessionSettings,
        ctx: WalletContext,
        event_sender: broadcast::Sender<WithTopic<SessionManagerEvent>>,
    ) -> Arc<Self> {
        let strategy = hand_back_strategy(
            &settings.hand_back,
            Arc::clone(&ctx.linker),
            Arc::clone(&ctx.navigator),
        );
        let manager = Self {
            gate: PermissionGate::new(Arc::clone(&ctx.permissions), Arc::clone(&ctx.networks)),
            chain_switcher: ChainSwitcher::new(settings.chain_switch_grace),
            redirects: RedirectCoordinator::new(strategy, settings.redirect_delay),
            registry: PendingRequestRegistry::default(),
            handling_request: AtomicBool::new(false),
            last_chain_id: Mutex::new(0),
            shutdown: CancellationToken::new(),
            metrics: SessionMetrics::default(),
            session: RwLock::new(session),
            settings,
            ctx,
            event_sender,
        };
        *manager.last_chain_id.lock() = manager.current_chain_id();
        Arc::new(manager)
    }

    /// Follow wallet network changes and handle requests queued on the
    /// relay before this manager existed
    pub async fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let handle = watcher::spawn(
            Arc::downgrade(self),
            self.ctx.networks.subscribe(),
            self.shutdown.clone(),
        );
        self.check_pending_requests().await;
        handle
    }

    /// Session topic
    pub fn topic(&self) -> Topic {
        self.session.read().topic.clone()
    }

    /// Snapshot of the session
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    /// Whether a request is being handled
    pub fn is_handling_request(&self) -> bool {
        self.handling_request.load(Ordering::SeqCst)
    }

    /// Mark whether the session was opened through a deep link
    pub fn set_deeplink(&self, deeplink: bool) {
        self.session.write().deeplink = deeplink;
    }

    /// Answer request `id` with `result`.
    ///
    /// Approving a chain add or switch first moves the session to the
    /// requested chain; if that fails the error is returned and nothing is
    /// sent, so the caller can reject instead. Unknown ids are ignored.
    pub async fn approve(&self, id: RequestId, result: Value) -> SessionResult<()> {
        let Some(pending) = self
            .registry
            .get(id)
            .log_on_error_level(Level::WARN, format!("Approve for unknown request {id}"))
        else {
            return Ok(());
        };

        if pending.known_method().is_some_and(|m| m.is_chain_switch()) {
            let chain_id = pending
                .request()
                .chain_id_param()
                .map_err(|e| SessionError::InvalidParams(e.to_string()))?;
            if self.switch_chain(chain_id).await? == ChainSwitchOutcome::InFlight {
                debug!("Approving {id} while another chain switch is in flight");
            }
        }

        let Ok(pending) = self
            .registry
            .resolve(id)
            .log_on_error_level(Level::WARN, "Request resolved during approval")
        else {
            return Ok(());
        };

        self.ctx
            .transport
            .respond(pending.topic(), JsonRpcResponse::success(id, result))
            .await
            .warn_and_drop(format!("Failed to send result for request {id}"));
        self.handling_request.store(false, Ordering::SeqCst);
        self.metrics.requests_approved.increment(1);
        self.emit(SessionManagerEvent::ApprovedRequest { id });

        if self.next_request_is_signing(id) {
            debug!("Next request is a signature, staying in front");
            self.registry.take_redirect_owed(id);
        } else {
            self.redirect_if_owed(id);
        }
        Ok(())
    }

    /// Answer request `id` with a user-rejected error carrying `error`'s
    /// message, then hand control back if the request owed it. Unknown ids
    /// are ignored.
    pub async fn reject(&self, id: RequestId, error: impl Display + Send) {
        let response = user_rejected(error);
        let message = response.message().to_string();

        if let Ok(pending) = self
            .registry
            .resolve(id)
            .log_on_error_level(Level::WARN, "Reject for unknown request")
        {
            self.ctx
                .transport
                .respond(pending.topic(), JsonRpcResponse::error(id, response))
                .await
                .warn_and_drop(format!("Failed to send rejection for request {id}"));
            self.handling_request.store(false, Ordering::SeqCst);
            self.metrics.requests_rejected.increment(1);
            self.emit(SessionManagerEvent::RejectedRequest { id, message });
        }

        self.redirect_if_owed(id);
    }

    /// Re-announce the session after a wallet-side permission change.
    ///
    /// Does nothing without `accounts`. An empty list is replaced by the
    /// origin's permitted accounts, and nothing happens if it has none. A
    /// `chain_id` of zero means the globally selected chain.
    pub async fn update_session(&self, chain_id: u64, accounts: Option<Vec<String>>) {
        if let Err(error) = self.try_update_session(chain_id, accounts).await {
            warn!("Failed to update session {}: {error}", self.topic());
        }
    }

    async fn try_update_session(
        &self,
        chain_id: u64,
        accounts: Option<Vec<String>>,
    ) -> SessionResult<()> {
        let Some(mut accounts) = accounts else {
            debug!("No accounts given, skipping session update");
            return Ok(());
        };

        if accounts.is_empty() {
            accounts = self
                .ctx
                .permissions
                .permitted_accounts(&self.hostname())
                .await?;
            if accounts.is_empty() {
                warn!("No permitted accounts for {}, skipping session update", self.origin());
                return Ok(());
            }
        }
        debug!("Updating session for accounts {accounts:?}");

        let chain_id = if chain_id == 0 {
            self.ctx.networks.global_chain_id()
        } else {
            chain_id
        };

        let topic = self.topic();
        let namespaces = self.ctx.permissions.scoped_namespaces(&self.origin()).await?;
        namespaces.validate()?;
        self.ctx
            .transport
            .update_session(&topic, namespaces.clone())
            .await?;
        self.session.write().namespaces = namespaces;

        self.emit_event(CHAIN_CHANGED_EVENT, chain_id).await
    }

    /// Emit session event `name` with `chain_id` as payload, scoped to the
    /// matching eip155 chain
    pub async fn emit_event(&self, name: &str, chain_id: u64) -> SessionResult<()> {
        let event = SessionEvent {
            name: name.to_string(),
            data: Value::from(chain_id),
        };
        self.ctx
            .transport
            .emit_session_event(&self.topic(), event, CaipChainId::eip155(chain_id))
            .await?;
        Ok(())
    }

    /// Handle every request the relay still holds for this session
    pub async fn check_pending_requests(&self) {
        let topic = self.topic();
        for request in self.ctx.transport.pending_requests() {
            if request.topic != topic {
                warn!(
                    "Skipping queued request {} for other session {}",
                    request.id, request.topic
                );
                continue;
            }
            debug!("Handling queued request {} ({})", request.id, request.method);
            if let Err(error) = self.handle_request(request).await {
                warn!("Failed to handle queued request: {error}");
            }
        }
    }

    /// React to a wallet network change. Moves the session to the wallet's
    /// chain if it diverged from the last one seen and no switch is in
    /// flight.
    pub async fn on_wallet_state_changed(&self) -> SessionResult<ChainSwitchOutcome> {
        let current = self.current_chain_id();
        if self.chain_switcher.is_switching() {
            return Ok(ChainSwitchOutcome::InFlight);
        }
        {
            let mut last = self.last_chain_id.lock();
            if *last == current {
                return Ok(ChainSwitchOutcome::Unchanged);
            }
            *last = current;
        }
        self.switch_chain(current).await
    }

    /// Stop background work and drop every pending request. Responses for
    /// dropped requests are never sent.
    pub fn close(&self) {
        self.shutdown.cancel();
        let dropped = self.registry.clear();
        self.handling_request.store(false, Ordering::SeqCst);
        info!("Closed session {}, dropped {dropped} pending requests", self.topic());
    }

    /// Whether [`SessionManager::close`] was called
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub(crate) async fn switch_chain(&self, chain_id: u64) -> SessionResult<ChainSwitchOutcome> {
        let outcome = self
            .chain_switcher
            .switch(&self.session, self.ctx.transport.as_ref(), chain_id)
            .await?;
        if outcome == ChainSwitchOutcome::Switched {
            // the peer now sits on this chain, whoever asked for the switch
            *self.last_chain_id.lock() = chain_id;
            self.emit(SessionManagerEvent::ChainSwitched { chain_id });
        }
        Ok(outcome)
    }

    /// Chain the wallet currently presents to this session's origin
    pub(crate) fn current_chain_id(&self) -> u64 {
        let networks = &self.ctx.networks;
        if networks.per_origin_enabled() {
            if let Some(chain_id) = networks.origin_chain_id(&self.hostname()) {
                return chain_id;
            }
        }
        networks.global_chain_id()
    }

    pub(crate) fn origin(&self) -> String {
        self.session.read().peer.url.clone()
    }

    pub(crate) fn hostname(&self) -> String {
        origin::hostname(&self.session.read().peer.url)
    }

    pub(crate) fn begin_handling(&self) {
        self.handling_request.store(true, Ordering::SeqCst);
        self.ctx.navigator.show_loading(&self.topic());
    }

    pub(crate) fn end_handling(&self) {
        self.handling_request.store(false, Ordering::SeqCst);
    }

    fn next_request_is_signing(&self, answered: RequestId) -> bool {
        let topic = self.topic();
        self.ctx
            .transport
            .pending_requests()
            .into_iter()
            .find(|r| r.topic == topic && r.id != answered)
            .is_some_and(|r| self.settings.signing_methods.contains(&r.method))
    }

    fn redirect_if_owed(&self, id: RequestId) {
        if !self.registry.take_redirect_owed(id) {
            return;
        }
        let (deeplink, peer_link) = {
            let session = self.session.read();
            (session.deeplink, session.peer_link().map(str::to_string))
        };
        if self.redirects.redirect(deeplink, peer_link).is_some() {
            self.emit(SessionManagerEvent::Redirected { id });
        }
    }

    pub(crate) fn emit(&self, event: SessionManagerEvent) {
        let _ = self.event_sender.send(WithTopic {
            topic: self.topic(),
            event,
        });
    }
}

#[derive(Metrics)]
#[metrics(scope = "session")]
pub(crate) struct SessionMetrics {
    #[metric(describe = "the count of requests accepted for handling.")]
    pub(crate) requests_received: Counter,
    #[metric(describe = "the count of duplicate deliveries ignored.")]
    pub(crate) duplicate_requests: Counter,
    #[metric(describe = "the count of requests denied at the permission gate.")]
    pub(crate) requests_denied: Counter,
    #[metric(describe = "the count of requests answered with a result.")]
    pub(crate) requests_approved: Counter,
    #[metric(describe = "the count of requests answered with an error.")]
    pub(crate) requests_rejected: Counter,
}
