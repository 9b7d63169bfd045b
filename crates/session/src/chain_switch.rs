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

use std::time::Duration;

use metrics::Counter;
use metrics_derive::Metrics;
use parking_lot::{Mutex, RwLock};
use peerlink_types::{transport::Transport, CaipChainId, Session, SessionEvent};
use tracing::{debug, info};

use crate::error::{SessionError, SessionResult};

/// Whether a chain switch is in flight
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChainSwitchState {
    /// No switch in flight
    #[default]
    Idle,
    /// A switch is updating the session
    Switching,
}

/// Result of asking for a chain switch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainSwitchOutcome {
    /// The session was updated and the peer notified
    Switched,
    /// Another switch was in flight, this one was dropped
    InFlight,
    /// The session was already on the chain
    Unchanged,
}

/// Serializes chain switches of one session. At most one switch runs at a
/// time, triggers arriving meanwhile are dropped.
pub struct ChainSwitcher {
    state: Mutex<ChainSwitchState>,
    grace: Duration,
    metrics: ChainSwitchMetrics,
}

impl ChainSwitcher {
    /// Create a switcher that waits `grace` between the namespace update and
    /// the `chainChanged` event
    pub fn new(grace: Duration) -> Self {
        Self {
            state: Mutex::new(ChainSwitchState::Idle),
            grace,
            metrics: ChainSwitchMetrics::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> ChainSwitchState {
        *self.state.lock()
    }

    /// Whether a switch is in flight
    pub fn is_switching(&self) -> bool {
        self.state() == ChainSwitchState::Switching
    }

    /// Move `session` to `chain_id`: widen the namespaces with the chain,
    /// push them to the peer, commit them locally, then announce the chain
    /// after the grace period.
    ///
    /// The state returns to idle when this future completes, fails, or is
    /// dropped.
    pub async fn switch(
        &self,
        session: &RwLock<Session>,
        transport: &dyn Transport,
        chain_id: u64,
    ) -> SessionResult<ChainSwitchOutcome> {
        let Some(_guard) = self.try_begin() else {
            debug!("Dropping switch to chain {chain_id}, a switch is in flight");
            self.metrics.dropped_switches.increment(1);
            return Ok(ChainSwitchOutcome::InFlight);
        };

        let target = CaipChainId::eip155(chain_id);
        let (topic, namespaces) = {
            let session = session.read();
            (
                session.topic.clone(),
                session.namespaces.merge_chain(&target),
            )
        };

        debug!("Updating session {topic} namespaces for {target}");
        if let Err(error) = transport.update_session(&topic, namespaces.clone()).await {
            self.metrics.failed_switches.increment(1);
            return Err(SessionError::ChainSwitch(error));
        }
        session.write().namespaces = namespaces;

        tokio::time::sleep(self.grace).await;

        transport
            .emit_session_event(&topic, SessionEvent::chain_changed(chain_id), target)
            .await
            .map_err(|error| {
                self.metrics.failed_switches.increment(1);
                SessionError::ChainSwitch(error)
            })?;

        info!("Session {topic} switched to chain {chain_id}");
        self.metrics.switches.increment(1);
        Ok(ChainSwitchOutcome::Switched)
    }

    fn try_begin(&self) -> Option<SwitchGuard<'_>> {
        let mut state = self.state.lock();
        if *state == ChainSwitchState::Switching {
            return None;
        }
        *state = ChainSwitchState::Switching;
        Some(SwitchGuard { state: &self.state })
    }
}

struct SwitchGuard<'a> {
    state: &'a Mutex<ChainSwitchState>,
}

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = ChainSwitchState::Idle;
    }
}

#[derive(Metrics)]
#[metrics(scope = "session_chain_switch")]
struct ChainSwitchMetrics {
    #[metric(describe = "the count of completed chain switches.")]
    switches: Counter,
    #[metric(describe = "the count of failed chain switches.")]
    failed_switches: Counter,
    #[metric(describe = "the count of switches dropped while another was in flight.")]
    dropped_switches: Counter,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use peerlink_types::{
        transport::{MockTransport, TransportError},
        Namespace, Namespaces, PeerMetadata, Topic, CHAIN_CHANGED_EVENT,
    };

    use super::*;

    fn session() -> RwLock<Session> {
        let namespace = Namespace {
            chains: [CaipChainId::eip155(1)].into_iter().collect(),
            methods: ["eth_sendTransaction".to_string()].into_iter().collect(),
            events: [CHAIN_CHANGED_EVENT.to_string()].into_iter().collect(),
            ..Default::default()
        };
        RwLock::new(Session {
            topic: Topic::from("abc"),
            peer: PeerMetadata::default(),
            namespaces: [("eip155".to_string(), namespace)].into_iter().collect(),
            deeplink: false,
        })
    }

    fn recording_transport(
        updates: Arc<Mutex<Vec<Namespaces>>>,
        events: Arc<Mutex<Vec<(SessionEvent, CaipChainId)>>>,
    ) -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_update_session().returning(move |_, ns| {
            updates.lock().push(ns);
            Ok(())
        });
        transport
            .expect_emit_session_event()
            .returning(move |_, event, chain| {
                events.lock().push((event, chain));
                Ok(())
            });
        transport
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_widens_namespaces_then_emits() {
        let updates = Arc::new(Mutex::new(vec![]));
        let events = Arc::new(Mutex::new(vec![]));
        let transport = recording_transport(updates.clone(), events.clone());
        let session = session();
        let switcher = ChainSwitcher::new(Duration::from_millis(100));

        let outcome = switcher.switch(&session, &transport, 137).await.unwrap();

        assert_eq!(outcome, ChainSwitchOutcome::Switched);
        assert_eq!(switcher.state(), ChainSwitchState::Idle);
        let updates = updates.lock();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].has_chain(&CaipChainId::eip155(1)));
        assert!(updates[0].has_chain(&CaipChainId::eip155(137)));
        assert_eq!(session.read().namespaces, updates[0]);
        assert_eq!(
            *events.lock(),
            vec![(SessionEvent::chain_changed(137), CaipChainId::eip155(137))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_switches_run_once() {
        let updates = Arc::new(Mutex::new(vec![]));
        let events = Arc::new(Mutex::new(vec![]));
        let transport = recording_transport(updates.clone(), events.clone());
        let session = session();
        let switcher = ChainSwitcher::new(Duration::from_millis(100));

        let (first, second) = tokio::join!(
            switcher.switch(&session, &transport, 137),
            switcher.switch(&session, &transport, 10),
        );

        assert_eq!(first.unwrap(), ChainSwitchOutcome::Switched);
        assert_eq!(second.unwrap(), ChainSwitchOutcome::InFlight);
        assert_eq!(updates.lock().len(), 1);
        assert_eq!(events.lock().len(), 1);
        assert!(!session.read().namespaces.has_chain(&CaipChainId::eip155(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_update_leaves_session_and_releases() {
        let mut transport = MockTransport::new();
        transport
            .expect_update_session()
            .times(1)
            .returning(|topic, _| Err(TransportError::SessionNotFound(topic.clone())));
        transport.expect_emit_session_event().never();
        let session = session();
        let before = session.read().namespaces.clone();
        let switcher = ChainSwitcher::new(Duration::from_millis(100));

        let result = switcher.switch(&session, &transport, 137).await;

        assert!(matches!(result, Err(SessionError::ChainSwitch(_))));
        assert_eq!(session.read().namespaces, before);
        assert!(!switcher.is_switching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_switch_releases() {
        let transport = recording_transport(Arc::default(), Arc::default());
        let session = session();
        let switcher = ChainSwitcher::new(Duration::from_secs(10));

        let switch = switcher.switch(&session, &transport, 137);
        let timed_out = tokio::time::timeout(Duration::from_millis(50), switch).await;

        assert!(timed_out.is_err());
        assert_eq!(switcher.state(), ChainSwitchState::Idle);
    }
}
