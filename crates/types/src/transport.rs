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

#[cfg(feature = "test-utils")]
use mockall::automock;

use crate::{CaipChainId, JsonRpcResponse, Namespaces, SessionEvent, SessionRequest, Topic};

/// Result type for relay operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Relay failure
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The relay does not know the session
    #[error("session {0} not found on relay")]
    SessionNotFound(Topic),
    /// The relay rejected or failed to deliver the message
    #[error("relay error: {0}")]
    Relay(String),
    /// Other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Relay that carries requests and responses between peer and wallet.
///
/// Treated as a black box: delivery, encryption and pairing are owned by the
/// implementation.
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Requests the relay has delivered but not yet seen a response for,
    /// across all sessions, oldest first
    fn pending_requests(&self) -> Vec<SessionRequest>;

    /// Send a terminal response on a session
    async fn respond(&self, topic: &Topic, response: JsonRpcResponse) -> TransportResult<()>;

    /// Emit a named event on a session
    async fn emit_session_event(
        &self,
        topic: &Topic,
        event: SessionEvent,
        chain_id: CaipChainId,
    ) -> TransportResult<()>;

    /// Replace the namespaces of a session, resolves on peer acknowledgement
    async fn update_session(&self, topic: &Topic, namespaces: Namespaces) -> TransportResult<()>;
}
