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

use std::fmt::Display;

use peerlink_types::{CaipChainId, RequestId};

/// Event type for the session manager
#[derive(Clone, Debug, PartialEq)]
pub enum SessionManagerEvent {
    /// A peer request was registered and is being handled
    ReceivedRequest {
        /// Request id
        id: RequestId,
        /// Method as sent by the peer
        method: String,
    },
    /// A request was denied at the permission gate
    DeniedRequest {
        /// Request id
        id: RequestId,
        /// Chain the request targeted
        chain_id: CaipChainId,
    },
    /// A request was answered with a result
    ApprovedRequest {
        /// Request id
        id: RequestId,
    },
    /// A request was answered with an error
    RejectedRequest {
        /// Request id
        id: RequestId,
        /// Error message sent to the peer
        message: String,
    },
    /// The session moved to a new chain
    ChainSwitched {
        /// Chain the session now reports
        chain_id: u64,
    },
    /// Control was scheduled to return to the peer
    Redirected {
        /// Request that owed the redirect
        id: RequestId,
    },
}

impl Display for SessionManagerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionManagerEvent::ReceivedRequest { id, method } => {
                write!(f, "Received request.    Id: {id}    Method: {method}")
            }
            SessionManagerEvent::DeniedRequest { id, chain_id } => {
                write!(f, "Denied request.    Id: {id}    Chain: {chain_id}")
            }
            SessionManagerEvent::ApprovedRequest { id } => {
                write!(f, "Approved request.    Id: {id}")
            }
            SessionManagerEvent::RejectedRequest { id, message } => {
                write!(f, "Rejected request.    Id: {id}    Reason: {message}")
            }
            SessionManagerEvent::ChainSwitched { chain_id } => {
                write!(f, "Switched chain.    Chain id: {chain_id}")
            }
            SessionManagerEvent::Redirected { id } => {
                write!(f, "Redirecting to peer.    Id: {id}")
            }
        }
    }
}
