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

use jsonrpsee::types::{error::INVALID_PARAMS_CODE, ErrorObject, ErrorObjectOwned};
use peerlink_types::{
    transport::TransportError,
    wallet::{PermissionError, TransactionError},
    CaipChainId, NamespaceError, RequestId,
};

// Error codes borrowed from jsonrpsee
// INVALID_PARAMS_CODE = -32602

/// Chain is not recognized or not authorized for the origin (EIP-3326)
pub const CHAIN_NOT_RECOGNIZED_CODE: i32 = 4902;
/// The user declined the request
pub const USER_REJECTED_CODE: i32 = 5000;

const INVALID_CHAIN_MESSAGE: &str = "Invalid chainId";

/// Result type for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Error raised by session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session namespaces could not be updated during a chain switch
    #[error("chain switch failed: {0}")]
    ChainSwitch(#[source] TransportError),
    /// Request params could not be decoded
    #[error("invalid params: {0}")]
    InvalidParams(String),
    /// The wallet has no network configured for the chain
    #[error("no network configured for chain {0}")]
    UnknownChain(CaipChainId),
    /// No pending request with this id
    #[error("unknown request id {0}")]
    UnknownRequest(RequestId),
    /// Transaction submission failed
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    /// Permission store failure
    #[error(transparent)]
    Permission(#[from] PermissionError),
    /// Relay failure outside a chain switch
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Namespaces from the permission store break the account/chain invariant
    #[error("invalid namespaces: {0}")]
    InvalidNamespaces(#[from] NamespaceError),
}

/// Error object for a request whose chain the origin may not use
pub fn chain_not_recognized() -> ErrorObjectOwned {
    rpc_err(CHAIN_NOT_RECOGNIZED_CODE, INVALID_CHAIN_MESSAGE)
}

/// Error object for malformed params
pub fn invalid_params(msg: impl Into<String>) -> ErrorObjectOwned {
    rpc_err(INVALID_PARAMS_CODE, msg)
}

/// Normalize any rejection cause into the user-rejected error object. The
/// cause's display text becomes the message.
pub fn user_rejected(error: impl Display) -> ErrorObjectOwned {
    rpc_err(USER_REJECTED_CODE, error.to_string())
}

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObjectOwned {
    ErrorObject::owned(code, msg.into(), None::<()>)
}
