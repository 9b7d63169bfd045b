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

#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]
//! Peerlink common types and collaborator traits

mod caip;
pub use caip::{AccountId, CaipChainId, IdError, EIP155_NAMESPACE};

mod namespace;
pub use namespace::{Namespace, NamespaceError, Namespaces};

mod request;
pub use request::{
    JsonRpcResponse, KnownMethod, ResponsePayload, SessionEvent, SessionRequest,
    CHAIN_CHANGED_EVENT, JSONRPC_VERSION,
};

mod session;
pub use session::{PeerMetadata, Redirects, RequestId, Session, Topic};

/// Relay transport traits and types
pub mod transport;

/// UI collaborator traits and types
pub mod ui;

/// Wallet collaborator traits and types
pub mod wallet;
