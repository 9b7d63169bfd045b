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

//! Replay fixture format

use std::collections::{BTreeMap, HashMap};

use alloy_primitives::B256;
use peerlink_types::{
    wallet::NetworkClientId, CaipChainId, Namespaces, RequestId, Session, SessionRequest,
};
use serde::Deserialize;
use serde_json::Value;

/// A session, the wallet around it and a script of things that happen to it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Fixture {
    pub(crate) session: Session,
    #[serde(default)]
    pub(crate) wallet: WalletFixture,
    /// Requests the relay holds before the manager starts
    #[serde(default)]
    pub(crate) pending: Vec<SessionRequest>,
    #[serde(default)]
    pub(crate) steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct WalletFixture {
    pub(crate) global_chain_id: u64,
    pub(crate) per_origin_enabled: bool,
    /// Chain selected per hostname
    pub(crate) origin_chains: HashMap<String, u64>,
    /// Configured networks by chain id
    pub(crate) networks: BTreeMap<u64, NetworkClientId>,
    /// Grants by origin
    pub(crate) permissions: HashMap<String, OriginPermissions>,
    /// Hash every submitted transaction resolves to
    pub(crate) transaction_hash: B256,
    /// If set, submitted transactions fail with this message
    pub(crate) transaction_error: Option<String>,
}

impl Default for WalletFixture {
    fn default() -> Self {
        Self {
            global_chain_id: 1,
            per_origin_enabled: false,
            origin_chains: HashMap::new(),
            networks: BTreeMap::from([(1, NetworkClientId::new("mainnet"))]),
            permissions: HashMap::new(),
            transaction_hash: B256::ZERO,
            transaction_error: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OriginPermissions {
    pub(crate) chains: Vec<CaipChainId>,
    pub(crate) accounts: Vec<String>,
    pub(crate) namespaces: Namespaces,
}

/// One scripted step
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub(crate) enum Step {
    /// A request arrives from the peer
    Request(SessionRequest),
    /// The wallet approves a request
    Approve {
        id: RequestId,
        #[serde(default)]
        result: Value,
    },
    /// The wallet rejects a request
    Reject { id: RequestId, message: String },
    /// The user selects a different global chain
    SelectChain(u64),
    /// Permissions changed on the wallet side
    UpdateSession {
        #[serde(default)]
        chain_id: u64,
        accounts: Option<Vec<String>>,
    },
    /// Emit an arbitrary session event
    EmitEvent { name: String, chain_id: u64 },
    /// Let time pass, in milliseconds
    Wait(u64),
}
