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

use std::fmt;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_types_eth::TransactionRequest;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TransactionError;
use crate::{KnownMethod, RequestId, Topic, JSONRPC_VERSION};

/// Identifier of a configured RPC endpoint in the wallet
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkClientId(String);

impl NetworkClientId {
    /// Create a network client id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bookkeeping the wallet attaches to a submitted transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    /// Wallet-internal transaction id
    pub id: String,
    /// Origin that requested the transaction
    pub origin: String,
    /// Network the transaction was submitted on
    pub network_client_id: NetworkClientId,
}

/// Handle to a submitted transaction.
///
/// `result` resolves to the transaction hash once the user approves and the
/// transaction is broadcast, or to an error if either step fails.
pub struct SubmittedTransaction {
    /// Submission bookkeeping
    pub meta: TransactionMeta,
    /// Resolves to the transaction hash
    pub result: BoxFuture<'static, Result<B256, TransactionError>>,
}

impl fmt::Debug for SubmittedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmittedTransaction")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Transaction fields inspected by the security check
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SecurityTxParams {
    /// Sender
    pub from: Option<Address>,
    /// Recipient, `None` for contract creation
    pub to: Option<Address>,
    /// Value in wei
    pub value: Option<U256>,
    /// Calldata
    pub data: Option<Bytes>,
}

impl From<&TransactionRequest> for SecurityTxParams {
    fn from(tx: &TransactionRequest) -> Self {
        Self {
            from: tx.from,
            to: tx.to.and_then(|kind| kind.to().copied()),
            value: tx.value,
            data: tx.input.input().cloned(),
        }
    }
}

/// Normalized request handed to the security check
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SecurityRequest {
    /// Request id
    pub id: RequestId,
    /// Always `2.0`
    pub jsonrpc: String,
    /// Always `eth_sendTransaction`
    pub method: String,
    /// Requesting origin
    pub origin: String,
    /// Single-element transaction list
    pub params: Vec<SecurityTxParams>,
}

impl SecurityRequest {
    /// Security request for an `eth_sendTransaction`
    pub fn send_transaction(id: RequestId, origin: &str, tx: &TransactionRequest) -> Self {
        Self {
            id,
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: KnownMethod::EthSendTransaction.to_string(),
            origin: origin.to_string(),
            params: vec![SecurityTxParams::from(tx)],
        }
    }
}

/// Request forwarded to the wallet's generic RPC handler
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForwardedRequest {
    /// Request id, used to approve or reject later
    pub id: RequestId,
    /// Session topic
    pub topic: Topic,
    /// Method name as the handler should see it
    pub method: String,
    /// Original params
    pub params: Vec<Value>,
    /// Effective origin
    pub origin: String,
}
