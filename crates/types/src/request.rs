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

use alloy_primitives::U64;
use jsonrpsee::types::ErrorObjectOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::{CaipChainId, IdError, RequestId, Topic};

/// JSON-RPC protocol version carried on every response
pub const JSONRPC_VERSION: &str = "2.0";

/// Session event name used to announce the active chain
pub const CHAIN_CHANGED_EVENT: &str = "chainChanged";

/// Methods the session manager knows by name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
pub enum KnownMethod {
    /// `eth_requestAccounts`
    #[strum(serialize = "eth_requestAccounts")]
    EthRequestAccounts,
    /// `eth_sendTransaction`
    #[strum(serialize = "eth_sendTransaction")]
    EthSendTransaction,
    /// `eth_signTransaction`
    #[strum(serialize = "eth_signTransaction")]
    EthSignTransaction,
    /// `eth_sign`
    #[strum(serialize = "eth_sign")]
    EthSign,
    /// `personal_sign`
    #[strum(serialize = "personal_sign")]
    PersonalSign,
    /// `eth_signTypedData`, unversioned
    #[strum(serialize = "eth_signTypedData")]
    EthSignTypedData,
    /// `eth_signTypedData_v3`
    #[strum(serialize = "eth_signTypedData_v3")]
    EthSignTypedDataV3,
    /// `eth_signTypedData_v4`
    #[strum(serialize = "eth_signTypedData_v4")]
    EthSignTypedDataV4,
    /// `wallet_watchAsset`
    #[strum(serialize = "wallet_watchAsset")]
    WalletWatchAsset,
    /// `wallet_addEthereumChain`
    #[strum(serialize = "wallet_addEthereumChain")]
    WalletAddEthereumChain,
    /// `wallet_switchEthereumChain`
    #[strum(serialize = "wallet_switchEthereumChain")]
    WalletSwitchEthereumChain,
}

impl KnownMethod {
    /// Parse a method name, `None` for methods outside this set
    pub fn parse(method: &str) -> Option<Self> {
        method.parse().ok()
    }

    /// Methods that add or activate a chain
    pub fn is_chain_switch(self) -> bool {
        matches!(
            self,
            KnownMethod::WalletAddEthereumChain | KnownMethod::WalletSwitchEthereumChain
        )
    }

    /// Methods that prompt the user for a signature
    pub fn is_signing(self) -> bool {
        matches!(
            self,
            KnownMethod::EthSign
                | KnownMethod::PersonalSign
                | KnownMethod::EthSignTypedData
                | KnownMethod::EthSignTypedDataV3
                | KnownMethod::EthSignTypedDataV4
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainIdParam {
    chain_id: U64,
}

/// Inbound request delivered by the relay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Request id
    pub id: RequestId,
    /// Session topic the request arrived on
    pub topic: Topic,
    /// RPC method name
    pub method: String,
    /// Raw positional params
    #[serde(default)]
    pub params: Vec<Value>,
    /// Chain the peer declared for this request
    pub chain_id: CaipChainId,
    /// Origin attested by the relay's verification service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_origin: Option<String>,
}

impl SessionRequest {
    /// Known method, if any
    pub fn known_method(&self) -> Option<KnownMethod> {
        KnownMethod::parse(&self.method)
    }

    /// Numeric chain id from a `[{ "chainId": "0x.." }]` param list, as used by
    /// `wallet_switchEthereumChain` and `wallet_addEthereumChain`
    pub fn chain_id_param(&self) -> Result<u64, IdError> {
        let invalid = || IdError::InvalidChainId(Value::from(self.params.clone()).to_string());
        let first = self.params.first().ok_or_else(invalid)?;
        let param: ChainIdParam = serde_json::from_value(first.clone()).map_err(|_| invalid())?;
        Ok(param.chain_id.to::<u64>())
    }
}

/// Body of a terminal response
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    /// Success
    Result(Value),
    /// Failure
    Error(ErrorObjectOwned),
}

/// Terminal JSON-RPC response correlated to a request id
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    /// Request id
    pub id: RequestId,
    /// Always `2.0`
    pub jsonrpc: String,
    /// Result or error
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl JsonRpcResponse {
    /// Success response
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            jsonrpc: JSONRPC_VERSION.to_string(),
            payload: ResponsePayload::Result(result),
        }
    }

    /// Error response
    pub fn error(id: RequestId, error: ErrorObjectOwned) -> Self {
        Self {
            id,
            jsonrpc: JSONRPC_VERSION.to_string(),
            payload: ResponsePayload::Error(error),
        }
    }

    /// Result value of a success response
    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result(value) => Some(value),
            ResponsePayload::Error(_) => None,
        }
    }

    /// Error object of an error response
    pub fn error_object(&self) -> Option<&ErrorObjectOwned> {
        match &self.payload {
            ResponsePayload::Result(_) => None,
            ResponsePayload::Error(error) => Some(error),
        }
    }
}

/// Named event emitted on a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Event name, e.g. `chainChanged`
    pub name: String,
    /// Event payload
    pub data: Value,
}

impl SessionEvent {
    /// `chainChanged` with the numeric chain id as payload
    pub fn chain_changed(chain_id: u64) -> Self {
        Self {
            name: CHAIN_CHANGED_EVENT.to_string(),
            data: Value::from(chain_id),
        }
    }
}
