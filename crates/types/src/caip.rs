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

use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Namespace key of the EVM protocol family
pub const EIP155_NAMESPACE: &str = "eip155";

/// Error parsing a CAIP identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Malformed CAIP-2 chain id
    #[error("invalid chain id: {0}")]
    InvalidChainId(String),
    /// Malformed CAIP-10 account id
    #[error("invalid account id: {0}")]
    InvalidAccountId(String),
}

/// CAIP-2 chain identifier, `<namespace>:<reference>`
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct CaipChainId {
    namespace: String,
    reference: String,
}

impl CaipChainId {
    /// Create a chain id from its two components
    pub fn new(namespace: impl Into<String>, reference: impl Into<String>) -> Result<Self, IdError> {
        let namespace = namespace.into();
        let reference = reference.into();
        if !valid_component(&namespace) || !valid_component(&reference) {
            return Err(IdError::InvalidChainId(format!("{namespace}:{reference}")));
        }
        Ok(Self {
            namespace,
            reference,
        })
    }

    /// EVM chain id
    pub fn eip155(chain_id: u64) -> Self {
        Self {
            namespace: EIP155_NAMESPACE.to_string(),
            reference: chain_id.to_string(),
        }
    }

    /// Namespace component, e.g. `eip155`
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Reference component, e.g. `137`
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Numeric chain id if this is a well-formed EVM chain
    pub fn eip155_reference(&self) -> Option<u64> {
        if self.namespace != EIP155_NAMESPACE {
            return None;
        }
        self.reference.parse().ok()
    }
}

impl fmt::Display for CaipChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

impl FromStr for CaipChainId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, reference) = s
            .split_once(':')
            .ok_or_else(|| IdError::InvalidChainId(s.to_string()))?;
        Self::new(namespace, reference).map_err(|_| IdError::InvalidChainId(s.to_string()))
    }
}

/// CAIP-10 account identifier, `<namespace>:<reference>:<address>`
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct AccountId {
    chain_id: CaipChainId,
    address: String,
}

impl AccountId {
    /// Qualify an address under a chain
    pub fn new(chain_id: CaipChainId, address: impl Into<String>) -> Self {
        Self {
            chain_id,
            address: address.into(),
        }
    }

    /// Chain qualifier
    pub fn chain_id(&self) -> &CaipChainId {
        &self.chain_id
    }

    /// Unqualified address
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.address)
    }
}

impl FromStr for AccountId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdError::InvalidAccountId(s.to_string());
        let (chain, address) = s.rsplit_once(':').ok_or_else(invalid)?;
        if !valid_component(address) {
            return Err(invalid());
        }
        let chain_id = chain.parse().map_err(|_| invalid())?;
        Ok(Self::new(chain_id, address))
    }
}

fn valid_component(s: &str) -> bool {
    !s.is_empty() && !s.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain_id() {
        let id: CaipChainId = "eip155:137".parse().unwrap();
        assert_eq!(id, CaipChainId::eip155(137));
        assert_eq!(id.eip155_reference(), Some(137));
        assert_eq!(id.to_string(), "eip155:137");
    }

    #[test]
    fn test_non_evm_chain_has_no_numeric_reference() {
        let id: CaipChainId = "solana:4sGjMW1sUnHzSxGspuhpqLDx6wiyjNtZ".parse().unwrap();
        assert_eq!(id.namespace(), "solana");
        assert_eq!(id.eip155_reference(), None);
    }

    #[test]
    fn test_parse_chain_id_rejects_malformed() {
        assert!("eip155".parse::<CaipChainId>().is_err());
        assert!("eip155:".parse::<CaipChainId>().is_err());
        assert!(":1".parse::<CaipChainId>().is_err());
        assert!("eip155:1:2".parse::<CaipChainId>().is_err());
    }

    #[test]
    fn test_parse_account_id() {
        let account: AccountId = "eip155:1:0xab16a96d359ec26a11e2c2b3d8f8b8942d5bfcdb"
            .parse()
            .unwrap();
        assert_eq!(account.chain_id(), &CaipChainId::eip155(1));
        assert_eq!(account.address(), "0xab16a96d359ec26a11e2c2b3d8f8b8942d5bfcdb");
        assert!("eip155:0xab".parse::<AccountId>().is_err());
        assert!("eip155:1:".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_serde_as_strings() {
        let account = AccountId::new(CaipChainId::eip155(10), "0xab");
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, "\"eip155:10:0xab\"");
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
    }
}
