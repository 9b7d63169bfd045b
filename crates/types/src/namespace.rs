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

use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::{AccountId, CaipChainId};

/// Namespace invariant violation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    /// An account is qualified by a chain the namespace does not grant
    #[error("account {0} is qualified by a chain outside the namespace")]
    AccountChainNotGranted(AccountId),
    /// A chain was filed under a namespace key other than its own
    #[error("chain {chain} does not belong to namespace {key}")]
    ChainOutsideNamespace {
        /// Namespace key
        key: String,
        /// Offending chain
        chain: CaipChainId,
    },
}

/// Grants for one protocol family.
///
/// Set members keep their first-insertion order so the wire output is stable.
/// Equality is set equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Permitted chains
    #[serde(default)]
    pub chains: IndexSet<CaipChainId>,
    /// Permitted accounts, each qualified by a chain
    #[serde(default)]
    pub accounts: IndexSet<AccountId>,
    /// Permitted RPC methods
    #[serde(default)]
    pub methods: IndexSet<String>,
    /// Permitted session events
    #[serde(default)]
    pub events: IndexSet<String>,
}

impl Namespace {
    /// Returns a copy with `chain_id` granted and every known address
    /// re-qualified under it. Adding a chain that is already present only
    /// fills in missing account qualifications.
    pub fn merge_chain(&self, chain_id: &CaipChainId) -> Namespace {
        let mut merged = self.clone();
        merged.chains.insert(chain_id.clone());
        for address in self.accounts_only() {
            merged
                .accounts
                .insert(AccountId::new(chain_id.clone(), address));
        }
        merged
    }

    /// Unqualified addresses, de-duplicated across chains
    pub fn accounts_only(&self) -> IndexSet<String> {
        self.accounts
            .iter()
            .map(|account| account.address().to_string())
            .collect()
    }

    /// True if the chain is granted
    pub fn has_chain(&self, chain_id: &CaipChainId) -> bool {
        self.chains.contains(chain_id)
    }

    /// Check that every account's chain qualifier is granted
    pub fn validate(&self) -> Result<(), NamespaceError> {
        match self
            .accounts
            .iter()
            .find(|account| !self.chains.contains(account.chain_id()))
        {
            Some(account) => Err(NamespaceError::AccountChainNotGranted(account.clone())),
            None => Ok(()),
        }
    }
}

/// Namespace grants of a session keyed by protocol family (e.g. `eip155`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespaces(BTreeMap<String, Namespace>);

impl Namespaces {
    /// Get the namespace for a protocol family
    pub fn get(&self, key: &str) -> Option<&Namespace> {
        self.0.get(key)
    }

    /// Insert or replace the namespace for a protocol family
    pub fn insert(&mut self, key: impl Into<String>, namespace: Namespace) -> Option<Namespace> {
        self.0.insert(key.into(), namespace)
    }

    /// Iterate over all namespaces
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Namespace)> {
        self.0.iter()
    }

    /// Returns a copy where the namespace owning `chain_id` has been merged
    /// with it, see [`Namespace::merge_chain`]. A missing namespace is
    /// created empty first.
    pub fn merge_chain(&self, chain_id: &CaipChainId) -> Namespaces {
        let mut merged = self.clone();
        let key = chain_id.namespace();
        let namespace = self.get(key).cloned().unwrap_or_default();
        merged.insert(key, namespace.merge_chain(chain_id));
        merged
    }

    /// True if any namespace grants the chain
    pub fn has_chain(&self, chain_id: &CaipChainId) -> bool {
        self.get(chain_id.namespace())
            .is_some_and(|namespace| namespace.has_chain(chain_id))
    }

    /// Validate every namespace
    pub fn validate(&self) -> Result<(), NamespaceError> {
        for (key, namespace) in &self.0 {
            if let Some(chain) = namespace.chains.iter().find(|c| c.namespace() != key) {
                return Err(NamespaceError::ChainOutsideNamespace {
                    key: key.clone(),
                    chain: chain.clone(),
                });
            }
            namespace.validate()?;
        }
        Ok(())
    }
}

impl FromIterator<(String, Namespace)> for Namespaces {
    fn from_iter<T: IntoIterator<Item = (String, Namespace)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(chain: u64, address: &str) -> AccountId {
        AccountId::new(CaipChainId::eip155(chain), address)
    }

    fn evm_namespace(chains: &[u64], accounts: &[AccountId]) -> Namespace {
        Namespace {
            chains: chains.iter().copied().map(CaipChainId::eip155).collect(),
            accounts: accounts.iter().cloned().collect(),
            methods: ["eth_sendTransaction".to_string()].into_iter().collect(),
            events: ["chainChanged".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn test_merge_chain_requalifies_accounts() {
        let ns = evm_namespace(&[1], &[account(1, "0xAB")]);

        let merged = ns.merge_chain(&CaipChainId::eip155(137));

        assert_eq!(
            merged.chains,
            IndexSet::from([CaipChainId::eip155(1), CaipChainId::eip155(137)])
        );
        assert_eq!(
            merged.accounts,
            IndexSet::from([account(1, "0xAB"), account(137, "0xAB")])
        );
        assert_eq!(merged.methods, ns.methods);
        assert_eq!(merged.events, ns.events);
        merged.validate().unwrap();
    }

    #[test]
    fn test_merge_chain_is_idempotent() {
        let ns = evm_namespace(&[1, 137], &[account(1, "0xAB"), account(137, "0xAB")]);
        let merged = ns.merge_chain(&CaipChainId::eip155(137));
        assert_eq!(merged, ns);
        assert_eq!(merged.accounts.len(), 2);
        assert_eq!(merged.merge_chain(&CaipChainId::eip155(137)), merged);
    }

    #[test]
    fn test_merge_chain_preserves_insertion_order() {
        let ns = evm_namespace(&[10, 1], &[account(10, "0xCD"), account(1, "0xAB")]);
        let merged = ns.merge_chain(&CaipChainId::eip155(5));
        let chains: Vec<String> = merged.chains.iter().map(|c| c.to_string()).collect();
        assert_eq!(chains, vec!["eip155:10", "eip155:1", "eip155:5"]);
        let accounts: Vec<String> = merged.accounts.iter().map(|a| a.to_string()).collect();
        assert_eq!(
            accounts,
            vec!["eip155:10:0xCD", "eip155:1:0xAB", "eip155:5:0xCD", "eip155:5:0xAB"]
        );
    }

    #[test]
    fn test_accounts_only_deduplicates() {
        let ns = evm_namespace(
            &[1, 10],
            &[account(1, "0xAB"), account(10, "0xAB"), account(10, "0xCD")],
        );
        let addresses: Vec<String> = ns.accounts_only().into_iter().collect();
        assert_eq!(addresses, vec!["0xAB", "0xCD"]);
    }

    #[test]
    fn test_validate_rejects_ungranted_account_chain() {
        let ns = evm_namespace(&[1], &[account(1, "0xAB"), account(5, "0xAB")]);
        assert_eq!(
            ns.validate(),
            Err(NamespaceError::AccountChainNotGranted(account(5, "0xAB")))
        );
    }

    #[test]
    fn test_namespaces_merge_creates_missing_family() {
        let namespaces = Namespaces::default();
        let merged = namespaces.merge_chain(&CaipChainId::eip155(137));
        let evm = merged.get("eip155").unwrap();
        assert!(evm.has_chain(&CaipChainId::eip155(137)));
        assert!(evm.accounts.is_empty());
        assert!(merged.has_chain(&CaipChainId::eip155(137)));
        merged.validate().unwrap();
    }

    #[test]
    fn test_namespaces_wire_format() {
        let json = serde_json::json!({
            "eip155": {
                "chains": ["eip155:1"],
                "accounts": ["eip155:1:0xAB"],
                "methods": ["personal_sign"],
                "events": ["chainChanged", "accountsChanged"]
            }
        });
        let namespaces: Namespaces = serde_json::from_value(json.clone()).unwrap();
        assert!(namespaces.has_chain(&CaipChainId::eip155(1)));
        assert_eq!(serde_json::to_value(&namespaces).unwrap(), json);
    }
}
