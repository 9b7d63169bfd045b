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

use std::sync::Arc;

use peerlink_types::{
    wallet::{NetworkSelector, PermissionStore},
    CaipChainId,
};
use tracing::{debug, warn};

/// Outcome of a permission check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The origin holds a grant for the chain
    Granted,
    /// No grant, but the request may switch to a chain the wallet knows
    SwitchAllowed,
    /// The request must be refused
    Denied,
}

impl Admission {
    /// Whether the request may proceed
    pub fn is_admitted(self) -> bool {
        !matches!(self, Admission::Denied)
    }
}

/// Decides whether an origin may act on a chain
pub struct PermissionGate {
    permissions: Arc<dyn PermissionStore>,
    networks: Arc<dyn NetworkSelector>,
}

impl PermissionGate {
    /// Create a gate over the wallet's permission store and network selector
    pub fn new(permissions: Arc<dyn PermissionStore>, networks: Arc<dyn NetworkSelector>) -> Self {
        Self {
            permissions,
            networks,
        }
    }

    /// Check `origin` against `chain_id`. With `allow_switch`, a chain the
    /// wallet has a network for is admitted even without a grant. A failing
    /// permission store denies.
    pub async fn check_access(
        &self,
        origin: &str,
        chain_id: &CaipChainId,
        allow_switch: bool,
    ) -> Admission {
        let permitted = match self.permissions.permitted_chains(origin).await {
            Ok(chains) => chains,
            Err(error) => {
                warn!("Could not read permitted chains for {origin}: {error:?}");
                return Admission::Denied;
            }
        };

        if permitted.contains(chain_id) {
            return Admission::Granted;
        }

        if allow_switch
            && chain_id
                .eip155_reference()
                .and_then(|id| self.networks.network_client_id(id))
                .is_some()
        {
            return Admission::SwitchAllowed;
        }

        debug!("Origin {origin} has no grant for {chain_id}");
        Admission::Denied
    }
}
