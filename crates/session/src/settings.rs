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

use std::{collections::HashSet, time::Duration};

use peerlink_types::{ui::HandBackCapabilities, KnownMethod};

/// Default wait between a namespace update and the `chainChanged` event
pub const DEFAULT_CHAIN_SWITCH_GRACE: Duration = Duration::from_millis(100);
/// Default wait between a response and handing control back
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(100);

const DEFAULT_REDIRECT_METHODS: &[KnownMethod] = &[
    KnownMethod::EthRequestAccounts,
    KnownMethod::EthSendTransaction,
    KnownMethod::EthSignTransaction,
    KnownMethod::EthSign,
    KnownMethod::PersonalSign,
    KnownMethod::EthSignTypedData,
    KnownMethod::EthSignTypedDataV3,
    KnownMethod::EthSignTypedDataV4,
    KnownMethod::WalletWatchAsset,
    KnownMethod::WalletAddEthereumChain,
    KnownMethod::WalletSwitchEthereumChain,
];

/// Settings for a session manager
#[derive(Clone, Debug)]
pub struct SessionSettings {
    /// Wait after the namespace update is acknowledged before announcing
    /// the new chain
    pub chain_switch_grace: Duration,
    /// Wait after a response is sent before handing control back
    pub redirect_delay: Duration,
    /// Methods that owe the peer a hand-back once resolved
    pub redirect_methods: HashSet<String>,
    /// Methods that keep the wallet in front when queued next
    pub signing_methods: HashSet<String>,
    /// How control can be handed back on this host
    pub hand_back: HandBackCapabilities,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            chain_switch_grace: DEFAULT_CHAIN_SWITCH_GRACE,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            redirect_methods: DEFAULT_REDIRECT_METHODS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            signing_methods: DEFAULT_REDIRECT_METHODS
                .iter()
                .filter(|m| m.is_signing())
                .map(|m| m.to_string())
                .collect(),
            hand_back: HandBackCapabilities::default(),
        }
    }
}
