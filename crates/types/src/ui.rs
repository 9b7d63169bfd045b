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

#[cfg(feature = "test-utils")]
use mockall::automock;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::Topic;

/// Minimum iOS major version that opens app links directly
pub const IOS_DIRECT_LINK_MIN_VERSION: u32 = 17;

/// Failure to open a link
#[derive(Debug, thiserror::Error)]
#[error("could not open {url}: {reason}")]
pub struct LinkError {
    /// Link that failed
    pub url: String,
    /// Platform reason
    pub reason: String,
}

/// Host operating system family
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// iOS
    Ios,
    /// Android
    Android,
    /// Anything else
    #[default]
    Other,
}

/// Capabilities that decide how control is handed back to a peer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandBackCapabilities {
    /// Host platform
    pub platform: Platform,
    /// Host OS major version
    pub os_major_version: u32,
}

impl HandBackCapabilities {
    /// True if the host can open a peer's app link directly
    pub fn supports_direct_links(&self) -> bool {
        self.platform == Platform::Ios && self.os_major_version >= IOS_DIRECT_LINK_MIN_VERSION
    }
}

/// Wallet navigation layer
#[cfg_attr(feature = "test-utils", automock)]
pub trait Navigator: Send + Sync {
    /// A request arrived on the session and is being processed
    fn show_loading(&self, topic: &Topic);

    /// Ask the user to switch back to the peer app manually
    fn show_return_prompt(&self);

    /// Send the wallet to the background
    fn minimize(&self);
}

/// Opens external links
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait Linker: Send + Sync {
    /// Open a native or universal link
    async fn open_url(&self, url: &str) -> Result<(), LinkError>;
}
