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

use serde::{Deserialize, Serialize};

use crate::Namespaces;

/// JSON-RPC request id. Unique within a session at any instant, may be reused
/// across sessions.
pub type RequestId = u64;

/// Opaque session identifier used to route relay messages
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Create a topic
    pub fn new(topic: impl Into<String>) -> Self {
        Self(topic.into())
    }

    /// Topic as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Deep links declared by the peer for handing control back
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirects {
    /// Native app scheme link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<String>,
    /// Universal (https) link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universal: Option<String>,
}

impl Redirects {
    /// Preferred link: native first, universal otherwise
    pub fn peer_link(&self) -> Option<&str> {
        self.native.as_deref().or(self.universal.as_deref())
    }
}

/// Peer application metadata
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerMetadata {
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Declared origin URL, used as the permission key
    pub url: String,
    /// Icon references
    #[serde(default)]
    pub icons: Vec<String>,
    /// Hand-back links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirects>,
}

/// One live peer connection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session topic
    pub topic: Topic,
    /// Peer metadata
    pub peer: PeerMetadata,
    /// Granted namespaces
    #[serde(default)]
    pub namespaces: Namespaces,
    /// Whether the session was opened through a deep link
    #[serde(default)]
    pub deeplink: bool,
}

impl Session {
    /// Peer link to hand control back to, if any
    pub fn peer_link(&self) -> Option<&str> {
        self.peer.redirect.as_ref().and_then(Redirects::peer_link)
    }
}
