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

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use peerlink_types::{KnownMethod, RequestId, SessionRequest, Topic};

use crate::error::{SessionError, SessionResult};

/// A request that has been accepted for handling and not yet answered
#[derive(Clone, Debug, PartialEq)]
pub struct PendingRequest {
    request: SessionRequest,
}

impl PendingRequest {
    /// Request id
    pub fn id(&self) -> RequestId {
        self.request.id
    }

    /// Topic the response goes to
    pub fn topic(&self) -> &Topic {
        &self.request.topic
    }

    /// Method as sent by the peer
    pub fn method(&self) -> &str {
        &self.request.method
    }

    /// Method, if it is one the manager treats specially
    pub fn known_method(&self) -> Option<KnownMethod> {
        self.request.known_method()
    }

    /// The original request
    pub fn request(&self) -> &SessionRequest {
        &self.request
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    pending: HashMap<RequestId, PendingRequest>,
    // Outlives the pending entry: the flag is taken after the response is sent.
    redirect_owed: HashSet<RequestId>,
}

/// Pending requests of one session, keyed by request id
#[derive(Debug, Default)]
pub struct PendingRequestRegistry {
    inner: Mutex<RegistryInner>,
}

impl PendingRequestRegistry {
    /// Add a request, replacing any live entry with the same id
    pub fn register(&self, request: SessionRequest) -> Option<PendingRequest> {
        self.inner
            .lock()
            .pending
            .insert(request.id, PendingRequest { request })
    }

    /// Add a request unless one with the same id is live. Returns whether the
    /// request was added.
    pub fn try_register(&self, request: SessionRequest) -> bool {
        let mut inner = self.inner.lock();
        if inner.pending.contains_key(&request.id) {
            return false;
        }
        inner.pending.insert(request.id, PendingRequest { request });
        true
    }

    /// Copy of a live entry
    pub fn get(&self, id: RequestId) -> Option<PendingRequest> {
        self.inner.lock().pending.get(&id).cloned()
    }

    /// Remove and return a live entry
    pub fn resolve(&self, id: RequestId) -> SessionResult<PendingRequest> {
        self.inner
            .lock()
            .pending
            .remove(&id)
            .ok_or(SessionError::UnknownRequest(id))
    }

    /// Whether an entry with this id is live
    pub fn contains(&self, id: RequestId) -> bool {
        self.inner.lock().pending.contains_key(&id)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Whether there are no live entries
    pub fn is_empty(&self) -> bool {
        self.inner.lock().pending.is_empty()
    }

    /// Record that resolving this live request must hand control back to the
    /// peer. Returns false if the id is unknown.
    pub fn mark_redirect_owed(&self, id: RequestId) -> bool {
        let mut inner = self.inner.lock();
        if !inner.pending.contains_key(&id) {
            return false;
        }
        inner.redirect_owed.insert(id)
    }

    /// Clear the redirect flag, returning whether it was set
    pub fn take_redirect_owed(&self, id: RequestId) -> bool {
        self.inner.lock().redirect_owed.remove(&id)
    }

    /// Drop every entry and flag. Returns the number of dropped entries.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.redirect_owed.clear();
        let count = inner.pending.len();
        inner.pending.clear();
        count
    }
}
