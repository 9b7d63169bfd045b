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

//! Replay output, one JSON object per line

use parking_lot::Mutex;
use peerlink_types::{
    wallet::{ForwardedRequest, SecurityRequest, TransactionMeta},
    CaipChainId, JsonRpcResponse, Namespaces, SessionEvent, Topic,
};
use serde::Serialize;
use tracing::warn;

/// Something the session manager did to the outside world
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub(crate) enum ReplayOutput<'a> {
    Response {
        topic: &'a Topic,
        response: &'a JsonRpcResponse,
    },
    SessionEvent {
        topic: &'a Topic,
        event: &'a SessionEvent,
        chain_id: &'a CaipChainId,
    },
    SessionUpdate {
        topic: &'a Topic,
        namespaces: &'a Namespaces,
    },
    Forwarded {
        request: &'a ForwardedRequest,
    },
    SecurityCheck {
        request: &'a SecurityRequest,
        meta: &'a TransactionMeta,
    },
    Ui {
        action: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<&'a str>,
    },
}

/// Collects replay output and optionally echoes it to stdout
#[derive(Debug, Default)]
pub(crate) struct OutputSink {
    lines: Mutex<Vec<String>>,
    echo: bool,
}

impl OutputSink {
    pub(crate) fn stdout() -> Self {
        Self {
            lines: Mutex::default(),
            echo: true,
        }
    }

    pub(crate) fn record(&self, output: ReplayOutput<'_>) {
        let line = match serde_json::to_string(&output) {
            Ok(line) => line,
            Err(error) => {
                warn!("Could not serialize replay output {output:?}: {error}");
                return;
            }
        };
        if self.echo {
            println!("{line}");
        }
        self.lines.lock().push(line);
    }

    #[cfg(test)]
    pub(crate) fn values(&self) -> Vec<serde_json::Value> {
        self.lines
            .lock()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}
