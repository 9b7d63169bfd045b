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

use std::sync::Weak;

use futures_util::StreamExt;
use peerlink_types::wallet::WalletStateStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::manager::SessionManager;

/// Run [`SessionManager::on_wallet_state_changed`] for every wallet state
/// notification until `shutdown` fires, the stream ends, or the manager is
/// dropped
pub(crate) fn spawn(
    manager: Weak<SessionManager>,
    mut changes: WalletStateStream,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Wallet state watcher shutting down");
                    break;
                }
                change = changes.next() => {
                    if change.is_none() {
                        debug!("Wallet state stream ended");
                        break;
                    }
                    let Some(manager) = manager.upgrade() else {
                        break;
                    };
                    if let Err(error) = manager.on_wallet_state_changed().await {
                        warn!("Failed to follow wallet chain change: {error}");
                    }
                }
            }
        }
    })
}
