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

use std::{sync::Arc, time::Duration};

use metrics::Counter;
use metrics_derive::Metrics;
use peerlink_types::ui::{HandBackCapabilities, Linker, Navigator};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A way of returning control to the peer application
#[async_trait::async_trait]
pub trait HandBackStrategy: Send + Sync {
    /// Hand control back. `peer_link` is the peer's preferred link, if it
    /// published one.
    async fn hand_back(&self, peer_link: Option<&str>);
}

/// Opens the peer's link directly, falling back to asking the user to
/// return by hand
pub struct DirectLinkHandBack {
    linker: Arc<dyn Linker>,
    navigator: Arc<dyn Navigator>,
}

impl DirectLinkHandBack {
    /// Create the strategy
    pub fn new(linker: Arc<dyn Linker>, navigator: Arc<dyn Navigator>) -> Self {
        Self { linker, navigator }
    }
}

#[async_trait::async_trait]
impl HandBackStrategy for DirectLinkHandBack {
    async fn hand_back(&self, peer_link: Option<&str>) {
        let Some(link) = peer_link else {
            debug!("Peer published no link, showing return prompt");
            self.navigator.show_return_prompt();
            return;
        };

        if let Err(error) = self.linker.open_url(link).await {
            warn!("{error}, showing return prompt");
            self.navigator.show_return_prompt();
        }
    }
}

/// Backgrounds the wallet so the platform surfaces the previous app
pub struct MinimizeHandBack {
    navigator: Arc<dyn Navigator>,
}

impl MinimizeHandBack {
    /// Create the strategy
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

#[async_trait::async_trait]
impl HandBackStrategy for MinimizeHandBack {
    async fn hand_back(&self, _peer_link: Option<&str>) {
        self.navigator.minimize();
    }
}

/// Pick the hand-back strategy the host supports
pub fn hand_back_strategy(
    capabilities: &HandBackCapabilities,
    linker: Arc<dyn Linker>,
    navigator: Arc<dyn Navigator>,
) -> Arc<dyn HandBackStrategy> {
    if capabilities.supports_direct_links() {
        Arc::new(DirectLinkHandBack::new(linker, navigator))
    } else {
        Arc::new(MinimizeHandBack::new(navigator))
    }
}

/// Schedules hand-backs after a response has gone out
pub struct RedirectCoordinator {
    strategy: Arc<dyn HandBackStrategy>,
    delay: Duration,
    metrics: RedirectMetrics,
}

impl RedirectCoordinator {
    /// Create a coordinator that waits `delay` before handing back
    pub fn new(strategy: Arc<dyn HandBackStrategy>, delay: Duration) -> Self {
        Self {
            strategy,
            delay,
            metrics: RedirectMetrics::default(),
        }
    }

    /// Schedule a hand-back. Does nothing unless the session was opened
    /// through a deep link.
    pub fn redirect(&self, deeplink: bool, peer_link: Option<String>) -> Option<JoinHandle<()>> {
        if !deeplink {
            return None;
        }

        self.metrics.redirects.increment(1);
        let strategy = Arc::clone(&self.strategy);
        let delay = self.delay;
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            strategy.hand_back(peer_link.as_deref()).await;
        }))
    }
}

#[derive(Metrics)]
#[metrics(scope = "session_redirect")]
struct RedirectMetrics {
    #[metric(describe = "the count of scheduled hand-backs.")]
    redirects: Counter,
}
