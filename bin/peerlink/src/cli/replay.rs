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

use anyhow::Context;
use clap::Args;
use peerlink_session::{SessionManager, SessionSettings, WalletContext};
use peerlink_utils::emit::{self, EVENT_CHANNEL_CAPACITY};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{
    fixture::{Fixture, Step},
    json::get_json_config,
    output::OutputSink,
    wallet::{ReplayRelay, ReplayScreen, ReplayWallet},
};

/// CLI options for the replay command
#[derive(Debug, Args)]
#[command(next_help_heading = "Replay")]
pub(super) struct ReplayCliArgs {
    /// Path to the JSON fixture describing the session, wallet and steps
    #[arg(long = "fixture", name = "fixture", env = "REPLAY_FIXTURE")]
    fixture: String,

    /// Time to let background work settle after the last step
    #[arg(
        long = "settle_millis",
        name = "settle_millis",
        env = "REPLAY_SETTLE_MILLIS",
        default_value = "500"
    )]
    settle_millis: u64,
}

pub(super) async fn run(args: ReplayCliArgs, settings: SessionSettings) -> anyhow::Result<()> {
    let fixture: Fixture =
        get_json_config(&args.fixture).context("replay fixture should parse")?;
    let sink = Arc::new(OutputSink::stdout());
    replay(
        fixture,
        settings,
        sink,
        Duration::from_millis(args.settle_millis),
    )
    .await
}

/// Drive a session manager through the fixture's steps against in-memory
/// wallet services
pub(crate) async fn replay(
    fixture: Fixture,
    settings: SessionSettings,
    sink: Arc<OutputSink>,
    settle: Duration,
) -> anyhow::Result<()> {
    let wallet = Arc::new(ReplayWallet::new(fixture.wallet, Arc::clone(&sink)));
    let screen = Arc::new(ReplayScreen::new(Arc::clone(&sink)));
    let ctx = WalletContext {
        transport: Arc::new(ReplayRelay::new(fixture.pending, Arc::clone(&sink))),
        permissions: wallet.clone(),
        networks: wallet.clone(),
        transactions: wallet.clone(),
        security: wallet.clone(),
        rpc_handler: wallet.clone(),
        navigator: screen.clone(),
        linker: screen,
    };

    let (event_sender, event_receiver) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let event_logger =
        emit::log_session_events(event_receiver, Some(fixture.session.topic.clone()));

    let manager = SessionManager::new(fixture.session, settings, ctx, event_sender);
    info!("Replaying session {}", manager.topic());
    let watcher = manager.start().await;

    for step in fixture.steps {
        debug!("Replay step: {step:?}");
        match step {
            Step::Request(request) => {
                if let Err(error) = manager.handle_request(request).await {
                    warn!("Request failed: {error}");
                }
            }
            Step::Approve { id, result } => {
                if let Err(error) = manager.approve(id, result).await {
                    manager.reject(id, error).await;
                }
            }
            Step::Reject { id, message } => manager.reject(id, message).await,
            Step::SelectChain(chain_id) => wallet.select_chain(chain_id),
            Step::UpdateSession { chain_id, accounts } => {
                manager.update_session(chain_id, accounts).await
            }
            Step::EmitEvent { name, chain_id } => {
                if let Err(error) = manager.emit_event(&name, chain_id).await {
                    warn!("Event {name} failed: {error}");
                }
            }
            Step::Wait(millis) => tokio::time::sleep(Duration::from_millis(millis)).await,
        }
    }

    tokio::time::sleep(settle).await;
    manager.close();
    watcher.await.context("wallet watcher should shut down")?;

    // the event channel closes once the manager is gone
    drop(manager);
    let logged = event_logger.await.context("event logger should finish")?;
    debug!("Logged {logged} session events");

    Ok(())
}
