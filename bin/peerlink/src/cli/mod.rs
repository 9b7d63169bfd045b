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

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use peerlink_session::SessionSettings;
use peerlink_types::ui::{HandBackCapabilities, Platform};

mod fixture;
mod json;
mod metrics;
mod output;
mod replay;
mod tracing;
mod wallet;

use replay::ReplayCliArgs;

/// Main entry point for the CLI
///
/// Parses the CLI arguments and runs the appropriate subcommand.
pub async fn run() -> anyhow::Result<()> {
    let opt = Cli::parse();
    let _guard = tracing::configure_logging(&opt.logs)?;
    tracing::info!("Parsed CLI options: {:#?}", opt);

    if let Some(port) = opt.metrics.port {
        let metrics_addr = format!("{}:{}", opt.metrics.host, port).parse()?;
        metrics::initialize(
            metrics_addr,
            opt.metrics.sample_interval_millis,
            &opt.metrics.tags,
        )
        .context("metrics server should start")?;
    }

    let settings = opt.session.settings();
    tracing::info!("Session settings: {:#?}", settings);

    match opt.command {
        Command::Replay(args) => replay::run(args, settings).await?,
    }

    tracing::info!("Shutdown, goodbye");
    Ok(())
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Command {
    /// Replay command
    ///
    /// Drives a session manager through a scripted fixture and prints every
    /// response, event and screen change as JSON lines
    #[command(name = "replay")]
    Replay(ReplayCliArgs),
}

/// CLI options for session behavior
#[derive(Debug, Args)]
#[command(next_help_heading = "Session")]
pub struct SessionArgs {
    /// Wait between a session namespace update and the chainChanged event
    #[arg(
        long = "session.chain_switch_grace_millis",
        name = "session.chain_switch_grace_millis",
        env = "SESSION_CHAIN_SWITCH_GRACE_MILLIS",
        default_value = "100",
        global = true
    )]
    chain_switch_grace_millis: u64,

    /// Wait between a response and handing control back to the peer
    #[arg(
        long = "session.redirect_delay_millis",
        name = "session.redirect_delay_millis",
        env = "SESSION_REDIRECT_DELAY_MILLIS",
        default_value = "100",
        global = true
    )]
    redirect_delay_millis: u64,

    /// Methods that hand control back to the peer once answered
    ///
    /// Format: method1,method2,... Defaults to the signing, transaction and
    /// chain management methods.
    #[arg(
        long = "session.redirect_methods",
        name = "session.redirect_methods",
        env = "SESSION_REDIRECT_METHODS",
        value_delimiter = ',',
        global = true
    )]
    redirect_methods: Vec<String>,

    /// Host platform, one of ios, android or other
    #[arg(
        long = "session.platform",
        name = "session.platform",
        env = "SESSION_PLATFORM",
        default_value = "other",
        global = true
    )]
    platform: Platform,

    /// Host OS major version
    #[arg(
        long = "session.os_major_version",
        name = "session.os_major_version",
        env = "SESSION_OS_MAJOR_VERSION",
        default_value = "0",
        global = true
    )]
    os_major_version: u32,
}

impl SessionArgs {
    fn settings(&self) -> SessionSettings {
        let mut settings = SessionSettings {
            chain_switch_grace: Duration::from_millis(self.chain_switch_grace_millis),
            redirect_delay: Duration::from_millis(self.redirect_delay_millis),
            hand_back: HandBackCapabilities {
                platform: self.platform,
                os_major_version: self.os_major_version,
            },
            ..Default::default()
        };
        if !self.redirect_methods.is_empty() {
            settings.redirect_methods = self.redirect_methods.iter().cloned().collect::<HashSet<_>>();
        }
        settings
    }
}

/// CLI options for the metrics server
#[derive(Debug, Args)]
#[command(next_help_heading = "Metrics")]
pub struct MetricsArgs {
    /// Port to listen on for metrics requests
    ///
    /// If not provided, metrics are not exported
    #[arg(
        long = "metrics.port",
        name = "metrics.port",
        env = "METRICS_PORT",
        global = true
    )]
    port: Option<u16>,

    /// Host to listen on for metrics requests
    #[arg(
        long = "metrics.host",
        name = "metrics.host",
        env = "METRICS_HOST",
        default_value = "0.0.0.0",
        global = true
    )]
    host: String,

    /// Tags for metrics
    ///
    /// Format: key1=value1,key2=value2,...
    #[arg(
        long = "metrics.tags",
        name = "metrics.tags",
        env = "METRICS_TAGS",
        default_values_t = Vec::<String>::new(),
        value_delimiter = ',',
        global = true
    )]
    tags: Vec<String>,

    /// Sample interval for process metrics
    #[arg(
        long = "metrics.sample_interval_millis",
        name = "metrics.sample_interval_millis",
        env = "METRICS_SAMPLE_INTERVAL_MILLIS",
        default_value = "1000",
        global = true
    )]
    sample_interval_millis: u64,
}

/// CLI options for logging
#[derive(Debug, Args)]
#[command(next_help_heading = "Logging")]
pub struct LogsArgs {
    /// Log file
    ///
    /// If not provided, logs will be written to stderr
    #[arg(
        long = "log.file",
        name = "log.file",
        env = "LOG_FILE",
        default_value = None,
        global = true
    )]
    file: Option<String>,

    /// Log JSON
    ///
    /// If set, logs will be written in JSON format
    #[arg(
        long = "log.json",
        name = "log.json",
        env = "LOG_JSON",
        required = false,
        num_args = 0,
        global = true
    )]
    json: bool,

    /// Log filter
    ///
    /// Filter directives in `RUST_LOG` syntax, e.g. `peerlink_session=debug,info`
    #[arg(
        long = "log.filter",
        name = "log.filter",
        env = "RUST_LOG",
        default_value = "info",
        global = true
    )]
    filter: String,
}

/// CLI options
#[derive(Debug, Parser)]
#[command(name = "peerlink", version)]
pub struct Cli {
    #[clap(subcommand)]
    command: Command,

    #[clap(flatten)]
    session: SessionArgs,

    #[clap(flatten)]
    metrics: MetricsArgs,

    #[clap(flatten)]
    logs: LogsArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_settings_from_args() {
        let cli = Cli::try_parse_from([
            "peerlink",
            "replay",
            "--fixture",
            "fixture.json",
            "--session.platform",
            "ios",
            "--session.os_major_version",
            "17",
            "--session.redirect_methods",
            "personal_sign,eth_sendTransaction",
        ])
        .unwrap();

        let settings = cli.session.settings();
        assert!(settings.hand_back.supports_direct_links());
        assert_eq!(settings.redirect_methods.len(), 2);
        assert!(settings.redirect_methods.contains("personal_sign"));
        assert_eq!(settings.chain_switch_grace, Duration::from_millis(100));
        assert!(cli.metrics.port.is_none());
    }
}
