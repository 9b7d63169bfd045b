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

use std::io;

use anyhow::Context;
pub use tracing::*;
use tracing::subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use super::LogsArgs;

/// Install the global subscriber. Replay output owns stdout, so logs go to
/// stderr unless a file is configured.
pub fn configure_logging(config: &LogsArgs) -> anyhow::Result<WorkerGuard> {
    let filter = log_filter(&config.filter)?;
    let (writer, guard) = match &config.file {
        Some(log_file) => {
            tracing_appender::non_blocking(tracing_appender::rolling::never(".", log_file))
        }
        None => tracing_appender::non_blocking(io::stderr()),
    };

    let output: Box<dyn Layer<Registry> + Send + Sync> = if config.json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer()
            .compact()
            .with_ansi(config.file.is_none())
            .with_writer(writer)
            .boxed()
    };
    subscriber::set_global_default(Registry::default().with(output).with(filter))?;

    // Redirect logs from external crates using `log` to the tracing subscriber
    LogTracer::init()?;

    Ok(guard)
}

fn log_filter(directives: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_new(directives).with_context(|| format!("invalid log filter {directives:?}"))
}
