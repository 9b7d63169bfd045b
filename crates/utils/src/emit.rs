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

//! Fan-out of session manager events

use std::fmt::Display;

use peerlink_types::Topic;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Capacity of session event channels
pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// An event tagged with the session topic it happened on
#[derive(Clone, Debug)]
pub struct WithTopic<T> {
    /// Session topic
    pub topic: Topic,
    /// The event itself
    pub event: T,
}

/// Log session events at INFO until the channel closes.
///
/// With `only` set, events from other sessions are skipped. The task yields
/// the number of events it logged.
pub fn log_session_events<T>(
    mut rx: broadcast::Receiver<WithTopic<T>>,
    only: Option<Topic>,
) -> JoinHandle<usize>
where
    T: Clone + Display + Send + 'static,
{
    tokio::spawn(async move {
        let mut logged = 0;
        loop {
            match rx.recv().await {
                Ok(WithTopic { topic, event }) => {
                    if only.as_ref().is_some_and(|only| *only != topic) {
                        continue;
                    }
                    info!(%topic, "{event}");
                    logged += 1;
                }
                Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(count)) => {
                    warn!("Session event log lagged, missed {count} events")
                }
            }
        }
        debug!("Session event stream closed after {logged} events");
        logged
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(tx: &broadcast::Sender<WithTopic<u32>>, topic: &str, event: u32) {
        tx.send(WithTopic {
            topic: Topic::from(topic),
            event,
        })
        .unwrap();
    }

    #[tokio::test]
    async fn test_log_only_own_topic() {
        let (tx, rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let handle = log_session_events(rx, Some(Topic::from("abc")));

        send(&tx, "abc", 1);
        send(&tx, "other", 2);
        send(&tx, "abc", 3);
        drop(tx);

        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_log_every_topic() {
        let (tx, rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let handle = log_session_events(rx, None);

        send(&tx, "abc", 1);
        send(&tx, "other", 2);
        drop(tx);

        assert_eq!(handle.await.unwrap(), 2);
    }
}
