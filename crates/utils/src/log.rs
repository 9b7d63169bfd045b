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

//! Helpers for logging failures that are handled by dropping them

use std::fmt::{Debug, Display};

use tracing::Level;

/// Log the failure case of a result-like value and hand it back unchanged
pub trait LogOnError: Sized {
    /// Log at ERROR if this is a failure
    fn log_on_error<C: Display>(self, context: C) -> Self {
        self.log_on_error_level(Level::ERROR, context)
    }

    /// Log at the given level if this is a failure
    fn log_on_error_level<C: Display>(self, level: Level, context: C) -> Self;
}

impl<T, E: Debug> LogOnError for Result<T, E> {
    fn log_on_error_level<C: Display>(self, level: Level, context: C) -> Self {
        if let Err(error) = &self {
            log_at_level(level, &format!("{context}: {error:?}"));
        }
        self
    }
}

impl<T> LogOnError for Option<T> {
    fn log_on_error_level<C: Display>(self, level: Level, context: C) -> Self {
        if self.is_none() {
            log_at_level(level, &context.to_string());
        }
        self
    }
}

/// Best-effort operations whose failure is logged and dropped
pub trait LogAndDrop {
    /// Log a failure at WARN and discard the outcome
    fn warn_and_drop<C: Display>(self, context: C);
}

impl<T, E: Debug> LogAndDrop for Result<T, E> {
    fn warn_and_drop<C: Display>(self, context: C) {
        let _ = self.log_on_error_level(Level::WARN, context);
    }
}

fn log_at_level(level: Level, s: &str) {
    match level {
        Level::TRACE => tracing::trace!("{s}"),
        Level::DEBUG => tracing::debug!("{s}"),
        Level::INFO => tracing::info!("{s}"),
        Level::WARN => tracing::warn!("{s}"),
        Level::ERROR => tracing::error!("{s}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_pass_through() {
        let ok: Result<u8, String> = Ok(1);
        assert_eq!(ok.log_on_error("unused"), Ok(1));
        let err: Result<u8, String> = Err("boom".into());
        assert_eq!(err.log_on_error_level(Level::WARN, "op"), Err("boom".into()));
        assert_eq!(None::<u8>.log_on_error("missing"), None);
        assert_eq!(Some(2).log_on_error("unused"), Some(2));
    }
}
