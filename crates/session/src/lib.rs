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

#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]
//! Wallet-side session management: admits peer requests, dispatches them to
//! wallet services, answers them, keeps the session's chain in step with the
//! wallet and hands control back to the peer application.

mod chain_switch;
pub use chain_switch::{ChainSwitchOutcome, ChainSwitchState, ChainSwitcher};

mod dispatcher;

mod emit;
pub use emit::SessionManagerEvent;

mod error;
pub use error::{
    chain_not_recognized, invalid_params, user_rejected, SessionError, SessionResult,
    CHAIN_NOT_RECOGNIZED_CODE, USER_REJECTED_CODE,
};

mod manager;
pub use manager::{SessionManager, WalletContext};

mod permission;
pub use permission::{Admission, PermissionGate};

mod redirect;
pub use redirect::{
    hand_back_strategy, DirectLinkHandBack, HandBackStrategy, MinimizeHandBack,
    RedirectCoordinator,
};

mod registry;
pub use registry::{PendingRequest, PendingRequestRegistry};

mod settings;
pub use settings::{SessionSettings, DEFAULT_CHAIN_SWITCH_GRACE, DEFAULT_REDIRECT_DELAY};

mod watcher;

#[cfg(test)]
mod test_utils;
