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

mod error;
pub use error::{PermissionError, PermissionResult, TransactionError};

mod traits;
#[cfg(feature = "test-utils")]
pub use traits::{
    MockNetworkSelector, MockPermissionStore, MockRpcHandler, MockSecurityCheck,
    MockTransactionSubmitter,
};
pub use traits::{
    NetworkSelector, PermissionStore, RpcHandler, SecurityCheck, TransactionSubmitter,
    WalletStateStream,
};

mod types;
pub use types::{
    ForwardedRequest, NetworkClientId, SecurityRequest, SecurityTxParams, SubmittedTransaction,
    TransactionMeta,
};
