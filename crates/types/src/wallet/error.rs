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

/// Result type for permission store lookups
pub type PermissionResult<T> = std::result::Result<T, PermissionError>;

/// Permission store failure
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    /// The store has no record of the origin
    #[error("no permissions recorded for origin {0}")]
    UnknownOrigin(String),
    /// Other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Transaction submission failure
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    /// Params could not be turned into a transaction
    #[error("invalid transaction params: {0}")]
    InvalidParams(String),
    /// The submission pipeline rejected the transaction, message is passed
    /// through verbatim
    #[error("{0}")]
    Rejected(String),
}
