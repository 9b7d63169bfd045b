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

use std::{fs::File, io::BufReader};

use anyhow::Context;
use serde::de::DeserializeOwned;

/// Reads and deserializes a JSON file from a local path.
///
/// T must implement `serde::Deserialize`.
pub fn get_json_config<T>(path: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path).with_context(|| format!("should open {path}"))?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}
