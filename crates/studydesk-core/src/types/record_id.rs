// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::timestamp::Timestamp;

/// Number of hex digits kept from the hash when deriving an identifier.
const ID_LENGTH: usize = 16;

/// An opaque identifier for a stored record.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn new(s: impl Into<String>) -> Fallible<Self> {
        let s: String = s.into();
        if s.trim().is_empty() {
            return fail("record identifier must not be empty");
        }
        Ok(Self(s))
    }

    /// Derives an identifier from the record's kind, a label, its creation
    /// time, and a salt that tells apart records created in the same
    /// millisecond.
    pub fn derive(kind: &str, label: &str, created_at: Timestamp, salt: u64) -> Self {
        let millis = created_at.as_millis().to_string();
        let salt = salt.to_string();
        let mut hasher = blake3::Hasher::new();
        for part in [kind, label, millis.as_str(), salt.as_str()] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        let hex = hasher.finalize().to_hex();
        Self(hex.as_str()[..ID_LENGTH].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::new(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RecordId::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> String {
        id.0
    }
}
