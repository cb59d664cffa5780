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
use crate::error::fail;

/// The user's self-assessed recall of a card.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Grade {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "again" => Ok(Grade::Again),
            "hard" => Ok(Grade::Hard),
            "good" => Ok(Grade::Good),
            "easy" => Ok(Grade::Easy),
            _ => fail(format!(
                "invalid grade '{s}': expected one of again, hard, good, easy"
            )),
        }
    }
}

impl TryFrom<String> for Grade {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use super::*;
    use crate::error::Fallible;

    #[test]
    fn test_grade_text_roundtrip() -> Fallible<()> {
        for grade in Grade::ALL {
            assert_eq!(grade, Grade::try_from(grade.as_str().to_string())?);
        }
        Ok(())
    }

    /// Test the serialization format of Grade.
    #[test]
    fn test_grade_serialization_format() -> Fallible<()> {
        let expected = ["again", "hard", "good", "easy"];
        for (grade, expected) in zip(Grade::ALL, expected) {
            let serialized = serde_json::to_string(&grade)?;
            assert_eq!(serialized, format!("\"{expected}\""));
        }
        Ok(())
    }

    #[test]
    fn test_invalid_grade_string() {
        for s in ["", "invalid", "Good", "forgot"] {
            let err = s.parse::<Grade>().unwrap_err();
            assert!(err.message().starts_with("invalid grade"));
        }
    }
}
