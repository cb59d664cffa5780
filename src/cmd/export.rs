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

use std::fs::write;

use serde::Serialize;

use crate::collection::Collection;
use crate::db::StoredCard;
use crate::db::StoredRevision;
use crate::error::Fallible;

#[derive(Serialize)]
struct ExportOutput {
    cards: Vec<StoredCard>,
    revisions: Vec<StoredRevision>,
}

pub fn export_collection(directory: Option<String>, output: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let export = ExportOutput {
        cards: coll.db.list_cards()?,
        revisions: coll.db.list_revisions()?,
    };
    let json = serde_json::to_string_pretty(&export)?;
    match output {
        Some(path) => {
            write(&path, json)?;
            log::debug!("Exported collection to {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use studydesk_core::Timestamp;

    use super::*;
    use crate::cmd::card::add_card;
    use crate::cmd::revision::add_revision;
    use crate::helper::create_tmp_directory;

    #[test]
    fn test_export() -> Fallible<()> {
        let directory = create_tmp_directory()?;
        let now = Timestamp::try_from("2024-05-01T09:00:00.000+00:00".to_string())?;
        add_card(Some(directory.clone()), "a".to_string(), "b".to_string(), now)?;
        add_revision(Some(directory.clone()), "c".to_string(), None, now)?;

        let output = format!("{directory}/export.json");
        export_collection(Some(directory), Some(output.clone()))?;
        let value: serde_json::Value = serde_json::from_str(&read_to_string(output)?)?;
        assert_eq!(value["cards"][0]["front"], "a");
        assert_eq!(value["cards"][0]["card"]["ease_factor"], 2.5);
        assert_eq!(value["cards"][0]["card"]["state"]["status"], "learning");
        assert_eq!(value["revisions"][0]["item"]["interval_days"], 1);
        assert_eq!(
            value["revisions"][0]["item"]["next_revision_date"],
            "2024-05-02T09:00:00.000+00:00"
        );
        Ok(())
    }
}
