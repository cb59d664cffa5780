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

use std::env::current_dir;
use std::path::PathBuf;

use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::error::fail;

/// A data directory: its configuration and its database.
pub struct Collection {
    pub directory: PathBuf,
    pub config: Config,
    pub db: Database,
}

impl Collection {
    /// Opens the collection in `directory`, or in the current directory if
    /// none is given.
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        if !directory.exists() {
            return fail("directory does not exist.");
        }
        let directory = directory.canonicalize()?;
        let config = Config::load(&directory)?;
        let db_path = directory.join(&config.database);
        log::debug!("Opening database at {}", db_path.display());
        let db = Database::new(&db_path)?;
        Ok(Self {
            directory,
            config,
            db,
        })
    }
}
