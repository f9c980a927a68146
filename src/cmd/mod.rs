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

use std::path::Path;
use std::path::PathBuf;

use reviewkit_core::Fallible;

use crate::config::Config;
use crate::db::Database;

pub mod add;
pub mod rate;
pub mod session;
pub mod stats;

/// What every command needs: the loaded configuration and an open database.
pub struct Context {
    pub config: Config,
    pub db: Database,
}

impl Context {
    /// A `--database` flag takes precedence over the configured path.
    pub fn open(config: Option<&Path>, database: Option<PathBuf>) -> Fallible<Self> {
        let config = Config::load(config)?;
        let path = database.unwrap_or_else(|| config.database_path());
        let db = Database::open(&path)?;
        Ok(Self { config, db })
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        Ok(Self {
            config: Config::default(),
            db: Database::open_in_memory()?,
        })
    }
}
