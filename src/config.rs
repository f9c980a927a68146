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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use reviewkit_core::ErrorKind;
use reviewkit_core::ErrorReport;
use reviewkit_core::Fallible;
use reviewkit_core::InterleavePolicy;
use reviewkit_core::SchedulerParams;
use reviewkit_core::interleave::DEFAULT_SESSION_SIZE;
use reviewkit_core::scheduler::EASE_FLOOR;
use serde::Deserialize;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "reviewkit.toml";

pub const DEFAULT_DATABASE_FILE: &str = "reviewkit.db";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: Option<PathBuf>,
    pub session: SessionConfig,
    pub scheduler: SchedulerParams,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub max_session_size: usize,
    pub max_run: usize,
    pub variant_threshold: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let policy = InterleavePolicy::default();
        Self {
            max_session_size: DEFAULT_SESSION_SIZE,
            max_run: policy.max_run,
            variant_threshold: policy.variant_threshold,
        }
    }
}

impl SessionConfig {
    pub fn policy(&self) -> InterleavePolicy {
        InterleavePolicy {
            max_run: self.max_run,
            variant_threshold: self.variant_threshold,
        }
    }
}

fn config_error(msg: impl Into<String>) -> ErrorReport {
    ErrorReport::with_kind(ErrorKind::Config, msg)
}

impl Config {
    /// Loads the configuration. An explicit path must exist; otherwise the
    /// default file is used if present, and built-in defaults if not.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        let path: PathBuf = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(config_error(format!(
                        "config file does not exist: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Config::default());
                }
                path
            }
        };
        log::debug!("Loading configuration from {}", path.display());
        let text = read_to_string(&path)?;
        Config::parse(&text)
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| config_error(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Fallible<()> {
        if self.session.max_run == 0 {
            return Err(config_error("session.max_run must be at least 1"));
        }
        let s = &self.scheduler;
        if s.min_ease < EASE_FLOOR {
            return Err(config_error(format!(
                "scheduler.min_ease must be at least {EASE_FLOOR}"
            )));
        }
        if s.initial_ease < s.min_ease {
            return Err(config_error(
                "scheduler.initial_ease must not be below scheduler.min_ease",
            ));
        }
        if s.fail_penalty < 0.0 || s.partial_penalty < 0.0 || s.full_bonus < 0.0 {
            return Err(config_error("scheduler adjustments must not be negative"));
        }
        if s.partial_growth < 1.0 {
            return Err(config_error("scheduler.partial_growth must be at least 1"));
        }
        if s.partial_second_interval == 0 || s.full_second_interval == 0 {
            return Err(config_error("scheduler second intervals must be at least 1 day"));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_empty_config_is_default() -> Fallible<()> {
        let config = Config::parse("")?;
        assert_eq!(config, Config::default());
        assert_eq!(config.session.max_session_size, 15);
        assert_eq!(config.database_path(), PathBuf::from("reviewkit.db"));
        Ok(())
    }

    #[test]
    fn test_partial_sections() -> Fallible<()> {
        let config = Config::parse(
            r#"
            database = "/tmp/review.db"

            [session]
            max_session_size = 20

            [scheduler]
            fail_penalty = 0.3
            "#,
        )?;
        assert_eq!(config.database_path(), PathBuf::from("/tmp/review.db"));
        assert_eq!(config.session.max_session_size, 20);
        assert_eq!(config.session.max_run, 2);
        assert_eq!(config.scheduler.fail_penalty, 0.3);
        assert_eq!(config.scheduler.full_second_interval, 6);
        Ok(())
    }

    #[test]
    fn test_unknown_key() {
        let err = Config::parse("[session]\nmax_sesion_size = 3\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_invalid_values() {
        for text in [
            "[session]\nmax_run = 0\n",
            "[scheduler]\nmin_ease = 0.0\n",
            "[scheduler]\ninitial_ease = 1.0\n",
            "[scheduler]\npartial_growth = 0.5\n",
            "[scheduler]\nmin_ease = 0.5\ninitial_ease = 1.0\n",
            "[scheduler]\nmin_ease = 1.29\n",
            "[scheduler]\nfull_second_interval = 0\n",
            "[scheduler]\npartial_second_interval = 0\n",
        ] {
            let err = Config::parse(text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{text}");
        }
    }

    #[test]
    fn test_stricter_floor_is_accepted() -> Fallible<()> {
        let config = Config::parse("[scheduler]\nmin_ease = 1.5\nfull_second_interval = 1\n")?;
        assert_eq!(config.scheduler.min_ease, 1.5);
        assert_eq!(config.scheduler.full_second_interval, 1);
        Ok(())
    }

    #[test]
    fn test_load_from_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("custom.toml");
        write(&path, "[session]\nvariant_threshold = 3.0\n")?;
        let config = Config::load(Some(&path))?;
        assert_eq!(config.session.policy().variant_threshold, 3.0);
        Ok(())
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("./derpherp.toml"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
