//! Application settings.
//!
//! Only the data directory is configurable; the three table file names are
//! fixed.

use std::path::PathBuf;

use serde::Deserialize;

const USERS_FILE: &str = "users.csv";
const TASKS_FILE: &str = "tasks.csv";
const AUDIT_FILE: &str = "login_logout.csv";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolves settings from an optional `crm.toml` next to the working
    /// directory, overridden by `CRM_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .set_default("data_dir", ".")?
            .add_source(config::File::with_name("crm").required(false))
            .add_source(config::Environment::with_prefix("CRM"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// A config rooted at an explicit directory, bypassing file and
    /// environment sources.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    pub fn audit_file(&self) -> PathBuf {
        self.data_dir.join(AUDIT_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_paths_live_under_the_data_dir() {
        let config = Config::for_data_dir("/tmp/crm-data");

        assert_eq!(config.users_file(), PathBuf::from("/tmp/crm-data/users.csv"));
        assert_eq!(config.tasks_file(), PathBuf::from("/tmp/crm-data/tasks.csv"));
        assert_eq!(
            config.audit_file(),
            PathBuf::from("/tmp/crm-data/login_logout.csv")
        );
    }
}
