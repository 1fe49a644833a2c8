use std::path::{Path, PathBuf};

use crate::{
    config_db::{CATALOG_PATH_SETTING, ConfigDb},
    error::{Error, Result},
};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "VENUEDEX_DATA_DIR";

/// Environment variable overriding the catalog document path.
pub const CATALOG_ENV: &str = "VENUEDEX_CATALOG";

/// File name of the catalog inside the data directory.
pub const DEFAULT_CATALOG_FILE: &str = "ccf.json";

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the data directory from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The VENUEDEX_DATA_DIR environment variable
    /// 3. The XDG data directory (~/.local/share/venuedex/)
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Ok(val) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(val)
        } else {
            xdg::BaseDirectories::with_prefix("venuedex")
                .get_data_home()
                .ok_or_else(|| {
                    Error::Config(
                        "could not determine XDG data home directory".into(),
                    )
                })?
        };

        std::fs::create_dir_all(&root)
            .map_err(|_| Error::DataDir(root.clone()))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_db(&self) -> PathBuf {
        self.root.join("config.redb")
    }

    pub fn default_catalog(&self) -> PathBuf {
        self.root.join(DEFAULT_CATALOG_FILE)
    }

    /// Resolve the catalog document from, in order of priority:
    /// 1. An explicit path (from --catalog)
    /// 2. The VENUEDEX_CATALOG environment variable
    /// 3. The `catalog_path` setting in config.redb
    /// 4. `ccf.json` inside the data directory
    pub fn catalog_path(
        &self,
        explicit: Option<&Path>,
        config_db: &ConfigDb,
    ) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Ok(val) = std::env::var(CATALOG_ENV) {
            return Ok(PathBuf::from(val));
        }
        if let Some(stored) = config_db.get_setting(CATALOG_PATH_SETTING)? {
            return Ok(PathBuf::from(stored));
        }
        Ok(self.default_catalog())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_with_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve(Some(tmp.path())).unwrap();

        assert_eq!(dir.root(), tmp.path());
        assert_eq!(dir.config_db(), tmp.path().join("config.redb"));
        assert_eq!(dir.default_catalog(), tmp.path().join("ccf.json"));
    }

    #[test]
    fn resolve_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        let dir = DataDir::resolve(Some(&nested)).unwrap();
        assert!(dir.root().is_dir());
    }

    #[test]
    fn catalog_path_prefers_explicit_then_setting() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve(Some(tmp.path())).unwrap();
        let db = ConfigDb::open(&dir.config_db()).unwrap();
        let explicit = tmp.path().join("explicit.json");

        assert_eq!(
            dir.catalog_path(Some(&explicit), &db).unwrap(),
            explicit
        );

        // The environment variable sits between these two sources; it is
        // not set while tests run.
        if std::env::var(CATALOG_ENV).is_err() {
            assert_eq!(
                dir.catalog_path(None, &db).unwrap(),
                dir.default_catalog()
            );

            db.set_setting(CATALOG_PATH_SETTING, "/srv/venues.json").unwrap();
            assert_eq!(
                dir.catalog_path(None, &db).unwrap(),
                PathBuf::from("/srv/venues.json")
            );
        }
    }
}
