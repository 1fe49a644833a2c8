use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::{error::Result, store::KeyValueStore};

type StrTable = TableDefinition<'static, &'static str, &'static str>;

const LOCAL_STORAGE: StrTable = TableDefinition::new("local_storage");
const SETTINGS: StrTable = TableDefinition::new("settings");

/// Setting holding the catalog document path.
pub const CATALOG_PATH_SETTING: &str = "catalog_path";

pub struct ConfigDb {
    db: Database,
}

impl ConfigDb {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(redb::Error::from)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(LOCAL_STORAGE)?;
        txn.open_table(SETTINGS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    fn put(&self, def: StrTable, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(def)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn fetch(&self, def: StrTable, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    fn delete(&self, def: StrTable, key: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(def)?;
            table.remove(key)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    // -- Settings --

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.put(SETTINGS, key, value)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.fetch(SETTINGS, key)
    }

    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        self.delete(SETTINGS, key)
    }
}

impl KeyValueStore for ConfigDb {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.fetch(LOCAL_STORAGE, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.put(LOCAL_STORAGE, key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.delete(LOCAL_STORAGE, key).map(|_| ())
    }
}

impl std::fmt::Debug for ConfigDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigDb").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, ConfigDb) {
        let tmp = tempfile::tempdir().unwrap();
        let db = ConfigDb::open(&tmp.path().join("config.redb")).unwrap();
        (tmp, db)
    }

    #[test]
    fn settings_crud() {
        let (_tmp, db) = test_db();

        assert_eq!(db.get_setting(CATALOG_PATH_SETTING).unwrap(), None);

        db.set_setting(CATALOG_PATH_SETTING, "/srv/ccf.json").unwrap();
        assert_eq!(
            db.get_setting(CATALOG_PATH_SETTING).unwrap(),
            Some("/srv/ccf.json".to_string())
        );

        assert!(db.remove_setting(CATALOG_PATH_SETTING).unwrap());
        assert!(!db.remove_setting(CATALOG_PATH_SETTING).unwrap());
    }

    #[test]
    fn local_storage_crud() {
        let (_tmp, db) = test_db();

        assert_eq!(db.get("selectedItems").unwrap(), None);
        db.set("selectedItems", "[]").unwrap();
        assert_eq!(db.get("selectedItems").unwrap(), Some("[]".to_string()));

        db.remove("selectedItems").unwrap();
        assert_eq!(db.get("selectedItems").unwrap(), None);
        db.remove("selectedItems").unwrap();
    }

    #[test]
    fn settings_and_storage_do_not_share_keys() {
        let (_tmp, db) = test_db();

        db.set("shared", "storage").unwrap();
        db.set_setting("shared", "setting").unwrap();

        assert_eq!(db.get("shared").unwrap(), Some("storage".to_string()));
        assert_eq!(
            db.get_setting("shared").unwrap(),
            Some("setting".to_string())
        );
    }

    #[test]
    fn reopen_preserves_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.redb");

        {
            let db = ConfigDb::open(&path).unwrap();
            db.set("selectedItems", "[\"AI/Conference/AAAI\"]").unwrap();
            db.set_setting(CATALOG_PATH_SETTING, "/data/ccf.json").unwrap();
        }

        {
            let db = ConfigDb::open(&path).unwrap();
            assert_eq!(
                db.get("selectedItems").unwrap(),
                Some("[\"AI/Conference/AAAI\"]".to_string())
            );
            assert_eq!(
                db.get_setting(CATALOG_PATH_SETTING).unwrap(),
                Some("/data/ccf.json".to_string())
            );
        }
    }
}
