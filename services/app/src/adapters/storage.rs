//! services/app/src/adapters/storage.rs
//!
//! File-backed implementation of the `StorageService` port: one JSON file per
//! logical key under a data directory, standing in for the browser's local
//! storage. Writes go through a temp file and a rename so a crash mid-write
//! never leaves a half-written blob behind.

use std::io::ErrorKind;
use std::path::PathBuf;
use studyspark_core::ports::{PortError, PortResult, StorageService};

pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates the data directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> PortResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageService for FileStorage {
    fn load(&self, key: &str) -> PortResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    fn save(&self, key: &str, raw: &str) -> PortResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).map_err(|e| PortError::Unexpected(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| PortError::Unexpected(e.to_string()))
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            // Removing an absent key is already the desired end state.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        assert_eq!(storage.load("studyspark_guides").unwrap(), None);

        storage.save("studyspark_guides", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(
            storage.load("studyspark_guides").unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );

        storage.remove("studyspark_guides").unwrap();
        assert_eq!(storage.load("studyspark_guides").unwrap(), None);
        // Removing again stays a no-op.
        storage.remove("studyspark_guides").unwrap();
    }

    #[test]
    fn save_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        storage.save("studyspark_user", r#"{"name":"Ada"}"#).unwrap();
        storage.save("studyspark_user", r#"{"name":"Grace"}"#).unwrap();
        assert_eq!(
            storage.load("studyspark_user").unwrap().as_deref(),
            Some(r#"{"name":"Grace"}"#)
        );
    }

    #[test]
    fn keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        storage.save("studyspark_guides", "[1]").unwrap();
        storage.save("studyspark_quizzes", "[2]").unwrap();
        storage.remove("studyspark_guides").unwrap();
        assert_eq!(storage.load("studyspark_quizzes").unwrap().as_deref(), Some("[2]"));
    }
}
