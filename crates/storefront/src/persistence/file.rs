//! Session storage backed by a directory of JSON files.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{PersistenceError, SessionStorage, check_slot};

/// Suffix of in-flight slot writes.
const TMP_SUFFIX: &str = ".tmp";

/// Session storage in a directory, one `<slot>.json` file per slot.
///
/// The directory *is* the session: state survives process restarts (the
/// "page reload" case) until the directory is cleared on sign-out.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` as the session directory. It is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The session directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, slot: &str) -> Result<PathBuf, PersistenceError> {
        check_slot(slot)?;
        Ok(self.dir.join(format!("{slot}.json")))
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, slot: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path(slot)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, slot: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path(slot)?;
        fs::create_dir_all(&self.dir)?;

        // Write-then-rename so a crash never leaves a half-written slot.
        // Temp names are unique per write.
        let prefix = format!(".{slot}.");
        let mut tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TMP_SUFFIX)
            .tempfile_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove_item(&self, slot: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path(slot)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            // Slots plus temp files left behind by an interrupted write
            if path
                .extension()
                .is_some_and(|ext| ext == "json" || ext == "tmp")
            {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
