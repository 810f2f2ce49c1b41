//! Persistent string slots
//!
//! The whole long-term memory lives in two named slots, `history` and
//! `important_items`, each a file under the data directory. Absence of a
//! file is a valid state distinct from an empty string, so callers can tell
//! "never saved" apart from "saved nothing".

use std::fs;
use std::path::PathBuf;

use crate::error::Result;

/// The named persistence slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The committed conversation transcript
    History,
    /// The current important-items digest
    ImportantItems,
}

impl Slot {
    fn file_name(&self) -> &'static str {
        match self {
            Slot::History => "history.json",
            Slot::ImportantItems => "important_items.json",
        }
    }
}

/// File-backed store for the memory slots
///
/// Writes are atomic: temp file in the same directory, then rename.
#[derive(Debug, Clone)]
pub struct SlotStore {
    dir: PathBuf,
}

impl SlotStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Read a slot. `Ok(None)` means the slot has never been written.
    pub fn get(&self, slot: Slot) -> Result<Option<String>> {
        match fs::read_to_string(self.dir.join(slot.file_name())) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite a slot atomically
    pub fn set(&self, slot: Slot, value: &str) -> Result<()> {
        let temp_path = self.dir.join(format!("{}.tmp", slot.file_name()));
        let final_path = self.dir.join(slot.file_name());
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &final_path)?;
        Ok(())
    }

    /// Remove a slot. Removing an absent slot is not an error.
    pub fn delete(&self, slot: Slot) -> Result<()> {
        match fs::remove_file(self.dir.join(slot.file_name())) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// The directory holding the slot files
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_vs_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::open(dir.path()).unwrap();

        assert_eq!(store.get(Slot::History).unwrap(), None);

        store.set(Slot::History, "").unwrap();
        assert_eq!(store.get(Slot::History).unwrap(), Some(String::new()));
    }

    #[test]
    fn test_set_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::open(dir.path()).unwrap();

        store.set(Slot::ImportantItems, "first").unwrap();
        store.set(Slot::ImportantItems, "second").unwrap();
        assert_eq!(
            store.get(Slot::ImportantItems).unwrap(),
            Some("second".to_string())
        );
    }

    #[test]
    fn test_slots_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::open(dir.path()).unwrap();

        store.set(Slot::History, "transcript").unwrap();
        assert_eq!(store.get(Slot::ImportantItems).unwrap(), None);

        store.delete(Slot::History).unwrap();
        assert_eq!(store.get(Slot::History).unwrap(), None);
        // Deleting again is fine
        store.delete(Slot::History).unwrap();
    }
}
