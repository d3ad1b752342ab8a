//! On-disk form of the record collection.
//!
//! The file is a single JSON array of records. Every write replaces the whole
//! file through a temporary sibling and a rename, so a reader sees either the
//! previous contents or the new contents and nothing in between.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::record::Record;

/// Read and decode the record file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array of
/// records.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let bytes = std::fs::read(path)?;
    let records: Vec<Record> = serde_json::from_slice(&bytes)?;
    trace!(path = %path.display(), count = records.len(), "Decoded record file");
    Ok(records)
}

/// Encode `records` and atomically replace the file at `path`.
///
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns [`Error::DirectoryCreate`] or [`Error::Persist`] if any step of the
/// write fails. The previous file is left untouched in that case.
pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    let encoded = serde_json::to_vec(records)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let persist_err = |source: std::io::Error| Error::Persist {
        path: path.to_path_buf(),
        source,
    };

    // Same directory as the target so the rename cannot cross filesystems.
    let mut tmp = NamedTempFile::new_in(dir).map_err(persist_err)?;
    tmp.write_all(&encoded).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.persist(path).map_err(|e| persist_err(e.error))?;

    debug!(
        path = %path.display(),
        count = records.len(),
        bytes = encoded.len(),
        "Wrote record file"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Coordinate;

    fn sample(name: &str, image: Option<Vec<u8>>) -> Record {
        Record::new(image, name, "555-0100", "@x", "", Coordinate::new(1.5, -2.5))
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SavedFriends.json");
        let records = vec![sample("Ana", None), sample("Bo", Some(vec![1, 2, 3]))];

        write_records(&path, &records).unwrap();
        assert_eq!(read_records(&path).unwrap(), records);
    }

    #[test]
    fn test_round_trip_twice_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SavedFriends.json");
        let records = vec![
            sample("Ana", Some(Vec::new())),
            sample("", None),
            sample("Cy", Some((0..=255).collect())),
        ];

        write_records(&path, &records).unwrap();
        let first = read_records(&path).unwrap();
        write_records(&path, &first).unwrap();
        let second = read_records(&path).unwrap();

        assert_eq!(second, records);
    }

    #[test]
    fn test_file_is_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SavedFriends.json");
        write_records(&path, &[sample("Ana", None)]).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["name"], "Ana");
    }

    #[test]
    fn test_write_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SavedFriends.json");
        write_records(&path, &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        assert!(read_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("SavedFriends.json");

        write_records(&path, &[sample("Ana", None)]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SavedFriends.json");
        write_records(&path, &[sample("Ana", None)]).unwrap();
        write_records(&path, &[sample("Bo", None)]).unwrap();

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_failed_encode_keeps_old_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SavedFriends.json");
        let old = vec![sample("Ana", None)];
        write_records(&path, &old).unwrap();
        let before = std::fs::read(&path).unwrap();

        let mut lost = sample("Bo", None);
        lost.latitude = f64::NAN;
        let err = write_records(&path, &[old[0].clone(), lost]).unwrap_err();
        assert!(matches!(err, Error::Json(_)));

        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(read_records(&path).unwrap(), old);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_into_file_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("plain");
        std::fs::write(&not_a_dir, b"x").unwrap();

        let err = write_records(&not_a_dir.join("SavedFriends.json"), &[]).unwrap_err();
        assert!(err.is_persist_error());
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_records(&dir.path().join("absent.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_read_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SavedFriends.json");
        std::fs::write(&path, br#"{"name": "Ana"}"#).unwrap();

        assert!(matches!(read_records(&path), Err(Error::Json(_))));
    }
}
