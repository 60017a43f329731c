//! File-backed storage for per-artist artifacts.
//!
//! One CSV per artist under a fixed directory. The file name is derived from
//! the *input* artist name (not the resolved one), so a rerun with the same
//! list finds the same files. An existing file means "already collected".

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::catalog::TrackRecord;
use crate::error::StorageError;

const ARTIFACT_EXTENSION: &str = "csv";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the artifact for `artist_name`, whether or not it exists.
    pub fn path_for(&self, artist_name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", file_stem_for(artist_name), ARTIFACT_EXTENSION))
    }

    /// Whether `path` would be picked up by [`read_all`](Self::read_all),
    /// i.e. it names a file directly inside the store directory.
    pub fn holds(&self, path: &Path) -> bool {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        resolved(parent) == resolved(&self.dir)
    }

    pub fn exists(&self, artist_name: &str) -> bool {
        self.path_for(artist_name).is_file()
    }

    /// Write the artist's rows, replacing nothing: callers check [`exists`](Self::exists) first.
    ///
    /// The file appears atomically, so an interrupted run never leaves a
    /// partial artifact behind that a later run would mistake for a finished one.
    pub fn write(&self, artist_name: &str, rows: &[TrackRecord]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(artist_name);
        write_records_atomically(&path, rows)?;
        log::debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }

    /// Every stored artifact as `(artist_name, rows)`, in file-name order.
    ///
    /// The artist name is the file stem, i.e. the sanitized input name.
    /// A missing directory is treated as an empty store.
    pub fn read_all(&self) -> Result<Vec<(String, Vec<TrackRecord>)>, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StorageError::io(&self.dir, e))?.path();
            let is_artifact = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION);
            if is_artifact {
                paths.push(path);
            }
        }
        paths.sort();

        let mut artifacts = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let rows = read_records(&path)?;
            artifacts.push((name, rows));
        }
        Ok(artifacts)
    }
}

/// Canonical form of `path` when it exists, otherwise its absolute form.
fn resolved(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Deterministic file stem for an artist name.
///
/// Path separators, control characters and characters that are invalid in
/// Windows file names are replaced by `_`. Leading dots are replaced too so
/// that names like `..` stay inside the store directory.
pub fn file_stem_for(artist_name: &str) -> String {
    let mut stem: String = artist_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let leading_dots = stem.chars().take_while(|&c| c == '.').count();
    if leading_dots > 0 {
        stem.replace_range(..leading_dots, &"_".repeat(leading_dots));
    }

    if stem.trim().is_empty() {
        stem = format!("_{}", stem);
    }
    stem
}

/// Read a CSV of track records (header row required).
pub fn read_records(path: &Path) -> Result<Vec<TrackRecord>, StorageError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| StorageError::csv(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<TrackRecord>, _>>()
        .map_err(|e| StorageError::csv(path, e))
}

/// Write a CSV of track records with a header row, via a temporary file in
/// the same directory that is renamed over `path` once complete.
pub fn write_records_atomically(path: &Path, rows: &[TrackRecord]) -> Result<(), StorageError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;

    let tmp = NamedTempFile::new_in(parent).map_err(|e| StorageError::io(parent, e))?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file());
        if rows.is_empty() {
            // serde only emits the header together with the first record
            writer
                .write_record(HEADER)
                .map_err(|e| StorageError::csv(path, e))?;
        }
        for row in rows {
            writer.serialize(row).map_err(|e| StorageError::csv(path, e))?;
        }
        writer.flush().map_err(|e| StorageError::io(path, e))?;
    }
    tmp.as_file().sync_all().map_err(|e| StorageError::io(path, e))?;
    tmp.persist(path).map_err(|e| StorageError::io(path, e.error))?;
    Ok(())
}

/// Column names, in [`TrackRecord`] field order.
pub const HEADER: [&str; 17] = [
    "artist_name",
    "album",
    "track_number",
    "track_id",
    "track_name",
    "track_uri",
    "acousticness",
    "danceability",
    "energy",
    "instrumentalness",
    "liveness",
    "loudness",
    "speechiness",
    "tempo",
    "valence",
    "release_date",
    "popularity",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_holds_only_direct_children() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artists"));
        assert!(store.holds(&dir.path().join("artists").join("master_data.csv")));
        assert!(store.holds(&dir.path().join("artists").join(".").join("master_data.csv")));
        assert!(!store.holds(&dir.path().join("master_data.csv")));
        assert!(!store.holds(&dir.path().join("artists").join("out").join("master_data.csv")));
    }

    #[test]
    fn test_write_then_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artists"));

        assert!(!store.exists("Tom Misch"));
        let path = store.write("Tom Misch", &[record("Tom Misch", "Movie", "spotify:track:1")]).unwrap();
        assert!(store.exists("Tom Misch"));
        assert_eq!(path, dir.path().join("artists").join("Tom Misch.csv"));
    }

    #[test]
    fn test_read_all_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let b = vec![record("John Mayer", "Gravity", "spotify:track:2"), record("John Mayer", "Daughters", "spotify:track:3")];
        let a = vec![record("Bon Iver", "Holocene", "spotify:track:9")];
        store.write("John Mayer", &b).unwrap();
        store.write("Bon Iver", &a).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let all = store.read_all().unwrap();
        assert_eq!(all, vec![("Bon Iver".to_string(), a), ("John Mayer".to_string(), b)]);
    }

    #[test]
    fn test_read_all_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nope"));
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_written_file_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = store.write("Loyle Carner", &[record("Loyle Carner", "Ottolenghi", "spotify:track:5")]).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let first_line = content.lines().next().unwrap();
        assert_eq!(first_line, HEADER.join(","));
    }

    #[test]
    fn test_empty_write_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.csv");
        write_records_atomically(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim_end(), HEADER.join(","));
        assert!(read_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_write_fails_when_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("artists");
        fs::write(&blocker, "not a directory").unwrap();

        let store = ArtifactStore::new(&blocker);
        let result = store.write("AC/DC", &[record("AC/DC", "T.N.T.", "spotify:track:7")]);
        assert!(matches!(result, Err(StorageError::Io { .. })));
    }

    #[test]
    fn test_file_stem_sanitizing() {
        assert_eq!(file_stem_for("AC/DC"), "AC_DC");
        assert_eq!(file_stem_for("Beyoncé"), "Beyoncé");
        assert_eq!(file_stem_for("What?"), "What_");
        assert_eq!(file_stem_for(".."), "__");
        assert_eq!(file_stem_for("Tab\tName"), "Tab_Name");
        assert_eq!(file_stem_for(""), "_");
    }
}
