use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::error::{Error, Result};
use super::loader::{self, FormatError};
use super::model::{Annotations, Label, Series};
use super::naming;

pub const RAW_DATA_DIR: &str = "raw_data";
pub const ANNOTATION_DIR: &str = "annotations";

// ---------------------------------------------------------------------------
// Repository – the storage root on disk
// ---------------------------------------------------------------------------

/// A storage root holding `raw_data/` (one series per recording) and
/// `annotations/` (zero or one label vector per recording, same file name).
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    data_dir: PathBuf,
    annotation_dir: PathBuf,
}

impl Repository {
    /// Open a storage root. The raw-data area must exist; the annotation
    /// area is created on first save.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let data_dir = root.join(RAW_DATA_DIR);
        let annotation_dir = root.join(ANNOTATION_DIR);

        let meta = fs::metadata(&data_dir).map_err(|source| Error::StorageUnavailable {
            path: data_dir.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(Error::StorageUnavailable {
                path: data_dir,
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        Ok(Self {
            root,
            data_dir,
            annotation_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn annotation_path(&self, name: &str) -> PathBuf {
        self.annotation_dir.join(name)
    }

    pub fn has_annotations(&self, name: &str) -> bool {
        self.annotation_path(name).is_file()
    }

    /// Data files whose name contains `scope` (empty matches all), in
    /// listing order.
    pub fn list(&self, scope: &str) -> Result<Vec<String>> {
        let unavailable = |source: io::Error| Error::StorageUnavailable {
            path: self.data_dir.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.data_dir).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            let Ok(name) = entry.file_name().into_string() else {
                log::warn!("Skipping non UTF-8 entry {:?}", entry.path());
                continue;
            };
            if !name.contains(scope) || !loader::is_supported(&name) {
                continue;
            }
            match entry.file_type() {
                Ok(ft) if ft.is_file() => names.push(name),
                Ok(_) => {}
                Err(e) => log::warn!("Skipping {name}: {e}"),
            }
        }

        names.sort_by(|a, b| naming::listing_order(a, b));
        Ok(names)
    }

    pub fn load_series(&self, name: &str) -> Result<Series> {
        let path = self.data_path(name);
        if !path.is_file() {
            return Err(Error::NotFound {
                name: name.to_string(),
                dir: self.data_dir.clone(),
            });
        }
        loader::read_series(&path).map_err(|source| Error::Decode { path, source })
    }

    /// The persisted vector for `name`, or `default_length` zeros if there
    /// is none yet.
    pub fn load_or_init_annotations(&self, name: &str, default_length: usize) -> Result<Annotations> {
        match self.load_annotations(name)? {
            Some(labels) if labels.len() != default_length => Err(Error::LengthMismatch {
                name: name.to_string(),
                expected: default_length,
                found: labels.len(),
            }),
            Some(labels) => Ok(labels),
            None => Ok(vec![0; default_length]),
        }
    }

    /// The persisted vector for `name`, if any.
    pub fn load_annotations(&self, name: &str) -> Result<Option<Annotations>> {
        let path = self.annotation_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        loader::read_labels(&path)
            .map(Some)
            .map_err(|source| Error::Decode { path, source })
    }

    /// Write `vector` under `name`, replacing any previous file.
    pub fn save_annotations(&self, name: &str, vector: &[Label]) -> Result<PathBuf> {
        fs::create_dir_all(&self.annotation_dir).map_err(|source| Error::Io {
            path: self.annotation_dir.clone(),
            source,
        })?;

        let path = self.annotation_path(name);
        match loader::write_labels(&path, vector) {
            Ok(()) => Ok(path),
            Err(FormatError::Io(source)) => Err(Error::Io { path, source }),
            Err(source) => Err(Error::Encode { path, source }),
        }
    }

    /// Move the data file `old -> new`, then its annotation file if one
    /// exists. Nothing moves while either destination is occupied. The pair
    /// is not moved atomically: a failure on the second move is reported as
    /// [`Error::PartialRename`].
    pub fn rename_pair(&self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }

        let data_from = self.data_path(old);
        let data_to = self.data_path(new);
        if !data_from.is_file() {
            return Err(Error::Io {
                path: data_from,
                source: io::Error::new(io::ErrorKind::NotFound, "source data file does not exist"),
            });
        }
        let annotation_from = self.annotation_path(old);
        let annotation_to = self.annotation_path(new);
        // fs::rename silently replaces on Unix. A stale annotation file at
        // the destination would also be adopted by the renamed recording.
        for occupied in [&data_to, &annotation_to] {
            if fs::symlink_metadata(occupied).is_ok() {
                return Err(Error::Io {
                    path: occupied.clone(),
                    source: io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "destination already exists",
                    ),
                });
            }
        }

        move_file(&data_from, &data_to).map_err(|source| Error::Io {
            path: data_from.clone(),
            source,
        })?;
        log::info!("Renamed {} -> {}", data_from.display(), data_to.display());

        if !annotation_from.is_file() {
            return Ok(());
        }
        if let Err(source) = move_file(&annotation_from, &annotation_to) {
            log::error!(
                "Data file moved to {} but annotations stuck at {}: {source}",
                data_to.display(),
                annotation_from.display()
            );
            return Err(Error::PartialRename {
                data_from,
                data_to,
                annotation_from,
                annotation_to,
                source,
            });
        }
        log::info!(
            "Renamed {} -> {}",
            annotation_from.display(),
            annotation_to.display()
        );
        Ok(())
    }
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(from, to)
}
