use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::{Error, Result};
use super::labels::{self, IndexPolicy, LabelOutcome, Selection};
use super::model::{Annotations, Label, Series};
use super::naming::{self, FileMeta};
use super::repository::Repository;

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    pub index_policy: IndexPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Whether the current file sits at either end of the listing. The front
/// end disables the matching navigation control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Bounds {
    pub at_first: bool,
    pub at_last: bool,
}

/// Figures of merit shown alongside the plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counts {
    pub total: usize,
    pub bad: usize,
    pub labeled: usize,
}

/// The loaded series/annotation pair for one recording.
#[derive(Debug, Clone)]
struct Current {
    name: String,
    series: Series,
    annotations: Annotations,
    meta: FileMeta,
    /// Annotations edited since the last load or save.
    modified: bool,
}

// ---------------------------------------------------------------------------
// DatasetSession
// ---------------------------------------------------------------------------

/// One operator's walk through a storage root.
///
/// Every mutator either completes or leaves the session as it was; the
/// only exception is a quality change whose rename went through but whose
/// follow-up failed, see [`Self::set_quality`].
#[derive(Debug)]
pub struct DatasetSession {
    repo: Repository,
    config: SessionConfig,
    listing: Vec<String>,
    scope: String,
    current: Option<Current>,
}

impl DatasetSession {
    pub fn open(root: impl Into<PathBuf>, config: SessionConfig) -> Result<Self> {
        Self::new(Repository::open(root)?, config)
    }

    /// Scan the raw-data area and select its first recording, if any.
    pub fn new(repo: Repository, config: SessionConfig) -> Result<Self> {
        let listing = repo.list("")?;
        log::info!(
            "Opened {} with {} recording(s)",
            repo.root().display(),
            listing.len()
        );

        let mut session = Self {
            repo,
            config,
            listing,
            scope: String::new(),
            current: None,
        };
        if let Some(first) = session.listing.first().cloned() {
            // A broken first file should not keep the operator out of the
            // rest of the dataset.
            if let Err(e) = session.select(&first) {
                log::error!("Could not load {first}: {e}");
            }
        }
        Ok(session)
    }

    fn load(&self, name: &str) -> Result<Current> {
        let series = self.repo.load_series(name)?;
        let annotations = self.repo.load_or_init_annotations(name, series.len())?;
        debug_assert_eq!(series.len(), annotations.len());
        Ok(Current {
            name: name.to_string(),
            series,
            annotations,
            meta: FileMeta::parse(name),
            modified: false,
        })
    }

    /// Make `name` the current recording. Unsaved edits to the previous
    /// one are dropped.
    pub fn select(&mut self, name: &str) -> Result<()> {
        let current = self.load(name)?;
        if self.is_modified() {
            log::warn!(
                "Discarding unsaved annotations for {}",
                self.current_name().unwrap_or_default()
            );
        }
        self.current = Some(current);
        Ok(())
    }

    /// Reload the current recording from disk, dropping unsaved edits.
    pub fn revert(&mut self) -> Result<()> {
        let name = self.current_name().ok_or(Error::NoCurrentFile)?.to_string();
        self.current = Some(self.load(&name)?);
        Ok(())
    }

    /// Restrict the listing to names containing `token` and select the
    /// first of them. An empty result leaves the session untouched.
    pub fn set_pointing_scope(&mut self, token: &str) -> Result<Bounds> {
        let listing = self.repo.list(token)?;
        let Some(first) = listing.first() else {
            return Err(Error::EmptyScope {
                scope: token.to_string(),
            });
        };
        let current = self.load(first)?;

        self.listing = listing;
        self.scope = token.to_string();
        self.current = Some(current);
        Ok(self.bounds())
    }

    /// Step through the listing. Stepping past either end is a no-op.
    ///
    /// A neighbour that cannot be loaded is logged and skipped. If nothing
    /// further in that direction loads, the first failure is returned and
    /// the session stays where it was.
    pub fn navigate(&mut self, direction: Direction) -> Result<Bounds> {
        let bounds = self.bounds();
        let candidates: Vec<String> = match (direction, self.current_index()) {
            (Direction::Previous, _) if bounds.at_first => return Ok(bounds),
            (Direction::Next, _) if bounds.at_last => return Ok(bounds),
            (Direction::Previous, Some(index)) => {
                self.listing[..index].iter().rev().cloned().collect()
            }
            (Direction::Previous, None) => return Ok(bounds),
            (Direction::Next, Some(index)) => self.listing[index + 1..].to_vec(),
            (Direction::Next, None) => self.listing.clone(),
        };

        let mut first_error = None;
        for name in candidates {
            match self.select(&name) {
                Ok(()) => return Ok(self.bounds()),
                Err(e) => {
                    log::warn!("Skipping {name}: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(self.bounds()),
        }
    }

    pub fn bounds(&self) -> Bounds {
        let Some(last) = self.listing.len().checked_sub(1) else {
            return Bounds {
                at_first: true,
                at_last: true,
            };
        };
        let index = self.current_index().unwrap_or(0);
        Bounds {
            at_first: index == 0,
            at_last: index >= last,
        }
    }

    pub fn toggle_quality(&mut self) -> Result<Bounds> {
        let bad = self.is_bad();
        self.set_quality(!bad)
    }

    /// Mark the current recording good or bad by renaming its file pair.
    /// Already in the requested state: nothing is renamed.
    ///
    /// Unsaved edits follow the file. Once the data file has moved the
    /// session follows it, even when the call still fails: on
    /// [`Error::PartialRename`] it keeps the in-memory pair marked modified,
    /// and when the renamed pair cannot be reloaded it keeps the pair as
    /// it was.
    pub fn set_quality(&mut self, bad: bool) -> Result<Bounds> {
        let current = self.current.as_ref().ok_or(Error::NoCurrentFile)?;
        let target = naming::with_quality(&current.name, bad);
        if target == current.name {
            return Ok(self.bounds());
        }
        let edits = current.modified.then(|| current.annotations.clone());

        match self.repo.rename_pair(&current.name, &target) {
            Ok(()) => {}
            Err(err @ Error::PartialRename { .. }) => {
                self.follow_rename(&target);
                if let Some(current) = self.current.as_mut() {
                    current.modified = true;
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        }

        let loaded = self
            .repo
            .list(&self.scope)
            .and_then(|listing| Ok((listing, self.load(&target)?)));
        let (listing, mut renamed) = match loaded {
            Ok(pair) => pair,
            Err(err) => {
                log::error!("Renamed to {target} but could not reload it: {err}");
                self.follow_rename(&target);
                return Err(err);
            }
        };
        if let Some(edits) = edits {
            renamed.annotations = edits;
            renamed.modified = true;
        }
        self.listing = listing;
        self.current = Some(renamed);
        Ok(self.bounds())
    }

    /// Point the in-memory pair at `target` after its files moved there.
    fn follow_rename(&mut self, target: &str) {
        match self.repo.list(&self.scope) {
            Ok(listing) => self.listing = listing,
            Err(e) => log::error!("Could not rescan after renaming to {target}: {e}"),
        }
        if let Some(current) = self.current.as_mut() {
            current.meta = FileMeta::parse(target);
            current.name = target.to_string();
        }
    }

    // -----------------------------------------------------------------------
    // Labeling / persistence
    // -----------------------------------------------------------------------

    pub fn label(&mut self, selection: &Selection, label: Label) -> Result<LabelOutcome> {
        let policy = self.config.index_policy;
        let current = self.current.as_mut().ok_or(Error::NoCurrentFile)?;
        let outcome = labels::apply_label(&mut current.annotations, selection, label, policy)?;
        if outcome.skipped > 0 {
            log::warn!(
                "Ignored {} selected position(s) outside 0..{}",
                outcome.skipped,
                current.annotations.len()
            );
        }
        if outcome.applied > 0 {
            current.modified = true;
        }
        Ok(outcome)
    }

    /// Persist the current annotations, complete or not.
    pub fn save(&mut self) -> Result<PathBuf> {
        let current = self.current.as_mut().ok_or(Error::NoCurrentFile)?;
        let path = self.repo.save_annotations(&current.name, &current.annotations)?;
        current.modified = false;
        log::info!("Saved annotations to {}", path.display());
        Ok(path)
    }

    /// Save, but only once every position carries a state.
    pub fn export(&mut self) -> Result<PathBuf> {
        let current = self.current.as_ref().ok_or(Error::NoCurrentFile)?;
        labels::ensure_complete(&current.annotations)?;
        self.save()
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    pub fn count_total(&self) -> usize {
        self.listing.len()
    }

    pub fn count_bad(&self) -> usize {
        self.listing.iter().filter(|n| naming::has_prefix(n)).count()
    }

    /// Recordings matching `scope` whose persisted annotations are complete
    /// and as long as their series. Reads every candidate's annotation file.
    pub fn count_labeled(&self, scope: &str) -> Result<usize> {
        let mut labeled = 0;
        for name in self.repo.list(scope)? {
            match self.is_labeled(&name) {
                Ok(true) => labeled += 1,
                Ok(false) => {}
                Err(e) => log::warn!("Counting {name} as unlabeled: {e}"),
            }
        }
        Ok(labeled)
    }

    fn is_labeled(&self, name: &str) -> Result<bool> {
        let Some(annotations) = self.repo.load_annotations(name)? else {
            return Ok(false);
        };
        if labels::validate_complete(&annotations) > 0 {
            return Ok(false);
        }
        let expected = self.repo.load_series(name)?.len();
        if annotations.len() != expected {
            return Err(Error::LengthMismatch {
                name: name.to_string(),
                expected,
                found: annotations.len(),
            });
        }
        Ok(true)
    }

    pub fn counts(&self) -> Result<Counts> {
        Ok(Counts {
            total: self.count_total(),
            bad: self.count_bad(),
            labeled: self.count_labeled(&self.scope)?,
        })
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    pub fn root(&self) -> &Path {
        self.repo.root()
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn listing(&self) -> &[String] {
        &self.listing
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.name.as_str())
    }

    pub fn current_index(&self) -> Option<usize> {
        let name = self.current_name()?;
        self.listing.iter().position(|n| n == name)
    }

    pub fn series(&self) -> &[f64] {
        self.current
            .as_ref()
            .map(|c| c.series.as_slice())
            .unwrap_or_default()
    }

    pub fn annotations(&self) -> &[Label] {
        self.current
            .as_ref()
            .map(|c| c.annotations.as_slice())
            .unwrap_or_default()
    }

    pub fn meta(&self) -> Option<&FileMeta> {
        self.current.as_ref().map(|c| &c.meta)
    }

    pub fn night(&self) -> Option<&str> {
        self.meta().and_then(|m| m.night.as_deref())
    }

    pub fn pointing(&self) -> Option<char> {
        self.meta().and_then(|m| m.pointing)
    }

    pub fn is_bad(&self) -> bool {
        self.meta().is_some_and(|m| m.bad)
    }

    pub fn is_modified(&self) -> bool {
        self.current.as_ref().is_some_and(|c| c.modified)
    }

    /// Unlabeled positions in the current annotations.
    pub fn missing(&self) -> usize {
        labels::validate_complete(self.annotations())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader;
    use crate::data::repository::RAW_DATA_DIR;

    fn session_with(names: &[(&str, usize)]) -> (tempfile::TempDir, DatasetSession) {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join(RAW_DATA_DIR);
        std::fs::create_dir_all(&raw).unwrap();
        for (name, len) in names {
            let series: Vec<f64> = (0..*len).map(|i| i as f64).collect();
            loader::write_series(&raw.join(name), &series).unwrap();
        }
        let session = DatasetSession::open(dir.path(), SessionConfig::default()).unwrap();
        (dir, session)
    }

    #[test]
    fn opens_on_first_recording() {
        let (_dir, s) = session_with(&[("n_night2_p0.json", 3), ("n_night1_p1.json", 5)]);
        assert_eq!(s.current_name(), Some("n_night1_p1.json"));
        assert_eq!(s.night(), Some("night1"));
        assert_eq!(s.pointing(), Some('1'));
        assert_eq!(s.series().len(), 5);
        assert_eq!(s.annotations(), &[0; 5]);
        assert!(!s.is_bad());
    }

    #[test]
    fn empty_storage_has_no_current_file() {
        let (_dir, mut s) = session_with(&[]);
        assert_eq!(s.current_name(), None);
        assert_eq!(s.bounds(), Bounds { at_first: true, at_last: true });
        assert_eq!(s.navigate(Direction::Next).unwrap(), s.bounds());
        assert!(matches!(s.save(), Err(Error::NoCurrentFile)));
        assert!(matches!(s.toggle_quality(), Err(Error::NoCurrentFile)));
    }

    #[test]
    fn navigation_stops_at_both_ends() {
        let (_dir, mut s) = session_with(&[("a_n1_p0.json", 2), ("a_n2_p0.json", 2)]);
        let b = s.navigate(Direction::Previous).unwrap();
        assert_eq!(b, Bounds { at_first: true, at_last: false });
        assert_eq!(s.current_name(), Some("a_n1_p0.json"));

        let b = s.navigate(Direction::Next).unwrap();
        assert_eq!(b, Bounds { at_first: false, at_last: true });
        assert_eq!(s.current_name(), Some("a_n2_p0.json"));

        let b = s.navigate(Direction::Next).unwrap();
        assert_eq!(b, Bounds { at_first: false, at_last: true });
        assert_eq!(s.current_name(), Some("a_n2_p0.json"));
    }

    #[test]
    fn select_missing_file_keeps_state() {
        let (_dir, mut s) = session_with(&[("a_n1_p0.json", 2)]);
        assert!(matches!(s.select("a_n9_p0.json"), Err(Error::NotFound { .. })));
        assert_eq!(s.current_name(), Some("a_n1_p0.json"));
    }

    #[test]
    fn empty_scope_leaves_session_unchanged() {
        let (_dir, mut s) = session_with(&[("a_n1_p0.json", 2), ("a_n2_p1.json", 2)]);
        s.navigate(Direction::Next).unwrap();
        assert!(matches!(
            s.set_pointing_scope("p4"),
            Err(Error::EmptyScope { .. })
        ));
        assert_eq!(s.scope(), "");
        assert_eq!(s.listing().len(), 2);
        assert_eq!(s.current_name(), Some("a_n2_p1.json"));
    }

    #[test]
    fn labeling_marks_modified_until_saved() {
        let (_dir, mut s) = session_with(&[("a_n1_p0.json", 4)]);
        s.label(&Selection::Indices(vec![1, 2]), 3).unwrap();
        assert!(s.is_modified());
        assert_eq!(s.annotations(), &[0, 3, 3, 0]);
        assert_eq!(s.missing(), 2);

        s.save().unwrap();
        assert!(!s.is_modified());
        assert_eq!(s.count_labeled("").unwrap(), 0);
    }

    #[test]
    fn strict_policy_surfaces_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join(RAW_DATA_DIR);
        std::fs::create_dir_all(&raw).unwrap();
        loader::write_series(&raw.join("a_n1_p0.json"), &[1.0, 2.0]).unwrap();
        let config = SessionConfig {
            index_policy: IndexPolicy::Strict,
        };
        let mut s = DatasetSession::open(dir.path(), config).unwrap();

        assert!(matches!(
            s.label(&Selection::Indices(vec![0, 2]), 1),
            Err(Error::IndexOutOfRange { count: 1, len: 2 })
        ));
        assert_eq!(s.annotations(), &[0, 0]);
        assert!(!s.is_modified());
    }

    #[test]
    fn export_requires_complete_annotations() {
        let (_dir, mut s) = session_with(&[("a_n1_p0.json", 4)]);
        s.label(&Selection::Indices(vec![2]), 1).unwrap();
        assert!(matches!(s.export(), Err(Error::Validation { missing: 3 })));
        assert!(!s.repository().has_annotations("a_n1_p0.json"));

        s.label(&Selection::All, 1).unwrap();
        let path = s.export().unwrap();
        assert!(path.is_file());
        assert_eq!(s.count_labeled("").unwrap(), 1);
    }

    #[test]
    fn marking_bad_twice_does_not_double_prefix() {
        let (_dir, mut s) = session_with(&[("a_n1_p0.json", 2)]);
        s.set_quality(true).unwrap();
        s.set_quality(true).unwrap();
        assert_eq!(s.current_name(), Some("bad_a_n1_p0.json"));
        assert_eq!(s.listing(), &["bad_a_n1_p0.json".to_string()]);
        assert_eq!(s.count_bad(), 1);
    }

    #[test]
    fn unsaved_edits_follow_a_quality_change() {
        let (_dir, mut s) = session_with(&[("a_n1_p0.json", 3)]);
        s.label(&Selection::Indices(vec![0]), 2).unwrap();
        s.toggle_quality().unwrap();
        assert!(s.is_bad());
        assert!(s.is_modified());
        assert_eq!(s.annotations(), &[2, 0, 0]);
    }

    #[test]
    fn revert_discards_edits() {
        let (_dir, mut s) = session_with(&[("a_n1_p0.json", 3)]);
        s.label(&Selection::All, 4).unwrap();
        s.revert().unwrap();
        assert_eq!(s.annotations(), &[0, 0, 0]);
        assert!(!s.is_modified());
    }

    #[test]
    fn counts_follow_the_listing() {
        let (_dir, mut s) = session_with(&[
            ("a_n1_p0.json", 2),
            ("bad_a_n1_p1.json", 2),
            ("a_n2_p1.json", 2),
        ]);
        assert_eq!(s.counts().unwrap(), Counts { total: 3, bad: 1, labeled: 0 });

        s.set_pointing_scope("p1").unwrap();
        s.label(&Selection::All, 1).unwrap();
        s.save().unwrap();
        assert_eq!(s.counts().unwrap(), Counts { total: 2, bad: 1, labeled: 1 });
        assert_eq!(s.count_labeled("p0").unwrap(), 0);
    }

    #[test]
    fn undecodable_annotations_count_as_unlabeled() {
        let (dir, s) = session_with(&[("a_n1_p0.json", 2)]);
        let ann = dir.path().join(crate::data::repository::ANNOTATION_DIR);
        std::fs::create_dir_all(&ann).unwrap();
        std::fs::write(ann.join("a_n1_p0.json"), "not json").unwrap();
        assert_eq!(s.count_labeled("").unwrap(), 0);
    }

    #[test]
    fn navigation_skips_unloadable_recordings() {
        let (dir, mut s) = session_with(&[
            ("a_n1_p0.json", 2),
            ("a_n2_p0.json", 2),
            ("a_n3_p0.json", 2),
        ]);
        let ann = dir.path().join(crate::data::repository::ANNOTATION_DIR);
        std::fs::create_dir_all(&ann).unwrap();
        std::fs::write(ann.join("a_n2_p0.json"), "not json").unwrap();

        let b = s.navigate(Direction::Next).unwrap();
        assert_eq!(s.current_name(), Some("a_n3_p0.json"));
        assert_eq!(b, Bounds { at_first: false, at_last: true });

        s.navigate(Direction::Previous).unwrap();
        assert_eq!(s.current_name(), Some("a_n1_p0.json"));
    }

    #[test]
    fn navigation_with_only_broken_neighbours_stays_put() {
        let (dir, mut s) = session_with(&[("a_n1_p0.json", 2), ("a_n2_p0.json", 2)]);
        let ann = dir.path().join(crate::data::repository::ANNOTATION_DIR);
        std::fs::create_dir_all(&ann).unwrap();
        std::fs::write(ann.join("a_n2_p0.json"), "[1, 2, 3]").unwrap();

        assert!(matches!(
            s.navigate(Direction::Next),
            Err(Error::LengthMismatch { expected: 2, found: 3, .. })
        ));
        assert_eq!(s.current_name(), Some("a_n1_p0.json"));
    }

    #[test]
    fn stale_annotations_block_a_quality_change() {
        let (dir, mut s) = session_with(&[("a_n1_p0.json", 4)]);
        let ann = dir.path().join(crate::data::repository::ANNOTATION_DIR);
        std::fs::create_dir_all(&ann).unwrap();
        std::fs::write(ann.join("bad_a_n1_p0.json"), "[1, 1, 1]").unwrap();

        for _ in 0..2 {
            match s.toggle_quality() {
                Err(Error::Io { source, .. }) => {
                    assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists)
                }
                other => panic!("expected Io, got {other:?}"),
            }
            assert_eq!(s.current_name(), Some("a_n1_p0.json"));
            assert_eq!(s.listing(), &["a_n1_p0.json".to_string()]);
            assert!(!s.is_bad());
        }
        assert!(s.repository().data_path("a_n1_p0.json").is_file());
    }

    #[test]
    fn session_follows_a_rename_it_cannot_reload() {
        let (dir, mut s) = session_with(&[("a_n1_p0.json", 2)]);
        s.label(&Selection::All, 1).unwrap();
        s.save().unwrap();
        // Corrupted on disk after it was loaded.
        let ann = dir.path().join(crate::data::repository::ANNOTATION_DIR);
        std::fs::write(ann.join("a_n1_p0.json"), "not json").unwrap();

        assert!(matches!(s.toggle_quality(), Err(Error::Decode { .. })));
        assert_eq!(s.current_name(), Some("bad_a_n1_p0.json"));
        assert!(s.is_bad());
        assert_eq!(s.listing(), &["bad_a_n1_p0.json".to_string()]);
        assert_eq!(s.annotations(), &[1, 1]);

        assert!(matches!(s.toggle_quality(), Err(Error::Decode { .. })));
        assert_eq!(s.current_name(), Some("a_n1_p0.json"));
        assert!(!s.is_bad());
        assert!(s.repository().data_path("a_n1_p0.json").is_file());
    }

    #[test]
    fn wrong_length_annotations_do_not_count_as_labeled() {
        let (dir, s) = session_with(&[("a_n1_p0.json", 3), ("a_n2_p0.json", 2)]);
        let ann = dir.path().join(crate::data::repository::ANNOTATION_DIR);
        std::fs::create_dir_all(&ann).unwrap();
        std::fs::write(ann.join("a_n1_p0.json"), "[1, 2]").unwrap();
        std::fs::write(ann.join("a_n2_p0.json"), "[3, 4]").unwrap();
        assert_eq!(s.count_labeled("").unwrap(), 1);
    }

    #[test]
    fn out_of_domain_annotations_are_not_loaded() {
        let (dir, mut s) = session_with(&[("a_n1_p0.json", 2), ("a_n2_p0.json", 2)]);
        let ann = dir.path().join(crate::data::repository::ANNOTATION_DIR);
        std::fs::create_dir_all(&ann).unwrap();
        std::fs::write(ann.join("a_n2_p0.json"), "[7, 9]").unwrap();

        assert!(matches!(s.select("a_n2_p0.json"), Err(Error::Decode { .. })));
        assert_eq!(s.count_labeled("").unwrap(), 0);
    }
}
