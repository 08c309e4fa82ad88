pub mod options;
pub mod split_dataset;

use crate::error::{DatasetError, Result};
use crate::utils::is_png_file_name;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{self, Component, Path, PathBuf};
use std::str::FromStr;
use std::vec;

pub use split_dataset::{Sample, SplitDataset};

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_CATEGORY: &str = "capsule";
/// Class subdirectory holding defect-free images.
pub const GOOD_CLASS: &str = "good";
const MASK_SUFFIX: &str = "_mask.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Test,
    GroundTruth,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Test, Split::GroundTruth];

    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
            Split::GroundTruth => "ground_truth",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

impl FromStr for Split {
    type Err = DatasetError;

    fn from_str(value: &str) -> Result<Self> {
        Split::ALL
            .iter()
            .copied()
            .find(|split| split.dir_name() == value)
            .ok_or_else(|| DatasetError::InvalidSplit(value.to_string()))
    }
}

/// A single image file found under `<category>/<split>/<class>/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub category: String,
    pub split: Split,
    pub class: String,
    pub path: PathBuf,
}

impl ImageEntry {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    pub fn is_anomalous(&self) -> bool {
        self.class != GOOD_CLASS
    }
}

/// Read-only view over one category of the dataset.
///
/// Nothing is cached: every call walks the directories again, so the results always
/// reflect what is on disk at the time of the call.
#[derive(Debug, Clone)]
pub struct CategoryIndex {
    category: String,
    category_path: PathBuf,
}

impl CategoryIndex {
    /// Resolves `<dataset_root>/<category>`. No split directory is touched here.
    pub fn open<P: AsRef<Path>>(dataset_root: P, category: &str) -> Result<Self> {
        validate_category(category)?;
        let category_path = dataset_root.as_ref().join(category);
        if !category_path.is_dir() {
            return Err(DatasetError::CategoryNotFound {
                category: category.to_string(),
                path: category_path,
            });
        }
        debug!("resolved category {} at {}", category, category_path.display());
        Ok(Self {
            category: category.to_string(),
            category_path,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn path(&self) -> &Path {
        &self.category_path
    }

    /// Same as [`CategoryIndex::entries`], taking the split by its directory name.
    pub fn enumerate(&self, split: &str) -> Result<Entries> {
        self.entries(split.parse()?)
    }

    /// Lazily lists every `*.png` inside the class subdirectories of `split`, classes
    /// and files both in lexicographic order. Files are never opened.
    pub fn entries(&self, split: Split) -> Result<Entries> {
        let classes = self.class_dirs(split)?;
        Ok(Entries {
            category: self.category.clone(),
            split,
            classes: classes.into_iter(),
            current: Vec::new().into_iter(),
        })
    }

    pub fn classes(&self, split: Split) -> Result<Vec<String>> {
        Ok(self
            .class_dirs(split)?
            .into_iter()
            .map(|(class, _)| class)
            .collect())
    }

    /// Number of images per class subdirectory, including empty classes.
    pub fn class_counts(&self, split: Split) -> Result<Vec<(String, usize)>> {
        self.class_dirs(split)?
            .into_iter()
            .map(|(class, class_path)| -> Result<(String, usize)> {
                let count = list_png_files(&class_path)?.len();
                Ok((class, count))
            })
            .collect()
    }

    /// Total number of image entries in `split`.
    pub fn len(&self, split: Split) -> Result<usize> {
        self.entries(split)?
            .try_fold(0, |count, entry| entry.map(|_| count + 1))
    }

    /// Takes a snapshot of `split` that supports positional access.
    pub fn dataset(&self, split: Split) -> Result<SplitDataset> {
        let entries = measure_time!(
            format!("scanning {}/{}", self.category, split),
            || -> Result<Vec<ImageEntry>> { self.entries(split)?.collect() }
        )?;
        Ok(SplitDataset::new(split, entries))
    }

    /// Ground-truth mask of a defective test image, `None` for defect-free images or
    /// when the mask is missing on disk.
    pub fn mask_for(&self, entry: &ImageEntry) -> Option<PathBuf> {
        if entry.split != Split::Test || !entry.is_anomalous() {
            return None;
        }
        let stem = entry.path.file_stem()?.to_str()?;
        let mask_path = self
            .category_path
            .join(Split::GroundTruth.dir_name())
            .join(&entry.class)
            .join(format!("{}{}", stem, MASK_SUFFIX));
        if mask_path.is_file() {
            Some(mask_path)
        } else {
            warn!("no ground truth mask for {}", entry.path.display());
            None
        }
    }

    fn class_dirs(&self, split: Split) -> Result<Vec<(String, PathBuf)>> {
        let split_path = self.category_path.join(split.dir_name());
        if !split_path.is_dir() {
            return Err(DatasetError::SplitNotFound { path: split_path });
        }
        let scan_err = |source| DatasetError::Scan {
            path: split_path.clone(),
            source,
        };
        let mut classes = Vec::new();
        for dir_entry in fs::read_dir(&split_path).map_err(scan_err)? {
            let path = dir_entry.map_err(scan_err)?.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name() {
                // non UTF-8 names keep their real path, only the label is lossy
                classes.push((name.to_string_lossy().into_owned(), path.clone()));
            }
        }
        classes.sort();
        Ok(classes)
    }
}

/// Iterator returned by [`CategoryIndex::entries`]. Each class subdirectory is listed
/// only once the previous one is exhausted.
#[derive(Debug)]
pub struct Entries {
    category: String,
    split: Split,
    classes: vec::IntoIter<(String, PathBuf)>,
    current: vec::IntoIter<ImageEntry>,
}

impl Iterator for Entries {
    type Item = Result<ImageEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some(Ok(entry));
            }
            let (class, class_path) = self.classes.next()?;
            let files = match list_png_files(&class_path) {
                Ok(files) => files,
                Err(err) => return Some(Err(err)),
            };
            self.current = files
                .into_iter()
                .map(|path| ImageEntry {
                    category: self.category.clone(),
                    split: self.split,
                    class: class.clone(),
                    path,
                })
                .collect::<Vec<_>>()
                .into_iter();
        }
    }
}

fn validate_category(category: &str) -> Result<()> {
    let mut components = Path::new(category).components();
    let is_single_name = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && !category.contains(path::is_separator);
    if is_single_name {
        Ok(())
    } else {
        Err(DatasetError::InvalidCategory(category.to_string()))
    }
}

fn list_png_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let scan_err = |source| DatasetError::Scan {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for dir_entry in fs::read_dir(dir).map_err(scan_err)? {
        let path = dir_entry.map_err(scan_err)?.path();
        let is_png = path
            .file_name()
            .map_or(false, |name| is_png_file_name(&name.to_string_lossy()));
        if is_png && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{ErrorKind, Stage};
    use anyhow::Result;
    use std::collections::BTreeSet;
    use std::time::SystemTime;

    /// Writes `files` (relative to the dataset root) with their path as content.
    pub(crate) fn create_tree(root: &Path, files: &[&str]) -> Result<()> {
        for file in files {
            let path = root.join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, file.as_bytes())?;
        }
        Ok(())
    }

    fn collect_paths(entries: Entries) -> Result<Vec<PathBuf>> {
        Ok(entries
            .map(|entry| entry.map(|e| e.path))
            .collect::<crate::error::Result<Vec<_>>>()?)
    }

    #[test]
    fn parses_splits() -> Result<()> {
        assert_eq!("train".parse::<Split>()?, Split::Train);
        assert_eq!("test".parse::<Split>()?, Split::Test);
        assert_eq!("ground_truth".parse::<Split>()?, Split::GroundTruth);
        for invalid in &["validation", "Train", "", "ground-truth"] {
            let err = invalid.parse::<Split>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(Split::GroundTruth.to_string(), "ground_truth");
        Ok(())
    }

    #[test]
    fn entries_serialize_with_split_names() -> Result<()> {
        let entry = ImageEntry {
            category: String::from("capsule"),
            split: Split::GroundTruth,
            class: String::from("crack"),
            path: PathBuf::from("data/capsule/ground_truth/crack/000_mask.png"),
        };
        let json = serde_json::to_value(&entry)?;
        assert_eq!(json["split"], "ground_truth");
        assert_eq!(json["class"], "crack");
        assert_eq!(serde_json::from_value::<ImageEntry>(json)?, entry);
        Ok(())
    }

    #[test]
    fn enumerates_capsule_train_good() -> Result<()> {
        let dir = tempfile::tempdir()?;
        create_tree(
            dir.path(),
            &["capsule/train/good/002.png", "capsule/train/good/001.png"],
        )?;
        let index = CategoryIndex::open(dir.path(), "capsule")?;
        let expected = vec![
            dir.path().join("capsule/train/good/001.png"),
            dir.path().join("capsule/train/good/002.png"),
        ];

        for _ in 0..3 {
            assert_eq!(collect_paths(index.enumerate("train")?)?, expected);
        }
        let entry = index.entries(Split::Train)?.next().unwrap()?;
        assert_eq!(entry.category, "capsule");
        assert_eq!(entry.split, Split::Train);
        assert_eq!(entry.class, "good");
        assert_eq!(entry.file_name(), Some("001.png"));
        assert!(!entry.is_anomalous());
        Ok(())
    }

    #[test]
    fn enumerates_exactly_the_png_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        create_tree(
            dir.path(),
            &[
                "bottle/test/good/000.png",
                "bottle/test/broken_large/000.png",
                "bottle/test/broken_large/001.png",
                "bottle/test/broken_large/notes.txt",
                "bottle/test/broken_large/002.PNG",
                "bottle/test/contamination/000.png",
                "bottle/test/stray.png",
                "bottle/test/contamination/nested/000.png",
            ],
        )?;
        let index = CategoryIndex::open(dir.path(), "bottle")?;

        let found = collect_paths(index.entries(Split::Test)?)?;
        let expected = [
            "bottle/test/broken_large/000.png",
            "bottle/test/broken_large/001.png",
            "bottle/test/contamination/000.png",
            "bottle/test/good/000.png",
        ]
        .iter()
        .map(|p| dir.path().join(p))
        .collect::<Vec<_>>();
        assert_eq!(found, expected);
        assert_eq!(index.len(Split::Test)?, 4);
        assert_eq!(
            index.classes(Split::Test)?,
            vec!["broken_large", "contamination", "good"]
        );
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn enumerates_non_utf8_names() -> Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir()?;
        let class_dir = dir
            .path()
            .join("capsule/test")
            .join(OsStr::from_bytes(b"faulty_\xff"));
        fs::create_dir_all(&class_dir)?;
        let image_path = class_dir.join(OsStr::from_bytes(b"\xfe001.png"));
        fs::write(&image_path, b"png")?;
        create_tree(dir.path(), &["capsule/test/good/000.png"])?;
        let index = CategoryIndex::open(dir.path(), "capsule")?;

        let entries = index
            .entries(Split::Test)?
            .collect::<crate::error::Result<Vec<_>>>()?;
        assert_eq!(entries.len(), 2);
        let faulty = entries
            .iter()
            .find(|entry| entry.path == image_path)
            .expect("non UTF-8 image is listed");
        assert!(faulty.class.starts_with("faulty_"));
        assert!(faulty.is_anomalous());
        Ok(())
    }

    #[test]
    fn class_counts_include_empty_classes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        create_tree(
            dir.path(),
            &[
                "capsule/test/crack/000.png",
                "capsule/test/crack/001.png",
                "capsule/test/good/000.png",
            ],
        )?;
        fs::create_dir_all(dir.path().join("capsule/test/squeeze"))?;
        let index = CategoryIndex::open(dir.path(), "capsule")?;

        assert_eq!(
            index.class_counts(Split::Test)?,
            vec![
                (String::from("crack"), 2),
                (String::from("good"), 1),
                (String::from("squeeze"), 0),
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_category_fails_on_open() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let err = CategoryIndex::open(dir.path(), "capsule").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.stage(), Stage::ResolveCategory);
        Ok(())
    }

    #[test]
    fn malformed_category_is_invalid() -> Result<()> {
        let dir = tempfile::tempdir()?;
        create_tree(dir.path(), &["capsule/train/good/000.png"])?;
        for category in &["", ".", "..", "capsule/train", "/capsule"] {
            let err = CategoryIndex::open(dir.path(), category).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{:?}", category);
        }
        Ok(())
    }

    #[test]
    fn invalid_split_is_rejected_before_listing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("capsule"))?;
        let index = CategoryIndex::open(dir.path(), "capsule")?;

        let err = index.enumerate("validation").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.stage(), Stage::ResolveSplit);
        Ok(())
    }

    #[test]
    fn missing_split_is_not_found() -> Result<()> {
        let dir = tempfile::tempdir()?;
        create_tree(dir.path(), &["capsule/train/good/000.png"])?;
        let index = CategoryIndex::open(dir.path(), "capsule")?;

        let err = index.enumerate("ground_truth").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.stage(), Stage::ResolveSplit);
        Ok(())
    }

    #[test]
    fn enumeration_leaves_files_untouched() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let files = ["capsule/train/good/000.png", "capsule/train/good/001.png"];
        create_tree(dir.path(), &files)?;
        let snapshot = || -> Result<Vec<(Vec<u8>, SystemTime)>> {
            files
                .iter()
                .map(|file| -> Result<(Vec<u8>, SystemTime)> {
                    let path = dir.path().join(file);
                    Ok((fs::read(&path)?, fs::metadata(&path)?.modified()?))
                })
                .collect()
        };
        let before = snapshot()?;

        let index = CategoryIndex::open(dir.path(), "capsule")?;
        let found = collect_paths(index.enumerate("train")?)?;
        index.dataset(Split::Train)?;

        let expected = files
            .iter()
            .map(|f| dir.path().join(f))
            .collect::<BTreeSet<_>>();
        assert_eq!(found.into_iter().collect::<BTreeSet<_>>(), expected);
        assert_eq!(snapshot()?, before);
        Ok(())
    }

    #[test]
    fn rescans_on_every_call() -> Result<()> {
        let dir = tempfile::tempdir()?;
        create_tree(dir.path(), &["capsule/train/good/000.png"])?;
        let index = CategoryIndex::open(dir.path(), "capsule")?;
        assert_eq!(index.len(Split::Train)?, 1);

        create_tree(dir.path(), &["capsule/train/good/001.png"])?;
        assert_eq!(index.len(Split::Train)?, 2);
        Ok(())
    }

    #[test]
    fn finds_masks_for_defective_test_images() -> Result<()> {
        let dir = tempfile::tempdir()?;
        create_tree(
            dir.path(),
            &[
                "capsule/test/crack/000.png",
                "capsule/test/crack/001.png",
                "capsule/test/good/000.png",
                "capsule/ground_truth/crack/000_mask.png",
            ],
        )?;
        let index = CategoryIndex::open(dir.path(), "capsule")?;
        let entries = index
            .entries(Split::Test)?
            .collect::<crate::error::Result<Vec<_>>>()?;

        let masks = entries
            .iter()
            .map(|entry| index.mask_for(entry))
            .collect::<Vec<_>>();
        assert_eq!(
            masks,
            vec![
                Some(dir.path().join("capsule/ground_truth/crack/000_mask.png")),
                None,
                None,
            ]
        );
        Ok(())
    }
}
