use super::{ImageEntry, Split};
use crate::error::{DatasetError, Result};
use crate::image_ops::{self, LoadOptions, Pixels};
use log::info;
use rayon::prelude::*;

/// A decoded image together with the entry it was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub entry: ImageEntry,
    pub pixels: Pixels,
}

impl Sample {
    /// `true` when the image belongs to a defect class.
    pub fn is_anomalous(&self) -> bool {
        self.entry.is_anomalous()
    }
}

/// Snapshot of the entries of a single split, taken when it was built. Images
/// are decoded only when requested.
#[derive(Debug, Clone)]
pub struct SplitDataset {
    split: Split,
    entries: Vec<ImageEntry>,
}

impl SplitDataset {
    pub fn new(split: Split, entries: Vec<ImageEntry>) -> Self {
        Self { split, entries }
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    /// Decodes the image at `index`.
    pub fn get(&self, index: usize, opts: &LoadOptions) -> Result<Sample> {
        let entry = self
            .entries
            .get(index)
            .ok_or(DatasetError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })?;
        load_sample(entry, opts)
    }

    /// Decodes every image of the split in parallel, keeping the entry order.
    pub fn load_all(&self, opts: &LoadOptions) -> Result<Vec<Sample>> {
        info!("decoding {} {} images", self.entries.len(), self.split);
        measure_time!(format!("decoding {} split", self.split), || {
            self.entries
                .par_iter()
                .map(|entry| load_sample(entry, opts))
                .collect::<Result<Vec<_>>>()
        })
    }
}

fn load_sample(entry: &ImageEntry, opts: &LoadOptions) -> Result<Sample> {
    let pixels = image_ops::load_pixels(&entry.path, opts)?;
    Ok(Sample {
        entry: entry.clone(),
        pixels,
    })
}
