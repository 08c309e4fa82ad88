use super::DEFAULT_ARCHIVE;
use crate::dataset::DEFAULT_DATA_DIR;
use anyhow::Result;

#[derive(Debug)]
pub struct ExtractOptions<'a> {
    pub archive_path: &'a str,
    pub destination_dir: &'a str,
}

impl Default for ExtractOptions<'_> {
    fn default() -> Self {
        Self {
            archive_path: DEFAULT_ARCHIVE,
            destination_dir: DEFAULT_DATA_DIR,
        }
    }
}
impl<'a> ExtractOptions<'a> {
    pub fn new(args: &'a clap::ArgMatches) -> Result<Self> {
        let mut opts = Self::default();
        if let Some(path) = args.value_of("archive") {
            opts.archive_path = path;
        }
        if let Some(path) = args.value_of("data-dir") {
            opts.destination_dir = path;
        }

        Ok(opts)
    }
}
