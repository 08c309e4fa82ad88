use super::{DEFAULT_CATEGORY, DEFAULT_DATA_DIR};
use crate::image_ops::{ColorMode, LoadOptions};
use crate::utils::{parse_dimensions, parse_number};
use anyhow::Result;

#[derive(Debug)]
pub struct IndexOptions<'a> {
    pub data_dir: &'a str,
    pub category: &'a str,
    pub split: &'a str,
    pub index: Option<usize>,
    pub load: LoadOptions,
    pub json: bool,
}

impl Default for IndexOptions<'_> {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR,
            category: DEFAULT_CATEGORY,
            split: "train",
            index: None,
            load: LoadOptions::default(),
            json: false,
        }
    }
}
impl<'a> IndexOptions<'a> {
    pub fn new(args: &'a clap::ArgMatches) -> Result<Self> {
        let mut opts = Self::default();
        if let Some(path) = args.value_of("data-dir") {
            opts.data_dir = path;
        }
        if let Some(category) = args.value_of("category") {
            opts.category = category;
        }
        if let Some(split) = args.value_of("split") {
            opts.split = split;
        }
        if let Some(index) = args.value_of("index") {
            opts.index = Some(parse_number(index, "index")?);
        }
        if let Some(dims) = args.value_of("dimensions") {
            opts.load.dimensions = Some(parse_dimensions(dims)?);
        }
        if args.is_present("grayscale") {
            opts.load.color = ColorMode::Luma;
        }
        if args.is_present("json") {
            opts.json = true;
        }

        Ok(opts)
    }
}
