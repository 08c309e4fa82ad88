use anyhow::{anyhow, Result};
use regex::Regex;
use std::str::FromStr;

lazy_static! {
    /// Case-sensitive `*.png`, the only file names enumerated as images.
    pub static ref PNG_FILE_NAME_REGEX: Regex = Regex::new(r"^.+\.png$").unwrap();
}

pub fn is_png_file_name(name: &str) -> bool {
    PNG_FILE_NAME_REGEX.is_match(name)
}

pub fn parse_number<T: FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow!("Invalid value for {}: '{}'", name, value))
}

/// Parses dimensions in `WIDTHxHEIGHT` format, e.g. `256x256`.
pub fn parse_dimensions(value: &str) -> Result<(u32, u32)> {
    let parts = value.split('x').collect::<Vec<&str>>();
    if parts.len() != 2 {
        return Err(anyhow!(
            "Invalid dimensions '{}', expected format WIDTHxHEIGHT",
            value
        ));
    }
    let width: u32 = parse_number(parts[0], "width")?;
    let height: u32 = parse_number(parts[1], "height")?;
    if width == 0 || height == 0 {
        return Err(anyhow!("Dimensions must be non-zero, got '{}'", value));
    }
    Ok((width, height))
}
