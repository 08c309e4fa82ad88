//! Extraction and indexing of the MVTec anomaly detection dataset.
//!
//! The dataset ships as a tar archive whose content follows the layout
//!
//! ```text
//! <dataset_root>/<category>/train/<class>/*.png
//! <dataset_root>/<category>/test/<class>/*.png
//! <dataset_root>/<category>/ground_truth/<class>/*.png
//! ```
//!
//! [`archive::extract`] unpacks the archive and [`dataset::CategoryIndex`] walks one
//! category of the extracted tree without ever writing to it.

#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod macros;
pub mod archive;
pub mod dataset;
pub mod error;
pub mod image_ops;
pub mod utils;

pub use error::{DatasetError, ErrorKind, Result, Stage};
