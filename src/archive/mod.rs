pub mod options;

use crate::error::{DatasetError, Result};
use crate::macros::LogType;
use flate2::read::GzDecoder;
use log::{debug, info, trace, warn};
use std::cell::Cell;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::rc::Rc;
use tar::Archive;

pub const DEFAULT_ARCHIVE: &str = "mvtec_anomaly_detection.tar";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Unpacks the tar archive at `archive_path` into `destination_dir`, keeping the
/// archive's relative paths. Gzip-compressed archives are detected by their magic
/// bytes, everything else is read as a plain tar stream.
///
/// Extraction is not transactional: when it fails halfway (corrupt stream, full
/// disk, interrupted process) the entries unpacked so far stay in
/// `destination_dir` and nothing is rolled back.
pub fn extract(archive_path: &Path, destination_dir: &Path) -> Result<()> {
    info!(
        "extracting {} into {}",
        archive_path.display(),
        destination_dir.display()
    );
    let mut reader = open_archive(archive_path)?;
    let head = reader
        .fill_buf()
        .map_err(|source| DatasetError::ArchiveNotFound {
            path: archive_path.to_path_buf(),
            source,
        })?;
    if head.is_empty() {
        return Err(DatasetError::CorruptArchive {
            path: archive_path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "empty file"),
        });
    }
    let is_gzip = head.starts_with(&GZIP_MAGIC);

    fs::create_dir_all(destination_dir)
        .map_err(|source| destination_error(destination_dir, source))?;

    let count = measure_time!(
        format!("extracting {}", archive_path.display()),
        || {
            if is_gzip {
                debug!("{} is gzip compressed", archive_path.display());
                unpack_entries(GzDecoder::new(reader), archive_path, destination_dir)
            } else {
                unpack_entries(reader, archive_path, destination_dir)
            }
        },
        LogType::Info
    )?;
    info!("extracted {} entries", count);
    Ok(())
}

fn open_archive(archive_path: &Path) -> Result<BufReader<File>> {
    let not_found = |source| DatasetError::ArchiveNotFound {
        path: archive_path.to_path_buf(),
        source,
    };
    let file = File::open(archive_path).map_err(not_found)?;
    if !file.metadata().map_err(not_found)?.is_file() {
        return Err(not_found(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok(BufReader::new(file))
}

/// Read side of the archive. It remembers whether the stream ran dry or failed, so
/// that an error raised by `unpack_in` can be blamed on the archive rather than
/// on the destination.
struct TrackedReader<R> {
    inner: R,
    exhausted: Rc<Cell<bool>>,
}

impl<R: Read> Read for TrackedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.exhausted.set(true);
                Ok(0)
            }
            Err(err) => {
                if err.kind() != io::ErrorKind::Interrupted {
                    self.exhausted.set(true);
                }
                Err(err)
            }
            res => res,
        }
    }
}

fn unpack_entries<R: Read>(
    reader: R,
    archive_path: &Path,
    destination_dir: &Path,
) -> Result<usize> {
    let corrupt = |source| DatasetError::CorruptArchive {
        path: archive_path.to_path_buf(),
        source,
    };
    let exhausted = Rc::new(Cell::new(false));
    let mut archive = Archive::new(TrackedReader {
        inner: reader,
        exhausted: Rc::clone(&exhausted),
    });
    let mut seen = 0;
    let mut count = 0;
    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        seen += 1;
        let entry_path = entry.path().map_err(corrupt)?.into_owned();
        trace!("unpacking {}", entry_path.display());
        let unpacked = entry.unpack_in(destination_dir).map_err(|source| {
            unpack_error(archive_path, destination_dir, source, exhausted.get())
        })?;
        if unpacked {
            count += 1;
        } else {
            warn!(
                "skipped entry {} pointing outside of {}",
                entry_path.display(),
                destination_dir.display()
            );
        }
    }
    if seen == 0 {
        return Err(corrupt(io::Error::new(
            io::ErrorKind::InvalidData,
            "no tar header found",
        )));
    }
    Ok(count)
}

fn destination_error(destination_dir: &Path, source: io::Error) -> DatasetError {
    let path = destination_dir.to_path_buf();
    match source.kind() {
        io::ErrorKind::PermissionDenied => DatasetError::DestinationNotWritable { path, source },
        _ => DatasetError::ExtractIo { path, source },
    }
}

/// tar reports short entry data as `ErrorKind::Other`, so the state of the
/// archive stream decides whether the archive or the destination is at fault.
fn unpack_error(
    archive_path: &Path,
    destination_dir: &Path,
    source: io::Error,
    stream_exhausted: bool,
) -> DatasetError {
    if stream_exhausted || source.kind() == io::ErrorKind::UnexpectedEof {
        DatasetError::CorruptArchive {
            path: archive_path.to_path_buf(),
            source,
        }
    } else {
        destination_error(destination_dir, source)
    }
}
