use bincode::{deserialize_from, serialize_into};
use chrono::Utc;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::processor::ProcessingResult;

/// A saved processing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// RFC 3339 time the snapshot was written.
    pub saved_at: String,
    pub results: Vec<ProcessingResult>,
}

impl Snapshot {
    pub fn new(results: Vec<ProcessingResult>) -> Self {
        Snapshot {
            saved_at: Utc::now().to_rfc3339(),
            results,
        }
    }
}

/// Save a snapshot as gzip-compressed bincode
///
/// # Arguments
/// * `snapshot` - The run to persist
/// * `path` - Destination, conventionally ending in `.bin.gz`
///
/// # Returns
/// * `Result<()>` - An I/O or codec error if the file cannot be written
///
/// # Examples
/// ```no_run
/// use whipgen::saving::{Snapshot, save_snapshot};
///
/// let snapshot = Snapshot::new(Vec::new());
/// if let Err(e) = save_snapshot(&snapshot, "run.bin.gz") {
///     eprintln!("Failed to save snapshot: {}", e);
/// }
/// ```
pub fn save_snapshot(snapshot: &Snapshot, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, snapshot)?;

    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.finish()?.flush()?;
    Ok(())
}

/// Load a snapshot written by [`save_snapshot`]
///
/// # Arguments
/// * `path` - Path to the `.bin.gz` file
///
/// # Returns
/// * `Result<Snapshot>` - The restored run or an I/O / codec error
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let snapshot: Snapshot = deserialize_from(&mut reader)?;
    Ok(snapshot)
}
