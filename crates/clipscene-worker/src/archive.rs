//! Zip packaging of a job's clips.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PipelineError, PipelineResult};

/// File name of a job's archive inside the clips directory.
pub fn archive_name(job_id: &str) -> String {
    format!("clips_{}.zip", job_id)
}

/// Write `files` into a zip at `dest`, one stored entry per file named by its
/// file name. Missing files are skipped. Returns the number of entries.
///
/// The zip is built in a temporary file next to `dest` and renamed into place,
/// so concurrent writers never interleave and readers see a complete archive.
pub async fn write_archive(dest: PathBuf, files: Vec<PathBuf>) -> PipelineResult<usize> {
    tokio::task::spawn_blocking(move || write_zip(&dest, &files))
        .await
        .map_err(|e| PipelineError::archive(format!("archive task failed: {}", e)))?
}

fn write_zip(dest: &Path, files: &[PathBuf]) -> PipelineResult<usize> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut zip = ZipWriter::new(NamedTempFile::new_in(dir)?);
    // clips are already compressed video
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut entries = 0;

    for path in files {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        let mut source = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping clip missing from archive");
                continue;
            }
        };
        zip.start_file(name, options)?;
        io::copy(&mut source, &mut zip)?;
        entries += 1;
    }

    zip.finish()?.persist(dest).map_err(|e| e.error)?;
    debug!(archive = %dest.display(), entries, "Wrote clip archive");
    Ok(entries)
}
