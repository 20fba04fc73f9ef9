// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Writes generated output files.
//!
//! Each write replaces the previous file entirely; parent directories are
//! created on demand.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path
};

use tracing::debug;

use crate::error::{self, Error};

/// Writes `contents` to `path`, creating missing parent directories and
/// truncating any existing file.
///
/// # Errors
///
/// Returns [`Error::ArtifactIo`] when a directory or the file cannot be
/// created or written.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use profile_stats::write_artifact;
///
/// # fn main() -> Result<(), profile_stats::Error> {
/// write_artifact(Path::new("assets/github-stats.svg"), "<svg/>")?;
/// # Ok(())
/// # }
/// ```
pub fn write_artifact(path: &Path, contents: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| error::artifact_io_error(parent, source))?;
    }

    debug!("Writing {} bytes to {}", contents.len(), path.display());
    let file = File::create(path).map_err(|source| error::artifact_io_error(path, source))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .map_err(|source| error::artifact_io_error(path, source))?;
    writer
        .flush()
        .map_err(|source| error::artifact_io_error(path, source))
}
