use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Suffix appended to the name of an input file to form the name of its profile.
pub const PROFILE_SUFFIX: &str = ".profile";

/// Path of the profile for a given sequence file, placed in `out_dir`.
///
/// The full file name of the input is kept, e.g. `data/genome.fna.gz` becomes
/// `<out_dir>/genome.fna.gz.profile`.
pub fn profile_path(seq_file: &Path, out_dir: &Path) -> Result<PathBuf> {
    let file_name = seq_file
        .file_name()
        .with_context(|| format!("Input path {} has no file name", seq_file.display()))?;

    let mut profile_name = file_name.to_os_string();
    profile_name.push(PROFILE_SUFFIX);

    Ok(out_dir.join(profile_name))
}
