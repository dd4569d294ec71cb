//! Yearly update of the wood thinning fractions in a restart dump.

use crate::{
    field::replace,
    io::{netcdf, Endianness, Verbosity},
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub const DEFAULT_STASHMASTER_PATH: &str = "work/atmosphere/INPUT/STASHmaster/STASHmaster_A";
pub const DEFAULT_STASH_SECTION: i64 = 0;
pub const DEFAULT_BASE_YEAR: i64 = 1850;
pub const DEFAULT_FIELD_NAME: &str = "WOOD THINNING";
pub const DEFAULT_VARIABLE_NAME: &str = "fractions";

/// Suffix appended to the path of the restart file kept as backup.
pub const BACKUP_SUFFIX: &str = "_orig";

/// Parameters of a thinning update.
#[derive(Clone, Debug)]
pub struct ThinningUpdate {
    pub restart_file: PathBuf,
    pub thinning_file: PathBuf,
    pub stash_paths: String,
    pub stash_section: i64,
    pub base_year: i64,
    pub field_name: String,
    pub variable_name: String,
}

impl ThinningUpdate {
    /// Creates an update of the given restart file from the given thinning
    /// file, using default values for the remaining parameters.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(restart_file: P, thinning_file: Q) -> Self {
        Self {
            restart_file: restart_file.as_ref().to_path_buf(),
            thinning_file: thinning_file.as_ref().to_path_buf(),
            stash_paths: DEFAULT_STASHMASTER_PATH.to_string(),
            stash_section: DEFAULT_STASH_SECTION,
            base_year: DEFAULT_BASE_YEAR,
            field_name: DEFAULT_FIELD_NAME.to_string(),
            variable_name: DEFAULT_VARIABLE_NAME.to_string(),
        }
    }

    /// Path where the original restart file is kept.
    pub fn backup_path(&self) -> PathBuf {
        let mut path = self.restart_file.clone().into_os_string();
        path.push(BACKUP_SUFFIX);
        PathBuf::from(path)
    }
}

/// Computes the index into the time dimension of the thinning data for the
/// given model year.
pub fn time_index_for_year(model_year: i64, base_year: i64) -> io::Result<usize> {
    if model_year < base_year {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Model year {} precedes the base year {} of the thinning data",
                model_year, base_year
            ),
        ))
    } else {
        Ok((model_year - base_year) as usize)
    }
}

/// Replaces the thinning field of the restart file with the data for the
/// validity year of the restart.
///
/// The new file is written to a temporary directory next to the restart
/// file. The original restart file is then moved to the backup path and the
/// new file is copied into its place.
pub fn update_thinning(update: &ThinningUpdate, verbosity: Verbosity) -> io::Result<()> {
    let mut file = replace::open_fields_file(
        &update.restart_file,
        Some(update.stash_paths.as_str()),
        update.stash_section,
        Endianness::Big,
        verbosity,
    )?;

    let model_year = file.fixed_length_header().t2_year();
    let time_index = time_index_for_year(model_year, update.base_year)?;
    if verbosity.print_messages() {
        println!(
            "Using thinning data for {} (time index {})",
            model_year, time_index
        );
    }

    let source = netcdf::read_variable(&update.thinning_file, &update.variable_name, verbosity)?;
    replace::replace_field(
        &mut file,
        &update.field_name,
        source,
        Some(time_index),
        verbosity,
    )?;

    let parent_dir = update
        .restart_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temporary_dir = tempfile::tempdir_in(parent_dir)?;
    let temporary_path = temporary_dir.path().join("restart");
    file.write_to_file(&temporary_path, verbosity)?;
    drop(file);

    let backup_path = update.backup_path();
    if verbosity.print_messages() {
        println!(
            "Moving {} to {}",
            update.restart_file.display(),
            backup_path.display()
        );
    }
    fs::rename(&update.restart_file, &backup_path)?;
    fs::copy(&temporary_path, &update.restart_file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_index_counts_from_base_year() {
        assert_eq!(time_index_for_year(1850, 1850).unwrap(), 0);
        assert_eq!(time_index_for_year(1978, 1850).unwrap(), 128);
        assert!(time_index_for_year(1849, 1850).is_err());
    }

    #[test]
    fn backup_path_has_suffix() {
        let update = ThinningUpdate::new("work/atmosphere/restart_dump.astart", "thin.nc");
        assert_eq!(
            update.backup_path(),
            PathBuf::from("work/atmosphere/restart_dump.astart_orig")
        );
        assert_eq!(update.base_year, DEFAULT_BASE_YEAR);
    }
}
