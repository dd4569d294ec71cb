//! Tasks performed between the yearly runs of a coupled model experiment.

pub mod co2;
pub mod trace_gas;

#[cfg(feature = "netcdf")]
pub mod thinning;

/// Environment variable holding the zero-based counter of the current run.
pub const DEFAULT_RUN_COUNTER_VAR: &str = "PAYU_CURRENT_RUN";

/// Default path of the atmosphere namelist file.
pub const DEFAULT_NAMELIST_PATH: &str = "work/atmosphere/namelists";

/// Default path of the restart calendar record.
pub const DEFAULT_CALENDAR_PATH: &str = "work/atmosphere/um.res.yaml";
