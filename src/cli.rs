//! Command line interface.

pub mod build;
pub mod check_co2_year;
pub mod completions;
pub mod hide_url_segment;
pub mod inspect;
pub mod run;
pub mod update_trace_gases;
pub mod utils;

#[cfg(feature = "netcdf")]
pub mod replace_field;

#[cfg(feature = "netcdf")]
pub mod update_thinning;
