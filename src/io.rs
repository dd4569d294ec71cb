//! File input/output.

pub mod calendar;
pub mod fieldsfile;
pub mod namelist;
pub mod stashmaster;
pub mod trace_gas;
pub mod utils;

#[cfg(feature = "netcdf")]
pub mod netcdf;

/// Little- or big-endian byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Whether or not to print non-critical status messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Messages,
}

impl Verbosity {
    pub fn print_messages(&self) -> bool {
        matches!(self, Self::Messages)
    }
}

impl From<bool> for Verbosity {
    fn from(verbose: bool) -> Self {
        if verbose {
            Self::Messages
        } else {
            Self::Quiet
        }
    }
}

/// How to handle existing files at output paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverwriteMode {
    Ask,
    Always,
    Never,
}
