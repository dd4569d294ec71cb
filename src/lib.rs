//! The `umkit` crate provides tools for maintaining Unified Model climate
//! runs between simulation years.

pub mod error;
pub mod field;
pub mod io;
pub mod run;
pub mod site;

#[cfg(feature = "cli")]
pub mod cli;
