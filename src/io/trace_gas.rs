//! Reading of yearly greenhouse gas reference tables.

use super::utils;
use std::{io, path::Path};

/// Number of gas columns following the year in each table row.
pub const NUM_TRACE_GASES: usize = 9;

/// Radiation namelist keys receiving the gas mass mixing ratios, in table column order.
pub const TRACE_GAS_NAMELIST_KEYS: [&str; NUM_TRACE_GASES] = [
    "co2_mmr",
    "ch4mmr",
    "n2ommr",
    "c11mmr",
    "c12mmr",
    "c113mmr",
    "hcfc22mmr",
    "hfc125mmr",
    "hfc134ammr",
];

/// Mass mixing ratios of the radiatively active trace gases for a single year.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceGasConcentrations {
    pub year: i32,
    pub co2: f64,
    pub ch4: f64,
    pub n2o: f64,
    pub cfc11: f64,
    pub cfc12: f64,
    pub cfc113: f64,
    pub hcfc22: f64,
    pub hfc125: f64,
    pub hfc134a: f64,
}

impl TraceGasConcentrations {
    fn from_row(year: i32, values: [f64; NUM_TRACE_GASES]) -> Self {
        let [co2, ch4, n2o, cfc11, cfc12, cfc113, hcfc22, hfc125, hfc134a] = values;
        Self {
            year,
            co2,
            ch4,
            n2o,
            cfc11,
            cfc12,
            cfc113,
            hcfc22,
            hfc125,
            hfc134a,
        }
    }

    /// Returns the mixing ratios in table column order.
    pub fn values(&self) -> [f64; NUM_TRACE_GASES] {
        [
            self.co2,
            self.ch4,
            self.n2o,
            self.cfc11,
            self.cfc12,
            self.cfc113,
            self.hcfc22,
            self.hfc125,
            self.hfc134a,
        ]
    }

    /// Returns each mixing ratio paired with its radiation namelist key.
    pub fn namelist_entries(&self) -> impl Iterator<Item = (&'static str, f64)> {
        TRACE_GAS_NAMELIST_KEYS.into_iter().zip(self.values())
    }
}

/// Reads the row for the given year from the table file at the given path.
pub fn read_trace_gas_concentrations<P: AsRef<Path>>(
    file_path: P,
    year: i32,
) -> io::Result<TraceGasConcentrations> {
    let file_path = file_path.as_ref();
    let text = utils::read_text_file(file_path)?;
    parse_trace_gas_concentrations(&text, year).map_err(|err| {
        io::Error::new(err.kind(), format!("{} in {}", err, file_path.display()))
    })
}

/// Finds the first row of the given table text whose leading value is the
/// given year and parses its gas columns.
pub fn parse_trace_gas_concentrations(text: &str, year: i32) -> io::Result<TraceGasConcentrations> {
    for (line_idx, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let leading_value = match tokens.next().and_then(|token| token.parse::<f64>().ok()) {
            Some(value) => value,
            None => continue,
        };
        if leading_value != f64::from(year) {
            continue;
        }
        let values = tokens
            .map(|token| {
                token.parse::<f64>().map_err(|err| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Invalid value {} on line {}: {}", token, line_idx + 1, err),
                    )
                })
            })
            .collect::<io::Result<Vec<_>>>()?;
        let values: [f64; NUM_TRACE_GASES] = values.as_slice().try_into().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Expected {} values after the year on line {}, found {}",
                    NUM_TRACE_GASES,
                    line_idx + 1,
                    values.len()
                ),
            )
        })?;
        return Ok(TraceGasConcentrations::from_row(year, values));
    }
    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("No trace gas row for year {}", year),
    ))
}
