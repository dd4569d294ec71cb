//! Reading of the restart calendar record written by the UM driver.

use super::utils;
use crate::io_result;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::{io, path::Path};

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// The restart calendar of a UM run, typically stored in `um.res.yaml`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RestartCalendar {
    #[serde(deserialize_with = "de_date_time")]
    end_date: NaiveDateTime,
}

impl RestartCalendar {
    /// Reads the calendar record at the given path.
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> io::Result<Self> {
        let file_path = file_path.as_ref();
        let text = utils::read_text_file(file_path)?;
        Self::parse(&text).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid calendar file {}: {}", file_path.display(), err),
            )
        })
    }

    pub fn parse(text: &str) -> io::Result<Self> {
        io_result!(serde_yaml::from_str(text))
    }

    /// The date and time at which the previous run ended.
    pub fn end_date(&self) -> NaiveDateTime {
        self.end_date
    }

    /// The year the next run starts in.
    pub fn restart_year(&self) -> i32 {
        self.end_date.year()
    }
}

/// Parses a date of the form `YYYY-MM-DD[ HH:MM:SS]`, where the year may have
/// leading zeros.
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn de_date_time<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_date_time(&text)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date {}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_date_with_padded_year_is_parsed() {
        let calendar = RestartCalendar::parse("end_date: 0101-01-01 00:00:00\n").unwrap();
        assert_eq!(calendar.restart_year(), 101);

        let calendar =
            RestartCalendar::parse("end_date: 1979-01-01 00:00:00\nrun_time: 31536000\n").unwrap();
        assert_eq!(calendar.restart_year(), 1979);
    }

    #[test]
    fn date_only_and_invalid_dates_are_handled() {
        assert_eq!(
            RestartCalendar::parse("end_date: '1851-01-01'\n")
                .unwrap()
                .restart_year(),
            1851
        );
        assert!(RestartCalendar::parse("end_date: soon\n").is_err());
        assert!(RestartCalendar::parse("start_date: 1850-01-01 00:00:00\n").is_err());
    }
}
