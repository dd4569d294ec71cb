//! Parsing of STASHmaster tables, which map STASH codes to field names and metadata.

use super::{utils, Verbosity};
use lazy_static::lazy_static;
use num;
use regex::Regex;
use std::{
    collections::BTreeMap,
    env, io,
    path::{Path, PathBuf},
    str, string,
};

/// Environment variable pointing to the UM installation root.
pub const UMDIR_ENV_VAR: &str = "UMDIR";

lazy_static! {
    static ref ENTRY_LINE_REGEX: Regex = Regex::new(r"^\s*([1-5])\s*\|(.*)$").unwrap();
    static ref HEADER_LINE_REGEX: Regex =
        Regex::new(r"^\s*H([1-9])\s*\|\s*([^=]*?)\s*=\s*(.*?)\s*$").unwrap();
}

/// A single entry of a STASHmaster table.
#[derive(Clone, Debug, PartialEq)]
pub struct StashEntry {
    pub model: i64,
    pub section: i64,
    pub item: i64,
    pub name: String,
    pub space: i64,
    pub point: i64,
    pub time: i64,
    pub grid: i64,
    pub level_type: i64,
    pub first_level: i64,
    pub last_level: i64,
    pub pseudo_type: i64,
    pub first_pseudo: i64,
    pub last_pseudo: i64,
    pub level_compression: i64,
    pub option_codes: String,
    pub version_mask: String,
    pub halo: i64,
    pub data_type: i64,
    pub dump_packing: i64,
    pub packing_codes: [i64; 10],
    pub rotate: i64,
    pub pp_field_code: i64,
    pub user: i64,
    pub lbvc: i64,
    pub blev: i64,
    pub tlev: i64,
    pub rblevv: i64,
    pub cfll: i64,
    pub cfff: i64,
}

impl StashEntry {
    /// Returns the STASH code of the entry, `section * 1000 + item`.
    pub fn code(&self) -> i64 {
        stash_code(self.section, self.item)
    }

    /// Whether this entry is the mark terminating a table.
    pub fn is_end_mark(&self) -> bool {
        self.model == -1 && self.section == -1 && self.item == -1
    }
}

/// Combines a section and item number into a STASH code.
pub fn stash_code(section: i64, item: i64) -> i64 {
    section * 1000 + item
}

/// A collection of STASHmaster entries indexed by STASH code.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StashMaster {
    headers: Vec<(String, String)>,
    entries: BTreeMap<i64, StashEntry>,
}

impl StashMaster {
    /// Reads the STASHmaster table at the given path.
    pub fn from_file<P: AsRef<Path>>(file_path: P, verbosity: Verbosity) -> io::Result<Self> {
        let file_path = file_path.as_ref();
        if verbosity.print_messages() {
            println!("Reading STASHmaster from {}", file_path.display());
        }
        let text = utils::read_text_file(file_path)?;
        Self::parse(&text).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Invalid STASHmaster {}: {}", file_path.display(), err),
            )
        })
    }

    /// Reads and merges the STASHmaster tables at the given paths, with entries
    /// in later tables replacing entries with the same code in earlier ones.
    pub fn from_files<P: AsRef<Path>>(file_paths: &[P], verbosity: Verbosity) -> io::Result<Self> {
        let mut stashmaster = Self::default();
        for file_path in file_paths {
            stashmaster.merge(Self::from_file(file_path, verbosity)?);
        }
        Ok(stashmaster)
    }

    /// Parses the given STASHmaster text.
    pub fn parse(text: &str) -> io::Result<Self> {
        let mut stashmaster = Self::default();
        let mut pending: Vec<(usize, String)> = Vec::with_capacity(5);

        for (line_idx, line) in text.lines().enumerate() {
            let line_number = line_idx + 1;
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Some(captures) = HEADER_LINE_REGEX.captures(line) {
                stashmaster
                    .headers
                    .push((captures[2].to_string(), captures[3].to_string()));
                continue;
            }
            let captures = ENTRY_LINE_REGEX.captures(line).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Unexpected content on line {}: {}", line_number, line),
                )
            })?;
            let line_kind: usize = captures[1].parse().map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid line number on line {}", line_number),
                )
            })?;
            if line_kind != pending.len() + 1 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Expected entry line {} but found line {} on line {}",
                        pending.len() + 1,
                        line_kind,
                        line_number
                    ),
                ));
            }
            pending.push((line_number, captures[2].to_string()));

            if pending.len() == 1 {
                let columns = split_columns(&pending[0].1);
                if columns.first().map(|model| model.trim()) == Some("-1") {
                    pending.clear();
                    break;
                }
            }
            if pending.len() == 5 {
                let entry = parse_entry(&pending)?;
                stashmaster.entries.insert(entry.code(), entry);
                pending.clear();
            }
        }
        if !pending.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Incomplete entry starting on line {}", pending[0].0),
            ));
        }
        Ok(stashmaster)
    }

    /// Adds the entries of the given table, replacing entries with the same code.
    pub fn merge(&mut self, other: Self) {
        for header in other.headers {
            if !self.headers.contains(&header) {
                self.headers.push(header);
            }
        }
        self.entries.extend(other.entries);
    }

    /// Returns a table with only the entries in the given section.
    pub fn by_section(&self, section: i64) -> Self {
        Self {
            headers: self.headers.clone(),
            entries: self
                .entries
                .iter()
                .filter(|(_, entry)| entry.section == section)
                .map(|(&code, entry)| (code, entry.clone()))
                .collect(),
        }
    }

    /// Returns the entries whose name contains a match for the given regular expression.
    pub fn by_regex(&self, pattern: &str) -> io::Result<Vec<&StashEntry>> {
        let regex = Regex::new(pattern).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid field name pattern {}: {}", pattern, err),
            )
        })?;
        Ok(self
            .entries
            .values()
            .filter(|entry| regex.is_match(&entry.name))
            .collect())
    }

    /// Returns the entry with the given STASH code.
    pub fn get(&self, code: i64) -> Option<&StashEntry> {
        self.entries.get(&code)
    }

    /// Returns the value of the given header line.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header_key, _)| header_key == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Returns the path of the atmosphere STASHmaster of the given UM version
/// within the given UM installation.
pub fn installed_stashmaster_path<P: AsRef<Path>>(umdir: P, model_version: &str) -> PathBuf {
    umdir
        .as_ref()
        .join(format!("vn{}", model_version))
        .join("ctldata")
        .join("STASHmaster")
        .join("STASHmaster_A")
}

/// Returns the path of the installed atmosphere STASHmaster of the given UM
/// version, using the UM installation pointed to by `UMDIR`.
pub fn stashmaster_path_from_env(model_version: &str) -> io::Result<PathBuf> {
    let umdir = env::var_os(UMDIR_ENV_VAR).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!(
                "No STASHmaster specified and {} is not set",
                UMDIR_ENV_VAR
            ),
        )
    })?;
    Ok(installed_stashmaster_path(umdir, model_version))
}

fn split_columns(content: &str) -> Vec<&str> {
    let mut columns: Vec<&str> = content.split('|').map(str::trim).collect();
    if columns.last().map_or(false, |last| last.is_empty()) {
        columns.pop();
    }
    columns
}

fn parse_number<T>(value: &str, line_number: usize) -> io::Result<T>
where
    T: num::Num + str::FromStr,
    T::Err: string::ToString,
{
    value.trim().parse::<T>().map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Failed parsing {} on line {}: {}",
                value,
                line_number,
                err.to_string()
            ),
        )
    })
}

fn parse_columns(line_number: usize, content: &str, expected: usize) -> io::Result<Vec<&str>> {
    let columns = split_columns(content);
    if columns.len() < expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Expected {} columns on line {}, found {}",
                expected,
                line_number,
                columns.len()
            ),
        ));
    }
    Ok(columns)
}

fn parse_entry(lines: &[(usize, String)]) -> io::Result<StashEntry> {
    let (number1, content1) = &lines[0];
    let (number2, content2) = &lines[1];
    let (number3, content3) = &lines[2];
    let (number4, content4) = &lines[3];
    let (number5, content5) = &lines[4];

    let line1 = parse_columns(*number1, content1, 4)?;
    let line2 = parse_columns(*number2, content2, 11)?;
    let line3 = parse_columns(*number3, content3, 3)?;
    let line4 = parse_columns(*number4, content4, 3)?;
    let line5 = parse_columns(*number5, content5, 9)?;

    let int1 = |idx: usize| parse_number::<i64>(line1[idx], *number1);
    let int2 = |idx: usize| parse_number::<i64>(line2[idx], *number2);
    let int5 = |idx: usize| parse_number::<i64>(line5[idx], *number5);

    let packing_values = line4[2]
        .split_whitespace()
        .map(|value| parse_number::<i64>(value, *number4))
        .collect::<io::Result<Vec<_>>>()?;
    let packing_codes: [i64; 10] = packing_values.as_slice().try_into().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Expected 10 packing codes on line {}, found {}",
                number4,
                packing_values.len()
            ),
        )
    })?;

    Ok(StashEntry {
        model: int1(0)?,
        section: int1(1)?,
        item: int1(2)?,
        name: line1[3].to_string(),
        space: int2(0)?,
        point: int2(1)?,
        time: int2(2)?,
        grid: int2(3)?,
        level_type: int2(4)?,
        first_level: int2(5)?,
        last_level: int2(6)?,
        pseudo_type: int2(7)?,
        first_pseudo: int2(8)?,
        last_pseudo: int2(9)?,
        level_compression: int2(10)?,
        option_codes: line3[0].to_string(),
        version_mask: line3[1].to_string(),
        halo: parse_number(line3[2], *number3)?,
        data_type: parse_number(line4[0], *number4)?,
        dump_packing: parse_number(line4[1], *number4)?,
        packing_codes,
        rotate: int5(0)?,
        pp_field_code: int5(1)?,
        user: int5(2)?,
        lbvc: int5(3)?,
        blev: int5(4)?,
        tlev: int5(5)?,
        rblevv: int5(6)?,
        cfll: int5(7)?,
        cfff: int5(8)?,
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// A small STASHmaster table with two section 0 entries and one section 3 entry.
    pub const STASHMASTER_TEXT: &str = "\
H1| SUBMODEL_NUMBER=1
H2| SUBMODEL_NAME=ATMOS
H3| UM_VERSION=7.3
#
#|Model |Sectn | Item |Name                                |
#===============================================================================
1|    1 |    0 |    2 |U COMPNT OF WIND AFTER TIMESTEP     |
2|    2 |    0 |    1 |   18 |    2 |   10 |   11 |    0 |    0 |    0 |    0 |
3| 000000000000000000000000000000 | 00000000000000000001 |    3 |
4|    1 |    2 | -3  -3  -3  -3  -2  -2  -2  -2  -2  -2 |
5|    0 |   56 |    0 |   65 |    0 |    0 |    0 |    0 |    0 |
#
1|    1 |    0 |  896 |WOOD THINNING FRACTIONS             |
2|    2 |    0 |    1 |    1 |    5 |   -1 |   -1 |    0 |    0 |    0 |    0 |
3| 000000000000000000000000000000 | 00000000000000000001 |    0 |
4|    1 |    2 | -3  -3  -3  -3  -2  -2  -2  -2  -2  -2 |
5|    0 | 1693 |    0 |  129 |    0 |    0 |    0 |    0 |    0 |
#
1|    1 |    3 |  236 |TEMPERATURE AT 1.5M                 |
2|    0 |    0 |    1 |    1 |    5 |   -1 |   -1 |    0 |    0 |    0 |    0 |
3| 000000000000000000000000000000 | 00000000000000000001 |    0 |
4|    1 |    2 | -3  -3  -3  -3  -2  -2  -2  -2  -2  -2 |
5|    0 |   16 |    0 |  129 |    0 |    0 |    0 |    0 |    0 |
#
1|   -1 |   -1 |   -1 |END OF FILE MARK                    |
";

    #[test]
    fn entries_and_headers_are_parsed() {
        let stashmaster = StashMaster::parse(STASHMASTER_TEXT).unwrap();
        assert_eq!(stashmaster.len(), 3);
        assert_eq!(stashmaster.header("UM_VERSION"), Some("7.3"));

        let entry = stashmaster.get(3236).unwrap();
        assert_eq!(entry.name, "TEMPERATURE AT 1.5M");
        assert_eq!(entry.pp_field_code, 16);
        assert_eq!(entry.packing_codes[4], -2);
        assert_eq!(stashmaster.get(896).unwrap().grid, 1);
    }

    #[test]
    fn section_filter_and_name_search_work() {
        let stashmaster = StashMaster::parse(STASHMASTER_TEXT).unwrap().by_section(0);
        assert_eq!(stashmaster.len(), 2);
        assert!(stashmaster.by_regex("TEMPERATURE").unwrap().is_empty());

        let matches = stashmaster.by_regex("WOOD THINNING").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].code(), 896);
        assert_eq!(stashmaster.by_regex("^U ").unwrap().len(), 1);
        assert!(stashmaster.by_regex("(").is_err());
    }

    #[test]
    fn later_tables_override_earlier_entries() {
        let mut stashmaster = StashMaster::parse(STASHMASTER_TEXT).unwrap();
        let user_table = "\
1|    1 |    0 |  896 |USER WOOD THINNING                  |
2|    2 |    0 |    1 |    1 |    5 |   -1 |   -1 |    0 |    0 |    0 |    0 |
3| 000000000000000000000000000000 | 00000000000000000001 |    0 |
4|    1 |    2 | -3  -3  -3  -3  -2  -2  -2  -2  -2  -2 |
5|    0 | 1693 |    0 |  129 |    0 |    0 |    0 |    0 |    0 |
";
        stashmaster.merge(StashMaster::parse(user_table).unwrap());
        assert_eq!(stashmaster.len(), 3);
        assert_eq!(stashmaster.get(896).unwrap().name, "USER WOOD THINNING");
    }

    #[test]
    fn incomplete_entries_are_rejected() {
        let text = "1|    1 |    0 |    2 |U WIND |\n2|    2 |    0 |\n";
        assert!(StashMaster::parse(text).is_err());
        let truncated = "1|    1 |    0 |    2 |U WIND |\n";
        assert!(StashMaster::parse(truncated).is_err());
    }

    #[test]
    fn installed_path_follows_umdir_layout() {
        assert_eq!(
            installed_stashmaster_path("/opt/um", "7.3"),
            PathBuf::from("/opt/um/vn7.3/ctldata/STASHmaster/STASHmaster_A")
        );
    }
}
