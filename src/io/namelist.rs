//! Reading and in-place editing of Fortran namelist files.
//!
//! Values are parsed from the text, but the text itself is kept as the
//! authoritative representation. Updating a value splices the new value text
//! into the original text, so the layout and comments of the file survive.

use super::utils::{self, AtomicOutputPath};
use lazy_static::lazy_static;
use regex::Regex;
use std::{fmt, io, io::Write, ops::Range, path::Path};

lazy_static! {
    static ref REPEAT_REGEX: Regex = Regex::new(r"^(\d+)\*(.*)$").unwrap();
}

/// A single value in a namelist.
#[derive(Clone, Debug, PartialEq)]
pub enum NamelistValue {
    Integer(i64),
    Real(f64),
    Logical(bool),
    Text(String),
    /// An element explicitly left empty, as in `x = 1, , 3`.
    Null,
}

impl NamelistValue {
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Self::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match *self {
            Self::Integer(value) => Some(value as f64),
            Self::Real(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_logical(&self) -> Option<bool> {
        match *self {
            Self::Logical(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for NamelistValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Real(value) => write!(f, "{:?}", value),
            Self::Logical(true) => write!(f, ".true."),
            Self::Logical(false) => write!(f, ".false."),
            Self::Text(value) => write!(f, "'{}'", value.replace('\'', "''")),
            Self::Null => Ok(()),
        }
    }
}

/// An assignment of values to a variable, possibly starting at an array index.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    name: String,
    start_index: Vec<usize>,
    values: Vec<NamelistValue>,
    value_range: Range<usize>,
}

impl Assignment {
    /// The lowercase variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 1-based index tuple of the first assigned element, empty if none was given.
    pub fn start_index(&self) -> &[usize] {
        &self.start_index
    }

    pub fn values(&self) -> &[NamelistValue] {
        &self.values
    }

    /// Returns the value assigned to the element with the given index, if this
    /// assignment covers it. Successive values fill the first dimension.
    fn value_at(&self, index: &[usize]) -> Option<&NamelistValue> {
        let rank = index.len().max(self.start_index.len()).max(1);
        let start = padded_index(&self.start_index, rank);
        let index = padded_index(index, rank);
        if start[1..] != index[1..] || index[0] < start[0] {
            return None;
        }
        match self.values.get(index[0] - start[0]) {
            Some(NamelistValue::Null) | None => None,
            Some(value) => Some(value),
        }
    }
}

/// A namelist group `&name ... /`.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    name: String,
    assignments: Vec<Assignment>,
    terminator_offset: usize,
}

impl Group {
    /// The lowercase group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }
}

/// The text of a namelist file together with its parsed groups.
#[derive(Clone, Debug, PartialEq)]
pub struct Namelist {
    text: String,
    groups: Vec<Group>,
}

impl Namelist {
    /// Reads and parses the namelist file at the given path.
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> io::Result<Self> {
        let file_path = file_path.as_ref();
        let text = utils::read_text_file(file_path)?;
        Self::parse(text).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Invalid namelist file {}: {}", file_path.display(), err),
            )
        })
    }

    pub fn parse(text: String) -> io::Result<Self> {
        let groups = Scanner::new(&text).parse_groups()?;
        Ok(Self { text, groups })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Returns the group with the given case-insensitive name.
    pub fn group(&self, name: &str) -> Option<&Group> {
        let name = name.to_lowercase();
        self.groups.iter().find(|group| group.name == name)
    }

    fn group_index(&self, name: &str) -> io::Result<usize> {
        let lower_name = name.to_lowercase();
        self.groups
            .iter()
            .position(|group| group.name == lower_name)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Namelist group {} not found", name),
                )
            })
    }

    /// Returns the value of the element with the given 1-based index tuple of
    /// the given variable. Later assignments take precedence.
    pub fn get(&self, group_name: &str, variable: &str, index: &[usize]) -> io::Result<&NamelistValue> {
        let group = &self.groups[self.group_index(group_name)?];
        let variable_lower = variable.to_lowercase();
        group
            .assignments
            .iter()
            .rev()
            .filter(|assignment| assignment.name == variable_lower)
            .find_map(|assignment| assignment.value_at(index))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!(
                        "No value for {}{} in namelist group {}",
                        variable,
                        format_index(index),
                        group_name
                    ),
                )
            })
    }

    /// Returns the values of the last assignment to the given variable.
    pub fn get_all(&self, group_name: &str, variable: &str) -> io::Result<&[NamelistValue]> {
        let group = &self.groups[self.group_index(group_name)?];
        let variable_lower = variable.to_lowercase();
        group
            .assignments
            .iter()
            .rev()
            .find(|assignment| assignment.name == variable_lower)
            .map(|assignment| assignment.values.as_slice())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Variable {} not found in namelist group {}", variable, group_name),
                )
            })
    }

    /// Sets the values of the given variable.
    ///
    /// The value text of the last existing assignment is replaced. If the
    /// variable is not assigned in the group, a new assignment is added right
    /// before the group terminator.
    pub fn set(&mut self, group_name: &str, variable: &str, values: &[NamelistValue]) -> io::Result<()> {
        let group = &self.groups[self.group_index(group_name)?];
        let variable_lower = variable.to_lowercase();
        let value_text = values
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let mut text = self.text.clone();
        match group
            .assignments
            .iter()
            .rev()
            .find(|assignment| assignment.name == variable_lower)
        {
            Some(assignment) => {
                let range = assignment.value_range.clone();
                if range.is_empty() {
                    text.insert_str(range.start, &format!(" {}", value_text));
                } else {
                    text.replace_range(range, &value_text);
                }
            }
            None => {
                let offset = group.terminator_offset;
                let line_start = text[..offset].rfind('\n').map_or(0, |idx| idx + 1);
                let indentation = &text[line_start..offset];
                if indentation.trim().is_empty() {
                    let new_line = format!("{}{} = {}\n", indentation, variable_lower, value_text);
                    text.insert_str(line_start, &new_line);
                } else {
                    text.insert_str(offset, &format!("{} = {} ", variable_lower, value_text));
                }
            }
        }
        *self = Self::parse(text)?;
        Ok(())
    }

    /// Writes the namelist text to the given path, replacing any existing file.
    pub fn write_to_file<P: AsRef<Path>>(&self, output_file_path: P) -> io::Result<()> {
        let mut atomic_output = AtomicOutputPath::new(output_file_path)?;
        atomic_output
            .temporary_file_mut()
            .write_all(self.text.as_bytes())?;
        atomic_output.perform_replace()
    }
}

fn padded_index(index: &[usize], rank: usize) -> Vec<usize> {
    let mut padded = index.to_vec();
    padded.resize(rank, 1);
    padded
}

fn format_index(index: &[usize]) -> String {
    if index.is_empty() {
        String::new()
    } else {
        format!(
            "({})",
            index
                .iter()
                .map(|idx| idx.to_string())
                .collect::<Vec<_>>()
                .join(",")
        )
    }
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn line_number(&self, pos: usize) -> usize {
        self.bytes[..pos].iter().filter(|&&byte| byte == b'\n').count() + 1
    }

    fn error(&self, message: &str) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} on line {}", message, self.line_number(self.pos)),
        )
    }

    /// Skips whitespace and `!` comments.
    fn skip_blank(&mut self) {
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else if byte == b'!' {
                self.skip_line();
            } else {
                break;
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(byte) = self.peek() {
            if byte == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn read_identifier(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(byte) if byte.is_ascii_alphabetic() => self.pos += 1,
            _ => return None,
        }
        while let Some(byte) = self.peek() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'%' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Some(&self.text[start..self.pos])
    }

    fn parse_groups(mut self) -> io::Result<Vec<Group>> {
        let mut groups = Vec::new();
        loop {
            self.skip_blank();
            match self.peek() {
                None => break,
                Some(b'&') | Some(b'$') => self.pos += 1,
                Some(_) => {
                    // Text between groups is ignored up to the end of the line
                    self.skip_line();
                    continue;
                }
            }
            let name = match self.read_identifier() {
                Some(name) => name.to_lowercase(),
                None => continue,
            };
            if name == "end" {
                continue;
            }
            groups.push(self.parse_group_body(name)?);
        }
        Ok(groups)
    }

    fn parse_group_body(&mut self, name: String) -> io::Result<Group> {
        let mut assignments = Vec::new();
        loop {
            self.skip_blank();
            match self.peek() {
                None => return Err(self.error(&format!("Group {} is not terminated", name))),
                Some(b',') => self.pos += 1,
                Some(b'/') => {
                    let terminator_offset = self.pos;
                    self.pos += 1;
                    return Ok(Group {
                        name,
                        assignments,
                        terminator_offset,
                    });
                }
                Some(b'&') | Some(b'$') => {
                    let terminator_offset = self.pos;
                    self.pos += 1;
                    return match self.read_identifier() {
                        Some(end) if end.eq_ignore_ascii_case("end") => Ok(Group {
                            name,
                            assignments,
                            terminator_offset,
                        }),
                        _ => Err(self.error(&format!("Group {} is not terminated", name))),
                    };
                }
                Some(_) => assignments.push(self.parse_assignment()?),
            }
        }
    }

    fn parse_assignment(&mut self) -> io::Result<Assignment> {
        let name = self
            .read_identifier()
            .ok_or_else(|| self.error("Expected variable name"))?
            .to_lowercase();
        self.skip_blank();
        let start_index = if self.peek() == Some(b'(') {
            self.parse_index()?
        } else {
            Vec::new()
        };
        self.skip_blank();
        if self.peek() != Some(b'=') {
            return Err(self.error(&format!("Expected = after {}", name)));
        }
        self.pos += 1;

        let after_equals = self.pos;
        let mut values = Vec::new();
        let mut value_range: Option<Range<usize>> = None;
        let mut expecting_value = true;
        loop {
            self.skip_blank();
            let token_start = self.pos;
            match self.peek() {
                None | Some(b'/') | Some(b'&') | Some(b'$') => break,
                Some(b',') => {
                    if expecting_value {
                        values.push(NamelistValue::Null);
                    }
                    expecting_value = true;
                    self.pos += 1;
                    continue;
                }
                Some(b'\'') | Some(b'"') => {
                    values.push(NamelistValue::Text(self.read_quoted()?));
                }
                Some(_) => {
                    if self.at_assignment_start() {
                        break;
                    }
                    let token = self.read_bare_token();
                    values.extend(parse_token(token));
                }
            }
            expecting_value = false;
            value_range = Some(match value_range {
                Some(range) => range.start..self.pos,
                None => token_start..self.pos,
            });
        }
        Ok(Assignment {
            name,
            start_index,
            values,
            value_range: value_range.unwrap_or(after_equals..after_equals),
        })
    }

    fn parse_index(&mut self) -> io::Result<Vec<usize>> {
        let start = self.pos + 1;
        let end = self.bytes[start..]
            .iter()
            .position(|&byte| byte == b')')
            .map(|offset| start + offset)
            .ok_or_else(|| self.error("Unclosed index"))?;
        self.pos = end + 1;
        self.text[start..end]
            .split(',')
            .map(|component| {
                let first = component.split(':').next().unwrap_or("").trim();
                first
                    .parse::<usize>()
                    .map_err(|_| self.error(&format!("Invalid index {}", component.trim())))
            })
            .collect()
    }

    fn at_assignment_start(&mut self) -> bool {
        let saved = self.pos;
        let is_assignment = self.read_identifier().is_some() && {
            self.skip_blank();
            if self.peek() == Some(b'(') {
                match self.bytes[self.pos..].iter().position(|&byte| byte == b')') {
                    Some(offset) => self.pos += offset + 1,
                    None => self.pos = self.bytes.len(),
                }
                self.skip_blank();
            }
            self.peek() == Some(b'=')
        };
        self.pos = saved;
        is_assignment
    }

    fn read_quoted(&mut self) -> io::Result<String> {
        let quote = self.bytes[self.pos];
        self.pos += 1;
        let mut content = String::new();
        let mut segment_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error("Unterminated string")),
                Some(byte) if byte == quote => {
                    content.push_str(&self.text[segment_start..self.pos]);
                    self.pos += 1;
                    if self.peek() == Some(quote) {
                        content.push(quote as char);
                        self.pos += 1;
                        segment_start = self.pos;
                    } else {
                        return Ok(content);
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn read_bare_token(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() || matches!(byte, b',' | b'/' | b'!') {
                break;
            }
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }
}

fn parse_token(token: &str) -> Vec<NamelistValue> {
    if let Some(captures) = REPEAT_REGEX.captures(token) {
        if let Ok(count) = captures[1].parse::<usize>() {
            let value = if captures[2].is_empty() {
                NamelistValue::Null
            } else {
                parse_scalar(&captures[2])
            };
            return vec![value; count];
        }
    }
    vec![parse_scalar(token)]
}

fn parse_scalar(token: &str) -> NamelistValue {
    if token.len() >= 2 {
        let first = token.as_bytes()[0];
        if (first == b'\'' || first == b'"') && token.as_bytes()[token.len() - 1] == first {
            let quote = first as char;
            return NamelistValue::Text(
                token[1..token.len() - 1].replace(&format!("{}{}", quote, quote), &quote.to_string()),
            );
        }
    }
    if let Ok(value) = token.parse::<i64>() {
        return NamelistValue::Integer(value);
    }
    let lower = token.to_lowercase();
    match lower.as_str() {
        "t" | ".t" | ".t." | "true" | ".true" | ".true." => return NamelistValue::Logical(true),
        "f" | ".f" | ".f." | "false" | ".false" | ".false." => return NamelistValue::Logical(false),
        _ => {}
    }
    let exponent_form = lower.replace('d', "e");
    if exponent_form.contains(['.', 'e']) {
        if let Ok(value) = exponent_form.parse::<f64>() {
            return NamelistValue::Real(value);
        }
    }
    NamelistValue::Text(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMELIST_TEXT: &str = "\
 &CLMCHFCG
 L_CLMCHFCG=.TRUE.,
 CLIM_FCG_NYEARS= 2, 3*0 ! number of years
 CLIM_FCG_YEARS(1,1)= 1850, 1851,
 CLIM_FCG_YEARS(1,2)= 1900,
 /
 &RUN_RADIATION
 CO2_MMR=4.31d-4, ch4mmr = 0.8e-6,
 label = 'it''s', , 'done'
 &END
";

    #[test]
    fn values_are_parsed_by_index() {
        let namelist = Namelist::parse(NAMELIST_TEXT.to_string()).unwrap();
        assert_eq!(namelist.groups().len(), 2);
        assert_eq!(
            namelist.get("clmchfcg", "clim_fcg_years", &[1, 1]).unwrap(),
            &NamelistValue::Integer(1850)
        );
        assert_eq!(
            namelist.get("CLMCHFCG", "clim_fcg_years", &[2, 1]).unwrap(),
            &NamelistValue::Integer(1851)
        );
        assert_eq!(
            namelist.get("clmchfcg", "clim_fcg_years", &[1, 2]).unwrap(),
            &NamelistValue::Integer(1900)
        );
        assert!(namelist.get("clmchfcg", "clim_fcg_years", &[3, 1]).is_err());
        assert_eq!(
            namelist.get_all("clmchfcg", "clim_fcg_nyears").unwrap(),
            &[
                NamelistValue::Integer(2),
                NamelistValue::Integer(0),
                NamelistValue::Integer(0),
                NamelistValue::Integer(0)
            ]
        );
        assert_eq!(
            namelist.get("clmchfcg", "l_clmchfcg", &[]).unwrap(),
            &NamelistValue::Logical(true)
        );
    }

    #[test]
    fn reals_strings_and_nulls_are_parsed() {
        let namelist = Namelist::parse(NAMELIST_TEXT.to_string()).unwrap();
        assert_eq!(
            namelist.get("run_radiation", "co2_mmr", &[]).unwrap(),
            &NamelistValue::Real(4.31e-4)
        );
        assert_eq!(
            namelist.get_all("run_radiation", "label").unwrap(),
            &[
                NamelistValue::Text("it's".to_string()),
                NamelistValue::Null,
                NamelistValue::Text("done".to_string())
            ]
        );
        assert_eq!(
            namelist.get("run_radiation", "label", &[1]).unwrap().as_text(),
            Some("it's")
        );
    }

    #[test]
    fn updates_preserve_surrounding_text() {
        let mut namelist = Namelist::parse(NAMELIST_TEXT.to_string()).unwrap();
        namelist
            .set("run_radiation", "ch4mmr", &[NamelistValue::Real(1.5e-6)])
            .unwrap();
        assert!(namelist
            .text()
            .contains(" CO2_MMR=4.31d-4, ch4mmr = 1.5e-6,\n"));
        namelist
            .set("clmchfcg", "clim_fcg_nyears", &[NamelistValue::Integer(1)])
            .unwrap();
        assert!(namelist
            .text()
            .contains(" CLIM_FCG_NYEARS= 1 ! number of years\n"));
        assert_eq!(
            namelist.get("run_radiation", "ch4mmr", &[]).unwrap(),
            &NamelistValue::Real(1.5e-6)
        );
    }

    #[test]
    fn missing_variables_are_appended_before_terminator() {
        let mut namelist = Namelist::parse(NAMELIST_TEXT.to_string()).unwrap();
        namelist
            .set("clmchfcg", "c11mmr", &[NamelistValue::Real(0.0)])
            .unwrap();
        assert!(namelist.text().contains(" CLIM_FCG_YEARS(1,2)= 1900,\n c11mmr = 0.0\n /\n"));
        assert_eq!(
            namelist.get("clmchfcg", "C11MMR", &[]).unwrap(),
            &NamelistValue::Real(0.0)
        );

        namelist
            .set("run_radiation", "n2ommr", &[NamelistValue::Real(2.5e-7)])
            .unwrap();
        assert!(namelist.text().contains(" n2ommr = 2.5e-7\n &END"));
    }

    #[test]
    fn unknown_groups_and_unterminated_groups_fail() {
        let namelist = Namelist::parse(NAMELIST_TEXT.to_string()).unwrap();
        assert!(namelist.get("missing", "x", &[]).is_err());
        assert!(Namelist::parse("&grp x = 1\n".to_string()).is_err());
    }

    #[test]
    fn markers_in_comments_between_groups_are_ignored() {
        for header in ["! paths under $UMDIR\n", "! see &notes\n", "ignored text\n"] {
            let text = format!("{}&run_radiation\n co2_mmr = 4.0e-4\n/\n! trailing &x\n", header);
            let namelist = Namelist::parse(text).unwrap();
            assert_eq!(namelist.groups().len(), 1);
            assert_eq!(
                namelist.get("run_radiation", "co2_mmr", &[]).unwrap(),
                &NamelistValue::Real(4.0e-4)
            );
        }
    }
}
