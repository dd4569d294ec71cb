//! The fixed-length header and the header components it points to.

use super::{INTEGER_MDI, WORD_SIZE};
use std::io;

/// Number of 64-bit words in the fixed-length header.
pub const FIXED_LENGTH_HEADER_LENGTH: usize = 256;

// 1-based word positions in the fixed-length header.
pub const DATA_SET_FORMAT_VERSION: usize = 1;
pub const SUB_MODEL: usize = 2;
pub const VERT_COORD_TYPE: usize = 3;
pub const HORIZ_GRID_TYPE: usize = 4;
pub const DATASET_TYPE: usize = 5;
pub const RUN_IDENTIFIER: usize = 6;
pub const CALENDAR: usize = 8;
pub const GRID_STAGGERING: usize = 9;
pub const MODEL_VERSION: usize = 12;
pub const T1_YEAR: usize = 21;
pub const T2_YEAR: usize = 28;
pub const T3_YEAR: usize = 35;
pub const LOOKUP_START: usize = 150;
pub const LOOKUP_DIM1: usize = 151;
pub const LOOKUP_DIM2: usize = 152;
pub const TOTAL_PROGNOSTIC_FIELDS: usize = 153;
pub const DATA_START: usize = 160;
pub const DATA_DIM1: usize = 161;
pub const DATA_DIM2: usize = 162;

/// Known values of the dataset type word.
pub const DATASET_TYPE_DUMP: i64 = 1;
pub const DATASET_TYPE_MEAN_DUMP: i64 = 2;
pub const DATASET_TYPE_FIELDSFILE: i64 = 3;
pub const DATASET_TYPE_ANCILLARY: i64 = 4;
pub const DATASET_TYPE_BOUNDARY: i64 = 5;

/// The 256-word header at the start of every UM file.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedLengthHeader {
    words: Vec<i64>,
}

macro_rules! impl_header_accessors {
    ($($name:ident = $position:expr),* $(,)?) => {
        impl FixedLengthHeader {
            $(
                pub fn $name(&self) -> i64 {
                    self.get($position)
                }
            )*
        }
    };
}

impl_header_accessors!(
    data_set_format_version = DATA_SET_FORMAT_VERSION,
    sub_model = SUB_MODEL,
    vert_coord_type = VERT_COORD_TYPE,
    horiz_grid_type = HORIZ_GRID_TYPE,
    dataset_type = DATASET_TYPE,
    run_identifier = RUN_IDENTIFIER,
    calendar = CALENDAR,
    grid_staggering = GRID_STAGGERING,
    model_version = MODEL_VERSION,
    t1_year = T1_YEAR,
    t1_month = T1_YEAR + 1,
    t1_day = T1_YEAR + 2,
    t1_hour = T1_YEAR + 3,
    t1_minute = T1_YEAR + 4,
    t1_second = T1_YEAR + 5,
    t2_year = T2_YEAR,
    t2_month = T2_YEAR + 1,
    t2_day = T2_YEAR + 2,
    t2_hour = T2_YEAR + 3,
    t2_minute = T2_YEAR + 4,
    t2_second = T2_YEAR + 5,
    t3_year = T3_YEAR,
    t3_month = T3_YEAR + 1,
    t3_day = T3_YEAR + 2,
    lookup_start = LOOKUP_START,
    lookup_dim1 = LOOKUP_DIM1,
    lookup_dim2 = LOOKUP_DIM2,
    total_prognostic_fields = TOTAL_PROGNOSTIC_FIELDS,
    data_start = DATA_START,
    data_dim1 = DATA_DIM1,
    data_dim2 = DATA_DIM2,
);

impl FixedLengthHeader {
    /// Creates a header with every word set to the integer missing data indicator.
    pub fn empty() -> Self {
        Self {
            words: vec![INTEGER_MDI; FIXED_LENGTH_HEADER_LENGTH],
        }
    }

    pub fn from_words(words: Vec<i64>) -> io::Result<Self> {
        if words.len() != FIXED_LENGTH_HEADER_LENGTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Fixed-length header has {} words, expected {}",
                    words.len(),
                    FIXED_LENGTH_HEADER_LENGTH
                ),
            ));
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> &[i64] {
        &self.words
    }

    /// Returns the word at the given 1-based position.
    pub fn get(&self, position: usize) -> i64 {
        self.words[position - 1]
    }

    /// Sets the word at the given 1-based position.
    pub fn set(&mut self, position: usize, value: i64) {
        self.words[position - 1] = value;
    }

    /// Returns the model version formatted as `X.Y`, if set.
    pub fn model_version_string(&self) -> Option<String> {
        let version = self.model_version();
        if version <= 0 {
            None
        } else {
            Some(format!("{}.{}", version / 100, version % 100))
        }
    }
}

/// The optional header blocks located between the fixed-length header and
/// the lookup table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderComponentKind {
    IntegerConstants,
    RealConstants,
    LevelDependentConstants,
    RowDependentConstants,
    ColumnDependentConstants,
    FieldsOfConstants,
    ExtraConstants,
    TempHistoryfile,
    CompressedFieldIndex1,
    CompressedFieldIndex2,
    CompressedFieldIndex3,
}

impl HeaderComponentKind {
    /// All kinds, in the order they are laid out in a file.
    pub const ALL: [Self; 11] = [
        Self::IntegerConstants,
        Self::RealConstants,
        Self::LevelDependentConstants,
        Self::RowDependentConstants,
        Self::ColumnDependentConstants,
        Self::FieldsOfConstants,
        Self::ExtraConstants,
        Self::TempHistoryfile,
        Self::CompressedFieldIndex1,
        Self::CompressedFieldIndex2,
        Self::CompressedFieldIndex3,
    ];

    /// Returns the 1-based fixed-length header positions of the start word,
    /// the first dimension and (for 2D components) the second dimension.
    pub fn positions(&self) -> (usize, usize, Option<usize>) {
        match self {
            Self::IntegerConstants => (100, 101, None),
            Self::RealConstants => (105, 106, None),
            Self::LevelDependentConstants => (110, 111, Some(112)),
            Self::RowDependentConstants => (115, 116, Some(117)),
            Self::ColumnDependentConstants => (120, 121, Some(122)),
            Self::FieldsOfConstants => (125, 126, Some(127)),
            Self::ExtraConstants => (130, 131, None),
            Self::TempHistoryfile => (135, 136, None),
            Self::CompressedFieldIndex1 => (140, 141, None),
            Self::CompressedFieldIndex2 => (142, 143, None),
            Self::CompressedFieldIndex3 => (144, 145, None),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::IntegerConstants => "integer constants",
            Self::RealConstants => "real constants",
            Self::LevelDependentConstants => "level dependent constants",
            Self::RowDependentConstants => "row dependent constants",
            Self::ColumnDependentConstants => "column dependent constants",
            Self::FieldsOfConstants => "fields of constants",
            Self::ExtraConstants => "extra constants",
            Self::TempHistoryfile => "temp historyfile",
            Self::CompressedFieldIndex1 => "compressed field index 1",
            Self::CompressedFieldIndex2 => "compressed field index 2",
            Self::CompressedFieldIndex3 => "compressed field index 3",
        }
    }

    /// Reads the location and dimensions of this component from the given
    /// header, returning `None` if the component is absent.
    pub fn locate(&self, header: &FixedLengthHeader) -> Option<(u64, usize, Option<usize>)> {
        let (start_position, dim1_position, dim2_position) = self.positions();
        let start = header.get(start_position);
        let dim1 = header.get(dim1_position);
        if start <= 0 || dim1 <= 0 {
            return None;
        }
        let dim2 = match dim2_position.map(|position| header.get(position)) {
            Some(dim2) if dim2 > 0 => Some(dim2 as usize),
            Some(_) => return None,
            None => None,
        };
        Some((
            (start as u64 - 1) * WORD_SIZE as u64,
            dim1 as usize,
            dim2,
        ))
    }
}

/// A header component held as raw words, so that it can be written back unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderComponent {
    kind: HeaderComponentKind,
    dim1: usize,
    dim2: Option<usize>,
    words: Vec<u64>,
}

impl HeaderComponent {
    pub fn new(
        kind: HeaderComponentKind,
        dim1: usize,
        dim2: Option<usize>,
        words: Vec<u64>,
    ) -> io::Result<Self> {
        if words.len() != dim1 * dim2.unwrap_or(1) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Size of {} ({}) does not match dimensions {}x{}",
                    kind.name(),
                    words.len(),
                    dim1,
                    dim2.unwrap_or(1)
                ),
            ));
        }
        Ok(Self {
            kind,
            dim1,
            dim2,
            words,
        })
    }

    /// Creates a 1D component of integers.
    pub fn from_ints(kind: HeaderComponentKind, values: &[i64]) -> Self {
        Self {
            kind,
            dim1: values.len(),
            dim2: kind.positions().2.map(|_| 1),
            words: values.iter().map(|&value| value as u64).collect(),
        }
    }

    /// Creates a 1D component of reals.
    pub fn from_reals(kind: HeaderComponentKind, values: &[f64]) -> Self {
        Self {
            kind,
            dim1: values.len(),
            dim2: kind.positions().2.map(|_| 1),
            words: values.iter().map(|value| value.to_bits()).collect(),
        }
    }

    pub fn kind(&self) -> HeaderComponentKind {
        self.kind
    }

    pub fn dims(&self) -> (usize, Option<usize>) {
        (self.dim1, self.dim2)
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns the word at the given 1-based position interpreted as an integer.
    pub fn get_int(&self, position: usize) -> Option<i64> {
        self.words.get(position - 1).map(|&word| word as i64)
    }

    /// Returns the word at the given 1-based position interpreted as a real.
    pub fn get_real(&self, position: usize) -> Option<f64> {
        self.words
            .get(position - 1)
            .map(|&word| f64::from_bits(word))
    }

    pub fn set_int(&mut self, position: usize, value: i64) {
        self.words[position - 1] = value as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_components_are_not_located() {
        let mut header = FixedLengthHeader::empty();
        assert!(HeaderComponentKind::IntegerConstants
            .locate(&header)
            .is_none());

        header.set(100, 257);
        header.set(101, 46);
        assert_eq!(
            HeaderComponentKind::IntegerConstants.locate(&header),
            Some((256 * 8, 46, None))
        );

        header.set(110, 303);
        header.set(111, 39);
        header.set(112, INTEGER_MDI);
        assert!(HeaderComponentKind::LevelDependentConstants
            .locate(&header)
            .is_none());
    }

    #[test]
    fn model_version_is_formatted_with_dot() {
        let mut header = FixedLengthHeader::empty();
        assert_eq!(header.model_version_string(), None);
        header.set(MODEL_VERSION, 703);
        assert_eq!(header.model_version_string().as_deref(), Some("7.3"));
    }
}
