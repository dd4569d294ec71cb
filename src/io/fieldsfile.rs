//! Reading and writing of Unified Model fields files, dumps and ancillary files.
//!
//! A UM file consists of a 256-word fixed-length header, a sequence of optional
//! header components, a lookup table with one 64-word entry per record, and a
//! data section holding the records. All words are 64 bits wide and stored
//! big-endian unless another byte order is requested.
//!
//! Record data is not read when a file is opened. Unmodified records are copied
//! verbatim from the source file when the file is written, while replaced records
//! are encoded from their new values at that point.

pub mod data;
pub mod header;
pub mod lookup;
pub mod validate;

use self::{
    data::{
        bytes_to_words, decode_values, encode_values, packing_is_supported, words_to_bytes,
        DataProvider, SourceRange, PACKING_32_BIT,
    },
    header::{
        FixedLengthHeader, HeaderComponent, HeaderComponentKind, DATASET_TYPE, DATA_SET_FORMAT_VERSION,
        DATA_DIM1, DATA_START, FIXED_LENGTH_HEADER_LENGTH, GRID_STAGGERING, HORIZ_GRID_TYPE,
        LOOKUP_DIM1, LOOKUP_DIM2, LOOKUP_START, SUB_MODEL, VERT_COORD_TYPE,
    },
    lookup::{Field, Lookup, LBEGIN, LBLREC, LBNREC, LBPACK, LBUSER2, LOOKUP_ENTRY_LENGTH},
};
use super::{
    stashmaster::StashMaster,
    utils::{self, AtomicOutputPath},
    Endianness, Verbosity,
};
use ndarray::Array2;
use std::{
    fs,
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
    sync::Arc,
};

/// Number of bytes in a word.
pub const WORD_SIZE: usize = 8;
/// Missing data indicator for integer words.
pub const INTEGER_MDI: i64 = -32768;
/// Missing data indicator for real words.
pub const REAL_MDI: f64 = -1073741824.0;
/// Value filling the words of unused lookup entries.
pub const MISSING_LOOKUP_VALUE: i64 = -99;
/// The data section starts at a multiple of this number of words.
pub const DATA_START_ALIGNMENT: usize = 2048;
/// Each record in the data section is padded to a multiple of this number of words.
pub const RECORD_ALIGNMENT: usize = 512;

// 1-based positions in the integer constants.
pub const NUM_COLS: usize = 6;
pub const NUM_ROWS: usize = 7;
pub const NUM_P_LEVELS: usize = 8;
pub const NUM_LAND_POINTS: usize = 25;

const DEFAULT_INTEGER_CONSTANTS_LENGTH: usize = 46;
const DEFAULT_REAL_CONSTANTS_LENGTH: usize = 38;

/// A UM file held in memory, with record data provided on demand.
#[derive(Clone, Debug)]
pub struct FieldsFile {
    fixed_length_header: FixedLengthHeader,
    components: Vec<HeaderComponent>,
    fields: Vec<Field>,
    endianness: Endianness,
    stashmaster: Option<StashMaster>,
}

impl FieldsFile {
    /// Reads the headers and lookup table of the UM file at the given path.
    pub fn open<P: AsRef<Path>>(
        file_path: P,
        endianness: Endianness,
        verbosity: Verbosity,
    ) -> io::Result<Self> {
        let file_path = file_path.as_ref();
        if verbosity.print_messages() {
            println!("Reading {}", file_path.display());
        }
        let mut file = utils::open_file_and_map_err(file_path)?;
        let file_length = file.metadata()?.len();

        let header_words = read_words(&mut file, 0, FIXED_LENGTH_HEADER_LENGTH, endianness)?;
        let fixed_length_header =
            FixedLengthHeader::from_words(header_words.into_iter().map(|word| word as i64).collect())?;

        let mut components = Vec::new();
        for kind in HeaderComponentKind::ALL {
            if let Some((byte_offset, dim1, dim2)) = kind.locate(&fixed_length_header) {
                let words = read_words(&mut file, byte_offset, dim1 * dim2.unwrap_or(1), endianness)?;
                components.push(HeaderComponent::new(kind, dim1, dim2, words)?);
            }
        }

        let fields = read_fields(
            &mut file,
            file_path,
            file_length,
            &fixed_length_header,
            endianness,
        )?;

        if verbosity.print_messages() {
            println!(
                "Found {} records in {} lookup entries",
                fields.iter().filter(|field| !field.is_unused()).count(),
                fields.len()
            );
        }

        Ok(Self {
            fixed_length_header,
            components,
            fields,
            endianness,
            stashmaster: None,
        })
    }

    /// Creates an empty file of the given dataset type on a grid with the given
    /// number of rows and columns.
    pub fn new(dataset_type: i64, num_rows: usize, num_cols: usize, endianness: Endianness) -> Self {
        let mut fixed_length_header = FixedLengthHeader::empty();
        fixed_length_header.set(DATA_SET_FORMAT_VERSION, 20);
        fixed_length_header.set(SUB_MODEL, 1);
        fixed_length_header.set(VERT_COORD_TYPE, 1);
        fixed_length_header.set(HORIZ_GRID_TYPE, 0);
        fixed_length_header.set(DATASET_TYPE, dataset_type);
        fixed_length_header.set(GRID_STAGGERING, 6);

        let mut integer_constants = vec![INTEGER_MDI; DEFAULT_INTEGER_CONSTANTS_LENGTH];
        integer_constants[NUM_COLS - 1] = num_cols as i64;
        integer_constants[NUM_ROWS - 1] = num_rows as i64;
        let real_constants = vec![REAL_MDI; DEFAULT_REAL_CONSTANTS_LENGTH];

        Self {
            fixed_length_header,
            components: vec![
                HeaderComponent::from_ints(HeaderComponentKind::IntegerConstants, &integer_constants),
                HeaderComponent::from_reals(HeaderComponentKind::RealConstants, &real_constants),
            ],
            fields: Vec::new(),
            endianness,
            stashmaster: None,
        }
    }

    pub fn fixed_length_header(&self) -> &FixedLengthHeader {
        &self.fixed_length_header
    }

    pub fn fixed_length_header_mut(&mut self) -> &mut FixedLengthHeader {
        &mut self.fixed_length_header
    }

    pub fn components(&self) -> &[HeaderComponent] {
        &self.components
    }

    /// Returns the header component of the given kind, if present.
    pub fn component(&self, kind: HeaderComponentKind) -> Option<&HeaderComponent> {
        self.components
            .iter()
            .find(|component| component.kind() == kind)
    }

    /// Returns all lookup entries, including unused slots.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    /// Iterates over the used records.
    pub fn used_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| !field.is_unused())
    }

    /// Adds a new record, placing it in the first unused lookup slot if any.
    pub fn push_field(&mut self, field: Field) {
        match self.fields.iter_mut().find(|slot| slot.is_unused()) {
            Some(slot) => *slot = field,
            None => self.fields.push(field),
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn stashmaster(&self) -> Option<&StashMaster> {
        self.stashmaster.as_ref()
    }

    /// Associates a STASHmaster table with the file, used to look up field names.
    pub fn attach_stashmaster(&mut self, stashmaster: StashMaster) {
        self.stashmaster = Some(stashmaster);
    }

    /// Returns the integer constant at the given 1-based position.
    pub fn integer_constant(&self, position: usize) -> io::Result<i64> {
        self.component(HeaderComponentKind::IntegerConstants)
            .and_then(|constants| constants.get_int(position))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Integer constant {} is missing", position),
                )
            })
    }

    pub fn num_rows(&self) -> io::Result<usize> {
        self.positive_integer_constant(NUM_ROWS, "number of rows")
    }

    pub fn num_cols(&self) -> io::Result<usize> {
        self.positive_integer_constant(NUM_COLS, "number of columns")
    }

    pub fn num_p_levels(&self) -> io::Result<usize> {
        self.positive_integer_constant(NUM_P_LEVELS, "number of levels")
    }

    pub fn num_land_points(&self) -> io::Result<usize> {
        self.positive_integer_constant(NUM_LAND_POINTS, "number of land points")
    }

    fn positive_integer_constant(&self, position: usize, description: &str) -> io::Result<usize> {
        let value = self.integer_constant(position)?;
        if value < 0 {
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid {} in integer constants: {}", description, value),
            ))
        } else {
            Ok(value as usize)
        }
    }

    /// Reads the values of the record at the given lookup index.
    pub fn read_field_values(&self, index: usize) -> io::Result<Array2<f64>> {
        let field = self.fields.get(index).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("No lookup entry with index {}", index),
            )
        })?;
        read_values(field, self.endianness)
    }

    /// Checks the internal consistency of the file, returning a message for
    /// every problem found.
    pub fn validate(&self) -> Vec<String> {
        validate::validate(self)
    }

    /// Validates the file and writes it to the given path.
    ///
    /// Validation problems are reported as warnings. The output is written to a
    /// temporary file which is moved into place only when writing succeeded.
    pub fn write_to_file<P: AsRef<Path>>(
        &self,
        output_file_path: P,
        verbosity: Verbosity,
    ) -> io::Result<()> {
        for problem in self.validate() {
            eprintln!("Warning: {}", problem);
        }
        let output_file_path = output_file_path.as_ref();
        if verbosity.print_messages() {
            println!("Writing {}", output_file_path.display());
        }
        let mut atomic_output = AtomicOutputPath::new(output_file_path)?;
        {
            let mut writer = io::BufWriter::new(atomic_output.temporary_file_mut());
            self.write_into(&mut writer, verbosity)?;
            writer.flush()?;
        }
        atomic_output.perform_replace()
    }

    fn write_into<W: Write>(&self, writer: &mut W, verbosity: Verbosity) -> io::Result<()> {
        let mut header = self.fixed_length_header.clone();
        let mut position = FIXED_LENGTH_HEADER_LENGTH;

        for component in &self.components {
            let (start_position, dim1_position, dim2_position) = component.kind().positions();
            let (dim1, dim2) = component.dims();
            header.set(start_position, position as i64 + 1);
            header.set(dim1_position, dim1 as i64);
            if let (Some(dim2_position), Some(dim2)) = (dim2_position, dim2) {
                header.set(dim2_position, dim2 as i64);
            }
            position += component.len();
        }

        header.set(LOOKUP_START, position as i64 + 1);
        header.set(LOOKUP_DIM1, LOOKUP_ENTRY_LENGTH as i64);
        header.set(LOOKUP_DIM2, self.fields.len() as i64);
        position += LOOKUP_ENTRY_LENGTH * self.fields.len();

        let data_start = round_up(position, DATA_START_ALIGNMENT);
        header.set(DATA_START, data_start as i64 + 1);

        let mut lookups = Vec::with_capacity(self.fields.len());
        let mut data_position = data_start;
        let mut d1_address = 1;
        for (index, field) in self.fields.iter().enumerate() {
            let mut lookup = field.lookup().clone();
            if field.is_unused() {
                lookups.push(lookup);
                continue;
            }
            let num_words = match field.data() {
                None => 0,
                Some(DataProvider::Source(range)) => range.num_words(),
                Some(DataProvider::Array(values)) => {
                    if !packing_is_supported(&lookup) {
                        if verbosity.print_messages() {
                            println!(
                                "Writing record {} (STASH code {}) unpacked instead of with LBPACK {}",
                                index,
                                lookup.lbuser4(),
                                lookup.lbpack()
                            );
                        }
                        lookup.set_int(LBPACK, 0);
                    }
                    encoded_num_words(&lookup, values)
                }
            };
            let num_padded_words = round_up(num_words, RECORD_ALIGNMENT);
            lookup.set_int(LBEGIN, data_position as i64);
            lookup.set_int(LBNREC, num_padded_words as i64);
            lookup.set_int(LBLREC, num_words as i64);
            lookup.set_int(LBUSER2, d1_address as i64);
            d1_address += num_words;
            data_position += num_padded_words;
            lookups.push(lookup);
        }
        header.set(DATA_DIM1, (data_position - data_start) as i64);

        let header_words: Vec<u64> = header.words().iter().map(|&word| word as u64).collect();
        writer.write_all(&words_to_bytes(&header_words, self.endianness))?;
        for component in &self.components {
            writer.write_all(&words_to_bytes(component.words(), self.endianness))?;
        }
        for lookup in &lookups {
            writer.write_all(&words_to_bytes(lookup.words(), self.endianness))?;
        }
        write_padding(writer, (data_start - position) * WORD_SIZE)?;

        for (field, lookup) in self.fields.iter().zip(lookups.iter()) {
            if field.is_unused() {
                continue;
            }
            let bytes = match field.data() {
                None => Vec::new(),
                Some(DataProvider::Source(range)) => range.read_bytes()?,
                Some(DataProvider::Array(values)) => {
                    if verbosity.print_messages() {
                        println!("Encoding new data for STASH code {}", lookup.lbuser4());
                    }
                    encode_values(lookup, values, self.endianness).0
                }
            };
            writer.write_all(&bytes)?;
            let padded_length = lookup.lbnrec() as usize * WORD_SIZE;
            write_padding(writer, padded_length - bytes.len())?;
        }
        Ok(())
    }
}

/// Reads the values of the given record, either from the source file or from
/// its replacement array.
pub fn read_values(field: &Field, endianness: Endianness) -> io::Result<Array2<f64>> {
    match field.data() {
        None => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Record with STASH code {} has no data", field.stash_code()),
        )),
        Some(DataProvider::Array(values)) => Ok(values.clone()),
        Some(DataProvider::Source(range)) => {
            let lookup = field.lookup();
            let (rows, cols) = lookup.grid_shape()?;
            let mut values = decode_values(lookup, &range.read_bytes()?, endianness)?;
            if values.len() < rows * cols {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Record with STASH code {} has {} values, expected {}x{}",
                        lookup.lbuser4(),
                        values.len(),
                        rows,
                        cols
                    ),
                ));
            }
            values.truncate(rows * cols);
            Array2::from_shape_vec((rows, cols), values)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
        }
    }
}

fn read_fields(
    file: &mut fs::File,
    file_path: &Path,
    file_length: u64,
    header: &FixedLengthHeader,
    endianness: Endianness,
) -> io::Result<Vec<Field>> {
    let (lookup_start, entry_length, num_entries) =
        (header.lookup_start(), header.lookup_dim1(), header.lookup_dim2());
    if lookup_start <= 0 || num_entries <= 0 {
        return Ok(Vec::new());
    }
    if entry_length < LOOKUP_ENTRY_LENGTH as i64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Lookup entries in {} have {} words, expected at least {}",
                file_path.display(),
                entry_length,
                LOOKUP_ENTRY_LENGTH
            ),
        ));
    }
    let (entry_length, num_entries) = (entry_length as usize, num_entries as usize);
    let table_length = entry_length.checked_mul(num_entries);
    let table_offset = (lookup_start as u64 - 1).checked_mul(WORD_SIZE as u64);
    let table_fits = match (table_offset, table_length) {
        (Some(offset), Some(length)) => (length as u64)
            .checked_mul(WORD_SIZE as u64)
            .and_then(|num_bytes| offset.checked_add(num_bytes))
            .map_or(false, |end| end <= file_length),
        _ => false,
    };
    let (table_offset, table_length) = match (table_offset, table_length) {
        (Some(offset), Some(length)) if table_fits => (offset, length),
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Lookup table extends beyond the end of {}", file_path.display()),
            ))
        }
    };
    let table = read_words(file, table_offset, table_length, endianness)?;

    let source_path = Arc::new(file_path.to_path_buf());
    let mut running_offset = (header.data_start() - 1).max(0);
    let mut fields = Vec::with_capacity(num_entries);
    for entry in table.chunks(entry_length) {
        let lookup = Lookup::from_words(&entry[..LOOKUP_ENTRY_LENGTH])?;
        if lookup.is_unused() {
            fields.push(Field::new(lookup, None));
            continue;
        }
        let word_offset = if lookup.lbegin() > 0 {
            lookup.lbegin()
        } else {
            running_offset
        };
        let num_words = lookup.lblrec().max(0) as usize;
        let byte_offset = (word_offset as u64).checked_mul(WORD_SIZE as u64);
        let byte_end = byte_offset.and_then(|offset| {
            (num_words as u64)
                .checked_mul(WORD_SIZE as u64)
                .and_then(|num_bytes| offset.checked_add(num_bytes))
        });
        let byte_offset = match (byte_offset, byte_end) {
            (Some(byte_offset), Some(byte_end)) if byte_end <= file_length => byte_offset,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Record with STASH code {} extends beyond the end of {}",
                        lookup.lbuser4(),
                        file_path.display()
                    ),
                ))
            }
        };
        running_offset = word_offset.saturating_add(if lookup.lbnrec() > 0 {
            lookup.lbnrec()
        } else {
            num_words as i64
        });
        let range = SourceRange::new(Arc::clone(&source_path), byte_offset, num_words);
        fields.push(Field::new(lookup, Some(DataProvider::Source(range))));
    }
    Ok(fields)
}

fn read_words(
    file: &mut fs::File,
    byte_offset: u64,
    num_words: usize,
    endianness: Endianness,
) -> io::Result<Vec<u64>> {
    file.seek(SeekFrom::Start(byte_offset))?;
    let mut buffer = vec![0; num_words * WORD_SIZE];
    file.read_exact(&mut buffer)?;
    Ok(bytes_to_words(&buffer, endianness))
}

fn write_padding<W: Write>(writer: &mut W, num_bytes: usize) -> io::Result<()> {
    io::copy(&mut io::repeat(0).take(num_bytes as u64), writer).map(|_| ())
}

fn encoded_num_words(lookup: &Lookup, values: &Array2<f64>) -> usize {
    if lookup.packing_digits().0 == PACKING_32_BIT {
        (values.len() + 1) / 2
    } else {
        values.len()
    }
}

fn round_up(value: usize, multiple: usize) -> usize {
    ((value + multiple - 1) / multiple) * multiple
}
