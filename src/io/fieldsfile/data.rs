//! Deferred record data and its conversion to and from raw words.

use super::{
    lookup::{Lookup, DATA_TYPE_INTEGER, DATA_TYPE_LOGICAL},
    INTEGER_MDI, WORD_SIZE,
};
use crate::io::Endianness;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use ndarray::Array2;
use std::{
    fs,
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Packing code (first digit of `lbpack`) for unpacked 64-bit words.
pub const PACKING_NONE: i64 = 0;
/// Packing code (first digit of `lbpack`) for reals truncated to 32 bits.
pub const PACKING_32_BIT: i64 = 2;

/// Where the data of a record comes from.
#[derive(Clone, Debug)]
pub enum DataProvider {
    /// The record data is still in the file the record was read from.
    Source(SourceRange),
    /// The record data has been replaced by the given values.
    Array(Array2<f64>),
}

/// A range of words in a source file.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceRange {
    file_path: Arc<PathBuf>,
    byte_offset: u64,
    num_words: usize,
}

impl SourceRange {
    pub fn new(file_path: Arc<PathBuf>, byte_offset: u64, num_words: usize) -> Self {
        Self {
            file_path,
            byte_offset,
            num_words,
        }
    }

    pub fn file_path(&self) -> &Path {
        self.file_path.as_path()
    }

    pub fn num_words(&self) -> usize {
        self.num_words
    }

    /// Reads the bytes of the range from the source file.
    pub fn read_bytes(&self) -> io::Result<Vec<u8>> {
        let mut file = fs::File::open(self.file_path.as_path())?;
        file.seek(SeekFrom::Start(self.byte_offset))?;
        let mut buffer = vec![0; self.num_words * WORD_SIZE];
        file.read_exact(&mut buffer).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!(
                    "Could not read {} words at byte {} of {}: {}",
                    self.num_words,
                    self.byte_offset,
                    self.file_path().display(),
                    err
                ),
            )
        })?;
        Ok(buffer)
    }
}

/// Converts raw bytes into 64-bit words with the given byte order.
pub fn bytes_to_words(bytes: &[u8], endianness: Endianness) -> Vec<u64> {
    let mut words = vec![0; bytes.len() / WORD_SIZE];
    match endianness {
        Endianness::Little => LittleEndian::read_u64_into(&bytes[..words.len() * WORD_SIZE], &mut words),
        Endianness::Big => BigEndian::read_u64_into(&bytes[..words.len() * WORD_SIZE], &mut words),
    };
    words
}

/// Converts 64-bit words into raw bytes with the given byte order.
pub fn words_to_bytes(words: &[u64], endianness: Endianness) -> Vec<u8> {
    let mut bytes = vec![0; words.len() * WORD_SIZE];
    match endianness {
        Endianness::Little => LittleEndian::write_u64_into(words, &mut bytes),
        Endianness::Big => BigEndian::write_u64_into(words, &mut bytes),
    };
    bytes
}

/// Whether values of the given record can be encoded with its current packing.
pub fn packing_is_supported(lookup: &Lookup) -> bool {
    let (n1, n2, n3) = lookup.packing_digits();
    if n2 != 0 || n3 != 0 {
        return false;
    }
    match n1 {
        PACKING_NONE => true,
        PACKING_32_BIT => !matches!(lookup.lbuser1(), DATA_TYPE_INTEGER | DATA_TYPE_LOGICAL),
        _ => false,
    }
}

/// Decodes the raw bytes of a record into values.
pub fn decode_values(lookup: &Lookup, bytes: &[u8], endianness: Endianness) -> io::Result<Vec<f64>> {
    if !packing_is_supported(lookup) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Cannot decode record with STASH code {} packed with LBPACK {}",
                lookup.lbuser4(),
                lookup.lbpack()
            ),
        ));
    }
    let values = if lookup.packing_digits().0 == PACKING_32_BIT {
        let mut values = vec![0.0_f32; bytes.len() / 4];
        match endianness {
            Endianness::Little => LittleEndian::read_f32_into(bytes, &mut values),
            Endianness::Big => BigEndian::read_f32_into(bytes, &mut values),
        };
        values.into_iter().map(f64::from).collect()
    } else {
        let words = bytes_to_words(bytes, endianness);
        match lookup.lbuser1() {
            DATA_TYPE_INTEGER | DATA_TYPE_LOGICAL => {
                words.into_iter().map(|word| word as i64 as f64).collect()
            }
            _ => words.into_iter().map(f64::from_bits).collect(),
        }
    };
    Ok(values)
}

/// Encodes values for a record with supported packing, returning the bytes
/// and the number of 64-bit words they occupy.
pub fn encode_values(lookup: &Lookup, values: &Array2<f64>, endianness: Endianness) -> (Vec<u8>, usize) {
    if lookup.packing_digits().0 == PACKING_32_BIT {
        let truncated: Vec<f32> = values.iter().map(|&value| value as f32).collect();
        let num_words = (truncated.len() + 1) / 2;
        let mut bytes = vec![0; num_words * WORD_SIZE];
        let used = truncated.len() * 4;
        match endianness {
            Endianness::Little => LittleEndian::write_f32_into(&truncated, &mut bytes[..used]),
            Endianness::Big => BigEndian::write_f32_into(&truncated, &mut bytes[..used]),
        };
        (bytes, num_words)
    } else {
        let words: Vec<u64> = match lookup.lbuser1() {
            DATA_TYPE_INTEGER => values
                .iter()
                .map(|&value| integer_value(value) as u64)
                .collect(),
            DATA_TYPE_LOGICAL => values
                .iter()
                .map(|&value| u64::from(value != 0.0))
                .collect(),
            _ => values.iter().map(|value| value.to_bits()).collect(),
        };
        let num_words = words.len();
        (words_to_bytes(&words, endianness), num_words)
    }
}

/// Rounds a value for an integer record. Values without an integer
/// representation, such as NaN or the real missing data sentinel, become
/// the integer missing data indicator.
fn integer_value(value: f64) -> i64 {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        rounded as i64
    } else {
        INTEGER_MDI
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fieldsfile::lookup::{LBPACK, LBUSER1};
    use ndarray::array;

    #[test]
    fn words_use_requested_byte_order() {
        let words = [1_u64, 0x0102_0304_0506_0708];
        let big = words_to_bytes(&words, Endianness::Big);
        assert_eq!(&big[..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
        let little = words_to_bytes(&words, Endianness::Little);
        assert_eq!(&little[..8], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(bytes_to_words(&big, Endianness::Big), words.to_vec());
    }

    #[test]
    fn packed_reals_occupy_half_words() {
        let mut lookup = Lookup::new_grid_field(33, 1, 3);
        lookup.set_int(LBPACK, 2);
        let values = array![[1.5, -2.0, 3.25]];
        let (bytes, num_words) = encode_values(&lookup, &values, Endianness::Big);
        assert_eq!(num_words, 2);
        let decoded = decode_values(&lookup, &bytes, Endianness::Big).unwrap();
        assert_eq!(&decoded[..3], &[1.5, -2.0, 3.25]);
    }

    #[test]
    fn integer_records_are_rounded() {
        let mut lookup = Lookup::new_grid_field(30, 1, 2);
        lookup.set_int(LBUSER1, DATA_TYPE_INTEGER);
        let (bytes, _) = encode_values(&lookup, &array![[2.6, -1.0]], Endianness::Big);
        assert_eq!(bytes_to_words(&bytes, Endianness::Big), vec![3, (-1_i64) as u64]);
    }

    #[test]
    fn unrepresentable_integers_become_missing() {
        let mut lookup = Lookup::new_grid_field(30, 1, 3);
        lookup.set_int(LBUSER1, DATA_TYPE_INTEGER);
        let (bytes, _) = encode_values(&lookup, &array![[f64::NAN, 1e20, -7.0]], Endianness::Big);
        assert_eq!(
            bytes_to_words(&bytes, Endianness::Big),
            vec![INTEGER_MDI as u64, INTEGER_MDI as u64, (-7_i64) as u64]
        );
    }

    #[test]
    fn land_compressed_records_are_not_supported() {
        let mut lookup = Lookup::new_grid_field(33, 1, 1);
        lookup.set_int(LBPACK, 120);
        assert!(!packing_is_supported(&lookup));
        assert!(decode_values(&lookup, &[0; 8], Endianness::Big).is_err());
    }
}
