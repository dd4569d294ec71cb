//! Lookup table entries describing the records of a UM file.

use super::{data::DataProvider, MISSING_LOOKUP_VALUE, REAL_MDI};
use ndarray::Array2;
use std::io;

/// Number of 64-bit words in a lookup entry.
pub const LOOKUP_ENTRY_LENGTH: usize = 64;
/// Number of integer words at the start of a lookup entry.
pub const LOOKUP_INTEGER_LENGTH: usize = 45;

// 1-based word positions in a lookup entry.
pub const LBYR: usize = 1;
pub const LBTIM: usize = 13;
pub const LBFT: usize = 14;
pub const LBLREC: usize = 15;
pub const LBCODE: usize = 16;
pub const LBHEM: usize = 17;
pub const LBROW: usize = 18;
pub const LBNPT: usize = 19;
pub const LBEXT: usize = 20;
pub const LBPACK: usize = 21;
pub const LBREL: usize = 22;
pub const LBFC: usize = 23;
pub const LBPROC: usize = 25;
pub const LBVC: usize = 26;
pub const LBEGIN: usize = 29;
pub const LBNREC: usize = 30;
pub const LBLEV: usize = 33;
pub const LBUSER1: usize = 39;
pub const LBUSER2: usize = 40;
pub const LBUSER3: usize = 41;
pub const LBUSER4: usize = 42;
pub const LBUSER5: usize = 43;
pub const LBUSER6: usize = 44;
pub const LBUSER7: usize = 45;
pub const BLEV: usize = 52;
pub const BMDI: usize = 63;
pub const BMKS: usize = 64;

/// Value of `lbuser1` for real, integer and logical data.
pub const DATA_TYPE_REAL: i64 = 1;
pub const DATA_TYPE_INTEGER: i64 = 2;
pub const DATA_TYPE_LOGICAL: i64 = 3;

/// A single 64-word lookup entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Lookup {
    words: [u64; LOOKUP_ENTRY_LENGTH],
}

macro_rules! impl_lookup_int_accessors {
    ($($name:ident = $position:expr),* $(,)?) => {
        impl Lookup {
            $(
                pub fn $name(&self) -> i64 {
                    self.get_int($position)
                }
            )*
        }
    };
}

macro_rules! impl_lookup_real_accessors {
    ($($name:ident = $position:expr),* $(,)?) => {
        impl Lookup {
            $(
                pub fn $name(&self) -> f64 {
                    self.get_real($position)
                }
            )*
        }
    };
}

impl_lookup_int_accessors!(
    lbyr = LBYR,
    lbmon = 2,
    lbdat = 3,
    lbhr = 4,
    lbmin = 5,
    lbsec = 6,
    lbyrd = 7,
    lbmond = 8,
    lbdatd = 9,
    lbhrd = 10,
    lbmind = 11,
    lbsecd = 12,
    lbtim = LBTIM,
    lbft = LBFT,
    lblrec = LBLREC,
    lbcode = LBCODE,
    lbhem = LBHEM,
    lbrow = LBROW,
    lbnpt = LBNPT,
    lbext = LBEXT,
    lbpack = LBPACK,
    lbrel = LBREL,
    lbfc = LBFC,
    lbcfc = 24,
    lbproc = LBPROC,
    lbvc = LBVC,
    lbrvc = 27,
    lbexp = 28,
    lbegin = LBEGIN,
    lbnrec = LBNREC,
    lbproj = 31,
    lbtyp = 32,
    lblev = LBLEV,
    lbsrce = 38,
    lbuser1 = LBUSER1,
    lbuser2 = LBUSER2,
    lbuser3 = LBUSER3,
    lbuser4 = LBUSER4,
    lbuser5 = LBUSER5,
    lbuser6 = LBUSER6,
    lbuser7 = LBUSER7,
);

impl_lookup_real_accessors!(
    bulev = 46,
    bhulev = 47,
    bdatum = 50,
    bacc = 51,
    blev = BLEV,
    brlev = 53,
    bhlev = 54,
    bhrlev = 55,
    bplat = 56,
    bplon = 57,
    bgor = 58,
    bzy = 59,
    bdy = 60,
    bzx = 61,
    bdx = 62,
    bmdi = BMDI,
    bmks = BMKS,
);

impl Lookup {
    /// Creates an unused lookup entry.
    pub fn empty() -> Self {
        Self {
            words: [MISSING_LOOKUP_VALUE as u64; LOOKUP_ENTRY_LENGTH],
        }
    }

    /// Creates a lookup entry for an unpacked real field on a regular grid.
    pub fn new_grid_field(stash_code: i64, num_rows: usize, num_cols: usize) -> Self {
        let mut lookup = Self {
            words: [0; LOOKUP_ENTRY_LENGTH],
        };
        lookup.set_int(LBROW, num_rows as i64);
        lookup.set_int(LBNPT, num_cols as i64);
        lookup.set_int(LBCODE, 1);
        lookup.set_int(LBREL, 3);
        lookup.set_int(LBUSER1, DATA_TYPE_REAL);
        lookup.set_int(LBUSER4, stash_code);
        lookup.set_int(LBUSER7, 1);
        lookup.set_real(BMDI, REAL_MDI);
        lookup.set_real(BMKS, 1.0);
        lookup
    }

    pub fn from_words(words: &[u64]) -> io::Result<Self> {
        let words: [u64; LOOKUP_ENTRY_LENGTH] = words.try_into().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Lookup entry has {} words, expected {}",
                    words.len(),
                    LOOKUP_ENTRY_LENGTH
                ),
            )
        })?;
        Ok(Self { words })
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Returns the word at the given 1-based position as an integer.
    pub fn get_int(&self, position: usize) -> i64 {
        self.words[position - 1] as i64
    }

    /// Returns the word at the given 1-based position as a real.
    pub fn get_real(&self, position: usize) -> f64 {
        f64::from_bits(self.words[position - 1])
    }

    pub fn set_int(&mut self, position: usize, value: i64) {
        assert!(
            position <= LOOKUP_INTEGER_LENGTH,
            "Position {} is not an integer lookup word",
            position
        );
        self.words[position - 1] = value as u64;
    }

    pub fn set_real(&mut self, position: usize, value: f64) {
        assert!(
            position > LOOKUP_INTEGER_LENGTH,
            "Position {} is not a real lookup word",
            position
        );
        self.words[position - 1] = value.to_bits();
    }

    /// Whether this entry is an unused slot in the lookup table.
    pub fn is_unused(&self) -> bool {
        self.lbrel() == MISSING_LOOKUP_VALUE || self.lbyr() == MISSING_LOOKUP_VALUE
    }

    /// Returns the packing digits `(n1, n2, n3)` of `lbpack`, where `n1`
    /// describes the value packing, `n2` the data compression and `n3`
    /// the compression definition.
    pub fn packing_digits(&self) -> (i64, i64, i64) {
        let lbpack = self.lbpack();
        (lbpack % 10, (lbpack / 10) % 10, (lbpack / 100) % 10)
    }

    /// Returns the number of rows and columns of the field grid.
    pub fn grid_shape(&self) -> io::Result<(usize, usize)> {
        let (rows, cols) = (self.lbrow(), self.lbnpt());
        if rows <= 0 || cols <= 0 {
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Field with STASH code {} does not have a regular grid shape ({}x{})",
                    self.lbuser4(),
                    rows,
                    cols
                ),
            ))
        } else {
            Ok((rows as usize, cols as usize))
        }
    }
}

/// A record in a UM file, consisting of a lookup entry and an optional
/// provider of the record data.
#[derive(Clone, Debug)]
pub struct Field {
    lookup: Lookup,
    data: Option<DataProvider>,
}

impl Field {
    pub fn new(lookup: Lookup, data: Option<DataProvider>) -> Self {
        Self { lookup, data }
    }

    /// Creates an unused lookup slot without data.
    pub fn unused() -> Self {
        Self::new(Lookup::empty(), None)
    }

    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    pub fn lookup_mut(&mut self) -> &mut Lookup {
        &mut self.lookup
    }

    pub fn data(&self) -> Option<&DataProvider> {
        self.data.as_ref()
    }

    pub fn is_unused(&self) -> bool {
        self.lookup.is_unused()
    }

    pub fn stash_code(&self) -> i64 {
        self.lookup.lbuser4()
    }

    /// Installs the given array as the new data of the field.
    ///
    /// The array is only encoded when the file is written. The grid shape
    /// in the lookup entry is updated to match the array.
    pub fn set_data(&mut self, values: Array2<f64>) {
        let (rows, cols) = values.dim();
        self.lookup.set_int(LBROW, rows as i64);
        self.lookup.set_int(LBNPT, cols as i64);
        self.data = Some(DataProvider::Array(values));
    }

    /// Whether the data of this field has been replaced since it was read.
    pub fn has_new_data(&self) -> bool {
        matches!(self.data, Some(DataProvider::Array(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_digits_are_split_from_lbpack() {
        let mut lookup = Lookup::new_grid_field(33, 2, 3);
        assert_eq!(lookup.packing_digits(), (0, 0, 0));
        lookup.set_int(LBPACK, 120);
        assert_eq!(lookup.packing_digits(), (0, 2, 1));
        lookup.set_int(LBPACK, 2);
        assert_eq!(lookup.packing_digits(), (2, 0, 0));
    }

    #[test]
    fn real_and_integer_words_are_kept_apart() {
        let mut lookup = Lookup::new_grid_field(24, 145, 192);
        lookup.set_real(BLEV, 1.5);
        assert_eq!(lookup.blev(), 1.5);
        assert_eq!(lookup.bmdi(), REAL_MDI);
        assert_eq!(lookup.lbuser4(), 24);
        assert_eq!(lookup.grid_shape().unwrap(), (145, 192));
        assert!(!lookup.is_unused());
        assert!(Lookup::empty().is_unused());
    }

    #[test]
    fn new_data_updates_grid_shape() {
        let mut field = Field::new(Lookup::new_grid_field(1, 1, 1), None);
        field.set_data(Array2::zeros((4, 5)));
        assert!(field.has_new_data());
        assert_eq!(field.lookup().grid_shape().unwrap(), (4, 5));
    }
}
