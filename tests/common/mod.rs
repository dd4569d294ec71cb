use ndarray::Array2;
use std::{
    ffi::OsString,
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};
use tempfile::TempDir;
use umkit::{
    cli, exit_on_error,
    io::{
        fieldsfile::{
            header::{DATASET_TYPE_DUMP, MODEL_VERSION, T2_YEAR},
            lookup::{Field, Lookup, LBUSER5, LBUSER6},
            FieldsFile,
        },
        utils as io_utils, Endianness, Verbosity,
    },
};

/// STASHmaster table with the fields used by the tests.
pub const STASHMASTER_TEXT: &str = "\
H1| SUBMODEL_NUMBER=1
H2| SUBMODEL_NAME=ATMOS
H3| UM_VERSION=7.3
#
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
1|   -1 |   -1 |   -1 |END OF FILE MARK                    |
";

pub const NUM_ROWS: usize = 4;
pub const NUM_COLS: usize = 5;

/// A record of a test UM file.
pub struct TestRecord {
    pub stash_code: i64,
    pub pseudo_level: i64,
    pub time_level: i64,
    pub fill_value: f64,
}

impl TestRecord {
    pub fn new(stash_code: i64, pseudo_level: i64, time_level: i64, fill_value: f64) -> Self {
        Self {
            stash_code,
            pseudo_level,
            time_level,
            fill_value,
        }
    }
}

/// Runs the command line program with the given arguments.
pub fn run<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    cli::run::run_with_args(
        cli::build::build()
            .no_binary_name(true)
            .get_matches_from(args),
    );
}

/// Writes a UM dump on a small grid containing the given records.
pub fn write_um_file<P: AsRef<Path>>(file_path: P, validity_year: i64, records: &[TestRecord]) {
    let mut file = FieldsFile::new(DATASET_TYPE_DUMP, NUM_ROWS, NUM_COLS, Endianness::Big);
    file.fixed_length_header_mut().set(MODEL_VERSION, 703);
    file.fixed_length_header_mut().set(T2_YEAR, validity_year);
    for record in records {
        let mut lookup = Lookup::new_grid_field(record.stash_code, NUM_ROWS, NUM_COLS);
        lookup.set_int(LBUSER5, record.pseudo_level);
        lookup.set_int(LBUSER6, record.time_level);
        let mut field = Field::new(lookup, None);
        field.set_data(Array2::from_elem((NUM_ROWS, NUM_COLS), record.fill_value));
        file.push_field(field);
    }
    exit_on_error!(
        file.write_to_file(file_path, Verbosity::Quiet),
        "Error: Could not write test UM file: {}"
    );
}

pub fn read_um_file<P: AsRef<Path>>(file_path: P) -> FieldsFile {
    exit_on_error!(
        FieldsFile::open(file_path, Endianness::Big, Verbosity::Quiet),
        "Error: Could not read test UM file: {}"
    )
}

pub fn assert_file_exists<P: AsRef<Path>>(file_path: P) {
    let file_path = file_path.as_ref();
    assert!(
        file_path.exists(),
        "File {} does not exist",
        file_path.to_string_lossy()
    );
}

pub fn assert_files_identical<P1, P2>(file_path_1: P1, file_path_2: P2)
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let file_path_1 = file_path_1.as_ref();
    let file_path_2 = file_path_2.as_ref();

    let identical = exit_on_error!(
        file_content_is_identical(file_path_1, file_path_2),
        "Error: Could not read files for comparison: {}"
    );
    assert!(
        identical,
        "Files {} and {} not identical",
        file_path_1.to_string_lossy(),
        file_path_2.to_string_lossy()
    );
}

/// A scratch directory for the files of a single test.
#[derive(Debug)]
pub struct Test {
    dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = exit_on_error!(
            tempfile::tempdir(),
            "Error: Could not create test directory: {}"
        );
        Self { dir }
    }

    pub fn path<S: AsRef<str>>(&self, file_name: S) -> PathBuf {
        self.dir.path().join(file_name.as_ref())
    }

    /// Writes the given text to a file in the test directory and returns its path.
    pub fn text_file<S: AsRef<str>>(&self, file_name: S, text: &str) -> PathBuf {
        let path = self.path(file_name);
        exit_on_error!(
            io_utils::write_text_file(text, &path),
            "Error: Could not write test file: {}"
        );
        path
    }

    pub fn stashmaster(&self) -> PathBuf {
        self.text_file("STASHmaster_A", STASHMASTER_TEXT)
    }
}

/// Defines a test with a scratch directory bound to the given name and
/// paths of the listed scratch files in that directory.
#[macro_export]
macro_rules! def_test {
    (
        $(#[$attr:meta])*
        FILES[$($file_ident:ident = $file_str:expr),*]
        fn $name:ident($test:ident) $test_body:block
    ) => {
        $(#[$attr])*
        #[test]
        fn $name() {
            let $test = common::Test::new();
            $( let $file_ident = $test.path($file_str); )*
            $test_body
        }
    };
}

#[macro_export]
macro_rules! path_str {
    ($path:expr) => {
        $path.to_string_lossy().as_ref()
    };
}

fn file_content_is_identical<P1, P2>(file_path_1: P1, file_path_2: P2) -> io::Result<bool>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let mut content_1 = Vec::new();
    let mut content_2 = Vec::new();
    io_utils::open_file_and_map_err(file_path_1)?.read_to_end(&mut content_1)?;
    fs::File::open(file_path_2)?.read_to_end(&mut content_2)?;
    Ok(content_1 == content_2)
}
