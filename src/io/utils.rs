//! Utilities for input/output.

use super::OverwriteMode;
use std::{
    fs,
    io::{self, BufRead, Read, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// Opens the file at the given path, adding the path to any error message.
pub fn open_file_and_map_err<P: AsRef<Path>>(file_path: P) -> io::Result<fs::File> {
    let file_path = file_path.as_ref();
    fs::File::open(file_path).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("Could not open {}: {}", file_path.display(), err),
        )
    })
}

/// Reads and returns the content of the specified text file.
pub fn read_text_file<P: AsRef<Path>>(file_path: P) -> io::Result<String> {
    let file = open_file_and_map_err(file_path)?;
    let mut text = String::new();
    let _ = io::BufReader::new(file).read_to_string(&mut text)?;
    Ok(text)
}

/// Writes the given text to the given path, replacing any existing file.
pub fn write_text_file<P: AsRef<Path>>(text: &str, output_file_path: P) -> io::Result<()> {
    let mut file = create_file_and_required_directories(output_file_path)?;
    file.write_all(text.as_bytes())
}

/// Creates the directory of the given path if it does not already exist.
pub fn create_directory_if_missing<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    match file_path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Creates a new file at the given path, including any missing directories.
pub fn create_file_and_required_directories<P: AsRef<Path>>(file_path: P) -> io::Result<fs::File> {
    create_directory_if_missing(&file_path)?;
    fs::File::create(file_path)
}

/// Asks the user a yes/no question on the terminal and returns the answer.
pub fn user_says_yes(question: &str, default_is_yes: bool) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!(
            "{} [{}] ",
            question,
            if default_is_yes { "Y/n" } else { "y/N" }
        );
        stdout.flush()?;

        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer)? == 0 {
            return Ok(default_is_yes);
        }
        match answer.trim().to_lowercase().as_str() {
            "" => return Ok(default_is_yes),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("Please answer y or n"),
        }
    }
}

/// Returns whether the file at the given path may be written according to
/// the given overwrite mode, asking the user if required.
pub fn write_allowed<P: AsRef<Path>>(file_path: P, overwrite_mode: OverwriteMode) -> bool {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return true;
    }
    match overwrite_mode {
        OverwriteMode::Always => true,
        OverwriteMode::Never => {
            println!("File {} already exists, skipping", file_path.display());
            false
        }
        OverwriteMode::Ask => user_says_yes(
            &format!("File {} already exists, overwrite?", file_path.display()),
            true,
        )
        .unwrap_or_else(|err| {
            eprintln!("Warning: Not overwriting due to error: {}", err);
            false
        }),
    }
}

/// An output path which is written through a temporary file in the same
/// directory and moved into place only when writing has completed.
#[derive(Debug)]
pub struct AtomicOutputPath {
    target_path: PathBuf,
    temporary_file: NamedTempFile,
}

impl AtomicOutputPath {
    /// Creates a temporary file next to the given target path.
    pub fn new<P: AsRef<Path>>(target_path: P) -> io::Result<Self> {
        let target_path = target_path.as_ref().to_path_buf();
        create_directory_if_missing(&target_path)?;
        let directory = match target_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temporary_file = tempfile::Builder::new()
            .prefix(".umkit-")
            .tempfile_in(directory)?;
        Ok(Self {
            target_path,
            temporary_file,
        })
    }

    pub fn target_path(&self) -> &Path {
        self.target_path.as_path()
    }

    pub fn temporary_path(&self) -> &Path {
        self.temporary_file.path()
    }

    /// Returns the open handle to the temporary file.
    pub fn temporary_file_mut(&mut self) -> &mut fs::File {
        self.temporary_file.as_file_mut()
    }

    /// Whether the target path may be written according to the given overwrite mode.
    pub fn write_allowed(&self, overwrite_mode: OverwriteMode) -> bool {
        write_allowed(&self.target_path, overwrite_mode)
    }

    /// Moves the temporary file to the target path.
    pub fn perform_replace(self) -> io::Result<()> {
        self.temporary_file.as_file().sync_all()?;
        self.temporary_file
            .persist(&self.target_path)
            .map(|_| ())
            .map_err(|err| err.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_output_is_only_visible_after_replace() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out.txt");

        let mut output = AtomicOutputPath::new(&target).unwrap();
        output.temporary_file_mut().write_all(b"content").unwrap();
        assert!(!target.exists());

        output.perform_replace().unwrap();
        assert_eq!(read_text_file(&target).unwrap(), "content");
    }

    #[test]
    fn never_overwrite_refuses_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("existing.txt");
        write_text_file("old", &target).unwrap();

        assert!(!write_allowed(&target, OverwriteMode::Never));
        assert!(write_allowed(&target, OverwriteMode::Always));
        assert!(write_allowed(dir.path().join("new.txt"), OverwriteMode::Never));
    }
}
