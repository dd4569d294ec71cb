//! Rewriting of output paths in a built documentation site.

use crate::io::{utils, Verbosity};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Path segment whose pages are served from the site root.
pub const DEFAULT_HIDDEN_SEGMENT: &str = "pages/";

/// Returns the destination path with the given prefix removed, if present.
pub fn strip_destination_prefix<'a>(dest_uri: &'a str, prefix: &str) -> &'a str {
    dest_uri.strip_prefix(prefix).unwrap_or(dest_uri)
}

/// A file of a site build, with its source and destination paths relative to
/// the documentation and site roots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteFile {
    pub src_uri: String,
    pub dest_uri: String,
}

impl SiteFile {
    pub fn new<S: Into<String>, D: Into<String>>(src_uri: S, dest_uri: D) -> Self {
        Self {
            src_uri: src_uri.into(),
            dest_uri: dest_uri.into(),
        }
    }
}

/// Removes the given prefix from the destination path of every file.
pub fn hide_segment(files: &mut [SiteFile], prefix: &str) {
    for file in files {
        let stripped = strip_destination_prefix(&file.dest_uri, prefix);
        if stripped.len() != file.dest_uri.len() {
            file.dest_uri = stripped.to_string();
        }
    }
}

/// Moves every file under the given segment directory of a built site to the
/// corresponding path relative to the site root. Returns the number of moved
/// files.
pub fn hide_url_segment<P: AsRef<Path>>(
    site_dir: P,
    segment: &str,
    verbosity: Verbosity,
) -> io::Result<usize> {
    let site_dir = site_dir.as_ref();
    let prefix = normalized_prefix(segment);
    let segment_dir = site_dir.join(prefix.trim_end_matches('/'));
    if !segment_dir.is_dir() {
        if verbosity.print_messages() {
            println!("No {} directory in {}", prefix, site_dir.display());
        }
        return Ok(0);
    }

    let mut files: Vec<SiteFile> = relative_file_paths(site_dir)?
        .into_iter()
        .map(|path| SiteFile::new(path.clone(), path))
        .collect();
    hide_segment(&mut files, &prefix);

    let mut num_moved = 0;
    for file in files.iter().filter(|file| file.src_uri != file.dest_uri) {
        let source = site_dir.join(&file.src_uri);
        let destination = site_dir.join(&file.dest_uri);
        if verbosity.print_messages() {
            println!("Moving {} to {}", file.src_uri, file.dest_uri);
        }
        utils::create_directory_if_missing(&destination)?;
        fs::rename(&source, &destination)?;
        num_moved += 1;
    }
    remove_empty_directories(&segment_dir)?;
    Ok(num_moved)
}

fn normalized_prefix(segment: &str) -> String {
    format!("{}/", segment.trim_matches('/'))
}

fn relative_file_paths(root: &Path) -> io::Result<Vec<String>> {
    let mut paths = Vec::new();
    let mut directories = vec![PathBuf::new()];
    while let Some(relative_dir) = directories.pop() {
        for entry in fs::read_dir(root.join(&relative_dir))? {
            let entry = entry?;
            let relative_path = relative_dir.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                directories.push(relative_path);
            } else {
                paths.push(
                    relative_path
                        .components()
                        .map(|component| component.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/"),
                );
            }
        }
    }
    paths.sort();
    Ok(paths)
}

fn remove_empty_directories(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            remove_empty_directories(&entry.path())?;
        }
    }
    if fs::read_dir(dir)?.next().is_none() {
        fs::remove_dir(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_leading_segment_is_removed() {
        assert_eq!(strip_destination_prefix("pages/about/index.html", "pages/"), "about/index.html");
        assert_eq!(strip_destination_prefix("index.html", "pages/"), "index.html");
        assert_eq!(
            strip_destination_prefix("docs/pages/index.html", "pages/"),
            "docs/pages/index.html"
        );

        let mut files = vec![
            SiteFile::new("pages/a.md", "pages/a/index.html"),
            SiteFile::new("b.md", "b/index.html"),
        ];
        hide_segment(&mut files, DEFAULT_HIDDEN_SEGMENT);
        assert_eq!(files[0].dest_uri, "a/index.html");
        assert_eq!(files[1].dest_uri, "b/index.html");
    }

    #[test]
    fn site_files_are_moved_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path();
        fs::create_dir_all(site.join("pages/guide")).unwrap();
        fs::write(site.join("pages/guide/index.html"), "guide").unwrap();
        fs::write(site.join("pages/index.html"), "home").unwrap();
        fs::write(site.join("style.css"), "css").unwrap();

        assert_eq!(hide_url_segment(site, "pages", Verbosity::Quiet).unwrap(), 2);
        assert_eq!(fs::read_to_string(site.join("guide/index.html")).unwrap(), "guide");
        assert_eq!(fs::read_to_string(site.join("index.html")).unwrap(), "home");
        assert!(site.join("style.css").exists());
        assert!(!site.join("pages").exists());

        assert_eq!(hide_url_segment(site, "pages/", Verbosity::Quiet).unwrap(), 0);
    }
}
