use log::warn;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A selected original raw file. Conversion always reads this file, never
/// an exported copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    path: PathBuf,
}

impl SourceImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Base filename without extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    }

    /// Directory the image lives in.
    pub fn collection_path(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

pub fn is_raw_file(path: &Path) -> bool {
    if let Some(extension) = path.extension() {
        if let Some(ext_str) = extension.to_str() {
            matches!(
                ext_str.to_lowercase().as_str(),
                "raf" | "raw" | "dng" | "cr2" | "cr3" | "nef" | "arw" | "orf" | "rw2"
            )
        } else {
            false
        }
    } else {
        false
    }
}

/// Expand the given paths into a selection. Directories contribute their raw
/// files (not recursive); files are taken as given. The result is sorted so
/// the first image is stable between runs.
pub fn collect_sources(inputs: &[PathBuf]) -> io::Result<Vec<SourceImage>> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let found = fs::read_dir(input)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && is_raw_file(path));
            paths.extend(found);
        } else if input.is_file() {
            paths.push(input.clone());
        } else {
            warn!("Skipping {}: no such file or directory", input.display());
        }
    }

    paths.sort();
    paths.dedup();
    Ok(paths.into_iter().map(SourceImage::new).collect())
}

/// Directory that converted files are imported into: the first selected
/// image's directory. A selection spanning several directories is reported
/// since every output still lands next to the first image.
pub fn collection_path(images: &[SourceImage]) -> Option<PathBuf> {
    let first = images.first()?.collection_path();

    if let Some((first, other)) = mixed_directories(images) {
        warn!(
            "Selected images come from more than one directory ({} and {}); importing everything into {}",
            first.display(),
            other.display(),
            first.display()
        );
    }

    Some(first)
}

/// The first image's directory and the first different one, if the selection
/// spans more than one directory.
pub fn mixed_directories(images: &[SourceImage]) -> Option<(PathBuf, PathBuf)> {
    let first = images.first()?.collection_path();
    let other = images
        .iter()
        .map(SourceImage::collection_path)
        .find(|dir| *dir != first)?;
    Some((first, other))
}
