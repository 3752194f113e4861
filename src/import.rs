use crate::catalog::{Catalog, ImageId, JsonCatalog};
use crate::error::ImportError;
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Tag attached to every imported conversion.
pub const PROVENANCE_TAG: &str = "rawji";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub id: ImageId,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<ImportRecord>,
    pub failed: Vec<(PathBuf, ImportError)>,
}

/// First name in `dir` for `file_name` that `is_taken` rejects: the name
/// itself, then `stem_01.ext`, `stem_02.ext` and so on.
pub fn unique_destination<F>(dir: &Path, file_name: &str, is_taken: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let candidate = dir.join(file_name);
    if !is_taken(&candidate) {
        return candidate;
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let extension = as_path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut counter: u32 = 1;
    loop {
        let name = match &extension {
            Some(ext) => format!("{}_{:02}.{}", stem, counter, ext),
            None => format!("{}_{:02}", stem, counter),
        };
        let candidate = dir.join(name);
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Move a file, falling back to copy and delete when a rename crosses
/// filesystems.
pub fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(source, destination) {
        Ok(_) => Ok(()),
        Err(_) => {
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
    }
}

/// Move each converted file into `collection`, register it and tag it.
/// A file that fails is reported and the rest are still imported.
pub fn import_outputs(
    outputs: &[PathBuf],
    collection: &Path,
    catalog: &mut dyn Catalog,
    tag: &str,
) -> ImportReport {
    let mut report = ImportReport::default();

    for output in outputs {
        match import_one(output, collection, catalog, tag) {
            Ok(record) => {
                info!("Imported {}", record.path.display());
                report.imported.push(record);
            }
            Err(error) => {
                warn!("Import failed for {}: {}", output.display(), error);
                report.failed.push((output.clone(), error));
            }
        }
    }

    report
}

/// Import into the JSON catalog at `catalog_path`. When the catalog cannot
/// be opened every output is reported as failed and left where it is.
pub fn import_into_catalog(
    outputs: &[PathBuf],
    collection: &Path,
    catalog_path: &Path,
    tag: &str,
) -> ImportReport {
    match JsonCatalog::open(catalog_path) {
        Ok(mut catalog) => import_outputs(outputs, collection, &mut catalog, tag),
        Err(error) => {
            warn!("Cannot open catalog, {} file(s) not imported: {}", outputs.len(), error);
            ImportReport {
                imported: Vec::new(),
                failed: outputs
                    .iter()
                    .map(|output| {
                        (
                            output.clone(),
                            ImportError::CatalogUnavailable {
                                catalog: catalog_path.to_path_buf(),
                                reason: error.to_string(),
                            },
                        )
                    })
                    .collect(),
            }
        }
    }
}

fn import_one(
    output: &Path,
    collection: &Path,
    catalog: &mut dyn Catalog,
    tag: &str,
) -> Result<ImportRecord, ImportError> {
    let file_name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "converted.jpg".to_string());
    // A record can outlive its file, so names the catalog still knows are skipped too.
    let destination = unique_destination(collection, &file_name, |candidate| {
        candidate.exists() || catalog.is_registered(candidate)
    });

    move_file(output, &destination).map_err(|source| ImportError::Move {
        from: output.to_path_buf(),
        to: destination.clone(),
        source,
    })?;

    let id = catalog
        .import_image(&destination)
        .map_err(|source| ImportError::Register {
            path: destination.clone(),
            source,
        })?;

    catalog.attach_tag(id, tag).map_err(|source| ImportError::Tag {
        path: destination.clone(),
        source,
    })?;

    Ok(ImportRecord {
        id,
        path: destination,
    })
}
