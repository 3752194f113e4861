use crate::error::CatalogError;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub type ImageId = u64;

/// File name used for a catalog kept inside the collection directory.
pub const DEFAULT_CATALOG_FILE: &str = ".rawji-catalog.json";

/// The image database that converted files are registered with.
pub trait Catalog {
    /// Register a file and return its record id.
    fn import_image(&mut self, path: &Path) -> Result<ImageId, CatalogError>;

    /// Attach `tag` to an imported image, creating the tag if needed.
    fn attach_tag(&mut self, id: ImageId, tag: &str) -> Result<(), CatalogError>;

    /// Whether a record already claims `path`, even if the file is gone.
    fn is_registered(&self, path: &Path) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub path: PathBuf,
    pub filename: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub imported_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    next_id: ImageId,
    images: Vec<ImageRecord>,
}

/// A catalog persisted as a JSON document. Every change is written back
/// immediately.
pub struct JsonCatalog {
    path: PathBuf,
    data: CatalogFile,
}

impl JsonCatalog {
    /// Open the catalog at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let data = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&text).map_err(|source| CatalogError::Json {
                path: path.clone(),
                source,
            })?
        } else {
            CatalogFile {
                next_id: 1,
                images: Vec::new(),
            }
        };

        Ok(Self { path, data })
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.data.images
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&ImageRecord> {
        self.data.images.iter().find(|record| record.path == path)
    }

    fn save(&self) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| CatalogError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&self.data).map_err(|source| CatalogError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Catalog for JsonCatalog {
    fn import_image(&mut self, path: &Path) -> Result<ImageId, CatalogError> {
        if let Some(existing) = self.find_by_path(path) {
            return Ok(existing.id);
        }

        if !path.is_file() {
            return Err(CatalogError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            });
        }

        // Not every converter output is readable here; dimensions are optional.
        let dimensions = image::image_dimensions(path).ok();
        let id = self.data.next_id.max(1);
        self.data.next_id = id + 1;
        self.data.images.push(ImageRecord {
            id,
            path: path.to_path_buf(),
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            imported_at: Utc::now(),
            tags: Vec::new(),
        });
        debug!("Registered {} as image {}", path.display(), id);

        self.save()?;
        Ok(id)
    }

    fn attach_tag(&mut self, id: ImageId, tag: &str) -> Result<(), CatalogError> {
        let record = self
            .data
            .images
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(CatalogError::UnknownImage(id))?;

        if !record.tags.iter().any(|t| t == tag) {
            record.tags.push(tag.to_string());
        }
        self.save()
    }

    fn is_registered(&self, path: &Path) -> bool {
        self.find_by_path(path).is_some()
    }
}
