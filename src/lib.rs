// Processing core shared by the CLI and anything embedding the converter.
pub mod batch;
pub mod catalog;
pub mod command;
pub mod error;
pub mod executable;
pub mod import;
pub mod preferences;
pub mod progress;
pub mod recipe;
pub mod runner;
pub mod source;

pub use batch::{BatchProcessor, BatchReport, Conversion};
pub use catalog::{Catalog, JsonCatalog};
pub use command::{quote_path, ConversionCommand};
pub use error::{CatalogError, ConversionError, ExportError, ImportError};
pub use import::{import_into_catalog, import_outputs, ImportReport, PROVENANCE_TAG};
pub use recipe::{DynamicRange, FilmSimulation, RecipeOptions, Strength, WhiteBalance};
pub use runner::{ProcessRunner, SystemRunner};
pub use source::SourceImage;
