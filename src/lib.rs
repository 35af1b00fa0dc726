//! Libraries Registry
//!
//! Migrates legacy `hook_libraries_info` definitions (front-end asset
//! libraries described as nested associative data) into the structured
//! registry schema, one JSON file per library.
//!
//! # Core Features Implemented
//!
//! ## Discovery (`discovery` module)
//! - `LibrarySource` - Provider of raw definitions (JSON exports, in-memory)
//! - `Discovery::discover()` - Merge all registered sources in order
//!
//! ## Conversion (`transform` module)
//! - `machine_name()` - Registry id and filename for a library name
//! - `transform()` - Legacy definition to `LibraryDefinition`, plus warnings
//!
//! ## Processing (`operations` module)
//! - `process_libraries()` - Discover, convert and write every library
//!
//! ## Registry Access (`registry` module)
//! - `RegistryStream` - Path-restricted `libraries-registry://` accessor that
//!   refuses to produce public URLs

pub mod config;
pub mod discovery;
pub mod error;
pub mod library;
pub mod operations;
pub mod registry;
pub mod transform;

pub use config::{RegistryConfig, RegistryConstants, RegistryLayout};
pub use discovery::{merge_deep, Discovery, JsonFileSource, LibrarySource, StaticSource};
pub use error::{RegistryError, Result};
pub use library::{
    AssetFiles, CssAssets, DetectorId, LibraryDefinition, LibraryType, RawLibraries,
    RawLibraryDefinition, VersionDetector,
};
pub use operations::{process_libraries, registry_filename, RunReport, WriteFailure};
pub use registry::{RegistryEntry, RegistryStorage, RegistryStream};
pub use transform::{machine_name, transform, TransformWarning, Transformed};
