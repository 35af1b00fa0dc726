//! Registry configuration.
//!
//! Constants shared across the crate, plus the resolved `RegistryConfig` that
//! the binary builds once at startup and injects into the accessor.

use std::path::{Path, PathBuf};

/// Registry-wide constants.
pub struct RegistryConstants;

impl RegistryConstants {
    pub const SCHEME: &'static str = "libraries-registry";
    pub const DISPLAY_NAME: &'static str = "Library registry";
    pub const DESCRIPTION: &'static str = "Provides access to library registry files.";
    pub const DIR_NAME: &'static str = "registry";
    pub const CURRENT_SUBDIR: &'static str = "8";
    pub const FILE_EXTENSION: &'static str = "json";
    pub const FORCE_VERSION_CALLBACK: &'static str = "_library_pack_force_version";
}

/// Which registry directory layout to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryLayout {
    /// `<project>/registry`
    #[default]
    Legacy,
    /// `<project>/registry/8`
    Current,
}

impl RegistryLayout {
    pub fn directory(&self, project_root: &Path) -> PathBuf {
        let base = project_root.join(RegistryConstants::DIR_NAME);
        match self {
            RegistryLayout::Legacy => base,
            RegistryLayout::Current => base.join(RegistryConstants::CURRENT_SUBDIR),
        }
    }
}

/// Resolved configuration for a registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub scheme: String,
    pub root: PathBuf,
}

impl RegistryConfig {
    /// Build a config from a project root and layout.
    pub fn for_project(project_root: &Path, layout: RegistryLayout) -> Self {
        Self::with_root(layout.directory(project_root))
    }

    /// Build a config pointing straight at a directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        RegistryConfig {
            scheme: RegistryConstants::SCHEME.to_string(),
            root: root.into(),
        }
    }
}
